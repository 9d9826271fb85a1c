use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// A host the user can open an SFTP session against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub alias: String,
    pub host: String,
    pub user: String,
    pub port: Option<u16>,
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl ConnectionTarget {
    pub fn new(alias: String, host: String, user: String) -> Self {
        Self {
            alias,
            host,
            user,
            port: None,
            identity_file: None,
            description: None,
            group: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SSH_PORT)
    }

    /// `host:port` as handed to the socket resolver.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port())
    }

    pub fn label(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port())
    }
}

/// One row of a directory listing, local or remote.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
    pub is_dir: bool,
}

#[cfg(test)]
impl Entry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            modified: None,
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            modified: None,
            is_dir: true,
        }
    }
}

/// Directories first, then files, both by name.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Local,
    Remote,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Side::Local => "Local",
            Side::Remote => "Remote",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDirection {
    LocalToRemote,
    RemoteToLocal,
}

impl CopyDirection {
    /// Direction of a copy whose source is the given pane.
    pub fn from_source(side: Side) -> Self {
        match side {
            Side::Local => CopyDirection::LocalToRemote,
            Side::Remote => CopyDirection::RemoteToLocal,
        }
    }

    pub fn source(self) -> Side {
        match self {
            CopyDirection::LocalToRemote => Side::Local,
            CopyDirection::RemoteToLocal => Side::Remote,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            CopyDirection::LocalToRemote => "Uploading",
            CopyDirection::RemoteToLocal => "Downloading",
        }
    }
}

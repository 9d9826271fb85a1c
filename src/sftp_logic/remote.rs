use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::models::{sort_entries, Entry};

/// The remote half of the entry listing capability.
///
/// Implementations are blocking; callers run them on the blocking pool.
pub trait RemoteFs: Send + Sync {
    fn list_dir(&self, path: &str) -> Result<Vec<Entry>>;
    /// True for a regular file, false for directories and other node types.
    fn is_file(&self, path: &str) -> Result<bool>;
    fn read_file(&self, path: &str) -> Result<Box<dyn Read + Send>>;
    fn write_file(&self, path: &str) -> Result<Box<dyn Write + Send>>;
}

/// SFTP channel over an authenticated ssh2 session.
pub struct SftpRemote {
    sftp: Mutex<ssh2::Sftp>,
    // Keeps the transport alive for as long as the channel is in use
    _session: ssh2::Session,
}

impl SftpRemote {
    pub fn open(session: ssh2::Session) -> Result<Self> {
        let sftp = session.sftp().context("Failed to open SFTP channel")?;
        Ok(Self {
            sftp: Mutex::new(sftp),
            _session: session,
        })
    }

    fn sftp(&self) -> Result<std::sync::MutexGuard<'_, ssh2::Sftp>> {
        self.sftp
            .lock()
            .map_err(|_| anyhow!("SFTP channel lock poisoned"))
    }
}

impl RemoteFs for SftpRemote {
    fn list_dir(&self, path: &str) -> Result<Vec<Entry>> {
        let sftp = self.sftp()?;
        let listing = sftp
            .readdir(Path::new(path))
            .with_context(|| format!("Failed to read remote directory {path}"))?;

        let mut items = Vec::with_capacity(listing.len());
        for (child, stat) in listing {
            let name = child
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            // Skip . and .. entries (the pane draws its own parent row)
            if name.is_empty() || name == "." || name == ".." {
                continue;
            }
            let is_dir = stat.is_dir();
            items.push(Entry {
                name,
                size: if is_dir { 0 } else { stat.size.unwrap_or(0) },
                modified: stat
                    .mtime
                    .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
                    .map(|dt| dt.with_timezone(&Local)),
                is_dir,
            });
        }

        sort_entries(&mut items);
        Ok(items)
    }

    fn is_file(&self, path: &str) -> Result<bool> {
        let stat = self
            .sftp()?
            .stat(Path::new(path))
            .with_context(|| format!("Failed to stat remote file {path}"))?;
        Ok(stat.is_file())
    }

    fn read_file(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let file = self
            .sftp()?
            .open(Path::new(path))
            .with_context(|| format!("Failed to open remote file {path}"))?;
        Ok(Box::new(file))
    }

    fn write_file(&self, path: &str) -> Result<Box<dyn Write + Send>> {
        let file = self
            .sftp()?
            .create(Path::new(path))
            .with_context(|| format!("Failed to create remote file {path}"))?;
        Ok(Box::new(file))
    }
}

/// Lexically normalise a forward-slash path (`.` dropped, `..` folded).
pub fn remote_clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

pub fn is_remote_root(path: &str) -> bool {
    remote_clean(path) == "/"
}

/// Parent of a remote path, never climbing above `/`.
pub fn remote_parent(path: &str) -> String {
    let cleaned = remote_clean(path);
    match cleaned.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => cleaned[..idx].to_string(),
    }
}

pub fn remote_join(base: &str, name: &str) -> String {
    remote_clean(&format!("{base}/{name}"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{mpsc, Arc};

    /// In-memory remote filesystem for controller and orchestrator tests.
    #[derive(Default)]
    pub(crate) struct MemoryRemote {
        dirs: Mutex<HashMap<String, Vec<Entry>>>,
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        failing: Mutex<HashSet<String>>,
        gate: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl MemoryRemote {
        pub(crate) fn set_dir(&self, path: &str, entries: Vec<Entry>) {
            self.dirs.lock().unwrap().insert(path.to_string(), entries);
        }

        pub(crate) fn put_file(&self, path: &str, data: &[u8]) {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
        }

        pub(crate) fn file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().unwrap().get(path).cloned()
        }

        pub(crate) fn fail_on(&self, path: &str) {
            self.failing.lock().unwrap().insert(path.to_string());
        }

        /// Every write blocks until the returned sender releases it.
        pub(crate) fn gate_writes(&self) -> mpsc::Sender<()> {
            let (tx, rx) = mpsc::channel();
            *self.gate.lock().unwrap() = Some(rx);
            tx
        }

        fn check(&self, path: &str) -> Result<()> {
            if self.failing.lock().unwrap().contains(path) {
                return Err(anyhow!("permission denied"));
            }
            Ok(())
        }
    }

    struct MemoryWriter {
        path: String,
        buf: Vec<u8>,
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Write for MemoryWriter {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Drop for MemoryWriter {
        fn drop(&mut self) {
            let data = std::mem::take(&mut self.buf);
            self.files.lock().unwrap().insert(self.path.clone(), data);
        }
    }

    impl RemoteFs for MemoryRemote {
        fn list_dir(&self, path: &str) -> Result<Vec<Entry>> {
            self.check(path)?;
            self.dirs
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("no such directory: {path}"))
        }

        fn is_file(&self, path: &str) -> Result<bool> {
            self.check(path)?;
            if self.files.lock().unwrap().contains_key(path) {
                Ok(true)
            } else if self.dirs.lock().unwrap().contains_key(path) {
                Ok(false)
            } else {
                Err(anyhow!("no such file: {path}"))
            }
        }

        fn read_file(&self, path: &str) -> Result<Box<dyn Read + Send>> {
            self.check(path)?;
            let data = self
                .file(path)
                .ok_or_else(|| anyhow!("no such file: {path}"))?;
            Ok(Box::new(std::io::Cursor::new(data)))
        }

        fn write_file(&self, path: &str) -> Result<Box<dyn Write + Send>> {
            if let Some(gate) = self.gate.lock().unwrap().as_ref() {
                let _ = gate.recv();
            }
            self.check(path)?;
            Ok(Box::new(MemoryWriter {
                path: path.to_string(),
                buf: Vec::new(),
                files: Arc::clone(&self.files),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_folds_dots() {
        assert_eq!(remote_clean("/"), "/");
        assert_eq!(remote_clean("/var//log/"), "/var/log");
        assert_eq!(remote_clean("/var/./log/../tmp"), "/var/tmp");
        assert_eq!(remote_clean("/.."), "/");
        assert_eq!(remote_clean("a/../.."), "..");
        assert_eq!(remote_clean(""), ".");
    }

    #[test]
    fn parent_never_climbs_above_root() {
        assert_eq!(remote_parent("/var/log"), "/var");
        assert_eq!(remote_parent("/var"), "/");
        assert_eq!(remote_parent("/"), "/");
        assert_eq!(remote_parent("relative"), "/");
    }

    #[test]
    fn join_uses_forward_slashes() {
        assert_eq!(remote_join("/", "etc"), "/etc");
        assert_eq!(remote_join("/home/user", "docs"), "/home/user/docs");
        assert_eq!(remote_join("/home/user/", "a b.txt"), "/home/user/a b.txt");
        assert!(is_remote_root("/"));
        assert!(is_remote_root("/tmp/.."));
        assert!(!is_remote_root("/tmp"));
    }
}

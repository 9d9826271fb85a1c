use std::sync::Arc;
use std::time::Instant;

use super::picker::TargetPicker;
use crate::models::ConnectionTarget;
use crate::sftp_logic::{BrowserState, CancelToken, CopyJob, CopyOrchestrator, RemoteFs};

/// One authenticated connection and the browser bound to it.
pub struct Session {
    pub target: ConnectionTarget,
    pub remote: Arc<dyn RemoteFs>,
    pub browser: BrowserState,
    pub orchestrator: CopyOrchestrator,
}

#[derive(Debug, Clone)]
pub struct CredentialPrompt {
    pub target: ConnectionTarget,
    pub input: String,
    pub pending: Option<u64>,
}

impl CredentialPrompt {
    pub fn new(target: ConnectionTarget) -> Self {
        Self {
            target,
            input: String::new(),
            pending: None,
        }
    }

    pub fn masked(&self) -> String {
        "*".repeat(self.input.chars().count())
    }
}

#[derive(Debug, Clone)]
pub struct CopyProgress {
    pub job: CopyJob,
    pub current_file: Option<String>,
    pub cancel: CancelToken,
    pub cancelling: bool,
}

impl CopyProgress {
    pub fn new(job: CopyJob, cancel: CancelToken) -> Self {
        let current_file = job.files.first().cloned();
        Self {
            job,
            current_file,
            cancel,
            cancelling: false,
        }
    }

    /// e.g. `Uploading report.csv (2/5, 40%)`
    pub fn status_line(&self) -> String {
        let percent = (self.job.fraction() * 100.0).round() as u32;
        match &self.current_file {
            Some(file) => format!(
                "{} {} ({}/{}, {}%)",
                self.job.direction.verb(),
                file,
                (self.job.completed + 1).min(self.job.total()),
                self.job.total(),
                percent
            ),
            None => format!(
                "{} {} files ({}%)",
                self.job.direction.verb(),
                self.job.total(),
                percent
            ),
        }
    }
}

/// Application state machine; each variant owns what it needs.
pub enum Screen {
    SelectingTarget,
    AwaitingCredential(CredentialPrompt),
    Browsing(Session),
    Copying(Session, CopyProgress),
    Exiting,
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::SelectingTarget => "SelectingTarget",
            Screen::AwaitingCredential(_) => "AwaitingCredential",
            Screen::Browsing(_) => "Browsing",
            Screen::Copying(..) => "Copying",
            Screen::Exiting => "Exiting",
        }
    }
}

pub struct App {
    pub screen: Screen,
    // Survives trips through credential entry and browsing
    pub picker: TargetPicker,
    pub status_message: Option<(String, Instant)>,
    pub local_start_path: String,
    pub remote_start_path: String,
    pub(crate) next_attempt: u64,
    // Listing generations carry on across sessions
    pub(crate) next_generation: u64,
    pub(crate) pane_rows: usize,
}

use crossterm::event::KeyEvent;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConnectError, TransferError};
use crate::models::ConnectionTarget;
use crate::sftp_logic::{
    CancelToken, CopyEvent, CopyJob, CopyOrchestrator, ListingRequest, ListingResult, RemoteFs,
};

/// Input to the controller: user input or a finished background command.
#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Event(AppEvent),
}

/// Results of off-loop work, delivered back into the event loop.
pub enum AppEvent {
    Listing(ListingResult),
    SessionReady {
        attempt: u64,
        target: ConnectionTarget,
        remote: Arc<dyn RemoteFs>,
    },
    SessionFailed {
        attempt: u64,
        target: ConnectionTarget,
        error: ConnectError,
    },
    Copy(CopyEvent),
    CopyRejected(TransferError),
}

/// Work the controller asks the executor to run off the loop.
pub enum Command {
    List {
        request: ListingRequest,
        remote: Arc<dyn RemoteFs>,
    },
    Connect {
        attempt: u64,
        target: ConnectionTarget,
        credential: Option<String>,
    },
    StartCopy {
        job: CopyJob,
        remote: Arc<dyn RemoteFs>,
        orchestrator: CopyOrchestrator,
        cancel: CancelToken,
    },
}

impl fmt::Debug for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppEvent::Listing(result) => f.debug_tuple("Listing").field(result).finish(),
            AppEvent::SessionReady {
                attempt, target, ..
            } => f
                .debug_struct("SessionReady")
                .field("attempt", attempt)
                .field("target", &target.alias)
                .finish_non_exhaustive(),
            AppEvent::SessionFailed {
                attempt,
                target,
                error,
            } => f
                .debug_struct("SessionFailed")
                .field("attempt", attempt)
                .field("target", &target.alias)
                .field("error", error)
                .finish(),
            AppEvent::Copy(event) => f.debug_tuple("Copy").field(event).finish(),
            AppEvent::CopyRejected(err) => f.debug_tuple("CopyRejected").field(err).finish(),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::List { request, .. } => f
                .debug_struct("List")
                .field("request", request)
                .finish_non_exhaustive(),
            // The secret stays out of logs
            Command::Connect {
                attempt,
                target,
                credential,
            } => f
                .debug_struct("Connect")
                .field("attempt", attempt)
                .field("target", &target.alias)
                .field("credential", &credential.as_ref().map(|_| "***"))
                .finish(),
            Command::StartCopy { job, .. } => f
                .debug_struct("StartCopy")
                .field("job", job)
                .finish_non_exhaustive(),
        }
    }
}

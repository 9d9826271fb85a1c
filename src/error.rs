use thiserror::Error;

/// Top-level failures, one variant per recovery policy.
#[derive(Debug, Error)]
pub enum AppError {
    /// Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Returns the user to target selection.
    #[error("cannot open session to {target}: {source}")]
    Auth {
        target: String,
        #[source]
        source: ConnectError,
    },

    /// Shown inline in the pane; prior content is kept.
    #[error("cannot list {path}: {message}")]
    Listing { path: String, message: String },

    /// Aborts the rest of the copy job.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Outcome of a failed session establishment.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectError {
    #[error("a passphrase or password is required")]
    NeedsCredential,
    #[error("authentication rejected: {0}")]
    AuthFailed(String),
    #[error("host unreachable: {0}")]
    Unreachable(String),
}

impl ConnectError {
    pub fn needs_credential(&self) -> bool {
        matches!(self, ConnectError::NeedsCredential)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("a copy job is already running")]
    Busy,
    #[error("failed to copy {file}: {cause}")]
    File { file: String, cause: String },
}

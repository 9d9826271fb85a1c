//! Pane model, dual-pane browser and copy orchestration over local and remote filesystems

pub mod browser;
pub mod local;
pub mod pane;
pub mod remote;
pub mod transfer;
pub mod types;

pub use browser::{BrowserAction, BrowserCommand, BrowserState};
pub use pane::PaneState;
pub use remote::{RemoteFs, SftpRemote};
pub use transfer::{CancelToken, CopyEvent, CopyJob, CopyOrchestrator};
pub use types::{ListingOutcome, ListingRequest, ListingResult, PaneRow};

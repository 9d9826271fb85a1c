mod executor;
pub mod keymap;
mod picker;
mod state;
mod types;

pub use executor::Executor;
pub use types::{App, CopyProgress, CredentialPrompt, Screen, Session};

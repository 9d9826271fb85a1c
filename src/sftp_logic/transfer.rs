use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::local::local_join;
use super::remote::{remote_join, RemoteFs};
use crate::error::TransferError;
use crate::models::{CopyDirection, Side};

/// A batch of same-directory files copied one after another.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyJob {
    pub files: Vec<String>,
    pub source_path: String,
    pub dest_path: String,
    pub direction: CopyDirection,
    pub completed: usize,
    pub failure: Option<String>,
}

impl CopyJob {
    pub fn new(
        files: Vec<String>,
        source_path: &str,
        dest_path: &str,
        direction: CopyDirection,
    ) -> Self {
        Self {
            files,
            source_path: source_path.to_string(),
            dest_path: dest_path.to_string(),
            direction,
            completed: 0,
            failure: None,
        }
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn fraction(&self) -> f64 {
        if self.files.is_empty() {
            return 0.0;
        }
        self.completed as f64 / self.files.len() as f64
    }

    fn join(side: Side, base: &str, name: &str) -> String {
        match side {
            Side::Local => local_join(base, name),
            Side::Remote => remote_join(base, name),
        }
    }

    pub fn source_file(&self, name: &str) -> String {
        Self::join(self.direction.source(), &self.source_path, name)
    }

    pub fn dest_file(&self, name: &str) -> String {
        Self::join(self.direction.source().other(), &self.dest_path, name)
    }

    /// Fold an orchestrator event into the job's counters.
    pub fn record(&mut self, event: &CopyEvent) {
        match event {
            CopyEvent::Progress { index, .. } => self.completed = index + 1,
            CopyEvent::Failed {
                file_name, cause, ..
            } => {
                self.failure = Some(
                    TransferError::File {
                        file: file_name.clone(),
                        cause: cause.clone(),
                    }
                    .to_string(),
                )
            }
            CopyEvent::Completed { count } => self.completed = *count,
            CopyEvent::Cancelled { completed } => self.completed = *completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CopyEvent {
    Progress {
        index: usize,
        file_name: String,
        fraction: f64,
    },
    Failed {
        index: usize,
        file_name: String,
        cause: String,
    },
    Completed {
        count: usize,
    },
    Cancelled {
        completed: usize,
    },
}

impl CopyEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CopyEvent::Progress { .. })
    }
}

/// Stops a running job before its next file.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs at most one copy job at a time for a session.
#[derive(Debug, Clone, Default)]
pub struct CopyOrchestrator {
    active: Arc<AtomicBool>,
}

struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CopyOrchestrator {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start `job` on the blocking pool and stream its events back.
    ///
    /// The stream ends with exactly one of `Failed`, `Completed` or
    /// `Cancelled`. Submitting while another job runs is rejected with
    /// [`TransferError::Busy`] and leaves the running job untouched.
    pub fn submit(
        &self,
        job: CopyJob,
        remote: Arc<dyn RemoteFs>,
        cancel: CancelToken,
    ) -> Result<mpsc::UnboundedReceiver<CopyEvent>, TransferError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Rejected copy of {} files: job already running", job.total());
            return Err(TransferError::Busy);
        }

        let guard = ActiveGuard(Arc::clone(&self.active));
        let (tx, rx) = mpsc::unbounded_channel();
        tracing::info!(
            "{} {} files from {} to {}",
            job.direction.verb(),
            job.total(),
            job.source_path,
            job.dest_path
        );

        tokio::task::spawn_blocking(move || {
            let last = run_job(&job, remote.as_ref(), &cancel, |event| {
                let _ = tx.send(event);
            });
            // Free the slot before the final event so a follow-up submit is accepted
            drop(guard);
            let _ = tx.send(last);
        });

        Ok(rx)
    }
}

/// Copy `job.files` in order, stopping at the first failure.
///
/// Progress events go to `emit`; the terminal event is returned.
pub fn run_job(
    job: &CopyJob,
    remote: &dyn RemoteFs,
    cancel: &CancelToken,
    mut emit: impl FnMut(CopyEvent),
) -> CopyEvent {
    let total = job.total();
    for (index, name) in job.files.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!("Copy cancelled after {} of {} files", index, total);
            return CopyEvent::Cancelled { completed: index };
        }

        let source = job.source_file(name);
        let dest = job.dest_file(name);
        match copy_file(remote, job.direction, &source, &dest) {
            Ok(bytes) => {
                tracing::info!("Copied {} -> {} ({} bytes)", source, dest, bytes);
                emit(CopyEvent::Progress {
                    index,
                    file_name: name.clone(),
                    fraction: (index + 1) as f64 / total as f64,
                });
            }
            Err(e) => {
                tracing::error!("Copy of {} failed: {:#}", source, e);
                return CopyEvent::Failed {
                    index,
                    file_name: name.clone(),
                    cause: format!("{e:#}"),
                };
            }
        }
    }
    CopyEvent::Completed { count: total }
}

fn copy_file(
    remote: &dyn RemoteFs,
    direction: CopyDirection,
    source: &str,
    dest: &str,
) -> Result<u64> {
    // Must run before the destination is created
    let is_file = match direction {
        CopyDirection::LocalToRemote => fs::metadata(source)
            .with_context(|| format!("Failed to stat local file {source}"))?
            .is_file(),
        CopyDirection::RemoteToLocal => remote.is_file(source)?,
    };
    if !is_file {
        bail!("{source} is not a regular file");
    }

    match direction {
        CopyDirection::LocalToRemote => {
            let mut reader =
                File::open(source).with_context(|| format!("Failed to open local file {source}"))?;
            let mut writer = remote.write_file(dest)?;
            let bytes = io::copy(&mut reader, &mut writer).context("Upload interrupted")?;
            writer.flush().context("Failed to flush remote file")?;
            Ok(bytes)
        }
        CopyDirection::RemoteToLocal => {
            let mut reader = remote.read_file(source)?;
            let mut writer =
                File::create(dest).with_context(|| format!("Failed to create local file {dest}"))?;
            let bytes = io::copy(&mut reader, &mut writer).context("Download interrupted")?;
            writer.flush().context("Failed to flush local file")?;
            Ok(bytes)
        }
    }
}

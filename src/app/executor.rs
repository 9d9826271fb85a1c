use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::app_event::{AppEvent, Command};
use crate::models::Side;
use crate::sftp_logic::local::list_local;
use crate::sftp_logic::ListingResult;
use crate::ssh_service::Connector;

/// Runs controller commands on the blocking pool and reports back over `events`.
#[derive(Clone)]
pub struct Executor {
    connector: Arc<dyn Connector>,
    events: UnboundedSender<AppEvent>,
}

impl Executor {
    pub fn new(connector: Arc<dyn Connector>, events: UnboundedSender<AppEvent>) -> Self {
        Self { connector, events }
    }

    pub fn dispatch(&self, command: Command) {
        tracing::debug!("Dispatching {:?}", command);
        let events = self.events.clone();

        match command {
            Command::List { request, remote } => {
                tokio::task::spawn_blocking(move || {
                    let outcome = match request.side {
                        Side::Local => list_local(&request.path),
                        Side::Remote => remote.list_dir(&request.path),
                    }
                    .map_err(|e| format!("{e:#}"));
                    let _ = events.send(AppEvent::Listing(ListingResult::for_request(
                        &request, outcome,
                    )));
                });
            }
            Command::Connect {
                attempt,
                target,
                credential,
            } => {
                let connector = Arc::clone(&self.connector);
                tokio::task::spawn_blocking(move || {
                    let event = match connector.connect(&target, credential.as_deref()) {
                        Ok(remote) => AppEvent::SessionReady {
                            attempt,
                            target,
                            remote,
                        },
                        Err(error) => {
                            tracing::warn!("Connect to {} failed: {}", target.alias, error);
                            AppEvent::SessionFailed {
                                attempt,
                                target,
                                error,
                            }
                        }
                    };
                    let _ = events.send(event);
                });
            }
            Command::StartCopy {
                job,
                remote,
                orchestrator,
                cancel,
            } => match orchestrator.submit(job, remote, cancel) {
                Ok(mut progress) => {
                    tokio::spawn(async move {
                        while let Some(event) = progress.recv().await {
                            if events.send(AppEvent::Copy(event)).is_err() {
                                break;
                            }
                        }
                    });
                }
                Err(err) => {
                    let _ = events.send(AppEvent::CopyRejected(err));
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectError, TransferError};
    use crate::models::{ConnectionTarget, CopyDirection, Entry};
    use crate::sftp_logic::remote::test_support::MemoryRemote;
    use crate::sftp_logic::{CancelToken, CopyEvent, CopyJob, CopyOrchestrator, ListingRequest};
    use crate::ssh_service::test_support::FakeConnector;
    use tokio::sync::mpsc;

    fn target() -> ConnectionTarget {
        ConnectionTarget::new("box".into(), "box.lan".into(), "me".into())
    }

    #[tokio::test]
    async fn remote_listing_comes_back_tagged() {
        let remote = Arc::new(MemoryRemote::default());
        remote.set_dir("/srv", vec![Entry::file("a.txt", 3)]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let executor = Executor::new(Arc::new(FakeConnector::default()), tx);

        executor.dispatch(Command::List {
            request: ListingRequest {
                side: Side::Remote,
                path: "/srv".into(),
                generation: 7,
            },
            remote,
        });

        match rx.recv().await {
            Some(AppEvent::Listing(result)) => {
                assert_eq!(result.generation, 7);
                assert_eq!(result.path, "/srv");
                assert_eq!(result.outcome.unwrap().len(), 1);
            }
            other => panic!("expected listing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn listing_errors_are_delivered_as_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let executor = Executor::new(Arc::new(FakeConnector::default()), tx);

        executor.dispatch(Command::List {
            request: ListingRequest {
                side: Side::Remote,
                path: "/missing".into(),
                generation: 1,
            },
            remote: Arc::new(MemoryRemote::default()),
        });

        match rx.recv().await {
            Some(AppEvent::Listing(result)) => {
                assert!(result.outcome.unwrap_err().contains("no such directory"))
            }
            other => panic!("expected listing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_reports_outcome_with_attempt() {
        let remote: Arc<dyn crate::sftp_logic::RemoteFs> = Arc::new(MemoryRemote::default());
        let connector = FakeConnector::with_remote(Arc::clone(&remote));
        connector.accept_secret("box", "hunter2");
        connector.ambient("agent", Ok(remote));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let executor = Executor::new(Arc::new(connector), tx);

        executor.dispatch(Command::Connect {
            attempt: 3,
            target: target(),
            credential: None,
        });
        match rx.recv().await {
            Some(AppEvent::SessionFailed { attempt, error, .. }) => {
                assert_eq!(attempt, 3);
                assert_eq!(error, ConnectError::NeedsCredential);
            }
            other => panic!("expected failure, got {other:?}"),
        }

        executor.dispatch(Command::Connect {
            attempt: 4,
            target: target(),
            credential: Some("hunter2".into()),
        });
        match rx.recv().await {
            Some(AppEvent::SessionReady { attempt, .. }) => assert_eq!(attempt, 4),
            other => panic!("expected session, got {other:?}"),
        }

        // Agent or key auth succeeds without ever prompting
        executor.dispatch(Command::Connect {
            attempt: 5,
            target: ConnectionTarget::new("agent".into(), "agent.lan".into(), "me".into()),
            credential: None,
        });
        match rx.recv().await {
            Some(AppEvent::SessionReady { attempt, target, .. }) => {
                assert_eq!(attempt, 5);
                assert_eq!(target.alias, "agent");
            }
            other => panic!("expected session, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn copy_events_are_forwarded_and_busy_is_reported() {
        let remote = Arc::new(MemoryRemote::default());
        remote.put_file("/srv/a", b"a");
        let release = remote.gate_writes();
        let dir = crate::sftp_logic::local::temp_dir("exec-copy");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let executor = Executor::new(Arc::new(FakeConnector::default()), tx);
        let orchestrator = CopyOrchestrator::default();

        std::fs::write(dir.join("up"), b"up").unwrap();
        executor.dispatch(Command::StartCopy {
            job: CopyJob::new(
                vec!["up".into()],
                dir.to_str().unwrap(),
                "/srv",
                CopyDirection::LocalToRemote,
            ),
            remote: remote.clone(),
            orchestrator: orchestrator.clone(),
            cancel: CancelToken::default(),
        });
        executor.dispatch(Command::StartCopy {
            job: CopyJob::new(
                vec!["a".into()],
                "/srv",
                dir.to_str().unwrap(),
                CopyDirection::RemoteToLocal,
            ),
            remote: remote.clone(),
            orchestrator,
            cancel: CancelToken::default(),
        });

        match rx.recv().await {
            Some(AppEvent::CopyRejected(err)) => assert_eq!(err, TransferError::Busy),
            other => panic!("expected rejection, got {other:?}"),
        }
        drop(release);

        let mut events = Vec::new();
        while let Some(AppEvent::Copy(event)) = rx.recv().await {
            let done = event.is_terminal();
            events.push(event);
            if done {
                break;
            }
        }
        assert_eq!(events.last(), Some(&CopyEvent::Completed { count: 1 }));
        assert_eq!(remote.file("/srv/up"), Some(b"up".to_vec()));
        std::fs::remove_dir_all(dir).unwrap();
    }
}

use ssh2::Session;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConnectError;
use crate::models::ConnectionTarget;
use crate::sftp_logic::{RemoteFs, SftpRemote};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_IDENTITIES: &[&str] = &["id_ed25519", "id_ecdsa", "id_rsa"];

/// Opens an authenticated remote filesystem for a target.
///
/// Blocking; the controller only ever calls it from the blocking pool.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        target: &ConnectionTarget,
        credential: Option<&str>,
    ) -> Result<Arc<dyn RemoteFs>, ConnectError>;
}

#[derive(Debug, Default)]
pub struct SshConnector;

impl Connector for SshConnector {
    fn connect(
        &self,
        target: &ConnectionTarget,
        credential: Option<&str>,
    ) -> Result<Arc<dyn RemoteFs>, ConnectError> {
        tracing::info!(
            "Opening SFTP session to {} ({})",
            target.alias,
            target.label()
        );
        let session = open_session(target)?;

        match credential {
            None => authenticate_ambient(&session, target)?,
            Some(secret) => authenticate_with_secret(&session, target, secret)?,
        }

        let remote = SftpRemote::open(session)
            .map_err(|e| ConnectError::Unreachable(format!("{e:#}")))?;
        tracing::info!("SFTP session ready for {}", target.alias);
        Ok(Arc::new(remote))
    }
}

fn open_session(target: &ConnectionTarget) -> Result<Session, ConnectError> {
    let address = target.address();
    let addrs = address
        .to_socket_addrs()
        .map_err(|e| ConnectError::Unreachable(format!("cannot resolve {address}: {e}")))?;

    let mut last_err = None;
    let mut tcp = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => {
                tcp = Some(stream);
                break;
            }
            Err(err) => last_err = Some(err),
        }
    }
    let tcp = tcp.ok_or_else(|| {
        let err =
            last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "no address"));
        tracing::warn!("TCP connect to {} failed: {}", address, err);
        ConnectError::Unreachable(format!("{address}: {err}"))
    })?;
    tcp.set_read_timeout(Some(CONNECT_TIMEOUT)).ok();
    tcp.set_write_timeout(Some(CONNECT_TIMEOUT)).ok();

    let mut session =
        Session::new().map_err(|e| ConnectError::Unreachable(format!("create session: {e}")))?;
    session.set_timeout(CONNECT_TIMEOUT.as_millis() as u32);
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| ConnectError::Unreachable(format!("ssh handshake: {e}")))?;
    Ok(session)
}

/// Agent first, then unencrypted identity files.
fn authenticate_ambient(session: &Session, target: &ConnectionTarget) -> Result<(), ConnectError> {
    match session.userauth_agent(&target.user) {
        Ok(()) if session.authenticated() => {
            tracing::info!("Authenticated {} via ssh-agent", target.user);
            return Ok(());
        }
        Ok(()) => {}
        Err(e) => tracing::debug!("ssh-agent auth unavailable: {}", e),
    }

    if try_identities(session, target, None) {
        return Ok(());
    }

    tracing::info!("No ambient credential accepted for {}", target.alias);
    Err(ConnectError::NeedsCredential)
}

/// Identity files with the secret as passphrase, then password auth.
fn authenticate_with_secret(
    session: &Session,
    target: &ConnectionTarget,
    secret: &str,
) -> Result<(), ConnectError> {
    if try_identities(session, target, Some(secret)) {
        return Ok(());
    }

    match session.userauth_password(&target.user, secret) {
        Ok(()) if session.authenticated() => {
            tracing::info!("Authenticated {} via password", target.user);
            Ok(())
        }
        Ok(()) => Err(ConnectError::AuthFailed("credential rejected".to_string())),
        Err(e) => {
            tracing::warn!("Password auth for {} failed: {}", target.user, e);
            Err(ConnectError::AuthFailed(e.message().to_string()))
        }
    }
}

fn try_identities(session: &Session, target: &ConnectionTarget, passphrase: Option<&str>) -> bool {
    for path in identity_candidates(target) {
        if !path.exists() {
            continue;
        }
        match session.userauth_pubkey_file(&target.user, None, &path, passphrase) {
            Ok(()) if session.authenticated() => {
                tracing::info!("Authenticated {} with key {}", target.user, path.display());
                return true;
            }
            Ok(()) => {}
            Err(e) => tracing::debug!("Key {} rejected: {}", path.display(), e),
        }
    }
    false
}

/// Configured `IdentityFile` first, then the usual keys under `~/.ssh`.
pub fn identity_candidates(target: &ConnectionTarget) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(configured) = &target.identity_file {
        paths.push(expand_tilde(configured));
    }
    if let Some(home) = dirs::home_dir() {
        for name in DEFAULT_IDENTITIES {
            let path = home.join(".ssh").join(name);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Connector answering from a script keyed by target alias.
    #[derive(Default)]
    pub(crate) struct FakeConnector {
        ambient: Mutex<HashMap<String, Result<Arc<dyn RemoteFs>, ConnectError>>>,
        secrets: Mutex<HashMap<String, String>>,
        remote: Mutex<Option<Arc<dyn RemoteFs>>>,
    }

    impl FakeConnector {
        pub(crate) fn with_remote(remote: Arc<dyn RemoteFs>) -> Self {
            let connector = Self::default();
            *connector.remote.lock().unwrap() = Some(remote);
            connector
        }

        pub(crate) fn ambient(&self, alias: &str, outcome: Result<Arc<dyn RemoteFs>, ConnectError>) {
            self.ambient
                .lock()
                .unwrap()
                .insert(alias.to_string(), outcome);
        }

        pub(crate) fn accept_secret(&self, alias: &str, secret: &str) {
            self.secrets
                .lock()
                .unwrap()
                .insert(alias.to_string(), secret.to_string());
        }
    }

    impl Connector for FakeConnector {
        fn connect(
            &self,
            target: &ConnectionTarget,
            credential: Option<&str>,
        ) -> Result<Arc<dyn RemoteFs>, ConnectError> {
            match credential {
                None => self
                    .ambient
                    .lock()
                    .unwrap()
                    .get(&target.alias)
                    .cloned()
                    .unwrap_or(Err(ConnectError::NeedsCredential)),
                Some(secret) => {
                    let expected = self.secrets.lock().unwrap().get(&target.alias).cloned();
                    match (expected, self.remote.lock().unwrap().clone()) {
                        (Some(expected), Some(remote)) if expected == secret => Ok(remote),
                        _ => Err(ConnectError::AuthFailed("credential rejected".into())),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_identity_comes_first() {
        let mut target = ConnectionTarget::new("box".into(), "box.lan".into(), "me".into());
        target.identity_file = Some(PathBuf::from("/keys/deploy"));
        let candidates = identity_candidates(&target);
        assert_eq!(candidates[0], PathBuf::from("/keys/deploy"));
        if dirs::home_dir().is_some() {
            assert_eq!(candidates.len(), 4);
            assert!(candidates[1].ends_with(".ssh/id_ed25519"));
            assert!(candidates[3].ends_with(".ssh/id_rsa"));
        }
    }

    #[test]
    fn tilde_expands_to_home() {
        assert_eq!(expand_tilde(Path::new("/etc/key")), PathBuf::from("/etc/key"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/.ssh/id")), home.join(".ssh/id"));
        }
    }

    #[test]
    fn closed_port_is_unreachable() {
        let mut target = ConnectionTarget::new("dead".into(), "127.0.0.1".into(), "me".into());
        target.port = Some(1);
        match SshConnector.connect(&target, None) {
            Err(ConnectError::Unreachable(message)) => assert!(message.contains("127.0.0.1:1")),
            Err(other) => panic!("expected unreachable, got {other:?}"),
            Ok(_) => panic!("expected unreachable, got a session"),
        }
    }
}

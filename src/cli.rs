use clap::Parser;
use std::path::PathBuf;

/// Browse a local and a remote directory side by side and copy files between them.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "sftpr", version, about)]
pub struct Args {
    /// Directory holding sftpr.toml and hosts.toml
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// OpenSSH client config to read hosts from
    #[arg(long, value_name = "FILE")]
    pub ssh_config: Option<PathBuf>,

    /// Directory for log files
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Remote directory opened after connecting
    #[arg(long, value_name = "PATH")]
    pub remote_path: Option<String>,

    /// Local directory opened after connecting
    #[arg(long, value_name = "PATH")]
    pub local_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let args = Args::parse_from([
            "sftpr",
            "--ssh-config",
            "/tmp/ssh_config",
            "--remote-path",
            "/srv",
        ]);
        assert_eq!(args.ssh_config, Some(PathBuf::from("/tmp/ssh_config")));
        assert_eq!(args.remote_path.as_deref(), Some("/srv"));
        assert!(args.local_path.is_none());
    }
}

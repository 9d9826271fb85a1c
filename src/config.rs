use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::error::AppError;
use crate::models::ConnectionTarget;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub ssh_file_config: String,
    pub remote_start_path: String,
    pub local_start_path: Option<String>,
    pub log_dir: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HostGroup {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub hosts: Vec<ConnectionTarget>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct HostsConfig {
    #[serde(default)]
    pub groups: Vec<HostGroup>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let ssh_config_path = dirs::home_dir()
            .map(|home| home.join(".ssh").join("config"))
            .unwrap_or_else(|| PathBuf::from(".ssh/config"));
        Self {
            ssh_file_config: ssh_config_path.to_string_lossy().into_owned(),
            remote_start_path: "/".to_string(),
            local_start_path: None,
            log_dir: None,
        }
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    config_file: PathBuf,
    hosts_file: PathBuf,
}

impl ConfigManager {
    /// Use `config_dir` if given, else `<config_dir>/sftpr`.
    pub fn new(config_dir: Option<PathBuf>) -> Result<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => dirs::config_dir()
                .context("Could not find config directory")?
                .join("sftpr"),
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        Ok(Self {
            config_file: config_dir.join("sftpr.toml"),
            hosts_file: config_dir.join("hosts.toml"),
        })
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        // First run writes the defaults so the user has something to edit
        if !self.config_file.exists() {
            self.save_config(&AppConfig::default())?;
        }

        let content =
            fs::read_to_string(&self.config_file).context("Failed to read config file")?;
        let config: AppConfig = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(&self.config_file, toml).context("Failed to write config file")?;
        Ok(())
    }

    /// Custom hosts from `hosts.toml`, each tagged with its group name.
    pub fn load_hosts(&self) -> Result<Vec<ConnectionTarget>> {
        if !self.hosts_file.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.hosts_file).context("Failed to read hosts file")?;
        let config: HostsConfig =
            toml::from_str(&content).context("Failed to parse hosts file")?;

        let mut hosts = Vec::new();
        for group in config.groups {
            for mut host in group.hosts {
                host.group = Some(group.name.clone());
                hosts.push(host);
            }
        }
        Ok(hosts)
    }
}

/// Parse an OpenSSH client config into connection targets, in file order.
///
/// Only `Host`, `HostName`, `User`, `Port` and `IdentityFile` are read.
/// A `Host` line with several aliases yields one target per alias; pattern
/// aliases (`*`, `?`, negations) describe defaults rather than destinations
/// and are skipped.
pub fn parse_ssh_config(content: &str) -> Vec<ConnectionTarget> {
    let mut targets = Vec::new();
    let mut block: Vec<ConnectionTarget> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.splitn(2, |c: char| c.is_whitespace() || c == '=');
        let key = parts.next().unwrap_or_default().to_lowercase();
        let value = parts.next().unwrap_or_default().trim().trim_start_matches('=').trim();
        if value.is_empty() {
            continue;
        }

        match key.as_str() {
            "host" => {
                targets.extend(block.drain(..).map(finish_target));
                for alias in value.split_whitespace() {
                    if is_pattern(alias) {
                        tracing::debug!("Skipping pattern host '{}'", alias);
                        continue;
                    }
                    block.push(ConnectionTarget::new(
                        alias.to_string(),
                        String::new(),
                        "root".to_string(),
                    ));
                }
            }
            "match" => {
                targets.extend(block.drain(..).map(finish_target));
            }
            "port" => match value.parse::<u16>() {
                Ok(port) => block.iter_mut().for_each(|target| target.port = Some(port)),
                Err(_) if !block.is_empty() => tracing::warn!("Ignoring invalid port '{}'", value),
                Err(_) => {}
            },
            _ => {
                for target in block.iter_mut() {
                    match key.as_str() {
                        "hostname" => target.host = value.to_string(),
                        "user" => target.user = value.to_string(),
                        "identityfile" => target.identity_file = Some(PathBuf::from(value)),
                        _ => {}
                    }
                }
            }
        }
    }

    targets.extend(block.into_iter().map(finish_target));
    targets
}

fn is_pattern(alias: &str) -> bool {
    alias.contains(['*', '?', '!'])
}

fn finish_target(mut target: ConnectionTarget) -> ConnectionTarget {
    // ssh falls back to the alias itself when HostName is absent
    if target.host.is_empty() {
        target.host = target.alias.clone();
    }
    target
}

pub fn load_ssh_config(path: &Path) -> Result<Vec<ConnectionTarget>> {
    if !path.exists() {
        tracing::warn!("SSH config file not found at {:?}", path);
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read SSH config file {}", path.display()))?;
    let targets = parse_ssh_config(&content);
    tracing::info!("Loaded {} hosts from SSH config", targets.len());
    Ok(targets)
}

/// Custom hosts first, then ssh config hosts; later duplicates of an alias are dropped.
pub fn merge_targets(
    custom: Vec<ConnectionTarget>,
    system: Vec<ConnectionTarget>,
) -> Vec<ConnectionTarget> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(custom.len() + system.len());
    for target in custom.into_iter().chain(system) {
        if seen.insert(target.alias.clone()) {
            merged.push(target);
        } else {
            tracing::warn!("Duplicate alias found: {}", target.alias);
        }
    }
    merged
}

/// Everything the controller needs at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub targets: Vec<ConnectionTarget>,
    pub local_start_path: String,
    pub remote_start_path: String,
}

impl Settings {
    /// Resolve config files and CLI overrides into targets and start paths.
    pub fn discover(args: &Args) -> Result<Self, AppError> {
        let manager = ConfigManager::new(args.config_dir.clone()).map_err(config_error)?;
        let config = manager.load_config().map_err(config_error)?;

        let ssh_config = args
            .ssh_config
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.ssh_file_config));
        let system = load_ssh_config(&ssh_config).map_err(config_error)?;
        let custom = manager.load_hosts().map_err(config_error)?;
        let targets = merge_targets(custom, system);

        let local_start_path = match args.local_path.clone().or(config.local_start_path) {
            Some(path) => path,
            None => std::env::current_dir()
                .context("Failed to get current directory")
                .map_err(config_error)?
                .to_string_lossy()
                .into_owned(),
        };
        let remote_start_path = args
            .remote_path
            .clone()
            .unwrap_or(config.remote_start_path);

        tracing::info!(
            "Discovered {} targets (local start {}, remote start {})",
            targets.len(),
            local_start_path,
            remote_start_path
        );
        Ok(Self {
            targets,
            local_start_path,
            remote_start_path,
        })
    }
}

/// Where log files go: CLI flag, then config file, then the data directory.
pub fn resolve_log_dir(args: &Args) -> PathBuf {
    if let Some(dir) = &args.log_dir {
        return dir.clone();
    }
    let from_config = ConfigManager::new(args.config_dir.clone())
        .and_then(|manager| manager.load_config())
        .ok()
        .and_then(|config| config.log_dir);
    match from_config {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("sftpr")
            .join("logs"),
    }
}

fn config_error(err: anyhow::Error) -> AppError {
    AppError::Config(format!("{err:#}"))
}

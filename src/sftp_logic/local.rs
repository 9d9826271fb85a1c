use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{sort_entries, Entry};

/// Read the contents of a local directory
pub fn list_local(path: &str) -> Result<Vec<Entry>> {
    let dir = fs::read_dir(path).with_context(|| format!("Failed to read local directory {path}"))?;

    let mut items = Vec::new();
    for entry in dir {
        let entry = entry.context("Failed to read directory entry")?;
        let name = entry.file_name().to_string_lossy().to_string();
        // Broken symlinks and races with deletion are skipped rather than failing the listing
        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", name, e);
                continue;
            }
        };

        items.push(Entry {
            name,
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
            is_dir: metadata.is_dir(),
        });
    }

    sort_entries(&mut items);
    Ok(items)
}

/// A local path with no parent is a filesystem root (`/`, `C:\`).
pub fn is_local_root(path: &str) -> bool {
    Path::new(path).parent().is_none()
}

pub fn local_parent(path: &str) -> String {
    match Path::new(path).parent() {
        Some(parent) => parent.to_string_lossy().to_string(),
        None => path.to_string(),
    }
}

pub fn local_join(base: &str, name: &str) -> String {
    PathBuf::from(base).join(name).to_string_lossy().to_string()
}

#[cfg(test)]
pub(crate) fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("sftpr-{prefix}-{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_directories_before_files() {
        let dir = temp_dir("list");
        fs::create_dir(dir.join("sub")).unwrap();
        fs::write(dir.join("a.txt"), b"hello").unwrap();

        let entries = list_local(dir.to_str().unwrap()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "sub");
        assert!(entries[0].is_dir);
        assert_eq!(entries[1].name, "a.txt");
        assert_eq!(entries[1].size, 5);
        assert!(entries[1].modified.is_some());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = temp_dir("missing").join("nope");
        assert!(list_local(dir.to_str().unwrap()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn root_and_parent_follow_native_rules() {
        assert!(is_local_root("/"));
        assert!(!is_local_root("/home"));
        assert_eq!(local_parent("/home/user"), "/home");
        assert_eq!(local_parent("/home"), "/");
        assert_eq!(local_parent("/"), "/");
        assert_eq!(local_join("/home", "user"), "/home/user");
        assert_eq!(local_join("/", "etc"), "/etc");
    }
}

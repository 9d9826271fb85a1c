use chrono::{DateTime, Local};

use crate::models::{Entry, Side};

/// A directory listing to run off the event loop.
///
/// `generation` is unique per request; results carry it back so a pane can
/// tell its latest request apart from ones superseded by later navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub side: Side,
    pub path: String,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct ListingResult {
    pub side: Side,
    pub path: String,
    pub generation: u64,
    pub outcome: Result<Vec<Entry>, String>,
}

impl ListingResult {
    pub fn for_request(request: &ListingRequest, outcome: Result<Vec<Entry>, String>) -> Self {
        Self {
            side: request.side,
            path: request.path.clone(),
            generation: request.generation,
            outcome,
        }
    }
}

/// What a pane did with a delivered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingOutcome {
    Applied { count: usize },
    Failed(String),
    Stale,
}

/// One rendered line of a pane.
#[derive(Debug, Clone, PartialEq)]
pub struct PaneRow {
    pub is_cursor: bool,
    pub is_selected: bool,
    pub is_parent: bool,
    pub is_dir: bool,
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
}

impl PaneRow {
    pub fn parent(is_cursor: bool) -> Self {
        Self {
            is_cursor,
            is_selected: false,
            is_parent: true,
            is_dir: true,
            name: "..".to_string(),
            size: 0,
            modified: None,
        }
    }

    pub fn entry(entry: &Entry, is_cursor: bool, is_selected: bool) -> Self {
        Self {
            is_cursor,
            is_selected,
            is_parent: false,
            is_dir: entry.is_dir,
            name: entry.name.clone(),
            size: entry.size,
            modified: entry.modified,
        }
    }

    pub fn cursor_marker(&self) -> &'static str {
        if self.is_cursor {
            ">"
        } else {
            " "
        }
    }

    pub fn selection_marker(&self) -> &'static str {
        if self.is_selected {
            "✓"
        } else {
            " "
        }
    }

    pub fn type_tag(&self) -> &'static str {
        if self.is_dir {
            "[DIR] "
        } else {
            "[FILE]"
        }
    }

    pub fn size_label(&self) -> String {
        if self.is_dir {
            String::new()
        } else {
            format_file_size(self.size)
        }
    }

    pub fn modified_label(&self) -> String {
        self.modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }

    /// Plain-text form: cursor, selection, type, name, size.
    pub fn text(&self) -> String {
        let size = self.size_label();
        if size.is_empty() {
            format!(
                "{} {} {} {}",
                self.cursor_marker(),
                self.selection_marker(),
                self.type_tag(),
                self.name
            )
        } else {
            format!(
                "{} {} {} {} ({})",
                self.cursor_marker(),
                self.selection_marker(),
                self.type_tag(),
                self.name,
                size
            )
        }
    }
}

pub fn format_file_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

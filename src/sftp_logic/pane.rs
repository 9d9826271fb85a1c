use std::collections::BTreeSet;

use super::local::{is_local_root, local_join, local_parent};
use super::remote::{is_remote_root, remote_clean, remote_join, remote_parent};
use super::types::{ListingOutcome, ListingRequest, ListingResult, PaneRow};
use crate::models::{Entry, Side};

/// One side of the browser.
///
/// `cursor` is a display row: when the pane is not at its root, row 0 is the
/// synthetic ".." row and entry `i` sits on row `i + 1`. `selection` holds
/// indices into `entries`, never display rows.
#[derive(Debug, Clone)]
pub struct PaneState {
    side: Side,
    path: String,
    /// Path the current `entries` were listed from.
    listed_path: String,
    cursor: usize,
    selection: BTreeSet<usize>,
    entries: Vec<Entry>,
    scroll_offset: usize,
    pending: Option<u64>,
    error: Option<String>,
}

impl PaneState {
    pub fn new(side: Side, path: impl Into<String>) -> Self {
        let path = match side {
            Side::Local => path.into(),
            Side::Remote => remote_clean(&path.into()),
        };
        Self {
            side,
            listed_path: path.clone(),
            path,
            cursor: 0,
            selection: BTreeSet::new(),
            entries: Vec::new(),
            scroll_offset: 0,
            pending: None,
            error: None,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn selection(&self) -> &BTreeSet<usize> {
        &self.selection
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_root(&self) -> bool {
        match self.side {
            Side::Local => is_local_root(&self.path),
            Side::Remote => is_remote_root(&self.path),
        }
    }

    pub fn shows_parent_row(&self) -> bool {
        !self.is_root()
    }

    fn row_offset(&self) -> usize {
        usize::from(self.shows_parent_row())
    }

    pub fn row_count(&self) -> usize {
        self.entries.len() + self.row_offset()
    }

    /// Data index behind a display row; `None` for the ".." row or past the end.
    pub fn data_index(&self, display: usize) -> Option<usize> {
        let index = display.checked_sub(self.row_offset())?;
        (index < self.entries.len()).then_some(index)
    }

    pub fn display_index(&self, data: usize) -> usize {
        data + self.row_offset()
    }

    pub fn cursor_entry(&self) -> Option<&Entry> {
        self.data_index(self.cursor).and_then(|i| self.entries.get(i))
    }

    fn last_row(&self) -> usize {
        self.row_count().saturating_sub(1)
    }

    fn set_cursor(&mut self, row: usize) {
        // Pinned to the top while a reload is outstanding
        if self.is_loading() {
            self.cursor = 0;
            return;
        }
        self.cursor = row.min(self.last_row());
    }

    pub fn move_up(&mut self) {
        self.set_cursor(self.cursor.saturating_sub(1));
    }

    pub fn move_down(&mut self) {
        self.set_cursor(self.cursor.saturating_add(1));
    }

    pub fn page_up(&mut self, rows: usize) {
        self.set_cursor(self.cursor.saturating_sub(rows.max(1)));
    }

    pub fn page_down(&mut self, rows: usize) {
        self.set_cursor(self.cursor.saturating_add(rows.max(1)));
    }

    pub fn move_to_top(&mut self) {
        self.set_cursor(0);
    }

    pub fn move_to_bottom(&mut self) {
        self.set_cursor(self.last_row());
    }

    /// Toggle the entry under the cursor. Returns whether anything changed.
    pub fn toggle_selection(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        let Some(index) = self.data_index(self.cursor) else {
            return false;
        };
        if !self.selection.remove(&index) {
            self.selection.insert(index);
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected entry names in display order.
    pub fn selected_names(&self) -> Vec<String> {
        self.selection
            .iter()
            .filter_map(|&i| self.entries.get(i))
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Enter the row under the cursor: ".." goes to the parent, a directory is
    /// descended into, anything else is ignored.
    pub fn activate(&mut self, generation: u64) -> Option<ListingRequest> {
        if self.is_loading() {
            // Rows on screen still belong to the previous directory
            return None;
        }
        if self.cursor == 0 && self.shows_parent_row() {
            return Some(self.go_parent(generation));
        }
        let entry = self.cursor_entry()?;
        if !entry.is_dir {
            return None;
        }
        let target = self.child_path(&entry.name);
        Some(self.begin_listing(target, generation))
    }

    /// Like `activate` but never leaves via the ".." row.
    pub fn enter_directory(&mut self, generation: u64) -> Option<ListingRequest> {
        if self.is_loading() {
            return None;
        }
        let entry = self.cursor_entry()?;
        if !entry.is_dir {
            return None;
        }
        let target = self.child_path(&entry.name);
        Some(self.begin_listing(target, generation))
    }

    /// Always reloads, even at the root.
    pub fn go_parent(&mut self, generation: u64) -> ListingRequest {
        let parent = match self.side {
            Side::Local => local_parent(&self.path),
            Side::Remote => remote_parent(&self.path),
        };
        self.begin_listing(parent, generation)
    }

    pub fn reload(&mut self, generation: u64) -> ListingRequest {
        let path = self.path.clone();
        self.begin_listing(path, generation)
    }

    fn child_path(&self, name: &str) -> String {
        match self.side {
            Side::Local => local_join(&self.path, name),
            Side::Remote => remote_join(&self.path, name),
        }
    }

    fn begin_listing(&mut self, path: String, generation: u64) -> ListingRequest {
        self.path = path;
        self.pending = Some(generation);
        self.cursor = 0;
        self.scroll_offset = 0;
        self.selection.clear();
        self.error = None;
        ListingRequest {
            side: self.side,
            path: self.path.clone(),
            generation,
        }
    }

    /// Apply a listing if it answers this pane's latest request.
    pub fn apply_listing(&mut self, result: ListingResult) -> ListingOutcome {
        if result.side != self.side
            || self.pending != Some(result.generation)
            || result.path != self.path
        {
            return ListingOutcome::Stale;
        }

        self.pending = None;
        match result.outcome {
            Ok(entries) => {
                let count = entries.len();
                self.entries = entries;
                self.listed_path = self.path.clone();
                self.selection.clear();
                self.cursor = 0;
                self.scroll_offset = 0;
                self.error = None;
                ListingOutcome::Applied { count }
            }
            Err(message) => {
                // Prior content stays, and so does the path it came from
                self.path = self.listed_path.clone();
                self.cursor = self.cursor.min(self.last_row());
                self.error = Some(message.clone());
                ListingOutcome::Failed(message)
            }
        }
    }

    /// Keep the cursor inside a viewport of `height` rows.
    pub fn sync_scroll(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + height {
            self.scroll_offset = self.cursor + 1 - height;
        }
        let max_offset = self.row_count().saturating_sub(height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    pub fn rows(&self) -> Vec<PaneRow> {
        let mut rows = Vec::with_capacity(self.row_count());
        if self.shows_parent_row() {
            rows.push(PaneRow::parent(self.cursor == 0));
        }
        for (i, entry) in self.entries.iter().enumerate() {
            rows.push(PaneRow::entry(
                entry,
                self.cursor == self.display_index(i),
                self.selection.contains(&i),
            ));
        }
        rows
    }
}

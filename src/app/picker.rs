use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};

use crate::models::ConnectionTarget;

/// The target list shown in `SelectingTarget`, with optional fuzzy filter.
#[derive(Debug, Clone)]
pub struct TargetPicker {
    targets: Vec<ConnectionTarget>,
    // Indices into `targets` in display order
    visible: Vec<usize>,
    cursor: usize,
    query: Option<String>,
    connecting: Option<u64>,
}

impl TargetPicker {
    pub fn new(targets: Vec<ConnectionTarget>) -> Self {
        let visible = (0..targets.len()).collect();
        Self {
            targets,
            visible,
            cursor: 0,
            query: None,
            connecting: None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn visible(&self) -> impl Iterator<Item = &ConnectionTarget> + '_ {
        self.visible.iter().filter_map(|&i| self.targets.get(i))
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn selected(&self) -> Option<&ConnectionTarget> {
        self.visible
            .get(self.cursor)
            .and_then(|&i| self.targets.get(i))
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.visible.len() {
            self.cursor += 1;
        }
    }

    pub fn connecting(&self) -> Option<u64> {
        self.connecting
    }

    pub fn set_connecting(&mut self, attempt: Option<u64>) {
        self.connecting = attempt;
    }

    // Search logic

    pub fn is_searching(&self) -> bool {
        self.query.is_some()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn enter_search(&mut self) {
        self.query = Some(String::new());
        self.refilter();
    }

    /// Leave search and show every target again, keeping the selected one under the cursor.
    pub fn exit_search(&mut self) {
        let selected = self.visible.get(self.cursor).copied();
        self.query = None;
        self.visible = (0..self.targets.len()).collect();
        self.cursor = selected.unwrap_or(0);
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(query) = &mut self.query {
            query.push(c);
            self.refilter();
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(query) = &mut self.query {
            query.pop();
            self.refilter();
        }
    }

    fn refilter(&mut self) {
        let query = self.query.as_deref().unwrap_or_default();
        if query.is_empty() {
            self.visible = (0..self.targets.len()).collect();
        } else {
            let matcher = SkimMatcherV2::default();
            let mut scored: Vec<(usize, i64)> = self
                .targets
                .iter()
                .enumerate()
                .filter_map(|(i, target)| {
                    let haystack = format!("{} {} {}", target.alias, target.host, target.user);
                    matcher.fuzzy_match(&haystack, query).map(|score| (i, score))
                })
                .collect();
            scored.sort_by(|a, b| b.1.cmp(&a.1));
            self.visible = scored.into_iter().map(|(i, _)| i).collect();
        }
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picker() -> TargetPicker {
        TargetPicker::new(vec![
            ConnectionTarget::new("web-prod".into(), "10.0.0.1".into(), "deploy".into()),
            ConnectionTarget::new("db-prod".into(), "10.0.0.2".into(), "postgres".into()),
            ConnectionTarget::new("nas".into(), "nas.lan".into(), "admin".into()),
        ])
    }

    #[test]
    fn cursor_is_clamped() {
        let mut picker = picker();
        picker.move_up();
        assert_eq!(picker.cursor(), 0);
        for _ in 0..5 {
            picker.move_down();
        }
        assert_eq!(picker.cursor(), 2);
        assert_eq!(picker.selected().map(|t| t.alias.as_str()), Some("nas"));
    }

    #[test]
    fn search_filters_and_restores() {
        let mut picker = picker();
        picker.enter_search();
        for c in "postg".chars() {
            picker.push_char(c);
        }
        assert_eq!(picker.visible_len(), 1);
        assert_eq!(picker.selected().map(|t| t.alias.as_str()), Some("db-prod"));

        picker.exit_search();
        assert!(!picker.is_searching());
        assert_eq!(picker.visible_len(), 3);
        assert_eq!(picker.selected().map(|t| t.alias.as_str()), Some("db-prod"));
    }

    #[test]
    fn no_match_selects_nothing() {
        let mut picker = picker();
        picker.enter_search();
        for c in "zzzz".chars() {
            picker.push_char(c);
        }
        assert_eq!(picker.visible_len(), 0);
        assert!(picker.selected().is_none());
        picker.pop_char();
        picker.pop_char();
        picker.pop_char();
        picker.pop_char();
        assert_eq!(picker.visible_len(), 3);
    }

    #[test]
    fn empty_target_list_is_valid() {
        let mut picker = TargetPicker::new(Vec::new());
        picker.move_down();
        assert!(picker.is_empty());
        assert!(picker.selected().is_none());
    }
}

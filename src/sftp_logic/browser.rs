use super::pane::PaneState;
use super::transfer::CopyJob;
use super::types::{ListingOutcome, ListingRequest, ListingResult};
use crate::models::{CopyDirection, Side};

const DEFAULT_PAGE_ROWS: usize = 10;

/// Input the browser understands, already decoupled from key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserAction {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
    ToggleSelection,
    Activate,
    EnterDirectory,
    GoParent,
    SwitchFocus,
    Refresh,
    Copy,
}

impl BrowserAction {
    /// Actions that may change a selection or the listing it indexes into.
    pub fn mutates_selection(self) -> bool {
        matches!(
            self,
            BrowserAction::ToggleSelection
                | BrowserAction::Activate
                | BrowserAction::EnterDirectory
                | BrowserAction::GoParent
                | BrowserAction::Refresh
                | BrowserAction::Copy
        )
    }
}

/// Follow-up work the browser asks the controller to run.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserCommand {
    List(ListingRequest),
    Copy(CopyJob),
}

/// The local and remote panes plus which one has focus.
#[derive(Debug, Clone)]
pub struct BrowserState {
    local: PaneState,
    remote: PaneState,
    focus: Side,
    next_generation: u64,
    page_rows: usize,
}

impl BrowserState {
    /// Listing generations start at `first_generation`, which must be above any
    /// generation an earlier browser handed out so its late results stay stale.
    pub fn new(
        local_path: impl Into<String>,
        remote_path: impl Into<String>,
        first_generation: u64,
    ) -> Self {
        Self {
            local: PaneState::new(Side::Local, local_path),
            remote: PaneState::new(Side::Remote, remote_path),
            focus: Side::Local,
            next_generation: first_generation,
            page_rows: DEFAULT_PAGE_ROWS,
        }
    }

    /// Listings for both sides, issued once when a session opens.
    pub fn initial_requests(&mut self) -> Vec<ListingRequest> {
        vec![self.refresh(Side::Local), self.refresh(Side::Remote)]
    }

    pub fn focus(&self) -> Side {
        self.focus
    }

    pub fn pane(&self, side: Side) -> &PaneState {
        match side {
            Side::Local => &self.local,
            Side::Remote => &self.remote,
        }
    }

    fn pane_mut(&mut self, side: Side) -> &mut PaneState {
        match side {
            Side::Local => &mut self.local,
            Side::Remote => &mut self.remote,
        }
    }

    pub fn focused_pane(&self) -> &PaneState {
        self.pane(self.focus)
    }

    pub fn set_page_rows(&mut self, rows: usize) {
        self.page_rows = rows.max(1);
    }

    /// Keep both cursors visible in viewports of `height` rows.
    pub fn sync_scroll(&mut self, height: usize) {
        self.local.sync_scroll(height);
        self.remote.sync_scroll(height);
    }

    /// The generation the next listing request will carry.
    pub fn next_generation(&self) -> u64 {
        self.next_generation
    }

    fn generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    pub fn switch_focus(&mut self) {
        self.focus = self.focus.other();
        tracing::debug!("Focus moved to {:?} pane", self.focus);
    }

    pub fn refresh(&mut self, side: Side) -> ListingRequest {
        let generation = self.generation();
        self.pane_mut(side).reload(generation)
    }

    pub fn handle(&mut self, action: BrowserAction) -> Option<BrowserCommand> {
        let side = self.focus;
        let page = self.page_rows;
        match action {
            BrowserAction::MoveUp => self.pane_mut(side).move_up(),
            BrowserAction::MoveDown => self.pane_mut(side).move_down(),
            BrowserAction::PageUp => self.pane_mut(side).page_up(page),
            BrowserAction::PageDown => self.pane_mut(side).page_down(page),
            BrowserAction::Top => self.pane_mut(side).move_to_top(),
            BrowserAction::Bottom => self.pane_mut(side).move_to_bottom(),
            BrowserAction::ToggleSelection => {
                self.pane_mut(side).toggle_selection();
            }
            BrowserAction::Activate => {
                let generation = self.generation();
                return self
                    .pane_mut(side)
                    .activate(generation)
                    .map(BrowserCommand::List);
            }
            BrowserAction::EnterDirectory => {
                let generation = self.generation();
                return self
                    .pane_mut(side)
                    .enter_directory(generation)
                    .map(BrowserCommand::List);
            }
            BrowserAction::GoParent => {
                let generation = self.generation();
                return Some(BrowserCommand::List(self.pane_mut(side).go_parent(generation)));
            }
            BrowserAction::SwitchFocus => self.switch_focus(),
            BrowserAction::Refresh => return Some(BrowserCommand::List(self.refresh(side))),
            BrowserAction::Copy => return self.initiate_copy().map(BrowserCommand::Copy),
        }
        None
    }

    /// Build a copy job from the focused pane's selection, if there is one.
    pub fn initiate_copy(&self) -> Option<CopyJob> {
        let source = self.focused_pane();
        let files = source.selected_names();
        if files.is_empty() {
            return None;
        }
        let dest = self.pane(self.focus.other());
        Some(CopyJob::new(
            files,
            source.path(),
            dest.path(),
            CopyDirection::from_source(self.focus),
        ))
    }

    pub fn clear_selection(&mut self, side: Side) {
        self.pane_mut(side).clear_selection();
    }

    pub fn apply_listing(&mut self, result: ListingResult) -> ListingOutcome {
        let side = result.side;
        let path = result.path.clone();
        let outcome = self.pane_mut(side).apply_listing(result);
        match &outcome {
            ListingOutcome::Applied { count } => {
                tracing::debug!("{:?} pane listed {} ({} entries)", side, path, count)
            }
            ListingOutcome::Failed(message) => {
                tracing::warn!("{:?} pane failed to list {}: {}", side, path, message)
            }
            ListingOutcome::Stale => {
                tracing::debug!("Discarding stale {:?} listing for {}", side, path)
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entry;

    fn browser_with(local: Vec<Entry>, remote: Vec<Entry>) -> BrowserState {
        let mut browser = BrowserState::new("/home/user", "/srv", 1);
        let requests = browser.initial_requests();
        browser.apply_listing(ListingResult::for_request(&requests[0], Ok(local)));
        browser.apply_listing(ListingResult::for_request(&requests[1], Ok(remote)));
        browser
    }

    fn list_request(command: Option<BrowserCommand>) -> ListingRequest {
        match command {
            Some(BrowserCommand::List(request)) => request,
            other => panic!("expected a listing request, got {other:?}"),
        }
    }

    #[test]
    fn initial_requests_cover_both_sides() {
        let mut browser = BrowserState::new("/home/user", "/", 1);
        let requests = browser.initial_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].side, Side::Local);
        assert_eq!(requests[0].path, "/home/user");
        assert_eq!(requests[1].side, Side::Remote);
        assert_eq!(requests[1].path, "/");
        assert_ne!(requests[0].generation, requests[1].generation);
    }

    #[test]
    fn switching_focus_keeps_pane_state() {
        let mut browser = browser_with(
            vec![Entry::file("a", 1), Entry::file("b", 1)],
            vec![Entry::file("r", 1)],
        );
        browser.handle(BrowserAction::MoveDown);
        browser.handle(BrowserAction::ToggleSelection);
        let before = browser.pane(Side::Local).clone();

        browser.handle(BrowserAction::SwitchFocus);
        assert_eq!(browser.focus(), Side::Remote);
        browser.handle(BrowserAction::MoveDown);

        let after = browser.pane(Side::Local);
        assert_eq!(after.cursor(), before.cursor());
        assert_eq!(after.selection(), before.selection());
        assert_eq!(browser.pane(Side::Remote).cursor(), 1);
    }

    #[test]
    fn copy_with_empty_selection_is_noop() {
        let mut browser = browser_with(vec![Entry::file("a", 1)], Vec::new());
        assert!(browser.handle(BrowserAction::Copy).is_none());
    }

    #[test]
    fn copy_builds_job_from_focused_selection() {
        let mut browser = browser_with(
            Vec::new(),
            vec![Entry::dir("logs"), Entry::file("a.txt", 1), Entry::file("b.txt", 2)],
        );
        browser.handle(BrowserAction::SwitchFocus);
        // rows: .., logs, a.txt, b.txt
        browser.handle(BrowserAction::Bottom);
        browser.handle(BrowserAction::ToggleSelection);
        browser.handle(BrowserAction::MoveUp);
        browser.handle(BrowserAction::ToggleSelection);

        let job = match browser.handle(BrowserAction::Copy) {
            Some(BrowserCommand::Copy(job)) => job,
            other => panic!("expected copy job, got {other:?}"),
        };
        assert_eq!(job.files, vec!["a.txt".to_string(), "b.txt".to_string()]);
        assert_eq!(job.source_path, "/srv");
        assert_eq!(job.dest_path, "/home/user");
        assert_eq!(job.direction, CopyDirection::RemoteToLocal);
    }

    #[test]
    fn parent_row_enter_survives_keystrokes_while_pending() {
        // Non-root local pane with [A(dir), B(file)], cursor on ".."
        let mut browser = browser_with(
            vec![Entry::dir("A"), Entry::file("B", 3)],
            Vec::new(),
        );
        assert_eq!(browser.focused_pane().cursor(), 0);
        let request = list_request(browser.handle(BrowserAction::Activate));
        assert_eq!(request.path, "/home");

        // Keystrokes while the reload is outstanding
        browser.handle(BrowserAction::MoveDown);
        browser.handle(BrowserAction::MoveDown);
        browser.handle(BrowserAction::ToggleSelection);
        assert_eq!(browser.focused_pane().cursor(), 0);
        assert!(browser.focused_pane().selection().is_empty());

        let outcome = browser.apply_listing(ListingResult::for_request(
            &request,
            Ok(vec![Entry::dir("user"), Entry::dir("guest")]),
        ));
        assert_eq!(outcome, ListingOutcome::Applied { count: 2 });
        let pane = browser.focused_pane();
        assert_eq!(pane.path(), "/home");
        assert_eq!(pane.cursor(), 0);
        assert!(pane.selection().is_empty());
    }

    #[test]
    fn newer_navigation_wins_over_earlier_response() {
        let mut browser = browser_with(vec![Entry::dir("A")], Vec::new());
        let first = list_request(browser.handle(BrowserAction::Activate));
        let second = list_request(browser.handle(BrowserAction::GoParent));
        assert_eq!(first.path, "/home");
        assert_eq!(second.path, "/");

        let late = browser.apply_listing(ListingResult::for_request(
            &first,
            Ok(vec![Entry::dir("user")]),
        ));
        assert_eq!(late, ListingOutcome::Stale);
        assert_eq!(browser.focused_pane().path(), "/");
        assert!(browser.focused_pane().is_loading());
    }

    #[test]
    fn listing_for_one_side_leaves_the_other_alone() {
        let mut browser = browser_with(vec![Entry::file("a", 1)], vec![Entry::file("r", 1)]);
        browser.handle(BrowserAction::MoveDown);
        browser.handle(BrowserAction::ToggleSelection);
        let remote_request = browser.refresh(Side::Remote);
        browser.apply_listing(ListingResult::for_request(&remote_request, Ok(Vec::new())));
        assert_eq!(browser.pane(Side::Local).selection().len(), 1);
    }

    #[test]
    fn selection_mutating_actions_are_flagged() {
        assert!(BrowserAction::ToggleSelection.mutates_selection());
        assert!(BrowserAction::GoParent.mutates_selection());
        assert!(BrowserAction::Copy.mutates_selection());
        assert!(!BrowserAction::MoveDown.mutates_selection());
        assert!(!BrowserAction::SwitchFocus.mutates_selection());
    }
}

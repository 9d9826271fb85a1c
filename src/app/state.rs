use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::keymap;
use super::picker::TargetPicker;
use super::types::{App, CopyProgress, CredentialPrompt, Screen, Session};
use crate::app_event::{AppEvent, Command, Msg};
use crate::config::Settings;
use crate::error::{AppError, ConnectError, TransferError};
use crate::models::ConnectionTarget;
use crate::sftp_logic::{
    BrowserCommand, BrowserState, CancelToken, CopyEvent, CopyJob, CopyOrchestrator,
    ListingOutcome, ListingResult, RemoteFs,
};

const STATUS_TTL: Duration = Duration::from_secs(5);
// Header, status line, footer, progress area and pane borders
const PANE_CHROME_ROWS: u16 = 8;

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            screen: Screen::SelectingTarget,
            picker: TargetPicker::new(settings.targets),
            status_message: None,
            local_start_path: settings.local_start_path,
            remote_start_path: settings.remote_start_path,
            next_attempt: 1,
            next_generation: 1,
            pane_rows: 10,
        }
    }

    pub fn should_quit(&self) -> bool {
        matches!(self.screen, Screen::Exiting)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("Status: {}", message);
        self.status_message = Some((message, Instant::now()));
    }

    /// The status text, while it is fresh or a connection attempt is outstanding.
    pub fn status(&self) -> Option<&str> {
        let (message, at) = self.status_message.as_ref()?;
        if at.elapsed() < STATUS_TTL || self.is_connecting() {
            Some(message.as_str())
        } else {
            None
        }
    }

    pub fn is_connecting(&self) -> bool {
        match &self.screen {
            Screen::SelectingTarget => self.picker.connecting().is_some(),
            Screen::AwaitingCredential(prompt) => prompt.pending.is_some(),
            _ => false,
        }
    }

    fn next_attempt(&mut self) -> u64 {
        let attempt = self.next_attempt;
        self.next_attempt += 1;
        attempt
    }

    fn enter(&mut self, screen: Screen) {
        tracing::info!("{} -> {}", self.screen.name(), screen.name());
        self.screen = screen;
    }

    /// Advance the state machine by one message.
    ///
    /// Never performs I/O; follow-up work is returned as commands for the
    /// executor, whose results come back later as `Msg::Event`.
    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::Key(key) => self.on_key(key),
            Msg::Resize { height, .. } => {
                self.resize(height);
                Vec::new()
            }
            Msg::Event(event) => self.on_event(event),
        }
    }

    fn resize(&mut self, height: u16) {
        self.pane_rows = height.saturating_sub(PANE_CHROME_ROWS).max(1) as usize;
        let rows = self.pane_rows;
        if let Screen::Browsing(session) | Screen::Copying(session, _) = &mut self.screen {
            session.browser.set_page_rows(rows);
            session.browser.sync_scroll(rows);
        }
    }

    fn quit(&mut self) {
        if let Screen::Copying(_, progress) = &self.screen {
            progress.cancel.cancel();
        }
        self.enter(Screen::Exiting);
    }

    fn on_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        if keymap::is_force_quit(&key) {
            self.quit();
            return Vec::new();
        }

        match &self.screen {
            Screen::SelectingTarget if self.picker.is_searching() => self.handle_search_key(key),
            Screen::SelectingTarget => self.handle_picker_key(key),
            Screen::AwaitingCredential(_) => self.handle_credential_key(key),
            Screen::Browsing(_) => self.handle_browser_key(key),
            Screen::Copying(..) => self.handle_copying_key(key),
            Screen::Exiting => Vec::new(),
        }
    }

    // Target selection

    fn handle_picker_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if keymap::is_quit(&key) {
            self.quit();
            return Vec::new();
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.picker.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.picker.move_down(),
            KeyCode::Char('/') => self.picker.enter_search(),
            KeyCode::Enter => return self.connect_selected(),
            KeyCode::Esc => {
                if let Some(attempt) = self.picker.connecting() {
                    tracing::info!("Abandoning connect attempt {}", attempt);
                    self.picker.set_connecting(None);
                    self.set_status("Connection cancelled");
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Esc => self.picker.exit_search(),
            KeyCode::Enter => return self.connect_selected(),
            KeyCode::Up => self.picker.move_up(),
            KeyCode::Down => self.picker.move_down(),
            KeyCode::Backspace => self.picker.pop_char(),
            _ => {
                if let Some(c) = keymap::typed_char(&key) {
                    self.picker.push_char(c);
                }
            }
        }
        Vec::new()
    }

    fn connect_selected(&mut self) -> Vec<Command> {
        if self.picker.connecting().is_some() {
            return Vec::new();
        }
        let Some(target) = self.picker.selected().cloned() else {
            return Vec::new();
        };

        let attempt = self.next_attempt();
        self.picker.set_connecting(Some(attempt));
        self.set_status(format!("Connecting to {}...", target.alias));
        vec![Command::Connect {
            attempt,
            target,
            credential: None,
        }]
    }

    // Credential entry

    fn handle_credential_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let Screen::AwaitingCredential(prompt) = &mut self.screen else {
            return Vec::new();
        };

        match key.code {
            KeyCode::Esc => {
                let alias = prompt.target.alias.clone();
                self.enter(Screen::SelectingTarget);
                self.set_status(format!("Authentication for {alias} cancelled"));
            }
            KeyCode::Enter => {
                if prompt.pending.is_some() || prompt.input.is_empty() {
                    return Vec::new();
                }
                let target = prompt.target.clone();
                let credential = prompt.input.clone();
                let attempt = self.next_attempt();
                if let Screen::AwaitingCredential(prompt) = &mut self.screen {
                    prompt.pending = Some(attempt);
                }
                self.set_status(format!("Authenticating to {}...", target.alias));
                return vec![Command::Connect {
                    attempt,
                    target,
                    credential: Some(credential),
                }];
            }
            KeyCode::Backspace if prompt.pending.is_none() => {
                prompt.input.pop();
            }
            _ => {
                if let Some(c) = keymap::typed_char(&key) {
                    if prompt.pending.is_none() {
                        prompt.input.push(c);
                    }
                }
            }
        }
        Vec::new()
    }

    // Browsing

    fn handle_browser_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if keymap::is_quit(&key) {
            self.quit();
            return Vec::new();
        }
        if key.code == KeyCode::Esc {
            self.disconnect();
            return Vec::new();
        }
        let Some(action) = keymap::browser_action(&key) else {
            return Vec::new();
        };

        let rows = self.pane_rows;
        let Screen::Browsing(session) = &mut self.screen else {
            return Vec::new();
        };
        let command = session.browser.handle(action);
        session.browser.sync_scroll(rows);

        match command {
            Some(BrowserCommand::List(request)) => vec![Command::List {
                request,
                remote: Arc::clone(&session.remote),
            }],
            Some(BrowserCommand::Copy(job)) => self.start_copy(job),
            None => Vec::new(),
        }
    }

    fn disconnect(&mut self) {
        let Screen::Browsing(session) = &self.screen else {
            return;
        };
        let alias = session.target.alias.clone();
        self.next_generation = session.browser.next_generation();
        // Replacing the screen drops the session, which closes the SFTP channel
        self.enter(Screen::SelectingTarget);
        self.set_status(format!("Disconnected from {alias}"));
    }

    /// Move the session out of `Browsing`/`Copying`; the caller installs the next screen.
    fn take_session(&mut self) -> Option<Session> {
        match mem::replace(&mut self.screen, Screen::Exiting) {
            Screen::Browsing(session) | Screen::Copying(session, _) => Some(session),
            other => {
                self.screen = other;
                None
            }
        }
    }

    fn start_copy(&mut self, job: CopyJob) -> Vec<Command> {
        if let Screen::Browsing(session) = &self.screen {
            if session.orchestrator.is_active() {
                self.set_status(AppError::from(TransferError::Busy).to_string());
                return Vec::new();
            }
        }
        let from = self.screen.name();
        let Some(session) = self.take_session() else {
            return Vec::new();
        };

        let cancel = CancelToken::default();
        let command = Command::StartCopy {
            job: job.clone(),
            remote: Arc::clone(&session.remote),
            orchestrator: session.orchestrator.clone(),
            cancel: cancel.clone(),
        };
        let status = format!(
            "{} {} files to {}",
            job.direction.verb(),
            job.total(),
            job.dest_path
        );

        self.screen = Screen::Copying(session, CopyProgress::new(job, cancel));
        tracing::info!("{} -> {}", from, self.screen.name());
        self.set_status(status);
        vec![command]
    }

    fn handle_copying_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if keymap::is_quit(&key) {
            self.quit();
            return Vec::new();
        }

        let rows = self.pane_rows;
        let Screen::Copying(session, progress) = &mut self.screen else {
            return Vec::new();
        };

        if key.code == KeyCode::Esc {
            if !progress.cancelling {
                progress.cancel.cancel();
                progress.cancelling = true;
                self.set_status("Cancelling after the current file...");
            }
            return Vec::new();
        }

        match keymap::browser_action(&key) {
            Some(action) if action.mutates_selection() => {
                tracing::debug!("Rejected {:?} while copying", action);
                self.set_status("Copy in progress; wait for it to finish or press Esc to cancel");
            }
            Some(action) => {
                // Only cursor and focus changes get here; they never produce commands
                let _ = session.browser.handle(action);
                session.browser.sync_scroll(rows);
            }
            None => {}
        }
        Vec::new()
    }

    // Background results

    fn on_event(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::Listing(result) => {
                self.on_listing(result);
                Vec::new()
            }
            AppEvent::SessionReady {
                attempt,
                target,
                remote,
            } => self.on_session_ready(attempt, target, remote),
            AppEvent::SessionFailed {
                attempt,
                target,
                error,
            } => {
                self.on_session_failed(attempt, target, error);
                Vec::new()
            }
            AppEvent::Copy(event) => self.on_copy_event(event),
            AppEvent::CopyRejected(err) => {
                self.on_copy_rejected(err);
                Vec::new()
            }
        }
    }

    fn on_listing(&mut self, result: ListingResult) {
        let rows = self.pane_rows;
        let path = result.path.clone();
        let outcome = match &mut self.screen {
            Screen::Browsing(session) | Screen::Copying(session, _) => {
                let outcome = session.browser.apply_listing(result);
                session.browser.sync_scroll(rows);
                outcome
            }
            _ => {
                tracing::debug!("Dropping listing for {} with no open session", path);
                return;
            }
        };

        if let ListingOutcome::Failed(message) = outcome {
            self.set_status(AppError::Listing { path, message }.to_string());
        }
    }

    fn expected_attempt(&self) -> Option<u64> {
        match &self.screen {
            Screen::SelectingTarget => self.picker.connecting(),
            Screen::AwaitingCredential(prompt) => prompt.pending,
            _ => None,
        }
    }

    fn on_session_ready(
        &mut self,
        attempt: u64,
        target: ConnectionTarget,
        remote: Arc<dyn RemoteFs>,
    ) -> Vec<Command> {
        if self.expected_attempt() != Some(attempt) {
            tracing::info!(
                "Closing session to {} from abandoned attempt {}",
                target.alias,
                attempt
            );
            return Vec::new();
        }
        self.picker.set_connecting(None);

        let mut browser = BrowserState::new(
            self.local_start_path.clone(),
            self.remote_start_path.clone(),
            self.next_generation,
        );
        browser.set_page_rows(self.pane_rows);
        let commands = browser
            .initial_requests()
            .into_iter()
            .map(|request| Command::List {
                request,
                remote: Arc::clone(&remote),
            })
            .collect();

        self.set_status(format!("Connected to {}", target.label()));
        self.enter(Screen::Browsing(Session {
            target,
            remote,
            browser,
            orchestrator: CopyOrchestrator::default(),
        }));
        commands
    }

    fn on_session_failed(&mut self, attempt: u64, target: ConnectionTarget, error: ConnectError) {
        if self.expected_attempt() != Some(attempt) {
            tracing::debug!("Ignoring failure of abandoned attempt {}", attempt);
            return;
        }
        self.picker.set_connecting(None);

        let ambient = matches!(self.screen, Screen::SelectingTarget);
        if ambient && error.needs_credential() {
            self.set_status(format!(
                "{} needs a passphrase or password",
                target.alias
            ));
            self.enter(Screen::AwaitingCredential(CredentialPrompt::new(target)));
            return;
        }

        let err = AppError::Auth {
            target: target.alias,
            source: error,
        };
        tracing::warn!("{}", err);
        self.set_status(err.to_string());
        self.enter(Screen::SelectingTarget);
    }

    fn on_copy_event(&mut self, event: CopyEvent) -> Vec<Command> {
        let Screen::Copying(session, progress) = &mut self.screen else {
            tracing::debug!("Ignoring {:?} outside a copy", event);
            return Vec::new();
        };

        progress.job.record(&event);
        if !event.is_terminal() {
            if let CopyEvent::Progress {
                index, file_name, ..
            } = &event
            {
                tracing::debug!("Copied {} ({}/{})", file_name, index + 1, progress.job.total());
                progress.current_file = progress.job.files.get(index + 1).cloned();
            }
            return Vec::new();
        }

        let job = progress.job.clone();
        let source = job.direction.source();
        session.browser.clear_selection(source);
        // Destination listing is stale once files have landed
        let request = session.browser.refresh(source.other());
        let command = Command::List {
            request,
            remote: Arc::clone(&session.remote),
        };

        let message = match &event {
            CopyEvent::Completed { count } => {
                format!("Copied {} files to {}", count, job.dest_path)
            }
            CopyEvent::Failed {
                file_name, cause, ..
            } => AppError::from(TransferError::File {
                file: file_name.clone(),
                cause: cause.clone(),
            })
            .to_string(),
            CopyEvent::Cancelled { completed } => format!(
                "Copy cancelled after {} of {} files",
                completed,
                job.total()
            ),
            CopyEvent::Progress { .. } => String::new(),
        };
        self.set_status(message);
        self.finish_copy();
        vec![command]
    }

    fn on_copy_rejected(&mut self, err: TransferError) {
        if matches!(self.screen, Screen::Copying(..)) {
            self.set_status(AppError::from(err).to_string());
            self.finish_copy();
        }
    }

    fn finish_copy(&mut self) {
        if !matches!(self.screen, Screen::Copying(..)) {
            return;
        }
        let from = self.screen.name();
        if let Some(session) = self.take_session() {
            self.screen = Screen::Browsing(session);
            tracing::info!("{} -> {}", from, self.screen.name());
        }
    }
}

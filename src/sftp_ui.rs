use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        block::{Position, Title},
        Block, Borders, Gauge, List, ListItem,
    },
    Frame,
};

use crate::app::{App, CopyProgress, Session};
use crate::models::Side;
use crate::sftp_logic::{PaneRow, PaneState};
use crate::ui::{draw_header, footer::draw_footer, status_bar::draw_status_bar};

pub fn draw_browser<B: Backend>(
    f: &mut Frame,
    app: &App,
    session: &Session,
    progress: Option<&CopyProgress>,
) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Panes
            Constraint::Length(if progress.is_some() { 3 } else { 0 }),
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Footer
        ])
        .split(f.size());

    draw_header::<B>(
        f,
        main_chunks[0],
        &format!("{} ({})", session.target.alias, session.target.label()),
    );

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[1]);

    let browser = &session.browser;
    for (side, area) in [(Side::Local, panels[0]), (Side::Remote, panels[1])] {
        draw_file_panel::<B>(f, area, browser.pane(side), browser.focus() == side);
    }

    if let Some(progress) = progress {
        draw_progress::<B>(f, main_chunks[2], progress);
    }
    draw_status_bar::<B>(f, app, main_chunks[3]);
    draw_footer::<B>(f, app, main_chunks[4]);
}

fn draw_file_panel<B: Backend>(f: &mut Frame, area: Rect, pane: &PaneState, is_active: bool) {
    let accent = if is_active { Color::Green } else { Color::Gray };

    let mut title = format!("{}: {}", pane.side().title(), pane.path());
    if pane.is_loading() {
        title.push_str(" (loading...)");
    }
    if !pane.selection().is_empty() {
        title.push_str(&format!(" [{} selected]", pane.selection().len()));
    }

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(title)
        .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD));
    if let Some(error) = pane.error() {
        block = block.title(
            Title::from(Span::styled(
                format!(" {error} "),
                Style::default().fg(Color::Red),
            ))
            .position(Position::Bottom),
        );
    }

    let visible = area.height.saturating_sub(2) as usize;
    let list_items: Vec<ListItem> = pane
        .rows()
        .iter()
        .skip(pane.scroll_offset())
        .take(visible)
        .map(|row| row_item(row, is_active))
        .collect();

    f.render_widget(List::new(list_items).block(block), area);
}

fn row_item(row: &PaneRow, is_active: bool) -> ListItem<'static> {
    let highlighted = row.is_cursor && is_active;
    let base = if highlighted {
        Color::Black
    } else {
        Color::White
    };

    let name_color = if highlighted {
        Color::Black
    } else if row.is_parent {
        Color::Cyan
    } else if row.is_dir {
        Color::Blue
    } else {
        Color::White
    };

    let mut spans = vec![
        Span::styled(
            format!("{} ", row.cursor_marker()),
            Style::default().fg(if highlighted { base } else { Color::Yellow }),
        ),
        Span::styled(
            format!("{} ", row.selection_marker()),
            Style::default().fg(if highlighted { base } else { Color::Yellow }),
        ),
        Span::styled(
            format!("{} ", row.type_tag()),
            Style::default().fg(if highlighted { base } else { Color::DarkGray }),
        ),
        Span::styled(row.name.clone(), Style::default().fg(name_color)),
    ];

    let size = row.size_label();
    if !size.is_empty() {
        spans.push(Span::styled(
            format!(" ({})", size),
            Style::default().fg(if highlighted { base } else { Color::Gray }),
        ));
    }
    let modified = row.modified_label();
    if !modified.is_empty() {
        spans.push(Span::styled(
            format!("  {}", modified),
            Style::default()
                .fg(if highlighted { base } else { Color::DarkGray })
                .add_modifier(Modifier::DIM),
        ));
    }

    let style = if highlighted {
        Style::default()
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else if row.is_cursor {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };

    ListItem::new(Line::from(spans)).style(style)
}

fn draw_progress<B: Backend>(f: &mut Frame, area: Rect, progress: &CopyProgress) {
    let (title, color) = if progress.cancelling {
        (" Cancelling ", Color::Red)
    } else {
        (" Copying ", Color::Yellow)
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title),
        )
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .ratio(progress.job.fraction().clamp(0.0, 1.0))
        .label(progress.status_line());

    f.render_widget(gauge, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Screen;
    use crate::config::Settings;
    use crate::models::{ConnectionTarget, CopyDirection, Entry};
    use crate::sftp_logic::remote::test_support::MemoryRemote;
    use crate::sftp_logic::{BrowserState, CancelToken, CopyJob, CopyOrchestrator, ListingResult};
    use crate::ui::{draw, test_support::render};
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn browsing_app() -> App {
        let mut app = App::new(Settings {
            targets: Vec::new(),
            local_start_path: "/home/user".into(),
            remote_start_path: "/".into(),
        });
        let mut browser = BrowserState::new("/home/user", "/", 1);
        let requests = browser.initial_requests();
        browser.apply_listing(ListingResult::for_request(
            &requests[0],
            Ok(vec![Entry::dir("docs"), Entry::file("notes.txt", 2048)]),
        ));
        browser.apply_listing(ListingResult::for_request(
            &requests[1],
            Ok(vec![Entry::dir("etc")]),
        ));
        app.screen = Screen::Browsing(Session {
            target: ConnectionTarget::new("web".into(), "web.lan".into(), "deploy".into()),
            remote: Arc::new(MemoryRemote::default()),
            browser,
            orchestrator: CopyOrchestrator::default(),
        });
        app
    }

    #[test]
    fn panes_show_markers_tags_and_sizes() {
        let app = browsing_app();
        let screen = render(100, 14, |f| draw::<TestBackend>(f, &app)).join("\n");

        assert!(screen.contains("Local: /home/user"), "{screen}");
        assert!(screen.contains("Remote: /"), "{screen}");
        assert!(screen.contains(">   [DIR]  .."), "{screen}");
        assert!(screen.contains("    [DIR]  docs"), "{screen}");
        assert!(screen.contains("    [FILE] notes.txt (2.0 KB)"), "{screen}");
        // Remote root has no parent row
        assert!(screen.contains(">   [DIR]  etc"), "{screen}");
    }

    #[test]
    fn copying_shows_progress_line() {
        let mut app = browsing_app();
        if let Screen::Browsing(session) = std::mem::replace(&mut app.screen, Screen::Exiting) {
            let mut job = CopyJob::new(
                vec!["a.bin".into(), "b.bin".into()],
                "/home/user",
                "/",
                CopyDirection::LocalToRemote,
            );
            job.completed = 1;
            let mut progress = CopyProgress::new(job, CancelToken::default());
            progress.current_file = Some("b.bin".into());
            app.screen = Screen::Copying(session, progress);
        }

        let screen = render(100, 16, |f| draw::<TestBackend>(f, &app)).join("\n");
        assert!(screen.contains("Uploading b.bin (2/2, 50%)"), "{screen}");
        assert!(screen.contains("Copying"), "{screen}");
    }
}

pub mod footer;
pub mod status_bar;
pub mod targets;

use crate::app::{App, CredentialPrompt, Screen};
use crate::sftp_ui::draw_browser;
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use footer::draw_footer;
use status_bar::draw_status_bar;
use targets::draw_targets;

/// Render one frame for whatever screen the app is on.
pub fn draw<B: Backend>(f: &mut Frame, app: &App) {
    match &app.screen {
        Screen::Browsing(session) => draw_browser::<B>(f, app, session, None),
        Screen::Copying(session, progress) => draw_browser::<B>(f, app, session, Some(progress)),
        Screen::SelectingTarget | Screen::AwaitingCredential(_) | Screen::Exiting => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Length(1), // Header
                        Constraint::Min(3),    // Target list
                        Constraint::Length(1), // Status bar
                        Constraint::Length(1), // Footer
                    ]
                    .as_ref(),
                )
                .split(f.size());

            draw_header::<B>(f, chunks[0], "Select a host");
            draw_targets::<B>(f, app, chunks[1]);
            draw_status_bar::<B>(f, app, chunks[2]);
            draw_footer::<B>(f, app, chunks[3]);

            if let Screen::AwaitingCredential(prompt) = &app.screen {
                draw_credential_prompt::<B>(f, prompt);
            }
        }
    }
}

pub fn draw_header<B: Backend>(f: &mut Frame, area: Rect, subtitle: &str) {
    let line = Line::from(vec![
        Span::styled(
            " sftpr ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(subtitle.to_string(), Style::default().fg(Color::Gray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_credential_prompt<B: Backend>(f: &mut Frame, prompt: &CredentialPrompt) {
    let area = centered_rect(60, 9, f.size());

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Passphrase Required ")
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .border_style(Style::default().fg(Color::Yellow));

    let state_line = if prompt.pending.is_some() {
        Line::from(Span::styled(
            "Authenticating...",
            Style::default().fg(Color::Cyan),
        ))
    } else {
        Line::from(Span::styled(
            "Enter: confirm  Esc: cancel",
            Style::default().fg(Color::Gray),
        ))
    };

    let text = vec![
        Line::from(format!("Host: {}", prompt.target.label())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Secret: ", Style::default().fg(Color::Gray)),
            Span::styled(prompt.masked(), Style::default().fg(Color::White)),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(""),
        state_line,
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Left);

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

/// Helper function to center a rectangle with given width and height
pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height)) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

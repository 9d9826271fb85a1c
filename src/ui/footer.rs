use crate::app::{App, Screen};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

/// Key help for the current screen: (navigation, actions).
pub fn help_text(app: &App) -> (&'static str, &'static str) {
    match &app.screen {
        Screen::SelectingTarget if app.is_connecting() => {
            ("Connecting to host...", "[Esc] Cancel [Ctrl+C] Quit")
        }
        Screen::SelectingTarget if app.picker.is_searching() => (
            "↑: Up  ↓: Down  [Enter] Connect",
            "[Esc] Exit Search  Type to filter",
        ),
        Screen::SelectingTarget => (
            "↑/k: Up  ↓/j: Down  [Enter] Connect  [/] Search",
            "[q] Quit",
        ),
        Screen::AwaitingCredential(_) => ("Type passphrase or password", "[Enter] Submit [Esc] Cancel"),
        Screen::Browsing(_) => (
            "↑/↓ Move  [Enter]/→ Open  ←/[Bksp] Up  [Tab] Switch  [Space] Select",
            "[c] Copy [r] Refresh [Esc] Disconnect [q] Quit",
        ),
        Screen::Copying(..) => ("↑/↓ Move  [Tab] Switch", "[Esc] Cancel copy [q] Quit"),
        Screen::Exiting => ("", ""),
    }
}

pub fn draw_footer<B: Backend>(f: &mut Frame, app: &App, area: Rect) {
    let footer = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let (nav_text, action_text) = help_text(app);
    let busy = app.is_connecting();

    let nav_help = Paragraph::new(nav_text).style(Style::default().fg(if busy {
        Color::Yellow
    } else {
        Color::Gray
    }));

    let action_help = Paragraph::new(action_text)
        .style(Style::default().fg(if busy { Color::Red } else { Color::Gray }))
        .alignment(Alignment::Right);

    f.render_widget(nav_help, footer[0]);
    f.render_widget(action_help, footer[1]);
}

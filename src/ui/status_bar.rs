use crate::app::App;
use ratatui::{
    backend::Backend,
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

pub fn status_color(message: &str) -> Color {
    let lower = message.to_lowercase();
    if lower.contains("error")
        || lower.contains("failed")
        || lower.contains("cannot")
        || lower.contains("unreachable")
    {
        Color::Red
    } else if lower.contains("connected to") || lower.contains("copied") {
        Color::Green
    } else if lower.contains("connecting") || lower.contains("authenticating") {
        Color::Cyan
    } else {
        Color::Yellow
    }
}

/// Expired messages are simply not drawn; `App::status` does the ageing.
pub fn draw_status_bar<B: Backend>(f: &mut Frame, app: &App, area: Rect) {
    if let Some(message) = app.status() {
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(status_color(message)))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_follow_message_tone() {
        assert_eq!(status_color("failed to copy a: disk full"), Color::Red);
        assert_eq!(status_color("cannot list /root: permission denied"), Color::Red);
        assert_eq!(status_color("Copied 3 files to /srv"), Color::Green);
        assert_eq!(status_color("Connecting to web..."), Color::Cyan);
        assert_eq!(status_color("Copy cancelled after 1 of 2 files"), Color::Yellow);
    }
}

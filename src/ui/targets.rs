use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;

pub fn draw_targets<B: Backend>(f: &mut Frame, app: &App, area: Rect) {
    let picker = &app.picker;

    let (list_area, search_area) = if picker.is_searching() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)].as_ref())
            .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .title(format!(" Hosts ({}) ", picker.visible_len()));

    if picker.is_empty() {
        let message = Paragraph::new("No hosts found. Add Host entries to ~/.ssh/config or hosts.toml.")
            .style(Style::default().fg(Color::Gray))
            .block(block);
        f.render_widget(message, list_area);
        return;
    }

    let inner_height = list_area.height.saturating_sub(2) as usize;
    let offset = (picker.cursor() + 1).saturating_sub(inner_height);

    let list_items: Vec<ListItem> = picker
        .visible()
        .enumerate()
        .skip(offset)
        .map(|(i, target)| {
            let is_selected = i == picker.cursor();
            let is_connecting = is_selected && picker.connecting().is_some();

            let mut spans = vec![Span::styled(
                if is_selected { "> " } else { "  " },
                Style::default().fg(Color::Green),
            )];
            spans.push(Span::styled(
                format!("{} ({})", target.alias, target.label()),
                Style::default().fg(if is_selected {
                    Color::Black
                } else {
                    Color::White
                }),
            ));

            if let Some(group) = &target.group {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    format!("[Group: {}]", group),
                    Style::default()
                        .fg(if is_selected {
                            Color::Black
                        } else {
                            Color::Gray
                        })
                        .add_modifier(Modifier::DIM),
                ));
            }
            if is_connecting {
                spans.push(Span::styled("  connecting...", Style::default().fg(Color::Black)));
            }

            let style = if is_selected {
                Style::default()
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    f.render_widget(List::new(list_items).block(block), list_area);

    if let Some(search_area) = search_area {
        let query = picker.query().unwrap_or_default();
        let search = Paragraph::new(Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(query.to_string()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Search "),
        );
        f.render_widget(search, search_area);
    }
}

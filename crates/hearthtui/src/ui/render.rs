use ratatui::layout::Alignment;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Cell;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Row;
use ratatui::widgets::Table;
use ratatui::widgets::TableState;
use ratatui::widgets::Tabs;
use ratatui::Frame;

use super::app::App;
use super::app::TITLE;
use super::view::RowData;
use super::view::COLUMNS;
use crate::sync::Severity;

const KEY_HELP: &str = " q Quit  r Refresh  t/Enter Toggle  1-5 Tabs  ↑/↓ Select";

pub fn draw(frame: &mut Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    frame.render_widget(
        Paragraph::new(TITLE)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD)),
        layout[0],
    );
    draw_tabs(frame, app, layout[1]);

    if app.loaded {
        draw_table(frame, app, layout[2]);
    } else {
        frame.render_widget(
            Paragraph::new("Connecting...")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            layout[2],
        );
    }

    draw_notice(frame, app, layout[3]);
    frame.render_widget(
        Paragraph::new(app.status_line()).style(Style::default().bg(Color::Blue).fg(Color::White)),
        layout[4],
    );
    frame.render_widget(
        Paragraph::new(KEY_HELP).style(Style::default().fg(Color::DarkGray)),
        layout[5],
    );
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = app
        .views
        .iter()
        .enumerate()
        .map(|(i, view)| Line::from(format!("{} {}", i + 1, view.tab)))
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(app.active)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn state_style(row: &RowData) -> Style {
    match row.state.as_str() {
        "ON" | "on" | "open" | "unlocked" => Style::default().fg(Color::Green),
        "OFF" | "off" | "closed" | "locked" => Style::default().fg(Color::Red),
        "unavailable" | "unknown" => Style::default().fg(Color::DarkGray),
        _ => Style::default(),
    }
}

fn draw_table(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.active_view();

    let header = Row::new(COLUMNS).style(Style::default().add_modifier(Modifier::BOLD));
    let rows = view.rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.entity_id.as_str()),
            Cell::from(row.name.as_str()),
            Cell::from(row.state.as_str()).style(state_style(row)),
            Cell::from(row.last_changed.as_str()),
        ])
    });

    let widths = [
        Constraint::Percentage(30),
        Constraint::Percentage(35),
        Constraint::Percentage(15),
        Constraint::Percentage(20),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ({}) ", view.tab, view.rows.len())),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(view.selected);
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_notice(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notice) = &app.notice else {
        return;
    };

    let color = match notice.severity {
        Severity::Info => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" [{}] ", notice.severity),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(notice.message.as_str()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

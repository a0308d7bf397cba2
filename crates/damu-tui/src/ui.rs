use crate::app::{App, Pane};
use damu::dashboard::{ListState as LoadState, Phase};
use damu::session::SessionStorage;
use damu::view::{DashboardView, MarkerStyle};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::Canvas;
use ratatui::widgets::{
    Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap,
};

const PICKUP_COLOR: Color = Color::Red;
const DELIVERY_COLOR: Color = Color::Blue;

pub fn draw<S: SessionStorage>(frame: &mut Frame, app: &App<S>) {
    if app.phase() == Phase::Unauthenticated {
        draw_login(frame, app);
        return;
    }

    let view = app.dashboard.view();
    let banner = app.dashboard.error_message();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(if banner.is_some() { 3 } else { 0 }),
            Constraint::Min(8),    // tasks + map
            Constraint::Length(8), // history
            Constraint::Length(1), // status bar
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    if let Some(message) = banner {
        draw_banner(frame, &message, chunks[1]);
    }

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);
    draw_tasks(frame, app, &view, body[0]);
    draw_map(frame, app, &view, body[1]);
    draw_history(frame, app, &view, chunks[3]);
    draw_status_bar(frame, app, chunks[4]);
}

fn draw_login<S: SessionStorage>(frame: &mut Frame, app: &App<S>) {
    let area = centered(frame.area(), 50, 9);
    let lines = vec![
        Line::from(Span::styled(
            "Muainishi wa Damu | Agent Portal",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Enter your agent name to continue:"),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(app.login_input.as_str()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            app.status_msg.as_str(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let block = Block::default().borders(Borders::ALL).title(" Login ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_header<S: SessionStorage>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let phase = match app.phase() {
        Phase::Loading => Span::styled("loading", Style::default().fg(Color::Yellow)),
        Phase::Ready => Span::styled("ready", Style::default().fg(Color::Green)),
        Phase::Error => Span::styled("error", Style::default().fg(Color::Red)),
        Phase::Unauthenticated => Span::raw(""),
    };
    let line = Line::from(vec![
        Span::styled(
            " Agent Dashboard ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("@{} ", app.dashboard.agent().unwrap_or_default()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("[{}] ", app.source_label),
            Style::default().fg(Color::DarkGray),
        ),
        phase,
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_banner(frame: &mut Frame, message: &str, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Could not load agent tasks ");
    let text = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(text, area);
}

fn draw_tasks<S: SessionStorage>(
    frame: &mut Frame,
    app: &App<S>,
    view: &DashboardView,
    area: Rect,
) {
    let focused = app.pane == Pane::Tasks;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(focused))
        .title(format!(" Active Tasks ({}) ", view.cards.len()));

    let empty = view.cards.is_empty();
    if let Some(text) = placeholder(app.dashboard.active_state(), empty, "No active tasks.") {
        frame.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let items: Vec<ListItem> = view
        .cards
        .iter()
        .map(|card| {
            let kind_style = Style::default().fg(kind_color(card.kind.into()));
            let action = match card.action {
                Some(a) => Span::styled(
                    format!("[Enter] {}", a.label()),
                    Style::default().fg(Color::Green),
                ),
                None => Span::raw(""),
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!("{:<8}", card.kind.to_string()), kind_style),
                    Span::styled(
                        card.title.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", card.status),
                        Style::default().fg(Color::Yellow),
                    ),
                ]),
                Line::from(Span::styled(
                    format!("        {} | {}", card.location, card.blood_line),
                    Style::default().fg(Color::Gray),
                )),
                Line::from(vec![Span::raw("        "), action]),
            ])
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_map<S: SessionStorage>(
    frame: &mut Frame,
    app: &App<S>,
    view: &DashboardView,
    area: Rect,
) {
    let vp = view.viewport;
    let selected = app.selected_task_id();
    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Task Map (● pickup  ■ delivery) "),
        )
        .x_bounds([vp.min_lng, vp.max_lng])
        .y_bounds([vp.min_lat, vp.max_lat])
        .paint(|ctx| {
            for marker in &view.markers {
                let symbol = match marker.style {
                    MarkerStyle::Pickup => "●",
                    MarkerStyle::Delivery => "■",
                };
                let mut style = Style::default().fg(kind_color(marker.style));
                if selected == Some(marker.task_id.as_str()) {
                    style = style.bg(Color::Yellow).add_modifier(Modifier::BOLD);
                }
                ctx.print(
                    marker.position.lng,
                    marker.position.lat,
                    Span::styled(format!("{symbol} {}", marker.task_id), style),
                );
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_history<S: SessionStorage>(
    frame: &mut Frame,
    app: &App<S>,
    view: &DashboardView,
    area: Rect,
) {
    let focused = app.pane == Pane::History;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(focused))
        .title(format!(" Completed ({}) ", view.history.len()));

    let empty = view.history.is_empty();
    if let Some(text) = placeholder(app.dashboard.history_state(), empty, "No completed tasks yet.") {
        frame.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let rows: Vec<Row> = view
        .history
        .iter()
        .skip(app.history_scroll)
        .map(|row| {
            Row::new(vec![
                Cell::from(row.completed_on.clone()),
                Cell::from(row.id.clone()),
                Cell::from(row.kind.to_string())
                    .style(Style::default().fg(kind_color(row.kind.into()))),
                Cell::from(row.summary.clone()),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Min(20),
        ],
    )
    .header(
        Row::new(vec!["Date", "Task", "Type", "Summary"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(block);
    frame.render_widget(table, area);
}

fn draw_status_bar<S: SessionStorage>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let hints = " ↑/↓ select | Enter action | Tab pane | r refresh | l logout | q quit ";
    let line = Line::from(vec![
        Span::styled(hints, Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" "),
        Span::styled(app.status_msg.as_str(), Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Text shown instead of a list while it loads, after it fails, or when empty.
fn placeholder(state: &LoadState, empty: bool, empty_text: &str) -> Option<String> {
    match state {
        LoadState::Idle | LoadState::Loading => Some("Loading...".to_string()),
        LoadState::Failed(reason) => Some(format!("Unavailable: {reason}")),
        LoadState::Loaded if empty => Some(empty_text.to_string()),
        LoadState::Loaded => None,
    }
}

fn kind_color(style: MarkerStyle) -> Color {
    match style {
        MarkerStyle::Pickup => PICKUP_COLOR,
        MarkerStyle::Delivery => DELIVERY_COLOR,
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

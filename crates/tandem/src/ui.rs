//! Two-pane rendering with a connector column

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tandem_core::{mark_ranges, Connector, OpKind, Row, Side};

/// Width of the column the connectors are drawn in
const LINK_WIDTH: u16 = 7;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(LINK_WIDTH),
            Constraint::Min(0),
        ])
        .split(chunks[0]);

    render_pane(frame, app, panes[0], Side::Src);
    render_links(frame, app, panes[1]);
    render_pane(frame, app, panes[2], Side::Dest);
    render_status(frame, app, chunks[1]);
}

fn render_pane(frame: &mut Frame, app: &App, area: Rect, side: Side) {
    let gutter_width = app.gutter_width + 1;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(gutter_width),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let rows: &[Row] = match (&app.view, side) {
        (Some(view), Side::Src) => &view.src_rows,
        (Some(view), Side::Dest) => &view.dest_rows,
        (None, _) => &[],
    };

    let visible_height = area.height as usize;
    let mut gutter_lines: Vec<Line> = Vec::new();
    let mut content_lines: Vec<Line> = Vec::new();

    for row in rows.iter().skip(app.scroll_offset).take(visible_height) {
        let number = match row.number {
            Some(number) => format!("{:>width$}", number, width = app.gutter_width as usize),
            None => " ".repeat(app.gutter_width as usize),
        };
        gutter_lines.push(Line::from(Span::styled(
            format!("{number} "),
            Style::default().fg(Color::DarkGray),
        )));
        content_lines.push(Line::from(content_spans(app, row, side)));
    }

    frame.render_widget(Paragraph::new(gutter_lines), chunks[0]);
    frame.render_widget(Paragraph::new(content_lines), chunks[1]);

    let border = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(border, chunks[2]);
}

/// Text spans for one row: block shading as background, the row's update
/// ranges highlighted on top.
fn content_spans(app: &App, row: &Row, side: Side) -> Vec<Span<'static>> {
    let base = row_style(app, row);

    let update_ranges = row.ids.iter().find_map(|id| {
        let op = app.ops.get(id)?;
        if !op.kind.is_update() {
            return None;
        }
        op.update_ranges(side)
    });

    match update_ranges {
        Some(ranges) if !row.content.is_empty() => mark_ranges(&row.content, ranges)
            .into_iter()
            .map(|segment| {
                let style = if segment.marked {
                    base.bg(Color::Rgb(96, 96, 24)).add_modifier(Modifier::BOLD)
                } else {
                    base
                };
                Span::styled(segment.text, style)
            })
            .collect(),
        _ => vec![Span::styled(row.content.clone(), base)],
    }
}

/// Background shading from block membership, brightened when the row
/// belongs to the highlighted operation.
fn row_style(app: &App, row: &Row) -> Style {
    let shade = row
        .block_ids
        .iter()
        .chain(row.ids.iter())
        .find_map(|id| app.ops.get(id).map(|op| kind_color(op.kind)));

    let mut style = Style::default().fg(Color::White);
    if let Some(color) = shade {
        style = style.bg(color);
    }
    if let Some(active) = app.active_id {
        if row.ids.contains(&active) || row.block_ids.contains(&active) {
            style = style.add_modifier(Modifier::BOLD);
        }
    }
    style
}

fn kind_color(kind: OpKind) -> Color {
    match kind {
        OpKind::Delete => Color::Rgb(64, 24, 24),
        OpKind::Insert => Color::Rgb(24, 56, 24),
        OpKind::Move => Color::Rgb(24, 32, 64),
        OpKind::Copy => Color::Rgb(16, 48, 56),
        OpKind::Update | OpKind::MoveUpdate | OpKind::CopyUpdate => Color::Rgb(56, 52, 16),
        OpKind::Split | OpKind::Merge => Color::Rgb(48, 24, 56),
        OpKind::Unknown => Color::Rgb(32, 32, 32),
    }
}

fn kind_glyph(kind: OpKind) -> char {
    match kind {
        OpKind::Delete => '-',
        OpKind::Insert => '+',
        OpKind::Move => 'm',
        OpKind::Copy => 'c',
        OpKind::Update => '~',
        OpKind::MoveUpdate => 'M',
        OpKind::CopyUpdate => 'C',
        OpKind::Split => 's',
        OpKind::Merge => 'j',
        OpKind::Unknown => '?',
    }
}

/// Draw the center column: endpoint ticks for every connector, plus a full
/// link for the highlighted one.
fn render_links(frame: &mut Frame, app: &App, area: Rect) {
    let Some(view) = &app.view else {
        return;
    };

    let height = area.height as usize;
    let width = LINK_WIDTH as usize;
    let active = app
        .active_id
        .and_then(|id| view.connectors.get(&id).copied());

    let mut lines: Vec<Line> = Vec::with_capacity(height);
    for visible in 0..height {
        let idx = app.scroll_offset + visible;
        let mut cells = vec![' '; width];

        for (&id, connector) in &view.connectors {
            if Some(id) == app.active_id {
                continue;
            }
            if touches_src(connector, idx) {
                cells[0] = kind_glyph(connector.kind);
            }
            if touches_dest(connector, idx) {
                cells[width - 1] = kind_glyph(connector.kind);
            }
        }

        let mut style = Style::default().fg(Color::DarkGray);
        if let Some(connector) = active {
            if let Some(rendered) = active_cells(&connector, idx, width) {
                cells = rendered;
                style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
            }
        }

        lines.push(Line::from(Span::styled(
            cells.into_iter().collect::<String>(),
            style,
        )));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn touches_src(connector: &Connector, idx: usize) -> bool {
    (connector.src_start..connector.src_end).contains(&idx)
        || (connector.src_start == connector.src_end && connector.src_start == idx)
}

fn touches_dest(connector: &Connector, idx: usize) -> bool {
    (connector.dest_start..connector.dest_end).contains(&idx)
        || (connector.dest_start == connector.dest_end && connector.dest_start == idx)
}

/// The highlighted connector's glyphs for one row, or None if it does not
/// pass through this row.
fn active_cells(connector: &Connector, idx: usize, width: usize) -> Option<Vec<char>> {
    let src = touches_src(connector, idx);
    let dest = touches_dest(connector, idx);
    let top = connector.src_start.min(connector.dest_start);
    let bottom = (connector.src_end.max(connector.dest_end)).saturating_sub(1);
    let through = idx >= top && idx <= bottom;

    if !src && !dest && !through {
        return None;
    }

    let mut cells = vec![' '; width];
    if through {
        cells[width / 2] = '│';
    }
    if src {
        cells[0] = '●';
        cells[1] = '─';
        cells[width / 2] = '┤';
    }
    if dest {
        cells[width - 1] = '●';
        cells[width - 2] = '─';
        cells[width / 2] = if src { '┼' } else { '├' };
    }
    Some(cells)
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let mode = if app.align { "aligned" } else { "compact" };

    let summary = if !app.has_difference() {
        "no difference".to_string()
    } else {
        match app.active_id.and_then(|id| Some((id, app.ops.get(&id)?))) {
            Some((id, op)) => format!(
                "op {}/{} {} {}",
                id,
                app.ops.len(),
                kind_glyph(op.kind),
                op.edit_action,
            ),
            None => format!("{} operations", app.ops.len()),
        }
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ⇄ {} ", app.src_name, app.dest_name),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("[{mode}] "),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(summary, Style::default().fg(Color::White)),
        Span::styled(
            "  a:mode n/p:op c:clear q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
    use tandem_core::ingest;

    fn make_app(src: &str, dest: &str, ops_json: &[&str]) -> App {
        let ops = ingest(
            ops_json
                .iter()
                .map(|json| serde_json::from_str(json).unwrap())
                .collect(),
        );
        App::new(
            &Config::default(),
            "old.txt".into(),
            src.into(),
            "new.txt".into(),
            dest.into(),
            ops,
        )
    }

    fn render_buffer(app: &mut App, width: u16, height: u16) -> Buffer {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|frame| draw(frame, app)).expect("draw");
        terminal.backend().buffer().clone()
    }

    fn buffer_text(buf: &Buffer) -> Vec<String> {
        let mut lines = Vec::new();
        for y in 0..buf.area.height {
            let mut line = String::new();
            for x in 0..buf.area.width {
                line.push_str(buf[(x, y)].symbol());
            }
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_render_shows_both_panes() {
        let mut app = make_app(
            "alpha\nbeta\ngamma",
            "alpha\ngamma",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "edit_action": ""}"#],
        );

        let text = buffer_text(&render_buffer(&mut app, 80, 10)).join("\n");
        assert_eq!(text.matches("alpha").count(), 2);
        assert_eq!(text.matches("beta").count(), 1, "deleted line is left-only");
        assert!(text.contains("[aligned]"));
    }

    #[test]
    fn test_padded_row_has_no_line_number_on_the_right() {
        let mut app = make_app(
            "alpha\nbeta\ngamma",
            "alpha\ngamma",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "edit_action": ""}"#],
        );

        let lines = buffer_text(&render_buffer(&mut app, 80, 10));
        // Row 1: left shows line 2 ("beta"), right gutter is blank padding.
        let row = &lines[1];
        assert!(row.contains("beta"));
        let cells: Vec<char> = row.chars().collect();
        let right_half: String = cells[cells.len() / 2..].iter().collect();
        assert!(!right_half.contains('2'));
    }

    #[test]
    fn test_toggle_to_compact_updates_status() {
        let mut app = make_app(
            "alpha\nbeta",
            "alpha",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "edit_action": ""}"#],
        );
        app.toggle_align();

        let text = buffer_text(&render_buffer(&mut app, 80, 10)).join("\n");
        assert!(text.contains("[compact]"));
    }

    #[test]
    fn test_identical_files_status() {
        let mut app = make_app("same", "same", &[]);
        let text = buffer_text(&render_buffer(&mut app, 80, 6)).join("\n");
        assert!(text.contains("no difference"));
    }

    #[test]
    fn test_active_connector_is_drawn() {
        let mut app = make_app(
            "alpha\nbeta\ngamma",
            "alpha\ngamma",
            &[r#"{"mode": "delete", "src_line": 2, "dest_line": 2, "edit_action": "removed beta"}"#],
        );
        app.next_op();

        let text = buffer_text(&render_buffer(&mut app, 80, 10)).join("\n");
        assert!(text.contains('●'));
        assert!(text.contains("removed beta"));
    }
}

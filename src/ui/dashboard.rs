use crate::ui::app::{thickness_label, App, FocusPanel};
use crate::ui::panel::{LineKind, PanelContributor};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Row, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table,
    },
    Frame,
};

const BRAND_DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C);
const BRAND_SELECT_BG: Color = Color::Rgb(0xC3, 0xD3, 0xE0);
const BRAND_GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68);
const BRAND_ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C);
const BRAND_MUTED: Color = Color::Rgb(0x71, 0x65, 0x65);

const HEADER_STYLE: Style = Style::new().fg(BRAND_DARK).add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new()
    .bg(BRAND_SELECT_BG)
    .fg(BRAND_DARK)
    .add_modifier(Modifier::BOLD);
const COUNT_COLOR: Color = BRAND_GREEN;

pub fn draw_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Main content
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);
    draw_main_content(frame, chunks[1], app);
    draw_footer(
        frame,
        chunks[2],
        " ←→ Panel | ↑↓ Select | Enter Details | q Quit ",
    );
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = format!(
        " eLCA Bridge | {} | {} elements | {} components ",
        app.source_name(),
        app.session.elements.len(),
        app.session.component_count()
    );

    let header = Paragraph::new(title)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_main_content(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::horizontal([
        Constraint::Percentage(35), // Status + elements
        Constraint::Percentage(65), // Components
    ])
    .split(area);

    let status_lines: Vec<Line> = app
        .panels
        .iter()
        .flat_map(|panel| panel.lines(&app.session))
        .map(|line| {
            let color = match line.kind {
                LineKind::Done => BRAND_GREEN,
                LineKind::Warning => BRAND_ORANGE,
                LineKind::Pending | LineKind::Detail => BRAND_MUTED,
            };
            Line::from(Span::styled(line.to_string(), Style::default().fg(color)))
        })
        .collect();
    let status_title = format!(
        " {} ",
        app.panels
            .iter()
            .map(PanelContributor::title)
            .collect::<Vec<_>>()
            .join(" / ")
    );

    let left = Layout::vertical([
        Constraint::Length(status_lines.len() as u16 + 2),
        Constraint::Min(5),
    ])
    .split(columns[0]);

    let status = Paragraph::new(status_lines)
        .block(Block::default().title(status_title).borders(Borders::ALL));
    frame.render_widget(status, left[0]);

    draw_elements(frame, left[1], app);
    draw_components(frame, columns[1], app);
}

fn draw_elements(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus_panel == FocusPanel::Elements;

    let items: Vec<ListItem> = app
        .session
        .elements
        .iter()
        .enumerate()
        .map(|(i, element)| {
            let is_selected = i == app.selected_element;
            let style = if is_selected && is_focused {
                SELECTED_STYLE
            } else if is_selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let marker = if is_selected && is_focused {
                " ◄"
            } else {
                ""
            };

            let content = Line::from(vec![
                Span::styled(element.label(), style),
                Span::raw(" "),
                Span::styled(
                    format!(
                        "({}/{})",
                        element.layers_with_thickness(),
                        element.components.len()
                    ),
                    Style::default().fg(COUNT_COLOR),
                ),
                Span::styled(marker, Style::default().fg(BRAND_ORANGE)),
            ]);

            ListItem::new(content)
        })
        .collect();

    let border_style = if is_focused {
        Style::default().fg(BRAND_ORANGE)
    } else {
        Style::default()
    };

    let list = List::new(items).block(
        Block::default()
            .title(format!(" Elements ({}) ", app.session.elements.len()))
            .borders(Borders::ALL)
            .border_style(border_style),
    );

    frame.render_widget(list, area);
}

fn draw_components(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus_panel == FocusPanel::Components;
    let Some(element) = app.get_selected_element() else {
        let empty = Paragraph::new(" No building elements loaded ")
            .style(Style::default().fg(BRAND_MUTED))
            .block(Block::default().title(" Components ").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    // Borders and header row
    let visible_rows = (area.height as usize).saturating_sub(3);

    let scroll_offset = if app.selected_component >= visible_rows {
        app.selected_component - visible_rows + 1
    } else {
        0
    };

    let header = Row::new(vec!["Component", "Quantity", "Thickness", "Processes"])
        .style(HEADER_STYLE)
        .height(1);

    let rows: Vec<Row> = element
        .components
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_rows)
        .map(|(i, c)| {
            let is_selected = i == app.selected_component;
            let style = if is_selected && is_focused {
                SELECTED_STYLE
            } else if is_selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            Row::new(vec![
                c.name.clone(),
                c.quantity.clone(),
                thickness_label(c),
                c.lifecycle_processes.len().to_string(),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(45),
        Constraint::Percentage(20),
        Constraint::Percentage(20),
        Constraint::Percentage(15),
    ];

    let border_style = if is_focused {
        Style::default().fg(BRAND_ORANGE)
    } else {
        Style::default()
    };

    let title = format!(" {} ({} components) ", element.label(), element.components.len());
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style),
    );

    frame.render_widget(table, area);

    if element.components.len() > visible_rows {
        draw_scrollbar(frame, area, element.components.len(), app.selected_component);
    }
}

fn draw_scrollbar(frame: &mut Frame, area: Rect, len: usize, position: usize) {
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));
    let mut scrollbar_state = ScrollbarState::new(len).position(position);

    let scrollbar_area = Rect {
        x: area.x + area.width - 1,
        y: area.y + 2,
        width: 1,
        height: area.height.saturating_sub(3),
    };
    frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
}

fn draw_footer(frame: &mut Frame, area: Rect, help: &str) {
    let footer = Paragraph::new(help)
        .style(Style::default().fg(BRAND_MUTED))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

pub fn draw_component_detail(frame: &mut Frame, app: &App) {
    let (Some(element), Some(component)) = (app.get_selected_element(), app.get_selected_component())
    else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(3), // Header: component name
        Constraint::Length(3), // Info: element | quantity | thickness
        Constraint::Min(6),    // Lifecycle processes
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    let header = Paragraph::new(format!(" Component: {} ", component.name))
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let source = if component.layer_thickness.is_some() {
        "XML project"
    } else {
        "quantity"
    };
    let info_text = format!(
        "{}  |  Layer {}/{}  |  Quantity: {}  |  Thickness: {} ({source})",
        element.label(),
        app.selected_component + 1,
        element.components.len(),
        if component.quantity.is_empty() {
            "-"
        } else {
            component.quantity.as_str()
        },
        thickness_label(component),
    );
    let info_widget = Paragraph::new(info_text).block(Block::default().borders(Borders::ALL));
    frame.render_widget(info_widget, chunks[1]);

    let processes = &component.lifecycle_processes;
    let visible = (chunks[2].height as usize).saturating_sub(3);

    let rows: Vec<Row> = processes
        .iter()
        .skip(app.process_scroll_offset)
        .take(visible)
        .map(|p| Row::new(vec![p.uuid.clone(), p.process_name.clone()]))
        .collect();

    let widths = [Constraint::Percentage(40), Constraint::Percentage(60)];
    let process_header = Row::new(vec!["Ökobaudat UUID", "Process"]).style(HEADER_STYLE);

    let table = Table::new(rows, widths).header(process_header).block(
        Block::default()
            .title(format!(" Lifecycle processes ({}) ", processes.len()))
            .borders(Borders::ALL),
    );
    frame.render_widget(table, chunks[2]);

    if processes.len() > visible {
        draw_scrollbar(frame, chunks[2], processes.len(), app.process_scroll_offset);
    }

    draw_footer(
        frame,
        chunks[3],
        " Esc Back | ↑↓ Scroll | ←→ Component | q Quit ",
    );
}

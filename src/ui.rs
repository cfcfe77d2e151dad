use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row as TableRow, Table},
};

use crate::model::{Modus, Model, TVConfig};
use tabview::SortDirection;

pub const NAVIGATOR_HEIGHT: u16 = 1;
pub const STATUSLINE_HEIGHT: u16 = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 2;
const HEADER_HEIGHT: u16 = 2;
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(10);
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub const HELP_TEXT: &str = "\
 n / PgDn     next page
 p / PgUp     previous page
 g / Home     first page
 G / End      last page
 :            go to page number
 + / -        more / fewer rows per page
 h l / ← →    select column
 s            sort selected column (asc, desc, off)
 / or f       filter selected column
 x            clear filter of selected column
 y            copy visible page
 ?            toggle this help
 q            quit";

pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            max_column_width: cfg.max_column_width,
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let [navigator, table, statusline] = Layout::vertical([
            Constraint::Length(NAVIGATOR_HEIGHT),
            Constraint::Min(HEADER_HEIGHT + 2),
            Constraint::Length(STATUSLINE_HEIGHT),
        ])
        .areas(frame.area());

        self.render_navigator(model, frame, navigator);
        if model.is_loading() {
            self.render_loading(model, frame, table);
        } else {
            self.render_table(model, frame, table);
        }
        self.render_statusline(model, frame, statusline);

        if model.modus() == Modus::Popup {
            self.render_help(frame);
        }
    }

    /// Previous / page selector / rows per page / next.
    fn render_navigator(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let view = model.view();
        let enabled = |on: bool| if on { Style::new().bold() } else { Style::new().dim() };
        let span = match view.row_span() {
            Some((first, last)) => format!("rows {first}-{last} of {}", view.visible_row_count),
            None => "no rows".to_string(),
        };
        let line = Line::from(vec![
            Span::styled(" ◀ Previous ", enabled(view.can_go_previous)),
            Span::raw(format!(
                "  Page {} of {}  ·  {} rows per page  ·  {span}  ",
                view.page_index + 1,
                view.page_count,
                view.page_size
            )),
            Span::styled(" Next ▶ ", enabled(view.can_go_next)),
        ]);
        frame.render_widget(Paragraph::new(line).centered(), area);
    }

    fn render_loading(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let tick = (model.loading_since().elapsed().as_millis() / 150) as usize;
        let text = format!("{} Loading ...", SPINNER[tick % SPINNER.len()]);
        let block = Block::bordered().title(Line::from(" tv ".bold()).centered());
        frame.render_widget(Paragraph::new(text).centered().block(block), area);
    }

    fn render_table(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let engine = model.engine();
        let view = model.view();
        let columns: Vec<_> = engine.visible_columns().collect();

        let header = TableRow::new(columns.iter().enumerate().map(|(idx, column)| {
            let marker = match engine.sort_direction_of(&column.key) {
                Some(SortDirection::Ascending) => " ▲",
                Some(SortDirection::Descending) => " ▼",
                None => "",
            };
            let filter_line = match engine.filter_value(&column.key) {
                Some(value) => Line::from(format!("= {value}").italic()),
                None if idx == model.cursor_column() && column.can_filter() => Line::from(
                    format!("Search {} records...", engine.total_row_count()).dim(),
                ),
                None => Line::default(),
            };
            let mut style = Style::new().bold();
            if idx == model.cursor_column() {
                style = style.reversed();
            }
            Cell::from(Text::from(vec![
                Line::from(format!("{}{marker}", column.header)),
                filter_line,
            ]))
            .style(style)
        }))
        .height(HEADER_HEIGHT);

        let rows = view.rows.iter().enumerate().map(|(i, row)| {
            let cells = columns.iter().map(|c| Cell::from(c.value(row).to_string()));
            let style = if i % 2 == 0 { Style::new() } else { Style::new().dim() };
            TableRow::new(cells).style(style)
        });

        let widths = columns.iter().map(|column| {
            let content = view
                .rows
                .iter()
                .map(|row| column.value(row).to_string().chars().count())
                .max()
                .unwrap_or(0);
            let width = column.header.chars().count().max(content) + COLUMN_WIDTH_MARGIN;
            Constraint::Length(width.min(self.max_column_width) as u16)
        });

        let title = if model.name().is_empty() {
            " tv ".to_string()
        } else {
            format!(" {} ", model.name())
        };
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .block(Block::bordered().title(Line::from(title.bold()).centered()));
        frame.render_widget(table, area);
    }

    fn render_statusline(&self, model: &Model, frame: &mut Frame, area: Rect) {
        if let Some(prompt) = model.input_prompt() {
            let width = (area.width as usize).saturating_sub(prompt.chars().count() + 1);
            let (text, cursor) = model.input().visible(width);
            let line = Line::from(vec![prompt.clone().bold(), Span::raw(text)]);
            frame.render_widget(Paragraph::new(line), area);
            frame.set_cursor_position(Position::new(
                area.x + (prompt.chars().count() + cursor) as u16,
                area.y,
            ));
        } else if model.last_status_message_update().elapsed() < STATUS_MESSAGE_TIMEOUT {
            frame.render_widget(Paragraph::new(model.status_message()), area);
        }
    }

    fn render_help(&self, frame: &mut Frame) {
        let [area] = Layout::horizontal([Constraint::Length(52)])
            .flex(Flex::Center)
            .areas(frame.area());
        let [area] = Layout::vertical([Constraint::Length(15)])
            .flex(Flex::Center)
            .areas(area);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(HELP_TEXT).block(Block::bordered().title(" Help ")),
            area,
        );
    }
}

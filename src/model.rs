use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::controller::Message;
use crate::inputter::{InputResult, Inputter};
use tabview::loader::{self, LoadOptions, LoadedTable};
use tabview::{Action, Column, FilterKind, Value, ViewConfig, ViewEngine, ViewError, ViewResult};

#[derive(Debug, Clone)]
pub struct TVConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub view: ViewConfig,
    pub load: LoadOptions,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Status {
    Loading,
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modus {
    Table,
    Input,
    Popup,
}

/// Filter input currently open, and the value to restore when it is canceled.
struct FilterEdit {
    column: String,
    kind: FilterKind,
    previous: Option<Value>,
}

/// What the open input line edits.
enum InputTarget {
    Filter(FilterEdit),
    Page,
}

type PendingLoad = Receiver<Result<LoadedTable, ViewError>>;

pub struct Model {
    config: TVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    name: String,
    engine: ViewEngine,
    view: ViewResult,
    cursor_column: usize,
    input: Inputter,
    last_input: InputResult,
    editing: Option<InputTarget>,
    pending: Option<PendingLoad>,
    loading_since: Instant,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &TVConfig) -> Self {
        let engine = ViewEngine::new(config.view.clone());
        let view = engine.visible_page();
        Self {
            config: config.clone(),
            status: Status::Ready,
            modus: Modus::Table,
            previous_modus: Modus::Table,
            name: String::new(),
            engine,
            view,
            cursor_column: 0,
            input: Inputter::default(),
            last_input: InputResult::default(),
            editing: None,
            pending: None,
            loading_since: Instant::now(),
            clipboard: None,
            status_message: "Started tv!".to_string(),
            last_status_message_update: Instant::now(),
        }
    }

    /// Reads the file on a background thread. The table body shows a loading
    /// indicator until `update` picks up the result.
    pub fn load_data_file(&mut self, path: PathBuf) {
        let (tx, rx) = mpsc::channel();
        let options = self.config.load.clone();
        info!("Loading {} ...", path.display());
        thread::spawn(move || {
            let result = loader::load(path, &options);
            if tx.send(result).is_err() {
                warn!("Loaded data was dropped, the viewer is gone");
            }
        });
        self.pending = Some(rx);
        self.status = Status::Loading;
        self.loading_since = Instant::now();
        self.set_status_message("Loading ...");
    }

    fn poll_loading(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(ViewError::LoadingFailed(
                "loader thread stopped without a result".into(),
            )),
        };
        self.pending = None;
        self.status = Status::Ready;

        match result {
            Ok(table) => {
                let duration = self.loading_since.elapsed().as_millis();
                self.name = table.name;
                self.cursor_column = 0;
                self.engine.reset(table.rows, table.columns);
                self.refresh_view();
                self.set_status_message(format!(
                    "Loaded {} rows in {duration}ms ...",
                    self.engine.total_row_count()
                ));
            }
            Err(e) => {
                error!("Loading failed: {e}");
                self.set_status_message(format!("Loading failed: {e}"));
            }
        }
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), ViewError> {
        self.poll_loading();

        let Some(msg) = message else {
            return Ok(());
        };
        match self.modus {
            Modus::Table => match msg {
                Message::Quit => self.quit(),
                Message::Help => self.show_help(),
                Message::NextPage => self.apply(Action::NextPage)?,
                Message::PreviousPage => self.apply(Action::PreviousPage)?,
                Message::FirstPage => self.apply(Action::GoToPage(0))?,
                Message::LastPage => self.apply(Action::GoToPage(usize::MAX))?,
                Message::LargerPageSize => {
                    let size = self.config.view.next_page_size(self.engine.page_size());
                    self.apply(Action::SetPageSize(size))?;
                    self.set_status_message(format!("{size} rows per page"));
                }
                Message::SmallerPageSize => {
                    let size = self.config.view.previous_page_size(self.engine.page_size());
                    self.apply(Action::SetPageSize(size))?;
                    self.set_status_message(format!("{size} rows per page"));
                }
                Message::MoveLeft => self.move_column_selection(-1),
                Message::MoveRight => self.move_column_selection(1),
                Message::ToggleSort => self.toggle_sort_current_column()?,
                Message::Filter => self.enter_filter_mode(),
                Message::JumpToPage => self.enter_page_jump(),
                Message::ClearFilter => self.clear_filter_current_column()?,
                Message::CopyPage => self.copy_page(),
                Message::Exit | Message::RawKey(_) => (),
            },
            Modus::Input => {
                if let Message::RawKey(key) = msg {
                    self.raw_input(key)?;
                }
            }
            Modus::Popup => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.exit(),
                _ => (),
            },
        }
        Ok(())
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    fn apply(&mut self, action: Action) -> Result<(), ViewError> {
        self.engine.update(action)?;
        self.refresh_view();
        Ok(())
    }

    fn refresh_view(&mut self) {
        self.view = self.engine.visible_page();
        trace!(
            "View: page {}/{}, {} of {} rows",
            self.view.page_index + 1,
            self.view.page_count,
            self.view.visible_row_count,
            self.view.total_row_count
        );
    }

    // -------------------- Control handling functions ---------------------- //

    fn exit(&mut self) {
        if self.modus == Modus::Popup {
            self.modus = self.previous_modus;
            self.previous_modus = Modus::Popup;
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::Popup;
    }

    fn move_column_selection(&mut self, step: isize) {
        let count = self.engine.visible_columns().count();
        if count > 0 {
            self.cursor_column = self.cursor_column.saturating_add_signed(step).min(count - 1);
        }
    }

    fn current_column(&self) -> Option<&Column> {
        self.engine.visible_columns().nth(self.cursor_column)
    }

    fn toggle_sort_current_column(&mut self) -> Result<(), ViewError> {
        let Some(column) = self.current_column() else {
            return Ok(());
        };
        if !column.sortable {
            let message = format!("Column {} cannot be sorted", column.header);
            self.set_status_message(message);
            return Ok(());
        }
        let key = column.key.clone();
        self.apply(Action::ToggleSort(key.clone()))?;
        let message = match self.engine.sort_direction_of(&key) {
            Some(direction) => format!("Sorted by {key} {direction:?}"),
            None => "Unsorted".to_string(),
        };
        self.set_status_message(message);
        Ok(())
    }

    fn clear_filter_current_column(&mut self) -> Result<(), ViewError> {
        if let Some(column) = self.current_column() {
            let key = column.key.clone();
            self.apply(Action::SetColumnFilter {
                column: key,
                value: Value::Undefined,
            })?;
        }
        Ok(())
    }

    fn enter_filter_mode(&mut self) {
        let Some(column) = self.current_column() else {
            return;
        };
        let Some(kind) = column.filter else {
            let message = format!("Column {} cannot be filtered", column.header);
            self.set_status_message(message);
            return;
        };
        let key = column.key.clone();
        trace!("Entering filter input for {key} ...");
        let previous = self.engine.filter_value(&key).cloned();

        self.input.clear();
        if let Some(value) = &previous {
            self.input.set(&value.to_string());
        }
        self.last_input = self.input.get();
        self.open_input(InputTarget::Filter(FilterEdit {
            column: key,
            kind,
            previous,
        }));
    }

    fn enter_page_jump(&mut self) {
        trace!("Entering page input ...");
        self.input.clear();
        self.last_input = self.input.get();
        self.open_input(InputTarget::Page);
    }

    fn open_input(&mut self, target: InputTarget) {
        self.editing = Some(target);
        self.previous_modus = self.modus;
        self.modus = Modus::Input;
    }

    fn close_input(&mut self) {
        self.editing = None;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::Input;
    }

    /// Filter edits are applied immediately, Esc restores the value the input
    /// started with. A page number is only used once Enter is pressed.
    fn raw_input(&mut self, key: KeyEvent) -> Result<(), ViewError> {
        self.last_input = self.input.read(key);
        match &self.editing {
            Some(InputTarget::Filter(edit)) => {
                let (column, kind) = (edit.column.clone(), edit.kind);
                if self.last_input.canceled {
                    let previous = edit.previous.clone().unwrap_or_default();
                    self.apply(Action::SetColumnFilter {
                        column,
                        value: previous,
                    })?;
                } else if self.last_input.changed {
                    let value = filter_value_from_input(kind, &self.last_input.input);
                    self.apply(Action::SetColumnFilter { column, value })?;
                }

                if self.last_input.finished {
                    debug!("Filter input finished: {:?}", self.last_input);
                    self.close_input();
                    let message = format!(
                        "{} of {} records match",
                        self.engine.visible_row_count(),
                        self.engine.total_row_count()
                    );
                    self.set_status_message(message);
                }
            }
            Some(InputTarget::Page) => {
                if self.last_input.finished {
                    self.close_input();
                    if !self.last_input.canceled {
                        let text = self.last_input.input.clone();
                        self.jump_to_page(&text)?;
                    }
                }
            }
            None => self.modus = Modus::Table,
        }
        Ok(())
    }

    /// `text` is a 1-based page number out of the page selector's options.
    fn jump_to_page(&mut self, text: &str) -> Result<(), ViewError> {
        let options = self.view.page_options();
        let page = text
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .filter(|page| options.contains(page));
        match page {
            Some(page) => {
                self.apply(Action::GoToPage(page))?;
                let message = format!("Page {} of {}", page + 1, self.view.page_count);
                self.set_status_message(message);
            }
            None => {
                let message = format!("No page {text:?}, pages are 1-{}", options.end);
                self.set_status_message(message);
            }
        }
        Ok(())
    }

    fn copy_page(&mut self) {
        match self.copy_page_to_clipboard() {
            Ok(rows) => self.set_status_message(format!("Copied {rows} rows")),
            Err(e) => {
                warn!("Copy failed: {e}");
                self.set_status_message(format!("Copy failed: {e}"));
            }
        }
    }

    fn copy_page_to_clipboard(&mut self) -> Result<usize, ViewError> {
        let text = page_as_tsv(self.engine.visible_columns(), &self.view);
        if self.clipboard.is_none() {
            self.clipboard = Some(Clipboard::new().map_err(|e| ViewError::Clipboard(e.to_string()))?);
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            clipboard
                .set_text(text)
                .map_err(|e| ViewError::Clipboard(e.to_string()))?;
        }
        Ok(self.view.rows.len())
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    // -------------------- Read access for the ui ---------------------- //

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::Input
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    pub fn loading_since(&self) -> Instant {
        self.loading_since
    }

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> &ViewEngine {
        &self.engine
    }

    pub fn view(&self) -> &ViewResult {
        &self.view
    }

    pub fn cursor_column(&self) -> usize {
        self.cursor_column
    }

    pub fn input(&self) -> &Inputter {
        &self.input
    }

    /// Prompt of the open input line, if any.
    pub fn input_prompt(&self) -> Option<String> {
        match self.editing.as_ref()? {
            InputTarget::Filter(edit) => Some(format!("Filter {}: ", edit.column)),
            InputTarget::Page => Some(format!("Go to page (1-{}): ", self.view.page_count)),
        }
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }
}

/// Threshold filters parse the input as a number, text filters take it verbatim.
fn filter_value_from_input(kind: FilterKind, input: &str) -> Value {
    match kind {
        FilterKind::AtLeast => Value::parse(input),
        FilterKind::StartsWith | FilterKind::Fuzzy => Value::Text(input.to_string()),
    }
}

fn wrap_cell_content(c: &str) -> String {
    if c.contains(['\t', '\n', '\r', '"']) {
        format!("\"{}\"", c.replace('"', "\"\""))
    } else {
        c.to_string()
    }
}

fn page_as_tsv<'a>(columns: impl Iterator<Item = &'a Column>, view: &ViewResult) -> String {
    let columns: Vec<&Column> = columns.collect();
    let mut lines = Vec::with_capacity(view.rows.len() + 1);
    lines.push(
        columns
            .iter()
            .map(|c| wrap_cell_content(&c.header))
            .collect::<Vec<_>>()
            .join("\t"),
    );
    for row in view.rows.iter() {
        lines.push(
            columns
                .iter()
                .map(|c| wrap_cell_content(&c.value(row).to_string()))
                .collect::<Vec<_>>()
                .join("\t"),
        );
    }
    lines.join("\n")
}

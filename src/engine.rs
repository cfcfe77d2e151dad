//! The view engine: owns the data and the user-controlled view state, and
//! keeps the Filter -> Sort -> Page pipeline output in sync with it.
//!
//! Every mutation recomputes the affected stages before returning, so the
//! view is always consistent. Filter changes rerun all three stages, sort
//! changes rerun sort and page, page changes only touch the page stage.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::column::{self, Column};
use crate::domain::{Action, ViewConfig, ViewError};
use crate::filter::{self, FilterState};
use crate::page::{self, PageState};
use crate::sort::{self, SortDirection, SortState};
use crate::value::{Row, Value};

/// Derived, read-only output of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewResult {
    pub rows: Vec<Row>,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    /// Rows left after filtering, across all pages.
    pub visible_row_count: usize,
    /// Rows in the loaded data set, before filtering.
    pub total_row_count: usize,
}

impl ViewResult {
    /// Entries of the page selector.
    pub fn page_options(&self) -> Range<usize> {
        0..self.page_count
    }

    /// 1-based range of the rows shown, for "rows 11-20 of 42" style labels.
    pub fn row_span(&self) -> Option<(usize, usize)> {
        if self.rows.is_empty() {
            None
        } else {
            let first = self.page_index * self.page_size + 1;
            Some((first, first + self.rows.len() - 1))
        }
    }
}

#[derive(Debug)]
pub struct ViewEngine {
    config: ViewConfig,
    rows: Arc<Vec<Row>>,
    columns: Arc<Vec<Column>>,
    filters: FilterState,
    sort: SortState,
    page: PageState,
    // Row indices after the filter stage, in data order.
    filtered: Arc<Vec<usize>>,
    // Row indices after the sort stage. This is what gets paged.
    sorted: Arc<Vec<usize>>,
}

impl Default for ViewEngine {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl ViewEngine {
    /// An engine without data. A configured page size of zero falls back to the default.
    pub fn new(config: ViewConfig) -> Self {
        let page = PageState::new(config.default_page_size).unwrap_or_else(|e| {
            warn!("{e}, using the default page size");
            PageState::default()
        });
        Self {
            config,
            rows: Arc::new(Vec::new()),
            columns: Arc::new(Vec::new()),
            filters: FilterState::default(),
            sort: SortState::default(),
            page,
            filtered: Arc::new(Vec::new()),
            sorted: Arc::new(Vec::new()),
        }
    }

    pub fn with_data(config: ViewConfig, rows: Vec<Row>, columns: Vec<Column>) -> Self {
        let mut engine = Self::new(config);
        engine.reset(rows, columns);
        engine
    }

    /// Applies one action. Only `SetPageSize` with a size below 1 fails.
    pub fn update(&mut self, action: Action) -> Result<(), ViewError> {
        trace!("Update: {action}");
        match action {
            Action::SetColumnFilter { column, value } => self.set_column_filter(&column, value),
            Action::ToggleSort(column) => self.toggle_sort(&column),
            Action::SetPageSize(n) => self.set_page_size(n)?,
            Action::GoToPage(n) => self.go_to_page(n),
            Action::NextPage => self.next_page(),
            Action::PreviousPage => self.previous_page(),
            Action::Reset { rows, columns } => self.reset(rows, columns),
            Action::Reload { rows, columns } => self.reload(rows, columns),
        }
        Ok(())
    }

    // -------------------- Data ---------------------- //

    /// Replaces the data and returns every piece of view state to its default.
    pub fn reset(&mut self, rows: Vec<Row>, columns: Vec<Column>) {
        debug!("Reset with {} rows, {} columns", rows.len(), columns.len());
        self.rows = Arc::new(rows);
        self.columns = Arc::new(columns);
        self.filters.clear();
        self.sort.clear();
        self.page = PageState::new(self.config.default_page_size).unwrap_or_default();
        self.refilter();
    }

    /// Replaces the data but keeps filters, sort and page size where the new
    /// columns still support them. Entries naming missing columns are dropped.
    pub fn reload(&mut self, rows: Vec<Row>, columns: Vec<Column>) {
        debug!("Reload with {} rows, {} columns", rows.len(), columns.len());
        self.rows = Arc::new(rows);
        self.columns = Arc::new(columns);
        self.filters.retain_columns(&self.columns);
        self.sort.retain_columns(&self.columns);
        self.refilter();
    }

    // -------------------- Filter and sort ---------------------- //

    /// Sets the filter of `column`. An empty value removes it.
    /// Unknown or unfilterable columns are ignored.
    pub fn set_column_filter(&mut self, column: &str, value: impl Into<Value>) {
        let Some(kind) = column::find(&self.columns, column).and_then(|c| c.filter) else {
            warn!("Column {column} does not exist or cannot be filtered");
            return;
        };
        if self.filters.set(column, kind, value.into()) {
            self.refilter();
        }
    }

    /// Advances the sort cycle of `column`. Unknown or unsortable columns are ignored.
    pub fn toggle_sort(&mut self, column: &str) {
        if !column::find(&self.columns, column).is_some_and(|c| c.sortable) {
            warn!("Column {column} does not exist or cannot be sorted");
            return;
        }
        self.sort.toggle(column);
        self.resort();
    }

    // -------------------- Pagination ---------------------- //

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), ViewError> {
        self.page.set_page_size(page_size, self.sorted.len())?;
        debug!(
            "Page size {page_size}, now on page {}/{}",
            self.page.page_index() + 1,
            self.page_count()
        );
        Ok(())
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page.go_to_page(page, self.sorted.len());
    }

    pub fn next_page(&mut self) {
        self.page.next_page(self.sorted.len());
    }

    pub fn previous_page(&mut self) {
        self.page.previous_page();
    }

    // -------------------- Pipeline ---------------------- //

    fn refilter(&mut self) {
        let start_time = Instant::now();
        self.filtered = Arc::new(filter::apply(&self.rows, &self.columns, &self.filters));
        trace!(
            "Filter kept {}/{} rows in {}ms",
            self.filtered.len(),
            self.rows.len(),
            start_time.elapsed().as_millis()
        );
        self.resort();
    }

    fn resort(&mut self) {
        self.sorted = if self.sort.is_empty() {
            Arc::clone(&self.filtered)
        } else {
            Arc::new(sort::apply(&self.rows, &self.filtered, &self.columns, &self.sort))
        };
        self.page.clamp(self.sorted.len());
    }

    // -------------------- Read access ---------------------- //

    /// The current page. Pure: calling it twice without a mutation in between
    /// yields equal results.
    pub fn visible_page(&self) -> ViewResult {
        let (indices, info) = page::apply(self.sorted.as_slice(), &self.page);
        ViewResult {
            rows: indices.iter().map(|&idx| self.rows[idx].clone()).collect(),
            page_index: info.page_index,
            page_size: info.page_size,
            page_count: info.page_count,
            can_go_previous: info.can_go_previous,
            can_go_next: info.can_go_next,
            visible_row_count: self.sorted.len(),
            total_row_count: self.rows.len(),
        }
    }

    pub fn page_index(&self) -> usize {
        self.page.page_index()
    }

    pub fn page_size(&self) -> usize {
        self.page.page_size()
    }

    pub fn page_count(&self) -> usize {
        self.page.page_count(self.sorted.len())
    }

    pub fn can_go_previous(&self) -> bool {
        self.page.can_go_previous()
    }

    pub fn can_go_next(&self) -> bool {
        self.page.can_go_next(self.sorted.len())
    }

    pub fn visible_row_count(&self) -> usize {
        self.sorted.len()
    }

    pub fn total_row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Columns meant for rendering, hidden ones left out.
    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.hidden)
    }

    pub fn filter_value(&self, column: &str) -> Option<&Value> {
        self.filters.get(column)
    }

    pub fn sort_direction_of(&self, column: &str) -> Option<SortDirection> {
        self.sort.direction_of(column)
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn page_state(&self) -> &PageState {
        &self.page
    }
}

use std::fmt;
use std::io::Error;

use polars::error::PolarsError;
use thiserror::Error;

use crate::column::Column;
use crate::value::{Row, Value};

/// Page size a fresh engine starts with, and the one `reset` restores.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes offered by the page-size selector.
pub const PAGE_SIZE_OPTIONS: [usize; 6] = [5, 10, 20, 25, 50, 100];

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("invalid page size {0}, must be at least 1")]
    InvalidPageSize(usize),
    #[error("io error: {0}")]
    IoError(#[from] Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("loading failed: {0}")]
    LoadingFailed(String),
    #[error("file not found")]
    FileNotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("unknown file type")]
    UnknownFileType,
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub default_page_size: usize,
    pub page_size_options: Vec<usize>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
        }
    }
}

impl ViewConfig {
    /// Next offered page size after `current`, wrapping around.
    pub fn next_page_size(&self, current: usize) -> usize {
        self.page_size_options
            .iter()
            .copied()
            .find(|&size| size > current)
            .or_else(|| self.page_size_options.first().copied())
            .unwrap_or(current)
    }

    /// Previous offered page size before `current`, wrapping around.
    pub fn previous_page_size(&self, current: usize) -> usize {
        self.page_size_options
            .iter()
            .rev()
            .copied()
            .find(|&size| size < current)
            .or_else(|| self.page_size_options.last().copied())
            .unwrap_or(current)
    }
}

/// Every mutation the engine accepts. Fed through `ViewEngine::update`.
#[derive(Debug, Clone)]
pub enum Action {
    SetColumnFilter { column: String, value: Value },
    ToggleSort(String),
    SetPageSize(usize),
    GoToPage(usize),
    NextPage,
    PreviousPage,
    Reset { rows: Vec<Row>, columns: Vec<Column> },
    Reload { rows: Vec<Row>, columns: Vec<Column> },
}

/// Short form for logs. Data replacing actions show counts, not their rows.
impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SetColumnFilter { column, value } => {
                write!(f, "SetColumnFilter({column} = {value:?})")
            }
            Action::ToggleSort(column) => write!(f, "ToggleSort({column})"),
            Action::SetPageSize(n) => write!(f, "SetPageSize({n})"),
            Action::GoToPage(n) => write!(f, "GoToPage({n})"),
            Action::NextPage => f.write_str("NextPage"),
            Action::PreviousPage => f.write_str("PreviousPage"),
            Action::Reset { rows, columns } => {
                write!(f, "Reset({} rows, {} columns)", rows.len(), columns.len())
            }
            Action::Reload { rows, columns } => {
                write!(f, "Reload({} rows, {} columns)", rows.len(), columns.len())
            }
        }
    }
}

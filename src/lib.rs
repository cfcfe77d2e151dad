//! Paginated, filterable, sortable views over an in-memory row collection.
//!
//! Rows flow through a fixed pipeline: filter stage, sort stage, page stage.
//! [`ViewEngine`] owns the data and the view state and keeps the visible page
//! consistent after every mutation.

pub mod column;
pub mod domain;
pub mod engine;
pub mod filter;
pub mod loader;
pub mod page;
pub mod sort;
pub mod value;

pub use column::Column;
pub use domain::{Action, ViewConfig, ViewError};
pub use engine::{ViewEngine, ViewResult};
pub use filter::{FilterKind, FilterState};
pub use page::PageState;
pub use sort::{SortDirection, SortKey, SortState};
pub use value::{Row, Value};

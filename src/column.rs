use std::fmt;
use std::sync::Arc;

use derive_setters::Setters;

use crate::filter::FilterKind;
use crate::value::{Row, Value};

/// Reads a column's value out of a row.
pub type Accessor = Arc<dyn Fn(&Row) -> Value + Send + Sync>;

/// Column descriptor: a unique key, a value accessor, and the filter / sort
/// capabilities the column offers.
///
/// ```ignore
/// let age = Column::new("age").header("Age").filter(FilterKind::AtLeast);
/// let id = Column::new("carId").hidden(true);
/// ```
#[derive(Clone, Setters)]
pub struct Column {
    #[setters(skip)]
    pub key: String,
    #[setters(into)]
    pub header: String,
    #[setters(skip)]
    accessor: Accessor,
    /// `None` means the column cannot be filtered.
    #[setters(strip_option)]
    pub filter: Option<FilterKind>,
    pub sortable: bool,
    /// Hidden columns still filter and sort, they are just not rendered.
    pub hidden: bool,
}

impl Column {
    /// A filterable (starts-with), sortable column reading the field named `key`.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let field = key.clone();
        Self {
            header: key.clone(),
            key,
            accessor: Arc::new(move |row: &Row| row.get(&field).clone()),
            filter: Some(FilterKind::StartsWith),
            sortable: true,
            hidden: false,
        }
    }

    /// Replaces the default field lookup with a derived value.
    pub fn accessor<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&Row) -> Value + Send + Sync + 'static,
    {
        self.accessor = Arc::new(accessor);
        self
    }

    pub fn without_filter(mut self) -> Self {
        self.filter = None;
        self
    }

    pub fn value(&self, row: &Row) -> Value {
        (self.accessor)(row)
    }

    pub fn can_filter(&self) -> bool {
        self.filter.is_some()
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("filter", &self.filter)
            .field("sortable", &self.sortable)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

pub(crate) fn find<'a>(columns: &'a [Column], key: &str) -> Option<&'a Column> {
    columns.iter().find(|c| c.key == key)
}

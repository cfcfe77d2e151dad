//! Filter stage: narrows the row set by every active per-column filter.
//!
//! Filters of distinct columns compose as a logical AND. A row whose field is
//! undefined passes any filter on that field.

use std::collections::BTreeMap;

use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use rayon::prelude::*;
use tracing::{trace, warn};

use crate::column::{self, Column};
use crate::value::{Row, Value};

/// How a column's filter value is matched against its field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// Case-insensitive prefix match on the string form.
    #[default]
    StartsWith,
    /// Case-insensitive subsequence match, contiguous or not.
    Fuzzy,
    /// Numeric threshold, keeps rows whose value is at least the filter value.
    AtLeast,
}

impl FilterKind {
    /// True when `value` would make this filter a no-op, in which case the
    /// entry is dropped from the filter state instead of being stored.
    pub fn should_remove(&self, value: &Value) -> bool {
        match self {
            FilterKind::StartsWith => match value {
                Value::Undefined => true,
                Value::Text(s) => s.is_empty(),
                _ => false,
            },
            FilterKind::Fuzzy => match value {
                Value::Undefined => true,
                Value::Text(s) => s.trim().is_empty(),
                _ => false,
            },
            FilterKind::AtLeast => !matches!(value, Value::Number(n) if n.is_finite()),
        }
    }

}

/// Active filter values keyed by column. Never holds a no-op entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    filters: BTreeMap<String, Value>,
}

impl FilterState {
    /// Stores `value` for `column`, or removes the entry when `kind` deems it empty.
    /// Returns whether the state changed.
    pub fn set(&mut self, column: &str, kind: FilterKind, value: Value) -> bool {
        if kind.should_remove(&value) {
            trace!("Removing filter on {column}");
            self.filters.remove(column).is_some()
        } else if self.filters.get(column) == Some(&value) {
            false
        } else {
            trace!("Filter {column} {kind:?} {value:?}");
            self.filters.insert(column.to_string(), value);
            true
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.filters.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.filters.remove(column)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Drops entries whose column is gone or no longer accepts the stored value.
    pub fn retain_columns(&mut self, columns: &[Column]) {
        self.filters.retain(|key, value| {
            let keep = column::find(columns, key)
                .and_then(|c| c.filter)
                .is_some_and(|kind| !kind.should_remove(value));
            if !keep {
                trace!("Dropping stale filter on {key}");
            }
            keep
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Filter value compiled for repeated matching.
enum Predicate {
    StartsWith(String),
    Fuzzy(Atom),
    AtLeast(f64),
}

struct Scratch {
    matcher: Matcher,
    buf: Vec<char>,
}

impl Scratch {
    fn new() -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
            buf: Vec::new(),
        }
    }
}

impl Predicate {
    fn prepare(kind: FilterKind, value: &Value) -> Option<Self> {
        if kind.should_remove(value) {
            return None;
        }
        match kind {
            FilterKind::StartsWith => Some(Predicate::StartsWith(value.to_string().to_lowercase())),
            // One atom for the whole text: words must match in the order typed.
            FilterKind::Fuzzy => Some(Predicate::Fuzzy(Atom::new(
                value.to_string().trim(),
                CaseMatching::Ignore,
                Normalization::Smart,
                AtomKind::Fuzzy,
                false,
            ))),
            FilterKind::AtLeast => value.as_number().map(Predicate::AtLeast),
        }
    }

    fn test(&self, field: &Value, scratch: &mut Scratch) -> bool {
        if field.is_undefined() {
            return true;
        }
        match self {
            Predicate::StartsWith(needle) => field.to_string().to_lowercase().starts_with(needle),
            Predicate::Fuzzy(atom) => {
                let text = field.to_string();
                let haystack = Utf32Str::new(&text, &mut scratch.buf);
                atom.score(haystack, &mut scratch.matcher).is_some()
            }
            Predicate::AtLeast(threshold) => field.to_number().is_some_and(|n| n >= *threshold),
        }
    }
}

/// Applies `state` to every row, returning the indices of the rows that pass, in order.
pub fn apply(rows: &[Row], columns: &[Column], state: &FilterState) -> Vec<usize> {
    let all: Vec<usize> = (0..rows.len()).collect();
    apply_to(rows, &all, columns, state)
}

/// Applies `state` to the rows named by `candidates`, keeping their order.
pub fn apply_to(
    rows: &[Row],
    candidates: &[usize],
    columns: &[Column],
    state: &FilterState,
) -> Vec<usize> {
    let predicates: Vec<(&Column, Predicate)> = state
        .iter()
        .filter_map(|(key, value)| {
            let Some(column) = column::find(columns, key) else {
                warn!("Ignoring filter on unknown column {key}");
                return None;
            };
            let predicate = Predicate::prepare(column.filter?, value)?;
            Some((column, predicate))
        })
        .collect();

    if predicates.is_empty() {
        return candidates.to_vec();
    }

    // Rows are checked in parallel, collect keeps the candidate order.
    candidates
        .par_iter()
        .copied()
        .map_init(Scratch::new, |scratch, idx| {
            let row = &rows[idx];
            let keep = predicates
                .iter()
                .all(|(column, predicate)| predicate.test(&column.value(row), scratch));
            (idx, keep)
        })
        .filter_map(|(idx, keep)| keep.then_some(idx))
        .collect()
}

//! Sort stage: orders the filtered rows by at most one column.

use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::trace;

use crate::column::{self, Column};
use crate::value::{Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
}

/// The single active sort, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    key: Option<SortKey>,
}

impl SortState {
    /// Cycles `column` through unsorted -> ascending -> descending -> unsorted.
    /// Picking a different column drops the previous column's sort.
    pub fn toggle(&mut self, column: &str) {
        self.key = match self.key.take() {
            Some(SortKey {
                column: current,
                direction: SortDirection::Ascending,
            }) if current == column => Some(SortKey {
                column: current,
                direction: SortDirection::Descending,
            }),
            Some(SortKey {
                column: current,
                direction: SortDirection::Descending,
            }) if current == column => None,
            _ => Some(SortKey {
                column: column.to_string(),
                direction: SortDirection::Ascending,
            }),
        };
        trace!("Sort state after toggling {column}: {:?}", self.key);
    }

    pub fn key(&self) -> Option<&SortKey> {
        self.key.as_ref()
    }

    pub fn direction_of(&self, column: &str) -> Option<SortDirection> {
        self.key
            .as_ref()
            .filter(|k| k.column == column)
            .map(|k| k.direction)
    }

    pub fn clear(&mut self) {
        self.key = None;
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_none()
    }

    /// Drops the sort when its column is gone or no longer sortable.
    pub fn retain_columns(&mut self, columns: &[Column]) {
        if let Some(key) = &self.key
            && !column::find(columns, &key.column).is_some_and(|c| c.sortable)
        {
            trace!("Dropping stale sort on {}", key.column);
            self.key = None;
        }
    }
}

/// Total order over field values.
///
/// Undefined values go last in either direction. Among defined values numbers
/// come before everything else and compare numerically, the rest compare by
/// their string form.
pub fn compare(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (Value::Undefined, Value::Undefined) => return Ordering::Equal,
        (Value::Undefined, _) => return Ordering::Greater,
        (_, Value::Undefined) => return Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Number(_), _) => Ordering::Less,
        (_, Value::Number(_)) => Ordering::Greater,
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    };
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Returns `indices` reordered by the active sort. The sort is stable, so rows
/// with equal keys keep their incoming relative order.
pub fn apply(rows: &[Row], indices: &[usize], columns: &[Column], state: &SortState) -> Vec<usize> {
    let Some(key) = state.key() else {
        return indices.to_vec();
    };
    let Some(column) = column::find(columns, &key.column) else {
        return indices.to_vec();
    };

    let mut indexed_rows: Vec<(usize, Value)> = indices
        .iter()
        .map(|&idx| (idx, column.value(&rows[idx])))
        .collect();
    indexed_rows.par_sort_by(|(_, a), (_, b)| compare(a, b, key.direction));

    indexed_rows.into_iter().map(|(idx, _)| idx).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn sorted_by(rows: &[Row], column: &str, direction: SortDirection) -> Vec<usize> {
        let columns = vec![Column::new(column)];
        let state = SortState {
            key: Some(SortKey {
                column: column.to_string(),
                direction,
            }),
        };
        let all: Vec<usize> = (0..rows.len()).collect();
        apply(rows, &all, &columns, &state)
    }

    #[test]
    fn toggle_cycles_back_to_unsorted() {
        let mut state = SortState::default();
        state.toggle("age");
        assert_eq!(state.direction_of("age"), Some(SortDirection::Ascending));
        state.toggle("age");
        assert_eq!(state.direction_of("age"), Some(SortDirection::Descending));
        state.toggle("age");
        assert!(state.is_empty());
    }

    #[test]
    fn toggling_another_column_replaces_sort() {
        let mut state = SortState::default();
        state.toggle("age");
        state.toggle("age");
        state.toggle("name");
        assert_eq!(state.direction_of("age"), None);
        assert_eq!(state.direction_of("name"), Some(SortDirection::Ascending));
    }

    #[test]
    fn empty_state_keeps_input_order() {
        let rows = vec![Row::new().with("a", 2), Row::new().with("a", 1)];
        let out = apply(&rows, &[1, 0], &[Column::new("a")], &SortState::default());
        assert_eq!(out, vec![1, 0]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let rows: Vec<Row> = [(1, "b"), (2, "a"), (3, "b"), (4, "a"), (5, "b")]
            .into_iter()
            .map(|(id, group)| Row::new().with("id", id).with("group", group))
            .collect();
        assert_eq!(sorted_by(&rows, "group", SortDirection::Ascending), vec![1, 3, 0, 2, 4]);
        assert_eq!(sorted_by(&rows, "group", SortDirection::Descending), vec![0, 2, 4, 1, 3]);
    }

    #[rstest]
    #[case::ascending(SortDirection::Ascending, vec![1, 3, 0, 4, 2])]
    #[case::descending(SortDirection::Descending, vec![4, 0, 3, 1, 2])]
    fn undefined_sorts_last_in_both_directions(
        #[case] direction: SortDirection,
        #[case] expected: Vec<usize>,
    ) {
        let rows = vec![
            Row::new().with("v", 30),
            Row::new().with("v", 9),
            Row::new(),
            Row::new().with("v", 10),
            Row::new().with("v", "abc"),
        ];
        assert_eq!(sorted_by(&rows, "v", direction), expected);
    }

    #[test]
    fn numbers_compare_numerically_not_lexically() {
        assert_eq!(
            compare(&Value::Number(9.0), &Value::Number(10.0), SortDirection::Ascending),
            Ordering::Less
        );
        assert_eq!(
            compare(&Value::from("9"), &Value::from("10"), SortDirection::Ascending),
            Ordering::Greater
        );
        assert_eq!(
            compare(&Value::Bool(false), &Value::from("true"), SortDirection::Ascending),
            Ordering::Less
        );
    }

    #[test]
    fn retain_drops_unsortable_column() {
        let mut state = SortState::default();
        state.toggle("age");
        state.retain_columns(&[Column::new("age")]);
        assert!(!state.is_empty());
        state.retain_columns(&[Column::new("age").sortable(false)]);
        assert!(state.is_empty());
    }
}

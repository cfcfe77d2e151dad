//! Page stage: slices the sorted rows into the requested page.
//!
//! The page index is always clamped into `0..page_count`, where `page_count`
//! is at least 1 so an empty result still has a (blank) first page.

use std::ops::Range;

use tracing::trace;

use crate::domain::{DEFAULT_PAGE_SIZE, ViewError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    page_size: usize,
    page_index: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_index: 0,
        }
    }
}

/// Number of pages for `row_count` rows, never less than one.
pub fn page_count(row_count: usize, page_size: usize) -> usize {
    row_count.div_ceil(page_size).max(1)
}

/// Resize policy: after a page-size change the page shown is the one that
/// contains the row that was first on screen before the change.
pub fn page_keeping_first_row(first_row: usize, page_size: usize) -> usize {
    first_row / page_size
}

impl PageState {
    pub fn new(page_size: usize) -> Result<Self, ViewError> {
        if page_size == 0 {
            return Err(ViewError::InvalidPageSize(page_size));
        }
        Ok(Self {
            page_size,
            page_index: 0,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_count(&self, row_count: usize) -> usize {
        page_count(row_count, self.page_size)
    }

    /// Index of the first row on the current page.
    pub fn first_row(&self) -> usize {
        self.page_index * self.page_size
    }

    /// Pulls the page index back into range after the row count changed.
    pub fn clamp(&mut self, row_count: usize) {
        let last = self.page_count(row_count) - 1;
        if self.page_index > last {
            trace!("Clamping page index {} to {last}", self.page_index);
            self.page_index = last;
        }
    }

    pub fn go_to_page(&mut self, page: usize, row_count: usize) {
        self.page_index = page.min(self.page_count(row_count) - 1);
    }

    /// Returns false when already on the last page.
    pub fn next_page(&mut self, row_count: usize) -> bool {
        if self.can_go_next(row_count) {
            self.page_index += 1;
            true
        } else {
            false
        }
    }

    /// Returns false when already on the first page.
    pub fn previous_page(&mut self) -> bool {
        if self.can_go_previous() {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    /// Changes the page size, keeping the first visible row on screen.
    /// A size of zero is rejected and leaves the state untouched.
    pub fn set_page_size(&mut self, page_size: usize, row_count: usize) -> Result<(), ViewError> {
        if page_size == 0 {
            return Err(ViewError::InvalidPageSize(page_size));
        }
        let first_row = self.first_row();
        self.page_size = page_size;
        self.page_index = page_keeping_first_row(first_row, page_size);
        self.clamp(row_count);
        Ok(())
    }

    pub fn can_go_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_go_next(&self, row_count: usize) -> bool {
        self.page_index + 1 < self.page_count(row_count)
    }

    /// Row range of the current page within `row_count` rows.
    pub fn range(&self, row_count: usize) -> Range<usize> {
        let page_index = self.page_index.min(self.page_count(row_count) - 1);
        let start = (page_index * self.page_size).min(row_count);
        let end = (start + self.page_size).min(row_count);
        start..end
    }
}

/// Pagination figures for the page currently shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub can_go_previous: bool,
    pub can_go_next: bool,
}

/// Slices `rows` to the page `state` asks for. An out-of-range page index is
/// clamped, never an error.
pub fn apply<'a, T>(rows: &'a [T], state: &PageState) -> (&'a [T], PageInfo) {
    let mut state = *state;
    state.clamp(rows.len());
    let info = PageInfo {
        page_index: state.page_index,
        page_size: state.page_size,
        page_count: state.page_count(rows.len()),
        can_go_previous: state.can_go_previous(),
        can_go_next: state.can_go_next(rows.len()),
    };
    (&rows[state.range(rows.len())], info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn state(page_size: usize, page_index: usize) -> PageState {
        PageState {
            page_size,
            page_index,
        }
    }

    #[rstest]
    #[case::empty(0, 10, 1)]
    #[case::exact(20, 10, 2)]
    #[case::partial(21, 10, 3)]
    #[case::single(1, 10, 1)]
    fn page_count_rounds_up(#[case] rows: usize, #[case] size: usize, #[case] expected: usize) {
        assert_eq!(page_count(rows, size), expected);
    }

    #[test]
    fn apply_slices_last_partial_page() {
        let rows: Vec<u32> = (0..25).collect();
        let (page, info) = apply(&rows, &state(10, 2));
        assert_eq!(page, &[20, 21, 22, 23, 24]);
        assert_eq!(
            info,
            PageInfo {
                page_index: 2,
                page_size: 10,
                page_count: 3,
                can_go_previous: true,
                can_go_next: false,
            }
        );
    }

    #[test]
    fn apply_clamps_out_of_range_index() {
        let rows: Vec<u32> = (0..5).collect();
        let (page, info) = apply(&rows, &state(10, 3));
        assert_eq!(page, &[0, 1, 2, 3, 4]);
        assert_eq!(info.page_index, 0);
        assert!(!info.can_go_next);
        assert!(!info.can_go_previous);
    }

    #[test]
    fn apply_on_empty_rows_is_single_blank_page() {
        let rows: Vec<u32> = Vec::new();
        let (page, info) = apply(&rows, &state(10, 4));
        assert!(page.is_empty());
        assert_eq!(info.page_count, 1);
        assert_eq!(info.page_index, 0);
    }

    #[test]
    fn navigation_is_a_no_op_at_bounds() {
        let mut page = PageState::default();
        assert!(!page.previous_page());
        assert!(page.next_page(25));
        assert!(page.next_page(25));
        assert!(!page.next_page(25));
        assert_eq!(page.page_index(), 2);
        page.go_to_page(99, 25);
        assert_eq!(page.page_index(), 2);
        page.go_to_page(1, 25);
        assert_eq!(page.page_index(), 1);
    }

    #[rstest]
    #[case::grow_from_second_page(10, 1, 20, 0)]
    #[case::grow_keeps_row_30(10, 3, 20, 1)]
    #[case::shrink(20, 1, 5, 4)]
    #[case::shrink_past_end(10, 4, 3, 13)]
    fn resize_keeps_first_visible_row(
        #[case] size: usize,
        #[case] index: usize,
        #[case] new_size: usize,
        #[case] expected: usize,
    ) {
        let mut page = state(size, index);
        let first_row = page.first_row();
        page.set_page_size(new_size, 45).unwrap();
        assert_eq!(page.page_index(), expected);
        assert!(page.range(45).contains(&first_row));
    }

    #[test]
    fn resize_clamps_to_last_page() {
        let mut page = state(5, 7);
        page.set_page_size(50, 38).unwrap();
        assert_eq!(page.page_index(), 0);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut page = state(10, 2);
        assert!(matches!(
            page.set_page_size(0, 100),
            Err(ViewError::InvalidPageSize(0))
        ));
        assert_eq!(page, state(10, 2));
        assert!(PageState::new(0).is_err());
    }
}

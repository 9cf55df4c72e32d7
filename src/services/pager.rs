use std::ops::Range;

use crate::models::table::PagerState;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 200;

/// Client-side paging over rows that are already in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_index: usize,
    page_size: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// An empty table still has one (empty) page.
    pub fn page_count(&self, total: usize) -> usize {
        if total == 0 {
            1
        } else {
            total.div_ceil(self.page_size)
        }
    }

    pub fn can_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next(&self, total: usize) -> bool {
        self.page_index + 1 < self.page_count(total)
    }

    pub fn next(&mut self, total: usize) -> bool {
        if !self.can_next(total) {
            return false;
        }
        self.page_index += 1;
        true
    }

    pub fn previous(&mut self) -> bool {
        if !self.can_previous() {
            return false;
        }
        self.page_index -= 1;
        true
    }

    pub fn first(&mut self) {
        self.page_index = 0;
    }

    pub fn last(&mut self, total: usize) {
        self.page_index = self.page_count(total) - 1;
    }

    pub fn go_to(&mut self, page_index: usize, total: usize) {
        self.page_index = page_index.min(self.page_count(total) - 1);
    }

    /// Pulls the index back inside range after the row count shrank.
    pub fn clamp(&mut self, total: usize) {
        let last = self.page_count(total) - 1;
        if self.page_index > last {
            self.page_index = last;
        }
    }

    /// Keeps the first visible row on screen when the size changes.
    pub fn set_page_size(&mut self, page_size: usize) {
        let first_row = self.page_index * self.page_size;
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self.page_index = first_row / self.page_size;
    }

    pub fn range(&self, total: usize) -> Range<usize> {
        let start = (self.page_index * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }

    pub fn state(&self, total: usize) -> PagerState {
        PagerState {
            page_index: self.page_index,
            page_size: self.page_size,
            page_count: self.page_count(total),
            can_previous: self.can_previous(),
            can_next: self.can_next(total),
        }
    }
}

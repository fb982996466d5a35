//! Page requests and page results

use crate::query_builder::ordering::OrderBy;
use serde::{Deserialize, Serialize};

/// A zero-based page index and a page size, plus optional sort keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub sort: Vec<OrderBy>,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
        }
    }

    pub fn first(size: i64) -> Self {
        Self::new(0, size)
    }

    pub fn with_sort(mut self, order: OrderBy) -> Self {
        self.sort.push(order);
        self
    }

    /// Row offset of the first row of this page, `None` when the request is
    /// malformed (negative page, non-positive size) or the offset overflows
    pub fn offset(&self) -> Option<i64> {
        if self.page < 0 || self.size <= 0 {
            return None;
        }
        self.page.checked_mul(self.size)
    }

    /// Total row count implied by the content alone, if the content proves it.
    ///
    /// A page that came back shorter than requested is the last one, so the
    /// total is its offset plus its length. The exception is an empty page
    /// past the first: it proves nothing about how many rows precede it.
    pub fn total_from_content(&self, content_len: usize) -> Option<i64> {
        let offset = self.offset()?;
        let len = i64::try_from(content_len).ok()?;

        if len >= self.size {
            return None;
        }
        if offset == 0 || len > 0 {
            return offset.checked_add(len);
        }
        None
    }

    /// Request for the following page; the index saturates at `i64::MAX`
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

/// One page of results together with the total number of matching rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total: i64) -> Self {
        Self {
            content,
            page: request.page,
            size: request.size,
            total,
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.size <= 0 {
            return 0;
        }
        (self.total + self.size - 1) / self.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}

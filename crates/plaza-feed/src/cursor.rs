//! Page cursor
//!
//! Pagination bookkeeping: which page comes next, whether one is in flight,
//! and whether the feed may have more. Results for any page other than the
//! expected one are stale and leave the cursor untouched.

/// Outcome of recording a page result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageResult {
    /// The result matched the expected page and advanced the cursor.
    Applied {
        /// Whether another page may exist
        has_more: bool,
    },
    /// The result was for a page other than the expected one.
    Stale {
        /// Page the cursor was waiting for
        expected: u32,
    },
}

/// Pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    current_page: u32,
    has_more: bool,
    in_flight: Option<u32>,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCursor {
    /// Cursor positioned before the first page.
    pub fn new() -> Self {
        Self {
            current_page: 0,
            has_more: true,
            in_flight: None,
        }
    }

    /// Next page index to request.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Whether another page may exist.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Page currently in flight, if any.
    pub fn in_flight(&self) -> Option<u32> {
        self.in_flight
    }

    /// Whether a page fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True iff more pages may exist and none is in flight.
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.is_loading()
    }

    /// Mark `page` as in flight.
    pub fn begin(&mut self, page: u32) {
        self.in_flight = Some(page);
    }

    /// Record the item count returned for `page_index`.
    ///
    /// A short page (fewer than `page_size` items) marks the end of data.
    pub fn record_page_result(
        &mut self,
        page_index: u32,
        item_count: usize,
        page_size: u32,
    ) -> PageResult {
        if page_index != self.current_page {
            tracing::debug!(
                page = page_index,
                expected = self.current_page,
                "discarding stale page result"
            );
            return PageResult::Stale {
                expected: self.current_page,
            };
        }
        if self.in_flight == Some(page_index) {
            self.in_flight = None;
        }
        self.has_more = item_count >= page_size as usize;
        self.current_page = page_index.saturating_add(1);
        PageResult::Applied {
            has_more: self.has_more,
        }
    }

    /// Record a failed fetch of `page_index`. Pagination stops until
    /// [`resume`](Self::resume) is called.
    pub fn fail(&mut self, page_index: u32) {
        if self.in_flight == Some(page_index) {
            self.in_flight = None;
        }
        self.has_more = false;
    }

    /// Drop the in-flight marker for `page_index` without recording a
    /// result.
    pub fn cancel(&mut self, page_index: u32) {
        if self.in_flight == Some(page_index) {
            self.in_flight = None;
        }
    }

    /// Re-enable pagination after a failure.
    pub fn resume(&mut self) {
        self.has_more = true;
    }

    /// Expect page 0 next, keeping loaded data (refresh).
    pub fn rewind(&mut self) {
        self.current_page = 0;
        self.has_more = true;
    }

    /// Return to the initial position.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

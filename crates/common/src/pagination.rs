//! Cursor pagination.
//!
//! Every relationship listing is ordered by edge id, newest first. A page is
//! requested with an optional cursor (the id of the last item the caller has
//! already seen) and a limit. The store is asked for `limit + 1` rows with
//! `id < cursor`; the extra row only decides whether another page exists and is
//! never returned.
//!
//! Edge ids only grow, so an edge inserted during a traversal lands above every
//! cursor already handed out and can never shift items that were returned on an
//! earlier page.

use serde::Serialize;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u64 = 20;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Exclusive upper bound on edge ids; `None` starts from the newest edge.
    pub cursor: Option<i64>,
    /// Number of items to return, within `1..=MAX_PAGE_LIMIT`.
    pub limit: u64,
}

impl PageRequest {
    /// Build a request, clamping `limit` into `[1, MAX_PAGE_LIMIT]`.
    #[must_use]
    pub fn new(cursor: Option<i64>, limit: Option<u64>) -> Self {
        Self {
            cursor,
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Number of rows to fetch from the store.
    #[must_use]
    pub const fn fetch_limit(&self) -> u64 {
        self.limit + 1
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, newest first.
    pub items: Vec<T>,
    /// Cursor for the next page, or `None` when the listing is exhausted.
    pub next_cursor: Option<i64>,
}

impl<T> Page<T> {
    /// An empty, exhausted page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    /// Build a page from rows fetched with [`PageRequest::fetch_limit`].
    ///
    /// `rows` must already be ordered by id descending.
    #[must_use]
    pub fn from_overfetch(mut rows: Vec<T>, request: &PageRequest, id_of: impl Fn(&T) -> i64) -> Self {
        let limit = usize::try_from(request.limit).unwrap_or(usize::MAX);
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        let next_cursor = if has_more { rows.last().map(&id_of) } else { None };

        Self {
            items: rows,
            next_cursor,
        }
    }

    /// Convert every item, keeping the cursor.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

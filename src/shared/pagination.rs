use serde::Serialize;
use utoipa::ToSchema;

use super::query::QueryParams;

/// Splits a listing of `total` items into pages of `per_page`.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: usize,
    per_page: usize,
}

/// The resolved page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: usize,
    pub offset: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Paginator {
    pub fn new(total: usize, per_page: usize) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// Never zero: an empty listing still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// Resolve a requested page number. Missing, non-numeric or `< 1` values
    /// give page 1; values past the end give the last page.
    pub fn page(&self, requested: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages();
        let number = requested
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, num_pages as i64) as usize;

        PageWindow {
            number,
            num_pages,
            per_page: self.per_page,
            total: self.total,
            offset: (number - 1) * self.per_page,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }
}

impl PageWindow {
    /// Row bounds of this page within an in-memory listing.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset.min(self.total);
        let end = (self.offset + self.per_page).min(self.total);
        start..end
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn sql_offset(&self) -> i64 {
        self.offset as i64
    }
}

/// The items of `window` out of a fully loaded listing.
pub fn paginate_slice<T>(items: Vec<T>, window: &PageWindow) -> Vec<T> {
    let range = window.range();
    items
        .into_iter()
        .skip(range.start)
        .take(range.len())
        .collect()
}

/// Link to page `n` keeping every other parameter, sort and filters included.
pub fn page_link(params: &QueryParams, n: usize) -> String {
    let mut params = params.clone();
    params.set("page", n.to_string());
    params.to_link()
}

/// Previous/next links for a page window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageLinks {
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl PageLinks {
    pub fn for_window(params: &QueryParams, window: &PageWindow) -> Self {
        Self {
            previous: window
                .has_previous
                .then(|| page_link(params, window.number - 1)),
            next: window.has_next.then(|| page_link(params, window.number + 1)),
        }
    }
}

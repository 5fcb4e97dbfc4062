use axum::http::{HeaderMap, HeaderValue, header::CONTENT_RANGE};

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// Build the `Content-Range` header for a window of a listing.
///
/// The resource name is sanitized so that it can never inject header content. A window
/// starting at or past the end of the data yields the unsatisfied form `name */total`.
#[must_use]
pub fn calculate_content_range(offset: u64, limit: u64, total_count: u64, resource_name: &str) -> HeaderMap {
    let safe_name = sanitize_resource_name(resource_name);
    let range = if offset >= total_count {
        format!("{safe_name} */{total_count}")
    } else {
        let last = offset
            .saturating_add(limit)
            .saturating_sub(1)
            .min(total_count - 1);
        format!("{safe_name} {offset}-{last}/{total_count}")
    };

    let value = HeaderValue::from_str(&range).unwrap_or_else(|_| HeaderValue::from_static("items */0"));

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_RANGE, value);
    headers
}

/// Page window of a listing.
///
/// `page` is 1-based. Without a page size the listing is a single page. The total is cached
/// until it is replaced, and a zero total marks the listing as not searchable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page: u64,
    page_size: Option<u64>,
    total: Option<u64>,
    searchable: bool,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: None,
            total: None,
            searchable: true,
        }
    }
}

impl Paginator {
    #[must_use]
    pub fn new(page: u64, page_size: Option<u64>) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.filter(|&size| size > 0),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Non-positive pages clamp to the first one
    pub fn set_page(&mut self, page: u64) -> &mut Self {
        self.page = page.max(1);
        self
    }

    #[must_use]
    pub fn page_size(&self) -> Option<u64> {
        self.page_size
    }

    /// A zero page size means no paging
    pub fn set_page_size(&mut self, page_size: Option<u64>) -> &mut Self {
        self.page_size = page_size.filter(|&size| size > 0);
        self
    }

    /// Cached total, if known
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn set_total(&mut self, total: Option<u64>) -> &mut Self {
        self.total = total;
        self
    }

    /// Record the result of a count; a zero count turns searching off
    pub(crate) fn record_count(&mut self, total: u64) {
        self.total = Some(total);
        if total == 0 {
            self.searchable = false;
        }
    }

    #[must_use]
    pub fn searchable(&self) -> bool {
        self.searchable
    }

    pub fn set_searchable(&mut self, searchable: bool) -> &mut Self {
        self.searchable = searchable;
        self
    }

    /// Number of pages, `None` while the total is unknown or zero
    #[must_use]
    pub fn total_pages(&self) -> Option<u64> {
        let total = self.total.filter(|&total| total > 0)?;
        Some(self.page_size.map_or(1, |size| total.div_ceil(size)))
    }

    #[must_use]
    pub fn first_page(&self) -> u64 {
        1
    }

    #[must_use]
    pub fn last_page(&self) -> Option<u64> {
        self.total_pages()
    }

    #[must_use]
    pub fn next_page(&self) -> Option<u64> {
        self.total_pages()
            .filter(|&pages| self.page < pages)
            .map(|_| self.page + 1)
    }

    #[must_use]
    pub fn prev_page(&self) -> Option<u64> {
        (self.page > 1).then(|| self.page - 1)
    }

    /// Rows to skip for the current page
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page_size
            .map_or(0, |size| (self.page - 1).saturating_mul(size))
    }

    /// Rows to take for the current page, `None` for everything
    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        self.page_size
    }

    /// `Content-Range` header for the current page of `resource`
    #[must_use]
    pub fn content_range(&self, resource: &str) -> HeaderMap {
        let total = self.total.unwrap_or(0);
        let limit = self.page_size.unwrap_or(total);
        calculate_content_range(self.offset(), limit, total, resource)
    }
}

//! Page-number pagination for listing endpoints
//!
//! A listing is cut into pages of a fixed size chosen by the server. The
//! client picks a page with `?page=<n>` (1-based) or `?page=last`. A page
//! outside `1..=total_pages` is rejected with
//! [`PaginationError::InvalidPage`]; it is never clamped. An empty listing
//! has no pages, so every request against it is rejected.

use serde::Serialize;
use url::Url;

use crate::error::PaginationError;

/// Page size used when the server configuration does not say otherwise
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Query parameter carrying the page number
pub const PAGE_QUERY_PARAM: &str = "page";

/// A page selector as sent by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// An explicit 1-based page number
    Number(i64),
    /// The final page, whatever its number
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::Number(1)
    }
}

/// Pagination policy with a fixed, server-side page size
#[derive(Debug, Clone)]
pub struct PageNumberPagination {
    page_size: usize,
    page_query_param: String,
    last_page_strings: Vec<String>,
}

impl Default for PageNumberPagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageNumberPagination {
    /// Create a policy with the given page size. A size of zero falls back to
    /// [`DEFAULT_PAGE_SIZE`].
    pub fn new(page_size: usize) -> Self {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };

        Self {
            page_size,
            page_query_param: PAGE_QUERY_PARAM.to_string(),
            last_page_strings: vec!["last".to_string()],
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_query_param(&self) -> &str {
        &self.page_query_param
    }

    /// Parse the raw `page` query value. An absent value selects page 1.
    pub fn parse_request(&self, raw: Option<&str>) -> Result<PageRequest, PaginationError> {
        let Some(raw) = raw.map(str::trim) else {
            return Ok(PageRequest::default());
        };

        if self.last_page_strings.iter().any(|s| s == raw) {
            return Ok(PageRequest::Last);
        }

        raw.parse::<i64>()
            .map(PageRequest::Number)
            .map_err(|_| PaginationError::InvalidPage)
    }

    /// Number of pages needed for `count` items
    pub fn total_pages(&self, count: usize) -> usize {
        count.div_ceil(self.page_size)
    }

    /// Resolve a page request against a listing of `count` items
    pub fn bounds(
        &self,
        count: usize,
        request: PageRequest,
    ) -> Result<PageBounds, PaginationError> {
        let total_pages = self.total_pages(count);

        let number = match request {
            PageRequest::Last => total_pages,
            PageRequest::Number(n) => {
                usize::try_from(n).map_err(|_| PaginationError::InvalidPage)?
            }
        };

        if number < 1 || number > total_pages {
            return Err(PaginationError::InvalidPage);
        }

        let offset = (number - 1) * self.page_size;
        let limit = self.page_size.min(count - offset);

        Ok(PageBounds {
            number,
            page_size: self.page_size,
            count,
            total_pages,
            offset,
            limit,
        })
    }

    /// Cut one page out of an in-memory sequence. Links are built from
    /// `base` when one is given.
    pub fn paginate_slice<T: Clone>(
        &self,
        items: &[T],
        request: PageRequest,
        base: Option<&Url>,
    ) -> Result<Page<T>, PaginationError> {
        let bounds = self.bounds(items.len(), request)?;
        let results = items[bounds.offset..bounds.offset + bounds.limit].to_vec();
        Ok(Page::new(&bounds, results, base, &self.page_query_param))
    }

    /// Wrap an already fetched page of results, building links from `base`
    pub fn page<T>(&self, bounds: &PageBounds, results: Vec<T>, base: Option<&Url>) -> Page<T> {
        Page::new(bounds, results, base, &self.page_query_param)
    }
}

/// A resolved page: which rows to fetch and what surrounds them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// 1-based page number
    pub number: usize,
    pub page_size: usize,
    /// Total number of items in the listing
    pub count: usize,
    pub total_pages: usize,
    /// Index of the first item on this page
    pub offset: usize,
    /// Number of items on this page
    pub limit: usize,
}

impl PageBounds {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_number(&self) -> Option<usize> {
        self.has_next().then_some(self.number + 1)
    }

    pub fn previous_number(&self) -> Option<usize> {
        self.has_previous().then_some(self.number - 1)
    }
}

/// Response envelope for a paginated listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
    /// 1-based number of this page
    #[serde(skip)]
    pub number: usize,
    #[serde(skip)]
    pub total_pages: usize,
}

impl<T> Page<T> {
    fn new(bounds: &PageBounds, results: Vec<T>, base: Option<&Url>, param: &str) -> Self {
        let next = base
            .zip(bounds.next_number())
            .map(|(url, n)| replace_query_param(url, param, &n.to_string()).to_string());

        // The first page is linked without a page parameter.
        let previous = base.zip(bounds.previous_number()).map(|(url, n)| {
            if n == 1 {
                remove_query_param(url, param).to_string()
            } else {
                replace_query_param(url, param, &n.to_string()).to_string()
            }
        });

        Self {
            count: bounds.count,
            next,
            previous,
            results,
            number: bounds.number,
            total_pages: bounds.total_pages,
        }
    }

    /// Whether a later page exists, with or without a link to it
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

fn other_pairs(url: &Url, key: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();
    pairs
}

fn with_pairs(url: &Url, pairs: &[(String, String)]) -> Url {
    let mut out = url.clone();
    if pairs.is_empty() {
        out.set_query(None);
    } else {
        out.query_pairs_mut().clear().extend_pairs(pairs);
    }
    out
}

/// Return `url` with `key` set to `value`, keeping other parameters
pub fn replace_query_param(url: &Url, key: &str, value: &str) -> Url {
    let mut pairs = other_pairs(url, key);
    pairs.push((key.to_string(), value.to_string()));
    pairs.sort();
    with_pairs(url, &pairs)
}

/// Return `url` without `key`, keeping other parameters
pub fn remove_query_param(url: &Url, key: &str) -> Url {
    with_pairs(url, &other_pairs(url, key))
}

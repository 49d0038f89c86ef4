//! Page-number pagination.
//!
//! Clients ask for `page` (1-based) and `pageSize`; stores work in `skip`/`take`. Query-string
//! values arrive as text and are coerced here.

/// Page used when the client does not ask for one.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("{field} must be an integer, got '{value}'")]
    NotAnInteger { field: &'static str, value: String },
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

/// A validated page request (`page >= 1`, `page_size >= 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

/// Offset form of a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: u64,
    pub take: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self, PageError> {
        if page == 0 {
            return Err(PageError::Zero { field: "page" });
        }
        if page_size == 0 {
            return Err(PageError::Zero { field: "pageSize" });
        }
        Ok(Self { page, page_size })
    }

    /// Builds a request from raw query-string values.
    ///
    /// Absent or blank values fall back to [`DEFAULT_PAGE`] / [`DEFAULT_PAGE_SIZE`].
    /// Surrounding whitespace is ignored.
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Result<Self, PageError> {
        let page = coerce("page", page, DEFAULT_PAGE)?;
        let page_size = coerce("pageSize", page_size, DEFAULT_PAGE_SIZE)?;
        Self::new(page, page_size)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// `skip = (page - 1) * page_size`, `take = page_size`.
    pub fn window(&self) -> PageWindow {
        PageWindow {
            skip: u64::from(self.page - 1) * u64::from(self.page_size),
            take: u64::from(self.page_size),
        }
    }
}

fn coerce(field: &'static str, raw: Option<&str>, default: u32) -> Result<u32, PageError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<u32>().map_err(|_| PageError::NotAnInteger {
            field,
            value: value.to_string(),
        }),
    }
}

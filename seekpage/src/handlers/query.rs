//! Query parameters for paginated endpoints
//!
//! # Example
//!
//! ```rust
//! use seekpage::handlers::PageQuery;
//!
//! let query = PageQuery::default().with_limit(500);
//! assert_eq!(query.limit(), 100);
//! assert_eq!(PageQuery::default().limit(), 20);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::error::Result;
use crate::keyset::{Cursor, FilterCondition, PageRequest, SortSpec};

/// Default number of items per page
pub const DEFAULT_LIMIT: u32 = 20;

/// Maximum allowed items per page
pub const MAX_LIMIT: u32 = 100;

/// `?after=<token>&limit=<n>` query parameters
///
/// The limit cap is an API policy applied here; the paginator itself accepts
/// any positive limit.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Opaque cursor token from a previous response's `nextToken`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,

    /// Requested page size. None defaults to [`DEFAULT_LIMIT`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Create a new empty query
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cursor token
    #[must_use]
    pub fn with_after(mut self, token: impl Into<String>) -> Self {
        self.after = Some(token.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Page size with the built-in defaults, clamped to `1..=MAX_LIMIT`
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit_within(DEFAULT_LIMIT, MAX_LIMIT)
    }

    /// Page size with a configured default and cap
    #[must_use]
    pub fn limit_for(&self, config: &PaginationConfig) -> u32 {
        self.limit_within(config.default_limit, config.max_limit)
    }

    fn limit_within(&self, default: u32, max: u32) -> u32 {
        let max = max.max(1);
        self.limit.unwrap_or(default).clamp(1, max)
    }

    /// Decode the `after` token against `spec`
    ///
    /// An absent or blank token means the first page.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCursor`](crate::error::Error::InvalidCursor) when the
    /// token is malformed or was issued for another sort spec.
    pub fn cursor(&self, spec: &SortSpec) -> Result<Option<Cursor>> {
        match self.after.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(token) => Cursor::decode(spec, token).map(Some),
        }
    }

    /// Build a [`PageRequest`] with the built-in limit policy
    pub fn to_request(&self, spec: &SortSpec, filters: Vec<FilterCondition>) -> Result<PageRequest> {
        Ok(PageRequest::first(self.limit())
            .after_opt(self.cursor(spec)?)
            .with_filters(filters))
    }

    /// Build a [`PageRequest`] with a configured limit policy
    pub fn to_request_for(
        &self,
        config: &PaginationConfig,
        spec: &SortSpec,
        filters: Vec<FilterCondition>,
    ) -> Result<PageRequest> {
        Ok(PageRequest::first(self.limit_for(config))
            .after_opt(self.cursor(spec)?)
            .with_filters(filters))
    }
}

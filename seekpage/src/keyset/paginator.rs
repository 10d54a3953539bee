//! The cursor paginator
//!
//! [`CursorPaginator`] turns `(sort spec, after cursor, limit, filters)` into a
//! bounded, ordered query and repackages the rows as a [`Page`]. It never
//! scans or counts skipped rows: every call seeks directly to the cursor.
//!
//! # Example
//!
//! ```rust
//! use seekpage::keyset::{CursorPaginator, MemoryExecutor, PageRequest, SortSpec};
//! use std::collections::HashMap;
//! use seekpage::keyset::FilterValue;
//!
//! # tokio_test_block(async {
//! let rows: Vec<HashMap<String, FilterValue>> = (1..=5_i64)
//!     .map(|id| HashMap::from([("id".to_string(), FilterValue::Integer(id))]))
//!     .collect();
//! let executor = MemoryExecutor::new(rows);
//! let paginator = CursorPaginator::new(SortSpec::parse("id:desc").unwrap());
//!
//! let first = paginator.paginate(&executor, PageRequest::first(2)).await.unwrap();
//! assert_eq!(first.items.len(), 2);
//! assert!(first.has_more);
//!
//! let second = paginator
//!     .paginate(&executor, PageRequest::first(2).after(first.next_cursor.unwrap()))
//!     .await
//!     .unwrap();
//! assert_eq!(second.remaining, Some(1));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::cursor::Cursor;
use super::filter::FilterCondition;
use super::seek::{LexicographicSeek, SeekConditionBuilder};
use super::sort::SortSpec;
use super::traits::QueryExecutor;
use crate::error::{Error, Result};

/// Whether the paginator runs count queries for `total` and `remaining`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalsMode {
    /// Count every call; `total` and `remaining` are always present
    #[default]
    Exact,
    /// Only run the seek query; `total` and `remaining` are `None`
    Skip,
}

/// One page request
///
/// # Example
///
/// ```rust
/// use seekpage::keyset::{FilterCondition, PageRequest};
///
/// let request = PageRequest::first(20).with_filter(FilterCondition::is_null("deleted_at"));
/// assert!(request.after.is_none());
/// assert_eq!(request.limit, 20);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Cursor of the last row already seen; `None` for the first page
    pub after: Option<Cursor>,
    /// Maximum number of items to return; must be positive
    pub limit: u32,
    /// Caller predicate, ANDed with the seek condition
    pub filters: Vec<FilterCondition>,
}

impl PageRequest {
    /// Request the first page
    pub fn first(limit: u32) -> Self {
        Self {
            after: None,
            limit,
            filters: Vec::new(),
        }
    }

    /// Continue after `cursor`
    #[must_use]
    pub fn after(mut self, cursor: Cursor) -> Self {
        self.after = Some(cursor);
        self
    }

    /// Continue after `cursor` when present
    #[must_use]
    pub fn after_opt(mut self, cursor: Option<Cursor>) -> Self {
        self.after = cursor;
        self
    }

    /// Add a filter condition
    #[must_use]
    pub fn with_filter(mut self, filter: FilterCondition) -> Self {
        self.filters.push(filter);
        self
    }

    /// Replace all filter conditions
    #[must_use]
    pub fn with_filters(mut self, filters: Vec<FilterCondition>) -> Self {
        self.filters = filters;
        self
    }
}

/// One page of results
///
/// `next_cursor` is `Some` exactly when `has_more` is true.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items in sort order
    pub items: Vec<T>,
    /// Cursor of the last item, when more items follow
    pub next_cursor: Option<Cursor>,
    /// Whether a following page exists
    pub has_more: bool,
    /// Rows matching the filters, regardless of position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Rows matching the filters that sort after this page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}

impl<T> Page<T> {
    /// Convert items without touching the pagination metadata
    ///
    /// This is where an entity mapper plugs in.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
            total: self.total,
            remaining: self.remaining,
        }
    }

    /// Whether this is the final page
    pub fn is_last(&self) -> bool {
        !self.has_more
    }
}

/// Keyset paginator for one sort spec
///
/// Stateless between calls: all position state lives in the caller-held
/// cursor, so one paginator can serve concurrent requests.
#[derive(Clone)]
pub struct CursorPaginator {
    spec: SortSpec,
    builder: Option<Arc<dyn SeekConditionBuilder>>,
    totals: TotalsMode,
}

impl fmt::Debug for CursorPaginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorPaginator")
            .field("spec", &self.spec)
            .field("custom_condition", &self.builder.is_some())
            .field("totals", &self.totals)
            .finish()
    }
}

impl CursorPaginator {
    /// Create a paginator with the lexicographic seek condition and exact totals
    pub fn new(spec: SortSpec) -> Self {
        Self {
            spec,
            builder: None,
            totals: TotalsMode::default(),
        }
    }

    /// Replace seek-condition construction
    ///
    /// See [`SeekConditionBuilder`] for the contract the builder must honor.
    #[must_use]
    pub fn with_condition_builder<B>(mut self, builder: B) -> Self
    where
        B: SeekConditionBuilder + 'static,
    {
        self.builder = Some(Arc::new(builder));
        self
    }

    /// Choose whether to run count queries
    #[must_use]
    pub fn with_totals(mut self, totals: TotalsMode) -> Self {
        self.totals = totals;
        self
    }

    /// The sort spec this paginator orders by
    pub fn spec(&self) -> &SortSpec {
        &self.spec
    }

    /// Whether count queries run
    pub fn totals(&self) -> TotalsMode {
        self.totals
    }

    /// Decode an opaque cursor token against this paginator's spec
    pub fn decode_cursor(&self, token: &str) -> Result<Cursor> {
        Cursor::decode(&self.spec, token)
    }

    /// Seek condition for rows strictly after `cursor`
    fn seek(&self, cursor: &Cursor) -> Result<Condition> {
        match &self.builder {
            Some(builder) => builder.build(&self.spec, cursor),
            None => LexicographicSeek.build(&self.spec, cursor),
        }
    }

    /// Fetch one page
    ///
    /// Validation happens before any query is issued. The seek query and the
    /// count queries run concurrently; if any of them fails the whole call
    /// fails with that error, unchanged.
    ///
    /// `remaining` is exact: it is the number of rows matching the filters
    /// that sort strictly after the last item. On the first page this is
    /// derived from `total`; on later pages it costs one extra count of the
    /// rows after the incoming cursor.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] when `limit` is zero
    /// - [`Error::InvalidCursor`] when `after` does not match the sort spec,
    ///   or a fetched row does not expose a sort field
    /// - [`Error::DataAccess`] from the executor
    #[tracing::instrument(
        name = "paginate",
        skip_all,
        fields(
            limit = request.limit,
            has_cursor = request.after.is_some(),
            items = tracing::field::Empty,
            has_more = tracing::field::Empty,
        )
    )]
    pub async fn paginate<E>(&self, executor: &E, request: PageRequest) -> Result<Page<E::Row>>
    where
        E: QueryExecutor,
    {
        let PageRequest {
            after,
            limit,
            filters,
        } = request;

        if limit == 0 {
            return Err(Error::invalid_argument("limit must be a positive integer"));
        }
        if let Some(cursor) = &after {
            cursor.validate(&self.spec)?;
        }

        let filter_condition = Condition::all(&filters);
        let seek = match &after {
            Some(cursor) => self.seek(cursor)?,
            None => Condition::True,
        };
        let page_condition = filter_condition.clone().and(seek);
        let fetch_limit = u64::from(limit) + 1;

        tracing::debug!(
            condition = %page_condition,
            order = %self.spec.to_order_clause(),
            "Fetching page"
        );

        let fetch = executor.fetch(&page_condition, &self.spec, fetch_limit);
        let (mut rows, total, after_count) = match (self.totals, after.is_some()) {
            (TotalsMode::Skip, _) => (fetch.await?, None, None),
            (TotalsMode::Exact, false) => {
                let (rows, total) = futures::try_join!(fetch, executor.count(&filter_condition))?;
                (rows, Some(total), Some(total))
            }
            (TotalsMode::Exact, true) => {
                let (rows, total, after_count) = futures::try_join!(
                    fetch,
                    executor.count(&filter_condition),
                    executor.count(&page_condition)
                )?;
                (rows, Some(total), Some(after_count))
            }
        };

        let has_more = rows.len() as u64 > u64::from(limit);
        rows.truncate(limit as usize);

        let next_cursor = match rows.last() {
            Some(last) if has_more => Some(Cursor::from_record(&self.spec, last)?),
            _ => None,
        };

        let remaining = after_count.map(|count| {
            if has_more {
                count.saturating_sub(rows.len() as u64)
            } else {
                0
            }
        });

        let span = tracing::Span::current();
        span.record("items", rows.len());
        span.record("has_more", has_more);
        tracing::debug!(total = ?total, remaining = ?remaining, "Page fetched");

        Ok(Page {
            items: rows,
            next_cursor,
            has_more,
            total,
            remaining,
        })
    }

    /// Positional form of [`CursorPaginator::paginate`]
    pub async fn paginate_with<E>(
        &self,
        executor: &E,
        after: Option<Cursor>,
        limit: u32,
        filters: Vec<FilterCondition>,
    ) -> Result<Page<E::Row>>
    where
        E: QueryExecutor,
    {
        let request = PageRequest {
            after,
            limit,
            filters,
        };
        self.paginate(executor, request).await
    }

    /// Follow cursors from `request` until the last page, collecting every item
    ///
    /// Each page is fetched with `request.limit`; counts are skipped.
    pub async fn collect_all<E>(&self, executor: &E, request: PageRequest) -> Result<Vec<E::Row>>
    where
        E: QueryExecutor,
    {
        let paginator = self.clone().with_totals(TotalsMode::Skip);
        let mut request = request;
        let mut items = Vec::new();

        loop {
            let page = paginator.paginate(executor, request.clone()).await?;
            items.extend(page.items);
            match page.next_cursor {
                Some(cursor) => request.after = Some(cursor),
                None => return Ok(items),
            }
        }
    }
}

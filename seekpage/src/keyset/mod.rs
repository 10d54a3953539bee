//! Keyset (seek) pagination
//!
//! Offset pagination (`LIMIT n OFFSET k`) makes the database walk and discard
//! `k` rows, and shifts results when rows are inserted or deleted between
//! requests. Keyset pagination instead remembers the sort-key values of the
//! last row returned (the cursor) and asks for rows that sort strictly after
//! them. With an index on the sort fields every page costs the same.
//!
//! # Overview
//!
//! - [`SortSpec`]: ordered list of [`SortField`]s, last field unique
//! - [`Cursor`]: the sort-key values of the last row of a page
//! - [`seek_condition`]: builds the "strictly after" predicate
//! - [`CursorPaginator`]: runs the page query and the counts, builds [`Page`]s
//! - [`QueryExecutor`]: the storage seam; see [`MemoryExecutor`] and, with the
//!   `postgres` feature, [`PgExecutor`](crate::postgres::PgExecutor)
//!
//! # Example
//!
//! ```rust
//! use seekpage::keyset::{
//!     CursorPaginator, FieldType, FilterCondition, FilterValue, MemoryExecutor, PageRequest,
//!     SortField, SortSpec,
//! };
//! use std::collections::HashMap;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let rows: Vec<HashMap<String, FilterValue>> = (1..=10_i64)
//!     .map(|id| {
//!         HashMap::from([
//!             ("id".to_string(), FilterValue::Integer(id)),
//!             ("status".to_string(), FilterValue::from(if id % 2 == 0 { "active" } else { "idle" })),
//!         ])
//!     })
//!     .collect();
//! let executor = MemoryExecutor::new(rows);
//!
//! let spec = SortSpec::new(vec![SortField::desc("id", FieldType::Number).unique()]).unwrap();
//! let paginator = CursorPaginator::new(spec);
//!
//! let request = PageRequest::first(3).with_filter(FilterCondition::eq("status", "active"));
//! let page = paginator.paginate(&executor, request).await.unwrap();
//!
//! assert_eq!(page.items.len(), 3);
//! assert_eq!(page.total, Some(5));
//! assert_eq!(page.remaining, Some(2));
//! # });
//! ```

mod condition;
mod cursor;
mod filter;
mod memory;
mod paginator;
mod seek;
mod sort;
mod traits;

pub use condition::Condition;
pub use cursor::{Cursor, CursorValue};
pub use filter::{FilterCondition, FilterOperator, FilterValue};
pub use memory::MemoryExecutor;
pub use paginator::{CursorPaginator, Page, PageRequest, TotalsMode};
pub use seek::{seek_condition, LexicographicSeek, SeekConditionBuilder};
pub use sort::{FieldType, SortDirection, SortField, SortSpec};
pub use traits::{QueryExecutor, Record};

#[cfg(feature = "postgres")]
pub(crate) use sort::validate_column;

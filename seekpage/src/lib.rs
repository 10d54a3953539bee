//! # seekpage
//!
//! Keyset (seek) pagination for SQL-backed services.
//!
//! Pages are addressed by the sort-key values of the last row already seen,
//! never by an offset, so deep pages cost the same as the first one and rows
//! inserted or deleted between requests never shift the results.
//!
//! ## Features
//!
//! - **Multi-field sort specs**: mixed ASC/DESC, typed fields, unique tie-break
//! - **Cursors**: plain JSON objects or opaque URL-safe tokens, validated
//!   against the sort spec before any query runs
//! - **Exact totals**: `total` and `remaining`, counted concurrently with the
//!   page query (or skipped entirely)
//! - **PostgreSQL executor** (`postgres` feature): bound parameters via sqlx
//! - **HTTP wire types** (`http` feature): `?after=&limit=` extraction and an
//!   axum `IntoResponse` page body
//!
//! ## Example
//!
//! ```rust,no_run
//! use seekpage::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let db = config
//!         .database
//!         .as_ref()
//!         .ok_or_else(|| Error::invalid_argument("no [database] section"))?;
//!     let pool = create_pool(db).await?;
//!
//!     let spec = SortSpec::parse("updated_at:desc:date,id:desc")?;
//!     let executor = PgExecutor::new(pool, "projects", &spec)?;
//!     let paginator = config.pagination.paginator(spec);
//!
//!     let mut request = PageRequest::first(config.pagination.default_limit);
//!     loop {
//!         let page = paginator.paginate(&executor, request.clone()).await?;
//!         for item in &page.items {
//!             println!("{}", serde_json::to_string(item).unwrap_or_default());
//!         }
//!         match page.next_cursor {
//!             Some(cursor) => request = request.after(cursor),
//!             None => break,
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod keyset;
pub mod observability;

#[cfg(feature = "postgres")]
pub mod database;
#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "http")]
pub mod handlers;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, LogFormat, PaginationConfig};
    pub use crate::error::{
        DatabaseError, DatabaseErrorKind, DatabaseOperation, Error, ErrorResponse, Result,
    };
    pub use crate::keyset::{
        seek_condition, Condition, Cursor, CursorPaginator, CursorValue, FieldType,
        FilterCondition, FilterOperator, FilterValue, MemoryExecutor, Page, PageRequest,
        QueryExecutor, Record, SeekConditionBuilder, SortDirection, SortField, SortSpec,
        TotalsMode,
    };
    pub use crate::observability::init_tracing;

    #[cfg(feature = "postgres")]
    pub use crate::database::create_pool;
    #[cfg(feature = "postgres")]
    pub use crate::postgres::{JsonRecord, PgExecutor};

    #[cfg(feature = "http")]
    pub use crate::handlers::{PageQuery, PageResponse};

    pub use tracing::{debug, error, info, instrument, trace, warn};
}

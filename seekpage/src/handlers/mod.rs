//! HTTP wire types for paginated endpoints
//!
//! [`PageQuery`] extracts `?after=<token>&limit=<n>`; [`PageResponse`] renders
//! a [`Page`](crate::keyset::Page) as JSON. Errors render through
//! [`Error`](crate::error::Error)'s own `IntoResponse`.
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::extract::{Query, State};
//! use seekpage::handlers::{PageQuery, PageResponse};
//! use seekpage::keyset::CursorPaginator;
//! use seekpage::postgres::{JsonRecord, PgExecutor};
//!
//! async fn list_projects(
//!     State(state): State<AppState>,
//!     Query(query): Query<PageQuery>,
//! ) -> seekpage::Result<PageResponse<JsonRecord>> {
//!     let request = query.to_request(state.paginator.spec(), vec![])?;
//!     let page = state.paginator.paginate(&state.executor, request).await?;
//!     Ok(page.into())
//! }
//! ```

mod query;
mod response;

pub use query::{PageQuery, DEFAULT_LIMIT, MAX_LIMIT};
pub use response::PageResponse;

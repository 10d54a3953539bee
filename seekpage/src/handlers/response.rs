//! Response type for paginated endpoints
//!
//! # Example
//!
//! ```rust
//! use seekpage::handlers::PageResponse;
//! use seekpage::keyset::Page;
//!
//! let page = Page {
//!     items: vec![1, 2, 3],
//!     next_cursor: None,
//!     has_more: false,
//!     total: Some(3),
//!     remaining: Some(0),
//! };
//! let response = PageResponse::from(page);
//! assert!(response.next_token.is_none());
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::keyset::{Cursor, Page};

/// JSON body for one page
///
/// Carries the cursor both as the plain object (`nextCursor`) and as the
/// opaque token clients pass back in `?after=` (`nextToken`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// Items in sort order
    pub items: Vec<T>,
    /// Cursor of the last item, when more items follow
    pub next_cursor: Option<Cursor>,
    /// Encoded form of `next_cursor`
    pub next_token: Option<String>,
    /// Whether a following page exists
    pub has_more: bool,
    /// Rows matching the filters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Rows after this page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            items: page.items,
            next_token: page.next_cursor.as_ref().map(Cursor::encode),
            next_cursor: page.next_cursor,
            has_more: page.has_more,
            total: page.total,
            remaining: page.remaining,
        }
    }
}

impl<T> PageResponse<T> {
    /// Map each item to a new type
    pub fn map<U, F>(self, f: F) -> PageResponse<U>
    where
        F: FnMut(T) -> U,
    {
        PageResponse {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            next_token: self.next_token,
            has_more: self.has_more,
            total: self.total,
            remaining: self.remaining,
        }
    }
}

impl<T: Serialize> IntoResponse for PageResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DatabaseError, DatabaseOperation, Error};
    use crate::keyset::SortSpec;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn page_with_cursor() -> Page<&'static str> {
        let spec = SortSpec::parse("id:desc").unwrap();
        Page {
            items: vec!["a", "b"],
            next_cursor: Some(Cursor::from_json(&spec, &json!({"id": 4})).unwrap()),
            has_more: true,
            total: Some(5),
            remaining: Some(3),
        }
    }

    #[test]
    fn test_token_matches_cursor() {
        let response = PageResponse::from(page_with_cursor());
        let spec = SortSpec::parse("id:desc").unwrap();
        let decoded = Cursor::decode(&spec, response.next_token.as_deref().unwrap()).unwrap();
        assert_eq!(Some(decoded), response.next_cursor);
    }

    #[tokio::test]
    async fn test_into_response() {
        let response = PageResponse::from(page_with_cursor()).into_response();
        let (status, body) = body_json(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], json!(["a", "b"]));
        assert_eq!(body["nextCursor"], json!({"id": 4}));
        assert_eq!(body["hasMore"], json!(true));
        assert_eq!(body["total"], json!(5));
        assert_eq!(body["remaining"], json!(3));
        assert!(body["nextToken"].is_string());
    }

    #[tokio::test]
    async fn test_totals_omitted_when_skipped() {
        let page: Page<u32> = Page {
            items: vec![],
            next_cursor: None,
            has_more: false,
            total: None,
            remaining: None,
        };
        let (_, body) = body_json(PageResponse::from(page).into_response()).await;
        assert_eq!(
            body,
            json!({"items": [], "nextCursor": null, "nextToken": null, "hasMore": false})
        );
    }

    #[tokio::test]
    async fn test_error_responses() {
        let (status, body) = body_json(Error::invalid_cursor("missing key 'id'").into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_CURSOR");

        let (status, body) = body_json(Error::invalid_argument("limit").into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ARGUMENT");

        let timeout = DatabaseError::timeout(DatabaseOperation::Fetch, "canceling statement");
        let (status, body) = body_json(Error::from(timeout).into_response()).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"], "Database operation timed out");
    }
}

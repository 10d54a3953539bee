//! Executor and row traits
//!
//! The paginator builds a [`Condition`] and an ordering; a [`QueryExecutor`]
//! runs them against whatever store holds the rows. Traits use RPITIT
//! (Return Position Impl Trait In Traits) for async methods.
//!
//! # Example
//!
//! ```rust,ignore
//! use seekpage::keyset::{Condition, QueryExecutor, SortSpec};
//!
//! struct ProjectStore { pool: PgPool }
//!
//! impl QueryExecutor for ProjectStore {
//!     type Row = Project;
//!
//!     async fn fetch(&self, condition: &Condition, order: &SortSpec, limit: u64)
//!         -> Result<Vec<Project>>
//!     {
//!         // render `condition` and `order`, run the query
//!         todo!()
//!     }
//!
//!     async fn count(&self, condition: &Condition) -> Result<u64> {
//!         todo!()
//!     }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use super::condition::Condition;
use super::filter::FilterValue;
use super::sort::SortSpec;
use crate::error::Result;

/// A row that exposes its values by public field name
///
/// Used to project the next cursor from the last row of a page and by the
/// in-memory executor to evaluate conditions.
pub trait Record {
    /// Value of `name`, or `None` when the row has no such field
    fn field(&self, name: &str) -> Option<FilterValue>;
}

impl Record for HashMap<String, FilterValue> {
    fn field(&self, name: &str) -> Option<FilterValue> {
        self.get(name).cloned()
    }
}

impl Record for BTreeMap<String, FilterValue> {
    fn field(&self, name: &str) -> Option<FilterValue> {
        self.get(name).cloned()
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Option<FilterValue> {
        (**self).field(name)
    }
}

/// Runs bounded, ordered queries on behalf of the paginator
///
/// Implementations must honor the contract exactly: `fetch` returns only rows
/// matching `condition`, ordered by every field of `order` in turn, and at
/// most `limit` of them. Failures are reported as
/// [`Error::DataAccess`](crate::error::Error::DataAccess); the paginator
/// passes them through unchanged and never retries.
pub trait QueryExecutor: Send + Sync {
    /// Row type produced by this executor
    type Row: Record + Send;

    /// Fetch at most `limit` rows matching `condition`, ordered by `order`
    fn fetch(
        &self,
        condition: &Condition,
        order: &SortSpec,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<Self::Row>>> + Send;

    /// Count rows matching `condition`
    fn count(&self, condition: &Condition) -> impl Future<Output = Result<u64>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_records() {
        let mut hash = HashMap::new();
        hash.insert("id".to_string(), FilterValue::Integer(1));
        assert_eq!(hash.field("id"), Some(FilterValue::Integer(1)));
        assert_eq!(hash.field("missing"), None);

        let mut tree = BTreeMap::new();
        tree.insert("name".to_string(), FilterValue::from("a"));
        assert_eq!((&tree).field("name"), Some(FilterValue::from("a")));
    }
}

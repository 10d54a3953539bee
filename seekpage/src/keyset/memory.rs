//! In-memory query executor
//!
//! Evaluates conditions and orderings over a `Vec` of rows. Useful for tests
//! and for paging through data that is already loaded.

use std::cmp::Ordering;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::condition::Condition;
use super::cursor::CursorValue;
use super::sort::{SortDirection, SortSpec};
use super::traits::{QueryExecutor, Record};
use crate::error::Result;

/// A [`QueryExecutor`] over rows held in memory
///
/// Rows are shared behind a lock so the executor can be cloned into
/// concurrent tasks while new rows are still being pushed.
#[derive(Debug, Clone)]
pub struct MemoryExecutor<T> {
    rows: Arc<RwLock<Vec<T>>>,
}

impl<T> Default for MemoryExecutor<T> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<T> MemoryExecutor<T>
where
    T: Record + Clone + Send + Sync,
{
    /// Create an executor over `rows`
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    /// Append a row
    pub async fn push(&self, row: T) {
        self.rows.write().await.push(row);
    }

    /// Number of rows held, ignoring any condition
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether no rows are held
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

/// Compare two rows field by field under `order`
///
/// Missing or mistyped values sort first, as NULLs do under `ASC NULLS FIRST`.
fn compare_rows<T: Record>(order: &SortSpec, a: &T, b: &T) -> Ordering {
    for field in order.fields() {
        let left = a
            .field(&field.name)
            .and_then(|v| CursorValue::from_filter_value(field.field_type, &v));
        let right = b
            .field(&field.name)
            .and_then(|v| CursorValue::from_filter_value(field.field_type, &v));

        let ordering = match (left, right) {
            (Some(l), Some(r)) => l.cmp_value(&r),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = match field.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

impl<T> QueryExecutor for MemoryExecutor<T>
where
    T: Record + Clone + Send + Sync,
{
    type Row = T;

    async fn fetch(&self, condition: &Condition, order: &SortSpec, limit: u64) -> Result<Vec<T>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<T> = rows
            .iter()
            .filter(|row| condition.matches(*row))
            .cloned()
            .collect();
        matched.sort_by(|a, b| compare_rows(order, a, b));
        matched.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(matched)
    }

    async fn count(&self, condition: &Condition) -> Result<u64> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|row| condition.matches(*row)).count() as u64)
    }
}

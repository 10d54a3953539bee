//! Seek condition construction
//!
//! For a sort spec `f1..fn` with directions `d1..dn` and cursor values
//! `v1..vn`, the rows strictly after the cursor are
//!
//! ```text
//! (f1 ≻ v1)
//!   OR (f1 = v1 AND f2 ≻ v2)
//!   OR ...
//!   OR (f1 = v1 AND ... AND fn-1 = vn-1 AND fn ≻ vn)
//! ```
//!
//! where `≻` is `>` for ascending fields and `<` for descending ones. With an
//! index matching the sort fields this runs in O(log n + limit) no matter how deep
//! the page is.

use super::condition::Condition;
use super::cursor::{Cursor, CursorValue};
use super::filter::{FilterCondition, FilterOperator, FilterValue};
use super::sort::{SortDirection, SortField, SortSpec};
use crate::error::Result;

fn equal(field: &SortField, value: &CursorValue) -> Condition {
    FilterCondition::new(&field.name, FilterOperator::Equal, FilterValue::from(value)).into()
}

fn strictly_after(field: &SortField, value: &CursorValue) -> Condition {
    let operator = match field.direction {
        SortDirection::Ascending => FilterOperator::GreaterThan,
        SortDirection::Descending => FilterOperator::LessThan,
    };
    FilterCondition::new(&field.name, operator, FilterValue::from(value)).into()
}

/// Build the lexicographic "strictly after `cursor`" condition
///
/// `cursor` must already be validated against `spec`
/// (see [`Cursor::validate`]).
///
/// # Example
///
/// ```rust
/// use seekpage::keyset::{seek_condition, Cursor, SortSpec};
///
/// let spec = SortSpec::parse("updatedAt:desc:date,id:desc").unwrap();
/// let cursor = Cursor::from_json(
///     &spec,
///     &serde_json::json!({"updatedAt": "2025-04-08T05:54:45.000Z", "id": 42}),
/// )
/// .unwrap();
///
/// let condition = seek_condition(&spec, &cursor);
/// assert_eq!(
///     condition.to_string(),
///     "(updatedAt < '2025-04-08T05:54:45+00:00' OR \
///      (updatedAt = '2025-04-08T05:54:45+00:00' AND id < 42))"
/// );
/// ```
pub fn seek_condition(spec: &SortSpec, cursor: &Cursor) -> Condition {
    let pairs: Vec<(&SortField, &CursorValue)> = spec
        .fields()
        .iter()
        .zip(cursor.entries().iter().map(|(_, v)| v))
        .collect();

    let branches = (0..pairs.len())
        .map(|i| {
            let mut terms: Vec<Condition> = pairs[..i]
                .iter()
                .map(|(field, value)| equal(field, value))
                .collect();
            let (field, value) = pairs[i];
            terms.push(strictly_after(field, value));

            if terms.len() == 1 {
                terms.remove(0)
            } else {
                Condition::And(terms)
            }
        })
        .collect();

    Condition::any(branches)
}

/// Replacement for the default seek condition
///
/// Use this when sort fields do not map one-to-one onto filterable columns
/// (joined tables, computed expressions). The paginator still owns the
/// ordering, the `limit + 1` fetch, the cursor and the counts.
///
/// # Contract
///
/// The returned condition must select exactly the rows that sort strictly
/// after `cursor` under `spec`. A condition that admits a row at or before
/// the cursor repeats rows across pages; one that excludes a row after it
/// skips rows. Either breaks the guarantee that following `next_cursor`
/// until `has_more == false` visits every matching row once.
///
/// Closures with the matching signature implement this trait:
///
/// ```rust
/// use seekpage::keyset::{seek_condition, Condition, Cursor, SortSpec};
/// use seekpage::error::Result;
///
/// let builder = |spec: &SortSpec, cursor: &Cursor| -> Result<Condition> {
///     Ok(seek_condition(spec, cursor))
/// };
/// # let _ = builder;
/// ```
pub trait SeekConditionBuilder: Send + Sync {
    /// Build the condition for rows strictly after `cursor`
    fn build(&self, spec: &SortSpec, cursor: &Cursor) -> Result<Condition>;
}

impl<F> SeekConditionBuilder for F
where
    F: Fn(&SortSpec, &Cursor) -> Result<Condition> + Send + Sync,
{
    fn build(&self, spec: &SortSpec, cursor: &Cursor) -> Result<Condition> {
        self(spec, cursor)
    }
}

/// The standard lexicographic builder, [`seek_condition`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicSeek;

impl SeekConditionBuilder for LexicographicSeek {
    fn build(&self, spec: &SortSpec, cursor: &Cursor) -> Result<Condition> {
        Ok(seek_condition(spec, cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn row(updated: &str, id: i64) -> HashMap<String, FilterValue> {
        let mut map = HashMap::new();
        map.insert("updatedAt".to_string(), FilterValue::from(updated));
        map.insert("id".to_string(), FilterValue::Integer(id));
        map
    }

    #[test]
    fn test_single_field_ascending() {
        let spec = SortSpec::parse("id:asc").unwrap();
        let cursor = Cursor::from_json(&spec, &json!({"id": 10})).unwrap();
        assert_eq!(
            seek_condition(&spec, &cursor),
            Condition::Compare(FilterCondition::gt("id", 10_i64))
        );
    }

    #[test]
    fn test_three_fields_mixed_directions() {
        let spec = SortSpec::parse("rank:asc,title:desc:string,id:asc").unwrap();
        let cursor =
            Cursor::from_json(&spec, &json!({"rank": 2, "title": "m", "id": 5})).unwrap();

        assert_eq!(
            seek_condition(&spec, &cursor).to_string(),
            "(rank > 2 OR (rank = 2 AND title < 'm') OR (rank = 2 AND title = 'm' AND id > 5))"
        );
    }

    #[test]
    fn test_condition_selects_rows_strictly_after() {
        let spec = SortSpec::parse("updatedAt:desc:date,id:desc").unwrap();
        let cursor = Cursor::from_json(
            &spec,
            &json!({"updatedAt": "2025-01-02T00:00:00Z", "id": 5}),
        )
        .unwrap();
        let cond = seek_condition(&spec, &cursor);

        // Earlier timestamp sorts after under DESC
        assert!(cond.matches(&row("2025-01-01T00:00:00Z", 99)));
        // Same timestamp, smaller id sorts after under DESC
        assert!(cond.matches(&row("2025-01-02T00:00:00Z", 3)));
        // The cursor row itself is excluded
        assert!(!cond.matches(&row("2025-01-02T00:00:00Z", 5)));
        // Same timestamp, larger id sorts before
        assert!(!cond.matches(&row("2025-01-02T00:00:00Z", 7)));
        // Later timestamp sorts before
        assert!(!cond.matches(&row("2025-01-03T00:00:00Z", 1)));
    }

    #[test]
    fn test_closure_builder() {
        let spec = SortSpec::parse("id:asc").unwrap();
        let cursor = Cursor::from_json(&spec, &json!({"id": 1})).unwrap();
        let builder = |_: &SortSpec, c: &Cursor| -> Result<Condition> {
            Ok(FilterCondition::gt("projects.id", FilterValue::from(c.get("id").unwrap())).into())
        };
        let cond = builder.build(&spec, &cursor).unwrap();
        assert_eq!(cond.to_string(), "projects.id > 1");
        assert_eq!(
            LexicographicSeek.build(&spec, &cursor).unwrap(),
            seek_condition(&spec, &cursor)
        );
    }
}

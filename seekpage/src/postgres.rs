//! PostgreSQL query executor
//!
//! [`PgExecutor`] renders a [`Condition`] and a [`SortSpec`] into one bounded
//! statement per call. Every value goes through a bind parameter; column
//! names are checked to be plain identifiers before they reach the SQL text.
//!
//! Rows come back as [`JsonRecord`]s (`to_jsonb` of the source row), so any
//! table or view can be paged without a dedicated row type.
//!
//! # Example
//!
//! ```rust,no_run
//! use seekpage::keyset::{CursorPaginator, PageRequest, SortSpec};
//! use seekpage::postgres::PgExecutor;
//!
//! # async fn run(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let spec = SortSpec::parse("updatedAt:desc:date,id:desc")?;
//! let executor = PgExecutor::new(pool, "projects", &spec)?
//!     .with_column("updatedAt", "updated_at");
//!
//! let paginator = CursorPaginator::new(spec);
//! let page = paginator.paginate(&executor, PageRequest::first(20)).await?;
//! println!("{}", serde_json::to_string(&page)?);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::{DatabaseError, DatabaseOperation, Error, Result};
use crate::keyset::{
    validate_column, Condition, FilterCondition, FilterOperator, FilterValue, QueryExecutor,
    Record, SortSpec,
};

/// Row returned by [`PgExecutor`]: the source row as a JSON object
///
/// Serializes as the bare object.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord {
    value: Map<String, Value>,
    columns: Arc<HashMap<String, String>>,
}

impl JsonRecord {
    /// The row's columns
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.value
    }

    /// Consume into the JSON object
    pub fn into_value(self) -> Value {
        Value::Object(self.value)
    }

    fn column_key<'a>(&'a self, name: &'a str) -> &'a str {
        let column = self.columns.get(name).map(String::as_str).unwrap_or(name);
        column.rsplit('.').next().unwrap_or(column)
    }
}

impl Record for JsonRecord {
    fn field(&self, name: &str) -> Option<FilterValue> {
        match self.value.get(self.column_key(name))? {
            Value::Null => Some(FilterValue::Null),
            Value::Bool(b) => Some(FilterValue::Boolean(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(FilterValue::Integer)
                .or_else(|| n.as_f64().map(FilterValue::Float)),
            Value::String(s) => Some(FilterValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl Serialize for JsonRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

const ROW_ALIAS: &str = "t";

/// Renders conditions and orderings against one source relation
#[derive(Debug, Clone)]
struct PgSource {
    relation: String,
    columns: Arc<HashMap<String, String>>,
}

impl PgSource {
    /// SQL column for a public field name
    ///
    /// Rows are selected as `FROM <relation> t`, so a column may only be
    /// qualified with that alias.
    fn column<'a>(&'a self, field: &'a str) -> Result<&'a str> {
        let column = self.columns.get(field).map(String::as_str).unwrap_or(field);
        validate_column(column)?;
        match column.split_once('.') {
            None => Ok(column),
            Some((ROW_ALIAS, rest)) if !rest.contains('.') => Ok(column),
            Some(_) => Err(Error::invalid_argument(format!(
                "column '{}' must be unqualified or qualified with the row alias '{}'",
                column, ROW_ALIAS
            ))),
        }
    }

    fn render_fetch(
        &self,
        condition: &Condition,
        order: &SortSpec,
        limit: u64,
    ) -> Result<QueryBuilder<'static, Postgres>> {
        let mut qb = QueryBuilder::new("SELECT to_jsonb(t) AS record FROM ");
        qb.push(&self.relation).push(" t WHERE ");
        self.push_condition(&mut qb, condition)?;

        qb.push(" ORDER BY ");
        for (i, field) in order.fields().iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(self.column(&field.name)?)
                .push(" ")
                .push(field.direction.as_sql());
        }

        qb.push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        Ok(qb)
    }

    fn render_count(&self, condition: &Condition) -> Result<QueryBuilder<'static, Postgres>> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
        qb.push(&self.relation).push(" t WHERE ");
        self.push_condition(&mut qb, condition)?;
        Ok(qb)
    }

    fn push_condition(
        &self,
        qb: &mut QueryBuilder<'static, Postgres>,
        condition: &Condition,
    ) -> Result<()> {
        match condition {
            Condition::True => {
                qb.push("TRUE");
            }
            Condition::Compare(cond) => self.push_comparison(qb, cond)?,
            Condition::And(children) | Condition::Or(children) if children.is_empty() => {
                qb.push(if matches!(condition, Condition::And(_)) { "TRUE" } else { "FALSE" });
            }
            Condition::And(children) | Condition::Or(children) => {
                let joiner = if matches!(condition, Condition::And(_)) { " AND " } else { " OR " };
                qb.push("(");
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        qb.push(joiner);
                    }
                    self.push_condition(qb, child)?;
                }
                qb.push(")");
            }
        }
        Ok(())
    }

    fn push_comparison(
        &self,
        qb: &mut QueryBuilder<'static, Postgres>,
        cond: &FilterCondition,
    ) -> Result<()> {
        let column = self.column(&cond.field)?;

        match (cond.operator, &cond.value) {
            (FilterOperator::IsNull, _) | (FilterOperator::Equal, FilterValue::Null) => {
                qb.push(column).push(" IS NULL");
            }
            (FilterOperator::IsNotNull, _) | (FilterOperator::NotEqual, FilterValue::Null) => {
                qb.push(column).push(" IS NOT NULL");
            }
            // Ordering against NULL is never true
            (_, FilterValue::Null) => {
                qb.push("FALSE");
            }
            (FilterOperator::In, FilterValue::StringList(list)) => {
                qb.push(column).push(" = ANY(").push_bind(list.clone()).push(")");
            }
            (FilterOperator::In, FilterValue::IntegerList(list)) => {
                qb.push(column).push(" = ANY(").push_bind(list.clone()).push(")");
            }
            (FilterOperator::In, _) => {
                return Err(Error::invalid_argument(format!(
                    "IN on '{}' needs a list value",
                    cond.field
                )));
            }
            (FilterOperator::Like, FilterValue::String(pattern)) => {
                qb.push(column).push(" LIKE ").push_bind(pattern.clone());
            }
            (FilterOperator::Like, _) => {
                return Err(Error::invalid_argument(format!(
                    "LIKE on '{}' needs a string pattern",
                    cond.field
                )));
            }
            (operator, value) => {
                let sql_op = match operator {
                    FilterOperator::NotEqual => "<>".to_string(),
                    other => other.to_string(),
                };
                qb.push(column).push(" ").push(sql_op).push(" ");
                push_scalar(qb, &cond.field, value)?;
            }
        }
        Ok(())
    }
}

fn push_scalar(
    qb: &mut QueryBuilder<'static, Postgres>,
    field: &str,
    value: &FilterValue,
) -> Result<()> {
    match value {
        FilterValue::String(s) => {
            qb.push_bind(s.clone());
        }
        FilterValue::Integer(n) => {
            qb.push_bind(*n);
        }
        FilterValue::Float(n) => {
            qb.push_bind(*n);
        }
        FilterValue::Boolean(b) => {
            qb.push_bind(*b);
        }
        FilterValue::Timestamp(ts) => {
            qb.push_bind(*ts);
        }
        FilterValue::StringList(_) | FilterValue::IntegerList(_) | FilterValue::Null => {
            return Err(Error::invalid_argument(format!(
                "comparison on '{}' needs a scalar value",
                field
            )));
        }
    }
    Ok(())
}

/// Tag an executor error with the operation that raised it
///
/// Connection and pool errors keep their own operation.
fn query_error(operation: DatabaseOperation, err: sqlx::Error) -> Error {
    let err = DatabaseError::from(err);
    let err = if err.operation == DatabaseOperation::Fetch {
        err.with_operation(operation)
    } else {
        err
    };
    Error::DataAccess(err)
}

/// [`QueryExecutor`] over a PostgreSQL table or view
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
    source: PgSource,
}

impl PgExecutor {
    /// Page over `relation`, mapping each sort field of `spec` to its column
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `relation` is not a plain (optionally
    /// schema-qualified) identifier, or a sort column is qualified with
    /// anything but the row alias `t`.
    pub fn new(pool: PgPool, relation: impl Into<String>, spec: &SortSpec) -> Result<Self> {
        let relation = relation.into();
        validate_column(&relation)?;

        let columns = spec
            .fields()
            .iter()
            .map(|f| (f.name.clone(), f.column.clone()))
            .collect();

        let source = PgSource {
            relation,
            columns: Arc::new(columns),
        };
        for field in spec.fields() {
            source.column(&field.name)?;
        }

        Ok(Self { pool, source })
    }

    /// Map a filter or sort field name to a column
    ///
    /// Unmapped names are used as column names directly.
    #[must_use]
    pub fn with_column(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.source.columns).insert(field.into(), column.into());
        self
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl QueryExecutor for PgExecutor {
    type Row = JsonRecord;

    async fn fetch(
        &self,
        condition: &Condition,
        order: &SortSpec,
        limit: u64,
    ) -> Result<Vec<JsonRecord>> {
        let mut qb = self.source.render_fetch(condition, order, limit)?;
        tracing::debug!(sql = %qb.sql(), "Executing page query");

        let values: Vec<Value> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error(DatabaseOperation::Fetch, e))?;

        values
            .into_iter()
            .map(|value| match value {
                Value::Object(value) => Ok(JsonRecord {
                    value,
                    columns: Arc::clone(&self.source.columns),
                }),
                other => Err(DatabaseError::query_failed(
                    DatabaseOperation::Fetch,
                    format!("expected a JSON object row, got {}", other),
                )
                .into()),
            })
            .collect()
    }

    async fn count(&self, condition: &Condition) -> Result<u64> {
        let mut qb = self.source.render_count(condition)?;
        tracing::debug!(sql = %qb.sql(), "Executing count query");

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_error(DatabaseOperation::Count, e))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

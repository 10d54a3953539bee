//! Boolean condition trees
//!
//! [`Condition`] is the data form of a WHERE clause. The paginator composes
//! the caller's filters with the generated seek condition into one tree;
//! executors interpret it (the PostgreSQL executor renders it with bound
//! parameters, the in-memory executor evaluates it row by row).

use std::fmt;

use super::filter::{FilterCondition, FilterValue};
use super::traits::Record;

/// A WHERE clause as an expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Matches every row
    True,
    /// A single comparison
    Compare(FilterCondition),
    /// Every child must match; an empty list matches every row
    And(Vec<Condition>),
    /// At least one child must match; an empty list matches no row
    Or(Vec<Condition>),
}

impl Condition {
    /// AND together a list of filters (`True` when empty)
    ///
    /// # Example
    ///
    /// ```rust
    /// use seekpage::keyset::{Condition, FilterCondition};
    ///
    /// assert_eq!(Condition::all(&[]), Condition::True);
    ///
    /// let cond = Condition::all(&[FilterCondition::eq("status", "active")]);
    /// assert!(matches!(cond, Condition::Compare(_)));
    /// ```
    pub fn all(filters: &[FilterCondition]) -> Self {
        match filters {
            [] => Self::True,
            [single] => Self::Compare(single.clone()),
            many => Self::And(many.iter().cloned().map(Self::Compare).collect()),
        }
    }

    /// OR together a list of conditions
    pub fn any(conditions: Vec<Condition>) -> Self {
        if conditions.iter().any(Condition::is_true) {
            return Self::True;
        }
        match conditions.len() {
            1 => conditions.into_iter().next().unwrap_or(Self::True),
            _ => Self::Or(conditions),
        }
    }

    /// AND this condition with another, dropping `True` operands and
    /// flattening nested `And`s
    #[must_use]
    pub fn and(self, other: Condition) -> Self {
        match (self, other) {
            (Self::True, c) | (c, Self::True) => c,
            (Self::And(mut a), Self::And(b)) => {
                a.extend(b);
                Self::And(a)
            }
            (Self::And(mut a), c) => {
                a.push(c);
                Self::And(a)
            }
            (c, Self::And(mut b)) => {
                b.insert(0, c);
                Self::And(b)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Whether this is the identity condition
    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Evaluate against a row
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        match self {
            Self::True => true,
            Self::Compare(cond) => cond.test(record.field(&cond.field).as_ref()),
            Self::And(children) => children.iter().all(|c| c.matches(record)),
            Self::Or(children) => children.iter().any(|c| c.matches(record)),
        }
    }
}

impl From<FilterCondition> for Condition {
    fn from(cond: FilterCondition) -> Self {
        Self::Compare(cond)
    }
}

fn fmt_value(value: &FilterValue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        FilterValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        FilterValue::Integer(n) => write!(f, "{}", n),
        FilterValue::Float(n) => write!(f, "{}", n),
        FilterValue::Boolean(b) => write!(f, "{}", b),
        FilterValue::Timestamp(ts) => write!(f, "'{}'", ts.to_rfc3339()),
        FilterValue::StringList(list) => {
            let quoted: Vec<String> = list.iter().map(|s| format!("'{}'", s)).collect();
            write!(f, "({})", quoted.join(", "))
        }
        FilterValue::IntegerList(list) => {
            let items: Vec<String> = list.iter().map(i64::to_string).collect();
            write!(f, "({})", items.join(", "))
        }
        FilterValue::Null => write!(f, "NULL"),
    }
}

/// Human-readable rendering for logs; never sent to a database
impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "TRUE"),
            Self::Compare(cond) => match cond.operator {
                super::FilterOperator::IsNull | super::FilterOperator::IsNotNull => {
                    write!(f, "{} {}", cond.field, cond.operator)
                }
                _ => {
                    write!(f, "{} {} ", cond.field, cond.operator)?;
                    fmt_value(&cond.value, f)
                }
            },
            Self::And(children) | Self::Or(children) => {
                let joiner = if matches!(self, Self::And(_)) { " AND " } else { " OR " };
                if children.is_empty() {
                    return write!(f, "{}", if matches!(self, Self::And(_)) { "TRUE" } else { "FALSE" });
                }
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", joiner)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(status: &str, age: i64) -> HashMap<String, FilterValue> {
        let mut map = HashMap::new();
        map.insert("status".to_string(), status.into());
        map.insert("age".to_string(), age.into());
        map
    }

    #[test]
    fn test_and_drops_true_and_flattens() {
        let a = FilterCondition::eq("status", "active");
        let b = FilterCondition::gte("age", 18_i64);
        let c = FilterCondition::lt("age", 65_i64);

        assert_eq!(Condition::True.and(a.clone().into()), Condition::Compare(a.clone()));

        let combined = Condition::all(&[a.clone(), b.clone()]).and(c.clone().into());
        assert_eq!(
            combined,
            Condition::And(vec![a.into(), b.into(), c.into()])
        );
    }

    #[test]
    fn test_any_collapses() {
        assert!(Condition::any(vec![Condition::True, FilterCondition::eq("a", 1_i64).into()]).is_true());
        let single = Condition::any(vec![FilterCondition::eq("a", 1_i64).into()]);
        assert!(matches!(single, Condition::Compare(_)));
    }

    #[test]
    fn test_matches() {
        let cond = Condition::all(&[
            FilterCondition::eq("status", "active"),
            FilterCondition::gte("age", 18_i64),
        ]);
        assert!(cond.matches(&row("active", 30)));
        assert!(!cond.matches(&row("active", 12)));
        assert!(!cond.matches(&row("banned", 30)));

        let either = Condition::Or(vec![
            FilterCondition::eq("status", "banned").into(),
            FilterCondition::lt("age", 18_i64).into(),
        ]);
        assert!(either.matches(&row("active", 12)));
        assert!(!either.matches(&row("active", 40)));
        assert!(!Condition::Or(vec![]).matches(&row("active", 1)));
        assert!(Condition::And(vec![]).matches(&row("active", 1)));
    }

    #[test]
    fn test_display() {
        let cond = Condition::Or(vec![
            FilterCondition::lt("id", 4_i64).into(),
            Condition::all(&[
                FilterCondition::eq("name", "O'Brien"),
                FilterCondition::is_null("deleted_at"),
            ]),
        ]);
        assert_eq!(
            cond.to_string(),
            "(id < 4 OR (name = 'O''Brien' AND deleted_at IS NULL))"
        );
    }
}

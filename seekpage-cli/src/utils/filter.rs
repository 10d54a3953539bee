//! `--filter` argument parsing
//!
//! Accepted forms:
//!
//! | argument          | condition                  |
//! |-------------------|----------------------------|
//! | `status=active`   | `status = 'active'`        |
//! | `age>=18`         | `age >= 18` (also `>` `<` `<=` `!=`) |
//! | `name~Proj%`      | `name LIKE 'Proj%'`        |
//! | `deleted_at=null` | `deleted_at IS NULL`       |
//! | `owner=[1,2,3]`   | `owner IN (1, 2, 3)`       |

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use seekpage::keyset::{FilterCondition, FilterOperator, FilterValue};

const OPERATORS: [(&str, FilterOperator); 7] = [
    (">=", FilterOperator::GreaterThanOrEqual),
    ("<=", FilterOperator::LessThanOrEqual),
    ("!=", FilterOperator::NotEqual),
    ("=", FilterOperator::Equal),
    (">", FilterOperator::GreaterThan),
    ("<", FilterOperator::LessThan),
    ("~", FilterOperator::Like),
];

/// Parse one `--filter` argument
pub fn parse_filter(arg: &str) -> Result<FilterCondition> {
    let split_at = arg
        .find(['=', '!', '<', '>', '~'])
        .ok_or_else(|| anyhow!("filter '{}' has no operator (=, !=, <, <=, >, >=, ~)", arg))?;

    let field = arg[..split_at].trim();
    if field.is_empty() {
        bail!("filter '{}' has no field name", arg);
    }

    let rest = &arg[split_at..];
    let (symbol, operator) = OPERATORS
        .iter()
        .find(|(symbol, _)| rest.starts_with(symbol))
        .ok_or_else(|| anyhow!("unknown operator in filter '{}'", arg))?;
    let raw = rest[symbol.len()..].trim();

    let condition = match (*operator, raw) {
        (FilterOperator::Equal, "null") => FilterCondition::is_null(field),
        (FilterOperator::NotEqual, "null") => FilterCondition::is_not_null(field),
        (FilterOperator::Like, pattern) => FilterCondition::like(field, pattern),
        (FilterOperator::Equal, list) if list.starts_with('[') && list.ends_with(']') => {
            parse_list(field, &list[1..list.len() - 1])
        }
        (operator, value) => FilterCondition::new(field, operator, parse_value(value)),
    };

    Ok(condition)
}

fn parse_list(field: &str, inner: &str) -> FilterCondition {
    let items: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let integers: Option<Vec<i64>> = items.iter().map(|s| s.parse().ok()).collect();
    match integers {
        Some(list) => FilterCondition::in_integers(field, list),
        None => FilterCondition::in_strings(field, items.iter().map(|s| s.to_string()).collect()),
    }
}

/// Integers, floats, booleans and RFC 3339 timestamps keep their type;
/// anything else is a string
fn parse_value(raw: &str) -> FilterValue {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return FilterValue::Timestamp(ts.with_timezone(&Utc));
    }
    if let Ok(n) = raw.parse::<i64>() {
        return FilterValue::Integer(n);
    }
    if let Ok(n) = raw.parse::<f64>() {
        if n.is_finite() {
            return FilterValue::Float(n);
        }
    }
    match raw {
        "true" => FilterValue::Boolean(true),
        "false" => FilterValue::Boolean(false),
        _ => FilterValue::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparisons() {
        assert_eq!(
            parse_filter("status=active").unwrap(),
            FilterCondition::eq("status", "active")
        );
        assert_eq!(parse_filter("age>=18").unwrap(), FilterCondition::gte("age", 18_i64));
        assert_eq!(parse_filter("age<18").unwrap(), FilterCondition::lt("age", 18_i64));
        assert_eq!(parse_filter("score > 1.5").unwrap(), FilterCondition::gt("score", 1.5));
        assert_eq!(parse_filter("done!=true").unwrap(), FilterCondition::ne("done", true));
    }

    #[test]
    fn test_special_forms() {
        assert_eq!(
            parse_filter("deleted_at=null").unwrap(),
            FilterCondition::is_null("deleted_at")
        );
        assert_eq!(
            parse_filter("deleted_at!=null").unwrap(),
            FilterCondition::is_not_null("deleted_at")
        );
        assert_eq!(parse_filter("name~Proj%").unwrap(), FilterCondition::like("name", "Proj%"));
        assert_eq!(
            parse_filter("owner=[1, 2,3]").unwrap(),
            FilterCondition::in_integers("owner", vec![1, 2, 3])
        );
        assert_eq!(
            parse_filter("status=[active,paused]").unwrap(),
            FilterCondition::in_strings("status", vec!["active".into(), "paused".into()])
        );
    }

    #[test]
    fn test_timestamps_are_typed() {
        let expected = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            parse_filter("updated_at<2025-01-01T00:00:00Z").unwrap(),
            FilterCondition::lt("updated_at", expected)
        );
        assert_eq!(
            parse_filter("day=2025-01-01").unwrap(),
            FilterCondition::eq("day", "2025-01-01")
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse_filter("status").is_err());
        assert!(parse_filter("=active").is_err());
        assert!(parse_filter("a!b").is_err());
    }
}

//! Filter types for keyset queries
//!
//! Filters are the caller's opaque predicate: a list of [`FilterCondition`]s
//! that the paginator ANDs with the seek condition it generates.
//!
//! # Example
//!
//! ```rust
//! use seekpage::keyset::FilterCondition;
//!
//! let filters = vec![
//!     FilterCondition::eq("owner_id", 42_i64),
//!     FilterCondition::is_null("deleted_at"),
//! ];
//! assert_eq!(filters.len(), 2);
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};

/// Comparison operators for filter conditions
///
/// # Example
///
/// ```rust
/// use seekpage::keyset::FilterOperator;
///
/// assert_eq!(format!("{}", FilterOperator::Equal), "=");
/// assert_eq!(format!("{}", FilterOperator::Like), "LIKE");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Not equal to (!=)
    NotEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal to (<=)
    LessThanOrEqual,
    /// Pattern matching (LIKE)
    Like,
    /// Value is in a list (IN)
    In,
    /// Value is null (IS NULL)
    IsNull,
    /// Value is not null (IS NOT NULL)
    IsNotNull,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "!="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
            Self::In => write!(f, "IN"),
            Self::IsNull => write!(f, "IS NULL"),
            Self::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// A value that can be used in filter conditions and row lookups
///
/// # Example
///
/// ```rust
/// use seekpage::keyset::FilterValue;
///
/// let string_val: FilterValue = "active".into();
/// let int_val: FilterValue = 42_i64.into();
/// let bool_val: FilterValue = true.into();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// List of string values (for IN operator)
    StringList(Vec<String>),
    /// List of integer values (for IN operator)
    IntegerList(Vec<i64>),
    /// Null value (for IS NULL / IS NOT NULL)
    Null,
}

impl FilterValue {
    /// Compare two scalar values
    ///
    /// Integers and floats compare numerically, and an RFC 3339 string
    /// compares against a timestamp as the instant it denotes. Anything else
    /// across types (and any null or list) is incomparable.
    pub fn compare(&self, other: &FilterValue) -> Option<Ordering> {
        use FilterValue as V;
        match (self, other) {
            (V::String(a), V::String(b)) => Some(a.cmp(b)),
            (V::Integer(a), V::Integer(b)) => Some(a.cmp(b)),
            (V::Float(a), V::Float(b)) => a.partial_cmp(b),
            (V::Integer(a), V::Float(b)) => cmp_integer_float(*a, *b),
            (V::Float(a), V::Integer(b)) => cmp_integer_float(*b, *a).map(Ordering::reverse),
            (V::Boolean(a), V::Boolean(b)) => Some(a.cmp(b)),
            (V::Timestamp(a), V::Timestamp(b)) => Some(a.cmp(b)),
            (V::Timestamp(a), V::String(b)) => parse_timestamp(b).map(|b| a.cmp(&b)),
            (V::String(a), V::Timestamp(b)) => parse_timestamp(a).map(|a| a.cmp(b)),
            _ => None,
        }
    }

    /// Whether this is [`FilterValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Exact `i64` against `f64`, without rounding the integer through `f64`
fn cmp_integer_float(a: i64, b: f64) -> Option<Ordering> {
    // 2^63 is exactly representable; every i64 is below it
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    if b.is_nan() {
        return None;
    }
    if b >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if b < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }

    let whole = b.trunc();
    match a.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(b - whole)),
        unequal => Some(unequal),
    }
}

/// RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC
/// (PostgreSQL renders `timestamp without time zone` that way in JSON)
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(list: Vec<i64>) -> Self {
        Self::IntegerList(list)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A single filter condition
///
/// `field` is the public field name; executors map it to a column.
///
/// # Example
///
/// ```rust
/// use seekpage::keyset::FilterCondition;
///
/// let status_filter = FilterCondition::eq("status", "active");
/// let name_filter = FilterCondition::like("name", "%smith%");
/// let deleted_filter = FilterCondition::is_null("deleted_at");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// The field name to filter on
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter (field = value)
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// Create a not-equal filter (field != value)
    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::NotEqual, value.into())
    }

    /// Create a greater-than filter (field > value)
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value.into())
    }

    /// Create a greater-than-or-equal filter (field >= value)
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value.into())
    }

    /// Create a less-than filter (field < value)
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value.into())
    }

    /// Create a less-than-or-equal filter (field <= value)
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value.into())
    }

    /// Create a LIKE pattern filter (`%` and `_` wildcards)
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Like, FilterValue::String(pattern.into()))
    }

    /// Create an IN list filter for strings
    pub fn in_strings(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::StringList(values))
    }

    /// Create an IN list filter for integers
    pub fn in_integers(field: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::IntegerList(values))
    }

    /// Create an IS NULL filter
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNull, FilterValue::Null)
    }

    /// Create an IS NOT NULL filter
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNotNull, FilterValue::Null)
    }

    /// Evaluate this condition against a single field value
    ///
    /// `None` means the row has no such field, which behaves like NULL.
    pub fn test(&self, actual: Option<&FilterValue>) -> bool {
        let actual = match actual {
            Some(v) if !v.is_null() => v,
            _ => return self.operator == FilterOperator::IsNull,
        };

        match self.operator {
            FilterOperator::IsNull => false,
            FilterOperator::IsNotNull => true,
            FilterOperator::Equal => actual.compare(&self.value) == Some(Ordering::Equal),
            FilterOperator::NotEqual => matches!(
                actual.compare(&self.value),
                Some(Ordering::Less | Ordering::Greater)
            ),
            FilterOperator::GreaterThan => actual.compare(&self.value) == Some(Ordering::Greater),
            FilterOperator::GreaterThanOrEqual => matches!(
                actual.compare(&self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::LessThan => actual.compare(&self.value) == Some(Ordering::Less),
            FilterOperator::LessThanOrEqual => matches!(
                actual.compare(&self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Like => match (actual, &self.value) {
                (FilterValue::String(s), FilterValue::String(p)) => like_match(s, p),
                _ => false,
            },
            FilterOperator::In => match (actual, &self.value) {
                (FilterValue::String(s), FilterValue::StringList(list)) => list.contains(s),
                (FilterValue::Integer(n), FilterValue::IntegerList(list)) => list.contains(n),
                _ => false,
            },
        }
    }
}

/// SQL `LIKE` matching: `%` matches any run, `_` matches one character
fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((bp, bt)) = backtrack {
            p = bp + 1;
            t = bt + 1;
            backtrack = Some((bp, bt + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filter_operator_display() {
        assert_eq!(format!("{}", FilterOperator::Equal), "=");
        assert_eq!(format!("{}", FilterOperator::NotEqual), "!=");
        assert_eq!(format!("{}", FilterOperator::GreaterThan), ">");
        assert_eq!(format!("{}", FilterOperator::LessThanOrEqual), "<=");
        assert_eq!(format!("{}", FilterOperator::In), "IN");
        assert_eq!(format!("{}", FilterOperator::IsNotNull), "IS NOT NULL");
    }

    #[test]
    fn test_filter_value_conversions() {
        assert_eq!(FilterValue::from("a"), FilterValue::String("a".to_string()));
        assert_eq!(FilterValue::from(42_i32), FilterValue::Integer(42));
        assert_eq!(FilterValue::from(None::<i64>), FilterValue::Null);
        assert_eq!(FilterValue::from(Some(7_i64)), FilterValue::Integer(7));
    }

    #[test]
    fn test_compare_mixed_numbers() {
        let a = FilterValue::Integer(2);
        let b = FilterValue::Float(2.5);
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(b.compare(&a), Some(Ordering::Greater));
        assert_eq!(a.compare(&FilterValue::from("2")), None);
    }

    #[test]
    fn test_compare_large_integers_against_floats_exactly() {
        // 2^53 + 1 rounds to 2^53 as f64
        let big = FilterValue::Integer(9_007_199_254_740_993);
        let float = FilterValue::Float(9_007_199_254_740_992.0);
        assert_eq!(big.compare(&float), Some(Ordering::Greater));
        assert_eq!(float.compare(&big), Some(Ordering::Less));

        let exact = FilterValue::Integer(9_007_199_254_740_992);
        assert_eq!(exact.compare(&float), Some(Ordering::Equal));

        let neg = FilterValue::Integer(-3);
        assert_eq!(neg.compare(&FilterValue::Float(-3.5)), Some(Ordering::Greater));
        assert_eq!(neg.compare(&FilterValue::Float(-2.5)), Some(Ordering::Less));

        assert_eq!(
            FilterValue::Integer(i64::MAX).compare(&FilterValue::Float(9.3e18)),
            Some(Ordering::Less)
        );
        assert_eq!(
            FilterValue::Integer(i64::MIN).compare(&FilterValue::Float(-1e19)),
            Some(Ordering::Greater)
        );
        assert_eq!(FilterValue::Integer(0).compare(&FilterValue::Float(f64::NAN)), None);
    }

    #[test]
    fn test_compare_timestamp_against_rfc3339_string() {
        let ts = Utc.with_ymd_and_hms(2025, 4, 8, 5, 54, 45).unwrap();
        let same = FilterValue::from("2025-04-08T05:54:45+00:00");
        assert_eq!(FilterValue::Timestamp(ts).compare(&same), Some(Ordering::Equal));
        assert_eq!(
            FilterValue::Timestamp(ts).compare(&FilterValue::from("not a date")),
            None
        );
    }

    #[test]
    fn test_condition_test_null_semantics() {
        assert!(FilterCondition::is_null("deleted_at").test(None));
        assert!(FilterCondition::is_null("deleted_at").test(Some(&FilterValue::Null)));
        assert!(!FilterCondition::eq("status", "active").test(None));
        assert!(!FilterCondition::ne("status", "active").test(Some(&FilterValue::Null)));
        assert!(FilterCondition::is_not_null("name").test(Some(&"x".into())));
    }

    #[test]
    fn test_condition_test_comparisons() {
        let v = FilterValue::Integer(10);
        assert!(FilterCondition::gt("n", 5_i64).test(Some(&v)));
        assert!(FilterCondition::gte("n", 10_i64).test(Some(&v)));
        assert!(!FilterCondition::lt("n", 10_i64).test(Some(&v)));
        assert!(FilterCondition::lte("n", 10_i64).test(Some(&v)));
        assert!(FilterCondition::ne("n", 11_i64).test(Some(&v)));
        assert!(FilterCondition::in_integers("n", vec![1, 10]).test(Some(&v)));
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("alice@example.com", "%@example.com"));
        assert!(like_match("abc", "a_c"));
        assert!(like_match("abc", "%"));
        assert!(like_match("", "%"));
        assert!(!like_match("abc", "a_"));
        assert!(like_match("mississippi", "%iss%ppi"));
        assert!(!like_match("mississippi", "%isx%"));
    }
}

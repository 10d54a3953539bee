//! Cursors: the sort-key values of the last row of a page
//!
//! A [`Cursor`] only means something together with the [`SortSpec`] it was
//! built from. On the wire it is a JSON object whose keys are exactly the
//! spec's field names, in order:
//!
//! ```json
//! {"updatedAt": "2025-04-08T05:54:45.000Z", "id": 42}
//! ```
//!
//! For query strings the same object travels as an opaque token
//! (URL-safe base64 without padding), see [`Cursor::encode`].

use std::cmp::Ordering;
use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::filter::{parse_timestamp, FilterValue};
use super::sort::{FieldType, SortSpec};
use super::traits::Record;
use crate::error::{Error, Result};

/// A single typed cursor value
#[derive(Debug, Clone, PartialEq)]
pub enum CursorValue {
    /// Timestamp, for [`FieldType::Date`]
    Date(DateTime<Utc>),
    /// Integer, for [`FieldType::Number`]
    Integer(i64),
    /// Floating point, for [`FieldType::Number`]
    Float(f64),
    /// Text, for [`FieldType::String`]
    String(String),
}

impl CursorValue {
    /// The semantic type this value satisfies
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Date(_) => FieldType::Date,
            Self::Integer(_) | Self::Float(_) => FieldType::Number,
            Self::String(_) => FieldType::String,
        }
    }

    /// Convert a JSON value, checking it against the declared type
    pub fn from_json(field_type: FieldType, value: &Value) -> Option<Self> {
        match (field_type, value) {
            (FieldType::Date, Value::String(s)) => parse_timestamp(s).map(Self::Date),
            (FieldType::Number, Value::Number(n)) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            (FieldType::String, Value::String(s)) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    /// Convert a row value, checking it against the declared type
    ///
    /// Dates may arrive as timestamps or as RFC 3339 strings (e.g. from
    /// JSON-decoded rows).
    pub fn from_filter_value(field_type: FieldType, value: &FilterValue) -> Option<Self> {
        match (field_type, value) {
            (FieldType::Date, FilterValue::Timestamp(ts)) => Some(Self::Date(*ts)),
            (FieldType::Date, FilterValue::String(s)) => parse_timestamp(s).map(Self::Date),
            (FieldType::Number, FilterValue::Integer(n)) => Some(Self::Integer(*n)),
            (FieldType::Number, FilterValue::Float(n)) if n.is_finite() => Some(Self::Float(*n)),
            (FieldType::String, FilterValue::String(s)) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    /// JSON representation used on the wire
    pub fn to_json(&self) -> Value {
        match self {
            Self::Date(ts) => Value::String(ts.to_rfc3339_opts(date_precision(ts), true)),
            Self::Integer(n) => Value::from(*n),
            Self::Float(n) => Value::from(*n),
            Self::String(s) => Value::String(s.clone()),
        }
    }

    /// Total order within one semantic type
    ///
    /// Mixed integer/float compares numerically; values of different semantic
    /// types never meet because cursors are validated against the spec.
    pub fn cmp_value(&self, other: &CursorValue) -> Ordering {
        FilterValue::from(self)
            .compare(&FilterValue::from(other))
            .unwrap_or(Ordering::Equal)
    }
}

/// Milliseconds unless the timestamp carries finer digits, which are kept
fn date_precision(ts: &DateTime<Utc>) -> SecondsFormat {
    let nanos = ts.timestamp_subsec_nanos();
    if nanos % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else if nanos % 1_000 == 0 {
        SecondsFormat::Micros
    } else {
        SecondsFormat::Nanos
    }
}

impl From<&CursorValue> for FilterValue {
    fn from(value: &CursorValue) -> Self {
        match value {
            CursorValue::Date(ts) => FilterValue::Timestamp(*ts),
            CursorValue::Integer(n) => FilterValue::Integer(*n),
            CursorValue::Float(n) => FilterValue::Float(*n),
            CursorValue::String(s) => FilterValue::String(s.clone()),
        }
    }
}

impl fmt::Display for CursorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Sort-key values identifying the last row of a page
///
/// Cursors are immutable; build them with [`Cursor::from_json`],
/// [`Cursor::decode`] or [`Cursor::from_record`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    entries: Vec<(String, CursorValue)>,
}

impl Cursor {
    /// Validate a wire cursor object against a sort spec
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCursor`] when the value is not an object, a sort field
    /// is missing, an unknown key is present, or a value does not parse as
    /// the field's declared type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use seekpage::keyset::{Cursor, SortSpec};
    ///
    /// let spec = SortSpec::parse("updatedAt:desc:date,id:desc").unwrap();
    /// let cursor = Cursor::from_json(
    ///     &spec,
    ///     &serde_json::json!({"updatedAt": "2025-04-08T05:54:45.000Z", "id": 42}),
    /// )
    /// .unwrap();
    /// assert_eq!(cursor.len(), 2);
    ///
    /// let missing = Cursor::from_json(&spec, &serde_json::json!({"id": 5}));
    /// assert!(missing.is_err());
    /// ```
    pub fn from_json(spec: &SortSpec, value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_cursor("cursor must be a JSON object"))?;
        Self::from_map(spec, object)
    }

    fn from_map(spec: &SortSpec, object: &Map<String, Value>) -> Result<Self> {
        if let Some(unknown) = object.keys().find(|k| spec.field(k).is_none()) {
            return Err(Error::invalid_cursor(format!(
                "unexpected cursor key '{}'",
                unknown
            )));
        }

        let entries = spec
            .fields()
            .iter()
            .map(|field| {
                let raw = object.get(&field.name).ok_or_else(|| {
                    Error::invalid_cursor(format!("missing cursor key '{}'", field.name))
                })?;
                let value = CursorValue::from_json(field.field_type, raw).ok_or_else(|| {
                    Error::invalid_cursor(format!(
                        "cursor value for '{}' is not a valid {}",
                        field.name, field.field_type
                    ))
                })?;
                Ok((field.name.clone(), value))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Project the sort fields of a row into a cursor
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCursor`] when the row does not expose a sort field or
    /// exposes it with a type that disagrees with the spec.
    pub fn from_record<R: Record + ?Sized>(spec: &SortSpec, record: &R) -> Result<Self> {
        let entries = spec
            .fields()
            .iter()
            .map(|field| {
                let raw = record.field(&field.name).ok_or_else(|| {
                    Error::invalid_cursor(format!("row does not expose sort field '{}'", field.name))
                })?;
                let value = CursorValue::from_filter_value(field.field_type, &raw).ok_or_else(|| {
                    Error::invalid_cursor(format!(
                        "row value for '{}' is not a valid {}",
                        field.name, field.field_type
                    ))
                })?;
                Ok((field.name.clone(), value))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Check that this cursor was built for `spec`
    ///
    /// Cursors built from one spec and handed to a paginator with another are
    /// rejected rather than silently producing a wrong seek condition.
    pub fn validate(&self, spec: &SortSpec) -> Result<()> {
        if self.entries.len() != spec.len() {
            return Err(Error::invalid_cursor(format!(
                "cursor has {} keys but the sort spec has {} fields",
                self.entries.len(),
                spec.len()
            )));
        }
        for ((name, value), field) in self.entries.iter().zip(spec.fields()) {
            if *name != field.name {
                return Err(Error::invalid_cursor(format!(
                    "cursor key '{}' does not match sort field '{}'",
                    name, field.name
                )));
            }
            if value.field_type() != field.field_type {
                return Err(Error::invalid_cursor(format!(
                    "cursor value for '{}' is not a valid {}",
                    name, field.field_type
                )));
            }
        }
        Ok(())
    }

    /// The `(field name, value)` pairs in sort order
    pub fn entries(&self) -> &[(String, CursorValue)] {
        &self.entries
    }

    /// Value for a field name
    pub fn get(&self, name: &str) -> Option<&CursorValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for a cursor with no fields (never produced by validation)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The wire JSON object, keys in sort order
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in &self.entries {
            map.insert(name.clone(), value.to_json());
        }
        Value::Object(map)
    }

    /// Encode as an opaque, URL-safe token
    ///
    /// # Example
    ///
    /// ```rust
    /// use seekpage::keyset::{Cursor, SortSpec};
    ///
    /// let spec = SortSpec::parse("id:asc").unwrap();
    /// let cursor = Cursor::from_json(&spec, &serde_json::json!({"id": 7})).unwrap();
    /// let token = cursor.encode();
    /// assert_eq!(Cursor::decode(&spec, &token).unwrap(), cursor);
    /// ```
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_json().to_string())
    }

    /// Decode a token produced by [`Cursor::encode`] and validate it
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCursor`] when the token is not base64, not JSON, or
    /// does not match the spec.
    pub fn decode(spec: &SortSpec, token: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| Error::invalid_cursor(format!("cursor token is not valid base64: {}", e)))?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_cursor(format!("cursor token is not valid JSON: {}", e)))?;
        Self::from_json(spec, &value)
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, &value.to_json())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyset::SortField;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;

    fn spec() -> SortSpec {
        SortSpec::new(vec![
            SortField::desc("updatedAt", FieldType::Date).with_column("updated_at"),
            SortField::desc("id", FieldType::Number).unique(),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_json_valid() {
        let cursor =
            Cursor::from_json(&spec(), &json!({"updatedAt": "2025-04-08T05:54:45.000Z", "id": 42}))
                .unwrap();
        let ts = Utc.with_ymd_and_hms(2025, 4, 8, 5, 54, 45).unwrap();
        assert_eq!(cursor.get("updatedAt"), Some(&CursorValue::Date(ts)));
        assert_eq!(cursor.get("id"), Some(&CursorValue::Integer(42)));
        assert_eq!(cursor.entries()[0].0, "updatedAt");
    }

    #[test]
    fn test_missing_key_is_invalid_cursor() {
        let err = Cursor::from_json(&spec(), &json!({"id": 5})).unwrap_err();
        assert!(matches!(err, Error::InvalidCursor(_)));
        assert!(err.to_string().contains("updatedAt"));
    }

    #[test]
    fn test_extra_key_is_invalid_cursor() {
        let err = Cursor::from_json(
            &spec(),
            &json!({"updatedAt": "2025-04-08T05:54:45Z", "id": 5, "name": "x"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unexpected cursor key 'name'"));
    }

    #[test]
    fn test_type_mismatch_is_invalid_cursor() {
        let bad_date = Cursor::from_json(&spec(), &json!({"updatedAt": "yesterday", "id": 5}));
        assert!(matches!(bad_date, Err(Error::InvalidCursor(_))));

        let bad_number =
            Cursor::from_json(&spec(), &json!({"updatedAt": "2025-04-08T05:54:45Z", "id": "5"}));
        assert!(matches!(bad_number, Err(Error::InvalidCursor(_))));

        let not_object = Cursor::from_json(&spec(), &json!([1, 2]));
        assert!(matches!(not_object, Err(Error::InvalidCursor(_))));
    }

    #[test]
    fn test_to_json_formats_dates_with_millis() {
        let cursor =
            Cursor::from_json(&spec(), &json!({"updatedAt": "2025-04-08T07:54:45+02:00", "id": 42}))
                .unwrap();
        assert_eq!(
            cursor.to_json(),
            json!({"updatedAt": "2025-04-08T05:54:45.000Z", "id": 42})
        );
        assert_eq!(
            serde_json::to_string(&cursor).unwrap(),
            r#"{"updatedAt":"2025-04-08T05:54:45.000Z","id":42}"#
        );
    }

    #[test]
    fn test_sub_millisecond_dates_survive_tokens() {
        let base = Utc.with_ymd_and_hms(2025, 4, 8, 5, 54, 45).unwrap();
        for (ts, rendered) in [
            (
                base + chrono::Duration::microseconds(123_456),
                "2025-04-08T05:54:45.123456Z",
            ),
            (
                base + chrono::Duration::nanoseconds(7),
                "2025-04-08T05:54:45.000000007Z",
            ),
        ] {
            let cursor = Cursor::from_json(
                &spec(),
                &json!({"updatedAt": rendered, "id": 1}),
            )
            .unwrap();
            assert_eq!(cursor.get("updatedAt"), Some(&CursorValue::Date(ts)));
            assert_eq!(cursor.to_json()["updatedAt"], json!(rendered));

            let decoded = Cursor::decode(&spec(), &cursor.encode()).unwrap();
            assert_eq!(decoded, cursor);
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            Cursor::decode(&spec(), "!!!not-base64"),
            Err(Error::InvalidCursor(_))
        ));
        let not_json = URL_SAFE_NO_PAD.encode("not json");
        assert!(matches!(
            Cursor::decode(&spec(), &not_json),
            Err(Error::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_from_record() {
        let mut row: HashMap<String, FilterValue> = HashMap::new();
        row.insert("updatedAt".into(), "2025-04-08T05:54:45Z".into());
        row.insert("id".into(), 9_i64.into());

        let cursor = Cursor::from_record(&spec(), &row).unwrap();
        assert_eq!(cursor.get("id"), Some(&CursorValue::Integer(9)));

        row.remove("id");
        let err = Cursor::from_record(&spec(), &row).unwrap_err();
        assert!(err.to_string().contains("does not expose sort field 'id'"));
    }

    #[test]
    fn test_validate_against_other_spec() {
        let cursor = Cursor::from_json(&spec(), &json!({"updatedAt": "2025-04-08T05:54:45Z", "id": 1}))
            .unwrap();
        assert!(cursor.validate(&spec()).is_ok());

        let other = SortSpec::parse("id:desc").unwrap();
        assert!(matches!(cursor.validate(&other), Err(Error::InvalidCursor(_))));
    }

    #[test]
    fn test_float_numbers_accepted() {
        let spec = SortSpec::parse("score:desc:number,id").unwrap();
        let cursor = Cursor::from_json(&spec, &json!({"score": 1.5, "id": 3})).unwrap();
        assert_eq!(cursor.get("score"), Some(&CursorValue::Float(1.5)));
        assert_eq!(
            CursorValue::Float(1.5).cmp_value(&CursorValue::Integer(2)),
            Ordering::Less
        );
    }
}

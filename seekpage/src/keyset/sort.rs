//! Sort specifications
//!
//! A [`SortSpec`] is an ordered, non-empty list of [`SortField`]s. The first
//! field is the primary sort key; each following field breaks ties among rows
//! equal on every field before it. The last field must be unique per row
//! (typically the primary key) or pages can skip or repeat rows.
//!
//! # Example
//!
//! ```rust
//! use seekpage::keyset::{FieldType, SortDirection, SortField, SortSpec};
//!
//! let spec = SortSpec::new(vec![
//!     SortField::new("updatedAt", FieldType::Date, SortDirection::Descending)
//!         .with_column("updated_at"),
//!     SortField::new("id", FieldType::Number, SortDirection::Descending).unique(),
//! ])
//! .unwrap();
//!
//! assert_eq!(spec.len(), 2);
//! assert_eq!(spec.to_order_clause(), "updated_at DESC, id DESC");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Direction for ordering results
///
/// # Example
///
/// ```rust
/// use seekpage::keyset::SortDirection;
///
/// assert_eq!(format!("{}", SortDirection::Ascending), "asc");
/// assert_eq!(SortDirection::Descending.as_sql(), "DESC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Sort in ascending order (A-Z, 0-9, oldest first)
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    /// Sort in descending order (Z-A, 9-0, newest first)
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Convert to SQL ORDER BY clause fragment
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    /// Reverse the direction
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(Error::invalid_argument(format!(
                "unknown sort direction '{}' (expected asc or desc)",
                other
            ))),
        }
    }
}

/// Semantic type of a sort field, used to validate cursor values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// RFC 3339 timestamp
    Date,
    /// Integer or floating point number
    Number,
    /// Text
    String,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
        }
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "date" | "timestamp" => Ok(Self::Date),
            "number" | "int" | "integer" | "float" => Ok(Self::Number),
            "string" | "text" => Ok(Self::String),
            other => Err(Error::invalid_argument(format!(
                "unknown field type '{}' (expected date, number or string)",
                other
            ))),
        }
    }
}

/// One entry of a [`SortSpec`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Public field name, used as the cursor key
    pub name: String,
    /// SQL column expression; defaults to `name`
    pub column: String,
    /// Sort direction
    pub direction: SortDirection,
    /// Semantic type of the values in this field
    pub field_type: FieldType,
    /// Whether values are unique per row (a tie-break field)
    #[serde(default)]
    pub unique: bool,
}

impl SortField {
    /// Create a sort field whose column matches its name
    pub fn new(name: impl Into<String>, field_type: FieldType, direction: SortDirection) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            direction,
            field_type,
            unique: false,
        }
    }

    /// Ascending field
    pub fn asc(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, SortDirection::Ascending)
    }

    /// Descending field
    pub fn desc(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type, SortDirection::Descending)
    }

    /// Map this field to a different SQL column
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Mark this field as unique per row
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

impl FromStr for SortField {
    type Err = Error;

    /// Parse `name[:direction[:type]]`, e.g. `updated_at:desc:date`
    ///
    /// Direction defaults to `asc` and type to `number`. A field named `id`
    /// is treated as unique.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        let name = parts
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::invalid_argument(format!("empty sort field in '{}'", s)))?;
        let direction = match parts.next() {
            Some(d) => d.trim().parse()?,
            None => SortDirection::Ascending,
        };
        let field_type = match parts.next() {
            Some(t) => t.trim().parse()?,
            None => FieldType::Number,
        };
        if parts.next().is_some() {
            return Err(Error::invalid_argument(format!(
                "too many ':' separated parts in sort field '{}'",
                s
            )));
        }

        let field = SortField::new(name, field_type, direction);
        Ok(if name == "id" { field.unique() } else { field })
    }
}

/// Validate a SQL column expression: identifiers, optionally dotted
pub(crate) fn validate_column(column: &str) -> Result<()> {
    let valid = !column.is_empty()
        && column.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "'{}' is not a valid column name",
            column
        )))
    }
}

/// Ordered, validated, non-empty list of sort fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    fields: Vec<SortField>,
}

impl SortSpec {
    /// Build a sort spec
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `fields` is empty, a name repeats, or a
    /// column is not a plain (optionally dotted) identifier.
    pub fn new(fields: Vec<SortField>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::invalid_argument("sort spec must not be empty"));
        }

        for (i, field) in fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(Error::invalid_argument("sort field name must not be empty"));
            }
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::invalid_argument(format!(
                    "sort field '{}' is specified more than once",
                    field.name
                )));
            }
            validate_column(&field.column)?;
        }

        if let Some(last) = fields.last() {
            if !last.unique {
                tracing::warn!(
                    field = %last.name,
                    "last sort field is not marked unique; rows sharing all sort values may be skipped or repeated across pages"
                );
            }
        }

        Ok(Self { fields })
    }

    /// Parse a comma separated list of `name[:direction[:type]]` entries
    ///
    /// # Example
    ///
    /// ```rust
    /// use seekpage::keyset::{SortDirection, SortSpec};
    ///
    /// let spec = SortSpec::parse("updated_at:desc:date,id:desc").unwrap();
    /// assert_eq!(spec.fields()[0].direction, SortDirection::Descending);
    /// assert!(spec.fields()[1].unique);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let fields = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<SortField>>>()?;
        Self::new(fields)
    }

    /// The fields in tie-break priority order
    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; a spec cannot be empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by its public name
    pub fn field(&self, name: &str) -> Option<&SortField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterate over the public field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Render the ORDER BY list (without the keyword)
    pub fn to_order_clause(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{} {}", f.column, f.direction.as_sql()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<'de> Deserialize<'de> for SortSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            fields: Vec<SortField>,
        }

        let raw = Raw::deserialize(deserializer)?;
        SortSpec::new(raw.fields).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_display_and_sql() {
        assert_eq!(SortDirection::Ascending.to_string(), "asc");
        assert_eq!(SortDirection::Descending.to_string(), "desc");
        assert_eq!(SortDirection::Ascending.as_sql(), "ASC");
        assert_eq!(SortDirection::Descending.reverse(), SortDirection::Ascending);
    }

    #[test]
    fn test_sort_direction_default() {
        assert_eq!(SortDirection::default(), SortDirection::Ascending);
    }

    #[test]
    fn test_empty_spec_rejected() {
        let err = SortSpec::new(vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = SortSpec::new(vec![
            SortField::desc("id", FieldType::Number),
            SortField::asc("id", FieldType::Number),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_bad_column_rejected() {
        let err = SortSpec::new(vec![
            SortField::desc("id", FieldType::Number).with_column("id; DROP TABLE users"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_validate_column() {
        assert!(validate_column("updated_at").is_ok());
        assert!(validate_column("p.updated_at").is_ok());
        assert!(validate_column("_x1").is_ok());
        assert!(validate_column("1abc").is_err());
        assert!(validate_column("a..b").is_err());
        assert!(validate_column("").is_err());
    }

    #[test]
    fn test_parse_spec() {
        let spec = SortSpec::parse("updated_at:desc:date, id:desc").unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.fields()[0].field_type, FieldType::Date);
        assert_eq!(spec.fields()[0].column, "updated_at");
        assert_eq!(spec.fields()[1].field_type, FieldType::Number);
        assert!(spec.fields()[1].unique);
        assert_eq!(spec.to_order_clause(), "updated_at DESC, id DESC");
    }

    #[test]
    fn test_parse_spec_errors() {
        assert!(SortSpec::parse("").is_err());
        assert!(SortSpec::parse("name:sideways").is_err());
        assert!(SortSpec::parse("name:asc:blob").is_err());
        assert!(SortSpec::parse("name:asc:string:extra").is_err());
    }

    #[test]
    fn test_field_lookup() {
        let spec = SortSpec::parse("title:asc:string,id").unwrap();
        assert_eq!(spec.field("title").unwrap().field_type, FieldType::String);
        assert!(spec.field("missing").is_none());
        assert_eq!(spec.names().collect::<Vec<_>>(), vec!["title", "id"]);
    }

    #[test]
    fn test_deserialize_validates() {
        let json = serde_json::json!({
            "fields": [
                { "name": "id", "column": "id", "direction": "desc", "field_type": "number", "unique": true }
            ]
        });
        let spec: SortSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.fields()[0].direction, SortDirection::Descending);

        let empty = serde_json::json!({ "fields": [] });
        assert!(serde_json::from_value::<SortSpec>(empty).is_err());
    }
}

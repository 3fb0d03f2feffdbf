//! # Values and rows
//!
//! [`DataType`] is the untyped scalar exchanged with the database in both
//! directions: statement parameters on the way in, column values on the way
//! out. Every variant is nullable; `None` in any variant is SQL `NULL`.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::Serialize;

/// A nullable SQL scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataType {
    /// BOOLEAN
    Boolean(Option<bool>),
    /// 32-bit signed integer
    Int32(Option<i32>),
    /// 64-bit signed integer
    Int64(Option<i64>),
    /// 32-bit unsigned integer
    Uint32(Option<u32>),
    /// 64-bit unsigned integer
    Uint64(Option<u64>),
    /// Single precision float
    Float(Option<f32>),
    /// Double precision float
    Double(Option<f64>),
    /// Text
    Str(Option<String>),
    /// Binary blob
    Binary(Option<Vec<u8>>),
    /// Date formatted as `%Y-%m-%d`
    Date(Option<String>),
    /// Time formatted as `%H:%M:%S%.f`
    Time(Option<String>),
    /// Timestamp formatted as RFC3339 or `%Y-%m-%d %H:%M:%S%.f`
    Timestamp(Option<String>),
}

impl DataType {
    /// Returns `true` when the value is SQL `NULL`, whatever its variant.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(
            self,
            Self::Boolean(None)
                | Self::Int32(None)
                | Self::Int64(None)
                | Self::Uint32(None)
                | Self::Uint64(None)
                | Self::Float(None)
                | Self::Double(None)
                | Self::Str(None)
                | Self::Binary(None)
                | Self::Date(None)
                | Self::Time(None)
                | Self::Timestamp(None)
        )
    }

    /// Returns `true` for non-null integer and floating point values.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int32(Some(_))
                | Self::Int64(Some(_))
                | Self::Uint32(Some(_))
                | Self::Uint64(Some(_))
                | Self::Float(Some(_))
                | Self::Double(Some(_))
        )
    }

    /// Short name of the variant, used in conversion errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Uint32(_) => "uint32",
            Self::Uint64(_) => "uint64",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Str(_) => "string",
            Self::Binary(_) => "binary",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(Some(v)) => write!(f, "{v}"),
            Self::Int32(Some(v)) => write!(f, "{v}"),
            Self::Int64(Some(v)) => write!(f, "{v}"),
            Self::Uint32(Some(v)) => write!(f, "{v}"),
            Self::Uint64(Some(v)) => write!(f, "{v}"),
            Self::Float(Some(v)) => write!(f, "{v}"),
            Self::Double(Some(v)) => write!(f, "{v}"),
            Self::Str(Some(v))
            | Self::Date(Some(v))
            | Self::Time(Some(v))
            | Self::Timestamp(Some(v)) => f.write_str(v),
            Self::Binary(Some(v)) => write!(f, "<{} bytes>", v.len()),
            _ => f.write_str("NULL"),
        }
    }
}

// Each Rust type maps to exactly one variant so that a typed NULL can be
// produced from `Option::None`.
macro_rules! data_type_from {
    (@conv $value:expr) => { $value };
    (@conv $value:expr, $conv:expr) => { ($conv)($value) };
    ($($ty:ty => $variant:ident $(via $conv:expr)?),* $(,)?) => {
        $(
            impl From<$ty> for DataType {
                fn from(value: $ty) -> Self {
                    Self::$variant(Some(data_type_from!(@conv value $(, $conv)?)))
                }
            }

            impl From<Option<$ty>> for DataType {
                fn from(value: Option<$ty>) -> Self {
                    Self::$variant(value.map(|v| data_type_from!(@conv v $(, $conv)?)))
                }
            }
        )*
    };
}

data_type_from! {
    bool => Boolean,
    i8 => Int32 via i32::from,
    i16 => Int32 via i32::from,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint32 via u32::from,
    u16 => Uint32 via u32::from,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float,
    f64 => Double,
    String => Str,
    &str => Str via str::to_string,
    char => Str via |ch: char| ch.to_string(),
    Vec<u8> => Binary,
    &[u8] => Binary via <[u8]>::to_vec,
    NaiveDate => Date via |date: NaiveDate| date.format("%Y-%m-%d").to_string(),
    NaiveTime => Time via |time: NaiveTime| time.format("%H:%M:%S%.f").to_string(),
    NaiveDateTime => Timestamp via |dt: NaiveDateTime| dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
    DateTime<Utc> => Timestamp via |dt: DateTime<Utc>| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    serde_json::Value => Str via |json: serde_json::Value| json.to_string(),
}

/// A named column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Column name as reported by the database.
    pub name: String,

    /// Column value.
    pub value: DataType,
}

/// A result row: an ordered column→value mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    /// Columns in the order returned by the database.
    pub fields: Vec<Field>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Appends a column value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<DataType>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Look up a column value by name.
    ///
    /// An exact match wins; otherwise names are compared ignoring ASCII case,
    /// since drivers differ in how they report identifier case.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&DataType> {
        self.fields
            .iter()
            .find(|field| field.name == column)
            .or_else(|| self.fields.iter().find(|field| field.name.eq_ignore_ascii_case(column)))
            .map(|field| &field.value)
    }

    /// Column names in result order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// Number of columns.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the row has no columns.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<DataType>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| Field {
                    name: name.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }
}

impl IntoIterator for Row {
    type IntoIter = std::vec::IntoIter<Field>;
    type Item = Field;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type IntoIter = std::slice::Iter<'a, Field>;
    type Item = &'a Field;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::DataType;
use crate::schema::Schema;

/// Trait for types that can be assigned from a database value.
///
/// Implemented for the standard Rust types an entity field can hold (`i32`,
/// `String`, `DateTime`, etc). Integer conversions are range-checked across
/// widths because drivers report integers in their own width (`SQLite` always
/// returns `Int64`). Floats also accept integers they can hold exactly, since
/// integral reals may come back as integers. No other coercion is performed.
pub trait FromValue: Sized {
    /// Convert a non-null value into `Self`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has an incompatible type or is out of range.
    fn from_value(value: DataType) -> Result<Self>;
}

/// Trait for database entities with a registered schema.
///
/// Typically implemented via the `entity!` macro rather than manually.
pub trait Entity: Sized + 'static {
    /// Build the schema descriptor for this entity.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidSchema`] if the descriptor violates an invariant.
    fn schema() -> crate::Result<Schema<Self>>;
}

/// Declares an ORM entity with automatic `Entity` trait implementation.
///
/// Each field gets a generated getter/setter pair. Fields map to a column of
/// the same name unless followed by `=> "column"`. The struct must implement
/// `Default`, which is used to construct fresh instances when binding rows.
///
/// # Examples
///
/// ```ignore
/// entity! {
///     table = "user",
///     primary_key = id,
///     #[derive(Debug, Clone, Default)]
///     pub struct User {
///         pub id: i64,
///         pub name: String => "user_name",
///         pub age: i32,
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity {
    (
        table = $table:literal,
        primary_key = $pk:ident,
        $(#[$meta:meta])*
        pub struct $struct_name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field_name:ident : $field_type:ty $(=> $column:literal)?
            ),* $(,)?
        }
    ) => {
        #[allow(missing_docs)]
        $(#[$meta])*
        pub struct $struct_name {
            $(
                $(#[$field_meta])*
                pub $field_name : $field_type
            ),*
        }

        impl $crate::Entity for $struct_name {
            fn schema() -> $crate::Result<$crate::Schema<Self>> {
                $crate::Schema::builder($table, stringify!($pk))
                    .constructor(|| Ok(<Self as ::core::default::Default>::default()))
                    $(
                        .field($crate::FieldDescriptor::new(
                            stringify!($field_name),
                            $crate::__column!($field_name $(, $column)?),
                            |entity: &Self| {
                                Ok($crate::DataType::from(::core::clone::Clone::clone(
                                    &entity.$field_name,
                                )))
                            },
                            |entity: &mut Self, value: $crate::DataType| {
                                entity.$field_name =
                                    <$field_type as $crate::FromValue>::from_value(value)?;
                                Ok(())
                            },
                        ))
                    )*
                    .build()
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __column {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $column:literal) => {
        $column
    };
}

impl FromValue for bool {
    fn from_value(value: DataType) -> Result<Self> {
        match value {
            DataType::Boolean(Some(v)) => Ok(v),
            // booleans are commonly stored as 0/1 integers
            other => match as_i64(&other) {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => bail!("expected boolean data type, found {}", other.type_name()),
            },
        }
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: DataType) -> Result<Self> {
                    let Some(wide) = as_i128(&value) else {
                        bail!("expected integer data type, found {}", value.type_name());
                    };
                    Self::try_from(wide)
                        .map_err(|_e| anyhow!("{wide} is out of range for {}", stringify!($ty)))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: DataType) -> Result<Self> {
        match value {
            DataType::Float(Some(v)) => Ok(v),
            DataType::Double(Some(v)) => Ok(v as Self),
            other => integral_float(&other, F32_EXACT, "float").map(|v| v as Self),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: DataType) -> Result<Self> {
        match value {
            DataType::Float(Some(v)) => Ok(Self::from(v)),
            DataType::Double(Some(v)) => Ok(v),
            other => integral_float(&other, F64_EXACT, "double"),
        }
    }
}

impl FromValue for String {
    fn from_value(value: DataType) -> Result<Self> {
        match value {
            DataType::Str(Some(v))
            | DataType::Date(Some(v))
            | DataType::Time(Some(v))
            | DataType::Timestamp(Some(v)) => Ok(v),
            other => bail!("expected string data type, found {}", other.type_name()),
        }
    }
}

impl FromValue for char {
    fn from_value(value: DataType) -> Result<Self> {
        let raw = String::from_value(value)?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(ch),
            _ => bail!("expected a single character, found {raw:?}"),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: DataType) -> Result<Self> {
        match value {
            DataType::Binary(Some(bytes)) => Ok(bytes),
            DataType::Str(Some(raw)) => Ok(raw.into_bytes()),
            other => bail!("expected binary data type, found {}", other.type_name()),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: DataType) -> Result<Self> {
        let raw = temporal_text(value, "timestamp")?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f") {
            return Ok(Self::from_naive_utc_and_offset(parsed, Utc));
        }
        bail!("unsupported timestamp: {raw}; expected RFC3339 or \"%Y-%m-%d %H:%M:%S%.f\" format")
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: DataType) -> Result<Self> {
        let raw = temporal_text(value, "timestamp")?;
        if let Ok(parsed) = Self::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f") {
            return Ok(parsed);
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(parsed.naive_utc());
        }
        bail!("unsupported timestamp: {raw}; expected \"%Y-%m-%d %H:%M:%S%.f\" or RFC3339 format")
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: DataType) -> Result<Self> {
        let raw = temporal_text(value, "date")?;
        Self::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_e| anyhow!("unsupported date: {raw}; expected \"%Y-%m-%d\" format"))
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: DataType) -> Result<Self> {
        let raw = temporal_text(value, "time")?;
        Self::parse_from_str(&raw, "%H:%M:%S%.f")
            .map_err(|_e| anyhow!("unsupported time: {raw}; expected \"%H:%M:%S%.f\" format"))
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: DataType) -> Result<Self> {
        match value {
            DataType::Str(Some(raw)) => Ok(serde_json::from_str(&raw)?),
            DataType::Binary(Some(bytes)) => Ok(serde_json::from_slice(&bytes)?),
            other => bail!("expected json compatible data type, found {}", other.type_name()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: DataType) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}

fn as_i64(value: &DataType) -> Option<i64> {
    match value {
        DataType::Int32(Some(v)) => Some(i64::from(*v)),
        DataType::Int64(Some(v)) => Some(*v),
        DataType::Uint32(Some(v)) => Some(i64::from(*v)),
        _ => None,
    }
}

fn as_i128(value: &DataType) -> Option<i128> {
    match value {
        DataType::Int32(Some(v)) => Some(i128::from(*v)),
        DataType::Int64(Some(v)) => Some(i128::from(*v)),
        DataType::Uint32(Some(v)) => Some(i128::from(*v)),
        DataType::Uint64(Some(v)) => Some(i128::from(*v)),
        _ => None,
    }
}

// Largest integer magnitudes a float mantissa holds without rounding.
const F32_EXACT: u128 = 1 << f32::MANTISSA_DIGITS;
const F64_EXACT: u128 = 1 << f64::MANTISSA_DIGITS;

// Drivers store integral reals as integers (SQLite NUMERIC affinity does), so
// integers convert as long as no precision is lost.
#[allow(clippy::cast_precision_loss)]
fn integral_float(value: &DataType, limit: u128, expected: &str) -> Result<f64> {
    let Some(wide) = as_i128(value) else {
        bail!("expected {expected} data type, found {}", value.type_name());
    };
    if wide.unsigned_abs() > limit {
        bail!("{wide} is not exactly representable as a {expected}");
    }
    Ok(wide as f64)
}

// SQLite and other text-typed drivers return temporal values as strings.
fn temporal_text(value: DataType, expected: &str) -> Result<String> {
    match value {
        DataType::Str(Some(raw))
        | DataType::Date(Some(raw))
        | DataType::Time(Some(raw))
        | DataType::Timestamp(Some(raw)) => Ok(raw),
        other => bail!("expected {expected} data type, found {}", other.type_name()),
    }
}

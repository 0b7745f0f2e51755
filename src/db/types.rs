//! Row normalization.
//!
//! Converts MySQL rows into ordered sequences of JSON values, one value per
//! column in the order of the statement's result descriptor.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Category-specific decoders handle the actual value extraction

use crate::error::{DbError, DbResult};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};
use tracing::debug;

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    /// BIT(n), read as an unsigned integer
    Bit,
    Json,
    Date,
    DateTime,
    Time,
    Unknown,
}

/// Classify a MySQL type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal first: "numeric" would otherwise never be reached
    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("int") || lower == "year" {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    if lower == "bit" {
        return TypeCategory::Bit;
    }

    if lower.contains("blob") || lower.contains("binary") {
        return TypeCategory::Binary;
    }

    match lower.as_str() {
        "date" => return TypeCategory::Date,
        "datetime" | "timestamp" => return TypeCategory::DateTime,
        "time" => return TypeCategory::Time,
        _ => {}
    }

    if lower.contains("char") || lower.contains("text") || lower == "enum" || lower == "set" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Decode binary data to a JSON string.
///
/// Valid UTF-8 is returned as text (MySQL reports many catalog and `SHOW`
/// columns as binary strings); anything else is base64-encoded.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

// =============================================================================
// Row Conversion
// =============================================================================

/// Convert a row into its ordered column values.
///
/// SQL NULL becomes JSON null. A value that cannot be decoded at all is an
/// error, never a null.
pub fn row_values(row: &MySqlRow) -> DbResult<Vec<JsonValue>> {
    row.columns()
        .iter()
        .map(|col| decode_column(row, col.ordinal(), col.name(), col.type_info().name()))
        .collect()
}

/// Read column `idx` as text, accepting binary-typed string columns.
pub fn string_at(row: &MySqlRow, idx: usize) -> DbResult<String> {
    if let Ok(s) = row.try_get::<String, _>(idx) {
        return Ok(s);
    }
    let bytes: Vec<u8> = row.try_get(idx)?;
    String::from_utf8(bytes)
        .map_err(|_| DbError::internal(format!("Column {} is not valid UTF-8 text", idx)))
}

fn decode_column(row: &MySqlRow, idx: usize, name: &str, type_name: &str) -> DbResult<JsonValue> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(JsonValue::Null);
    }

    let category = categorize_type(type_name);
    let typed = match category {
        TypeCategory::Decimal => row
            .try_get::<RawDecimal, _>(idx)
            .map(|v| JsonValue::String(v.0)),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Bit => row.try_get::<u64, _>(idx).map(JsonValue::from),
        TypeCategory::Boolean => row.try_get::<bool, _>(idx).map(JsonValue::Bool),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Binary => row
            .try_get::<Vec<u8>, _>(idx)
            .map(|v| decode_binary_value(&v)),
        TypeCategory::Json => row.try_get::<JsonValue, _>(idx),
        TypeCategory::Date => row
            .try_get::<chrono::NaiveDate, _>(idx)
            .map(|v| JsonValue::String(v.to_string())),
        TypeCategory::DateTime => row
            .try_get::<chrono::NaiveDateTime, _>(idx)
            .map(|v| JsonValue::String(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())),
        TypeCategory::Time => row
            .try_get::<chrono::NaiveTime, _>(idx)
            .map(|v| JsonValue::String(v.to_string())),
        TypeCategory::Text => row.try_get::<String, _>(idx).map(JsonValue::String),
        TypeCategory::Unknown => return decode_raw(row, idx, category, name, type_name),
    };

    match typed {
        Ok(value) => Ok(value),
        Err(e) => {
            debug!(column = name, type_name, error = %e, "Typed decode failed, using raw bytes");
            decode_raw(row, idx, category, name, type_name)
        }
    }
}

/// Fallback for types without a typed decoder (GEOMETRY, zero dates,
/// TIME beyond 24h): the value's raw bytes, as text when they are UTF-8.
fn decode_raw(
    row: &MySqlRow,
    idx: usize,
    category: TypeCategory,
    name: &str,
    type_name: &str,
) -> DbResult<JsonValue> {
    let raw = row.try_get_raw(idx)?;
    let bytes = <&[u8] as Decode<sqlx::MySql>>::decode(raw).map_err(|e| {
        DbError::internal(format!(
            "Failed to decode column '{}' of type {}: {}",
            name, type_name, e
        ))
    })?;

    // The binary protocol sends zero dates and times as empty values
    if bytes.is_empty() {
        let zero = match category {
            TypeCategory::Date => Some("0000-00-00"),
            TypeCategory::DateTime => Some("0000-00-00 00:00:00"),
            TypeCategory::Time => Some("00:00:00"),
            _ => None,
        };
        if let Some(zero) = zero {
            return Ok(JsonValue::String(zero.to_string()));
        }
    }
    Ok(decode_binary_value(bytes))
}

fn decode_integer(row: &MySqlRow, idx: usize) -> Result<JsonValue, sqlx::Error> {
    if let Ok(v) = row.try_get::<i8, _>(idx) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<i16, _>(idx) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<u8, _>(idx) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<u16, _>(idx) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<u32, _>(idx) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return Ok(v.into());
    }
    row.try_get::<i64, _>(idx).map(JsonValue::from)
}

fn decode_float(row: &MySqlRow, idx: usize) -> Result<JsonValue, sqlx::Error> {
    let v = match row.try_get::<f64, _>(idx) {
        Ok(v) => v,
        Err(_) => row.try_get::<f32, _>(idx)? as f64,
    };
    Ok(serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string())))
}

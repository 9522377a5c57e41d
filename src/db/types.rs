//! Row and cell values returned by the database layer.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies the driver's column type name
//! 2. A per-category decoder extracts the value into a [`CellValue`]
//!
//! Cells stay typed until they are serialized, which is where the JSON
//! representation is decided.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row as _, TypeInfo};

// =============================================================================
// Cell values
// =============================================================================

/// A single column value of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    /// Strings, plus DECIMAL and date/time values in their MySQL text form.
    Text(String),
    Binary(Vec<u8>),
    Json(JsonValue),
}

impl CellValue {
    /// Borrow the value as text, if it has a textual form.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Unsigned(v) => serializer.serialize_u64(*v),
            // JSON has no NaN or infinity
            Self::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Self::Float(v) => serializer.serialize_str(&v.to_string()),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Binary(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => serializer.serialize_str(s),
                Err(_) => serializer.serialize_str(&STANDARD.encode(bytes)),
            },
            Self::Json(value) => value.serialize(serializer),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

// =============================================================================
// Rows
// =============================================================================

/// One result row: column names mapped to cells, in select-list order.
///
/// Serializes as a JSON object whose keys keep the column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. A repeated name keeps both entries; the last one wins
    /// when the row is read back from JSON.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.push((name.into(), value.into()));
    }

    /// First cell with the given column name.
    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Decode a driver row.
    pub fn from_mysql(row: &MySqlRow) -> Self {
        let cells = row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let value = mysql::decode_column(row, idx, categorize_type(type_name));
                (col.name().to_string(), value)
            })
            .collect();
        Self { cells }
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    /// Integer types, including BOOLEAN (`TINYINT(1)`), BIT and YEAR.
    Integer,
    Float,
    Decimal,
    Temporal,
    Text,
    Binary,
    Json,
    Unknown,
}

/// Classify a MySQL type name as reported by the driver
/// (`"INT UNSIGNED"`, `"VARBINARY"`, `"BOOLEAN"`, ...).
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    if lower.contains("int")
        || matches!(lower.as_str(), "boolean" | "bool" | "bit" | "year")
    {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" {
        return TypeCategory::Json;
    }

    if matches!(
        lower.as_str(),
        "date" | "datetime" | "timestamp" | "time"
    ) {
        return TypeCategory::Temporal;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "geometry" {
        return TypeCategory::Binary;
    }

    if lower.contains("char") || lower.contains("text") || lower == "enum" || lower == "set" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

// =============================================================================
// MySQL decoders
// =============================================================================

mod mysql {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use sqlx::mysql::types::MySqlTime;

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> CellValue {
        match category {
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Decimal => decode_raw_text(row, idx),
            TypeCategory::Temporal => decode_temporal(row, idx),
            TypeCategory::Binary => decode_binary(row, idx),
            TypeCategory::Json => decode_json(row, idx),
            TypeCategory::Text | TypeCategory::Unknown => decode_text(row, idx),
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> CellValue {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return v.map_or(CellValue::Null, CellValue::Integer);
        }
        if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
            return v.map_or(CellValue::Null, CellValue::Unsigned);
        }
        // YEAR and BIT fail the driver's integer type check but decode fine
        if let Ok(v) = row.try_get_unchecked::<Option<i64>, _>(idx) {
            return v.map_or(CellValue::Null, CellValue::Integer);
        }
        decode_raw_text(row, idx)
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> CellValue {
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return v.map_or(CellValue::Null, CellValue::Float);
        }
        if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
            return v.map_or(CellValue::Null, |f| CellValue::Float(f64::from(f)));
        }
        decode_raw_text(row, idx)
    }

    fn decode_temporal(row: &MySqlRow, idx: usize) -> CellValue {
        // TIME first: chrono's NaiveTime drops the sign and rejects 24h or more
        if let Ok(v) = row.try_get::<Option<MySqlTime>, _>(idx) {
            return text_or_null(v.as_ref().map(format_time));
        }
        if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
            return text_or_null(v.map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()));
        }
        if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
            return text_or_null(v.map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()));
        }
        if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
            return text_or_null(v.map(|d| d.to_string()));
        }
        // Binary temporals have no text form to fall back on (zero dates land here)
        tracing::warn!(column = idx, "Failed to decode temporal column");
        CellValue::Null
    }

    /// MySQL's text form of a TIME value: `[-]HH:MM:SS[.ffffff]`, hours
    /// unbounded up to 838.
    pub(super) fn format_time(time: &MySqlTime) -> String {
        let sign = if time.is_negative() { "-" } else { "" };
        let mut text = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            time.hours(),
            time.minutes(),
            time.seconds()
        );
        if time.microseconds() != 0 {
            text.push_str(&format!(".{:06}", time.microseconds()));
        }
        text
    }

    fn decode_binary(row: &MySqlRow, idx: usize) -> CellValue {
        match row.try_get::<Option<Vec<u8>>, _>(idx) {
            Ok(v) => v.map_or(CellValue::Null, CellValue::Binary),
            Err(e) => {
                tracing::warn!(column = idx, error = %e, "Failed to decode binary column");
                CellValue::Null
            }
        }
    }

    fn decode_json(row: &MySqlRow, idx: usize) -> CellValue {
        if let Ok(v) = row.try_get::<Option<JsonValue>, _>(idx) {
            return v.map_or(CellValue::Null, CellValue::Json);
        }
        decode_text(row, idx)
    }

    fn decode_text(row: &MySqlRow, idx: usize) -> CellValue {
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return text_or_null(v);
        }
        decode_raw_text(row, idx)
    }

    /// Read the value's wire bytes without a type check.
    ///
    /// DECIMAL travels as text in both wire formats, so this recovers it
    /// without a dedicated decoder. Not for temporals, whose binary form is
    /// packed fields.
    fn decode_raw_text(row: &MySqlRow, idx: usize) -> CellValue {
        if let Ok(v) = row.try_get_unchecked::<Option<String>, _>(idx) {
            return text_or_null(v);
        }
        match row.try_get_unchecked::<Option<Vec<u8>>, _>(idx) {
            Ok(v) => v.map_or(CellValue::Null, CellValue::Binary),
            Err(e) => {
                tracing::warn!(column = idx, error = %e, "Failed to decode column");
                CellValue::Null
            }
        }
    }

    fn text_or_null(v: Option<String>) -> CellValue {
        v.map_or(CellValue::Null, CellValue::Text)
    }
}

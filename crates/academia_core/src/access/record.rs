//! Ordered field→value rows exchanged with callers.
//!
//! # Responsibility
//! - Carry one query row (or one entity) as column-name keyed values.
//! - Decode columns into typed Rust values with precise errors.
//!
//! # Invariants
//! - Field order is insertion order; re-inserting a name replaces in place.
//! - Dates travel as ISO `YYYY-MM-DD` text, booleans as `0`/`1` integers.

use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RecordResult<T> = Result<T, RecordError>;

/// Decode failure when turning a [`Record`] into a typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    MissingField(String),
    InvalidField { field: String, message: String },
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field `{field}`"),
            Self::InvalidField { field, message } => {
                write!(f, "invalid field `{field}`: {message}")
            }
        }
    }
}

impl Error for RecordError {}

/// One row as an ordered mapping from column name to SQLite value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }

    fn required(&self, name: &str) -> RecordResult<&Value> {
        self.get(name)
            .ok_or_else(|| RecordError::MissingField(name.to_string()))
    }

    pub fn get_i64(&self, name: &str) -> RecordResult<i64> {
        self.get_opt_i64(name)?
            .ok_or_else(|| invalid(name, "expected integer, found NULL"))
    }

    pub fn get_opt_i64(&self, name: &str) -> RecordResult<Option<i64>> {
        match self.required(name)? {
            Value::Null => Ok(None),
            Value::Integer(value) => Ok(Some(*value)),
            other => Err(invalid(name, format!("expected integer, found {other:?}"))),
        }
    }

    pub fn get_f64(&self, name: &str) -> RecordResult<f64> {
        self.get_opt_f64(name)?
            .ok_or_else(|| invalid(name, "expected real, found NULL"))
    }

    pub fn get_opt_f64(&self, name: &str) -> RecordResult<Option<f64>> {
        match self.required(name)? {
            Value::Null => Ok(None),
            Value::Real(value) => Ok(Some(*value)),
            Value::Integer(value) => Ok(Some(*value as f64)),
            other => Err(invalid(name, format!("expected real, found {other:?}"))),
        }
    }

    pub fn get_text(&self, name: &str) -> RecordResult<String> {
        self.get_opt_text(name)?
            .ok_or_else(|| invalid(name, "expected text, found NULL"))
    }

    pub fn get_opt_text(&self, name: &str) -> RecordResult<Option<String>> {
        match self.required(name)? {
            Value::Null => Ok(None),
            Value::Text(value) => Ok(Some(value.clone())),
            other => Err(invalid(name, format!("expected text, found {other:?}"))),
        }
    }

    pub fn get_bool(&self, name: &str) -> RecordResult<bool> {
        match self.get_i64(name)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(invalid(name, format!("expected 0 or 1, found {other}"))),
        }
    }

    pub fn get_date(&self, name: &str) -> RecordResult<NaiveDate> {
        self.get_opt_date(name)?
            .ok_or_else(|| invalid(name, "expected date, found NULL"))
    }

    pub fn get_opt_date(&self, name: &str) -> RecordResult<Option<NaiveDate>> {
        match self.get_opt_text(name)? {
            Some(text) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map(Some)
                .map_err(|err| invalid(name, format!("`{text}` is not a YYYY-MM-DD date: {err}"))),
            None => Ok(None),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            match value {
                Value::Null => map.serialize_entry(name, &Option::<()>::None)?,
                Value::Integer(v) => map.serialize_entry(name, v)?,
                Value::Real(v) => map.serialize_entry(name, v)?,
                Value::Text(v) => map.serialize_entry(name, v)?,
                Value::Blob(v) => map.serialize_entry(name, v)?,
            }
        }
        map.end()
    }
}

/// Encodes a date as storage text.
pub fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format(DATE_FORMAT).to_string())
}

/// Encodes an optional date as storage text or NULL.
pub fn opt_date_value(date: Option<NaiveDate>) -> Value {
    date.map_or(Value::Null, date_value)
}

fn invalid(name: &str, message: impl Into<String>) -> RecordError {
    RecordError::InvalidField {
        field: name.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{date_value, Record, RecordError};
    use chrono::NaiveDate;
    use rusqlite::types::Value;

    #[test]
    fn insert_keeps_order_and_replaces_in_place() {
        let mut record = Record::new().with("b", 1_i64).with("a", "x".to_string());
        record.insert("b", 2_i64);

        let columns: Vec<&str> = record.columns().collect();
        assert_eq!(columns, vec!["b", "a"]);
        assert_eq!(record.get("b"), Some(&Value::Integer(2)));
    }

    #[test]
    fn typed_getters_report_missing_and_mistyped_fields() {
        let record = Record::new()
            .with("n", "text".to_string())
            .with("d", date_value(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));

        assert_eq!(
            record.get_i64("missing").unwrap_err(),
            RecordError::MissingField("missing".to_string())
        );
        assert!(matches!(
            record.get_i64("n").unwrap_err(),
            RecordError::InvalidField { .. }
        ));
        assert_eq!(
            record.get_date("d").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let record = Record::new()
            .with("id", 7_i64)
            .with("nombre", "Ana".to_string())
            .with("nota", Value::Null);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":7,"nombre":"Ana","nota":null}"#);
    }
}

//! Academic-records domain model.
//!
//! # Responsibility
//! - Define plain records for every persisted entity.
//! - Map each record to and from its storage [`Record`] shape.
//! - Decide whether a record is persistable before any SQL runs.
//!
//! # Invariants
//! - `E::from_record(&e.to_record()) == e` for every entity.
//! - Surrogate keys are `None` until SQLite assigns them.
//! - Enumerated columns are closed enums in memory.

use crate::access::{Record, RecordResult};
use rusqlite::types::Value;
use std::fmt::Debug;

pub mod calendar_event;
pub mod career;
pub mod enrollment;
pub mod prerequisite;
pub mod state;
pub mod student;
pub mod subject;
pub mod validation;
pub mod work;

pub type CareerId = i64;
pub type SubjectId = i64;
pub type AxisId = i64;
pub type ActivityTypeId = i64;
pub type ActivityId = i64;
pub type StudentId = i64;
pub type EventId = i64;

/// Primary-key shape of an entity.
pub trait EntityKey: Copy + Debug {
    fn to_values(self) -> Vec<Value>;

    /// Key for a row whose identity SQLite generated; `None` for natural
    /// (composite) keys.
    fn from_rowid(rowid: i64) -> Option<Self>;

    fn describe(self) -> String {
        format!("{self:?}")
    }
}

impl EntityKey for i64 {
    fn to_values(self) -> Vec<Value> {
        vec![Value::Integer(self)]
    }

    fn from_rowid(rowid: i64) -> Option<Self> {
        Some(rowid)
    }

    fn describe(self) -> String {
        self.to_string()
    }
}

impl EntityKey for (i64, i64) {
    fn to_values(self) -> Vec<Value> {
        vec![Value::Integer(self.0), Value::Integer(self.1)]
    }

    fn from_rowid(_rowid: i64) -> Option<Self> {
        None
    }

    fn describe(self) -> String {
        format!("({}, {})", self.0, self.1)
    }
}

/// Persisted entity: storage mapping plus persistability rules.
pub trait Entity: Sized {
    type Key: EntityKey;

    /// Human-readable name used in errors and logs.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Primary-key columns, in [`EntityKey::to_values`] order.
    const KEY_COLUMNS: &'static [&'static str];
    /// Whether SQLite generates the key on insert.
    const GENERATED_KEY: bool;

    /// `None` for surrogate keys not yet assigned.
    fn key(&self) -> Option<Self::Key>;

    fn to_record(&self) -> Record;

    fn from_record(record: &Record) -> RecordResult<Self>;

    fn validate(&self) -> Result<(), validation::ValidationError>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

pub(crate) fn opt_text_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

pub(crate) fn opt_id_value(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

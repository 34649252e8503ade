//! Derived, read-only projections over the schema views.
//!
//! # Responsibility
//! - Turn view rows into typed, serializable structs for the GUI and CLI.
//! - Keep every derived rule (eligibility, progress, overdue) in SQL views
//!   or in a single query next to its typed result.
//!
//! # Invariants
//! - Nothing in this module writes.
//! - Functions that depend on "today" take it as an argument; only the raw
//!   views read the local clock.

use crate::access::{Record, RecordError, RecordResult};
use crate::repo::RepoResult;

pub mod activities;
pub mod calendar;
pub mod dashboard;
pub mod eligibility;
pub mod progress;

fn decode_rows<T>(
    records: Vec<Record>,
    decode: impl Fn(&Record) -> RecordResult<T>,
) -> RepoResult<Vec<T>> {
    Ok(records.iter().map(decode).collect::<RecordResult<Vec<_>>>()?)
}

fn parse_column<T>(
    record: &Record,
    column: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> RecordResult<T> {
    let raw = record.get_text(column)?;
    parse(&raw).ok_or_else(|| RecordError::InvalidField {
        field: column.to_string(),
        message: format!("unexpected value `{raw}`"),
    })
}

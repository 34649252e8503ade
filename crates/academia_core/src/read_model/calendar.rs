//! Unified agenda of activity dates and institutional events.
//!
//! An activity whose start and due dates differ contributes a start entry
//! and an end entry; an activity with a single date contributes one entry;
//! each calendar event contributes one entry.

use super::{decode_rows, parse_column};
use crate::access::{date_value, run_query, Record, RecordResult};
use crate::repo::RepoResult;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgendaOrigin {
    Activity,
    Event,
}

impl AgendaOrigin {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "actividad" => Some(Self::Activity),
            "evento" => Some(Self::Event),
            _ => None,
        }
    }
}

/// Which date of the source row an entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgendaMarker {
    Start,
    End,
    Single,
    Event,
}

impl AgendaMarker {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "inicio" => Some(Self::Start),
            "fin" => Some(Self::End),
            "unica" => Some(Self::Single),
            "evento" => Some(Self::Event),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgendaEntry {
    /// Activity id or event id, depending on `origin`.
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub origin: AgendaOrigin,
    pub marker: AgendaMarker,
    /// Activity-type short code, or the event kind.
    pub kind: Option<String>,
    pub affects_activities: bool,
}

impl AgendaEntry {
    fn from_record(record: &Record) -> RecordResult<Self> {
        Ok(Self {
            id: record.get_i64("id")?,
            title: record.get_text("titulo")?,
            date: record.get_date("fecha")?,
            start_date: record.get_opt_date("fecha_inicio")?,
            end_date: record.get_opt_date("fecha_fin")?,
            origin: parse_column(record, "origen", AgendaOrigin::parse)?,
            marker: parse_column(record, "marca", AgendaMarker::parse)?,
            kind: record.get_opt_text("tipo")?,
            affects_activities: record.get_bool("afecta_actividades")?,
        })
    }
}

/// Agenda entries dated inside `range`, plus events that overlap it.
///
/// Ordered by date, activities before events on the same day.
pub fn agenda(conn: &Connection, range: RangeInclusive<NaiveDate>) -> RepoResult<Vec<AgendaEntry>> {
    let (from, to) = range.into_inner();
    if from > to {
        return Ok(Vec::new());
    }
    let records = run_query(
        conn,
        "SELECT * FROM v_calendario_unificado
         WHERE fecha BETWEEN ?1 AND ?2
            OR (origen = 'evento' AND fecha_inicio <= ?2 AND fecha_fin >= ?1)
         ORDER BY fecha, origen, id, marca DESC;",
        &[date_value(from), date_value(to)],
    )?;
    decode_rows(records, AgendaEntry::from_record)
}

//! Per-student activity counters.
//!
//! `overdue` is the read-time count (due date passed, no submission date);
//! `recorded_overdue` counts rows whose stored state is overdue. The two
//! disagree until a caller sweeps stored state, so both are reported.

use crate::access::{date_value, run_query_one, Record, RecordResult};
use crate::model::StudentId;
use crate::repo::RepoResult;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub student_id: StudentId,
    pub student: String,
    pub total: i64,
    pub submitted: i64,
    pub pending: i64,
    pub overdue: i64,
    pub recorded_overdue: i64,
}

impl Dashboard {
    fn from_record(record: &Record) -> RecordResult<Self> {
        Ok(Self {
            student_id: record.get_i64("id_estudiante")?,
            student: record.get_text("estudiante")?,
            total: record.get_i64("total")?,
            submitted: record.get_i64("entregadas")?,
            pending: record.get_i64("pendientes")?,
            overdue: record.get_i64("vencidas")?,
            recorded_overdue: record.get_i64("vencidas_registradas")?,
        })
    }
}

/// Counters evaluated at `today`. `None` for an unknown student.
pub fn dashboard_as_of(
    conn: &Connection,
    student_id: StudentId,
    today: NaiveDate,
) -> RepoResult<Option<Dashboard>> {
    let record = run_query_one(
        conn,
        "SELECT
            e.id_estudiante,
            e.nombre AS estudiante,
            COUNT(ea.id_actividad) AS total,
            COALESCE(SUM(CASE WHEN ea.estado = 'entregada' THEN 1 ELSE 0 END), 0) AS entregadas,
            COALESCE(SUM(CASE WHEN ea.estado IN ('pendiente', 'en_progreso') THEN 1 ELSE 0 END), 0)
                AS pendientes,
            COALESCE(SUM(
                CASE WHEN ea.fecha_entrega IS NULL AND a.fecha_fin < ?2 THEN 1 ELSE 0 END
            ), 0) AS vencidas,
            COALESCE(SUM(CASE WHEN ea.estado = 'vencida' THEN 1 ELSE 0 END), 0) AS vencidas_registradas
         FROM estudiante e
         LEFT JOIN estudiante_actividad ea ON ea.id_estudiante = e.id_estudiante
         LEFT JOIN actividad a ON a.id_actividad = ea.id_actividad
         WHERE e.id_estudiante = ?1
         GROUP BY e.id_estudiante, e.nombre;",
        &[Value::Integer(student_id), date_value(today)],
    )?;
    Ok(record.as_ref().map(Dashboard::from_record).transpose()?)
}

/// Counters evaluated against the local clock (`v_dashboard_estudiante`).
pub fn dashboard(conn: &Connection, student_id: StudentId) -> RepoResult<Option<Dashboard>> {
    let record = run_query_one(
        conn,
        "SELECT * FROM v_dashboard_estudiante WHERE id_estudiante = ?1;",
        &[Value::Integer(student_id)],
    )?;
    Ok(record.as_ref().map(Dashboard::from_record).transpose()?)
}

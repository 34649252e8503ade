//! Per-student activity lists and per-subject activity counts.

use super::{decode_rows, parse_column};
use crate::access::{date_value, run_query, Record, RecordError, RecordResult};
use crate::model::state::ActivityState;
use crate::model::work::Priority;
use crate::model::{ActivityId, ActivityTypeId, AxisId, CareerId, StudentId, SubjectId};
use crate::repo::RepoResult;
use chrono::{Days, NaiveDate};
use rusqlite::types::Value;
use rusqlite::Connection;
use serde::Serialize;

/// One activity assigned to a student, with its subject context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentActivity {
    pub student_id: StudentId,
    pub activity_id: ActivityId,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub state: ActivityState,
    pub submitted_on: Option<NaiveDate>,
    pub axis_id: AxisId,
    pub axis: String,
    pub subject_id: SubjectId,
    pub subject_code: String,
    pub subject: String,
    pub career_id: CareerId,
    pub activity_type_id: ActivityTypeId,
    pub type_code: String,
    pub priority: Priority,
}

impl StudentActivity {
    fn from_record(record: &Record) -> RecordResult<Self> {
        let raw_priority = record.get_i64("prioridad")?;
        Ok(Self {
            student_id: record.get_i64("id_estudiante")?,
            activity_id: record.get_i64("id_actividad")?,
            title: record.get_text("titulo")?,
            description: record.get_opt_text("descripcion")?,
            start_date: record.get_opt_date("fecha_inicio")?,
            due_date: record.get_opt_date("fecha_fin")?,
            state: parse_column(record, "estado", ActivityState::parse)?,
            submitted_on: record.get_opt_date("fecha_entrega")?,
            axis_id: record.get_i64("id_eje")?,
            axis: record.get_text("eje")?,
            subject_id: record.get_i64("id_asignatura")?,
            subject_code: record.get_text("codigo_asignatura")?,
            subject: record.get_text("asignatura")?,
            career_id: record.get_i64("id_carrera")?,
            activity_type_id: record.get_i64("id_tipo_actividad")?,
            type_code: record.get_text("tipo")?,
            priority: Priority::from_i64(raw_priority).ok_or_else(|| RecordError::InvalidField {
                field: "prioridad".to_string(),
                message: format!("unexpected value `{raw_priority}`"),
            })?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectActivityCount {
    pub subject_id: SubjectId,
    pub code: String,
    pub subject: String,
    pub career_id: CareerId,
    pub total: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

const ORDER_BY_DUE: &str = "ORDER BY fecha_fin IS NULL, fecha_fin, prioridad DESC, id_actividad";

/// Stored pending / in-progress activities, soonest due first.
pub fn pending(conn: &Connection, student_id: StudentId) -> RepoResult<Vec<StudentActivity>> {
    let sql = format!("SELECT * FROM v_actividades_pendientes WHERE id_estudiante = ?1 {ORDER_BY_DUE};");
    decode_rows(
        run_query(conn, &sql, &[Value::Integer(student_id)])?,
        StudentActivity::from_record,
    )
}

/// Read-time overdue at `today`: due date passed and nothing submitted,
/// whatever the stored state says.
pub fn overdue_as_of(
    conn: &Connection,
    student_id: StudentId,
    today: NaiveDate,
) -> RepoResult<Vec<StudentActivity>> {
    let sql = format!(
        "SELECT * FROM v_actividades_estudiante
         WHERE id_estudiante = ?1
           AND fecha_entrega IS NULL
           AND fecha_fin IS NOT NULL
           AND fecha_fin < ?2
         {ORDER_BY_DUE};"
    );
    decode_rows(
        run_query(conn, &sql, &[Value::Integer(student_id), date_value(today)])?,
        StudentActivity::from_record,
    )
}

/// Unsubmitted activities due in `[today, today + days]`.
pub fn due_within(
    conn: &Connection,
    student_id: StudentId,
    today: NaiveDate,
    days: u32,
) -> RepoResult<Vec<StudentActivity>> {
    let until = today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    let sql = format!(
        "SELECT * FROM v_actividades_estudiante
         WHERE id_estudiante = ?1
           AND fecha_entrega IS NULL
           AND fecha_fin BETWEEN ?2 AND ?3
         {ORDER_BY_DUE};"
    );
    decode_rows(
        run_query(
            conn,
            &sql,
            &[Value::Integer(student_id), date_value(today), date_value(until)],
        )?,
        StudentActivity::from_record,
    )
}

/// Activity totals and date span per subject, including subjects with none.
pub fn by_subject(conn: &Connection) -> RepoResult<Vec<SubjectActivityCount>> {
    let records = run_query(
        conn,
        "SELECT * FROM v_actividades_por_asignatura ORDER BY codigo;",
        &[],
    )?;
    decode_rows(records, |record| {
        Ok(SubjectActivityCount {
            subject_id: record.get_i64("id_asignatura")?,
            code: record.get_text("codigo")?,
            subject: record.get_text("asignatura")?,
            career_id: record.get_i64("id_carrera")?,
            total: record.get_i64("total_actividades")?,
            first_date: record.get_opt_date("primera_fecha")?,
            last_date: record.get_opt_date("ultima_fecha")?,
        })
    })
}

/// [`overdue_as_of`] against the local clock (`v_actividades_vencidas`).
pub fn overdue(conn: &Connection, student_id: StudentId) -> RepoResult<Vec<StudentActivity>> {
    let sql = format!("SELECT * FROM v_actividades_vencidas WHERE id_estudiante = ?1 {ORDER_BY_DUE};");
    decode_rows(
        run_query(conn, &sql, &[Value::Integer(student_id)])?,
        StudentActivity::from_record,
    )
}

/// [`due_within`] seven days against the local clock (`v_actividades_semana`).
pub fn this_week(conn: &Connection, student_id: StudentId) -> RepoResult<Vec<StudentActivity>> {
    let sql = format!("SELECT * FROM v_actividades_semana WHERE id_estudiante = ?1 {ORDER_BY_DUE};");
    decode_rows(
        run_query(conn, &sql, &[Value::Integer(student_id)])?,
        StudentActivity::from_record,
    )
}

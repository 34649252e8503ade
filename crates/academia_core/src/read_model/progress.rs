//! Career progress per student, per-career health and the academic summary.

use super::{decode_rows, parse_column};
use crate::access::{run_query, run_query_one, Record, RecordResult};
use crate::model::state::CareerState;
use crate::model::{CareerId, StudentId};
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Connection;
use serde::Serialize;

/// Average-progress band of a career.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerHealth {
    /// Average progress ≥ 70 %.
    Active,
    /// Average progress ≥ 40 %.
    Regular,
    AtRisk,
}

impl CareerHealth {
    pub fn from_average(average_percent: f64) -> Self {
        if average_percent >= 70.0 {
            Self::Active
        } else if average_percent >= 40.0 {
            Self::Regular
        } else {
            Self::AtRisk
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Activo",
            Self::Regular => "Regular",
            Self::AtRisk => "En riesgo",
        }
    }

    fn parse_label(value: &str) -> Option<Self> {
        [Self::Active, Self::Regular, Self::AtRisk]
            .into_iter()
            .find(|health| health.label() == value)
    }
}

/// Progress of one student in one enrolled career.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerProgress {
    pub student_id: StudentId,
    pub student: String,
    pub career_id: CareerId,
    pub career: String,
    pub state: CareerState,
    pub total_subjects: i64,
    pub passed_subjects: i64,
    pub passed_credits: i64,
    /// Passed / total × 100, rounded to two decimals; 0 for empty careers.
    pub percent: f64,
}

impl CareerProgress {
    fn from_record(record: &Record) -> RecordResult<Self> {
        Ok(Self {
            student_id: record.get_i64("id_estudiante")?,
            student: record.get_text("estudiante")?,
            career_id: record.get_i64("id_carrera")?,
            career: record.get_text("carrera")?,
            state: parse_column(record, "estado", CareerState::parse)?,
            total_subjects: record.get_i64("total_asignaturas")?,
            passed_subjects: record.get_i64("asignaturas_aprobadas")?,
            passed_credits: record.get_i64("creditos_aprobados")?,
            percent: record.get_f64("porcentaje_avance")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerOverview {
    pub career_id: CareerId,
    pub code: Option<String>,
    pub career: String,
    pub students: i64,
    /// 0 when nobody is enrolled.
    pub average_progress: f64,
    pub health: CareerHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcademicSummary {
    pub student_id: StudentId,
    pub student: String,
    pub email: String,
    pub careers: i64,
    pub principal_career: Option<String>,
    pub subjects_in_progress: i64,
    pub subjects_passed: i64,
    pub subjects_failed: i64,
    pub passed_credits: i64,
    /// Mean final grade over graded subjects; `None` before the first grade.
    pub grade_average: Option<f64>,
}

pub fn career_progress(conn: &Connection, student_id: StudentId) -> RepoResult<Vec<CareerProgress>> {
    let records = run_query(
        conn,
        "SELECT * FROM v_progreso_estudiante
         WHERE id_estudiante = ?1
         ORDER BY carrera, id_carrera;",
        &[Value::Integer(student_id)],
    )?;
    decode_rows(records, CareerProgress::from_record)
}

/// Every career with its enrolled-student count and average progress.
pub fn career_overview(conn: &Connection) -> RepoResult<Vec<CareerOverview>> {
    let records = run_query(
        conn,
        "SELECT * FROM v_progreso_carrera ORDER BY carrera, id_carrera;",
        &[],
    )?;
    decode_rows(records, |record| {
        Ok(CareerOverview {
            career_id: record.get_i64("id_carrera")?,
            code: record.get_opt_text("codigo")?,
            career: record.get_text("carrera")?,
            students: record.get_i64("estudiantes")?,
            average_progress: record.get_f64("promedio_avance")?,
            health: parse_column(record, "estado_avance", CareerHealth::parse_label)?,
        })
    })
}

pub fn academic_summary(conn: &Connection, student_id: StudentId) -> RepoResult<Option<AcademicSummary>> {
    let record = run_query_one(
        conn,
        "SELECT * FROM v_resumen_academico WHERE id_estudiante = ?1;",
        &[Value::Integer(student_id)],
    )?;
    let Some(record) = record else {
        return Ok(None);
    };
    Ok(Some(AcademicSummary {
        student_id: record.get_i64("id_estudiante")?,
        student: record.get_text("estudiante")?,
        email: record.get_text("correo")?,
        careers: record.get_i64("carreras")?,
        principal_career: record.get_opt_text("carrera_principal")?,
        subjects_in_progress: record.get_i64("asignaturas_cursando")?,
        subjects_passed: record.get_i64("asignaturas_aprobadas")?,
        subjects_failed: record.get_i64("asignaturas_reprobadas")?,
        passed_credits: record.get_i64("creditos_aprobados")?,
        grade_average: record.get_opt_f64("promedio_notas")?,
    }))
}

//! Which subjects a student may take next.
//!
//! Eligibility looks one hop back only: a subject is eligible when each of
//! its direct prerequisites is passed. Scope is the subjects of careers the
//! student is enrolled in; passed subjects are never listed.

use super::{decode_rows, parse_column};
use crate::access::{run_query, run_query_one, Record, RecordResult};
use crate::model::{CareerId, StudentId, SubjectId};
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityReason {
    NoPrerequisites,
    PrerequisitesPassed,
}

impl EligibilityReason {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "sin_prerrequisitos" => Some(Self::NoPrerequisites),
            "prerrequisitos_aprobados" => Some(Self::PrerequisitesPassed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibleSubject {
    pub subject_id: SubjectId,
    pub code: String,
    pub name: String,
    pub credits: i64,
    pub semester: Option<i64>,
    pub career_id: CareerId,
    pub reason: EligibilityReason,
}

impl EligibleSubject {
    fn from_record(record: &Record) -> RecordResult<Self> {
        Ok(Self {
            subject_id: record.get_i64("id_asignatura")?,
            code: record.get_text("codigo")?,
            name: record.get_text("nombre")?,
            credits: record.get_i64("creditos")?,
            semester: record.get_opt_i64("semestre")?,
            career_id: record.get_i64("id_carrera")?,
            reason: parse_column(record, "motivo", EligibilityReason::parse)?,
        })
    }
}

/// A prerequisite the student still has to pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingPrerequisite {
    pub subject_id: SubjectId,
    pub code: String,
    pub name: String,
}

/// Subject blocked by at least one unpassed prerequisite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedSubject {
    pub subject_id: SubjectId,
    pub code: String,
    pub name: String,
    pub career_id: CareerId,
    pub missing: Vec<MissingPrerequisite>,
}

pub fn eligible_subjects(conn: &Connection, student_id: StudentId) -> RepoResult<Vec<EligibleSubject>> {
    let records = run_query(
        conn,
        "SELECT * FROM v_asignaturas_elegibles
         WHERE id_estudiante = ?1
         ORDER BY semestre IS NULL, semestre, codigo;",
        &[Value::Integer(student_id)],
    )?;
    decode_rows(records, EligibleSubject::from_record)
}

/// Blocked subjects, each with the list of prerequisites still missing.
pub fn blocked_subjects(conn: &Connection, student_id: StudentId) -> RepoResult<Vec<BlockedSubject>> {
    let records = run_query(
        conn,
        "SELECT * FROM v_asignaturas_bloqueadas
         WHERE id_estudiante = ?1
         ORDER BY codigo, id_asignatura, codigo_prerrequisito;",
        &[Value::Integer(student_id)],
    )?;

    let mut blocked: Vec<BlockedSubject> = Vec::new();
    for record in &records {
        let subject_id = record.get_i64("id_asignatura")?;
        let missing = MissingPrerequisite {
            subject_id: record.get_i64("id_prerrequisito")?,
            code: record.get_text("codigo_prerrequisito")?,
            name: record.get_text("prerrequisito")?,
        };
        match blocked.last_mut() {
            Some(current) if current.subject_id == subject_id => current.missing.push(missing),
            _ => blocked.push(BlockedSubject {
                subject_id,
                code: record.get_text("codigo")?,
                name: record.get_text("nombre")?,
                career_id: record.get_i64("id_carrera")?,
                missing: vec![missing],
            }),
        }
    }
    Ok(blocked)
}

pub fn is_eligible(conn: &Connection, student_id: StudentId, subject_id: SubjectId) -> RepoResult<bool> {
    let found = run_query_one(
        conn,
        "SELECT EXISTS (
            SELECT 1 FROM v_asignaturas_elegibles
            WHERE id_estudiante = ?1 AND id_asignatura = ?2
         ) AS found;",
        &[Value::Integer(student_id), Value::Integer(subject_id)],
    )?
    .map(|record| record.get_bool("found"))
    .transpose()?;
    Ok(found.unwrap_or(false))
}

/// Direct prerequisites of `subject_id` the student has not passed,
/// regardless of career enrollment.
pub fn unmet_prerequisites(
    conn: &Connection,
    student_id: StudentId,
    subject_id: SubjectId,
) -> RepoResult<Vec<MissingPrerequisite>> {
    let records = run_query(
        conn,
        "SELECT req.id_asignatura, req.codigo, req.nombre
         FROM prerrequisito p
         INNER JOIN asignatura req ON req.id_asignatura = p.id_asignatura_prerrequisito
         WHERE p.id_asignatura = ?2
           AND NOT EXISTS (
                SELECT 1
                FROM estudiante_asignatura ea
                WHERE ea.id_estudiante = ?1
                  AND ea.id_asignatura = p.id_asignatura_prerrequisito
                  AND ea.estado = 'aprobada'
           )
         ORDER BY req.codigo;",
        &[Value::Integer(student_id), Value::Integer(subject_id)],
    )?;
    decode_rows(records, |record| {
        Ok(MissingPrerequisite {
            subject_id: record.get_i64("id_asignatura")?,
            code: record.get_text("codigo")?,
            name: record.get_text("nombre")?,
        })
    })
}

//! Students and their registrations: careers, subject progress and
//! activity progress.
//!
//! # Responsibility
//! - CRUD for students and the three composite-key registration tables.
//! - Atomic principal-career switch.
//! - Prerequisite check used before a subject is started.
//!
//! # Invariants
//! - At most one principal career per student after
//!   [`StudentRepository::set_principal_career`].
//! - A second registration for the same pair is a constraint violation,
//!   never an overwrite.

use super::entity_store::{EntityStore, RepoError, RepoResult};
use crate::access::{date_value, run_mutation, run_mutations, run_query, Statement};
use crate::model::enrollment::{ActivityProgress, CareerEnrollment, SubjectProgress};
use crate::model::student::Student;
use crate::model::{ActivityId, CareerId, Entity, StudentId, SubjectId};
use chrono::NaiveDate;
use log::info;
use rusqlite::types::Value;
use rusqlite::Connection;

/// Repository interface for students and their registrations.
pub trait StudentRepository {
    fn create_student(&self, student: &Student) -> RepoResult<StudentId>;
    fn update_student(&self, student: &Student) -> RepoResult<()>;
    fn delete_student(&self, id: StudentId) -> RepoResult<()>;
    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>>;
    /// Exact match on the stored email.
    fn student_by_email(&self, email: &str) -> RepoResult<Option<Student>>;
    fn list_students(&self) -> RepoResult<Vec<Student>>;

    fn enroll_career(&self, enrollment: &CareerEnrollment) -> RepoResult<()>;
    fn update_career_enrollment(&self, enrollment: &CareerEnrollment) -> RepoResult<()>;
    fn career_enrollment(
        &self,
        student_id: StudentId,
        career_id: CareerId,
    ) -> RepoResult<Option<CareerEnrollment>>;
    /// Principal career first.
    fn career_enrollments(&self, student_id: StudentId) -> RepoResult<Vec<CareerEnrollment>>;
    /// Clears the flag on every other career of the student in the same
    /// transaction.
    fn set_principal_career(&self, student_id: StudentId, career_id: CareerId) -> RepoResult<()>;

    fn register_subject(&self, progress: &SubjectProgress) -> RepoResult<()>;
    fn update_subject_progress(&self, progress: &SubjectProgress) -> RepoResult<()>;
    fn subject_progress(
        &self,
        student_id: StudentId,
        subject_id: SubjectId,
    ) -> RepoResult<Option<SubjectProgress>>;
    fn subject_progress_for(&self, student_id: StudentId) -> RepoResult<Vec<SubjectProgress>>;

    fn assign_activity(&self, progress: &ActivityProgress) -> RepoResult<()>;
    fn update_activity_progress(&self, progress: &ActivityProgress) -> RepoResult<()>;
    fn activity_progress(
        &self,
        student_id: StudentId,
        activity_id: ActivityId,
    ) -> RepoResult<Option<ActivityProgress>>;
    fn activity_progress_for(&self, student_id: StudentId) -> RepoResult<Vec<ActivityProgress>>;
    /// Stores the overdue state on every open (pending / in-progress)
    /// registration whose activity was due before `today` and has no
    /// submission date. One conditional statement: a row submitted by
    /// another connection is never touched. Returns the rows changed.
    fn mark_past_due_overdue(&self, today: NaiveDate) -> RepoResult<usize>;

    /// Direct prerequisites of `subject_id` the student has not passed.
    fn unmet_prerequisites(
        &self,
        student_id: StudentId,
        subject_id: SubjectId,
    ) -> RepoResult<Vec<SubjectId>>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn students(&self) -> EntityStore<'conn, Student> {
        EntityStore::new(self.conn)
    }

    fn careers(&self) -> EntityStore<'conn, CareerEnrollment> {
        EntityStore::new(self.conn)
    }

    fn subjects(&self) -> EntityStore<'conn, SubjectProgress> {
        EntityStore::new(self.conn)
    }

    fn activities(&self) -> EntityStore<'conn, ActivityProgress> {
        EntityStore::new(self.conn)
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn create_student(&self, student: &Student) -> RepoResult<StudentId> {
        self.students().insert(student)
    }

    fn update_student(&self, student: &Student) -> RepoResult<()> {
        self.students().update(student)
    }

    fn delete_student(&self, id: StudentId) -> RepoResult<()> {
        self.students().delete(id)
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Option<Student>> {
        self.students().get(id)
    }

    fn student_by_email(&self, email: &str) -> RepoResult<Option<Student>> {
        self.students()
            .find_where("correo = ?1", &[Value::Text(email.to_string())])
    }

    fn list_students(&self) -> RepoResult<Vec<Student>> {
        self.students().list_where("1 = 1", &[], "nombre, id_estudiante")
    }

    fn enroll_career(&self, enrollment: &CareerEnrollment) -> RepoResult<()> {
        self.careers().insert(enrollment).map(|_| ())
    }

    fn update_career_enrollment(&self, enrollment: &CareerEnrollment) -> RepoResult<()> {
        self.careers().update(enrollment)
    }

    fn career_enrollment(
        &self,
        student_id: StudentId,
        career_id: CareerId,
    ) -> RepoResult<Option<CareerEnrollment>> {
        self.careers().get((student_id, career_id))
    }

    fn career_enrollments(&self, student_id: StudentId) -> RepoResult<Vec<CareerEnrollment>> {
        self.careers().list_where(
            "id_estudiante = ?1",
            &[Value::Integer(student_id)],
            "es_carrera_principal DESC, id_carrera",
        )
    }

    fn set_principal_career(&self, student_id: StudentId, career_id: CareerId) -> RepoResult<()> {
        let key = (student_id, career_id);
        if !self.careers().exists(key)? {
            return Err(RepoError::not_found(CareerEnrollment::NAME, key));
        }

        run_mutations(
            self.conn,
            &[
                Statement::new(
                    "UPDATE estudiante_carrera SET es_carrera_principal = 0
                     WHERE id_estudiante = ?1 AND id_carrera <> ?2;",
                    vec![Value::Integer(student_id), Value::Integer(career_id)],
                ),
                Statement::new(
                    "UPDATE estudiante_carrera SET es_carrera_principal = 1
                     WHERE id_estudiante = ?1 AND id_carrera = ?2;",
                    vec![Value::Integer(student_id), Value::Integer(career_id)],
                ),
            ],
        )?;
        info!(
            "event=principal_career_set module=repo status=ok student={} career={}",
            student_id, career_id
        );
        Ok(())
    }

    fn register_subject(&self, progress: &SubjectProgress) -> RepoResult<()> {
        self.subjects().insert(progress).map(|_| ())
    }

    fn update_subject_progress(&self, progress: &SubjectProgress) -> RepoResult<()> {
        self.subjects().update(progress)
    }

    fn subject_progress(
        &self,
        student_id: StudentId,
        subject_id: SubjectId,
    ) -> RepoResult<Option<SubjectProgress>> {
        self.subjects().get((student_id, subject_id))
    }

    fn subject_progress_for(&self, student_id: StudentId) -> RepoResult<Vec<SubjectProgress>> {
        self.subjects().list_where(
            "id_estudiante = ?1",
            &[Value::Integer(student_id)],
            "id_asignatura",
        )
    }

    fn assign_activity(&self, progress: &ActivityProgress) -> RepoResult<()> {
        self.activities().insert(progress).map(|_| ())
    }

    fn update_activity_progress(&self, progress: &ActivityProgress) -> RepoResult<()> {
        self.activities().update(progress)
    }

    fn activity_progress(
        &self,
        student_id: StudentId,
        activity_id: ActivityId,
    ) -> RepoResult<Option<ActivityProgress>> {
        self.activities().get((student_id, activity_id))
    }

    fn activity_progress_for(&self, student_id: StudentId) -> RepoResult<Vec<ActivityProgress>> {
        self.activities().list_where(
            "id_estudiante = ?1",
            &[Value::Integer(student_id)],
            "id_actividad",
        )
    }

    fn mark_past_due_overdue(&self, today: NaiveDate) -> RepoResult<usize> {
        let outcome = run_mutation(
            self.conn,
            "UPDATE estudiante_actividad
             SET estado = 'vencida'
             WHERE estado IN ('pendiente', 'en_progreso')
               AND fecha_entrega IS NULL
               AND id_actividad IN (
                    SELECT id_actividad
                    FROM actividad
                    WHERE fecha_fin IS NOT NULL
                      AND fecha_fin < ?1
               );",
            &[date_value(today)],
        )?;
        Ok(outcome.rows_affected)
    }

    fn unmet_prerequisites(
        &self,
        student_id: StudentId,
        subject_id: SubjectId,
    ) -> RepoResult<Vec<SubjectId>> {
        let records = run_query(
            self.conn,
            "SELECT p.id_asignatura_prerrequisito AS id
             FROM prerrequisito p
             WHERE p.id_asignatura = ?2
               AND NOT EXISTS (
                    SELECT 1
                    FROM estudiante_asignatura ea
                    WHERE ea.id_estudiante = ?1
                      AND ea.id_asignatura = p.id_asignatura_prerrequisito
                      AND ea.estado = 'aprobada'
               )
             ORDER BY p.id_asignatura_prerrequisito;",
            &[Value::Integer(student_id), Value::Integer(subject_id)],
        )?;
        records
            .iter()
            .map(|record| record.get_i64("id").map_err(RepoError::from))
            .collect()
    }
}

//! Prerequisite edges between subjects.

use super::entity_store::{decode_all, EntityStore, RepoResult};
use crate::access::run_query;
use crate::model::prerequisite::Prerequisite;
use crate::model::subject::Subject;
use crate::model::SubjectId;
use log::info;
use rusqlite::types::Value;
use rusqlite::Connection;

pub trait PrerequisiteRepository {
    /// Rejects self-edges before any SQL runs; duplicates fail on the key.
    fn add_prerequisite(&self, edge: &Prerequisite) -> RepoResult<()>;
    fn remove_prerequisite(&self, edge: &Prerequisite) -> RepoResult<()>;
    fn has_prerequisite(&self, edge: &Prerequisite) -> RepoResult<bool>;
    /// Subjects that must be passed before `subject_id`.
    fn required_for(&self, subject_id: SubjectId) -> RepoResult<Vec<Subject>>;
    /// Subjects that list `subject_id` as a prerequisite.
    fn dependents_of(&self, subject_id: SubjectId) -> RepoResult<Vec<Subject>>;
    fn list_prerequisites(&self) -> RepoResult<Vec<Prerequisite>>;
}

pub struct SqlitePrerequisiteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePrerequisiteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn edges(&self) -> EntityStore<'conn, Prerequisite> {
        EntityStore::new(self.conn)
    }

    fn subjects_joined(&self, join_on: &str, filter: &str, subject_id: SubjectId) -> RepoResult<Vec<Subject>> {
        let sql = format!(
            "SELECT a.*
             FROM prerrequisito p
             INNER JOIN asignatura a ON a.id_asignatura = p.{join_on}
             WHERE p.{filter} = ?1
             ORDER BY a.codigo;"
        );
        decode_all(run_query(self.conn, &sql, &[Value::Integer(subject_id)])?)
    }
}

impl PrerequisiteRepository for SqlitePrerequisiteRepository<'_> {
    fn add_prerequisite(&self, edge: &Prerequisite) -> RepoResult<()> {
        self.edges().insert(edge)?;
        info!(
            "event=prerequisite_add module=repo status=ok subject={} requires={}",
            edge.subject_id, edge.required_subject_id
        );
        Ok(())
    }

    fn remove_prerequisite(&self, edge: &Prerequisite) -> RepoResult<()> {
        self.edges()
            .delete((edge.subject_id, edge.required_subject_id))
    }

    fn has_prerequisite(&self, edge: &Prerequisite) -> RepoResult<bool> {
        self.edges().exists((edge.subject_id, edge.required_subject_id))
    }

    fn required_for(&self, subject_id: SubjectId) -> RepoResult<Vec<Subject>> {
        self.subjects_joined("id_asignatura_prerrequisito", "id_asignatura", subject_id)
    }

    fn dependents_of(&self, subject_id: SubjectId) -> RepoResult<Vec<Subject>> {
        self.subjects_joined("id_asignatura", "id_asignatura_prerrequisito", subject_id)
    }

    fn list_prerequisites(&self) -> RepoResult<Vec<Prerequisite>> {
        self.edges().list()
    }
}

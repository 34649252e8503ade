//! Curriculum catalog: careers, subjects, thematic axes, activity types and
//! activities.
//!
//! # Responsibility
//! - Expose use-case lookups (by code, by parent) over the catalog tables.
//! - Delegate plain CRUD to [`EntityStore`].
//!
//! # Invariants
//! - Deleting a career/subject/axis cascades in storage; deleting an
//!   activity type still in use fails with a constraint violation.
//! - Axes list in display order, then by id.

use super::entity_store::{decode_all, EntityStore, RepoResult};
use crate::access::run_query;
use crate::model::career::Career;
use crate::model::subject::{Subject, ThematicAxis};
use crate::model::work::{Activity, ActivityType};
use crate::model::{ActivityId, ActivityTypeId, AxisId, CareerId, SubjectId};
use rusqlite::types::Value;
use rusqlite::Connection;

/// Repository interface for the curriculum catalog.
pub trait CatalogRepository {
    fn create_career(&self, career: &Career) -> RepoResult<CareerId>;
    fn update_career(&self, career: &Career) -> RepoResult<()>;
    fn delete_career(&self, id: CareerId) -> RepoResult<()>;
    fn get_career(&self, id: CareerId) -> RepoResult<Option<Career>>;
    fn list_careers(&self) -> RepoResult<Vec<Career>>;

    fn create_subject(&self, subject: &Subject) -> RepoResult<SubjectId>;
    fn update_subject(&self, subject: &Subject) -> RepoResult<()>;
    fn delete_subject(&self, id: SubjectId) -> RepoResult<()>;
    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>>;
    fn subject_by_code(&self, code: &str) -> RepoResult<Option<Subject>>;
    /// Ordered by semester (unset last), then code.
    fn subjects_by_career(&self, career_id: CareerId) -> RepoResult<Vec<Subject>>;

    fn create_axis(&self, axis: &ThematicAxis) -> RepoResult<AxisId>;
    fn update_axis(&self, axis: &ThematicAxis) -> RepoResult<()>;
    fn delete_axis(&self, id: AxisId) -> RepoResult<()>;
    fn get_axis(&self, id: AxisId) -> RepoResult<Option<ThematicAxis>>;
    fn axes_by_subject(&self, subject_id: SubjectId) -> RepoResult<Vec<ThematicAxis>>;

    fn create_activity_type(&self, kind: &ActivityType) -> RepoResult<ActivityTypeId>;
    fn update_activity_type(&self, kind: &ActivityType) -> RepoResult<()>;
    fn delete_activity_type(&self, id: ActivityTypeId) -> RepoResult<()>;
    fn get_activity_type(&self, id: ActivityTypeId) -> RepoResult<Option<ActivityType>>;
    fn activity_type_by_short_code(&self, short_code: &str) -> RepoResult<Option<ActivityType>>;
    fn list_activity_types(&self) -> RepoResult<Vec<ActivityType>>;

    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId>;
    fn update_activity(&self, activity: &Activity) -> RepoResult<()>;
    fn delete_activity(&self, id: ActivityId) -> RepoResult<()>;
    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>>;
    fn activities_by_axis(&self, axis_id: AxisId) -> RepoResult<Vec<Activity>>;
    /// Every activity under any axis of the subject, by due date.
    fn activities_by_subject(&self, subject_id: SubjectId) -> RepoResult<Vec<Activity>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn careers(&self) -> EntityStore<'conn, Career> {
        EntityStore::new(self.conn)
    }

    fn subjects(&self) -> EntityStore<'conn, Subject> {
        EntityStore::new(self.conn)
    }

    fn axes(&self) -> EntityStore<'conn, ThematicAxis> {
        EntityStore::new(self.conn)
    }

    fn activity_types(&self) -> EntityStore<'conn, ActivityType> {
        EntityStore::new(self.conn)
    }

    fn activities(&self) -> EntityStore<'conn, Activity> {
        EntityStore::new(self.conn)
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_career(&self, career: &Career) -> RepoResult<CareerId> {
        self.careers().insert(career)
    }

    fn update_career(&self, career: &Career) -> RepoResult<()> {
        self.careers().update(career)
    }

    fn delete_career(&self, id: CareerId) -> RepoResult<()> {
        self.careers().delete(id)
    }

    fn get_career(&self, id: CareerId) -> RepoResult<Option<Career>> {
        self.careers().get(id)
    }

    fn list_careers(&self) -> RepoResult<Vec<Career>> {
        self.careers().list_where("1 = 1", &[], "nombre, id_carrera")
    }

    fn create_subject(&self, subject: &Subject) -> RepoResult<SubjectId> {
        self.subjects().insert(subject)
    }

    fn update_subject(&self, subject: &Subject) -> RepoResult<()> {
        self.subjects().update(subject)
    }

    fn delete_subject(&self, id: SubjectId) -> RepoResult<()> {
        self.subjects().delete(id)
    }

    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
        self.subjects().get(id)
    }

    fn subject_by_code(&self, code: &str) -> RepoResult<Option<Subject>> {
        self.subjects()
            .find_where("codigo = ?1", &[Value::Text(code.to_string())])
    }

    fn subjects_by_career(&self, career_id: CareerId) -> RepoResult<Vec<Subject>> {
        self.subjects().list_where(
            "id_carrera = ?1",
            &[Value::Integer(career_id)],
            "semestre IS NULL, semestre, codigo",
        )
    }

    fn create_axis(&self, axis: &ThematicAxis) -> RepoResult<AxisId> {
        self.axes().insert(axis)
    }

    fn update_axis(&self, axis: &ThematicAxis) -> RepoResult<()> {
        self.axes().update(axis)
    }

    fn delete_axis(&self, id: AxisId) -> RepoResult<()> {
        self.axes().delete(id)
    }

    fn get_axis(&self, id: AxisId) -> RepoResult<Option<ThematicAxis>> {
        self.axes().get(id)
    }

    fn axes_by_subject(&self, subject_id: SubjectId) -> RepoResult<Vec<ThematicAxis>> {
        self.axes().list_where(
            "id_asignatura = ?1",
            &[Value::Integer(subject_id)],
            "orden, id_eje",
        )
    }

    fn create_activity_type(&self, kind: &ActivityType) -> RepoResult<ActivityTypeId> {
        self.activity_types().insert(kind)
    }

    fn update_activity_type(&self, kind: &ActivityType) -> RepoResult<()> {
        self.activity_types().update(kind)
    }

    fn delete_activity_type(&self, id: ActivityTypeId) -> RepoResult<()> {
        self.activity_types().delete(id)
    }

    fn get_activity_type(&self, id: ActivityTypeId) -> RepoResult<Option<ActivityType>> {
        self.activity_types().get(id)
    }

    fn activity_type_by_short_code(&self, short_code: &str) -> RepoResult<Option<ActivityType>> {
        self.activity_types()
            .find_where("siglas = ?1", &[Value::Text(short_code.to_string())])
    }

    fn list_activity_types(&self) -> RepoResult<Vec<ActivityType>> {
        self.activity_types()
            .list_where("1 = 1", &[], "prioridad DESC, siglas")
    }

    fn create_activity(&self, activity: &Activity) -> RepoResult<ActivityId> {
        self.activities().insert(activity)
    }

    fn update_activity(&self, activity: &Activity) -> RepoResult<()> {
        self.activities().update(activity)
    }

    fn delete_activity(&self, id: ActivityId) -> RepoResult<()> {
        self.activities().delete(id)
    }

    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>> {
        self.activities().get(id)
    }

    fn activities_by_axis(&self, axis_id: AxisId) -> RepoResult<Vec<Activity>> {
        self.activities().list_where(
            "id_eje = ?1",
            &[Value::Integer(axis_id)],
            "fecha_fin IS NULL, fecha_fin, id_actividad",
        )
    }

    fn activities_by_subject(&self, subject_id: SubjectId) -> RepoResult<Vec<Activity>> {
        let records = run_query(
            self.conn,
            "SELECT a.*
             FROM actividad a
             INNER JOIN eje_tematico et ON et.id_eje = a.id_eje
             WHERE et.id_asignatura = ?1
             ORDER BY a.fecha_fin IS NULL, a.fecha_fin, a.id_actividad;",
            &[Value::Integer(subject_id)],
        )?;
        decode_all(records)
    }
}

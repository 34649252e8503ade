//! Idempotent schema bootstrap: tables, indices and read-model views.
//!
//! # Responsibility
//! - Create every base table before the indices and views that read it.
//! - Keep repeated bootstrap calls a no-op.
//!
//! # Invariants
//! - Every statement uses `IF NOT EXISTS`; running twice creates nothing new.
//! - `PRAGMA user_version` mirrors [`SCHEMA_VERSION`]; a newer on-disk
//!   version is rejected instead of being silently downgraded.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

/// Version stamped into `PRAGMA user_version` after bootstrap.
pub const SCHEMA_VERSION: u32 = 1;

const TABLES_SQL: &str = include_str!("tables.sql");
const INDEXES_SQL: &str = include_str!("indexes.sql");
const VIEWS_SQL: &str = include_str!("views.sql");

/// Base tables in creation order (parents before children).
pub const TABLES: &[&str] = &[
    "carrera",
    "asignatura",
    "eje_tematico",
    "tipo_actividad",
    "actividad",
    "estudiante",
    "estudiante_carrera",
    "estudiante_asignatura",
    "estudiante_actividad",
    "prerrequisito",
    "calendario_evento",
];

pub const INDEXES: &[&str] = &[
    "idx_asignatura_carrera",
    "idx_eje_asignatura",
    "idx_actividad_eje",
    "idx_actividad_tipo",
    "idx_estudiante_carrera_carrera",
    "idx_estudiante_asignatura_asignatura",
    "idx_estudiante_actividad_actividad",
    "idx_prerrequisito_requerida",
    "idx_evento_fechas",
    "idx_estudiante_asignatura_estado",
    "idx_actividad_tipo_fecha",
];

pub const VIEWS: &[&str] = &[
    "v_estudiante_carrera",
    "v_progreso_estudiante",
    "v_progreso_carrera",
    "v_asignaturas_elegibles",
    "v_asignaturas_bloqueadas",
    "v_actividades_estudiante",
    "v_actividades_pendientes",
    "v_actividades_vencidas",
    "v_actividades_semana",
    "v_actividades_por_asignatura",
    "v_calendario_unificado",
    "v_dashboard_estudiante",
    "v_resumen_academico",
];

/// Kind of object reported by [`schema_objects`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaObjectKind {
    Table,
    Index,
    View,
}

/// One user-defined object found in `sqlite_master`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SchemaObject {
    pub kind: SchemaObjectKind,
    pub name: String,
}

/// Creates tables, indices and views in one transaction.
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] when the file was written by a
///   newer build.
/// - Any DDL failure; the transaction is rolled back.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    if current_version > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    create_tables(&tx)?;
    create_indexes(&tx)?;
    create_views(&tx)?;
    if current_version != SCHEMA_VERSION {
        tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
        info!(
            "event=schema_bootstrap module=db status=ok from_version={} to_version={}",
            current_version, SCHEMA_VERSION
        );
    }
    tx.commit()?;
    debug!("event=schema_ensure module=db status=ok");
    Ok(())
}

pub fn create_tables(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(TABLES_SQL)?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(INDEXES_SQL)?;
    Ok(())
}

pub fn create_views(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(VIEWS_SQL)?;
    Ok(())
}

/// Lists user-defined tables, indices and views, sorted by kind and name.
///
/// SQLite-internal objects (`sqlite_*`, automatic PK indices) are skipped.
pub fn schema_objects(conn: &Connection) -> DbResult<Vec<SchemaObject>> {
    let mut stmt = conn.prepare(
        "SELECT type, name
         FROM sqlite_master
         WHERE type IN ('table', 'index', 'view')
           AND name NOT LIKE 'sqlite_%'
         ORDER BY type ASC, name ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut objects = Vec::new();
    while let Some(row) = rows.next()? {
        let kind_text: String = row.get(0)?;
        let kind = match kind_text.as_str() {
            "table" => SchemaObjectKind::Table,
            "index" => SchemaObjectKind::Index,
            _ => SchemaObjectKind::View,
        };
        objects.push(SchemaObject {
            kind,
            name: row.get(1)?,
        });
    }
    objects.sort();
    Ok(objects)
}

pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

use academia_core::db::schema::{
    current_user_version, ensure_schema, schema_objects, SchemaObjectKind, INDEXES, SCHEMA_VERSION,
    TABLES, VIEWS,
};
use academia_core::db::{open_db, open_db_in_memory, DbError, DbOptions};
use rusqlite::Connection;

#[test]
fn in_memory_database_has_every_table_index_and_view() {
    let conn = open_db_in_memory().unwrap();
    let objects = schema_objects(&conn).unwrap();

    let names = |kind: SchemaObjectKind| -> Vec<&str> {
        objects
            .iter()
            .filter(|object| object.kind == kind)
            .map(|object| object.name.as_str())
            .collect()
    };
    for table in TABLES {
        assert!(names(SchemaObjectKind::Table).contains(table), "missing table {table}");
    }
    for index in INDEXES {
        assert!(names(SchemaObjectKind::Index).contains(index), "missing index {index}");
    }
    for view in VIEWS {
        assert!(names(SchemaObjectKind::View).contains(view), "missing view {view}");
    }
    assert_eq!(names(SchemaObjectKind::View).len(), VIEWS.len());
    assert_eq!(current_user_version(&conn).unwrap(), SCHEMA_VERSION);
}

#[test]
fn bootstrap_twice_creates_nothing_new() {
    let mut conn = open_db_in_memory().unwrap();
    let before = schema_objects(&conn).unwrap();

    ensure_schema(&mut conn).unwrap();
    ensure_schema(&mut conn).unwrap();

    assert_eq!(schema_objects(&conn).unwrap(), before);
}

#[test]
fn reopening_a_file_database_keeps_its_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("academia.db");

    let conn = open_db(&path, &DbOptions::default()).unwrap();
    conn.execute(
        "INSERT INTO carrera (nombre) VALUES ('Ingeniería Civil');",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path, &DbOptions::default()).unwrap();
    let careers: i64 = conn
        .query_row("SELECT COUNT(*) FROM carrera;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(careers, 1);
}

#[test]
fn file_database_runs_in_wal_mode_with_foreign_keys() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("wal.db"), &DbOptions::default()).unwrap();

    let mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_ascii_lowercase(), "wal");
    assert_eq!(foreign_keys, 1);
}

#[test]
fn wal_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let options = DbOptions {
        wal: false,
        ..DbOptions::default()
    };
    let conn = open_db(dir.path().join("rollback.db"), &options).unwrap();

    let mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_ne!(mode.to_ascii_lowercase(), "wal");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path, &DbOptions::default()).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn check_constraints_back_up_validation() {
    let conn = open_db_in_memory().unwrap();

    let empty_name = conn.execute("INSERT INTO carrera (nombre) VALUES ('  ');", []);
    assert!(empty_name.is_err());

    let bad_email = conn.execute(
        "INSERT INTO estudiante (nombre, correo) VALUES ('Ana', 'ana.example.com');",
        [],
    );
    assert!(bad_email.is_err());

    let bad_priority = conn.execute(
        "INSERT INTO tipo_actividad (nombre, siglas, prioridad) VALUES ('Prueba', 'PEP', 7);",
        [],
    );
    assert!(bad_priority.is_err());
}

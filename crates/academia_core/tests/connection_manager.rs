use academia_core::db::{open_connections_on_current_thread, ConnectionManager, DbError, DbOptions};
use rusqlite::Connection;
use std::rc::Rc;

fn has_marker(conn: &Connection) -> bool {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_temp_master WHERE name = 'marker');",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        == 1
}

#[test]
fn same_thread_reuses_its_connection() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConnectionManager::new(dir.path().join("reuse.db"), DbOptions::default());

    let first = manager.connection_for_current_thread().unwrap();
    let second = manager.connection_for_current_thread().unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert!(manager.has_connection_on_current_thread());
}

#[test]
fn each_thread_gets_its_own_connection() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConnectionManager::new(dir.path().join("threads.db"), DbOptions::default());

    let main_conn = manager.connection_for_current_thread().unwrap();
    // Temp tables are private to one connection.
    main_conn
        .execute_batch("CREATE TEMP TABLE marker (x INTEGER);")
        .unwrap();
    assert!(has_marker(&main_conn));

    std::thread::scope(|scope| {
        scope
            .spawn(|| {
                assert!(!manager.has_connection_on_current_thread());
                let worker_conn = manager.connection_for_current_thread().unwrap();
                assert!(!has_marker(&worker_conn));
                worker_conn
                    .execute(
                        "INSERT INTO estudiante (nombre, correo) VALUES ('Ana', 'ana@uni.cl');",
                        [],
                    )
                    .unwrap();
            })
            .join()
            .unwrap();
    });

    let students: i64 = main_conn
        .query_row("SELECT COUNT(*) FROM estudiante;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(students, 1);
}

#[test]
fn closing_drops_the_handle_and_next_call_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConnectionManager::new(dir.path().join("close.db"), DbOptions::default());

    let conn = manager.connection_for_current_thread().unwrap();
    conn.execute_batch("CREATE TEMP TABLE marker (x INTEGER);")
        .unwrap();
    drop(conn);

    assert!(manager.close_current_thread());
    assert!(!manager.close_current_thread());
    assert!(!manager.has_connection_on_current_thread());

    let reopened = manager.connection_for_current_thread().unwrap();
    assert!(!has_marker(&reopened));
}

#[test]
fn open_failure_propagates_and_caches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("nested").join("db.sqlite");
    let manager = ConnectionManager::new(&path, DbOptions::default());

    match manager.connection_for_current_thread().unwrap_err() {
        DbError::Open { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!manager.has_connection_on_current_thread());
}

#[test]
fn managers_keep_separate_slots() {
    let dir = tempfile::tempdir().unwrap();
    let first = ConnectionManager::new(dir.path().join("a.db"), DbOptions::default());
    let second = ConnectionManager::new(dir.path().join("b.db"), DbOptions::default());
    let baseline = open_connections_on_current_thread();

    let _a = first.connection_for_current_thread().unwrap();
    let _b = second.connection_for_current_thread().unwrap();
    assert_eq!(open_connections_on_current_thread(), baseline + 2);

    drop(second);
    assert_eq!(open_connections_on_current_thread(), baseline + 1);
    assert!(first.has_connection_on_current_thread());
}

#[test]
fn global_manager_keeps_the_first_path() {
    let dir = tempfile::tempdir().unwrap();
    let first_path = dir.path().join("global.db");
    let other_path = dir.path().join("other.db");

    let first = ConnectionManager::global(&first_path, DbOptions::default());
    let again = ConnectionManager::global(&other_path, DbOptions::default());

    assert!(std::ptr::eq(first, again));
    assert_eq!(again.path(), first_path.as_path());
    assert!(first.connection_for_current_thread().is_ok());
}

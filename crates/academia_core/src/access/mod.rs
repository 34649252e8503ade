//! Uniform transactional statement execution.
//!
//! # Responsibility
//! - Run one mutation (or a batch) inside a transaction with
//!   commit-on-success / rollback-on-failure.
//! - Materialize query rows as ordered [`Record`]s.
//!
//! # Invariants
//! - Every entity accessor reaches SQLite only through [`run_mutation`],
//!   [`run_mutations`] and [`run_query`].
//! - A failed rollback is logged, never raised over the original failure.
//! - Statements issued while the caller already holds a transaction join it
//!   instead of opening a nested one.

use log::{error, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod record;

pub use record::{date_value, opt_date_value, Record, RecordError, RecordResult};

const MAX_LOGGED_PARAM_CHARS: usize = 32;

pub type AccessResult<T> = Result<T, AccessError>;

/// Statement-execution failure, classified by engine error code.
#[derive(Debug)]
pub enum AccessError {
    /// A UNIQUE, PRIMARY KEY, FOREIGN KEY, CHECK or NOT NULL constraint fired.
    Constraint {
        statement: String,
        source: rusqlite::Error,
    },
    /// The lock wait exceeded the configured busy timeout.
    Busy {
        statement: String,
        source: rusqlite::Error,
    },
    Sqlite {
        statement: String,
        source: rusqlite::Error,
    },
}

impl AccessError {
    fn classify(statement: &str, source: rusqlite::Error) -> Self {
        let statement = compact_sql(statement);
        match source.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::Constraint { statement, source },
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                Self::Busy { statement, source }
            }
            _ => Self::Sqlite { statement, source },
        }
    }

    pub fn statement(&self) -> &str {
        match self {
            Self::Constraint { statement, .. }
            | Self::Busy { statement, .. }
            | Self::Sqlite { statement, .. } => statement,
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Constraint { .. })
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Constraint { .. } => "constraint_violation",
            Self::Busy { .. } => "database_busy",
            Self::Sqlite { .. } => "sqlite_error",
        }
    }
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constraint { source, .. } => write!(f, "constraint violation: {source}"),
            Self::Busy { source, .. } => write!(f, "database busy: {source}"),
            Self::Sqlite { source, .. } => write!(f, "{source}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Constraint { source, .. }
            | Self::Busy { source, .. }
            | Self::Sqlite { source, .. } => Some(source),
        }
    }
}

/// Result of one committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOutcome {
    pub rows_affected: usize,
    /// Rowid generated by an `INSERT` that wrote at least one row.
    pub last_insert_id: Option<i64>,
}

/// One parameterized statement for [`run_mutations`].
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Executes one INSERT/UPDATE/DELETE inside a transaction.
///
/// # Errors
/// - [`AccessError`] classified from the engine error. The transaction is
///   rolled back and the failure is logged with the statement and a
///   truncated rendering of its parameters.
pub fn run_mutation(conn: &Connection, sql: &str, params: &[Value]) -> AccessResult<MutationOutcome> {
    let mut outcomes = run_mutations_inner(conn, &[(sql, params)])?;
    Ok(outcomes.pop().unwrap_or(MutationOutcome {
        rows_affected: 0,
        last_insert_id: None,
    }))
}

/// Executes several statements atomically; all commit or none do.
pub fn run_mutations(conn: &Connection, statements: &[Statement]) -> AccessResult<Vec<MutationOutcome>> {
    let borrowed: Vec<(&str, &[Value])> = statements
        .iter()
        .map(|statement| (statement.sql.as_str(), statement.params.as_slice()))
        .collect();
    run_mutations_inner(conn, &borrowed)
}

/// Executes a SELECT and returns every row as a [`Record`].
///
/// Returns an empty vector when nothing matches.
pub fn run_query(conn: &Connection, sql: &str, params: &[Value]) -> AccessResult<Vec<Record>> {
    query_rows(conn, sql, params).map_err(|err| {
        let err = AccessError::classify(sql, err);
        log_failure("query", sql, params, &err);
        err
    })
}

/// Returns the first row of [`run_query`], if any.
pub fn run_query_one(conn: &Connection, sql: &str, params: &[Value]) -> AccessResult<Option<Record>> {
    Ok(run_query(conn, sql, params)?.into_iter().next())
}

fn query_rows(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<Vec<Record>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Record::new();
        for (index, column) in columns.iter().enumerate() {
            let value: Value = row.get_ref(index)?.into();
            record.insert(column.as_str(), value);
        }
        records.push(record);
    }
    Ok(records)
}

fn run_mutations_inner(
    conn: &Connection,
    statements: &[(&str, &[Value])],
) -> AccessResult<Vec<MutationOutcome>> {
    // Caller-owned transaction: join it and let the owner commit.
    if !conn.is_autocommit() {
        return execute_all(conn, statements);
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(|err| {
        let sql = statements.first().map_or("BEGIN", |(sql, _)| *sql);
        let err = AccessError::classify(sql, err);
        log_failure("begin", sql, &[], &err);
        err
    })?;

    match execute_all(&tx, statements) {
        Ok(outcomes) => {
            tx.commit().map_err(|err| {
                let err = AccessError::classify("COMMIT", err);
                log_failure("commit", "COMMIT", &[], &err);
                err
            })?;
            Ok(outcomes)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=statement_rollback module=access status=error error={}",
                    rollback_err
                );
            }
            Err(err)
        }
    }
}

fn execute_all(conn: &Connection, statements: &[(&str, &[Value])]) -> AccessResult<Vec<MutationOutcome>> {
    let mut outcomes = Vec::with_capacity(statements.len());
    for (sql, params) in statements {
        let rows_affected = conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(|err| {
                let err = AccessError::classify(sql, err);
                log_failure("mutation", sql, params, &err);
                err
            })?;
        let last_insert_id = if is_insert(sql) && rows_affected > 0 {
            Some(conn.last_insert_rowid())
        } else {
            None
        };
        outcomes.push(MutationOutcome {
            rows_affected,
            last_insert_id,
        });
    }
    Ok(outcomes)
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("INSERT"))
}

fn log_failure(phase: &str, sql: &str, params: &[Value], err: &AccessError) {
    error!(
        "event=statement_failed module=access status=error phase={} error_code={} sql=\"{}\" params=[{}] error={}",
        phase,
        err.code(),
        compact_sql(sql),
        describe_params(params),
        err
    );
}

fn compact_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn describe_params(params: &[Value]) -> String {
    params
        .iter()
        .map(|value| match value {
            Value::Null => "NULL".to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Real(v) => v.to_string(),
            Value::Text(v) => {
                let mut text: String = v.chars().take(MAX_LOGGED_PARAM_CHARS).collect();
                if v.chars().count() > MAX_LOGGED_PARAM_CHARS {
                    text.push_str("...");
                }
                format!("'{}'", text.replace(['\n', '\r'], " "))
            }
            Value::Blob(v) => format!("<blob {} bytes>", v.len()),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{describe_params, is_insert, run_mutation, run_mutations, run_query, Statement};
    use rusqlite::types::Value;
    use rusqlite::Connection;

    fn scratch() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn insert_returns_generated_key_and_update_returns_count() {
        let conn = scratch();
        let inserted = run_mutation(&conn, "INSERT INTO t (name) VALUES (?1);", &["a".to_string().into()]).unwrap();
        assert_eq!(inserted.rows_affected, 1);
        assert_eq!(inserted.last_insert_id, Some(1));

        let updated = run_mutation(&conn, "UPDATE t SET name = 'b';", &[]).unwrap();
        assert_eq!(updated.rows_affected, 1);
        assert_eq!(updated.last_insert_id, None);
    }

    #[test]
    fn constraint_failure_is_classified_and_rolled_back() {
        let conn = scratch();
        run_mutation(&conn, "INSERT INTO t (name) VALUES ('a');", &[]).unwrap();
        let err = run_mutation(&conn, "INSERT INTO t (name) VALUES ('a');", &[]).unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(conn.is_autocommit());
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let conn = scratch();
        let err = run_mutations(
            &conn,
            &[
                Statement::new("INSERT INTO t (name) VALUES ('x');", vec![]),
                Statement::new("INSERT INTO t (name) VALUES ('x');", vec![]),
            ],
        )
        .unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(run_query(&conn, "SELECT * FROM t;", &[]).unwrap().is_empty());
    }

    #[test]
    fn query_materializes_named_columns() {
        let conn = scratch();
        run_mutation(&conn, "INSERT INTO t (name) VALUES ('a');", &[]).unwrap();
        let rows = run_query(&conn, "SELECT id, name AS label FROM t;", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_i64("id").unwrap(), 1);
        assert_eq!(rows[0].get_text("label").unwrap(), "a");
    }

    #[test]
    fn helpers_detect_inserts_and_truncate_params() {
        assert!(is_insert("  insert or ignore into t values (1)"));
        assert!(!is_insert("UPDATE t SET x = 1"));
        let rendered = describe_params(&[Value::Text("x".repeat(40)), Value::Null]);
        assert!(rendered.contains("...'"));
        assert!(rendered.ends_with(", NULL"));
    }
}

//! Generic CRUD over any [`Entity`], plus the shared repository error.
//!
//! # Responsibility
//! - Build insert/update/delete/select statements from an entity's
//!   [`Record`] shape and key columns.
//! - Reach SQLite only through the access layer.
//!
//! # Invariants
//! - Every write runs `Entity::validate()` before any SQL is issued.
//! - An update or delete that touches zero rows is `RepoError::NotFound`.
//! - Rows that fail to decode surface as `RepoError::Record`, never as a
//!   silently skipped row.

use crate::access::{
    run_mutation, run_query, run_query_one, AccessError, Record, RecordError, Statement,
};
use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::{Entity, EntityKey};
use log::error;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository-surface error.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Access(AccessError),
    Db(DbError),
    Record(RecordError),
    NotFound { entity: &'static str, key: String },
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found<K: EntityKey>(entity: &'static str, key: K) -> Self {
        Self::NotFound {
            entity,
            key: key.describe(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Access(err) if err.is_constraint_violation())
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Access(err) if err.is_busy())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Access(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Record(err) => write!(f, "invalid persisted row: {err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Access(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Record(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AccessError> for RepoError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RecordError> for RepoError {
    fn from(value: RecordError) -> Self {
        Self::Record(value)
    }
}

/// Adapters for callers that speak in `bool` / `Option` / empty lists.
///
/// Each adapter logs the error before discarding it, so a failed storage
/// call is never silent even when the caller only sees a default.
pub trait RepoResultExt<T> {
    /// `Some(value)` on success, `None` after logging the error.
    fn logged(self, operation: &str) -> Option<T>;

    /// `true` on success, `false` after logging the error.
    fn logged_ok(self, operation: &str) -> bool;

    /// The value on success, `T::default()` (an empty list) after logging.
    fn logged_or_empty(self, operation: &str) -> T
    where
        T: Default;
}

impl<T> RepoResultExt<T> for RepoResult<T> {
    fn logged(self, operation: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                log_repo_error(operation, &err);
                None
            }
        }
    }

    fn logged_ok(self, operation: &str) -> bool {
        self.logged(operation).is_some()
    }

    fn logged_or_empty(self, operation: &str) -> T
    where
        T: Default,
    {
        self.logged(operation).unwrap_or_default()
    }
}

fn log_repo_error(operation: &str, err: &RepoError) {
    let kind = match err {
        RepoError::Validation(_) => "validation",
        RepoError::Access(_) => "access",
        RepoError::Db(_) => "db",
        RepoError::Record(_) => "record",
        RepoError::NotFound { .. } => "not_found",
        RepoError::InvalidData(_) => "invalid_data",
    };
    error!("event=repo_call module=repo status=error operation={operation} kind={kind} error={err}");
}

/// CRUD for one entity type on a borrowed connection.
pub struct EntityStore<'conn, E> {
    conn: &'conn Connection,
    _entity: PhantomData<E>,
}

impl<'conn, E: Entity> EntityStore<'conn, E> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    /// Validates and inserts `entity`, returning its key.
    ///
    /// For generated keys the returned key is the rowid SQLite assigned;
    /// an explicit key on the entity is written as-is.
    pub fn insert(&self, entity: &E) -> RepoResult<E::Key> {
        entity.validate()?;

        let mut columns = Vec::new();
        let mut params = Vec::new();
        for (column, value) in entity.to_record().into_fields() {
            if E::GENERATED_KEY && E::KEY_COLUMNS.contains(&column.as_str()) && value == Value::Null {
                continue;
            }
            columns.push(column);
            params.push(value);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            E::TABLE,
            columns.join(", "),
            placeholders(1, columns.len())
        );
        let outcome = run_mutation(self.conn, &sql, &params)?;

        if let Some(key) = entity.key() {
            return Ok(key);
        }
        outcome
            .last_insert_id
            .and_then(E::Key::from_rowid)
            .ok_or_else(|| {
                RepoError::InvalidData(format!("insert into {} returned no key", E::TABLE))
            })
    }

    /// Validates and overwrites every non-key column of the stored row.
    pub fn update(&self, entity: &E) -> RepoResult<()> {
        let statement = self.update_statement(entity)?;
        let outcome = run_mutation(self.conn, &statement.sql, &statement.params)?;
        if outcome.rows_affected == 0 {
            return Err(self.missing(entity));
        }
        Ok(())
    }

    pub fn delete(&self, key: E::Key) -> RepoResult<()> {
        let sql = format!("DELETE FROM {} WHERE {};", E::TABLE, key_predicate::<E>(1));
        let outcome = run_mutation(self.conn, &sql, &key.to_values())?;
        if outcome.rows_affected == 0 {
            return Err(RepoError::not_found(E::NAME, key));
        }
        Ok(())
    }

    pub fn get(&self, key: E::Key) -> RepoResult<Option<E>> {
        let sql = format!("SELECT * FROM {} WHERE {};", E::TABLE, key_predicate::<E>(1));
        run_query_one(self.conn, &sql, &key.to_values())?
            .map(|record| E::from_record(&record))
            .transpose()
            .map_err(RepoError::from)
    }

    pub fn exists(&self, key: E::Key) -> RepoResult<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {}) AS found;",
            E::TABLE,
            key_predicate::<E>(1)
        );
        let found = run_query_one(self.conn, &sql, &key.to_values())?
            .map(|record| record.get_bool("found"))
            .transpose()?;
        Ok(found.unwrap_or(false))
    }

    /// Every row, ordered by key.
    pub fn list(&self) -> RepoResult<Vec<E>> {
        self.list_where("1 = 1", &[], &E::KEY_COLUMNS.join(", "))
    }

    /// Rows matching `predicate` (positional `?N` parameters), in
    /// `order_by` order.
    pub(crate) fn list_where(
        &self,
        predicate: &str,
        params: &[Value],
        order_by: &str,
    ) -> RepoResult<Vec<E>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {predicate} ORDER BY {order_by};",
            E::TABLE
        );
        decode_all(run_query(self.conn, &sql, params)?)
    }

    /// First row matching `predicate`.
    pub(crate) fn find_where(&self, predicate: &str, params: &[Value]) -> RepoResult<Option<E>> {
        let sql = format!("SELECT * FROM {} WHERE {predicate} LIMIT 1;", E::TABLE);
        run_query_one(self.conn, &sql, params)?
            .map(|record| E::from_record(&record))
            .transpose()
            .map_err(RepoError::from)
    }

    fn update_statement(&self, entity: &E) -> RepoResult<Statement> {
        entity.validate()?;
        let key = entity.key().ok_or_else(|| {
            RepoError::InvalidData(format!("cannot update {} without a key", E::NAME))
        })?;

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for (column, value) in entity.to_record().into_fields() {
            if E::KEY_COLUMNS.contains(&column.as_str()) {
                continue;
            }
            params.push(value);
            assignments.push(format!("{column} = ?{}", params.len()));
        }
        let predicate = key_predicate::<E>(params.len() + 1);
        params.extend(key.to_values());

        Ok(Statement::new(
            format!(
                "UPDATE {} SET {} WHERE {predicate};",
                E::TABLE,
                assignments.join(", ")
            ),
            params,
        ))
    }

    fn missing(&self, entity: &E) -> RepoError {
        match entity.key() {
            Some(key) => RepoError::not_found(E::NAME, key),
            None => RepoError::InvalidData(format!("{} has no key", E::NAME)),
        }
    }
}

pub(crate) fn decode_all<E: Entity>(records: Vec<Record>) -> RepoResult<Vec<E>> {
    records
        .iter()
        .map(|record| E::from_record(record).map_err(RepoError::from))
        .collect()
}

fn key_predicate<E: Entity>(first_index: usize) -> String {
    E::KEY_COLUMNS
        .iter()
        .enumerate()
        .map(|(offset, column)| format!("{column} = ?{}", first_index + offset))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn placeholders(first_index: usize, count: usize) -> String {
    (first_index..first_index + count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

//! Persistence and domain rules for academic records.
//! This crate is the single source of truth for data invariants.

pub mod access;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod read_model;
pub mod repo;
pub mod service;

pub use access::{
    run_mutation, run_mutations, run_query, AccessError, AccessResult, MutationOutcome, Record,
    Statement,
};
pub use config::{ConfigError, CoreConfig};
pub use db::schema::ensure_schema;
pub use db::{open_db, open_db_in_memory, ConnectionManager, DbError, DbOptions, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::state::{ActivityState, CareerState, Lifecycle, SubjectState, TransitionError};
pub use model::validation::ValidationError;
pub use model::Entity;
pub use repo::{EntityStore, RepoError, RepoResult, RepoResultExt};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per aggregate.
//! - Isolate SQL details from services and read models.
//!
//! # Invariants
//! - Repository writes enforce `Entity::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   access-layer failures (constraint, busy, engine).

pub mod calendar_repo;
pub mod catalog_repo;
pub mod entity_store;
pub mod prerequisite_repo;
pub mod student_repo;

pub use entity_store::{EntityStore, RepoError, RepoResult, RepoResultExt};

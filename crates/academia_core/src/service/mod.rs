//! Use-case orchestration over repositories.
//!
//! # Responsibility
//! - Apply state-machine rules before persisting a state change.
//! - Keep multi-step use cases (principal career, grading, overdue sweep)
//!   out of the GUI layer.
//!
//! # Invariants
//! - Services never issue SQL directly; they go through repository traits.
//! - A rejected transition leaves storage untouched.

use crate::model::state::TransitionError;
use crate::model::{StudentId, SubjectId};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod activity_service;
pub mod enrollment_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for enrollment and activity use cases.
#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    Transition(TransitionError),
    /// The subject has direct prerequisites the student has not passed.
    PrerequisitesUnmet {
        student_id: StudentId,
        subject_id: SubjectId,
        missing: Vec<SubjectId>,
    },
    /// The student holds no registration for the target.
    NotRegistered {
        entity: &'static str,
        key: String,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Transition(err) => write!(f, "{err}"),
            Self::PrerequisitesUnmet {
                student_id,
                subject_id,
                missing,
            } => write!(
                f,
                "student {student_id} cannot start subject {subject_id}: missing prerequisites {missing:?}"
            ),
            Self::NotRegistered { entity, key } => write!(f, "no {entity} registration for {key}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Transition(err) => Some(err),
            Self::PrerequisitesUnmet { .. } | Self::NotRegistered { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, key } => Self::NotRegistered { entity, key },
            other => Self::Repo(other),
        }
    }
}

impl From<TransitionError> for ServiceError {
    fn from(value: TransitionError) -> Self {
        Self::Transition(value)
    }
}

//! Persistability rules shared by every entity.
//!
//! Validation is pure: it never touches SQLite and never panics. The schema's
//! own NOT NULL / CHECK / FOREIGN KEY constraints remain the second line of
//! defense behind these predicates.

use crate::model::state::{ActivityState, Lifecycle, SubjectState};
use crate::model::SubjectId;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason a record may not be written.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required text is empty or whitespace only.
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
    /// Numeric field must be strictly greater than zero.
    NotPositive {
        entity: &'static str,
        field: &'static str,
        value: i64,
    },
    /// Numeric field must be zero or greater.
    Negative {
        entity: &'static str,
        field: &'static str,
        value: i64,
    },
    /// Foreign key is unset (`<= 0`).
    MissingReference {
        entity: &'static str,
        field: &'static str,
    },
    /// Email lacks `@`.
    InvalidEmail(String),
    /// `end` precedes `start`.
    InvertedDateRange {
        entity: &'static str,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Grade is NaN, infinite or negative.
    InvalidGrade(f64),
    /// A final grade was set on a subject that is neither passed nor failed.
    GradeWithoutOutcome { state: SubjectState },
    /// A submitted activity has no submission date.
    MissingSubmissionDate { state: ActivityState },
    /// A subject listed as its own prerequisite.
    SelfPrerequisite(SubjectId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { entity, field } => write!(f, "{entity}.{field} must not be empty"),
            Self::NotPositive {
                entity,
                field,
                value,
            } => write!(f, "{entity}.{field} must be > 0, got {value}"),
            Self::Negative {
                entity,
                field,
                value,
            } => write!(f, "{entity}.{field} must be >= 0, got {value}"),
            Self::MissingReference { entity, field } => {
                write!(f, "{entity}.{field} must reference an existing row")
            }
            Self::InvalidEmail(email) => write!(f, "invalid email `{email}`"),
            Self::InvertedDateRange { entity, start, end } => {
                write!(f, "{entity} ends ({end}) before it starts ({start})")
            }
            Self::InvalidGrade(grade) => write!(f, "invalid final grade {grade}"),
            Self::GradeWithoutOutcome { state } => write!(
                f,
                "final grade is only meaningful for passed/failed subjects, state is `{}`",
                state.as_str()
            ),
            Self::MissingSubmissionDate { state } => {
                write!(f, "activity state `{}` requires a submission date", state.as_str())
            }
            Self::SelfPrerequisite(subject) => {
                write!(f, "subject {subject} cannot be its own prerequisite")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { entity, field });
    }
    Ok(())
}

/// `None` is accepted; `Some("")` is not.
pub(crate) fn require_optional_text(
    entity: &'static str,
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    match value {
        Some(text) => require_text(entity, field, text),
        None => Ok(()),
    }
}

pub(crate) fn require_positive(
    entity: &'static str,
    field: &'static str,
    value: i64,
) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NotPositive {
            entity,
            field,
            value,
        });
    }
    Ok(())
}

pub(crate) fn require_non_negative(
    entity: &'static str,
    field: &'static str,
    value: i64,
) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative {
            entity,
            field,
            value,
        });
    }
    Ok(())
}

pub(crate) fn require_reference(
    entity: &'static str,
    field: &'static str,
    id: i64,
) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::MissingReference { entity, field });
    }
    Ok(())
}

/// Minimal syntactic check; intentionally not an RFC 5322 validator.
pub(crate) fn require_email(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(ValidationError::InvalidEmail(value.to_string()));
    }
    Ok(())
}

pub(crate) fn require_date_order(
    entity: &'static str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ValidationError::InvertedDateRange { entity, start, end });
        }
    }
    Ok(())
}

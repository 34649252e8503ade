//! Closed state enumerations and their transition rules.
//!
//! # Responsibility
//! - Keep enrollment and submission states unrepresentable as free text.
//! - Decide which caller-driven transitions are legal.
//!
//! # Invariants
//! - Storage strings are the only textual form crossing the SQLite boundary.
//! - Same-state transitions are accepted as no-ops.
//! - Terminal states are left only through an explicit [`Lifecycle::reset`].
//! - Nothing here promotes a state automatically.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub machine: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

impl Display for TransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} cannot move from `{}` to `{}`",
            self.machine, self.from, self.to
        )
    }
}

impl Error for TransitionError {}

/// Shared transition contract for stored state columns.
pub trait Lifecycle: Copy + Eq + Sized + 'static {
    const MACHINE: &'static str;

    fn initial() -> Self;

    /// Storage string.
    fn as_str(self) -> &'static str;

    /// Legal single-step moves, excluding the implicit same-state no-op.
    fn successors(self) -> &'static [Self];

    fn can_transition_to(self, next: Self) -> bool {
        self == next || self.successors().contains(&next)
    }

    fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                machine: Self::MACHINE,
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    /// Explicit caller reset; always allowed.
    fn reset(self) -> Self {
        Self::initial()
    }
}

/// Progress of a student in one subject.
///
/// ```text
/// not_taken --(enroll)--> in_progress --(grade>=passing)--> passed
///                                      --(grade<passing)--> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectState {
    NotTaken,
    InProgress,
    Passed,
    Failed,
}

impl SubjectState {
    pub const ALL: [Self; 4] = [Self::NotTaken, Self::InProgress, Self::Passed, Self::Failed];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "no_cursada" => Some(Self::NotTaken),
            "cursando" => Some(Self::InProgress),
            "aprobada" => Some(Self::Passed),
            "reprobada" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NotTaken => "No cursada",
            Self::InProgress => "Cursando",
            Self::Passed => "Aprobada",
            Self::Failed => "Reprobada",
        }
    }

    /// Outcome of a final grade against the passing threshold.
    pub fn from_grade(grade: f64, passing_grade: f64) -> Self {
        if grade >= passing_grade {
            Self::Passed
        } else {
            Self::Failed
        }
    }

    /// Whether a final grade is meaningful in this state.
    pub fn carries_grade(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

impl Lifecycle for SubjectState {
    const MACHINE: &'static str = "subject enrollment";

    fn initial() -> Self {
        Self::NotTaken
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::NotTaken => "no_cursada",
            Self::InProgress => "cursando",
            Self::Passed => "aprobada",
            Self::Failed => "reprobada",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            Self::NotTaken => &[Self::InProgress],
            Self::InProgress => &[Self::Passed, Self::Failed, Self::NotTaken],
            Self::Passed | Self::Failed => &[],
        }
    }
}

/// State of a student's enrollment in a career.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerState {
    Active,
    Inactive,
    Completed,
}

impl CareerState {
    pub const ALL: [Self; 3] = [Self::Active, Self::Inactive, Self::Completed];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "activa" => Some(Self::Active),
            "inactiva" => Some(Self::Inactive),
            "finalizada" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Activa",
            Self::Inactive => "Inactiva",
            Self::Completed => "Finalizada",
        }
    }
}

impl Lifecycle for CareerState {
    const MACHINE: &'static str = "career enrollment";

    fn initial() -> Self {
        Self::Active
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Active => "activa",
            Self::Inactive => "inactiva",
            Self::Completed => "finalizada",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Active => &[Self::Inactive, Self::Completed],
            Self::Inactive => &[Self::Active],
            Self::Completed => &[],
        }
    }
}

/// Submission state of one activity for one student.
///
/// `Overdue` is stored like any other state; it is written only by an
/// explicit caller action. Use [`is_overdue_at`] for the read-time check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    Pending,
    InProgress,
    Submitted,
    Overdue,
}

impl ActivityState {
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Submitted,
        Self::Overdue,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pendiente" => Some(Self::Pending),
            "en_progreso" => Some(Self::InProgress),
            "entregada" => Some(Self::Submitted),
            "vencida" => Some(Self::Overdue),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::InProgress => "En progreso",
            Self::Submitted => "Entregada",
            Self::Overdue => "Vencida",
        }
    }

    /// Whether the activity still expects a submission.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

impl Lifecycle for ActivityState {
    const MACHINE: &'static str = "activity submission";

    fn initial() -> Self {
        Self::Pending
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::InProgress => "en_progreso",
            Self::Submitted => "entregada",
            Self::Overdue => "vencida",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Submitted, Self::Overdue],
            Self::InProgress => &[Self::Submitted, Self::Overdue],
            Self::Overdue => &[Self::Submitted],
            Self::Submitted => &[],
        }
    }
}

/// Read-time overdue rule: the due date has passed and nothing was submitted.
///
/// Activities without a due date are never overdue.
pub fn is_overdue_at(due: Option<NaiveDate>, submitted_on: Option<NaiveDate>, today: NaiveDate) -> bool {
    match (due, submitted_on) {
        (Some(due), None) => due < today,
        _ => false,
    }
}

//! Composite-key registrations of a student in careers, subjects and
//! activities, each carrying its own state column.
//!
//! # Invariants
//! - At most one row per (student, target) pair; the primary key rejects a
//!   second insert.
//! - A final grade exists only for passed/failed subjects.
//! - A submitted activity always carries its submission date.

use super::state::{is_overdue_at, ActivityState, CareerState, Lifecycle, SubjectState};
use super::validation::{require_date_order, require_reference, ValidationError};
use super::{opt_text_value, ActivityId, CareerId, Entity, StudentId, SubjectId};
use crate::access::{opt_date_value, Record, RecordError, RecordResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Student ↔ career registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerEnrollment {
    pub student_id: StudentId,
    pub career_id: CareerId,
    pub state: CareerState,
    /// Tie-break default when a student holds several careers.
    pub is_principal: bool,
    pub enrolled_on: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Admission period, e.g. `2024-1`.
    pub admission_period: Option<String>,
    pub notes: Option<String>,
}

impl CareerEnrollment {
    pub fn new(student_id: StudentId, career_id: CareerId) -> Self {
        Self {
            student_id,
            career_id,
            state: CareerState::initial(),
            is_principal: false,
            enrolled_on: None,
            start_date: None,
            end_date: None,
            admission_period: None,
            notes: None,
        }
    }
}

impl Entity for CareerEnrollment {
    type Key = (StudentId, CareerId);

    const NAME: &'static str = "career_enrollment";
    const TABLE: &'static str = "estudiante_carrera";
    const KEY_COLUMNS: &'static [&'static str] = &["id_estudiante", "id_carrera"];
    const GENERATED_KEY: bool = false;

    fn key(&self) -> Option<Self::Key> {
        Some((self.student_id, self.career_id))
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_estudiante", self.student_id)
            .with("id_carrera", self.career_id)
            .with("estado", self.state.as_str().to_string())
            .with("es_carrera_principal", self.is_principal)
            .with("fecha_inscripcion", opt_date_value(self.enrolled_on))
            .with("fecha_inicio", opt_date_value(self.start_date))
            .with("fecha_fin", opt_date_value(self.end_date))
            .with("periodo_ingreso", opt_text_value(self.admission_period.as_deref()))
            .with("observaciones", opt_text_value(self.notes.as_deref()))
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        let state_text = record.get_text("estado")?;
        let state = CareerState::parse(&state_text)
            .ok_or_else(|| unknown_state("estado", &state_text))?;
        Ok(Self {
            student_id: record.get_i64("id_estudiante")?,
            career_id: record.get_i64("id_carrera")?,
            state,
            is_principal: record.get_bool("es_carrera_principal")?,
            enrolled_on: record.get_opt_date("fecha_inscripcion")?,
            start_date: record.get_opt_date("fecha_inicio")?,
            end_date: record.get_opt_date("fecha_fin")?,
            admission_period: record.get_opt_text("periodo_ingreso")?,
            notes: record.get_opt_text("observaciones")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_reference(Self::NAME, "student_id", self.student_id)?;
        require_reference(Self::NAME, "career_id", self.career_id)?;
        require_date_order(Self::NAME, self.start_date, self.end_date)
    }
}

/// Student ↔ subject progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProgress {
    pub student_id: StudentId,
    pub subject_id: SubjectId,
    pub state: SubjectState,
    pub final_grade: Option<f64>,
    /// Academic period, e.g. `2025-1`.
    pub period: Option<String>,
}

impl SubjectProgress {
    pub fn new(student_id: StudentId, subject_id: SubjectId) -> Self {
        Self {
            student_id,
            subject_id,
            state: SubjectState::initial(),
            final_grade: None,
            period: None,
        }
    }

    pub fn with_state(mut self, state: SubjectState) -> Self {
        self.state = state;
        self
    }
}

impl Entity for SubjectProgress {
    type Key = (StudentId, SubjectId);

    const NAME: &'static str = "subject_progress";
    const TABLE: &'static str = "estudiante_asignatura";
    const KEY_COLUMNS: &'static [&'static str] = &["id_estudiante", "id_asignatura"];
    const GENERATED_KEY: bool = false;

    fn key(&self) -> Option<Self::Key> {
        Some((self.student_id, self.subject_id))
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_estudiante", self.student_id)
            .with("id_asignatura", self.subject_id)
            .with("estado", self.state.as_str().to_string())
            .with("nota_final", self.final_grade.map_or(Value::Null, Value::Real))
            .with("periodo", opt_text_value(self.period.as_deref()))
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        let state_text = record.get_text("estado")?;
        let state = SubjectState::parse(&state_text)
            .ok_or_else(|| unknown_state("estado", &state_text))?;
        Ok(Self {
            student_id: record.get_i64("id_estudiante")?,
            subject_id: record.get_i64("id_asignatura")?,
            state,
            final_grade: record.get_opt_f64("nota_final")?,
            period: record.get_opt_text("periodo")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_reference(Self::NAME, "student_id", self.student_id)?;
        require_reference(Self::NAME, "subject_id", self.subject_id)?;
        if let Some(grade) = self.final_grade {
            if !grade.is_finite() || grade < 0.0 {
                return Err(ValidationError::InvalidGrade(grade));
            }
            if !self.state.carries_grade() {
                return Err(ValidationError::GradeWithoutOutcome { state: self.state });
            }
        }
        Ok(())
    }
}

/// Student ↔ activity submission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityProgress {
    pub student_id: StudentId,
    pub activity_id: ActivityId,
    pub state: ActivityState,
    pub submitted_on: Option<NaiveDate>,
}

impl ActivityProgress {
    pub fn new(student_id: StudentId, activity_id: ActivityId) -> Self {
        Self {
            student_id,
            activity_id,
            state: ActivityState::initial(),
            submitted_on: None,
        }
    }

    /// State as seen at `today`: the stored state, except that an open
    /// activity past `due` without a submission reads as overdue.
    pub fn effective_state(&self, due: Option<NaiveDate>, today: NaiveDate) -> ActivityState {
        if self.state.is_open() && is_overdue_at(due, self.submitted_on, today) {
            ActivityState::Overdue
        } else {
            self.state
        }
    }
}

impl Entity for ActivityProgress {
    type Key = (StudentId, ActivityId);

    const NAME: &'static str = "activity_progress";
    const TABLE: &'static str = "estudiante_actividad";
    const KEY_COLUMNS: &'static [&'static str] = &["id_estudiante", "id_actividad"];
    const GENERATED_KEY: bool = false;

    fn key(&self) -> Option<Self::Key> {
        Some((self.student_id, self.activity_id))
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_estudiante", self.student_id)
            .with("id_actividad", self.activity_id)
            .with("estado", self.state.as_str().to_string())
            .with("fecha_entrega", opt_date_value(self.submitted_on))
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        let state_text = record.get_text("estado")?;
        let state = ActivityState::parse(&state_text)
            .ok_or_else(|| unknown_state("estado", &state_text))?;
        Ok(Self {
            student_id: record.get_i64("id_estudiante")?,
            activity_id: record.get_i64("id_actividad")?,
            state,
            submitted_on: record.get_opt_date("fecha_entrega")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_reference(Self::NAME, "student_id", self.student_id)?;
        require_reference(Self::NAME, "activity_id", self.activity_id)?;
        if self.state == ActivityState::Submitted && self.submitted_on.is_none() {
            return Err(ValidationError::MissingSubmissionDate { state: self.state });
        }
        Ok(())
    }
}

fn unknown_state(field: &str, value: &str) -> RecordError {
    RecordError::InvalidField {
        field: field.to_string(),
        message: format!("unknown state `{value}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityProgress, CareerEnrollment, SubjectProgress};
    use crate::model::state::{ActivityState, CareerState, SubjectState};
    use crate::model::validation::ValidationError;
    use crate::model::Entity;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn grade_is_rejected_while_subject_is_in_progress() {
        let mut progress = SubjectProgress::new(1, 2).with_state(SubjectState::InProgress);
        progress.final_grade = Some(5.5);
        assert_eq!(
            progress.validate(),
            Err(ValidationError::GradeWithoutOutcome {
                state: SubjectState::InProgress
            })
        );

        progress.state = SubjectState::Passed;
        assert!(progress.is_valid());

        progress.final_grade = Some(f64::NAN);
        assert!(!progress.is_valid());
    }

    #[test]
    fn submitted_activity_needs_a_date() {
        let mut progress = ActivityProgress::new(1, 1);
        progress.state = ActivityState::Submitted;
        assert!(!progress.is_valid());
        progress.submitted_on = Some(day(2));
        assert!(progress.is_valid());
    }

    #[test]
    fn effective_state_marks_open_past_due_work_as_overdue() {
        let mut progress = ActivityProgress::new(1, 1);
        assert_eq!(progress.effective_state(Some(day(1)), day(2)), ActivityState::Overdue);
        assert_eq!(progress.effective_state(Some(day(2)), day(2)), ActivityState::Pending);

        progress.state = ActivityState::Submitted;
        progress.submitted_on = Some(day(3));
        assert_eq!(progress.effective_state(Some(day(1)), day(4)), ActivityState::Submitted);
    }

    #[test]
    fn records_round_trip() {
        let mut career = CareerEnrollment::new(1, 2);
        career.state = CareerState::Inactive;
        career.is_principal = true;
        career.enrolled_on = Some(day(1));
        career.start_date = Some(day(2));
        career.end_date = Some(day(30));
        career.admission_period = Some("2025-1".to_string());
        career.notes = Some("traslado".to_string());
        assert_eq!(CareerEnrollment::from_record(&career.to_record()).unwrap(), career);

        let mut subject = SubjectProgress::new(1, 3).with_state(SubjectState::Failed);
        subject.final_grade = Some(3.2);
        subject.period = Some("2025-1".to_string());
        assert_eq!(SubjectProgress::from_record(&subject.to_record()).unwrap(), subject);

        let mut activity = ActivityProgress::new(1, 4);
        activity.state = ActivityState::Submitted;
        activity.submitted_on = Some(day(5));
        assert_eq!(ActivityProgress::from_record(&activity.to_record()).unwrap(), activity);
    }
}

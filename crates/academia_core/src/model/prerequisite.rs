//! Directed prerequisite edge between two subjects.

use super::validation::{require_reference, ValidationError};
use super::{Entity, SubjectId};
use crate::access::{Record, RecordResult};
use serde::{Deserialize, Serialize};

/// `subject_id` requires `required_subject_id` to be passed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prerequisite {
    pub subject_id: SubjectId,
    pub required_subject_id: SubjectId,
}

impl Prerequisite {
    pub fn new(subject_id: SubjectId, required_subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            required_subject_id,
        }
    }
}

impl Entity for Prerequisite {
    type Key = (SubjectId, SubjectId);

    const NAME: &'static str = "prerequisite";
    const TABLE: &'static str = "prerrequisito";
    const KEY_COLUMNS: &'static [&'static str] = &["id_asignatura", "id_asignatura_prerrequisito"];
    const GENERATED_KEY: bool = false;

    fn key(&self) -> Option<Self::Key> {
        Some((self.subject_id, self.required_subject_id))
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_asignatura", self.subject_id)
            .with("id_asignatura_prerrequisito", self.required_subject_id)
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        Ok(Self {
            subject_id: record.get_i64("id_asignatura")?,
            required_subject_id: record.get_i64("id_asignatura_prerrequisito")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_reference(Self::NAME, "subject_id", self.subject_id)?;
        require_reference(Self::NAME, "required_subject_id", self.required_subject_id)?;
        if self.subject_id == self.required_subject_id {
            return Err(ValidationError::SelfPrerequisite(self.subject_id));
        }
        Ok(())
    }
}

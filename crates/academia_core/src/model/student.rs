//! Student record.

use super::validation::{require_email, require_text, ValidationError};
use super::{opt_id_value, Entity, StudentId};
use crate::access::{Record, RecordResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Option<StudentId>,
    pub name: String,
    /// Unique across students.
    pub email: String,
}

impl Student {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Entity for Student {
    type Key = StudentId;

    const NAME: &'static str = "student";
    const TABLE: &'static str = "estudiante";
    const KEY_COLUMNS: &'static [&'static str] = &["id_estudiante"];
    const GENERATED_KEY: bool = true;

    fn key(&self) -> Option<StudentId> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_estudiante", opt_id_value(self.id))
            .with("nombre", self.name.clone())
            .with("correo", self.email.clone())
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        Ok(Self {
            id: record.get_opt_i64("id_estudiante")?,
            name: record.get_text("nombre")?,
            email: record.get_text("correo")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::NAME, "name", &self.name)?;
        require_email(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::Student;
    use crate::model::Entity;

    #[test]
    fn record_round_trip_preserves_every_field() {
        let unsaved = Student::new("Ana Pérez", "ana@uni.cl");
        assert_eq!(Student::from_record(&unsaved.to_record()).unwrap(), unsaved);

        let mut saved = unsaved.clone();
        saved.id = Some(12);
        assert_eq!(Student::from_record(&saved.to_record()).unwrap(), saved);
    }

    #[test]
    fn email_needs_an_at_sign() {
        assert!(Student::new("Ana", "ana@uni.cl").is_valid());
        assert!(!Student::new("Ana", "ana.uni.cl").is_valid());
        assert!(!Student::new(" ", "ana@uni.cl").is_valid());
    }
}

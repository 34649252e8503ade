//! Subject and thematic-axis records.

use super::validation::{
    require_non_negative, require_positive, require_reference, require_text, ValidationError,
};
use super::{opt_id_value, AxisId, CareerId, Entity, SubjectId};
use crate::access::{Record, RecordError, RecordResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Mandatory,
    Elective,
}

impl SubjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mandatory => "obligatoria",
            Self::Elective => "electiva",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "obligatoria" => Some(Self::Mandatory),
            "electiva" => Some(Self::Elective),
            _ => None,
        }
    }
}

/// Course unit belonging to exactly one career.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Option<SubjectId>,
    /// Unique institutional code.
    pub code: String,
    pub name: String,
    pub credits: i64,
    pub weekly_hours: i64,
    pub kind: SubjectKind,
    pub semester: Option<i64>,
    pub career_id: CareerId,
}

impl Subject {
    pub fn new(
        career_id: CareerId,
        code: impl Into<String>,
        name: impl Into<String>,
        credits: i64,
    ) -> Self {
        Self {
            id: None,
            code: code.into(),
            name: name.into(),
            credits,
            weekly_hours: 0,
            kind: SubjectKind::Mandatory,
            semester: None,
            career_id,
        }
    }
}

impl Entity for Subject {
    type Key = SubjectId;

    const NAME: &'static str = "subject";
    const TABLE: &'static str = "asignatura";
    const KEY_COLUMNS: &'static [&'static str] = &["id_asignatura"];
    const GENERATED_KEY: bool = true;

    fn key(&self) -> Option<SubjectId> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_asignatura", opt_id_value(self.id))
            .with("codigo", self.code.clone())
            .with("nombre", self.name.clone())
            .with("creditos", self.credits)
            .with("horas_semanales", self.weekly_hours)
            .with("tipo", self.kind.as_str().to_string())
            .with("semestre", opt_id_value(self.semester))
            .with("id_carrera", self.career_id)
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        let kind_text = record.get_text("tipo")?;
        let kind = SubjectKind::parse(&kind_text).ok_or_else(|| RecordError::InvalidField {
            field: "tipo".to_string(),
            message: format!("unknown subject kind `{kind_text}`"),
        })?;
        Ok(Self {
            id: record.get_opt_i64("id_asignatura")?,
            code: record.get_text("codigo")?,
            name: record.get_text("nombre")?,
            credits: record.get_i64("creditos")?,
            weekly_hours: record.get_i64("horas_semanales")?,
            kind,
            semester: record.get_opt_i64("semestre")?,
            career_id: record.get_i64("id_carrera")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::NAME, "code", &self.code)?;
        require_text(Self::NAME, "name", &self.name)?;
        require_positive(Self::NAME, "credits", self.credits)?;
        require_non_negative(Self::NAME, "weekly_hours", self.weekly_hours)?;
        if let Some(semester) = self.semester {
            require_positive(Self::NAME, "semester", semester)?;
        }
        require_reference(Self::NAME, "career_id", self.career_id)
    }
}

/// Ordered topic block inside a subject; activities hang from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThematicAxis {
    pub id: Option<AxisId>,
    pub name: String,
    /// Display order within the subject, ascending.
    pub order: i64,
    pub subject_id: SubjectId,
}

impl ThematicAxis {
    pub fn new(subject_id: SubjectId, name: impl Into<String>, order: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            order,
            subject_id,
        }
    }
}

impl Entity for ThematicAxis {
    type Key = AxisId;

    const NAME: &'static str = "thematic_axis";
    const TABLE: &'static str = "eje_tematico";
    const KEY_COLUMNS: &'static [&'static str] = &["id_eje"];
    const GENERATED_KEY: bool = true;

    fn key(&self) -> Option<AxisId> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_eje", opt_id_value(self.id))
            .with("nombre", self.name.clone())
            .with("orden", self.order)
            .with("id_asignatura", self.subject_id)
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        Ok(Self {
            id: record.get_opt_i64("id_eje")?,
            name: record.get_text("nombre")?,
            order: record.get_i64("orden")?,
            subject_id: record.get_i64("id_asignatura")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::NAME, "name", &self.name)?;
        require_non_negative(Self::NAME, "order", self.order)?;
        require_reference(Self::NAME, "subject_id", self.subject_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{Subject, SubjectKind, ThematicAxis};
    use crate::model::validation::ValidationError;
    use crate::model::Entity;

    #[test]
    fn subject_requires_positive_credits_and_a_career() {
        let subject = Subject::new(1, "MAT101", "Cálculo I", 6);
        assert!(subject.is_valid());

        let mut free = subject.clone();
        free.credits = 0;
        assert!(matches!(
            free.validate(),
            Err(ValidationError::NotPositive { field: "credits", .. })
        ));

        let mut orphan = subject;
        orphan.career_id = 0;
        assert!(matches!(
            orphan.validate(),
            Err(ValidationError::MissingReference { field: "career_id", .. })
        ));
    }

    #[test]
    fn records_round_trip() {
        let mut subject = Subject::new(2, "FIS110", "Física", 5);
        subject.id = Some(9);
        subject.kind = SubjectKind::Elective;
        subject.semester = Some(3);
        subject.weekly_hours = 4;
        assert_eq!(Subject::from_record(&subject.to_record()).unwrap(), subject);

        let mut axis = ThematicAxis::new(9, "Cinemática", 1);
        axis.id = Some(4);
        assert_eq!(ThematicAxis::from_record(&axis.to_record()).unwrap(), axis);
    }
}

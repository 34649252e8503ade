//! Career (degree programme) record.

use super::validation::{require_non_negative, require_optional_text, require_text, ValidationError};
use super::{opt_id_value, opt_text_value, CareerId, Entity};
use crate::access::{Record, RecordResult};
use serde::{Deserialize, Serialize};

/// Degree programme owning a set of subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Career {
    pub id: Option<CareerId>,
    /// Institutional code; unique when present.
    pub code: Option<String>,
    pub name: String,
    /// Study plan identifier, e.g. `2020`.
    pub plan: Option<String>,
    /// Delivery modality, e.g. on-site or online.
    pub modality: Option<String>,
    pub total_credits: i64,
}

impl Career {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            code: None,
            name: name.into(),
            plan: None,
            modality: None,
            total_credits: 0,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl Entity for Career {
    type Key = CareerId;

    const NAME: &'static str = "career";
    const TABLE: &'static str = "carrera";
    const KEY_COLUMNS: &'static [&'static str] = &["id_carrera"];
    const GENERATED_KEY: bool = true;

    fn key(&self) -> Option<CareerId> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_carrera", opt_id_value(self.id))
            .with("codigo", opt_text_value(self.code.as_deref()))
            .with("nombre", self.name.clone())
            .with("plan", opt_text_value(self.plan.as_deref()))
            .with("modalidad", opt_text_value(self.modality.as_deref()))
            .with("creditos_totales", self.total_credits)
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        Ok(Self {
            id: record.get_opt_i64("id_carrera")?,
            code: record.get_opt_text("codigo")?,
            name: record.get_text("nombre")?,
            plan: record.get_opt_text("plan")?,
            modality: record.get_opt_text("modalidad")?,
            total_credits: record.get_i64("creditos_totales")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::NAME, "name", &self.name)?;
        require_optional_text(Self::NAME, "code", self.code.as_deref())?;
        require_non_negative(Self::NAME, "total_credits", self.total_credits)
    }
}

#[cfg(test)]
mod tests {
    use super::Career;
    use crate::model::Entity;

    #[test]
    fn empty_code_is_rejected_but_missing_code_is_fine() {
        let career = Career::new("Ingeniería Civil");
        assert!(career.is_valid());
        assert!(!career.clone().with_code("  ").is_valid());
    }

    #[test]
    fn record_round_trip_preserves_every_field() {
        let mut career = Career::new("Derecho").with_code("DER");
        career.id = Some(3);
        career.plan = Some("2021".to_string());
        career.modality = Some("presencial".to_string());
        career.total_credits = 300;
        assert_eq!(Career::from_record(&career.to_record()).unwrap(), career);
    }
}

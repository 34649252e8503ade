//! Activity types and scheduled activities.

use super::validation::{require_date_order, require_reference, require_text, ValidationError};
use super::{opt_id_value, opt_text_value, ActivityId, ActivityTypeId, AxisId, Entity};
use crate::access::{opt_date_value, Record, RecordError, RecordResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Priority of an activity type; stored as `0`, `1`, `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Low),
            1 => Some(Self::Medium),
            2 => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Baja",
            Self::Medium => "Media",
            Self::High => "Alta",
        }
    }
}

/// Category of activity (exam, assignment, lab...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityType {
    pub id: Option<ActivityTypeId>,
    pub name: String,
    /// Unique short code, e.g. `PEP` or `TAR`.
    pub short_code: String,
    pub description: Option<String>,
    pub priority: Priority,
}

impl ActivityType {
    pub fn new(name: impl Into<String>, short_code: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: None,
            name: name.into(),
            short_code: short_code.into(),
            description: None,
            priority,
        }
    }
}

impl Entity for ActivityType {
    type Key = ActivityTypeId;

    const NAME: &'static str = "activity_type";
    const TABLE: &'static str = "tipo_actividad";
    const KEY_COLUMNS: &'static [&'static str] = &["id_tipo_actividad"];
    const GENERATED_KEY: bool = true;

    fn key(&self) -> Option<ActivityTypeId> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_tipo_actividad", opt_id_value(self.id))
            .with("nombre", self.name.clone())
            .with("siglas", self.short_code.clone())
            .with("descripcion", opt_text_value(self.description.as_deref()))
            .with("prioridad", self.priority.as_i64())
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        let raw_priority = record.get_i64("prioridad")?;
        let priority = Priority::from_i64(raw_priority).ok_or_else(|| RecordError::InvalidField {
            field: "prioridad".to_string(),
            message: format!("priority must be 0, 1 or 2, got {raw_priority}"),
        })?;
        Ok(Self {
            id: record.get_opt_i64("id_tipo_actividad")?,
            name: record.get_text("nombre")?,
            short_code: record.get_text("siglas")?,
            description: record.get_opt_text("descripcion")?,
            priority,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::NAME, "name", &self.name)?;
        require_text(Self::NAME, "short_code", &self.short_code)
    }
}

/// Scheduled piece of work inside a thematic axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Option<ActivityId>,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    pub axis_id: AxisId,
    pub activity_type_id: ActivityTypeId,
}

impl Activity {
    pub fn new(axis_id: AxisId, activity_type_id: ActivityTypeId, title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            start_date: None,
            due_date: None,
            axis_id,
            activity_type_id,
        }
    }

    pub fn scheduled(mut self, start: NaiveDate, due: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.due_date = Some(due);
        self
    }

    /// Whether start and due fall on different days.
    pub fn spans_range(&self) -> bool {
        matches!((self.start_date, self.due_date), (Some(start), Some(due)) if start != due)
    }
}

impl Entity for Activity {
    type Key = ActivityId;

    const NAME: &'static str = "activity";
    const TABLE: &'static str = "actividad";
    const KEY_COLUMNS: &'static [&'static str] = &["id_actividad"];
    const GENERATED_KEY: bool = true;

    fn key(&self) -> Option<ActivityId> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_actividad", opt_id_value(self.id))
            .with("titulo", self.title.clone())
            .with("descripcion", opt_text_value(self.description.as_deref()))
            .with("fecha_inicio", opt_date_value(self.start_date))
            .with("fecha_fin", opt_date_value(self.due_date))
            .with("id_eje", self.axis_id)
            .with("id_tipo_actividad", self.activity_type_id)
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        Ok(Self {
            id: record.get_opt_i64("id_actividad")?,
            title: record.get_text("titulo")?,
            description: record.get_opt_text("descripcion")?,
            start_date: record.get_opt_date("fecha_inicio")?,
            due_date: record.get_opt_date("fecha_fin")?,
            axis_id: record.get_i64("id_eje")?,
            activity_type_id: record.get_i64("id_tipo_actividad")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::NAME, "title", &self.title)?;
        require_reference(Self::NAME, "axis_id", self.axis_id)?;
        require_reference(Self::NAME, "activity_type_id", self.activity_type_id)?;
        require_date_order(Self::NAME, self.start_date, self.due_date)
    }
}

#[cfg(test)]
mod tests {
    use super::{Activity, ActivityType, Priority};
    use crate::model::Entity;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn priority_maps_to_stored_integers() {
        for priority in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(Priority::from_i64(priority.as_i64()), Some(priority));
        }
        assert_eq!(Priority::from_i64(3), None);
    }

    #[test]
    fn activity_rejects_due_before_start() {
        let activity = Activity::new(1, 1, "Informe").scheduled(day(3), day(1));
        assert!(!activity.is_valid());
        assert!(Activity::new(1, 1, "Informe").scheduled(day(1), day(1)).is_valid());
    }

    #[test]
    fn records_round_trip() {
        let mut kind = ActivityType::new("Prueba", "PEP", Priority::High);
        kind.id = Some(1);
        kind.description = Some("Evaluación escrita".to_string());
        assert_eq!(ActivityType::from_record(&kind.to_record()).unwrap(), kind);

        let mut activity = Activity::new(2, 1, "Control 1").scheduled(day(1), day(3));
        activity.id = Some(5);
        assert!(activity.spans_range());
        assert_eq!(Activity::from_record(&activity.to_record()).unwrap(), activity);
    }
}

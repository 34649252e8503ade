//! Institutional calendar event (holiday, exam week, administrative date).

use super::validation::{require_date_order, require_optional_text, require_text, ValidationError};
use super::{opt_id_value, opt_text_value, Entity, EventId};
use crate::access::{date_value, opt_date_value, Record, RecordResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Option<EventId>,
    pub title: String,
    /// Free text, e.g. `feriado`, `examen`, `administrativo`.
    pub kind: Option<String>,
    pub start_date: NaiveDate,
    /// `None` means a single-day event.
    pub end_date: Option<NaiveDate>,
    /// Whether the event shifts or suspends scheduled activities.
    pub affects_activities: bool,
}

impl CalendarEvent {
    pub fn new(title: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            id: None,
            title: title.into(),
            kind: None,
            start_date,
            end_date: None,
            affects_activities: false,
        }
    }

    /// Last day covered by the event.
    pub fn last_day(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }

    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.last_day()
    }
}

impl Entity for CalendarEvent {
    type Key = EventId;

    const NAME: &'static str = "calendar_event";
    const TABLE: &'static str = "calendario_evento";
    const KEY_COLUMNS: &'static [&'static str] = &["id_evento"];
    const GENERATED_KEY: bool = true;

    fn key(&self) -> Option<EventId> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id_evento", opt_id_value(self.id))
            .with("titulo", self.title.clone())
            .with("tipo", opt_text_value(self.kind.as_deref()))
            .with("fecha_inicio", date_value(self.start_date))
            .with("fecha_fin", opt_date_value(self.end_date))
            .with("afecta_actividades", self.affects_activities)
    }

    fn from_record(record: &Record) -> RecordResult<Self> {
        Ok(Self {
            id: record.get_opt_i64("id_evento")?,
            title: record.get_text("titulo")?,
            kind: record.get_opt_text("tipo")?,
            start_date: record.get_date("fecha_inicio")?,
            end_date: record.get_opt_date("fecha_fin")?,
            affects_activities: record.get_bool("afecta_actividades")?,
        })
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Self::NAME, "title", &self.title)?;
        require_optional_text(Self::NAME, "kind", self.kind.as_deref())?;
        require_date_order(Self::NAME, Some(self.start_date), self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::CalendarEvent;
    use crate::model::Entity;
    use chrono::NaiveDate;

    #[test]
    fn single_day_event_covers_only_its_day() {
        let day = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let event = CalendarEvent::new("Feriado", day);
        assert!(event.covers(day));
        assert!(!event.covers(day.succ_opt().unwrap()));
    }

    #[test]
    fn record_round_trip() {
        let mut event = CalendarEvent::new(
            "Semana de exámenes",
            NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
        );
        event.id = Some(2);
        event.kind = Some("examen".to_string());
        event.end_date = NaiveDate::from_ymd_opt(2025, 7, 11);
        event.affects_activities = true;
        assert_eq!(CalendarEvent::from_record(&event.to_record()).unwrap(), event);
    }
}

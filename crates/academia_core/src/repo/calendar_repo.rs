//! Institutional calendar events.

use super::entity_store::{EntityStore, RepoResult};
use crate::access::date_value;
use crate::model::calendar_event::CalendarEvent;
use crate::model::EventId;
use chrono::NaiveDate;
use rusqlite::Connection;

pub trait CalendarRepository {
    fn create_event(&self, event: &CalendarEvent) -> RepoResult<EventId>;
    fn update_event(&self, event: &CalendarEvent) -> RepoResult<()>;
    fn delete_event(&self, id: EventId) -> RepoResult<()>;
    fn get_event(&self, id: EventId) -> RepoResult<Option<CalendarEvent>>;
    /// Events overlapping `[from, to]` (inclusive), by start date.
    fn events_in_range(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<Vec<CalendarEvent>>;
    fn events_affecting_activities(&self) -> RepoResult<Vec<CalendarEvent>>;
}

pub struct SqliteCalendarRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCalendarRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn events(&self) -> EntityStore<'conn, CalendarEvent> {
        EntityStore::new(self.conn)
    }
}

impl CalendarRepository for SqliteCalendarRepository<'_> {
    fn create_event(&self, event: &CalendarEvent) -> RepoResult<EventId> {
        self.events().insert(event)
    }

    fn update_event(&self, event: &CalendarEvent) -> RepoResult<()> {
        self.events().update(event)
    }

    fn delete_event(&self, id: EventId) -> RepoResult<()> {
        self.events().delete(id)
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<CalendarEvent>> {
        self.events().get(id)
    }

    fn events_in_range(&self, from: NaiveDate, to: NaiveDate) -> RepoResult<Vec<CalendarEvent>> {
        self.events().list_where(
            "fecha_inicio <= ?2 AND COALESCE(fecha_fin, fecha_inicio) >= ?1",
            &[date_value(from), date_value(to)],
            "fecha_inicio, id_evento",
        )
    }

    fn events_affecting_activities(&self) -> RepoResult<Vec<CalendarEvent>> {
        self.events()
            .list_where("afecta_actividades = 1", &[], "fecha_inicio, id_evento")
    }
}

#![forbid(unsafe_code)]

//! Calendar events shown by the week view.
//!
//! [`EventStore`] keeps its items sorted by start time; layout code relies
//! on that order.

use chrono::{NaiveDate, NaiveDateTime};
use weft_core::{Result, ValidationRejected};

/// One calendar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl CalendarEvent {
    /// Fails when `end` is before `start`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self> {
        if end < start {
            return Err(ValidationRejected::new("end", format!("{end} is before {start}")).into());
        }
        Ok(Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
        })
    }

    /// Starts and ends on `date`.
    #[must_use]
    pub fn falls_on(&self, date: NaiveDate) -> bool {
        self.start.date() == date && self.end.date() == date
    }

    /// Length in hours.
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_minutes() as f64 / 60.0
    }
}

/// Events ordered by start time, ties kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStore {
    items: Vec<CalendarEvent>,
}

impl EventStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: impl IntoIterator<Item = CalendarEvent>) -> Self {
        let mut items: Vec<CalendarEvent> = events.into_iter().collect();
        items.sort_by_key(|e| e.start);
        Self { items }
    }

    /// Insert at its sorted position. An existing event with the same id
    /// is replaced.
    pub fn insert(&mut self, event: CalendarEvent) {
        self.remove(&event.id);
        let at = self.items.partition_point(|e| e.start <= event.start);
        self.items.insert(at, event);
    }

    pub fn remove(&mut self, id: &str) -> Option<CalendarEvent> {
        let at = self.items.iter().position(|e| e.id == id)?;
        Some(self.items.remove(at))
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.items.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarEvent> {
        self.items.iter()
    }

    /// Single-day events on `date`, by start time.
    pub fn on(&self, date: NaiveDate) -> impl Iterator<Item = &CalendarEvent> {
        self.items.iter().filter(move |e| e.falls_on(date))
    }
}

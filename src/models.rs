// =============================================================================
// models.rs — THE PARCEL AND EVERYTHING THAT HAPPENED TO IT
// =============================================================================
//
// Two value types carry the whole engine:
//
// - ParcelEvent: one scan, one timestamp, one line in the history.
// - ParcelInfo:  everything one courier (or all of them, after merging)
//                knows about the shipment.
//
// Records are built fresh for every resolution and handed around by value.
// Nobody keeps a shared "empty parcel" lying around for everyone to scribble
// on, and the merger never touches its inputs.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A single tracking milestone reported by one provider.
///
/// Events can only be built with an already-parsed timestamp. An upstream
/// row whose date cannot be parsed never becomes a ParcelEvent at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParcelEvent {
    provider_name: String,
    timestamp: DateTime<Utc>,
    location: Option<String>,
    message: String,
}

impl ParcelEvent {
    /// Build an event. An empty or whitespace-only location is stored as `None`.
    pub fn new(
        provider_name: impl Into<String>,
        timestamp: DateTime<Utc>,
        location: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            timestamp,
            location: location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            message: message.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParcelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.provider_name,
            self.timestamp.format("%d.%m.%Y %H:%M:%S")
        )?;
        if let Some(location) = &self.location {
            write!(f, " - {}", location)?;
        }
        write!(f, " - {}", self.message)
    }
}

/// Everything known about one shipment.
///
/// A partial record comes out of exactly one provider fetch. The canonical
/// record comes out of [`crate::merge::merge_parcels`]. Zero values mean
/// "unknown": an empty string, `0.0` kg, `0` days.
///
/// Serialize-only. Every way of building one goes through the event
/// methods below, so the newest-first order always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParcelInfo {
    /// Every alias this shipment is known by, in discovery order.
    /// Duplicates are kept.
    pub tracking_numbers: Vec<String>,
    pub destination: String,
    pub origin: String,
    pub weight_kg: f64,
    pub channel: String,
    pub provider_label: String,
    pub days_in_transit: i64,
    events: Vec<ParcelEvent>,
}

impl ParcelInfo {
    /// A fresh zero-value record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events, most recent first.
    pub fn events(&self) -> &[ParcelEvent] {
        &self.events
    }

    /// Add one event and restore newest-first order.
    pub fn push_event(&mut self, event: ParcelEvent) {
        self.events.push(event);
        self.sort_events();
    }

    /// Add many events and restore newest-first order.
    pub fn extend_events<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = ParcelEvent>,
    {
        self.events.extend(events);
        self.sort_events();
    }

    /// Hand the event history over, leaving this record without events.
    pub fn take_events(&mut self) -> Vec<ParcelEvent> {
        std::mem::take(&mut self.events)
    }

    /// A record with neither a destination nor any events is what a
    /// provider hands back when it had nothing useful to say.
    pub fn is_empty(&self) -> bool {
        self.destination.is_empty() && self.events.is_empty()
    }

    fn sort_events(&mut self) {
        // Stable, so same-instant events keep their discovery order.
        self.events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }
}

impl fmt::Display for ParcelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ParcelInfo(tracking_numbers=[{}], to={}, origin={}, weight={}kg, channel={}, provider={}, days_in_transit={}, events={})",
            self.tracking_numbers.join(", "),
            self.destination,
            self.origin,
            self.weight_kg,
            self.channel,
            self.provider_label,
            self.days_in_transit,
            self.events.len()
        )
    }
}

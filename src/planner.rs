//! Page state for one planner session: the draft form, the pins dropped on
//! the map since the last save, and the saved trips.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    draft::{DraftField, DraftForm},
    trip::{Coordinate, Trip},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    #[error("Please select a location on the map.")]
    MissingLocation,
    #[error("unknown form field: {0}")]
    UnknownField(String),
}

/// How a map click treats pins that are already pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinMode {
    /// Every click adds a pin; only the last one is saved with the trip.
    #[default]
    Accumulate,
    /// A click replaces the pending pin.
    Replace,
}

impl PinMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinMode::Accumulate => "accumulate",
            PinMode::Replace => "replace",
        }
    }
}

impl FromStr for PinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accumulate" => Ok(PinMode::Accumulate),
            "replace" => Ok(PinMode::Replace),
            other => Err(format!("unknown pin mode `{other}`")),
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TripPlanner {
    mode: PinMode,
    draft: DraftForm,
    pending_pins: Vec<Coordinate>,
    trips: Vec<Trip>,
}

impl TripPlanner {
    pub fn new(mode: PinMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> PinMode {
        self.mode
    }

    pub fn draft(&self) -> &DraftForm {
        &self.draft
    }

    pub fn pending_pins(&self) -> &[Coordinate] {
        &self.pending_pins
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn handle_input_change(&mut self, field: DraftField, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    pub fn add_marker(&mut self, coordinate: Coordinate) {
        if self.mode == PinMode::Replace {
            self.pending_pins.clear();
        }
        self.pending_pins.push(coordinate);
    }

    /// Commits the draft at the most recent pin and returns the new trip.
    /// Without a pin nothing changes and `MissingLocation` is returned.
    pub fn handle_submit(&mut self, now: DateTime<Utc>) -> Result<Trip, PlannerError> {
        let location = *self
            .pending_pins
            .last()
            .ok_or(PlannerError::MissingLocation)?;

        let id = self.next_id(now);
        let trip = Trip::from_draft(id, std::mem::take(&mut self.draft), location);
        self.pending_pins.clear();
        self.trips.push(trip.clone());

        Ok(trip)
    }

    // Millisecond timestamps collide for quick successive saves, so ids
    // never go below the previous one plus one.
    fn next_id(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_millis();
        match self.trips.last() {
            Some(last) if candidate <= last.id => last.id + 1,
            _ => candidate,
        }
    }
}

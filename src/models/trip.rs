use std::fmt;

use serde::{Deserialize, Serialize};

use super::draft::DraftForm;

/// A point on the map, in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_within_bounds(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Creation time in Unix milliseconds, unique per planner.
    pub id: i64,
    pub name: String,
    pub date: String,
    pub duration: String,
    pub description: String,
    pub location: Coordinate,
}

impl Trip {
    pub fn from_draft(id: i64, draft: DraftForm, location: Coordinate) -> Self {
        Self {
            id,
            name: draft.name,
            date: draft.date,
            duration: draft.duration,
            description: draft.description,
            location,
        }
    }
}

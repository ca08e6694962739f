use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::planner::PlannerError;

/// In-progress values of the trip form. Nothing here is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftForm {
    pub name: String,
    pub date: String,
    pub duration: String,
    pub description: String,
}

impl DraftForm {
    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let slot = match field {
            DraftField::Name => &mut self.name,
            DraftField::Date => &mut self.date,
            DraftField::Duration => &mut self.duration,
            DraftField::Description => &mut self.description,
        };
        *slot = value.into();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftField {
    Name,
    Date,
    Duration,
    Description,
}

impl DraftField {
    pub const ALL: [DraftField; 4] = [
        DraftField::Name,
        DraftField::Date,
        DraftField::Duration,
        DraftField::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Name => "name",
            DraftField::Date => "date",
            DraftField::Duration => "duration",
            DraftField::Description => "description",
        }
    }
}

impl FromStr for DraftField {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DraftField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| PlannerError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

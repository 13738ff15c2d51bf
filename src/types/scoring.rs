use crate::types::worker::WorkerId;
use serde::Serialize;
use std::fmt;

pub type Score = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    PatientsServed,
    CriticalCases,
    ResponseTime,
    LocationAccessibility,
    SpecializationCriticality,
    LastActive,
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PatientsServed => "patientsServed",
            Self::CriticalCases => "criticalCases",
            Self::ResponseTime => "responseTimeAvgMinutes",
            Self::LocationAccessibility => "locationAccessibilityScore",
            Self::SpecializationCriticality => "specializationCriticality",
            Self::LastActive => "lastActiveTimestamp",
        };
        f.write_str(name)
    }
}

/// An out-of-range input that the scorer clamped instead of rejecting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputFlag {
    pub worker_id: WorkerId,
    pub field: InputField,
    pub original: String,
    pub clamped_to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactScore {
    pub worker_id: WorkerId,
    pub score: Score,
    pub recency_factor: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<InputFlag>,
}

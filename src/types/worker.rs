use crate::types::scoring::{InputField, InputFlag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

pub type WorkerId = String;

/// A healthcare worker record as supplied by the registry.
///
/// Numeric fields that are missing or `null` default to zero. Counts are signed
/// so that malformed negative values reach the scorer, which clamps and flags them.
/// Values of the wrong JSON type are coerced while parsing and recorded in
/// `coerced_inputs` rather than failing the whole roster.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", from = "WorkerRecord")]
pub struct HealthWorker {
    pub id: WorkerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub is_verified: bool,
    pub patients_served: i64,
    pub critical_cases: i64,
    pub response_time_avg_minutes: f64,
    pub location_accessibility_score: f64,
    pub specializations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization_criticality: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_timestamp: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub coerced_inputs: Vec<InputFlag>,
}

impl HealthWorker {
    pub fn new(id: impl Into<WorkerId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            address: None,
            is_verified: true,
            patients_served: 0,
            critical_cases: 0,
            response_time_avg_minutes: 0.0,
            location_accessibility_score: 0.0,
            specializations: Vec::new(),
            specialization_criticality: None,
            last_active_timestamp: None,
            coerced_inputs: Vec::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Wire shape of a roster entry. Numeric fields stay untyped until conversion.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkerRecord {
    id: WorkerId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    is_verified: bool,
    #[serde(default)]
    patients_served: Value,
    #[serde(default)]
    critical_cases: Value,
    #[serde(default)]
    response_time_avg_minutes: Value,
    #[serde(default)]
    location_accessibility_score: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    specializations: Vec<String>,
    #[serde(default)]
    specialization_criticality: Value,
    #[serde(default)]
    last_active_timestamp: Option<DateTime<Utc>>,
}

impl From<WorkerRecord> for HealthWorker {
    fn from(record: WorkerRecord) -> Self {
        let mut coercer = Coercer {
            worker_id: record.id.clone(),
            flags: Vec::new(),
        };
        let patients_served = coercer.count(InputField::PatientsServed, record.patients_served);
        let critical_cases = coercer.count(InputField::CriticalCases, record.critical_cases);
        let response_time_avg_minutes = coercer
            .measure(InputField::ResponseTime, record.response_time_avg_minutes)
            .unwrap_or_default();
        let location_accessibility_score = coercer
            .measure(
                InputField::LocationAccessibility,
                record.location_accessibility_score,
            )
            .unwrap_or_default();
        let specialization_criticality = coercer.measure(
            InputField::SpecializationCriticality,
            record.specialization_criticality,
        );

        Self {
            id: record.id,
            name: record.name,
            address: record.address,
            is_verified: record.is_verified,
            patients_served,
            critical_cases,
            response_time_avg_minutes,
            location_accessibility_score,
            specializations: record.specializations,
            specialization_criticality,
            last_active_timestamp: record.last_active_timestamp,
            coerced_inputs: coercer.flags,
        }
    }
}

struct Coercer {
    worker_id: WorkerId,
    flags: Vec<InputFlag>,
}

impl Coercer {
    /// Whole counts pass through untouched, negatives included. Fractional or
    /// oversized numbers are floored into `0..=i64::MAX`; anything else is 0.
    fn count(&mut self, field: InputField, value: Value) -> i64 {
        let raw = match &value {
            Value::Null => return 0,
            Value::Number(number) => match number.as_i64() {
                Some(count) => return count,
                None => number.as_f64(),
            },
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        let count = match raw {
            Some(raw) if raw.is_finite() => raw.floor().clamp(0.0, i64::MAX as f64) as i64,
            _ => 0,
        };
        if raw != Some(count as f64) || !value.is_number() {
            self.flag(field, &value, count.to_string());
        }
        count
    }

    /// Numbers pass through, numeric strings are parsed, anything else is unset.
    fn measure(&mut self, field: InputField, value: Value) -> Option<f64> {
        match &value {
            Value::Null => None,
            Value::Number(number) => number.as_f64(),
            Value::String(text) => {
                let parsed = text.trim().parse::<f64>().ok().filter(|raw| raw.is_finite());
                let shown = parsed.map(|raw| raw.to_string()).unwrap_or_else(|| "unset".to_string());
                self.flag(field, &value, shown);
                parsed
            }
            _ => {
                self.flag(field, &value, "unset".to_string());
                None
            }
        }
    }

    fn flag(&mut self, field: InputField, original: &Value, clamped_to: String) {
        warn!(
            worker_id = %self.worker_id,
            field = %field,
            original = %original,
            clamped_to = %clamped_to,
            "malformed input coerced"
        );
        self.flags.push(InputFlag {
            worker_id: self.worker_id.clone(),
            field,
            original: original.to_string(),
            clamped_to,
        });
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

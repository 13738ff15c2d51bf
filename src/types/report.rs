use crate::types::config::ScoringPolicy;
use crate::types::scoring::{ImpactScore, InputFlag};
use crate::types::worker::WorkerId;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionShare {
    pub worker_id: WorkerId,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub id: String,
    pub title: String,
    pub body: String,
    pub blocking: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<WorkerId>,
}

impl Finding {
    pub fn warning(id: &str, title: &str, body: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            body: body.into(),
            blocking: false,
            worker_id: None,
        }
    }

    pub fn blocking(id: &str, title: &str, body: impl Into<String>) -> Self {
        Self {
            blocking: true,
            ..Self::warning(id, title, body)
        }
    }

    pub fn for_worker(mut self, worker_id: &str) -> Self {
        self.worker_id = Some(worker_id.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionReport {
    pub evaluated_at: DateTime<Utc>,
    pub policy: ScoringPolicy,
    pub scores: Vec<ImpactScore>,
    pub shares: Vec<DistributionShare>,
    pub excluded: Vec<WorkerId>,
    pub flags: Vec<InputFlag>,
    pub findings: Vec<Finding>,
    pub floor_relaxed: bool,
    pub equal_split: bool,
}

impl DistributionReport {
    pub fn has_blocking(&self) -> bool {
        self.findings.iter().any(|finding| finding.blocking)
    }

    pub fn share_of(&self, worker_id: &str) -> Option<f64> {
        self.shares
            .iter()
            .find(|share| share.worker_id == worker_id)
            .map(|share| share.percentage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationAllocation {
    pub worker_id: WorkerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub percentage: f64,
    pub amount: f64,
}

use crate::error::{FlamebornError, Result};
use crate::types::worker::HealthWorker;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Source of healthcare worker records. Each call returns one consistent snapshot.
pub trait WorkerRegistry {
    fn snapshot(&self) -> Result<Vec<HealthWorker>>;
}

/// A roster stored as JSON: either a bare array of workers or `{ "workers": [...] }`.
#[derive(Debug, Clone)]
pub struct JsonRoster {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RosterDocument {
    List(Vec<HealthWorker>),
    Wrapped { workers: Vec<HealthWorker> },
}

impl JsonRoster {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkerRegistry for JsonRoster {
    fn snapshot(&self) -> Result<Vec<HealthWorker>> {
        if !self.path.exists() {
            return Err(FlamebornError::RosterNotFound(
                self.path.display().to_string(),
            ));
        }
        let content = std::fs::read_to_string(&self.path)?;
        let workers = parse_roster(&content)
            .map_err(|e| FlamebornError::RosterParse(format!("{}: {}", self.path.display(), e)))?;
        tracing::debug!(
            path = %self.path.display(),
            workers = workers.len(),
            "loaded roster snapshot"
        );
        Ok(workers)
    }
}

pub fn parse_roster(content: &str) -> std::result::Result<Vec<HealthWorker>, serde_json::Error> {
    let document: RosterDocument = serde_json::from_str(content)?;
    Ok(match document {
        RosterDocument::List(workers) => workers,
        RosterDocument::Wrapped { workers } => workers,
    })
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::types::{AnalysisResponse, HealthStatus};

/// One completed analysis. Records live in memory for the lifetime of the
/// engine; nothing is written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub ts: DateTime<Utc>,
    pub file_name: String,
    pub status: HealthStatus,
    pub confidence_score: f64,
    pub abnormality_count: usize,
}

#[derive(Debug, Default)]
pub struct SessionHistory {
    entries: Vec<AnalysisRecord>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, file_name: &str, response: &AnalysisResponse) {
        let record = AnalysisRecord {
            id: uuid::Uuid::new_v4().to_string(),
            ts: Utc::now(),
            file_name: file_name.to_string(),
            status: response.plant_analysis.status.clone(),
            confidence_score: response.confidence_score,
            abnormality_count: response.abnormalities().len(),
        };
        tracing::debug!(id = %record.id, file = %record.file_name, status = %record.status, "analysis recorded");
        self.entries.push(record);
    }

    pub fn entries(&self) -> &[AnalysisRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Batch metrics derived from result rows

use crate::types::ResultRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub total: usize,
    /// Rows without validation issues
    pub resolved: usize,
    pub failed: usize,
    /// Mean processing time over all rows; 0 when there are none
    pub average_processing_secs: f64,
}

impl BatchMetrics {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let total = records.len();
        let resolved = records.iter().filter(|r| r.is_resolved()).count();
        let average_processing_secs = if total == 0 {
            0.0
        } else {
            records.iter().map(|r| r.processing_time_secs).sum::<f64>() / total as f64
        };

        Self {
            total,
            resolved,
            failed: total - resolved,
            average_processing_secs,
        }
    }

    /// Fraction of rows resolved, 0 when empty
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.resolved as f64 / self.total as f64
        }
    }
}

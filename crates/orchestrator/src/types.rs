//! Public API types for batch resolution

use crate::aggregator::ResultSet;
use crate::metrics::BatchMetrics;
use bioresolve_core::{EntityName, EntityResolution, ResolutionContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix written into validation issues when the gateway call failed
pub const FAILURE_PREFIX: &str = "Resolution failed: ";

/// Lifecycle of a resolution session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    RunningInitial,
    DeepSearchPending,
    RunningDeepSearch,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RunningInitial => "running_initial",
            Self::DeepSearchPending => "deep_search_pending",
            Self::RunningDeepSearch => "running_deep_search",
            Self::Complete => "complete",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::RunningInitial | Self::RunningDeepSearch)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one resolver task: the gateway payload or a failure message
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    /// Identity key, never modified
    pub input_entity: EntityName,
    pub result: Result<EntityResolution, String>,
    /// Wall-clock time spent on the call, populated on failure too
    pub elapsed_seconds: f64,
}

impl ResolutionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.result.as_ref().err().map(String::as_str)
    }
}

/// Exported row derived from a [`ResolutionOutcome`].
///
/// A non-empty `validation_issues` marks the row as unresolved or partial,
/// which makes it a candidate for the deep-search phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub input_entity: EntityName,
    pub corrected_name: String,
    pub resolved_name: String,
    pub entity_type: String,
    pub synonyms: Vec<String>,
    pub pathways: Vec<String>,
    pub function: String,
    pub cellular_component: String,
    pub ontology_id: String,
    pub ontology_term: String,
    pub identifiers: BTreeMap<String, String>,
    pub links: BTreeMap<String, String>,
    pub validation_issues: String,
    pub processing_time_secs: f64,
    /// Produced by the deep-search phase
    #[serde(default)]
    pub deep_search: bool,
}

impl ResultRecord {
    /// Flatten an outcome into a row
    pub fn from_outcome(outcome: ResolutionOutcome, deep_search: bool) -> Self {
        let ResolutionOutcome {
            input_entity,
            result,
            elapsed_seconds,
        } = outcome;

        match result {
            Ok(payload) => {
                let validation_issues = payload.reported_issues().unwrap_or_default().to_string();
                Self {
                    input_entity,
                    corrected_name: payload.corrected_name,
                    resolved_name: payload.resolved_name,
                    entity_type: payload.entity_type,
                    synonyms: payload.synonyms,
                    pathways: payload.pathways,
                    function: payload.function,
                    cellular_component: payload.cellular_component,
                    ontology_id: payload.ontology_id,
                    ontology_term: payload.ontology_term,
                    identifiers: payload.identifiers,
                    links: payload.links,
                    validation_issues,
                    processing_time_secs: elapsed_seconds,
                    deep_search,
                }
            }
            Err(message) => Self {
                input_entity,
                corrected_name: String::new(),
                resolved_name: String::new(),
                entity_type: String::new(),
                synonyms: Vec::new(),
                pathways: Vec::new(),
                function: String::new(),
                cellular_component: String::new(),
                ontology_id: String::new(),
                ontology_term: String::new(),
                identifiers: BTreeMap::new(),
                links: BTreeMap::new(),
                validation_issues: format!("{FAILURE_PREFIX}{message}"),
                processing_time_secs: elapsed_seconds,
                deep_search,
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.validation_issues.is_empty()
    }
}

/// Progress reported after each window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowProgress {
    /// Zero-based index of the window that just finished
    pub window_index: usize,
    pub window_count: usize,
    /// Entities whose window has completed
    pub completed: usize,
    pub total: usize,
}

/// Read-only view published to renderers and persistence after every window
/// and every phase transition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub results: ResultSet,
    pub phase: Phase,
    pub progress: usize,
    pub total_for_progress: usize,
    #[serde(default)]
    pub logs: Vec<String>,
    /// Context of the last start, reused by deep search
    #[serde(default)]
    pub context: ResolutionContext,
}

impl SessionSnapshot {
    /// Metrics derived from the current rows
    pub fn metrics(&self) -> BatchMetrics {
        BatchMetrics::from_records(self.results.records())
    }
}

/// What a finished phase produced
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseReport {
    /// Phase the session moved to
    pub phase: Phase,
    pub processed: usize,
    pub canceled: bool,
    pub metrics: BatchMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(result: Result<EntityResolution, String>) -> ResolutionOutcome {
        ResolutionOutcome {
            input_entity: EntityName::new("BRCA1").unwrap(),
            result,
            elapsed_seconds: 1.5,
        }
    }

    #[test]
    fn test_success_flattens_payload() {
        let payload = EntityResolution {
            corrected_name: "BRCA1".to_string(),
            resolved_name: "BRCA1 DNA repair associated".to_string(),
            entity_type: "gene".to_string(),
            synonyms: vec!["RNF53".to_string()],
            identifiers: BTreeMap::from([("HGNC".to_string(), "HGNC:1100".to_string())]),
            ..Default::default()
        };
        let record = ResultRecord::from_outcome(outcome(Ok(payload)), false);
        assert!(record.is_resolved());
        assert_eq!(record.resolved_name, "BRCA1 DNA repair associated");
        assert_eq!(record.synonyms, vec!["RNF53"]);
        assert_eq!(record.identifiers["HGNC"], "HGNC:1100");
        assert_eq!(record.processing_time_secs, 1.5);
        assert!(!record.deep_search);
    }

    #[test]
    fn test_partial_payload_keeps_reported_issues() {
        let payload = EntityResolution {
            validation_issues: Some("Ambiguous symbol".to_string()),
            ..Default::default()
        };
        let record = ResultRecord::from_outcome(outcome(Ok(payload)), true);
        assert!(!record.is_resolved());
        assert_eq!(record.validation_issues, "Ambiguous symbol");
        assert!(record.deep_search);
    }

    #[test]
    fn test_failure_populates_issues() {
        let record = ResultRecord::from_outcome(outcome(Err("HTTP 500".to_string())), false);
        assert!(!record.is_resolved());
        assert_eq!(record.validation_issues, "Resolution failed: HTTP 500");
        assert!(record.resolved_name.is_empty());
        assert_eq!(record.processing_time_secs, 1.5);
    }

    #[test]
    fn test_phase_serialization() {
        assert_eq!(
            serde_json::to_string(&Phase::DeepSearchPending).unwrap(),
            "\"deep_search_pending\""
        );
        assert_eq!(Phase::RunningInitial.to_string(), "running_initial");
        assert!(Phase::RunningDeepSearch.is_running());
        assert!(!Phase::Complete.is_running());
    }

    #[test]
    fn test_outcome_accessors() {
        let failed = outcome(Err("timeout".to_string()));
        assert!(!failed.is_success());
        assert_eq!(failed.error_message(), Some("timeout"));
    }
}

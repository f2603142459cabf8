//! Result aggregation: ordered rows plus an index for in-place replacement

use crate::types::{ResolutionOutcome, ResultRecord};
use bioresolve_core::EntityName;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use tracing::warn;

/// Ordered result rows with a lookup from input entity to its first row.
///
/// Rows are appended in launch order during the initial phase. During deep
/// search a row is replaced in place, so its position never changes.
/// Duplicate inputs keep one row each; lookups resolve to the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<ResultRecord>,
    first_index: HashMap<EntityName, usize>,
}

/// What a merge did with a window's outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub appended: usize,
    pub replaced: usize,
    /// Deep-search outcomes with no existing row (appended instead)
    pub unmatched: usize,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ResultRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.append(record);
        }
        set
    }

    pub fn append(&mut self, record: ResultRecord) {
        let index = self.records.len();
        self.first_index
            .entry(record.input_entity.clone())
            .or_insert(index);
        self.records.push(record);
    }

    /// Replace the first row for the record's entity. Returns the record
    /// back when no row exists.
    pub fn replace_first(&mut self, record: ResultRecord) -> Option<ResultRecord> {
        match self.first_index.get(&record.input_entity) {
            Some(&index) => {
                self.records[index] = record;
                None
            }
            None => Some(record),
        }
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn get(&self, entity: &EntityName) -> Option<&ResultRecord> {
        self.first_index.get(entity).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Inputs of rows carrying validation issues, in row order
    pub fn failed_entities(&self) -> Vec<EntityName> {
        self.records
            .iter()
            .filter(|r| !r.is_resolved())
            .map(|r| r.input_entity.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.first_index.clear();
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResultSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<ResultRecord>::deserialize(deserializer).map(Self::from_records)
    }
}

/// Fold one window's outcomes into the set, in the order given.
///
/// The initial phase appends. Deep search replaces the first row for each
/// input; an outcome with no row is appended and counted as unmatched.
pub fn merge(
    results: &mut ResultSet,
    outcomes: Vec<ResolutionOutcome>,
    is_deep_search: bool,
) -> MergeReport {
    let mut report = MergeReport::default();

    for outcome in outcomes {
        let record = ResultRecord::from_outcome(outcome, is_deep_search);
        if !is_deep_search {
            results.append(record);
            report.appended += 1;
            continue;
        }

        match results.replace_first(record) {
            None => report.replaced += 1,
            Some(orphan) => {
                warn!(
                    entity = %orphan.input_entity,
                    "Deep-search result has no existing row, appending"
                );
                results.append(orphan);
                report.unmatched += 1;
            }
        }
    }

    report
}

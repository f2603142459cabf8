//! CSV export of result rows

use anyhow::{Context, Result};
use bioresolve_orchestrator::ResultRecord;
use std::collections::BTreeMap;
use std::io::Write;

/// Column headers, in output order
pub const CSV_HEADERS: [&str; 14] = [
    "Input Entity",
    "Corrected Name",
    "Resolved Name",
    "Type",
    "Synonyms",
    "Pathways",
    "Function",
    "Cellular Component",
    "Ontology ID",
    "Ontology Term",
    "Identifiers",
    "Links",
    "Validation Issues",
    "Processing Time (s)",
];

const LIST_SEPARATOR: &str = "; ";

fn join_map(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

fn to_row(record: &ResultRecord) -> [String; 14] {
    [
        record.input_entity.to_string(),
        record.corrected_name.clone(),
        record.resolved_name.clone(),
        record.entity_type.clone(),
        record.synonyms.join(LIST_SEPARATOR),
        record.pathways.join(LIST_SEPARATOR),
        record.function.clone(),
        record.cellular_component.clone(),
        record.ontology_id.clone(),
        record.ontology_term.clone(),
        join_map(&record.identifiers),
        join_map(&record.links),
        record.validation_issues.clone(),
        format!("{:.2}", record.processing_time_secs),
    ]
}

/// Write `records` as CSV with a header row
pub fn write_csv<W: Write>(records: &[ResultRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADERS)
        .context("Failed to write CSV header")?;
    for record in records {
        csv.write_record(to_row(record))
            .with_context(|| format!("Failed to write row for {}", record.input_entity))?;
    }
    csv.flush().context("Failed to flush CSV output")?;
    Ok(())
}

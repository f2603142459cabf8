//! Reading entity lists from files or stdin

use anyhow::{Context, Result};
use bioresolve_core::EntityName;
use std::io::Read;
use std::path::Path;

/// Read entity names, one per line, from `source` (`-` for stdin)
pub fn read_entities(source: &Path) -> Result<Vec<EntityName>> {
    let text = if source == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read entity list from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read entity list {}", source.display()))?
    };

    Ok(EntityName::parse_list(&text))
}

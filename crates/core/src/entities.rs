use crate::error::{Error, Result};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum_macros::{Display, EnumString};

/// A trimmed, non-empty biological/chemical name submitted for resolution.
///
/// Duplicates are allowed; two `EntityName`s compare equal when their trimmed
/// text is byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(String);

impl EntityName {
    /// Create an entity name, trimming surrounding whitespace
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_input("Entity name cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parse a free-text list with one entity per line.
    ///
    /// Blank lines and lines starting with `#` are skipped. Input order and
    /// duplicates are preserved.
    pub fn parse_list(text: &str) -> Vec<Self> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| Self(line.to_string()))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<EntityName> for String {
    fn from(name: EntityName) -> Self {
        name.0
    }
}

/// Optional hint about what kind of entity the names refer to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityTypeHint {
    /// Let the backend decide
    #[default]
    Auto,
    Gene,
    Protein,
    Chemical,
}

/// Context passed unchanged from the caller to the resolution backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
pub struct ResolutionContext {
    /// Type hint for the whole batch
    pub type_hint: EntityTypeHint,

    /// Free-text background (organism, experiment, paper abstract)
    pub background: Option<String>,

    /// Ontology selection, e.g. "GO" or "ChEBI"
    pub ontology: Option<String>,

    /// Whether ontology terms should be requested at all
    pub ontology_enabled: bool,

    /// Set by the orchestrator for the fallback phase
    pub deep_search: bool,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self {
            type_hint: EntityTypeHint::Auto,
            background: None,
            ontology: None,
            ontology_enabled: true,
            deep_search: false,
        }
    }
}

impl ResolutionContext {
    /// Builder entry point
    pub fn builder() -> ResolutionContextBuilder {
        ResolutionContextBuilder::default()
    }

    /// Copy of this context with the deep-search flag set as given
    pub fn for_phase(&self, deep_search: bool) -> Self {
        Self {
            deep_search,
            ..self.clone()
        }
    }
}

/// Structured resolution returned by the backend for one entity.
///
/// Field names follow the backend's camelCase JSON; every field is optional on
/// the wire so a partial answer still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityResolution {
    pub corrected_name: String,
    pub resolved_name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub synonyms: Vec<String>,
    pub pathways: Vec<String>,
    pub function: String,
    pub cellular_component: String,
    pub ontology_id: String,
    pub ontology_term: String,
    /// Database name to identifier, e.g. "UniProt" -> "P04637"
    pub identifiers: BTreeMap<String, String>,
    /// Database name to URL
    pub links: BTreeMap<String, String>,
    /// Problems reported by the backend itself (partial resolution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_issues: Option<String>,
}

impl EntityResolution {
    /// Backend-reported issues, `None` when empty or whitespace
    pub fn reported_issues(&self) -> Option<&str> {
        self.validation_issues
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

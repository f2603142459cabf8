//! Prompt templates for entity resolution
//!
//! PRIVATE MODULE - Not exported from crate

use bioresolve_core::{EntityName, EntityTypeHint, ResolutionContext};

/// Static system prompt describing the response schema
pub const RESOLVE_SYSTEM: &str = include_str!("../assets/prompts/resolve_system.txt");

/// Per-entity user prompt
pub const RESOLVE_USER: &str = include_str!("../assets/prompts/resolve_user.txt");

pub const STRATEGY_STANDARD: &str = include_str!("../assets/prompts/strategy_standard.txt");

/// Used for the fallback phase on previously failed entities
pub const STRATEGY_DEEP_SEARCH: &str = include_str!("../assets/prompts/strategy_deep_search.txt");

/// Fill `{key}` placeholders in one pass over the template.
///
/// Substituted values are never scanned again, so braces inside user text
/// reach the backend as written. Unknown placeholders are left alone.
pub fn format_prompt(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let tail = &rest[open..];
        let substitution = tail[1..].find('}').and_then(|close| {
            let key = &tail[1..close + 1];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close + 2))
        });
        match substitution {
            Some((value, consumed)) => {
                result.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                result.push('{');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Render the user prompt for one entity
pub fn render_user_prompt(entity: &EntityName, context: &ResolutionContext) -> String {
    let type_hint = match context.type_hint {
        EntityTypeHint::Auto => "any (gene, protein or chemical)".to_string(),
        hint => hint.to_string(),
    };
    let background = context
        .background
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or("none");
    let ontology = match (&context.ontology, context.ontology_enabled) {
        (Some(ontology), true) => ontology.as_str(),
        (None, true) => "best available",
        (_, false) => "not requested (leave ontologyId and ontologyTerm empty)",
    };
    let strategy = if context.deep_search {
        STRATEGY_DEEP_SEARCH
    } else {
        STRATEGY_STANDARD
    };

    format_prompt(
        RESOLVE_USER,
        &[
            ("entity", entity.as_str()),
            ("type_hint", &type_hint),
            ("background", background),
            ("ontology", ontology),
            ("strategy", strategy.trim()),
        ],
    )
}

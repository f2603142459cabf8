//! Recovering a JSON object from free-form LLM output

/// Remove a surrounding markdown code fence (```json ... ```), if any.
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.strip_prefix("json").unwrap_or(rest),
    };

    match body.rfind("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Byte length of the balanced `{...}` starting at `text[0]`, honouring strings.
fn balanced_object_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, byte) in text.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract the first valid JSON object from an LLM reply.
///
/// Handles code fences, chatty prefixes/suffixes and brace-like prose before
/// the real payload. Returns `None` when no candidate parses.
pub(crate) fn extract_json_object(response: &str) -> Option<&str> {
    let content = strip_code_fence(response);

    content
        .match_indices('{')
        .filter_map(|(start, _)| {
            let candidate = &content[start..];
            balanced_object_len(candidate).map(|len| &candidate[..len])
        })
        .find(|candidate| serde_json::from_str::<serde_json::Value>(candidate).is_ok())
}

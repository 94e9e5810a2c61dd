//! Response parsing for the external reasoning service.
//!
//! The service contract is "structured if possible, raw text always
//! acceptable", so every parser here walks the same fallback chain:
//!
//! 1. The entire response is valid JSON.
//! 2. A fenced ```json code block contains valid JSON.
//! 3. A best-effort brace-delimited block embedded in prose parses.
//!
//! All functions return `Option`; the caller decides whether a miss is a
//! degraded result (reconciliation) or an error (option generation).

use crate::case::entities::PartyRole;
use crate::settlement::entities::OptionVariant;
use crate::solution::entities::{PartyConcession, SolutionDraft};

/// Parse a combined-solution draft from a reconciliation response.
pub fn parse_solution(response: &str) -> Option<SolutionDraft> {
    structured_json(response).and_then(|json| parse_solution_json(&json))
}

/// Parse the option variant list from an option-generation response.
///
/// Accepts `{"options": [...]}` or `{"variants": [...]}`. Variants missing
/// an id get sequential `opt-N` ids; variants missing a title are dropped.
/// Returns `None` when no usable variant survives.
pub fn parse_option_variants(response: &str) -> Option<Vec<OptionVariant>> {
    let json = structured_json(response)?;
    let items = json
        .get("options")
        .or_else(|| json.get("variants"))
        .and_then(|v| v.as_array())?;

    let mut variants = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let Some(title) = item.get("title").and_then(|v| v.as_str()) else {
            continue;
        };
        let id = item
            .get("id")
            .and_then(json_value_to_string)
            .unwrap_or_else(|| format!("opt-{}", index + 1));
        let terms = item.get("terms").and_then(|v| v.as_str()).unwrap_or("");
        let rationale = item
            .get("rationale")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        variants.push(OptionVariant::new(id, title, terms, rationale));
    }

    if variants.is_empty() {
        return None;
    }
    Some(variants)
}

/// Extract JSON from a response using the shared fallback chain.
fn structured_json(response: &str) -> Option<serde_json::Value> {
    // 1. The whole response is JSON
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(response.trim())
        && json.is_object()
    {
        return Some(json);
    }

    // 2. A fenced code block contains JSON
    if let Some(json) = fenced_json_block(response) {
        return Some(json);
    }

    // 3. A brace-delimited block embedded in prose
    embedded_json_block(response)
}

/// Look for ```json (or bare ```) fenced blocks and parse the first one
/// that yields a JSON object.
fn fenced_json_block(response: &str) -> Option<serde_json::Value> {
    let mut in_block = false;
    let mut current = String::new();

    for line in response.lines() {
        let trimmed = line.trim();
        if !in_block && (trimmed == "```json" || trimmed == "```") {
            in_block = true;
            current.clear();
        } else if in_block && trimmed == "```" {
            in_block = false;
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&current)
                && json.is_object()
            {
                return Some(json);
            }
        } else if in_block {
            current.push_str(line);
            current.push('\n');
        }
    }
    None
}

/// Best-effort extraction of the outermost `{ ... }` block.
fn embedded_json_block(response: &str) -> Option<serde_json::Value> {
    let start = response.find('{')?;
    let end = response[start..].rfind('}')?;
    let candidate = &response[start..start + end + 1];
    serde_json::from_str::<serde_json::Value>(candidate)
        .ok()
        .filter(|json| json.is_object())
}

/// Parse a solution draft from a JSON value.
///
/// Expected shape:
/// ```json
/// {
///   "summary": "string",
///   "terms": "string",
///   "concessions": {"complainant": ["..."], "respondent": ["..."]},
///   "acceptance_probability": 0.7,
///   "legal_basis": ["..."]
/// }
/// ```
///
/// `terms` also answers to `recommendation`/`final_recommendation`; the
/// probability also answers to `confidence` and may be given as a
/// percentage. Returns `None` when no terms can be found.
pub fn parse_solution_json(json: &serde_json::Value) -> Option<SolutionDraft> {
    let terms = json
        .get("terms")
        .or_else(|| json.get("recommendation"))
        .or_else(|| json.get("final_recommendation"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())?;

    let summary = json
        .get("summary")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let mut concessions = Vec::new();
    if let Some(map) = json.get("concessions").and_then(|v| v.as_object()) {
        for (role, items) in [
            (PartyRole::Complainant, map.get("complainant")),
            (PartyRole::Respondent, map.get("respondent")),
        ] {
            let items = string_list(items);
            if !items.is_empty() {
                concessions.push(PartyConcession::new(role, items));
            }
        }
    }

    let acceptance_probability = json
        .get("acceptance_probability")
        .or_else(|| json.get("confidence"))
        .and_then(|v| v.as_f64())
        .map(normalize_probability);

    let legal_basis = string_list(json.get("legal_basis"));

    Some(SolutionDraft {
        summary,
        terms: terms.to_string(),
        concessions,
        acceptance_probability,
        legal_basis,
    })
}

/// JSON values to strings (numbers stringified, null and empty dropped)
fn json_value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_list(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(json_value_to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Accept probabilities on either a 0-1 or a 0-100 scale.
fn normalize_probability(p: f64) -> f64 {
    let p = if p > 1.0 { p / 100.0 } else { p };
    p.clamp(0.0, 1.0)
}

//! Output recovery: salvage a field map from free-form VLM text.
//!
//! Small vision models are told to return "ONLY the JSON object" and mostly
//! do, but in practice the answer also arrives as:
//!
//! - the object wrapped in a ` ```json ... ``` ` fence
//! - the object preceded or followed by a sentence of commentary
//! - nothing parseable at all
//!
//! [`recover`] runs a fixed list of independent attempts and returns the first
//! one that yields a JSON object. It never fails; the worst case is an empty
//! map, which the normaliser turns into a record of empty fields.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Field name → raw value, as emitted by the oracle.
pub type RawFieldMap = Map<String, Value>;

/// One recovery strategy. Pure: `&str → Option<RawFieldMap>`.
type Attempt = fn(&str) -> Option<RawFieldMap>;

/// Strategies in priority order. The first `Some` wins.
const ATTEMPTS: [(&str, Attempt); 3] = [
    ("direct", parse_direct),
    ("fenced", parse_fenced_block),
    ("brace-span", parse_brace_span),
];

/// Recover a field map from the oracle's raw text.
///
/// Attempts, in order:
/// 1. The whole trimmed text parses as a JSON object
/// 2. A fenced code block (optionally tagged `json`) holding `{...}`
/// 3. The first greedy `{...}` span, across lines
///
/// Returns an empty map when every attempt fails. Valid JSON that is not an
/// object (an array, a bare string) counts as a failed attempt.
pub fn recover(text: &str) -> RawFieldMap {
    let text = text.trim();
    if text.is_empty() {
        return RawFieldMap::new();
    }

    for (name, attempt) in ATTEMPTS {
        if let Some(map) = attempt(text) {
            debug!("Recovered {} fields via {} parse", map.len(), name);
            return map;
        }
    }

    warn!("Could not parse JSON from model output ({} chars)", text.len());
    RawFieldMap::new()
}

fn parse_object(candidate: &str) -> Option<RawFieldMap> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

// ── Attempt 1: whole text ────────────────────────────────────────────────────

fn parse_direct(text: &str) -> Option<RawFieldMap> {
    parse_object(text)
}

// ── Attempt 2: fenced code block ─────────────────────────────────────────────

static RE_FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

fn parse_fenced_block(text: &str) -> Option<RawFieldMap> {
    let caps = RE_FENCED.captures(text)?;
    parse_object(caps.get(1)?.as_str())
}

// ── Attempt 3: greedy brace span ─────────────────────────────────────────────

static RE_BRACE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

fn parse_brace_span(text: &str) -> Option<RawFieldMap> {
    parse_object(RE_BRACE_SPAN.find(text)?.as_str())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_value(map: RawFieldMap) -> Value {
        Value::Object(map)
    }

    #[test]
    fn test_direct_minified() {
        let out = recover(r#"{"name":"RAVI","pan_number":"ABCDE1234F"}"#);
        assert_eq!(as_value(out), json!({"name": "RAVI", "pan_number": "ABCDE1234F"}));
    }

    #[test]
    fn test_direct_pretty() {
        let input = "{\n  \"name\": \"RAVI\",\n  \"gender\": \"MALE\"\n}\n";
        assert_eq!(as_value(recover(input)), json!({"name": "RAVI", "gender": "MALE"}));
    }

    #[test]
    fn test_trailing_text() {
        assert_eq!(as_value(recover(r#"{"a":1} trailing text"#)), json!({"a": 1}));
    }

    #[test]
    fn test_fenced_json() {
        let input = "```json\n{\"pan_number\":\"ABCDE1234F\"}\n```";
        assert_eq!(as_value(recover(input)), json!({"pan_number": "ABCDE1234F"}));
    }

    #[test]
    fn test_fenced_without_tag() {
        let input = "Here you go:\n```\n{\"gender\": \"FEMALE\"}\n```\nDone.";
        assert_eq!(as_value(recover(input)), json!({"gender": "FEMALE"}));
    }

    #[test]
    fn test_prose_wrapped_multiline() {
        let input = "The card shows:\n{\n  \"name\": \"MEENA\",\n  \
                     \"address\": \"12 Ram Nagar\"\n}\nHope this helps.";
        assert_eq!(
            as_value(recover(input)),
            json!({"name": "MEENA", "address": "12 Ram Nagar"})
        );
    }

    #[test]
    fn test_no_json() {
        assert!(recover("no json here").is_empty());
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(recover("").is_empty());
        assert!(recover("   \n\t").is_empty());
    }

    #[test]
    fn test_invalid_span_falls_through_to_empty() {
        assert!(recover("{name: RAVI, dob: 01/01/1990}").is_empty());
    }

    #[test]
    fn test_invalid_fence_falls_through_to_brace_span() {
        // The fenced block is broken JSON, but a later brace span would also
        // start at the first '{' and is broken too: nothing recovers.
        let input = "```json\n{broken}\n```";
        assert!(recover(input).is_empty());
    }

    #[test]
    fn test_array_is_not_a_mapping() {
        assert!(parse_direct("[1, 2, 3]").is_none());
        assert!(recover("[1, 2, 3]").is_empty());
        // An object nested inside an array is still found by the brace scan.
        assert_eq!(recover(r#"[{"name":"RAVI"}]"#)["name"], "RAVI");
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let out = recover(r#"{"name":"FIRST","name":"SECOND"}"#);
        assert_eq!(out["name"], "SECOND");
    }

    #[test]
    fn test_deterministic() {
        let input = "noise {\"a\": \"b\"} noise";
        assert_eq!(recover(input), recover(input));
    }
}

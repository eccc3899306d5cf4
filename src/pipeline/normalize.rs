//! Field normalisation: canonical presentation for each recovered field.
//!
//! The VLM is trusted for *what* it read, not for *how* it formatted it.
//! These rules fix the presentation of the two ID numbers (PAN code, Aadhaar
//! digit grouping) and trim everything else. Dates are deliberately left in
//! whatever form the model produced.
//!
//! Both normalisers are total: missing keys become empty strings and an
//! unrecognisable ID number is kept in its cleaned form rather than blanked.
//! Running a normaliser on its own output returns the same record.

use crate::output::{AadhaarRecord, PanRecord};
use crate::pipeline::recover::RawFieldMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Five uppercase letters, four digits, one uppercase letter.
static RE_PAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{5}[0-9]{4}[A-Z]").unwrap());

static RE_AADHAAR_GROUPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{4})\s?([0-9]{4})\s?([0-9]{4})").unwrap());

/// Normalise a raw PAN field map.
pub fn normalize_pan(raw: &RawFieldMap) -> PanRecord {
    PanRecord {
        name: field(raw, "name").trim().to_string(),
        fathers_name: field(raw, "fathers_name").trim().to_string(),
        date_of_birth: field(raw, "date_of_birth").trim().to_string(),
        pan_number: normalize_pan_number(&field(raw, "pan_number")),
    }
}

/// Normalise a raw Aadhaar field map.
pub fn normalize_aadhaar(raw: &RawFieldMap) -> AadhaarRecord {
    AadhaarRecord {
        name: field(raw, "name").trim().to_string(),
        aadhaar_number: normalize_aadhaar_number(&field(raw, "aadhaar_number")),
        date_of_birth: field(raw, "date_of_birth").trim().to_string(),
        gender: field(raw, "gender").trim().to_uppercase(),
        address: field(raw, "address").trim().to_string(),
    }
}

/// Uppercase, trim and de-space, then keep the first PAN-shaped substring.
///
/// OCR noise around the code (`"PAN: BQJPK6347Q."`) is discarded; a value
/// with no PAN-shaped substring is returned cleaned but otherwise intact.
pub fn normalize_pan_number(value: &str) -> String {
    let cleaned = value.to_uppercase().trim().replace(' ', "");
    match RE_PAN.find(&cleaned) {
        Some(m) => m.as_str().to_string(),
        None => cleaned,
    }
}

/// Group an Aadhaar number as `XXXX XXXX XXXX`.
///
/// Exactly twelve digits anywhere in the value win first. Otherwise the first
/// run of three four-digit groups is used. Otherwise the trimmed value is
/// returned unchanged.
pub fn normalize_aadhaar_number(value: &str) -> String {
    let value = value.trim();
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 12 {
        return group_aadhaar_digits(&digits);
    }

    match RE_AADHAAR_GROUPS.captures(value) {
        Some(caps) => format!("{} {} {}", &caps[1], &caps[2], &caps[3]),
        None => value.to_string(),
    }
}

/// `"123456789012"` → `"1234 5678 9012"`. Caller guarantees 12 ASCII digits.
pub(crate) fn group_aadhaar_digits(digits: &str) -> String {
    format!("{} {} {}", &digits[..4], &digits[4..8], &digits[8..12])
}

fn field(raw: &RawFieldMap, key: &str) -> String {
    value_text(raw.get(key))
}

/// Stringify a raw value; a missing key or JSON `null` becomes empty.
pub(crate) fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::NormalizedRecord;
    use serde_json::json;

    fn raw(v: Value) -> RawFieldMap {
        match v {
            Value::Object(m) => m,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn test_pan_number_extracted_from_noise() {
        let rec = normalize_pan(&raw(json!({"pan_number": "junk BQJPK6347Q junk"})));
        assert_eq!(rec.pan_number, "BQJPK6347Q");
    }

    #[test]
    fn test_pan_number_lowercase_and_spaced() {
        assert_eq!(normalize_pan_number(" bqjpk 6347 q "), "BQJPK6347Q");
    }

    #[test]
    fn test_pan_number_unmatched_kept_cleaned() {
        assert_eq!(normalize_pan_number(" abc 123 "), "ABC123");
    }

    #[test]
    fn test_pan_names_trimmed_not_recased() {
        let rec = normalize_pan(&raw(json!({
            "name": "  Kishore Sheik  ",
            "fathers_name": "\tMohammed\n",
            "date_of_birth": " 03-11-1988 "
        })));
        assert_eq!(rec.name, "Kishore Sheik");
        assert_eq!(rec.fathers_name, "Mohammed");
        // No date reformatting at this layer.
        assert_eq!(rec.date_of_birth, "03-11-1988");
        assert_eq!(rec.pan_number, "");
    }

    #[test]
    fn test_pan_empty_map_has_all_fields() {
        let rec = NormalizedRecord::Pan(normalize_pan(&RawFieldMap::new()));
        let keys: Vec<_> = rec.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["name", "fathers_name", "date_of_birth", "pan_number"]);
        assert_eq!(rec.recovered_count(), 0);
    }

    #[test]
    fn test_aadhaar_plain_digits() {
        let rec = normalize_aadhaar(&raw(json!({"aadhaar_number": "123456789012"})));
        assert_eq!(rec.aadhaar_number, "1234 5678 9012");
    }

    #[test]
    fn test_aadhaar_dashed_with_extra_text() {
        let rec = normalize_aadhaar(&raw(json!({"aadhaar_number": "1234-5678-9012 extra"})));
        assert_eq!(rec.aadhaar_number, "1234 5678 9012");
    }

    #[test]
    fn test_aadhaar_numeric_value() {
        let rec = normalize_aadhaar(&raw(json!({"aadhaar_number": 123456789012u64})));
        assert_eq!(rec.aadhaar_number, "1234 5678 9012");
    }

    #[test]
    fn test_aadhaar_group_fallback_when_too_many_digits() {
        // 16 digits overall (VID appended), so the exact-12 rule cannot apply.
        assert_eq!(
            normalize_aadhaar_number("1234 5678 9012 VID 9999"),
            "1234 5678 9012"
        );
    }

    #[test]
    fn test_aadhaar_unrecognised_kept() {
        assert_eq!(normalize_aadhaar_number("  12345  "), "12345");
        assert_eq!(normalize_aadhaar_number("not printed"), "not printed");
    }

    #[test]
    fn test_aadhaar_gender_uppercased_address_trimmed() {
        let rec = normalize_aadhaar(&raw(json!({
            "gender": " female ",
            "address": "  12 Ram Nagar, Madurai 625016 ",
            "name": " Meena "
        })));
        assert_eq!(rec.gender, "FEMALE");
        assert_eq!(rec.address, "12 Ram Nagar, Madurai 625016");
        assert_eq!(rec.name, "Meena");
    }

    #[test]
    fn test_aadhaar_empty_map_has_all_fields() {
        let rec = NormalizedRecord::Aadhaar(normalize_aadhaar(&RawFieldMap::new()));
        assert_eq!(rec.fields().len(), 5);
        assert!(rec.fields().iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn test_null_value_is_empty() {
        let rec = normalize_pan(&raw(json!({"name": null, "pan_number": null})));
        assert_eq!(rec.name, "");
        assert_eq!(rec.pan_number, "");
    }

    #[test]
    fn test_pan_idempotent() {
        let first = normalize_pan(&raw(json!({
            "name": " RAVI KUMAR ",
            "fathers_name": "SURESH",
            "date_of_birth": "01/02/1990",
            "pan_number": "pan: abcde 1234 f."
        })));
        let again = normalize_pan(&NormalizedRecord::Pan(first.clone()).to_raw());
        assert_eq!(first, again);
    }

    #[test]
    fn test_aadhaar_idempotent() {
        let first = normalize_aadhaar(&raw(json!({
            "name": "Meena",
            "aadhaar_number": "1234-5678-9012",
            "date_of_birth": "03/11/1988",
            "gender": "female",
            "address": " 4 S S Colony "
        })));
        let again = normalize_aadhaar(&NormalizedRecord::Aadhaar(first.clone()).to_raw());
        assert_eq!(first, again);
    }
}

//! Line classifier for plain OCR engines.
//!
//! A traditional OCR engine returns text lines, not JSON. This module assigns
//! each line to at most one field with a fixed cascade of rules; the first
//! rule that matches consumes the line. It is a heuristic tuned against real
//! card scans, not a grammar. The skip-word and address-keyword lists are
//! expected to need tuning for cards from other regions.
//!
//! ## PAN cascade
//! 1. PAN code (`ABCDE1234F`) → `pan_number`
//! 2. `DD/MM/YYYY` or `DD-MM-YYYY` → `date_of_birth`
//! 3. boilerplate skip words → dropped
//! 4. short or numeric-only → dropped
//! 5. all-caps line → name candidate (1st = name, 2nd = father's name)
//!
//! The ID and date rules run before the skip list on PAN cards because the
//! number is often printed on the "Permanent Account Number" label line.
//!
//! ## Aadhaar cascade
//! 1. boilerplate skip words → dropped
//! 2. exactly 12 digits → `aadhaar_number` (first distinct value wins)
//! 3. date → `date_of_birth`
//! 4. `MALE` / `FEMALE` → `gender`
//! 5. Tamil / Devanagari-only line → dropped
//! 6. address keyword or 6-digit PIN → address part
//! 7. Latin-script line → name candidate (relation lines `S/O`, `D/O`, `W/O` dropped)
//!
//! A line carrying an `Address:` label overrides the assembled address.

use crate::output::{AadhaarRecord, PanRecord};
use crate::pipeline::normalize::group_aadhaar_digits;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// ── Patterns ─────────────────────────────────────────────────────────────────

static RE_PAN_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{5}[0-9]{4}[A-Z]\b").unwrap());

static RE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2}[/-]\d{2}[/-]\d{4})\b").unwrap());

static RE_GENDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(male|female)\b").unwrap());

static RE_UPPER_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z\s.]+$").unwrap());

static RE_LATIN_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z\s./]+$").unwrap());

static RE_RELATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[SDW]/O\s*:?\s*(.+)").unwrap());

static RE_PIN_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{6}\b").unwrap());

static RE_INDIC_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\x{0B80}-\x{0BFF}\x{0900}-\x{097F}\s]+$").unwrap());

static RE_ADDRESS_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[Aa]ddress\s*:").unwrap());

// ── Word lists ───────────────────────────────────────────────────────────────

/// PAN card boilerplate: headers, the lost-card notice on the back, NSDL address.
const PAN_SKIP_WORDS: &[&str] = &[
    "income tax", "department", "govt", "india", "permanent",
    "account", "number", "signature", "आयकर", "विभाग", "भारत",
    "सरकार", "card", "lost", "found", "please", "inform",
    "return", "nsdl", "floor", "sapphire", "chambers", "near",
    "baner", "telephone", "exchange", "pune", "tel:", "fax:",
    "e-mail", "tininfo", "this", "someone",
];

/// Aadhaar boilerplate, including the Tamil and Hindi header lines.
const AADHAAR_SKIP_WORDS: &[&str] = &[
    "unique identification", "authority", "government",
    "aadhaar", "aadhar", "आधार", "enrolment", "download",
    "validity", "valid", "proof", "citizenship", "establish",
    "identity", "authenticate", "electronically", "generated",
    "information", "helpful", "availing", "services", "future",
    "your aadhaar", "எனது", "அடையாளம்", "உங்கள்",
    "இந்திய", "அரசாங்கம்", "தனிப்பட்ட",
    "www.uidai", "help@uidai", "1947",
];

// TODO: the place-name entries (madurai, arasaradi, tamil nadu) come from the
// Madurai sample set; load them from config once other regions are scanned.
const ADDRESS_KEYWORDS: &[&str] = &[
    "street", "road", "nagar", "colony", "lane", "floor",
    "block", "sector", "district", "state", "pin", "south",
    "north", "east", "west", "near", "opp", "post",
    "ram nagar", "s s colony", "arasaradi", "madurai",
    "tamil nadu", "tamil", "nadu",
];

fn contains_any(lower: &str, words: &[&str]) -> bool {
    words.iter().any(|w| lower.contains(w))
}

// ── PAN ──────────────────────────────────────────────────────────────────────

/// Classify OCR lines from a PAN card.
pub fn classify_pan_lines<S: AsRef<str>>(lines: &[S]) -> PanRecord {
    let mut record = PanRecord::default();
    let mut name_candidates: Vec<&str> = Vec::new();

    for line in lines {
        let text = line.as_ref().trim();
        if text.is_empty() {
            continue;
        }

        if let Some(m) = RE_PAN_WORD.find(text) {
            record.pan_number = m.as_str().to_string();
            continue;
        }

        if let Some(m) = RE_DATE.find(text) {
            record.date_of_birth = m.as_str().replace('-', "/");
            continue;
        }

        if contains_any(&text.to_lowercase(), PAN_SKIP_WORDS) {
            continue;
        }

        if text.chars().count() < 3 || is_numeric_only(text) {
            continue;
        }

        let starts_upper = text.chars().next().is_some_and(char::is_uppercase);
        if starts_upper && RE_UPPER_NAME.is_match(text) {
            name_candidates.push(text);
        }
    }

    debug!("PAN name candidates: {:?}", name_candidates);
    let mut names = name_candidates.into_iter();
    if let Some(name) = names.next() {
        record.name = name.trim().to_string();
    }
    if let Some(father) = names.next() {
        record.fathers_name = father.trim().to_string();
    }

    record
}

fn is_numeric_only(text: &str) -> bool {
    let mut chars = text.chars().filter(|c| *c != ' ').peekable();
    chars.peek().is_some() && chars.all(|c| c.is_ascii_digit())
}

// ── Aadhaar ──────────────────────────────────────────────────────────────────

/// Classify OCR lines from an Aadhaar card.
pub fn classify_aadhaar_lines<S: AsRef<str>>(lines: &[S]) -> AadhaarRecord {
    let mut record = AadhaarRecord::default();
    let mut numbers: Vec<String> = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    let mut address_parts: Vec<&str> = Vec::new();

    for line in lines {
        let text = line.as_ref().trim();
        if text.is_empty() {
            continue;
        }

        let lower = text.to_lowercase();
        if contains_any(&lower, AADHAAR_SKIP_WORDS) {
            continue;
        }

        let digits: String = text.chars().filter(char::is_ascii_digit).collect();
        if digits.len() == 12 {
            let formatted = group_aadhaar_digits(&digits);
            if !numbers.contains(&formatted) {
                numbers.push(formatted);
            }
            continue;
        }

        if let Some(m) = RE_DATE.find(text) {
            record.date_of_birth = m.as_str().replace('-', "/");
            continue;
        }

        if let Some(m) = RE_GENDER.find(text) {
            record.gender = m.as_str().to_uppercase();
            continue;
        }

        if RE_INDIC_ONLY.is_match(text) {
            continue;
        }

        if contains_any(&lower, ADDRESS_KEYWORDS) || RE_PIN_CODE.is_match(text) {
            address_parts.push(text);
            continue;
        }

        if RE_LATIN_NAME.is_match(text)
            && text.chars().count() > 3
            && !RE_RELATION.is_match(text)
        {
            names.push(text);
        }
    }

    debug!(
        "Aadhaar candidates: {} numbers, {} names, {} address lines",
        numbers.len(),
        names.len(),
        address_parts.len()
    );

    if let Some(first) = numbers.into_iter().next() {
        record.aadhaar_number = first;
    }
    if let Some(first) = names.first() {
        record.name = first.trim().to_string();
    }
    if !address_parts.is_empty() {
        record.address = address_parts.join(", ");
    }
    if let Some(labelled) = labelled_address(lines) {
        record.address = labelled;
    }

    record
}

/// Text after the first non-empty `Address:` label, if any.
fn labelled_address<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    lines.iter().find_map(|line| {
        let line = line.as_ref();
        if !line.to_lowercase().contains("address:") {
            return None;
        }
        let m = RE_ADDRESS_LABEL.find(line)?;
        let rest = line[m.end()..].trim();
        (!rest.is_empty()).then(|| rest.to_string())
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────

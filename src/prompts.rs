//! VLM instructions for each supported card.
//!
//! Keeping the prompts in one place lets unit tests inspect them without a
//! model, and makes it obvious which JSON keys the recovery and normalisation
//! stages rely on. Callers can override either prompt through
//! [`crate::config::ExtractionConfig`]; these constants are the defaults.

/// Instruction sent with a PAN card image.
///
/// The layout hints matter: small models otherwise merge the cardholder and
/// father lines into one name.
pub const PAN_PROMPT: &str = r#"Look at this Indian PAN card image carefully.

On a PAN card, the layout is:
- Line 1: Cardholder's FULL NAME (e.g. "KISHORE SHEIK AHAMED M R")
- Line 2: Father's FULL NAME (e.g. "MOHAMMED RAHAMATHULLA")
- Line 3: Date of Birth (DD/MM/YYYY)
- Bottom: 10-character PAN number (e.g. BQJPK6347Q)

Extract these fields as JSON. The name and father's name are SEPARATE people on SEPARATE lines:

{
  "name": "cardholder name only (first name line)",
  "fathers_name": "father's name only (second name line)",
  "date_of_birth": "DD/MM/YYYY",
  "pan_number": "10 character PAN"
}

Return ONLY the JSON object, no other text."#;

/// Instruction sent with an Aadhaar card image.
pub const AADHAAR_PROMPT: &str = r#"Look at this Aadhaar card image carefully.
Extract ALL the following fields and return ONLY valid JSON, nothing else:

{
  "name": "full name as printed",
  "aadhaar_number": "12 digit number (XXXX XXXX XXXX format)",
  "date_of_birth": "DD/MM/YYYY format",
  "gender": "MALE or FEMALE",
  "address": "complete residential address as printed including pincode"
}

Rules:
- Copy text EXACTLY as printed
- Aadhaar number is exactly 12 digits
- Include full address with pincode
- Return ONLY the JSON object, no other text"#;

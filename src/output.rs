//! Output types: the normalised records and the per-call extraction result.
//!
//! Records are plain structs of `String` fields. An unrecovered field is an
//! empty string, never an `Option`, so downstream consumers (the checklist
//! cell plan, JSON clients) never have to distinguish "null" from "missing".

use crate::document::DocumentType;
use crate::pipeline::recover::RawFieldMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields printed on a PAN card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanRecord {
    pub name: String,
    pub fathers_name: String,
    pub date_of_birth: String,
    /// Ten-character PAN, e.g. `BQJPK6347Q`.
    pub pan_number: String,
}

/// Fields printed on an Aadhaar card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AadhaarRecord {
    pub name: String,
    /// Twelve digits grouped as `XXXX XXXX XXXX` when recognisable.
    pub aadhaar_number: String,
    pub date_of_birth: String,
    /// `MALE` / `FEMALE` as printed, uppercased.
    pub gender: String,
    pub address: String,
}

/// A normalised record for one document.
///
/// Serialised untagged, so JSON consumers see the flat field object
/// (`{"name": …, "pan_number": …}`) exactly as the checklist UI expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedRecord {
    Pan(PanRecord),
    Aadhaar(AadhaarRecord),
}

impl NormalizedRecord {
    /// The document type this record was normalised for.
    pub fn document_type(&self) -> DocumentType {
        match self {
            NormalizedRecord::Pan(_) => DocumentType::Pan,
            NormalizedRecord::Aadhaar(_) => DocumentType::Aadhaar,
        }
    }

    /// `(key, value)` pairs in the canonical field order of the document.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            NormalizedRecord::Pan(r) => vec![
                ("name", r.name.as_str()),
                ("fathers_name", r.fathers_name.as_str()),
                ("date_of_birth", r.date_of_birth.as_str()),
                ("pan_number", r.pan_number.as_str()),
            ],
            NormalizedRecord::Aadhaar(r) => vec![
                ("name", r.name.as_str()),
                ("aadhaar_number", r.aadhaar_number.as_str()),
                ("date_of_birth", r.date_of_birth.as_str()),
                ("gender", r.gender.as_str()),
                ("address", r.address.as_str()),
            ],
        }
    }

    /// Number of non-empty fields.
    pub fn recovered_count(&self) -> usize {
        self.fields().iter().filter(|(_, v)| !v.is_empty()).count()
    }

    /// Convert back into a raw field map (e.g. to re-run normalisation).
    pub fn to_raw(&self) -> RawFieldMap {
        self.fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    pub fn as_pan(&self) -> Option<&PanRecord> {
        match self {
            NormalizedRecord::Pan(r) => Some(r),
            NormalizedRecord::Aadhaar(_) => None,
        }
    }

    pub fn as_aadhaar(&self) -> Option<&AadhaarRecord> {
        match self {
            NormalizedRecord::Aadhaar(r) => Some(r),
            NormalizedRecord::Pan(_) => None,
        }
    }
}

impl From<PanRecord> for NormalizedRecord {
    fn from(r: PanRecord) -> Self {
        NormalizedRecord::Pan(r)
    }
}

impl From<AadhaarRecord> for NormalizedRecord {
    fn from(r: AadhaarRecord) -> Self {
        NormalizedRecord::Aadhaar(r)
    }
}

/// The packaged result of one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub document_type: DocumentType,
    /// The oracle's untouched output, kept for audit and debugging.
    pub raw_text: String,
    /// Wall-clock time spent in the oracle, in seconds.
    pub elapsed_seconds: f64,
    pub extracted_data: NormalizedRecord,
}

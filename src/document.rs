//! The closed set of supported identity documents.

use crate::error::ExtractError;
use crate::prompts::{AADHAAR_PROMPT, PAN_PROMPT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which card an image (or OCR transcript) shows.
///
/// Selects both the VLM instruction and the normalisation rule set. Adding a
/// variant forces every `match` in the pipeline to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Permanent Account Number card (income-tax ID).
    Pan,
    /// Aadhaar national identity card.
    Aadhaar,
}

impl DocumentType {
    pub const ALL: [DocumentType; 2] = [DocumentType::Pan, DocumentType::Aadhaar];

    /// The wire tag, `"pan"` or `"aadhaar"`.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Pan => "pan",
            DocumentType::Aadhaar => "aadhaar",
        }
    }

    /// Human-readable label for logs and terminal output.
    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Pan => "PAN",
            DocumentType::Aadhaar => "Aadhaar",
        }
    }

    /// The built-in VLM instruction for this document.
    pub fn default_prompt(self) -> &'static str {
        match self {
            DocumentType::Pan => PAN_PROMPT,
            DocumentType::Aadhaar => AADHAAR_PROMPT,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pan" => Ok(DocumentType::Pan),
            "aadhaar" => Ok(DocumentType::Aadhaar),
            _ => Err(ExtractError::InvalidDocumentType { tag: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags() {
        assert_eq!("pan".parse::<DocumentType>().unwrap(), DocumentType::Pan);
        assert_eq!(" Aadhaar ".parse::<DocumentType>().unwrap(), DocumentType::Aadhaar);
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = "fax".parse::<DocumentType>().unwrap_err();
        assert!(matches!(err, ExtractError::InvalidDocumentType { ref tag } if tag == "fax"));
    }

    #[test]
    fn rejects_alternate_spelling() {
        // "aadhar" is how the checklist spells it, but it is not a valid tag.
        assert!("aadhar".parse::<DocumentType>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for doc in DocumentType::ALL {
            assert_eq!(doc.to_string().parse::<DocumentType>().unwrap(), doc);
        }
    }

    #[test]
    fn prompts_name_the_json_keys() {
        assert!(DocumentType::Pan.default_prompt().contains("\"pan_number\""));
        assert!(DocumentType::Aadhaar.default_prompt().contains("\"aadhaar_number\""));
    }
}

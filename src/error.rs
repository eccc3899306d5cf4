//! Error types for the idcard-extract library.
//!
//! Recovery and normalisation never fail: a garbled model answer degrades to
//! empty fields rather than an error. The only failure the core pipeline
//! surfaces is an unknown document-type tag ([`ExtractError::InvalidDocumentType`]).
//!
//! Everything else in [`ExtractError`] belongs to the layers around the core
//! (reading the card image, reaching the VLM, writing the checklist plan) and
//! is returned as `Err` from the async `extract_*` entry points.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the idcard-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Core pipeline ─────────────────────────────────────────────────────
    /// The document-type tag is neither `pan` nor `aadhaar`.
    #[error("Invalid document type '{tag}'\nSupported document types: pan, aadhaar.")]
    InvalidDocumentType { tag: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input image was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but is not a decodable PNG or JPEG image.
    #[error("Unsupported image '{source_name}': {detail}\nProvide a PNG or JPEG scan of the card.")]
    UnsupportedImage { source_name: String, detail: String },

    /// A base64 payload could not be decoded.
    #[error("Invalid document payload: {detail}")]
    InvalidPayload { detail: String },

    // ── Checklist errors ──────────────────────────────────────────────────
    /// The checklist only has columns for directors 1 and 2.
    #[error("Director slot {slot} does not exist (expected 1 or 2)")]
    InvalidDirectorSlot { slot: u8 },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Every VLM attempt failed.
    #[error("VLM call failed after {retries} retries: {detail}")]
    OracleFailed { retries: u32, detail: String },

    /// The final VLM attempt exceeded the configured timeout.
    #[error("VLM call timed out after {secs}s\nIncrease --api-timeout.")]
    OracleTimeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the checklist plan file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_document_type_display() {
        let e = ExtractError::InvalidDocumentType { tag: "fax".into() };
        let msg = e.to_string();
        assert!(msg.contains("'fax'"), "got: {msg}");
        assert!(msg.contains("pan, aadhaar"));
    }

    #[test]
    fn director_slot_display() {
        let e = ExtractError::InvalidDirectorSlot { slot: 3 };
        assert!(e.to_string().contains("slot 3"));
    }

    #[test]
    fn oracle_timeout_display() {
        let e = ExtractError::OracleTimeout { secs: 120 };
        assert!(e.to_string().contains("120s"));
    }

    #[test]
    fn oracle_failed_display() {
        let e = ExtractError::OracleFailed {
            retries: 2,
            detail: "HTTP 503".into(),
        };
        assert!(e.to_string().contains("2 retries"));
        assert!(e.to_string().contains("HTTP 503"));
    }
}

//! # idcard-extract
//!
//! Extract structured fields from Indian PAN and Aadhaar card images using
//! Vision Language Models (VLMs), and map them onto a company-formation
//! checklist.
//!
//! ## Why this crate?
//!
//! A VLM reads a photographed ID card far better than classic OCR, but its
//! answers are unreliable in shape: the JSON may be fenced, wrapped in prose,
//! or missing keys, and identifiers come back in assorted formats. This crate
//! treats the model as an opaque text oracle and makes everything downstream
//! of it deterministic:
//!
//! ```text
//! card image
//!  │
//!  ├─ 1. Input      load file or base64 payload (PNG / JPEG; PDF rejected), EXIF upright
//!  ├─ 2. Encode     downscale, level stretch + contrast boost, PNG → base64 ImageData
//!  ├─ 3. VLM        one call per card, timeout + retry/backoff
//!  ├─ 4. Recover    direct JSON → fenced block → brace span
//!  ├─ 5. Normalize  fixed key set, PAN / Aadhaar number formats
//!  └─ 6. Checklist  director columns C / D rows 4–21, company and professional rows
//! ```
//!
//! Steps 4–6 never fail: an unreadable answer yields a record of empty
//! strings, never an error. When OCR text lines are already available,
//! [`extract_lines`] skips steps 1–4 and classifies the lines by rule.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use idcard_extract::{extract_image, DocumentType, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ExtractionConfig::default();
//!     let result = extract_image("pan.jpg", DocumentType::Pan, &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&result.extracted_data)?);
//!     Ok(())
//! }
//! ```
//!
//! The pure half of the pipeline needs no provider at all:
//!
//! ```rust
//! use idcard_extract::extract;
//!
//! let result = extract("pan", "```json\n{\"pan_number\": \"abcde 1234f\"}\n```", 1.2).unwrap();
//! assert_eq!(result.extracted_data.as_pan().unwrap().pan_number, "ABCDE1234F");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `idcard-extract` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! idcard-extract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod checklist;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use checklist::{
    name_mismatch, plan_case, plan_company_cells, plan_director_cells, plan_professional_cells,
    safe_file_name, write_cell_plan, CaseData, CellWrite, CompanyDetails, DirectorCase,
    DirectorProfile, DirectorSlot, NameMismatch, ProfessionalDetails, UploadedDocument,
};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use document::DocumentType;
pub use error::ExtractError;
pub use extract::{
    extract, extract_base64, extract_document, extract_image, extract_image_sync, extract_lines,
};
pub use output::{AadhaarRecord, ExtractionResult, NormalizedRecord, PanRecord};
pub use pipeline::normalize::{normalize_aadhaar, normalize_pan};
pub use pipeline::ocr::{classify_aadhaar_lines, classify_pan_lines};
pub use pipeline::recover::{recover, RawFieldMap};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};

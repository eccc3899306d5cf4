//! Pipeline stages for ID-card field extraction.
//!
//! Each submodule implements exactly one transformation step, so every stage
//! can be tested on its own and the VLM stages can be bypassed entirely when
//! OCR lines are already available.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ llm ──▶ recover ──▶ normalize
//! (path/b64) (PNG)     (VLM)   (JSON map)  (PanRecord / AadhaarRecord)
//!
//! OCR lines ─────────────────▶ ocr
//! ```
//!
//! 1. [`input`]     — load a card image from disk or a base64 payload, upright
//! 2. [`encode`]    — downscale, stretch levels, boost contrast, base64-wrap as PNG
//! 3. [`llm`]       — drive the VLM call with timeout and retry/backoff;
//!    the only stage with network I/O
//! 4. [`recover`]   — pull the JSON object out of whatever the model said
//! 5. [`normalize`] — coerce raw fields into the fixed per-document shape
//! 6. [`ocr`]       — rule-based line classifier for the OCR fallback engine

pub mod encode;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod ocr;
pub mod recover;

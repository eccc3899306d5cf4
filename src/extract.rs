//! Document router and extraction entry points.
//!
//! The router is the only place that knows which normaliser belongs to which
//! document. It does no business logic of its own: it dispatches, then
//! packages the record with the tag, the oracle's untouched text and the
//! elapsed time.
//!
//! ```text
//! image ──▶ input ──▶ encode ──▶ llm ──▶ recover ──▶ normalize ──▶ ExtractionResult
//! OCR lines ─────────────────────────────▶ ocr ─────────────────▶ ExtractionResult
//! ```

use crate::config::ExtractionConfig;
use crate::document::DocumentType;
use crate::error::ExtractError;
use crate::output::{ExtractionResult, NormalizedRecord};
use crate::pipeline::{encode, input, llm, normalize, ocr, recover};
use edgequake_llm::{LLMProvider, ProviderFactory};
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

// ── Router (pure) ────────────────────────────────────────────────────────────

/// Route raw oracle text by a string tag.
///
/// # Errors
/// [`ExtractError::InvalidDocumentType`] when `tag` is not `pan` or `aadhaar`.
pub fn extract(
    tag: &str,
    raw_text: &str,
    elapsed_seconds: f64,
) -> Result<ExtractionResult, ExtractError> {
    let doc_type: DocumentType = tag.parse()?;
    Ok(extract_document(doc_type, raw_text, elapsed_seconds))
}

/// Recover, normalise and package raw oracle text for a known document type.
pub fn extract_document(
    doc_type: DocumentType,
    raw_text: &str,
    elapsed_seconds: f64,
) -> ExtractionResult {
    let raw = recover::recover(raw_text);
    let extracted_data = match doc_type {
        DocumentType::Pan => NormalizedRecord::Pan(normalize::normalize_pan(&raw)),
        DocumentType::Aadhaar => NormalizedRecord::Aadhaar(normalize::normalize_aadhaar(&raw)),
    };

    ExtractionResult {
        document_type: doc_type,
        raw_text: raw_text.to_string(),
        elapsed_seconds,
        extracted_data,
    }
}

/// Classify OCR text lines and package the result.
///
/// `raw_text` of the result is the lines joined with `\n`.
pub fn extract_lines<S: AsRef<str>>(
    doc_type: DocumentType,
    lines: &[S],
    elapsed_seconds: f64,
) -> ExtractionResult {
    let extracted_data = match doc_type {
        DocumentType::Pan => NormalizedRecord::Pan(ocr::classify_pan_lines(lines)),
        DocumentType::Aadhaar => NormalizedRecord::Aadhaar(ocr::classify_aadhaar_lines(lines)),
    };

    ExtractionResult {
        document_type: doc_type,
        raw_text: lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n"),
        elapsed_seconds,
        extracted_data,
    }
}

// ── VLM-backed entry points ──────────────────────────────────────────────────

/// Extract fields from a card image on disk.
///
/// # Errors
/// Fatal only: unreadable or non-image file, provider not configured, or
/// every VLM attempt failed. An unparseable model answer is *not* an error;
/// it yields a record of empty fields.
pub async fn extract_image(
    path: impl AsRef<Path>,
    doc_type: DocumentType,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    let path = path.as_ref().to_path_buf();
    info!("Extracting {} card: {}", doc_type.label(), path.display());

    run_vlm(move || input::load_image_file(&path), doc_type, config).await
}

/// Extract fields from a base64 image payload (optionally a `data:` URL).
pub async fn extract_base64(
    payload: &str,
    file_name: Option<&str>,
    mime_type: Option<&str>,
    doc_type: DocumentType,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    let payload = payload.to_string();
    let file_name = file_name.map(str::to_string);
    let mime_type = mime_type.map(str::to_string);

    run_vlm(
        move || input::decode_base64_image(&payload, file_name.as_deref(), mime_type.as_deref()),
        doc_type,
        config,
    )
    .await
}

/// Synchronous wrapper around [`extract_image`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_image_sync(
    path: impl AsRef<Path>,
    doc_type: DocumentType,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_image(path, doc_type, config))
}

/// Load, encode, ask and package one card, bracketed by progress events.
///
/// `load` runs on the blocking pool; every failure after `on_document_start`,
/// including an unreadable input, is reported through `on_document_error`.
async fn run_vlm<F>(
    load: F,
    doc_type: DocumentType,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractError>
where
    F: FnOnce() -> Result<DynamicImage, ExtractError> + Send + 'static,
{
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(doc_type);
    }

    let outcome = async {
        let img = tokio::task::spawn_blocking(load)
            .await
            .map_err(|e| ExtractError::Internal(format!("image loader panicked: {e}")))??;
        let provider = resolve_provider(config)?;

        let cfg = config.clone();
        let image_data = tokio::task::spawn_blocking(move || {
            let prepared = encode::preprocess(&img, &cfg);
            encode::encode_image(&prepared)
        })
        .await
        .map_err(|e| ExtractError::Internal(format!("image encoder panicked: {e}")))?
        .map_err(|e| ExtractError::Internal(format!("Image encoding failed: {e}")))?;

        let response = llm::ask_oracle(&provider, doc_type, image_data, config).await?;
        debug!("{} raw output: {}", doc_type.label(), response.text);
        Ok::<_, ExtractError>(extract_document(
            doc_type,
            &response.text,
            response.elapsed_seconds,
        ))
    }
    .await;

    if let Some(ref cb) = config.progress_callback {
        match &outcome {
            Ok(result) => cb.on_document_complete(
                doc_type,
                result.extracted_data.recovered_count(),
                result.elapsed_seconds,
            ),
            Err(e) => cb.on_document_error(doc_type, &e.to_string()),
        }
    }

    if let Ok(ref result) = outcome {
        info!(
            "{}: {}/{} fields recovered in {:.1}s",
            doc_type.label(),
            result.extracted_data.recovered_count(),
            result.extracted_data.fields().len(),
            result.elapsed_seconds
        );
    }

    outcome
}

// ── Provider resolution ──────────────────────────────────────────────────────

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ExtractError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is
/// 2. **Named provider + model** (`config.provider_name`)
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`
/// 4. **OpenAI** when `OPENAI_API_KEY` is set
/// 5. **Full auto-detection** via [`ProviderFactory::from_env`]
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ExtractError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider/--model.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

//! VLM interaction: send one card image plus its instruction, return raw text.
//!
//! The model is an opaque text oracle. This module only builds the messages,
//! bounds each call with a timeout, and retries transient failures. Prompt
//! wording lives in [`crate::prompts`], parsing in [`super::recover`].
//!
//! ## Retry Strategy
//!
//! Exponential backoff (`retry_backoff_ms * 2^(attempt-1)`): with the default
//! 500 ms base and 2 retries the waits are 500 ms then 1 s.

use crate::config::ExtractionConfig;
use crate::document::DocumentType;
use crate::error::ExtractError;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Raw oracle answer for one document.
#[derive(Debug, Clone)]
pub struct OracleResponse {
    pub text: String,
    /// Seconds spent in the successful call (excludes earlier failed attempts).
    pub elapsed_seconds: f64,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub retries: u32,
}

/// Ask the VLM to read one card image.
///
/// ## Message Layout
/// 1. **System message**: the document instruction (built-in or override)
/// 2. **User message**: the card PNG as an image attachment, empty text
pub async fn ask_oracle(
    provider: &Arc<dyn LLMProvider>,
    doc_type: DocumentType,
    image_data: ImageData,
    config: &ExtractionConfig,
) -> Result<OracleResponse, ExtractError> {
    let messages = vec![
        ChatMessage::system(config.prompt_for(doc_type)),
        ChatMessage::user_with_images("", vec![image_data]),
    ];
    let options = build_options(config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);

    let mut last_err: Option<ExtractError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_delay(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                doc_type.label(),
                attempt,
                config.max_retries,
                backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let start = Instant::now();
        match timeout(call_timeout, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                let elapsed = start.elapsed();
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    doc_type.label(),
                    response.prompt_tokens,
                    response.completion_tokens,
                    elapsed
                );
                return Ok(OracleResponse {
                    text: response.content,
                    elapsed_seconds: round_millis(elapsed.as_secs_f64()),
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    retries: attempt,
                });
            }
            Ok(Err(e)) => {
                warn!("{}: attempt {} failed: {}", doc_type.label(), attempt + 1, e);
                last_err = Some(ExtractError::OracleFailed {
                    retries: attempt,
                    detail: e.to_string(),
                });
            }
            Err(_) => {
                warn!(
                    "{}: attempt {} timed out after {}s",
                    doc_type.label(),
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_err = Some(ExtractError::OracleTimeout {
                    secs: config.api_timeout_secs,
                });
            }
        }
    }

    Err(match last_err {
        Some(ExtractError::OracleFailed { detail, .. }) => ExtractError::OracleFailed {
            retries: config.max_retries,
            detail,
        },
        Some(other) => other,
        None => ExtractError::Internal("no VLM attempt was made".into()),
    })
}

/// Wait before retry `attempt` (1-based), saturating instead of overflowing.
fn backoff_delay(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Round seconds to millisecond precision for stable reporting.
fn round_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

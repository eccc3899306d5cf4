//! Configuration for VLM-backed card extraction.
//!
//! Every knob lives in [`ExtractionConfig`], built through
//! [`ExtractionConfigBuilder`]. The pure pipeline (recovery, normalisation,
//! OCR line rules) takes no configuration at all; these settings only affect
//! how images are prepared and how the model is called.

use crate::document::DocumentType;
use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for a card extraction.
///
/// # Example
/// ```rust
/// use idcard_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4.1-mini")
///     .max_retries(1)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier, e.g. "gpt-4.1-mini". If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0.
    ///
    /// Transcription wants the most likely reading, not a creative one.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 512.
    ///
    /// The expected answer is a five-key JSON object; 512 leaves room for a
    /// long address plus the commentary some models add anyway.
    pub max_tokens: usize,

    /// Retry attempts after a failed or timed-out call. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout in seconds. Default: 120.
    ///
    /// Local CPU models can take over a minute per card.
    pub api_timeout_secs: u64,

    /// Longest image side after downscaling, in pixels. Default: 1800.
    pub max_side: u32,

    /// Total pixel budget after downscaling. Default: 4 000 000.
    pub max_pixels: u64,

    /// Per-channel level stretch: percent of samples clipped at each end of
    /// the histogram. Default: `Some(1.0)`. `None` disables the stretch.
    pub autocontrast_cutoff: Option<f32>,

    /// Contrast factor around the mean grey, applied after the level stretch.
    /// Default: 1.15 (a 15 % boost). `1.0` disables it.
    pub contrast: f32,

    /// Override for the PAN instruction.
    pub pan_prompt: Option<String>,

    /// Override for the Aadhaar instruction.
    pub aadhaar_prompt: Option<String>,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 512,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            max_side: 1800,
            max_pixels: 4_000_000,
            autocontrast_cutoff: Some(1.0),
            contrast: 1.15,
            pan_prompt: None,
            aadhaar_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_side", &self.max_side)
            .field("max_pixels", &self.max_pixels)
            .field("autocontrast_cutoff", &self.autocontrast_cutoff)
            .field("contrast", &self.contrast)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The instruction to send for `doc_type`, honouring overrides.
    pub fn prompt_for(&self, doc_type: DocumentType) -> &str {
        let custom = match doc_type {
            DocumentType::Pan => self.pan_prompt.as_deref(),
            DocumentType::Aadhaar => self.aadhaar_prompt.as_deref(),
        };
        custom.unwrap_or(doc_type.default_prompt())
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_side(mut self, px: u32) -> Self {
        self.config.max_side = px;
        self
    }

    pub fn max_pixels(mut self, px: u64) -> Self {
        self.config.max_pixels = px;
        self
    }

    pub fn autocontrast_cutoff(mut self, percent: Option<f32>) -> Self {
        self.config.autocontrast_cutoff = percent;
        self
    }

    pub fn contrast(mut self, factor: f32) -> Self {
        self.config.contrast = factor;
        self
    }

    pub fn prompt(mut self, doc_type: DocumentType, prompt: impl Into<String>) -> Self {
        let prompt = Some(prompt.into());
        match doc_type {
            DocumentType::Pan => self.config.pan_prompt = prompt,
            DocumentType::Aadhaar => self.config.aadhaar_prompt = prompt,
        }
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_side < 64 {
            return Err(ExtractError::InvalidConfig(format!(
                "max_side must be ≥ 64 px, got {}",
                c.max_side
            )));
        }
        if c.max_pixels < 64 * 64 {
            return Err(ExtractError::InvalidConfig(format!(
                "max_pixels must be ≥ 4096, got {}",
                c.max_pixels
            )));
        }
        if let Some(cutoff) = c.autocontrast_cutoff {
            if !(0.0..50.0).contains(&cutoff) {
                return Err(ExtractError::InvalidConfig(format!(
                    "autocontrast cutoff must be within 0..50 percent, got {cutoff}"
                )));
            }
        }
        if !(0.0..=4.0).contains(&c.contrast) {
            return Err(ExtractError::InvalidConfig(format!(
                "contrast factor must be within 0.0..=4.0, got {}",
                c.contrast
            )));
        }
        Ok(self.config)
    }
}

//! CLI binary for idcard-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs the PAN and Aadhaar extractions, and prints the
//! checklist summary.

use anyhow::{Context, Result};
use clap::Parser;
use idcard_extract::{
    extract_image, extract_lines, name_mismatch, plan_case, plan_director_cells, safe_file_name,
    write_cell_plan, AadhaarRecord, CaseData, CellWrite, DirectorProfile, DirectorSlot,
    DocumentType, ExtractionConfig, ExtractionProgressCallback, ExtractionResult, PanRecord,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while cards are with the model and
/// one log line per finished card. PAN and Aadhaar run concurrently, so the
/// events may arrive interleaved.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Cards not yet finished (ok or error).
    pending: AtomicUsize,
}

impl CliProgressCallback {
    fn new(cards: usize) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Reading");
        bar.set_message("preparing images…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            pending: AtomicUsize::new(cards),
        })
    }

    fn finish_one(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) <= 1 {
            self.bar.finish_and_clear();
        }
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_document_start(&self, doc: DocumentType) {
        self.bar.set_message(format!("{} card sent to the model", doc.label()));
    }

    fn on_document_complete(&self, doc: DocumentType, recovered: usize, elapsed: f64) {
        let total = match doc {
            DocumentType::Pan => 4,
            DocumentType::Aadhaar => 5,
        };
        let tick = if recovered == 0 { red("✗") } else { green("✓") };
        self.bar.println(format!(
            "  {} {:<8} {:<10}  {}",
            tick,
            doc.label(),
            dim(&format!("{recovered}/{total} fields")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.finish_one();
    }

    fn on_document_error(&self, doc: DocumentType, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<8} {}", red("✗"), doc.label(), red(&msg)));
        self.finish_one();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Both cards for the first director
  idcard-extract --pan pan.jpg --aadhaar aadhaar.jpg

  # Second director, write the checklist cell plan
  idcard-extract --pan pan.jpg --aadhaar aadhaar.jpg --director 2 -o director2.json

  # Full extraction results as JSON
  idcard-extract --pan pan.jpg --json

  # Use a local model through Ollama
  idcard-extract --provider ollama --model qwen2.5vl:7b --aadhaar aadhaar.png

  # Classify OCR text lines (one per line) instead of calling a VLM
  idcard-extract --engine ocr-lines --pan pan_lines.txt --aadhaar aadhaar_lines.txt

  # Merge the cards into a case file; plan named Acme_Pvt_Ltd_Checklist_filled.json
  idcard-extract --pan pan.jpg --aadhaar aadhaar.jpg --case case.json --case-name "Acme Pvt Ltd"

CHECKLIST CELLS (column C = director 1, column D = director 2):
  Row 4   Name              (PAN)
  Row 5   Father's name     (PAN)
  Row 6   Date of birth     (PAN)
  Row 7   Place of birth
  Row 8   Nationality       (default Indian)
  Row 9   Resident of India (default Yes)
  Row 10  Occupation
  Row 11  Education
  Row 12  Shares subscribed
  Row 13  Duration at address
  Row 14  Email
  Row 15  Mobile
  Row 16  PAN number
  Row 17  AADHAR - <number>
  Row 18  Address           (Aadhaar)
  Row 19  DIN
  Row 20  Photo             (Uploaded)
  Row 21  Signature         (Uploaded)
  Rows 24-33  Company details       (--case companyInfo, column C)
  Rows 35-37  Professional details  (--case professionalInfo, column C)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (auto-selects OpenAI provider)
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override log filter (e.g. idcard_extract=debug)
"#;

/// Extract PAN and Aadhaar card fields using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "idcard-extract",
    version,
    about = "Extract PAN and Aadhaar card fields using Vision LLMs",
    long_about = "Read Indian PAN and Aadhaar card images with a Vision Language Model, \
normalise the fields, and map them onto the director column of the company-formation \
checklist. Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any \
OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PAN card image (or OCR lines file with --engine ocr-lines).
    #[arg(long, env = "IDCARD_PAN")]
    pan: Option<PathBuf>,

    /// Aadhaar card image (or OCR lines file with --engine ocr-lines).
    #[arg(long, env = "IDCARD_AADHAAR")]
    aadhaar: Option<PathBuf>,

    /// Director slot: 1 fills column C, 2 fills column D.
    #[arg(long, env = "IDCARD_DIRECTOR", default_value_t = 1,
          value_parser = clap::value_parser!(u8).range(1..=2))]
    director: u8,

    /// Extraction engine: vlm or ocr-lines.
    #[arg(long, env = "IDCARD_ENGINE", value_enum, default_value = "vlm")]
    engine: EngineArg,

    /// Write the checklist cell plan (JSON) to this file.
    #[arg(short, long, env = "IDCARD_OUTPUT")]
    output: Option<PathBuf>,

    /// Case data JSON (directors, companyInfo, professionalInfo); the cards
    /// read in this run fill the --director entry.
    #[arg(long, env = "IDCARD_CASE")]
    case: Option<PathBuf>,

    /// Case name; without -o the plan is written to <case-name>_Checklist_filled.json.
    #[arg(long, env = "IDCARD_CASE_NAME")]
    case_name: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(
        long,
        env = "EDGEQUAKE_MODEL",
        long_help = "Vision LLM model to use. Default: gpt-4.1-nano.\n\
          Small models read printed card text well; use a larger one for worn or blurred cards."
    )]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Max LLM output tokens per card.
    #[arg(long, env = "IDCARD_MAX_TOKENS", default_value_t = 512)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "IDCARD_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Retries per card on LLM failure.
    #[arg(long, env = "IDCARD_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-card LLM call timeout in seconds.
    #[arg(long, env = "IDCARD_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Longest image side sent to the model, in pixels.
    #[arg(long, env = "IDCARD_MAX_SIDE", default_value_t = 1800)]
    max_side: u32,

    /// Output the full extraction results as JSON instead of the summary.
    #[arg(long, env = "IDCARD_JSON")]
    json: bool,

    /// Disable progress spinner.
    #[arg(long, env = "IDCARD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IDCARD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IDCARD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum EngineArg {
    Vlm,
    OcrLines,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active.
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && cli.engine == EngineArg::Vlm;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.pan.is_none() && cli.aadhaar.is_none() {
        anyhow::bail!("Provide at least one of --pan or --aadhaar");
    }
    let slot = DirectorSlot::try_from(cli.director).context("Invalid --director")?;

    // ── Extract ──────────────────────────────────────────────────────────
    let started = Instant::now();
    let (pan, aadhaar) = match cli.engine {
        EngineArg::Vlm => {
            let progress_cb: Option<ProgressCallback> = if show_progress {
                let cards = cli.pan.iter().chain(cli.aadhaar.iter()).count();
                Some(CliProgressCallback::new(cards) as Arc<dyn ExtractionProgressCallback>)
            } else {
                None
            };
            let config = build_config(&cli, progress_cb)?;

            let (pan, aadhaar) = futures::future::join(
                run_vlm(cli.pan.as_deref(), DocumentType::Pan, &config),
                run_vlm(cli.aadhaar.as_deref(), DocumentType::Aadhaar, &config),
            )
            .await;
            (pan?, aadhaar?)
        }
        EngineArg::OcrLines => (
            run_ocr_lines(cli.pan.as_deref(), DocumentType::Pan).await?,
            run_ocr_lines(cli.aadhaar.as_deref(), DocumentType::Aadhaar).await?,
        ),
    };
    let total_elapsed = started.elapsed().as_secs_f64();

    let pan_record = pan.as_ref().and_then(|r| r.extracted_data.as_pan());
    let aadhaar_record = aadhaar.as_ref().and_then(|r| r.extracted_data.as_aadhaar());

    if cli.json {
        let results: Vec<&ExtractionResult> = pan.iter().chain(aadhaar.iter()).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&results).context("Failed to serialise output")?
        );
    }

    // ── Cross-check and cell plan ────────────────────────────────────────
    let mismatch = match (pan_record, aadhaar_record) {
        (Some(p), Some(a)) => name_mismatch(p, a),
        _ => None,
    };
    let plan = match cli.case {
        Some(ref path) => {
            let mut case = load_case(path).await?;
            let index = usize::from(cli.director) - 1;
            if case.directors.len() <= index {
                case.directors.resize_with(index + 1, Default::default);
            }
            let director = &mut case.directors[index];
            if let Some(p) = pan_record {
                director.pan_data = Some(p.clone());
            }
            if let Some(a) = aadhaar_record {
                director.aadhaar_data = Some(a.clone());
            }
            plan_case(&case)
        }
        None => plan_director_cells(pan_record, aadhaar_record, &DirectorProfile::default(), slot),
    };

    let output = cli
        .output
        .clone()
        .or_else(|| cli.case_name.as_deref().map(|n| PathBuf::from(safe_file_name(n))));
    if let Some(ref path) = output {
        write_cell_plan(path, &plan)
            .await
            .with_context(|| format!("Failed to write cell plan to {}", path.display()))?;
    }

    if cli.quiet || cli.json {
        return Ok(());
    }

    if let Some(m) = mismatch {
        eprintln!();
        eprintln!("{} {}", cyan("⚠"), bold("Name mismatch:"));
        eprintln!("   PAN:     {}", m.pan_name);
        eprintln!("   Aadhaar: {}", m.aadhaar_name);
        eprintln!("   {}", dim("Using PAN name (as per checklist template)"));
    }

    print_summary(pan_record, aadhaar_record, &plan, cli.director, slot, total_elapsed);
    if let Some(ref path) = output {
        println!("  → Output: {}", bold(&path.display().to_string()));
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .max_side(cli.max_side);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn run_vlm(
    path: Option<&Path>,
    doc_type: DocumentType,
    config: &ExtractionConfig,
) -> Result<Option<ExtractionResult>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let result = extract_image(path, doc_type, config)
        .await
        .with_context(|| format!("{} extraction failed for {}", doc_type.label(), path.display()))?;
    Ok(Some(result))
}

/// Read a case data JSON file.
async fn load_case(path: &Path) -> Result<CaseData> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read case data from {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid case data JSON in {}", path.display()))
}

/// Read an OCR lines file (one text line per line) and classify it.
async fn run_ocr_lines(
    path: Option<&Path>,
    doc_type: DocumentType,
) -> Result<Option<ExtractionResult>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let started = Instant::now();
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read OCR lines from {}", path.display()))?;
    let lines: Vec<&str> = text.lines().collect();
    let elapsed = started.elapsed().as_secs_f64();
    Ok(Some(extract_lines(doc_type, &lines, elapsed)))
}

fn print_summary(
    pan: Option<&PanRecord>,
    aadhaar: Option<&AadhaarRecord>,
    plan: &[CellWrite],
    director: u8,
    slot: DirectorSlot,
    total_elapsed: f64,
) {
    let rule = "=".repeat(60);
    println!();
    println!("{rule}");
    println!("{}", bold("EXTRACTION SUMMARY"));
    println!("{rule}");

    let mut rows: Vec<(&str, &str)> = Vec::new();
    if let Some(p) = pan {
        rows.push(("Name:", p.name.as_str()));
        rows.push(("Father's Name:", p.fathers_name.as_str()));
        rows.push(("DOB:", p.date_of_birth.as_str()));
        rows.push(("PAN:", p.pan_number.as_str()));
    }
    if let Some(a) = aadhaar {
        rows.push(("Aadhaar No:", a.aadhaar_number.as_str()));
        rows.push(("Address:", a.address.as_str()));
    }
    for (label, value) in rows.into_iter().filter(|(_, v)| !v.is_empty()) {
        println!("  {label:<16}{value}");
    }

    println!();
    println!("  ⏱  Total time: {}", dim(&format!("{total_elapsed:.1}s")));
    // Card rows only: the profile defaults are always present.
    let card_cells = plan
        .iter()
        .filter(|w| w.column == slot.column() && matches!(w.row, 4..=6 | 16..=18))
        .count();
    println!(
        "  {} {}/6 card fields populated in Director {} column ({}), {} cells planned",
        if card_cells == 6 { green("✔") } else { cyan("⚠") },
        card_cells,
        director,
        slot.column_letter(),
        plan.len()
    );
}

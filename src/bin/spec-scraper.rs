//! CLI binary for pdf-spec-scraper.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ScrapeConfig` and prints the batch summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_spec_scraper::{
    document_text, scrape_batch, BatchProgressCallback, BatchReport, ColumnSchema,
    DocumentStatus, ProgressCallback, ScrapeConfig,
};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Shorten long messages so a log line fits one terminal row.
fn truncate(msg: &str, max: usize) -> String {
    match msg.char_indices().nth(max) {
        Some((cut, _)) => format!("{}\u{2026}", &msg[..cut]),
        None => msg.to_string(),
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// document. Documents may finish out of order when `--concurrency > 1`.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix("Scraping");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut t| t.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Scraping {total} document(s)…"))
        ));
    }

    fn on_document_start(&self, index: usize, _total: usize, input: &str) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(index, Instant::now());
        }
        self.bar.set_message(truncate(input, 40));
    }

    fn on_document_complete(&self, index: usize, total: usize, status: &DocumentStatus) {
        let secs = dim(&format!("{:.1}s", self.elapsed_secs(index)));
        let line = match status {
            DocumentStatus::Written { path, rows } => format!(
                "  {} {:>3}/{:<3}  {:>3} rows  →  {}  {}",
                green("✓"),
                index,
                total,
                rows,
                path.display(),
                secs
            ),
            DocumentStatus::NoData { reason } => format!(
                "  {} {:>3}/{:<3}  {}  {}",
                yellow("∅"),
                index,
                total,
                yellow(&truncate(reason, 80)),
                secs
            ),
            DocumentStatus::Failed { error } => format!(
                "  {} {:>3}/{:<3}  {}  {}",
                red("✗"),
                index,
                total,
                red(&truncate(error.lines().next().unwrap_or(""), 80)),
                secs
            ),
        };
        self.bar.println(line);
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _report: &BatchReport) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scrape two spec sheets into the current directory
  spec-scraper sink.pdf faucet.pdf

  # Write workbooks elsewhere, with a custom column layout
  spec-scraper -o exports --columns columns.txt specs/*.pdf

  # Scrape a remote PDF with a bigger model
  spec-scraper --model gpt-4.1 https://example.com/specs/SG404.pdf

  # Print the text the model would see (no API key needed)
  spec-scraper --text-only sink.pdf

  # Machine-readable batch report, non-zero exit if any file failed
  spec-scraper --json --strict specs/*.pdf > report.json

OUTPUT:
  Each input <name>.pdf produces <output-dir>/<name>_.xlsx with a bold header
  row followed by one row per product. Inputs for which the model returned no
  usable JSON array produce no workbook.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Provider name, same as --provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Model ID, same as --model
  PDFIUM_LIB_PATH         Path to libpdfium (file or containing directory)
  RUST_LOG                Override the log filter (e.g. pdf_spec_scraper=debug)
"#;

/// Extract product specification rows from PDF spec sheets into xlsx files.
#[derive(Parser, Debug)]
#[command(
    name = "spec-scraper",
    version,
    about = "Extract product specification rows from PDF spec sheets into xlsx files",
    long_about = "Extract product specification rows from PDF spec sheets (local files or URLs) \
using an LLM, and write one Excel workbook per document with a fixed column layout. Supports \
OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file paths or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Directory the xlsx files are written to.
    #[arg(short, long, env = "SPEC_SCRAPER_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Column list file: a JSON array of names or one name per line.
    #[arg(long, env = "SPEC_SCRAPER_COLUMNS")]
    columns: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_LLM_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Max LLM output tokens per document.
    #[arg(long, env = "SPEC_SCRAPER_MAX_TOKENS", default_value_t = 1500)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "SPEC_SCRAPER_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Retries per document on LLM failure.
    #[arg(long, env = "SPEC_SCRAPER_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Documents processed at once.
    #[arg(short, long, env = "SPEC_SCRAPER_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "SPEC_SCRAPER_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "SPEC_SCRAPER_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Per-document LLM call timeout in seconds (0 disables it).
    #[arg(long, env = "SPEC_SCRAPER_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "SPEC_SCRAPER_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Append log records to this file.
    #[arg(long, env = "SPEC_SCRAPER_LOG_FILE", default_value = "pdf_scraper.log")]
    log_file: PathBuf,

    /// Print the extracted text of each input; no LLM call, no workbook.
    #[arg(long)]
    text_only: bool,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "SPEC_SCRAPER_JSON")]
    json: bool,

    /// Exit non-zero when any document failed.
    #[arg(long)]
    strict: bool,

    /// Disable progress bar.
    #[arg(long, env = "SPEC_SCRAPER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SPEC_SCRAPER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SPEC_SCRAPER_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO lines on stderr; the log file always
    // gets the full INFO record.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.text_only;
    init_logging(&cli, show_progress)?;

    // ── Text-only mode ───────────────────────────────────────────────────
    if cli.text_only {
        let config = build_config(&cli, None).await?;
        let stdout = io::stdout();
        let failed = print_texts(&cli.inputs, &config, &mut stdout.lock()).await?;
        if cli.strict && failed > 0 {
            return Ok(ExitCode::FAILURE);
        }
        return Ok(ExitCode::SUCCESS);
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run batch ────────────────────────────────────────────────────────
    let report = scrape_batch(cli.inputs.as_slice(), &config)
        .await
        .context("Batch could not start")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }

    if !cli.quiet {
        print_summary(&report);
    }

    if cli.strict && report.failed() > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Write the text of each input to `out`, returning how many inputs failed.
///
/// A failing input is reported on stderr and skipped; only write errors on
/// `out` abort.
async fn print_texts<W: Write>(
    inputs: &[String],
    config: &ScrapeConfig,
    out: &mut W,
) -> Result<usize> {
    let mut failed = 0;
    for input in inputs {
        let extracted = match document_text(input, config).await {
            Ok(extracted) => extracted,
            Err(e) => {
                tracing::error!("Failed to extract text from {}: {}", input, e);
                eprintln!("{} {}: {}", red("✗"), input, e);
                failed += 1;
                continue;
            }
        };
        if inputs.len() > 1 {
            writeln!(out, "==> {input} ({} pages) <==", extracted.page_count)
                .context("Failed to write to stdout")?;
        }
        out.write_all(extracted.text.as_bytes())
            .context("Failed to write to stdout")?;
        if !extracted.text.ends_with('\n') {
            out.write_all(b"\n").context("Failed to write to stdout")?;
        }
    }
    Ok(failed)
}

/// Install a stderr layer and an append-mode file layer.
fn init_logging(cli: &Cli, show_progress: bool) -> Result<()> {
    let stderr_level = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    let file_level = if cli.verbose { "debug" } else { "info" };

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("Failed to open log file {:?}", cli.log_file))?;

    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(stderr_level)),
    );
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(log_file))
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(file_level)),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

fn print_summary(report: &BatchReport) {
    let icon = if report.failed() == 0 && report.no_data() == 0 {
        green("✔")
    } else if report.written() == 0 {
        red("✘")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{}  {} written  /  {} without data  /  {} failed  {}",
        icon,
        bold(&report.written().to_string()),
        report.no_data(),
        if report.failed() > 0 {
            red(&report.failed().to_string())
        } else {
            "0".to_string()
        },
        dim(&format!("{}ms", report.total_duration_ms)),
    );
    eprintln!(
        "   {} tokens in  /  {} tokens out",
        dim(&report.total_input_tokens().to_string()),
        dim(&report.total_output_tokens().to_string()),
    );
}

/// Map CLI args to `ScrapeConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ScrapeConfig> {
    let mut builder = ScrapeConfig::builder()
        .output_dir(cli.output_dir.clone())
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .concurrency(cli.concurrency)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.columns {
        let schema = ColumnSchema::from_file(path)
            .with_context(|| format!("Failed to load column list from {:?}", path))?;
        builder = builder.columns(schema);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

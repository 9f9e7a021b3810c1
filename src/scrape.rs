//! Scraping entry points: one document, one document to a file, or a batch.
//!
//! The batch driver is a small supervisor loop. Each input runs the whole
//! pipeline on its own; whatever goes wrong with one document (unreadable
//! file, provider error, unwritable output) is logged, recorded in its
//! [`DocumentReport`], and the loop moves on. Only setup failures that would
//! sink every document, such as a provider that cannot be configured, are
//! returned as `Err` before any input is touched.

use crate::config::{ScrapeConfig, DEFAULT_MODEL};
use crate::error::ScrapeError;
use crate::output::{BatchReport, DocumentOutput, DocumentReport, DocumentStats, DocumentStatus};
use crate::pipeline::extract::{self, ExtractedText, PdfiumExtractor, TextExtractor};
use crate::pipeline::llm::{self, CompletionClient, ProviderClient};
use crate::pipeline::{input, normalize, parse, xlsx};
use crate::prompts::build_extraction_prompt;
use edgequake_llm::ProviderFactory;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Extract the product records of one PDF file or URL.
///
/// # Returns
/// `Ok(DocumentOutput)` once the model has answered, even when the answer
/// contains no usable records (`output.records` is then `None` and
/// `output.parse_error` says why).
///
/// # Errors
/// Input, PDF, and completion failures.
pub async fn scrape(
    input_str: impl AsRef<str>,
    config: &ScrapeConfig,
) -> Result<DocumentOutput, ScrapeError> {
    let client = resolve_client(config)?;
    run_pipeline(client.as_ref(), resolve_extractor(config), input_str.as_ref(), config).await
}

/// Extract one document and write its spreadsheet to `output_path`.
///
/// Returns [`DocumentStatus::NoData`] without writing anything when the
/// model produced no records.
pub async fn scrape_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ScrapeConfig,
) -> Result<DocumentStatus, ScrapeError> {
    let input_str = input_str.as_ref();
    let output = scrape(input_str, config).await?;
    write_output(input_str, output, output_path.as_ref(), config)
}

/// Process every input, writing `<stem>_.xlsx` files into `config.output_dir`.
///
/// Reports come back in input order regardless of `config.concurrency`.
///
/// # Errors
/// Only setup errors (no usable completion provider). Per-document failures
/// are recorded in the report.
pub async fn scrape_batch<S: AsRef<str>>(
    inputs: &[S],
    config: &ScrapeConfig,
) -> Result<BatchReport, ScrapeError> {
    let batch_start = Instant::now();
    let total = inputs.len();

    if total == 0 {
        warn!("No input files given; nothing to do");
        return Ok(BatchReport::default());
    }

    let client = resolve_client(config)?;
    let extractor = resolve_extractor(config);
    warn_on_shared_outputs(inputs, &config.output_dir);

    info!(
        "Starting batch of {} documents (concurrency {})",
        total, config.concurrency
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let documents: Vec<DocumentReport> = stream::iter(inputs.iter().enumerate().map(|(i, input)| {
        let client = Arc::clone(&client);
        let extractor = Arc::clone(&extractor);
        async move {
            process_document(client.as_ref(), extractor, i + 1, total, input.as_ref(), config)
                .await
        }
    }))
    .buffered(config.concurrency)
    .collect()
    .await;

    let report = BatchReport {
        documents,
        total_duration_ms: batch_start.elapsed().as_millis() as u64,
    };

    info!(
        "All PDF processing completed: {} written, {} without data, {} failed, {}ms",
        report.written(),
        report.no_data(),
        report.failed(),
        report.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(&report);
    }

    Ok(report)
}

/// Synchronous wrapper around [`scrape_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn scrape_batch_sync<S: AsRef<str>>(
    inputs: &[S],
    config: &ScrapeConfig,
) -> Result<BatchReport, ScrapeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ScrapeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(scrape_batch(inputs, config))
}

/// Extract the plain text of a PDF without calling a model.
///
/// Does not require an LLM provider or API key.
pub async fn document_text(
    input_str: impl AsRef<str>,
    config: &ScrapeConfig,
) -> Result<ExtractedText, ScrapeError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    extract::extract_text(resolve_extractor(config), resolved.path()).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run one document through the supervisor: never fails, always reports.
async fn process_document(
    client: &dyn CompletionClient,
    extractor: Arc<dyn TextExtractor>,
    index: usize,
    total: usize,
    input_str: &str,
    config: &ScrapeConfig,
) -> DocumentReport {
    info!("Processing file {}/{}: {}", index, total, input_str);
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(index, total, input_str);
    }

    let output_path = xlsx::output_path_for(input_str, &config.output_dir);

    let (status, stats) = match run_pipeline(client, extractor, input_str, config).await {
        Ok(output) => {
            let stats = output.stats.clone();
            let status = write_output(input_str, output, &output_path, config).unwrap_or_else(|e| {
                DocumentStatus::Failed {
                    error: e.to_string(),
                }
            });
            (status, Some(stats))
        }
        Err(e) => {
            error!("Failed to process {}: {}", input_str, e);
            (
                DocumentStatus::Failed {
                    error: e.to_string(),
                },
                None,
            )
        }
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_complete(index, total, &status);
    }

    DocumentReport {
        input: input_str.to_string(),
        status,
        stats,
    }
}

/// Resolve → extract → prompt → complete → parse → normalise.
async fn run_pipeline(
    client: &dyn CompletionClient,
    extractor: Arc<dyn TextExtractor>,
    input_str: &str,
    config: &ScrapeConfig,
) -> Result<DocumentOutput, ScrapeError> {
    let total_start = Instant::now();
    info!("Starting data extraction for: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    // ── Step 2: Extract text ─────────────────────────────────────────────
    let extract_start = Instant::now();
    let extracted = extract::extract_text(extractor, resolved.path()).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    // ── Step 3: Build prompt and call the model ──────────────────────────
    let prompt = build_extraction_prompt(&extracted.text);
    info!(
        "Requesting completion for {} via {} ({} prompt chars)",
        input_str,
        client.label(),
        prompt.len()
    );
    let llm_start = Instant::now();
    let completion = llm::request_completion(client, &prompt, config).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 4: Parse and normalise ──────────────────────────────────────
    let (records, parse_error) = match parse::parse_response(&completion.text, input_str) {
        Ok(mut records) => {
            normalize::normalize_records(&mut records);
            (Some(records), None)
        }
        Err(e) => (None, Some(e)),
    };

    let stats = DocumentStats {
        page_count: extracted.page_count,
        text_chars: extracted.char_count(),
        input_tokens: completion.prompt_tokens,
        output_tokens: completion.completion_tokens,
        record_count: records.as_ref().map_or(0, Vec::len),
        extract_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    Ok(DocumentOutput {
        records,
        parse_error,
        stats,
    })
}

/// Write the records of `output`, or report why there is nothing to write.
fn write_output(
    input_str: &str,
    output: DocumentOutput,
    output_path: &Path,
    config: &ScrapeConfig,
) -> Result<DocumentStatus, ScrapeError> {
    if !output.has_records() {
        let reason = match output.parse_error {
            Some(e) => e.to_string(),
            None => "model returned an empty product list".to_string(),
        };
        warn!("No data extracted for {}: {}", input_str, reason);
        return Ok(DocumentStatus::NoData { reason });
    }
    let records = output.records.unwrap_or_default();

    xlsx::write_records(&records, output_path, &config.columns)?;
    Ok(DocumentStatus::Written {
        path: output_path.to_path_buf(),
        rows: records.len(),
    })
}

fn resolve_extractor(config: &ScrapeConfig) -> Arc<dyn TextExtractor> {
    match config.extractor {
        Some(ref extractor) => Arc::clone(extractor),
        None => Arc::new(PdfiumExtractor::new(
            config.pdfium_lib_path.clone(),
            config.password.clone(),
        )),
    }
}

fn create_client(provider_name: &str, model: &str) -> Result<Arc<dyn CompletionClient>, ScrapeError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ScrapeError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderClient::new(
        provider,
        format!("{provider_name}/{model}"),
    )))
}

/// Resolve the completion client, from most-specific to least-specific.
///
/// 1. **Injected client** (`config.client`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`]; the provider reads its own API key variable.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Auto-detection** via `ProviderFactory::from_env`.
fn resolve_client(config: &ScrapeConfig) -> Result<Arc<dyn CompletionClient>, ScrapeError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_client(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_client(&prov, &env_model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_client("openai", model);
        }
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ScrapeError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(ProviderClient::new(provider, "auto")))
}

/// Inputs sharing a file stem map to the same spreadsheet; the later one wins.
fn warn_on_shared_outputs<S: AsRef<str>>(inputs: &[S], output_dir: &Path) {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    for input in inputs {
        let input = input.as_ref();
        let path = xlsx::output_path_for(input, output_dir);
        if let Some(previous) = seen.insert(path.clone(), input) {
            warn!(
                "'{}' and '{}' both write to {}; the later document overwrites the earlier",
                previous,
                input,
                path.display()
            );
        }
    }
}

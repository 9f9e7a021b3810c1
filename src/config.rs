//! Configuration for a scraping run.
//!
//! Every knob lives in [`ScrapeConfig`], built through
//! [`ScrapeConfigBuilder`] so callers set only what they care about and get
//! documented defaults for the rest.

use crate::error::ScrapeError;
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::llm::CompletionClient;
use crate::progress::ProgressCallback;
use crate::schema::ColumnSchema;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Configuration for extracting records from a batch of PDFs.
///
/// # Example
/// ```rust
/// use pdf_spec_scraper::ScrapeConfig;
///
/// let config = ScrapeConfig::builder()
///     .model("gpt-4.1-mini")
///     .output_dir("exports")
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ScrapeConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`] or the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed completion client. Takes precedence over `provider_name`.
    pub client: Option<Arc<dyn CompletionClient>>,

    /// Text extractor. If None, a pdfium extractor is built from
    /// `pdfium_lib_path` and `password`.
    pub extractor: Option<Arc<dyn TextExtractor>>,

    /// Sampling temperature. Default: 0.0, so reruns give the same rows.
    pub temperature: f32,

    /// Maximum tokens the model may generate per document. Default: 1500.
    pub max_tokens: usize,

    /// Extra attempts after a failed completion call. Default: 0.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-attempt completion timeout in seconds; 0 disables it. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom system prompt. If None, uses [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Output columns. Default: [`crate::schema::DEFAULT_COLUMNS`].
    pub columns: ColumnSchema,

    /// Directory spreadsheets are written to. Default: the working directory.
    pub output_dir: PathBuf,

    /// Documents processed at once. Default: 1 (strictly sequential).
    pub concurrency: usize,

    /// pdfium shared library, or the directory containing it.
    /// Falls back to `PDFIUM_LIB_PATH`.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Receives per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            client: None,
            extractor: None,
            temperature: 0.0,
            max_tokens: 1500,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            password: None,
            system_prompt: None,
            columns: ColumnSchema::default(),
            output_dir: PathBuf::from("."),
            concurrency: 1,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScrapeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("client", &self.client.as_ref().map(|c| c.label().to_string()))
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn TextExtractor>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("columns", &self.columns.len())
            .field("output_dir", &self.output_dir)
            .field("concurrency", &self.concurrency)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl ScrapeConfig {
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ScrapeConfig`].
#[derive(Debug)]
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.config.extractor = Some(extractor);
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

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn columns(mut self, columns: ColumnSchema) -> Self {
        self.config.columns = columns;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScrapeConfig, ScrapeError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ScrapeError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ScrapeError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(ScrapeError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_extraction_settings() {
        let c = ScrapeConfig::default();
        assert_eq!(c.temperature, 0.0);
        assert_eq!(c.max_tokens, 1500);
        assert_eq!(c.max_retries, 0);
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.output_dir, PathBuf::from("."));
        assert_eq!(c.columns, ColumnSchema::default());
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = ScrapeConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_concurrency() {
        assert!(ScrapeConfig::builder().concurrency(0).build().is_err());
        assert!(ScrapeConfig::builder().max_tokens(0).build().is_err());
        assert!(ScrapeConfig::builder().output_dir("").build().is_err());
    }

    #[test]
    fn builder_sets_columns_and_output() {
        let schema = ColumnSchema::new(["mfr name", "height"]).unwrap();
        let c = ScrapeConfig::builder()
            .columns(schema.clone())
            .output_dir("exports")
            .model("gpt-4.1")
            .build()
            .unwrap();
        assert_eq!(c.columns, schema);
        assert_eq!(c.output_dir, PathBuf::from("exports"));
        assert_eq!(c.model.as_deref(), Some("gpt-4.1"));
        assert!(format!("{c:?}").contains("exports"));
    }
}

//! # pdf-spec-scraper
//!
//! Pull product specification rows out of PDF spec sheets with an LLM and
//! write them to Excel workbooks with a fixed column layout.
//!
//! Spec sheets are laid out for people: dimensions in side tables, model
//! numbers in headers, electrical data in footnotes. Rather than teaching a
//! parser every vendor's layout, this crate hands the page text to a
//! completion model together with a list of the fields we want and asks for
//! a JSON array back, one object per product variant.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Extract    page text via pdfium (blocking, spawn_blocking)
//!  ├─ 3. Prompt     field list + rules + document text
//!  ├─ 4. Complete   one chat call (openai / anthropic / gemini / ollama …)
//!  ├─ 5. Parse      first balanced JSON array of objects in the reply
//!  ├─ 6. Normalise  strip "label:" prefixes, blank NaN part numbers
//!  └─ 7. Write      <stem>_.xlsx with the declared columns, header row first
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_spec_scraper::{scrape_batch, ScrapeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ScrapeConfig::builder().output_dir("exports").build()?;
//!     let report = scrape_batch(&["sink.pdf", "faucet.pdf"], &config).await?;
//!     eprintln!(
//!         "{} written, {} without data, {} failed",
//!         report.written(),
//!         report.no_data(),
//!         report.failed()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `spec-scraper` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-spec-scraper = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod schema;
pub mod scrape;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ScrapeConfig, ScrapeConfigBuilder, DEFAULT_MODEL};
pub use error::{ParseFailure, ScrapeError};
pub use output::{BatchReport, DocumentOutput, DocumentReport, DocumentStats, DocumentStatus};
pub use pipeline::extract::{ExtractedText, PdfiumExtractor, TextExtractor};
pub use pipeline::llm::{Completion, CompletionClient, CompletionRequest, ProviderClient};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::ProductRecord;
pub use schema::{ColumnSchema, DEFAULT_COLUMNS};
pub use scrape::{document_text, scrape, scrape_batch, scrape_batch_sync, scrape_to_file};

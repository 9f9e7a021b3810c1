//! Error types for the pdf-spec-scraper library.
//!
//! Two distinct types reflect two distinct outcomes:
//!
//! * [`ScrapeError`] — the document (or the whole batch, for setup errors)
//!   cannot proceed: unreadable input, corrupt PDF, provider failure, an
//!   unwritable output file. The batch driver records it against the
//!   document and moves on to the next one.
//!
//! * [`ParseFailure`] — the model answered, but no usable JSON array of
//!   records could be found in its reply. This is an expected outcome with
//!   free-form model output, logged and reported as "no data" rather than
//!   treated as an error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the pdf-spec-scraper library.
#[derive(Debug, Error)]
pub enum ScrapeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a file path nor a usable URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium opened the document but failed to read a page's text layer.
    #[error("Text extraction failed for page {page} of '{path}': {detail}")]
    TextExtractionFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or the directory containing it),\n\
place the library in the working directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion endpoint returned an error on every attempt.
    #[error("LLM API error after {attempts} attempt(s): {message}")]
    LlmApiError { attempts: u32, message: String },

    /// The completion call did not finish within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory or move the finished file into place.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The spreadsheet encoder rejected the data or could not save the workbook.
    #[error("Failed to write spreadsheet '{path}': {detail}")]
    SpreadsheetWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The column schema is empty, has duplicates, or cannot be read.
    #[error("Invalid column schema: {0}")]
    InvalidSchema(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a model reply produced no records.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ParseFailure {
    /// The reply contains no balanced `[ ... ]` span.
    #[error("no JSON array found in response")]
    NoJsonArray,

    /// Balanced spans exist but none is a JSON array of objects.
    #[error("unable to parse JSON response: {0}")]
    InvalidJson(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_display_mentions_attempts() {
        let e = ScrapeError::LlmApiError {
            attempts: 3,
            message: "rate limited".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("3 attempt"), "got: {msg}");
        assert!(msg.contains("rate limited"));
    }

    #[test]
    fn api_timeout_display() {
        let e = ScrapeError::ApiTimeout { secs: 120 };
        assert!(e.to_string().contains("120s"));
    }

    #[test]
    fn parse_failure_display() {
        assert_eq!(
            ParseFailure::NoJsonArray.to_string(),
            "no JSON array found in response"
        );
        let e = ParseFailure::InvalidJson("expected value at line 1".into());
        assert!(e.to_string().contains("line 1"));
    }
}

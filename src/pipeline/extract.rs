//! Text extraction: read the text layer of every page via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is blocking and keeps
//! thread-local state. [`extract_text`] moves the work onto Tokio's blocking
//! pool so the async workers never stall on a large document.
//!
//! ## Binding
//!
//! The pdfium shared library is looked up at runtime, in order:
//! the configured path (`PDFIUM_LIB_PATH`, file or directory), the working
//! directory, then the system library path.

use crate::error::ScrapeError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Plain text of a document, pages concatenated in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
}

impl ExtractedText {
    /// Length in Unicode scalar values, not bytes.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Source of document text.
///
/// [`PdfiumExtractor`] is the default; tests and embedders can supply
/// another implementation through
/// [`crate::config::ScrapeConfigBuilder::extractor`].
pub trait TextExtractor: Send + Sync {
    fn extract(&self, pdf_path: &Path) -> Result<ExtractedText, ScrapeError>;
}

/// pdfium-backed [`TextExtractor`].
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    lib_path: Option<PathBuf>,
    password: Option<String>,
}

impl PdfiumExtractor {
    pub fn new(lib_path: Option<PathBuf>, password: Option<String>) -> Self {
        Self { lib_path, password }
    }

    fn bind(&self) -> Result<Pdfium, ScrapeError> {
        let configured = self
            .lib_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match configured {
            Some(path) => {
                let lib = if path.is_dir() {
                    Pdfium::pdfium_platform_library_name_at_path(&path)
                } else {
                    path
                };
                debug!("Binding pdfium from {}", lib.display());
                Pdfium::bind_to_library(&lib)
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ScrapeError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract(&self, pdf_path: &Path) -> Result<ExtractedText, ScrapeError> {
        let pdfium = self.bind()?;
        let password = self.password.as_deref();

        let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    ScrapeError::WrongPassword {
                        path: pdf_path.to_path_buf(),
                    }
                } else {
                    ScrapeError::PasswordRequired {
                        path: pdf_path.to_path_buf(),
                    }
                }
            } else {
                ScrapeError::CorruptPdf {
                    path: pdf_path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        let mut pages = Vec::new();
        for (idx, page) in document.pages().iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| ScrapeError::TextExtractionFailed {
                    path: pdf_path.to_path_buf(),
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?
                .all();
            debug!("Page {}: {} chars", idx + 1, text.len());
            pages.push(text);
        }

        let page_count = pages.len();
        Ok(ExtractedText {
            text: join_pages(pages),
            page_count,
        })
    }
}

/// Concatenate page texts in order, keeping a line break at each page boundary.
pub fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut text = String::new();
    for page in pages {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&page);
    }
    text
}

/// Extract the text of `pdf_path` on the blocking pool.
pub async fn extract_text(
    extractor: Arc<dyn TextExtractor>,
    pdf_path: &Path,
) -> Result<ExtractedText, ScrapeError> {
    info!("Extracting text from PDF: {}", pdf_path.display());
    let path = pdf_path.to_path_buf();

    let extracted = tokio::task::spawn_blocking(move || extractor.extract(&path))
        .await
        .map_err(|e| ScrapeError::Internal(format!("Extraction task panicked: {}", e)))??;

    if extracted.text.trim().is_empty() {
        warn!(
            "No text layer found in {} ({} pages); the document may be scanned",
            pdf_path.display(),
            extracted.page_count
        );
    }
    info!(
        "Successfully extracted text from PDF: {} ({} pages, {} chars)",
        pdf_path.display(),
        extracted.page_count,
        extracted.char_count()
    );
    Ok(extracted)
}

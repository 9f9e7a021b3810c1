//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ScrapeConfigBuilder::progress_callback`] to receive
//! events as the batch driver works through its inputs. The CLI uses this to
//! drive a terminal progress bar; a service could forward the events to a
//! channel instead.
//!
//! # Example
//!
//! ```rust
//! use pdf_spec_scraper::{BatchProgressCallback, DocumentStatus, ScrapeConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, _index: usize, _total: usize, status: &DocumentStatus) {
//!         if status.is_written() {
//!             self.written.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = ScrapeConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{BatchReport, DocumentStatus};
use std::sync::Arc;

/// Called by the batch driver as it processes each document.
///
/// All methods default to no-ops. With `concurrency > 1` the per-document
/// methods may be called from several tasks at once, so implementations must
/// synchronise any shared state.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first document starts.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when a document enters the pipeline.
    ///
    /// * `index` — 1-indexed position in the input list
    fn on_document_start(&self, index: usize, total: usize, input: &str) {
        let _ = (index, total, input);
    }

    /// Called when a document leaves the pipeline, whatever the outcome.
    fn on_document_complete(&self, index: usize, total: usize, status: &DocumentStatus) {
        let _ = (index, total, status);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, report: &BatchReport) {
        let _ = report;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ScrapeConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        starts: AtomicUsize,
        written: AtomicUsize,
        failed: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total: usize) {
            self.started_total.store(total, Ordering::SeqCst);
        }

        fn on_document_start(&self, _index: usize, _total: usize, _input: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _index: usize, _total: usize, status: &DocumentStatus) {
            if status.is_written() {
                self.written.fetch_add(1, Ordering::SeqCst);
            } else if status.is_failed() {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start(1, 2, "a.pdf");
        cb.on_document_complete(
            1,
            2,
            &DocumentStatus::Failed {
                error: "boom".into(),
            },
        );
        cb.on_batch_complete(&BatchReport::default());
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_batch_start(2);
        tracker.on_document_start(1, 2, "a.pdf");
        tracker.on_document_complete(
            1,
            2,
            &DocumentStatus::Written {
                path: "a_.xlsx".into(),
                rows: 2,
            },
        );
        tracker.on_document_start(2, 2, "b.pdf");
        tracker.on_document_complete(
            2,
            2,
            &DocumentStatus::Failed {
                error: "corrupt".into(),
            },
        );

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.written.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.failed.load(Ordering::SeqCst), 1);
    }
}

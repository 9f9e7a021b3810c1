//! Batch driver tests with an in-memory extractor and completion client.
//!
//! No pdfium library and no API key are needed: inputs are tiny files that
//! only carry the `%PDF` magic, the extractor returns canned text keyed by
//! file name, and the client answers with canned replies keyed by that text.

use calamine::{open_workbook, Data, Reader, Xlsx};
use futures::future::BoxFuture;
use pdf_spec_scraper::pipeline::llm::BoxError;
use pdf_spec_scraper::{
    scrape_batch, scrape_to_file, BatchProgressCallback, ColumnSchema, Completion,
    CompletionClient, CompletionRequest, DocumentStatus, ExtractedText, ScrapeConfig,
    ScrapeError, TextExtractor,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Returns `"text of <file name>"`, or a corrupt-PDF error for `broken`.
struct FakeExtractor {
    broken: &'static str,
}

impl TextExtractor for FakeExtractor {
    fn extract(&self, pdf_path: &Path) -> Result<ExtractedText, ScrapeError> {
        let name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name == self.broken {
            return Err(ScrapeError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: "xref table damaged".into(),
            });
        }
        Ok(ExtractedText {
            text: format!("text of {name}"),
            page_count: 1,
        })
    }
}

/// Answers with the reply registered for the first file name found in the prompt.
struct FakeClient {
    replies: HashMap<&'static str, &'static str>,
    calls: AtomicUsize,
    /// Delay per file name, to shuffle completion order under concurrency.
    delays: HashMap<&'static str, u64>,
}

impl FakeClient {
    fn new(replies: &[(&'static str, &'static str)]) -> Self {
        Self {
            replies: replies.iter().copied().collect(),
            calls: AtomicUsize::new(0),
            delays: HashMap::new(),
        }
    }
}

impl CompletionClient for FakeClient {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> BoxFuture<'a, Result<Completion, BoxError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (name, reply) = self
                .replies
                .iter()
                .find(|(name, _)| request.prompt.contains(&format!("text of {name}")))
                .ok_or_else(|| BoxError::from("unexpected prompt"))?;
            if let Some(ms) = self.delays.get(name) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            Ok::<_, BoxError>(Completion {
                text: reply.to_string(),
                prompt_tokens: 100,
                completion_tokens: 20,
            })
        })
    }

    fn label(&self) -> &str {
        "fake"
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn write_pdf(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.4\n%fake\n").unwrap();
    path.to_string_lossy().into_owned()
}

fn read_sheet(path: &Path) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range("Sheet1").unwrap();
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::String(s) => s.clone(),
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

fn config(
    out: &Path,
    client: Arc<FakeClient>,
    columns: &[&str],
    concurrency: usize,
) -> ScrapeConfig {
    ScrapeConfig::builder()
        .output_dir(out)
        .client(client)
        .extractor(Arc::new(FakeExtractor {
            broken: "broken.pdf",
        }))
        .columns(ColumnSchema::new(columns.iter().copied()).unwrap())
        .concurrency(concurrency)
        .build()
        .unwrap()
}

const SINK_REPLY: &str = r#"Here you go:
[{"mfr name": "Baker", "mfr number": "SG404", "height": "Height: 14 in"},
 {"mfr name": "Baker", "mfr number": "SG504", "plug_type": "Plug: NEMA 5-15P"}]"#;

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_document_does_not_stop_the_batch() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let broken = write_pdf(input_dir.path(), "broken.pdf");
    let sink = write_pdf(input_dir.path(), "sink.pdf");

    let client = Arc::new(FakeClient::new(&[("sink.pdf", SINK_REPLY)]));
    let cfg = config(
        out_dir.path(),
        Arc::clone(&client),
        &["mfr name", "mfr number", "height", "plug_type"],
        1,
    );

    let report = scrape_batch(&[broken, sink], &cfg).await.unwrap();

    assert_eq!(report.documents.len(), 2);
    assert!(report.documents[0].status.is_failed());
    assert!(report.documents[0].stats.is_none());
    assert_eq!(report.written(), 1);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);

    let expected = out_dir.path().join("sink_.xlsx");
    assert_eq!(
        report.documents[1].status,
        DocumentStatus::Written {
            path: expected.clone(),
            rows: 2
        }
    );
    assert!(!out_dir.path().join("broken_.xlsx").exists());

    let rows = read_sheet(&expected);
    assert_eq!(rows[0], ["mfr name", "mfr number", "height", "plug_type"]);
    assert_eq!(rows[1], ["Baker", "SG404", "14 in", ""]);
    assert_eq!(rows[2], ["Baker", "SG504", "", "NEMA 5-15P"]);
}

#[tokio::test]
async fn every_declared_column_is_written_in_order() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let input = write_pdf(input_dir.path(), "cart.pdf");

    let client = Arc::new(FakeClient::new(&[(
        "cart.pdf",
        r#"[{"weight": "80 lb", "color": "grey", "mfr name": "Stryker"}]"#,
    )]));
    let columns = ["Notes", "mfr name", "btu ", "weight", "water_hot  Required (Y/N)"];
    let cfg = config(out_dir.path(), client, &columns, 1);

    let report = scrape_batch(&[input], &cfg).await.unwrap();
    assert_eq!(report.written(), 1);

    let rows = read_sheet(&out_dir.path().join("cart_.xlsx"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], columns);
    // "color" is not a declared column and is dropped.
    assert_eq!(rows[1], ["", "Stryker", "", "80 lb", ""]);
}

#[tokio::test]
async fn unparseable_reply_writes_nothing() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let prose = write_pdf(input_dir.path(), "prose.pdf");
    let empty = write_pdf(input_dir.path(), "empty.pdf");

    let client = Arc::new(FakeClient::new(&[
        ("prose.pdf", "Sorry, I could not find any products in this document."),
        ("empty.pdf", "[]"),
    ]));
    let cfg = config(out_dir.path(), client, &["mfr name"], 1);

    let report = scrape_batch(&[prose, empty], &cfg).await.unwrap();

    assert_eq!(report.no_data(), 2);
    assert_eq!(report.written(), 0);
    assert_eq!(report.failed(), 0);
    assert_eq!(
        report.documents[0].status,
        DocumentStatus::NoData {
            reason: "no JSON array found in response".into()
        }
    );
    assert_eq!(report.documents[0].stats.as_ref().unwrap().input_tokens, 100);
    assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn concurrent_batch_reports_in_input_order() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let inputs: Vec<String> = ["a.pdf", "b.pdf", "c.pdf"]
        .iter()
        .map(|n| write_pdf(input_dir.path(), n))
        .collect();

    let mut client = FakeClient::new(&[
        ("a.pdf", r#"[{"mfr name": "A"}]"#),
        ("b.pdf", r#"[{"mfr name": "B"}]"#),
        ("c.pdf", r#"[{"mfr name": "C"}]"#),
    ]);
    client.delays = [("a.pdf", 150), ("b.pdf", 50), ("c.pdf", 0)].into_iter().collect();

    #[derive(Default)]
    struct Order(std::sync::Mutex<Vec<usize>>);
    impl BatchProgressCallback for Order {
        fn on_document_complete(&self, index: usize, _total: usize, _status: &DocumentStatus) {
            self.0.lock().unwrap().push(index);
        }
    }
    let order = Arc::new(Order::default());

    let mut cfg = config(out_dir.path(), Arc::new(client), &["mfr name"], 3);
    cfg.progress_callback = Some(order.clone() as Arc<dyn BatchProgressCallback>);

    let report = scrape_batch(&inputs, &cfg).await.unwrap();

    let reported: Vec<&str> = report.documents.iter().map(|d| d.input.as_str()).collect();
    assert_eq!(reported, inputs.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(report.written(), 3);
    assert_eq!(report.total_input_tokens(), 300);
    assert_eq!(order.0.lock().unwrap().len(), 3);

    let rows = read_sheet(&out_dir.path().join("b_.xlsx"));
    assert_eq!(rows[1], ["B"]);
}

#[tokio::test]
async fn write_failure_is_isolated() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_root = tempfile::tempdir().unwrap();
    let input = write_pdf(input_dir.path(), "sink.pdf");

    // The output "directory" is a regular file, so nothing can be created in it.
    let blocked = out_root.path().join("not-a-dir");
    std::fs::write(&blocked, b"").unwrap();

    let client = Arc::new(FakeClient::new(&[("sink.pdf", SINK_REPLY)]));
    let cfg = config(&blocked, client, &["mfr name"], 1);

    let report = scrape_batch(&[input], &cfg).await.unwrap();
    assert_eq!(report.failed(), 1);
    assert!(report.documents[0].stats.is_some());
}

#[tokio::test]
async fn missing_input_is_reported_as_failed() {
    let out_dir = tempfile::tempdir().unwrap();
    let client = Arc::new(FakeClient::new(&[]));
    let cfg = config(out_dir.path(), Arc::clone(&client), &["mfr name"], 1);

    let report = scrape_batch(&["definitely/not/here.pdf"], &cfg).await.unwrap();
    match &report.documents[0].status {
        DocumentStatus::Failed { error } => assert!(error.contains("not found")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scrape_to_file_honours_explicit_path() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let input = write_pdf(input_dir.path(), "sink.pdf");
    let target: PathBuf = out_dir.path().join("nested").join("custom.xlsx");

    let client = Arc::new(FakeClient::new(&[("sink.pdf", SINK_REPLY)]));
    let cfg = config(out_dir.path(), client, &["mfr number"], 1);

    let status = scrape_to_file(&input, &target, &cfg).await.unwrap();
    assert!(status.is_written());

    let rows = read_sheet(&target);
    assert_eq!(rows, [["mfr number"], ["SG404"], ["SG504"]]);
}

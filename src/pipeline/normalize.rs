//! Record normalisation: deterministic fixes for common model quirks.
//!
//! Rules (applied in order, per record):
//! 1. Strip echoed labels from labelled fields: `"Height: 14 in"` → `"14 in"`
//! 2. Blank out `NaN` manufacturer numbers
//!
//! Every lookup treats a missing field as `""`; rules never insert fields.

use crate::record::ProductRecord;
use tracing::info;

/// Fields where the model tends to echo a `Label:` prefix.
pub const LABELLED_FIELDS: &[&str] = &["height", "plug_type"];

/// Normalise every record of a batch in place.
pub fn normalize_records(records: &mut [ProductRecord]) {
    info!("Starting data reformatting...");
    for record in records.iter_mut() {
        normalize_record(record);
    }
    info!("Data reformatting completed.");
}

/// Apply all rules to one record.
pub fn normalize_record(record: &mut ProductRecord) {
    for field in LABELLED_FIELDS {
        if let Some(value) = strip_label(record.get(field)) {
            record.set(*field, value);
        }
    }

    if record.get("mfr number").trim().eq_ignore_ascii_case("nan") {
        record.set("mfr number", "");
    }
}

/// Text after the last `:`, trimmed; `None` when there is no colon.
fn strip_label(value: &str) -> Option<String> {
    value
        .rsplit_once(':')
        .map(|(_, tail)| tail.trim().to_string())
}

//! Spreadsheet output: map records onto the column schema and save as xlsx.
//!
//! Rows are shaped by the schema, not by the records: every row has exactly
//! `schema.len()` cells in schema order, columns a record does not fill are
//! empty, and record fields without a column are dropped.
//!
//! Files are written atomically (temp file + rename) so a failed save never
//! leaves a truncated workbook behind.

use crate::error::ScrapeError;
use crate::record::ProductRecord;
use crate::schema::ColumnSchema;
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Largest row count an xlsx worksheet can hold, header included.
pub const MAX_ROWS: usize = 1_048_576;

/// Suffix appended to the input's stem to name its spreadsheet.
pub const OUTPUT_SUFFIX: &str = "_.xlsx";

/// Shape `records` into rows of cell values following `schema`.
pub fn build_rows(records: &[ProductRecord], schema: &ColumnSchema) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            schema
                .iter()
                .map(|column| record.value_for_column(column).to_string())
                .collect()
        })
        .collect()
}

/// Spreadsheet file name for an input path or URL: `<stem>_.xlsx`.
pub fn output_file_name(input: &str) -> String {
    let last = input
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(input);
    let last = last.split(['?', '#']).next().unwrap_or(last);

    let stem = Path::new(last)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string());
    format!("{stem}{OUTPUT_SUFFIX}")
}

/// Full output path for `input` inside `output_dir`.
pub fn output_path_for(input: &str, output_dir: &Path) -> PathBuf {
    output_dir.join(output_file_name(input))
}

/// Write `records` to `path` as a single-sheet workbook.
///
/// The first row holds the column names (bold); one row follows per record.
/// An empty batch produces a header-only sheet.
pub fn write_records(
    records: &[ProductRecord],
    path: &Path,
    schema: &ColumnSchema,
) -> Result<(), ScrapeError> {
    info!("Saving data to Excel file: {}", path.display());
    let result = write_workbook(records, path, schema);
    match &result {
        Ok(()) => info!("Successfully saved data to: {}", path.display()),
        Err(e) => error!("Error saving to Excel: {}", e),
    }
    result
}

fn write_workbook(
    records: &[ProductRecord],
    path: &Path,
    schema: &ColumnSchema,
) -> Result<(), ScrapeError> {
    if records.len() + 1 > MAX_ROWS {
        return Err(ScrapeError::SpreadsheetWriteFailed {
            path: path.to_path_buf(),
            detail: format!("{} records exceed the xlsx row limit", records.len()),
        });
    }

    let xlsx_err = |e: rust_xlsxwriter::XlsxError| ScrapeError::SpreadsheetWriteFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    // Column count is bounded by `schema::MAX_COLUMNS`, which fits in u16.
    for (col, name) in schema.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, name, &header_format)
            .map_err(xlsx_err)?;
    }

    for (i, row) in build_rows(records, schema).iter().enumerate() {
        let row_num = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            sheet
                .write_string(row_num, col as u16, value)
                .map_err(xlsx_err)?;
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ScrapeError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let tmp_path = path.with_extension("xlsx.tmp");
    if let Err(e) = workbook.save(&tmp_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(xlsx_err(e));
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        ScrapeError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    debug!(
        "Wrote {} rows × {} columns to {}",
        records.len(),
        schema.len(),
        path.display()
    );
    Ok(())
}

//! Output column schema for the exported spreadsheets.
//!
//! The schema is independent of what the model returns: every row written
//! has exactly these columns, in this order. Columns the model never fills
//! stay empty, and record fields without a matching column are dropped.

use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Largest column count an xlsx worksheet can hold.
pub const MAX_COLUMNS: usize = 16_384;

/// Default column template for equipment spec sheets.
///
/// Names are kept byte-for-byte as they appear in the operator's template,
/// irregular spacing included.
pub const DEFAULT_COLUMNS: &[&str] = &[
    "mfr website",
    "mfr name",
    "model name",
    "mfr number",
    "unit cost",
    "product description",
    "amps",
    "volts",
    "watts",
    "phase",
    "hertz",
    "plug_type",
    "emergency_power Required (Y/N)",
    "dedicated_circuit Required (Y/N)",
    "tech_conect Required",
    "btu ",
    "dissipation_type",
    "water_cold Required (Y/N)",
    "water_hot  Required (Y/N)",
    "drain Required (Y/N)",
    "water_treated (Y/N)",
    "steam  Required(Y/N)",
    "vent  Required (Y/N)",
    "vacuum Required (Y/N)",
    "ship_weight",
    "weight",
    "depth",
    "height",
    "width",
    "ada compliant (Y/N)",
    "green certification? (Y/N)",
    "antimicrobial coating (Y/N)",
    "Specification Sheet (pdf)",
    "Brochure (pdf)",
    "Manual/IFU (pdf)",
    "Product URL",
    "CAD (dwg)",
    "REVIT (rfa)",
    "Seismic document",
    "Product Image (jpg)",
    "Notes",
];

/// A validated, ordered list of spreadsheet column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ColumnSchema {
    columns: Vec<String>,
}

impl ColumnSchema {
    /// Validate and wrap a column list.
    ///
    /// Rejects empty lists, blank names, duplicates, and lists wider than an
    /// xlsx sheet.
    pub fn new<I, S>(columns: I) -> Result<Self, ScrapeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        if columns.is_empty() {
            return Err(ScrapeError::InvalidSchema(
                "at least one column is required".into(),
            ));
        }
        if columns.len() > MAX_COLUMNS {
            return Err(ScrapeError::InvalidSchema(format!(
                "{} columns exceed the xlsx limit of {}",
                columns.len(),
                MAX_COLUMNS
            )));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ScrapeError::InvalidSchema(format!(
                    "column {} has a blank name",
                    i + 1
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ScrapeError::InvalidSchema(format!(
                    "duplicate column '{}'",
                    name
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Parse a column list from text.
    ///
    /// Accepts a JSON array of strings, or one column name per line. Blank
    /// lines are skipped; other whitespace is part of the name.
    pub fn parse_list(text: &str) -> Result<Self, ScrapeError> {
        let trimmed = text.trim_start_matches('\u{FEFF}').trim();
        if trimmed.starts_with('[') {
            let names: Vec<String> = serde_json::from_str(trimmed)
                .map_err(|e| ScrapeError::InvalidSchema(format!("bad JSON column list: {e}")))?;
            return Self::new(names);
        }

        Self::new(
            text.trim_start_matches('\u{FEFF}')
                .lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.trim().is_empty()),
        )
    }

    /// Read a column list file (see [`ColumnSchema::parse_list`]).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScrapeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::InvalidSchema(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::parse_list(&text)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for ColumnSchema {
    type Error = ScrapeError;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<ColumnSchema> for Vec<String> {
    fn from(schema: ColumnSchema) -> Self {
        schema.columns
    }
}

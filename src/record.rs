//! Product records extracted from a spec sheet.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One product's attribute → value mapping.
///
/// Every lookup of a field the model did not return yields `""`, so callers
/// never need to check for presence before reading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductRecord {
    fields: BTreeMap<String, String>,
}

static RE_INNER_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse whitespace runs and trim, so `"btu "` and `"btu"` compare equal.
pub(crate) fn normalise_name(name: &str) -> String {
    RE_INNER_WHITESPACE
        .replace_all(name.trim(), " ")
        .into_owned()
}

impl ProductRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object returned by the model.
    ///
    /// Strings are taken as-is, `null` becomes `""`, and any other value is
    /// stored as its compact JSON text.
    pub fn from_json_object(object: Map<String, Value>) -> Self {
        let fields = object
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect();
        Self { fields }
    }

    /// Value of `field`, or `""` when the model did not return it.
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Value destined for the spreadsheet column `column`.
    ///
    /// Matches the exact field name first, then falls back to a field whose
    /// whitespace-normalised name equals the column's.
    pub fn value_for_column(&self, column: &str) -> &str {
        if let Some(v) = self.fields.get(column) {
            return v;
        }
        let wanted = normalise_name(column);
        self.fields
            .iter()
            .find(|(k, _)| normalise_name(k) == wanted)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProductRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

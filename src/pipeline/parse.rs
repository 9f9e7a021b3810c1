//! Response parsing: find the JSON array of products in a model reply.
//!
//! Models wrap their answer in prose or markdown fences often enough that the
//! reply cannot be fed to a JSON parser directly. Instead of a greedy
//! `\[.*\]` match, which swallows everything between the first `[` and the
//! last `]`, we scan for balanced bracket spans. Brackets inside JSON string
//! literals are ignored, so `"14 in [35.6 cm]"` does not end a span early.
//!
//! Candidate spans are tried in order of their opening bracket; the first one
//! that parses as an array of objects is the answer.

use crate::error::ParseFailure;
use crate::record::ProductRecord;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

/// Byte range `[start, end)` of the balanced bracket span opening at `start`.
///
/// Returns `None` when the brackets opened at `start` are never closed.
fn balanced_span(text: &str, start: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    debug_assert_eq!(bytes.get(start), Some(&b'['));

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + offset + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Every balanced `[ ... ]` span in `text`, ordered by opening bracket.
pub fn bracket_spans(text: &str) -> Vec<&str> {
    text.match_indices('[')
        .filter_map(|(start, _)| balanced_span(text, start))
        .map(|(s, e)| &text[s..e])
        .collect()
}

/// Locate and parse the product array in `response`.
///
/// Records are returned unchanged in content; no field validation happens
/// at this stage.
pub fn extract_records(response: &str) -> Result<Vec<ProductRecord>, ParseFailure> {
    let spans = bracket_spans(response);
    if spans.is_empty() {
        return Err(ParseFailure::NoJsonArray);
    }

    let mut last_error = String::new();
    for span in spans {
        match serde_json::from_str::<Vec<Map<String, Value>>>(span) {
            Ok(objects) => {
                debug!("Parsed {} records from a {}-byte span", objects.len(), span.len());
                return Ok(objects
                    .into_iter()
                    .map(ProductRecord::from_json_object)
                    .collect());
            }
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(ParseFailure::InvalidJson(last_error))
}

/// Parse a model reply, logging failures against `source`.
///
/// An `Err` here means "no usable records": the caller skips the write step
/// for that document and carries on with the batch.
pub fn parse_response(response: &str, source: &str) -> Result<Vec<ProductRecord>, ParseFailure> {
    match extract_records(response) {
        Ok(records) => {
            info!("Successfully extracted structured data from: {}", source);
            Ok(records)
        }
        Err(e) => {
            match &e {
                ParseFailure::NoJsonArray => {
                    error!("Error: No JSON found in response for: {}", source)
                }
                ParseFailure::InvalidJson(detail) => error!(
                    "Error: Unable to parse JSON response from: {} ({})",
                    source, detail
                ),
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array_is_returned_unchanged() {
        let reply = r#"[{"mfr name": "Baker", "mfr number": "SG404"}, {"mfr name": "Baker", "mfr number": "SG504"}]"#;
        let records = extract_records(reply).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("mfr number"), "SG404");
        assert_eq!(records[1].get("mfr number"), "SG504");
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn array_inside_prose_and_fences() {
        let reply = "Here is the data you asked for:\n```json\n[{\"height\": \"14 in\"}]\n```\nLet me know [if] anything else is needed.";
        let records = extract_records(reply).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("height"), "14 in");
    }

    #[test]
    fn brackets_inside_strings_do_not_close_span() {
        let reply = r#"[{"height": "14 in [35.6 cm]", "Notes": "see \"table ]\""}]"#;
        let records = extract_records(reply).unwrap();
        assert_eq!(records[0].get("height"), "14 in [35.6 cm]");
        assert_eq!(records[0].get("Notes"), "see \"table ]\"");
    }

    #[test]
    fn leading_bracketed_prose_is_skipped() {
        let reply = "[Note] two products found: [{\"mfr name\": \"Stryker\"}] [end]";
        let records = extract_records(reply).unwrap();
        assert_eq!(records[0].get("mfr name"), "Stryker");
    }

    #[test]
    fn no_bracket_means_no_array() {
        assert_eq!(
            extract_records("I could not find any products."),
            Err(ParseFailure::NoJsonArray)
        );
        assert!(parse_response("nothing here", "a.pdf").is_err());
    }

    #[test]
    fn unbalanced_brackets_mean_no_array() {
        assert_eq!(
            extract_records(r#"[{"mfr name": "Baker"}"#),
            Err(ParseFailure::NoJsonArray)
        );
        assert!(parse_response(r#"[{"a": "b"},"#, "a.pdf").is_err());
    }

    #[test]
    fn malformed_json_is_invalid() {
        let result = extract_records("[{mfr name: Baker}]");
        assert!(matches!(result, Err(ParseFailure::InvalidJson(_))));
        assert!(parse_response("[{mfr name: Baker}]", "a.pdf").is_err());
    }

    #[test]
    fn array_of_non_objects_is_invalid() {
        assert!(matches!(
            extract_records("[1, 2, 3]"),
            Err(ParseFailure::InvalidJson(_))
        ));
    }

    #[test]
    fn empty_array_parses_to_no_records() {
        assert_eq!(parse_response("[]", "a.pdf"), Ok(vec![]));
    }

    #[test]
    fn spans_are_listed_in_opening_order() {
        let spans = bracket_spans("a [b [c] d] e [f");
        assert_eq!(spans, vec!["[b [c] d]", "[c]"]);
    }
}

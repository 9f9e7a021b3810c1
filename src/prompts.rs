//! Prompts for LLM-based product data extraction.
//!
//! Keeping the prompt text here means the extraction rules can be tuned in
//! one place, and unit tests can inspect them without calling a model.
//!
//! Callers can override the system prompt via
//! [`crate::config::ScrapeConfig::system_prompt`]; the user prompt is always
//! built by [`build_extraction_prompt`].

/// Default system prompt for the extraction request.
pub const SYSTEM_PROMPT: &str = "Act as an unstructured data scraping expert.";

/// Fields requested from the model, with a description and an optional example.
///
/// The order here is the order they are listed in the prompt.
pub const EXTRACTION_FIELDS: &[(&str, &str, Option<&str>)] = &[
    ("mfr name", "The name of the manufacturer", Some("Baker")),
    ("model name", "The model name or number of the product", None),
    (
        "mfr number",
        "The number of the product",
        Some("SG404, SG504, SG604"),
    ),
    ("unit cost", "The cost of the product (usually in USD)", None),
    (
        "product description",
        "A brief description of the product",
        Some("Class II, Type A2 Biosafety Cabinet"),
    ),
    ("amps", "The amperage rating of the product", Some("20A")),
    ("volts", "The voltage rating of the product", Some("100V")),
    ("watts", "The wattage rating of the product", None),
    ("phase", "The phase type", Some("1Ø")),
    ("hertz", "The frequency rating", Some("50/60 Hz")),
    ("plug_type", "The type of plug", None),
    ("btu", "The BTU rating of the product", Some("1,434 BTU")),
    (
        "dissipation_type",
        "The type of heat dissipation",
        Some("Air"),
    ),
    (
        "ship_weight",
        "The shipping weight of the product",
        Some("712 lbs"),
    ),
    ("weight", "The weight of the product", Some("582 lbs")),
    ("depth", "The depth of the product in inches", None),
    (
        "height",
        "The height of the product in inches",
        Some("14 in (35.6 cm)"),
    ),
    (
        "width",
        "The width of the product in inches",
        Some("42 in (106.6 cm)"),
    ),
    (
        "Notes",
        "Any additional notes or comments about the product",
        None,
    ),
];

/// Extraction rules appended after the field list.
pub const EXTRACTION_RULES: &[&str] = &[
    "Parse the text and identify all products. Each product's information may be spread across multiple lines, tables, or sections.",
    "For each product, extract the values for the fields listed above. If a field is not mentioned in the text, return \"\" for that field.",
    "Pay special attention to tabular data, as it often contains key specifications (e.g., dimensions, weights, electrical ratings).",
    "Never copy an example value from this prompt into the output; when a value is not available in the text use \"\".",
    "If a product has several values for the same field, keep the first one.",
    "If the mfr number of a product is NaN or missing, leave it as \"\".",
    "Return ONLY a JSON array in which each object is one product, using the field names above as keys and strings as values. Do not add commentary or markdown fences.",
];

/// Build the user prompt for one document.
///
/// The extracted document text is appended verbatim after the field list
/// and rules.
pub fn build_extraction_prompt(document_text: &str) -> String {
    let mut prompt = String::with_capacity(document_text.len() + 3_000);
    prompt.push_str(
        "Extract product information from the provided text and return it in a structured format. \
The text contains technical specifications, product descriptions, and tabular data for multiple \
products. Identify and extract the following fields for each product:\n\n",
    );

    for (name, description, example) in EXTRACTION_FIELDS {
        match example {
            Some(ex) => prompt.push_str(&format!("- {name}: {description} (e.g., \"{ex}\")\n")),
            None => prompt.push_str(&format!("- {name}: {description}\n")),
        }
    }

    prompt.push_str("\nInstructions:\n\n");
    for (i, rule) in EXTRACTION_RULES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, rule));
    }

    prompt.push_str("\nScrape data from:\n");
    prompt.push_str(document_text);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_field() {
        let prompt = build_extraction_prompt("");
        for (name, _, _) in EXTRACTION_FIELDS {
            assert!(prompt.contains(&format!("- {name}:")), "missing {name}");
        }
    }

    #[test]
    fn prompt_ends_with_document_text_verbatim() {
        let text = "SterilGARD SG404\n  Height: 14 in [35.6 cm]\n";
        let prompt = build_extraction_prompt(text);
        assert!(prompt.ends_with(text));
    }

    #[test]
    fn prompt_states_empty_and_first_value_rules() {
        let prompt = build_extraction_prompt("x");
        assert!(prompt.contains("return \"\" for that field"));
        assert!(prompt.contains("keep the first one"));
        assert!(prompt.contains("NaN"));
        assert!(prompt.contains("JSON array"));
    }
}

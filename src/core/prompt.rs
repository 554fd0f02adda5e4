use crate::domain::schema::{FIELDS, SENTINEL};
use std::fmt::Write;

const PREAMBLE: &str = "You are analyzing a \"Certificate of Origin\" document \
(ASEAN-INDIA FREE TRADE AREA PREFERENTIAL TARIFF). Extract the fields listed below \
from the document text. Be precise and extract only the actual values.";

/// Builds the field-extraction prompt for one document's OCR text.
pub fn build_extraction_prompt(document_text: &str) -> String {
    let mut prompt = String::with_capacity(document_text.len() + 2048);
    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\nDocument Text:\n");
    prompt.push_str(document_text);
    prompt.push_str(
        "\n\nReturn a single JSON object with exactly these keys \
(key: what to extract):\n",
    );

    for field in FIELDS {
        // String 的 write! 不會失敗
        let _ = writeln!(
            prompt,
            "- {}: {} ({})",
            field.name(),
            field.label(),
            field.location_hint()
        );
    }

    let _ = write!(
        prompt,
        "\nInstructions:\n\
- Use the string \"{sentinel}\" for any field that is not present\n\
- Extract only the values, not labels or descriptions\n\
- Put complete addresses in a single string\n\
- Include the full goods description with the HS code\n\
- Respond with the JSON object only, no commentary\n",
        sentinel = SENTINEL
    );

    prompt
}

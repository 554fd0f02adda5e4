//! Normalizes raw model output into an [`ExtractedRecord`].
//!
//! The model is asked for a JSON object but often wraps it in prose or markdown
//! fences. Parsing never fails: anything unusable degrades to an all-sentinel
//! record tagged as [`ParseOutcome::Malformed`].

use crate::domain::model::ExtractedRecord;
use crate::domain::schema::Field;
use serde_json::{Map, Value};

/// 模型常用來表示「找不到」的字樣
const PLACEHOLDERS: &[&str] = &["n/a", "na", "not found", "none", "null", "-"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(ExtractedRecord),
    Malformed { raw: String, cause: String },
}

impl ParseOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }

    pub fn record(&self) -> ExtractedRecord {
        match self {
            ParseOutcome::Parsed(record) => record.clone(),
            ParseOutcome::Malformed { .. } => ExtractedRecord::unresolved(),
        }
    }

    /// Record (all-sentinel when malformed) and the parsed-cleanly flag.
    pub fn into_parts(self) -> (ExtractedRecord, bool) {
        match self {
            ParseOutcome::Parsed(record) => (record, true),
            ParseOutcome::Malformed { .. } => (ExtractedRecord::unresolved(), false),
        }
    }
}

pub fn parse_response(raw: &str) -> ParseOutcome {
    let malformed = |cause: String| {
        tracing::debug!("Unusable model response ({} chars): {}", raw.len(), cause);
        ParseOutcome::Malformed {
            raw: raw.to_string(),
            cause,
        }
    };

    let Some(candidate) = locate_json_object(raw) else {
        return malformed("no JSON object found".to_string());
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => ParseOutcome::Parsed(record_from_object(&object)),
        Ok(_) => malformed("JSON value is not an object".to_string()),
        Err(e) => malformed(format!("invalid JSON: {}", e)),
    }
}

/// Returns the span from the first `{` to its matching `}`.
///
/// Braces inside JSON string literals are skipped, so a value such as
/// `"marks {A}"` does not end the object early.
pub fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

fn record_from_object(object: &Map<String, Value>) -> ExtractedRecord {
    ExtractedRecord::from_fn(|field: Field| object.get(field.name()).and_then(normalize_value))
}

fn normalize_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => clean_text(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(normalize_value).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Object(map) if map.is_empty() => None,
        Value::Object(_) => Some(value.to_string()),
    }
}

fn clean_text(text: &str) -> Option<String> {
    // 控制字元無法寫入試算表，直接移除
    let printable: String = text
        .chars()
        .filter(|ch| !ch.is_control() || ch.is_whitespace())
        .collect();

    // 地址常跨多行，合併成單一儲存格
    let collapsed = printable.split_whitespace().collect::<Vec<_>>().join(" ");

    // 模型有時會把標籤後的 ": " 或 "- " 一起帶出來
    let value = collapsed.trim_start_matches(|ch: char| ch == ':' || ch == '-' || ch.is_whitespace());

    if value.is_empty() || PLACEHOLDERS.contains(&value.to_lowercase().as_str()) {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{FIELDS, SENTINEL};

    #[test]
    fn test_locate_plain_object() {
        assert_eq!(locate_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_locate_object_inside_prose() {
        let text = "Here you go:\n{\"a\": {\"b\": 2}} hope it helps {not this}";
        assert_eq!(locate_json_object(text), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn test_locate_ignores_braces_in_strings() {
        let text = r#"{"marks": "box {A} \"}\"", "n": 1} trailing"#;
        assert_eq!(
            locate_json_object(text),
            Some(r#"{"marks": "box {A} \"}\"", "n": 1}"#)
        );
    }

    #[test]
    fn test_locate_unbalanced() {
        assert_eq!(locate_json_object("{\"a\": 1"), None);
        assert_eq!(locate_json_object("no braces"), None);
    }

    #[test]
    fn test_value_normalization() {
        let response = r#"{
            "exporters_business_name": "  ACME   Exports\n Pvt Ltd ",
            "exporters_address": "",
            "exporters_country": "not found",
            "value_fob": 1234.5,
            "origin_criterion": ["WO", "PE"],
            "gross_weight_quantity": null,
            "departure_date": "NONE"
        }"#;
        let (record, clean) = parse_response(response).into_parts();
        assert!(clean);
        assert_eq!(record.get(Field::ExportersBusinessName), "ACME Exports Pvt Ltd");
        assert_eq!(record.get(Field::ExportersAddress), SENTINEL);
        assert_eq!(record.get(Field::ExportersCountry), SENTINEL);
        assert_eq!(record.get(Field::ValueFob), "1234.5");
        assert_eq!(record.get(Field::OriginCriterion), "WO, PE");
        assert_eq!(record.get(Field::GrossWeightQuantity), SENTINEL);
        assert_eq!(record.get(Field::DepartureDate), SENTINEL);
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        let outcome = parse_response("[1, 2, 3]");
        assert!(!outcome.is_clean());
        assert!(outcome.record().is_unresolved());
    }

    #[test]
    fn test_invalid_json_in_braces_is_malformed() {
        let outcome = parse_response("{exporters_country: Thailand}");
        match outcome {
            ParseOutcome::Malformed { raw, cause } => {
                assert_eq!(raw, "{exporters_country: Thailand}");
                assert!(cause.starts_with("invalid JSON"), "cause was {}", cause);
            }
            other => panic!("expected malformed outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_cause_names_the_problem() {
        let cause = |raw: &str| match parse_response(raw) {
            ParseOutcome::Malformed { cause, .. } => cause,
            other => panic!("expected malformed outcome, got {:?}", other),
        };
        assert_eq!(cause("I could not read this certificate."), "no JSON object found");
        assert_eq!(cause("{\"a\": 1"), "no JSON object found");
        assert!(cause("{\"a\": 1,}").starts_with("invalid JSON"));
    }

    #[test]
    fn test_control_characters_are_removed() {
        let response = r#"{"value_fob": "USD\u0001 100", "description_goods": "\u0007\u0008"}"#;
        let (record, clean) = parse_response(response).into_parts();
        assert!(clean);
        assert_eq!(record.get(Field::ValueFob), "USD 100");
        assert_eq!(record.get(Field::DescriptionGoods), SENTINEL);
    }

    #[test]
    fn test_label_residue_is_stripped() {
        let response = r#"{
            "exporters_country": ": India",
            "consignees_name": "- Gamma Trading",
            "importing_country": " :- N/A",
            "invoice_number_date": "INV-001 - 2024-01-05"
        }"#;
        let record = parse_response(response).record();
        assert_eq!(record.get(Field::ExportersCountry), "India");
        assert_eq!(record.get(Field::ConsigneesName), "Gamma Trading");
        assert_eq!(record.get(Field::ImportingCountry), SENTINEL);
        assert_eq!(record.get(Field::InvoiceNumberDate), "INV-001 - 2024-01-05");
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let (record, clean) =
            parse_response(r#"{"exporters_country": "India", "certificate_no": "X1"}"#)
                .into_parts();
        assert!(clean);
        assert_eq!(record.get(Field::ExportersCountry), "India");
        assert_eq!(record.values().len(), FIELDS.len());
        assert!(!record.values().iter().any(|value| value == "X1"));
    }
}

use coo_extract::{parse_response, Field, FIELDS, SENTINEL};

fn full_response() -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for field in FIELDS {
        object.insert(
            field.name().to_string(),
            serde_json::Value::String(format!("value of {}", field.name())),
        );
    }
    serde_json::Value::Object(object)
}

#[test]
fn test_every_field_present_for_any_input() {
    let inputs = [
        "",
        "no json at all",
        "{}",
        "[1, 2, 3]",
        "{\"exporters_country\": \"India\"}",
        "{\"unexpected\": true, \"value_fob\": 99}",
        "{ broken json",
    ];

    for input in inputs {
        let record = parse_response(input).record();
        assert_eq!(record.iter().count(), FIELDS.len(), "input: {input:?}");
        for (field, value) in record.iter() {
            assert!(!value.is_empty(), "{field} empty for input {input:?}");
        }
    }
}

#[test]
fn test_exact_values_are_kept() {
    let raw = full_response().to_string();
    let outcome = parse_response(&raw);

    assert!(outcome.is_clean());
    let record = outcome.record();
    for field in FIELDS {
        assert_eq!(record.get(field), format!("value of {}", field.name()));
    }
    assert_eq!(record.resolved_count(), FIELDS.len());
}

#[test]
fn test_missing_fields_become_sentinel() {
    let outcome = parse_response(r#"{"departure_date": "12.03.2024", "origin_criterion": "WO"}"#);
    assert!(outcome.is_clean());

    let record = outcome.record();
    assert_eq!(record.get(Field::DepartureDate), "12.03.2024");
    assert_eq!(record.get(Field::OriginCriterion), "WO");
    for field in FIELDS {
        if field != Field::DepartureDate && field != Field::OriginCriterion {
            assert_eq!(record.get(field), SENTINEL, "{field}");
        }
    }
}

#[test]
fn test_garbage_is_all_sentinel_and_not_clean() {
    for raw in ["The document is unreadable.", "```\nnothing here\n```", "{\"a\": }"] {
        let (record, clean) = parse_response(raw).into_parts();
        assert!(!clean, "{raw:?}");
        assert!(record.is_unresolved(), "{raw:?}");
    }
}

#[test]
fn test_fenced_and_unfenced_responses_agree() {
    let raw = full_response().to_string();
    let fenced = format!("```json\n{}\n```", raw);
    let chatty = format!("Here is the extracted data:\n{}\nLet me know if you need more.", raw);

    let plain = parse_response(&raw);
    assert_eq!(parse_response(&fenced), plain);
    assert_eq!(parse_response(&chatty), plain);
}

#[test]
fn test_placeholder_values_are_sentinel() {
    let outcome = parse_response(
        r#"{"exporters_address": "Not Found", "consignees_address": "  ", "vessel_aircraft": null, "port_of_discharge": "NA"}"#,
    );
    assert!(outcome.is_clean());
    assert!(outcome.record().is_unresolved());
}

#[test]
fn test_multiline_address_is_collapsed() {
    let outcome = parse_response(
        "{\"exporters_address\": \"Plot 12, GIDC\\n  Vapi,\\tGujarat 396195\"}",
    );
    assert_eq!(
        outcome.record().get(Field::ExportersAddress),
        "Plot 12, GIDC Vapi, Gujarat 396195"
    );
}

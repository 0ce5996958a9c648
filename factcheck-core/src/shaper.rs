//! Fact shaping
//!
//! Flattens a stored [`Fact`] into the client-facing object served by the QID
//! and random endpoints. Reads are permissive: a missing key, a container of
//! the wrong JSON type, or a malformed reference entry surfaces as `null`
//! instead of failing the request.

use serde::Serialize;
use serde_json::Value;

use crate::models::Fact;

/// Reference entry tag carrying the textual evidence.
pub const REFERENCE_TYPE_STRING: &str = "string";
/// Reference entry tag carrying the Wikipedia link.
pub const REFERENCE_TYPE_URL: &str = "url";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapedFact {
    pub id: i64,
    pub property: String,
    pub question: Value,
    #[serde(rename = "wikipediaLink")]
    pub wikipedia_link: Value,
    #[serde(rename = "wikidataLink")]
    pub wikidata_link: String,
    pub text: Value,
    pub evidence: Value,
    #[serde(rename = "startIdx")]
    pub start_idx: Value,
    #[serde(rename = "endIdx")]
    pub end_idx: Value,
    pub object: Value,
}

/// The two reference slots resolved from a fact's `references` list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedReferences {
    pub evidence: Option<Value>,
    pub wikipedia_link: Option<Value>,
}

/// Fold the reference list into the evidence and link slots.
///
/// Later entries overwrite earlier ones of the same type, including entries
/// that carry no `value` (the slot resets to `None`).
pub fn resolve_references(references: &Value) -> ResolvedReferences {
    let entries = match references.as_array() {
        Some(entries) => entries.as_slice(),
        None => &[],
    };

    entries
        .iter()
        .filter_map(Value::as_object)
        .fold(ResolvedReferences::default(), |mut acc, entry| {
            let value = entry.get("value").filter(|v| !v.is_null()).cloned();
            match entry.get("type").and_then(Value::as_str) {
                Some(REFERENCE_TYPE_STRING) => acc.evidence = value,
                Some(REFERENCE_TYPE_URL) => acc.wikipedia_link = value,
                _ => {}
            }
            acc
        })
}

/// Look up `key` in `doc` if it is an object; anything else reads as `null`.
fn field(doc: &Value, key: &str) -> Value {
    doc.as_object()
        .and_then(|obj| obj.get(key))
        .cloned()
        .unwrap_or(Value::Null)
}

pub fn shape_fact(fact: &Fact) -> ShapedFact {
    let refs = resolve_references(&fact.references);

    ShapedFact {
        id: fact.id,
        property: fact.wikidata_property.clone(),
        question: field(&fact.meta_information, "question"),
        wikipedia_link: refs.wikipedia_link.unwrap_or(Value::Null),
        wikidata_link: fact.wikidata_entity.clone(),
        text: field(&fact.evidence_highlight, "text"),
        evidence: refs.evidence.unwrap_or(Value::Null),
        start_idx: field(&fact.evidence_highlight, "startIdx"),
        end_idx: field(&fact.evidence_highlight, "endIdx"),
        object: fact.data_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn fact_with(references: Value) -> Fact {
        let now = Utc::now();
        Fact {
            id: 7,
            wikidata_property: "P69".to_string(),
            wikidata_entity: "http://www.wikidata.org/entity/Q42".to_string(),
            data_value: json!("St John's College"),
            evidence_highlight: json!({"text": "He was educated at St John's", "startIdx": 4, "endIdx": 28}),
            meta_information: json!({"question": "Where was Douglas Adams educated?"}),
            references,
            feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_string_and_url_resolved_in_either_order() {
        let forward = json!([
            {"type": "string", "value": "E"},
            {"type": "url", "value": "U"}
        ]);
        let reverse = json!([
            {"type": "url", "value": "U"},
            {"type": "string", "value": "E"}
        ]);

        for refs in [forward, reverse] {
            let shaped = shape_fact(&fact_with(refs));
            assert_eq!(shaped.evidence, json!("E"));
            assert_eq!(shaped.wikipedia_link, json!("U"));
        }
    }

    #[test]
    fn test_last_entry_of_a_type_wins() {
        let shaped = shape_fact(&fact_with(json!([
            {"type": "string", "value": "A"},
            {"type": "url", "value": "U1"},
            {"type": "string", "value": "B"}
        ])));
        assert_eq!(shaped.evidence, json!("B"));
        assert_eq!(shaped.wikipedia_link, json!("U1"));
    }

    #[test]
    fn test_later_entry_without_value_resets_slot() {
        let refs = resolve_references(&json!([
            {"type": "string", "value": "A"},
            {"type": "string"}
        ]));
        assert_eq!(refs.evidence, None);
    }

    #[test]
    fn test_empty_references_give_nulls() {
        let shaped = shape_fact(&fact_with(json!([])));
        assert_eq!(shaped.evidence, Value::Null);
        assert_eq!(shaped.wikipedia_link, Value::Null);
    }

    #[test]
    fn test_unknown_types_and_malformed_entries_ignored() {
        let shaped = shape_fact(&fact_with(json!([
            "not an object",
            42,
            {"type": "wikidata", "value": "ignored"},
            {"value": "no type"},
            {"type": "url", "value": "https://en.wikipedia.org/wiki/Douglas_Adams"}
        ])));
        assert_eq!(shaped.evidence, Value::Null);
        assert_eq!(
            shaped.wikipedia_link,
            json!("https://en.wikipedia.org/wiki/Douglas_Adams")
        );
    }

    #[test]
    fn test_references_not_an_array() {
        let shaped = shape_fact(&fact_with(json!({"type": "string", "value": "E"})));
        assert_eq!(shaped.evidence, Value::Null);
        assert_eq!(shaped.wikipedia_link, Value::Null);
    }

    #[test]
    fn test_flat_fields_copied_from_record() {
        let shaped = shape_fact(&fact_with(json!([])));
        assert_eq!(shaped.id, 7);
        assert_eq!(shaped.property, "P69");
        assert_eq!(shaped.wikidata_link, "http://www.wikidata.org/entity/Q42");
        assert_eq!(shaped.question, json!("Where was Douglas Adams educated?"));
        assert_eq!(shaped.text, json!("He was educated at St John's"));
        assert_eq!(shaped.start_idx, json!(4));
        assert_eq!(shaped.end_idx, json!(28));
        assert_eq!(shaped.object, json!("St John's College"));
    }

    #[test]
    fn test_partial_documents_surface_null() {
        let mut fact = fact_with(json!([]));
        fact.evidence_highlight = json!({"text": "only text"});
        fact.meta_information = json!("not an object");

        let shaped = shape_fact(&fact);
        assert_eq!(shaped.text, json!("only text"));
        assert_eq!(shaped.start_idx, Value::Null);
        assert_eq!(shaped.end_idx, Value::Null);
        assert_eq!(shaped.question, Value::Null);
    }

    #[test]
    fn test_serialized_keys_match_client_contract() {
        let value = serde_json::to_value(shape_fact(&fact_with(json!([])))).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "id",
            "property",
            "question",
            "wikipediaLink",
            "wikidataLink",
            "text",
            "evidence",
            "startIdx",
            "endIdx",
            "object",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert_eq!(obj.len(), 10);
    }
}

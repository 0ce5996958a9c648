//! Request body validation for fact create/update.
//!
//! Field rules: the two Wikidata identifiers are required non-blank strings,
//! the three JSON documents are required and may hold any JSON, `references`
//! must be a list, `feedback` is optional. `id` is read-only and ignored.

use serde_json::{Map, Value};

use crate::error::{FactError, FieldErrors, Result};
use crate::models::{FactPatch, NewFact};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";
const NULL: &str = "This field may not be null.";
const NOT_A_LIST: &str = "Expected a list of items but got type \"{}\".";
const NOT_A_DICT: &str = "Expected a dictionary of items but got type \"{}\".";

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn push(errors: &mut FieldErrors, field: &str, msg: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(msg.into());
}

fn body_object(body: &Value) -> Result<&Map<String, Value>> {
    body.as_object().ok_or_else(|| {
        let mut errors = FieldErrors::new();
        push(
            &mut errors,
            "non_field_errors",
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(body)
            ),
        );
        FactError::Validation(errors)
    })
}

fn check_string(obj: &Map<String, Value>, key: &str, required: bool, errors: &mut FieldErrors) -> Option<String> {
    match obj.get(key) {
        None if required => {
            push(errors, key, REQUIRED);
            None
        }
        None => None,
        Some(Value::Null) => {
            push(errors, key, NULL);
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            push(errors, key, BLANK);
            None
        }
        Some(Value::String(s)) => Some(s.trim().to_string()),
        // Numbers are coerced to strings
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => {
            push(errors, key, NOT_A_STRING);
            None
        }
    }
}

fn check_json(obj: &Map<String, Value>, key: &str, required: bool, errors: &mut FieldErrors) -> Option<Value> {
    match obj.get(key) {
        None if required => {
            push(errors, key, REQUIRED);
            None
        }
        None => None,
        Some(Value::Null) => {
            push(errors, key, NULL);
            None
        }
        Some(v) => Some(v.clone()),
    }
}

fn check_references(obj: &Map<String, Value>, required: bool, errors: &mut FieldErrors) -> Option<Value> {
    let value = check_json(obj, "references", required, errors)?;
    if value.is_array() {
        Some(value)
    } else {
        push(
            errors,
            "references",
            NOT_A_LIST.replace("{}", json_type_name(&value)),
        );
        None
    }
}

/// `None` when absent, `Some(None)` for explicit null, `Some(Some(obj))` otherwise.
fn check_feedback(obj: &Map<String, Value>, errors: &mut FieldErrors) -> Option<Option<Value>> {
    match obj.get("feedback") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(v @ Value::Object(_)) => Some(Some(v.clone())),
        Some(v) => {
            push(errors, "feedback", NOT_A_DICT.replace("{}", json_type_name(v)));
            None
        }
    }
}

fn validate(body: &Value, partial: bool) -> Result<FactPatch> {
    let obj = body_object(body)?;
    let required = !partial;
    let mut errors = FieldErrors::new();

    let patch = FactPatch {
        wikidata_property: check_string(obj, "wikidata_property", required, &mut errors),
        wikidata_entity: check_string(obj, "wikidata_entity", required, &mut errors),
        data_value: check_json(obj, "data_value", required, &mut errors),
        evidence_highlight: check_json(obj, "evidence_highlight", required, &mut errors),
        meta_information: check_json(obj, "meta_information", required, &mut errors),
        references: check_references(obj, required, &mut errors),
        feedback: check_feedback(obj, &mut errors),
    };

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(FactError::Validation(errors))
    }
}

/// Validate a create body.
pub fn validate_new_fact(body: &Value) -> Result<NewFact> {
    let patch = validate(body, false)?;
    match patch {
        FactPatch {
            wikidata_property: Some(wikidata_property),
            wikidata_entity: Some(wikidata_entity),
            data_value: Some(data_value),
            evidence_highlight: Some(evidence_highlight),
            meta_information: Some(meta_information),
            references: Some(references),
            feedback,
        } => Ok(NewFact {
            wikidata_property,
            wikidata_entity,
            data_value,
            evidence_highlight,
            meta_information,
            references,
            feedback: feedback.flatten(),
        }),
        _ => Err(FactError::Other("validated body is missing required fields".to_string())),
    }
}

/// Validate a full-replace (PUT) body. Every required field must be present;
/// an omitted `feedback` is left as stored.
pub fn validate_fact_replace(body: &Value) -> Result<FactPatch> {
    validate(body, false)
}

/// Validate a partial (PATCH) body; only supplied fields are checked.
pub fn validate_fact_patch(body: &Value) -> Result<FactPatch> {
    validate(body, true)
}

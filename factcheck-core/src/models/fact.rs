use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored fact. Nested documents stay as raw JSON so partial or oddly shaped
/// records can still be read and shaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Fact {
    pub id: i64,
    pub wikidata_property: String,
    pub wikidata_entity: String,
    pub data_value: serde_json::Value,
    pub evidence_highlight: serde_json::Value,
    pub meta_information: serde_json::Value,
    pub references: serde_json::Value,
    pub feedback: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated payload for creating a fact, or replacing one wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFact {
    pub wikidata_property: String,
    pub wikidata_entity: String,
    pub data_value: serde_json::Value,
    pub evidence_highlight: serde_json::Value,
    pub meta_information: serde_json::Value,
    pub references: serde_json::Value,
    pub feedback: Option<serde_json::Value>,
}

/// Validated partial update. `feedback: Some(None)` clears the feedback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactPatch {
    pub wikidata_property: Option<String>,
    pub wikidata_entity: Option<String>,
    pub data_value: Option<serde_json::Value>,
    pub evidence_highlight: Option<serde_json::Value>,
    pub meta_information: Option<serde_json::Value>,
    pub references: Option<serde_json::Value>,
    pub feedback: Option<Option<serde_json::Value>>,
}

impl FactPatch {
    /// Apply the supplied fields onto an existing record in place.
    pub fn apply_to(self, fact: &mut Fact) {
        if let Some(v) = self.wikidata_property {
            fact.wikidata_property = v;
        }
        if let Some(v) = self.wikidata_entity {
            fact.wikidata_entity = v;
        }
        if let Some(v) = self.data_value {
            fact.data_value = v;
        }
        if let Some(v) = self.evidence_highlight {
            fact.evidence_highlight = v;
        }
        if let Some(v) = self.meta_information {
            fact.meta_information = v;
        }
        if let Some(v) = self.references {
            fact.references = v;
        }
        if let Some(v) = self.feedback {
            fact.feedback = v;
        }
    }
}

/// Reviewer verdict recorded by accept/reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub value: bool,
    pub date: DateTime<Utc>,
}

impl Feedback {
    pub fn now(value: bool) -> Self {
        Self {
            value,
            date: Utc::now(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "value": self.value,
            "date": self.date.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        })
    }
}

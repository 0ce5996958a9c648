use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::FactStore;
use crate::error::{FactError, Result};
use crate::models::{Fact, FactPatch, NewFact};

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    facts: BTreeMap<i64, Fact>,
}

/// Process-local store. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryFactStore {
    inner: RwLock<Inner>,
}

impl MemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FactStore for MemoryFactStore {
    async fn list(&self) -> Result<Vec<Fact>> {
        Ok(self.inner.read().await.facts.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Fact> {
        self.inner
            .read()
            .await
            .facts
            .get(&id)
            .cloned()
            .ok_or(FactError::NotFound)
    }

    async fn create(&self, fact: NewFact) -> Result<Fact> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let now = Utc::now();
        let created = Fact {
            id: inner.last_id,
            wikidata_property: fact.wikidata_property,
            wikidata_entity: fact.wikidata_entity,
            data_value: fact.data_value,
            evidence_highlight: fact.evidence_highlight,
            meta_information: fact.meta_information,
            references: fact.references,
            feedback: fact.feedback,
            created_at: now,
            updated_at: now,
        };
        inner.facts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, patch: FactPatch) -> Result<Fact> {
        let mut inner = self.inner.write().await;
        let fact = inner.facts.get_mut(&id).ok_or(FactError::NotFound)?;
        patch.apply_to(fact);
        fact.updated_at = Utc::now();
        Ok(fact.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.inner
            .write()
            .await
            .facts
            .remove(&id)
            .map(|_| ())
            .ok_or(FactError::NotFound)
    }

    async fn filter_entity_suffix(&self, suffix: &str) -> Result<Vec<Fact>> {
        Ok(self
            .inner
            .read()
            .await
            .facts
            .values()
            .filter(|f| f.wikidata_entity.ends_with(suffix))
            .cloned()
            .collect())
    }

    async fn list_ids(&self) -> Result<Vec<i64>> {
        Ok(self.inner.read().await.facts.keys().copied().collect())
    }

    async fn set_feedback(&self, id: i64, feedback: serde_json::Value) -> Result<Fact> {
        let mut inner = self.inner.write().await;
        let fact = inner.facts.get_mut(&id).ok_or(FactError::NotFound)?;
        fact.feedback = Some(feedback);
        fact.updated_at = Utc::now();
        Ok(fact.clone())
    }

    async fn health(&self) -> Result<String> {
        Ok("in-memory".to_string())
    }
}

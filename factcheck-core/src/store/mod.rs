//! Fact persistence
//!
//! Every HTTP operation maps onto exactly one call here. The PostgreSQL store
//! backs real deployments; the in-memory store backs tests and `--ephemeral`
//! server runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Fact, FactPatch, NewFact};

pub use memory::MemoryFactStore;
pub use postgres::PgFactStore;

#[async_trait]
pub trait FactStore: Send + Sync {
    /// All facts, ordered by id.
    async fn list(&self) -> Result<Vec<Fact>>;

    /// One fact by id, or `FactError::NotFound`.
    async fn get(&self, id: i64) -> Result<Fact>;

    async fn create(&self, fact: NewFact) -> Result<Fact>;

    /// Apply a patch, or `FactError::NotFound` when the id is unknown.
    async fn update(&self, id: i64, patch: FactPatch) -> Result<Fact>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Facts whose `wikidata_entity` ends with `suffix`, ordered by id.
    async fn filter_entity_suffix(&self, suffix: &str) -> Result<Vec<Fact>>;

    /// Every stored id, for random selection.
    async fn list_ids(&self) -> Result<Vec<i64>>;

    /// Overwrite the feedback document wholesale.
    async fn set_feedback(&self, id: i64, feedback: serde_json::Value) -> Result<Fact>;

    /// Short description of the backend, e.g. the PostgreSQL version string.
    async fn health(&self) -> Result<String>;
}

use async_trait::async_trait;
use sqlx::PgPool;

use super::FactStore;
use crate::error::{FactError, Result};
use crate::models::{Fact, FactPatch, NewFact};

const FACT_COLUMNS: &str = r#"id, wikidata_property, wikidata_entity, data_value,
    evidence_highlight, meta_information, "references", feedback, created_at, updated_at"#;

#[derive(Clone)]
pub struct PgFactStore {
    pool: PgPool,
}

impl PgFactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FactStore for PgFactStore {
    async fn list(&self) -> Result<Vec<Fact>> {
        let sql = format!("SELECT {} FROM facts ORDER BY id", FACT_COLUMNS);
        let rows = sqlx::query_as::<_, Fact>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn get(&self, id: i64) -> Result<Fact> {
        let sql = format!("SELECT {} FROM facts WHERE id = $1", FACT_COLUMNS);
        sqlx::query_as::<_, Fact>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(FactError::NotFound)
    }

    async fn create(&self, fact: NewFact) -> Result<Fact> {
        let sql = format!(
            r#"
            INSERT INTO facts (wikidata_property, wikidata_entity, data_value,
                evidence_highlight, meta_information, "references", feedback)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            FACT_COLUMNS
        );
        let created = sqlx::query_as::<_, Fact>(&sql)
            .bind(&fact.wikidata_property)
            .bind(&fact.wikidata_entity)
            .bind(&fact.data_value)
            .bind(&fact.evidence_highlight)
            .bind(&fact.meta_information)
            .bind(&fact.references)
            .bind(&fact.feedback)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(id = created.id, entity = %created.wikidata_entity, "Created fact");
        Ok(created)
    }

    async fn update(&self, id: i64, patch: FactPatch) -> Result<Fact> {
        let replace_feedback = patch.feedback.is_some();
        let feedback = patch.feedback.flatten();

        let sql = format!(
            r#"
            UPDATE facts SET
                wikidata_property  = COALESCE($2, wikidata_property),
                wikidata_entity    = COALESCE($3, wikidata_entity),
                data_value         = COALESCE($4, data_value),
                evidence_highlight = COALESCE($5, evidence_highlight),
                meta_information   = COALESCE($6, meta_information),
                "references"       = COALESCE($7, "references"),
                feedback           = CASE WHEN $8 THEN $9 ELSE feedback END,
                updated_at         = now()
            WHERE id = $1
            RETURNING {}
            "#,
            FACT_COLUMNS
        );
        let updated = sqlx::query_as::<_, Fact>(&sql)
            .bind(id)
            .bind(&patch.wikidata_property)
            .bind(&patch.wikidata_entity)
            .bind(&patch.data_value)
            .bind(&patch.evidence_highlight)
            .bind(&patch.meta_information)
            .bind(&patch.references)
            .bind(replace_feedback)
            .bind(&feedback)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(FactError::NotFound)?;

        tracing::debug!(id, "Updated fact");
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM facts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(FactError::NotFound);
        }
        tracing::info!(id, "Deleted fact");
        Ok(())
    }

    async fn filter_entity_suffix(&self, suffix: &str) -> Result<Vec<Fact>> {
        // right()/length() keeps % and _ in the suffix literal, unlike LIKE
        let sql = format!(
            "SELECT {} FROM facts WHERE right(wikidata_entity, length($1)) = $1 ORDER BY id",
            FACT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Fact>(&sql)
            .bind(suffix)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_ids(&self) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM facts ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn set_feedback(&self, id: i64, feedback: serde_json::Value) -> Result<Fact> {
        let sql = format!(
            "UPDATE facts SET feedback = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            FACT_COLUMNS
        );
        sqlx::query_as::<_, Fact>(&sql)
            .bind(id)
            .bind(&feedback)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(FactError::NotFound)
    }

    async fn health(&self) -> Result<String> {
        Ok(crate::db::health_check(&self.pool).await?)
    }
}

use crate::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}

/// Create the `facts` table if it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS facts (
            id                 BIGSERIAL PRIMARY KEY,
            wikidata_property  TEXT NOT NULL,
            wikidata_entity    TEXT NOT NULL,
            data_value         JSONB NOT NULL,
            evidence_highlight JSONB NOT NULL DEFAULT '{}'::jsonb,
            meta_information   JSONB NOT NULL DEFAULT '{}'::jsonb,
            "references"       JSONB NOT NULL DEFAULT '[]'::jsonb,
            feedback           JSONB,
            created_at         TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at         TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_facts_wikidata_entity ON facts (wikidata_entity)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the tables this service owns if they do not exist yet.
/// Idempotent; runs at startup before the listener binds.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id UUID PRIMARY KEY,
            document_type TEXT NOT NULL,
            title TEXT NOT NULL,
            form_data JSONB NOT NULL,
            module_selection JSONB NOT NULL,
            content TEXT,
            word_count INTEGER NOT NULL DEFAULT 0,
            ai_workflow_id TEXT,
            language TEXT NOT NULL DEFAULT 'en',
            has_used_free_revision BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS document_versions (
            id UUID PRIMARY KEY,
            document_id UUID NOT NULL REFERENCES documents(id),
            version INTEGER NOT NULL,
            version_type TEXT NOT NULL,
            content TEXT NOT NULL,
            word_count INTEGER NOT NULL DEFAULT 0,
            revision_settings JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            UNIQUE (document_id, version)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS discount_codes (
            id UUID PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            product TEXT NOT NULL,
            percent_off INTEGER NOT NULL,
            bonus_credits INTEGER NOT NULL DEFAULT 0,
            active BOOLEAN NOT NULL DEFAULT TRUE,
            expires_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema ensured");
    Ok(())
}

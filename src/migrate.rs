use anyhow::Result;
use sqlx::SqlitePool;

use kisan_sathi_core::store::{write_schema_version, Keyspace};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteKvStore;

/// Create the key-value table. Idempotent.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Create the schema and record the key layout version.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;

    let store = SqliteKvStore::new(pool.clone());
    write_schema_version(&store, &Keyspace::default()).await?;

    pool.close().await;
    Ok(())
}

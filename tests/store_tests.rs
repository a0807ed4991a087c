//! SqliteKvStore behaves like the in-memory store.

use kisan_sathi::config::Config;
use kisan_sathi::db;
use kisan_sathi::migrate;
use kisan_sathi::sqlite_store::SqliteKvStore;
use kisan_sathi_core::store::memory::InMemoryKvStore;
use kisan_sathi_core::store::{read_schema_version, KvStore, Keyspace, SCHEMA_VERSION};
use tempfile::TempDir;

fn test_config(tmp: &TempDir) -> Config {
    let content = format!("[db]\npath = \"{}/kv.sqlite\"\n", tmp.path().display());
    toml::from_str(&content).unwrap()
}

async fn sqlite_store(cfg: &Config) -> SqliteKvStore {
    migrate::run_migrations(cfg).await.unwrap();
    SqliteKvStore::new(db::connect(cfg).await.unwrap())
}

async fn exercise(store: &dyn KvStore) {
    assert_eq!(store.get("missing").await.unwrap(), None);

    store.set("kisan/v1/plan/2026-10-02", "b").await.unwrap();
    store.set("kisan/v1/plan/2026-10-01", "a").await.unwrap();
    store.set("kisan/v1/plan_x", "not a plan").await.unwrap();
    store.set("KISAN/v1/plan/2026-10-03", "other case").await.unwrap();
    store.set("kisan/v1/tips", "[]").await.unwrap();

    store.set("kisan/v1/plan/2026-10-02", "b2").await.unwrap();
    assert_eq!(
        store.get("kisan/v1/plan/2026-10-02").await.unwrap().as_deref(),
        Some("b2")
    );

    assert_eq!(
        store.keys_with_prefix("kisan/v1/plan/").await.unwrap(),
        vec!["kisan/v1/plan/2026-10-01", "kisan/v1/plan/2026-10-02"]
    );
    // `_` must not act as a wildcard.
    assert_eq!(
        store.keys_with_prefix("kisan/v1/plan_").await.unwrap(),
        vec!["kisan/v1/plan_x"]
    );

    store.remove("kisan/v1/plan/2026-10-01").await.unwrap();
    store.remove("kisan/v1/plan/2026-10-01").await.unwrap();
    assert_eq!(store.get("kisan/v1/plan/2026-10-01").await.unwrap(), None);
}

#[tokio::test]
async fn test_sqlite_store_semantics() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let store = sqlite_store(&cfg).await;
    exercise(&store).await;
}

#[tokio::test]
async fn test_memory_store_semantics() {
    exercise(&InMemoryKvStore::new()).await;
}

#[tokio::test]
async fn test_init_records_schema_version() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    let store = sqlite_store(&cfg).await;
    assert_eq!(
        read_schema_version(&store, &Keyspace::default()).await.unwrap(),
        Some(SCHEMA_VERSION)
    );
}

#[tokio::test]
async fn test_values_survive_reconnect() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);
    {
        let store = sqlite_store(&cfg).await;
        store.set("k", "नमस्ते").await.unwrap();
        store.pool().close().await;
    }
    let store = SqliteKvStore::new(db::connect(&cfg).await.unwrap());
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("नमस्ते"));
}

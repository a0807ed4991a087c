//! Key-value storage abstraction for client-local state.
//!
//! The [`KvStore`] trait is the only way the tip cache and plan store
//! touch persistent state. Backends are pluggable: the app crate ships a
//! SQLite implementation, and [`memory::InMemoryKvStore`] serves tests.
//!
//! All keys are built through [`Keyspace`], which embeds
//! [`SCHEMA_VERSION`] so that a future layout change can live next to
//! the old one instead of misreading it.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// Version of the persisted key layout and value encodings.
pub const SCHEMA_VERSION: u32 = 1;

/// Abstract string-to-string storage backend.
///
/// Writes are last-write-wins. Implementations must be `Send + Sync`.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](KvStore::get) | Read one value |
/// | [`set`](KvStore::set) | Insert or overwrite one value |
/// | [`remove`](KvStore::remove) | Delete one key (no-op if absent) |
/// | [`keys_with_prefix`](KvStore::keys_with_prefix) | List keys, sorted ascending |
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// All keys starting with `prefix`, in ascending byte order.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Builds the namespaced keys used by the caches.
///
/// Layout (for the default `kisan` namespace):
///
/// ```text
/// kisan/schema_version         -> "1"
/// kisan/v1/tips                -> JSON array of Tip
/// kisan/v1/plan/2026-10-18     -> plain plan text
/// ```
#[derive(Debug, Clone)]
pub struct Keyspace {
    namespace: String,
}

impl Keyspace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn schema_version(&self) -> String {
        format!("{}/schema_version", self.namespace)
    }

    pub fn tips(&self) -> String {
        format!("{}/v{}/tips", self.namespace, SCHEMA_VERSION)
    }

    pub fn plan_prefix(&self) -> String {
        format!("{}/v{}/plan/", self.namespace, SCHEMA_VERSION)
    }

    pub fn plan(&self, date_key: &str) -> String {
        format!("{}{}", self.plan_prefix(), date_key)
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new("kisan")
    }
}

/// Record [`SCHEMA_VERSION`] under the keyspace's version key.
pub async fn write_schema_version(store: &dyn KvStore, keys: &Keyspace) -> Result<()> {
    store
        .set(&keys.schema_version(), &SCHEMA_VERSION.to_string())
        .await
}

/// Read the recorded schema version, if any.
pub async fn read_schema_version(store: &dyn KvStore, keys: &Keyspace) -> Result<Option<u32>> {
    Ok(store
        .get(&keys.schema_version())
        .await?
        .and_then(|v| v.trim().parse().ok()))
}

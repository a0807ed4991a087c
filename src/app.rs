//! Wiring from [`Config`] to the core caches and orchestrator.

use std::sync::Arc;

use anyhow::Result;

use kisan_sathi_core::clock::{Clock, SystemClock};
use kisan_sathi_core::orchestrator::PlanOrchestrator;
use kisan_sathi_core::plan::PlanStore;
use kisan_sathi_core::speech::{SpeechController, SpeechEngine};
use kisan_sathi_core::store::{KvStore, Keyspace};
use kisan_sathi_core::tips::TipCache;

use crate::client::HttpGenerator;
use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::speech::CommandSpeech;
use crate::sqlite_store::SqliteKvStore;

/// Open handles to client-local state plus the generation client.
pub struct App {
    pub config: Config,
    pub store: Arc<dyn KvStore>,
    pub clock: Arc<dyn Clock>,
    pub tips: Arc<TipCache>,
    pub plans: Arc<PlanStore>,
    pub generator: Arc<HttpGenerator>,
}

impl App {
    /// Open the SQLite store (creating the schema if needed) and wire up.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::create_schema(&pool).await?;
        let store: Arc<dyn KvStore> = Arc::new(SqliteKvStore::new(pool));
        Self::with_parts(config, store, Arc::new(SystemClock))
    }

    /// Wire up over an arbitrary store and clock.
    pub fn with_parts(config: &Config, store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let keys = Keyspace::default();
        let tips = Arc::new(TipCache::with_capacity(
            store.clone(),
            &keys,
            config.cache.max_tips,
        ));
        let plans = Arc::new(
            PlanStore::new(store.clone(), clock.clone(), keys)
                .with_retention_days(config.cache.plan_retention_days),
        );
        let generator = Arc::new(HttpGenerator::from_config(&config.client)?);
        Ok(Self {
            config: config.clone(),
            store,
            clock,
            tips,
            plans,
            generator,
        })
    }

    pub fn speech(&self) -> SpeechController {
        let engine = CommandSpeech::from_config(&self.config.speech)
            .map(|e| Arc::new(e) as Arc<dyn SpeechEngine>);
        SpeechController::new(engine, self.config.speech.preference())
    }

    pub fn orchestrator(&self) -> PlanOrchestrator {
        PlanOrchestrator::new(
            self.tips.clone(),
            self.plans.clone(),
            self.generator.clone(),
            self.speech(),
        )
        .with_recent_tip_context(self.config.cache.recent_tip_context)
    }
}

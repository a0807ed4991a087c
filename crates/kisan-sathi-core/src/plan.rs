//! Daily plan store: at most one generated plan per local calendar day.
//!
//! Each plan is stored as plain text under a date-suffixed key
//! (`.../plan/YYYY-MM-DD`). Saving prunes days older than the retention
//! window; a window of `0` keeps every day.

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::store::{KvStore, Keyspace};

/// Default number of calendar days (today included) whose plans are kept.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Zero-padded `YYYY-MM-DD` key for a local date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// True from 20:00 through 00:59 local time.
pub fn is_night_hour(hour: u32) -> bool {
    hour >= 20 || hour == 0
}

pub fn is_night_time(now: NaiveDateTime) -> bool {
    is_night_hour(now.hour())
}

pub struct PlanStore {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    keys: Keyspace,
    retention_days: u32,
}

impl PlanStore {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, keys: Keyspace) -> Self {
        Self {
            store,
            clock,
            keys,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    pub fn today_key(&self) -> String {
        date_key(self.clock.now().date())
    }

    pub fn is_night_time(&self) -> bool {
        is_night_time(self.clock.now())
    }

    /// Today's plan, if one has been saved.
    ///
    /// Storage errors are logged and read as "no plan".
    pub async fn get_today(&self) -> Option<String> {
        let key = self.keys.plan(&self.today_key());
        match self.store.get(&key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "plan store unavailable, treating as absent");
                None
            }
        }
    }

    /// Store `text` as today's plan, replacing any earlier one, then prune.
    pub async fn save_today(&self, text: &str) -> Result<()> {
        let today = self.clock.now().date();
        self.store.set(&self.keys.plan(&date_key(today)), text).await?;
        if let Err(e) = self.prune(today).await {
            warn!(error = %e, "failed to prune old plans");
        }
        Ok(())
    }

    /// Dates that currently have a stored plan, oldest first.
    pub async fn stored_dates(&self) -> Result<Vec<String>> {
        let prefix = self.keys.plan_prefix();
        Ok(self
            .store
            .keys_with_prefix(&prefix)
            .await?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    async fn prune(&self, today: NaiveDate) -> Result<usize> {
        if self.retention_days == 0 {
            return Ok(0);
        }
        let mut removed = 0;
        for date in self.stored_dates().await? {
            let Ok(parsed) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") else {
                debug!(date = %date, "skipping plan key with unrecognized date");
                continue;
            };
            if (today - parsed).num_days() >= i64::from(self.retention_days) {
                self.store.remove(&self.keys.plan(&date)).await?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "pruned old plans");
        }
        Ok(removed)
    }
}

//! Rescue radar service
//!
//! Keeps the registry of perishable surplus lots. Lot descriptions are
//! immutable; the only mutable field is each lot's status cell, and claims go
//! through its compare-and-set. Status changes are published on a broadcast
//! channel for any interested consumer.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use shared::{
    evaluate_rescue_with_status, percent_life_used, CropConfig, DigitalAssay, RescueItem,
    RescueLot, RescueParams, RescueStatusCell,
};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_RETENTION_HOURS: i64 = 24;

/// Status change on the rescue radar
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RescueEvent {
    Listed {
        id: String,
        crop_name: String,
        quantity_kg: i64,
    },
    Claimed {
        id: String,
        buyer_id: String,
    },
    Expired {
        id: String,
    },
}

struct RescueEntry {
    lot: RescueLot,
    harvested_at: DateTime<Utc>,
    status: RescueStatusCell,
}

impl RescueEntry {
    fn hours_since_harvest(&self, now: DateTime<Utc>) -> f64 {
        let elapsed_ms = (now - self.harvested_at).num_milliseconds().max(0);
        elapsed_ms as f64 / 3_600_000.0
    }

    /// Settled lots leave the registry once `retention` has passed since shelf life ended
    fn is_evictable(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        let spoiled_at = self.harvested_at + Duration::hours(i64::from(self.lot.shelf_life_hours));
        self.status.load().is_terminal() && now >= spoiled_at + retention
    }
}

/// Registry of rescue lots
pub struct RescueService {
    params: RescueParams,
    retention: Duration,
    entries: RwLock<HashMap<String, Arc<RescueEntry>>>,
    events: broadcast::Sender<RescueEvent>,
}

impl RescueService {
    /// Create a new RescueService instance
    pub fn new(params: RescueParams) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            params,
            retention: Duration::hours(DEFAULT_RETENTION_HOURS),
            entries: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// How long claimed and expired lots stay listed after their shelf life ends
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Receive status changes from now on
    pub fn subscribe(&self) -> broadcast::Receiver<RescueEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: RescueEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Put a lot on the radar
    pub async fn register(&self, lot: RescueLot, harvested_at: DateTime<Utc>) -> AppResult<RescueItem> {
        let entry = Arc::new(RescueEntry {
            lot,
            harvested_at,
            status: RescueStatusCell::new(),
        });
        let item = self.evaluate_entry(&entry, Utc::now())?;

        {
            let mut entries = self.entries.write().await;
            if entries.contains_key(&entry.lot.id) {
                return Err(AppError::ValidationError(format!(
                    "rescue lot {} is already registered",
                    entry.lot.id
                )));
            }
            entries.insert(entry.lot.id.clone(), Arc::clone(&entry));
        }

        tracing::info!(
            id = %entry.lot.id,
            crop = %entry.lot.crop_key,
            quantity_kg = entry.lot.quantity_kg,
            "Rescue lot listed"
        );
        self.publish(RescueEvent::Listed {
            id: entry.lot.id.clone(),
            crop_name: entry.lot.crop_name.clone(),
            quantity_kg: entry.lot.quantity_kg,
        });

        Ok(item)
    }

    /// Register the industrial tier of a rescue-eligible assay; harvest time is the scan time
    pub async fn register_from_assay(
        &self,
        assay: &DigitalAssay,
        crop: &CropConfig,
    ) -> AppResult<Option<RescueItem>> {
        let Some(lot) = RescueLot::from_assay(Uuid::new_v4().to_string(), assay, crop) else {
            return Ok(None);
        };
        self.register(lot, assay.scanned_at).await.map(Some)
    }

    fn evaluate_entry(&self, entry: &RescueEntry, now: DateTime<Utc>) -> AppResult<RescueItem> {
        let hours = entry.hours_since_harvest(now);
        let percent = percent_life_used(hours, entry.lot.shelf_life_hours);
        if entry.status.expire_if_due(percent, &self.params) {
            tracing::info!(id = %entry.lot.id, "Rescue lot expired unclaimed");
            self.publish(RescueEvent::Expired {
                id: entry.lot.id.clone(),
            });
        }
        Ok(evaluate_rescue_with_status(
            &entry.lot,
            hours,
            entry.status.load(),
            &self.params,
        )?)
    }

    async fn entry(&self, id: &str) -> AppResult<Arc<RescueEntry>> {
        self.entries
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Rescue lot '{}'", id)))
    }

    /// Evaluate one lot at `now`
    pub async fn get(&self, id: &str, now: DateTime<Utc>) -> AppResult<RescueItem> {
        let entry = self.entry(id).await?;
        self.evaluate_entry(&entry, now)
    }

    /// Evaluate every lot at `now`, most urgent first
    pub async fn radar(&self, now: DateTime<Utc>) -> AppResult<Vec<RescueItem>> {
        let entries: Vec<Arc<RescueEntry>> = self.entries.read().await.values().cloned().collect();
        let mut items = entries
            .iter()
            .map(|entry| self.evaluate_entry(entry, now))
            .collect::<AppResult<Vec<_>>>()?;
        items.sort_by(|a, b| {
            b.percent_life_used
                .cmp(&a.percent_life_used)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(items)
    }

    /// Claim a lot for a buyer; exactly one concurrent caller succeeds
    pub async fn claim(&self, id: &str, buyer_id: &str, now: DateTime<Utc>) -> AppResult<RescueItem> {
        let entry = self.entry(id).await?;
        let hours = entry.hours_since_harvest(now);
        let percent = percent_life_used(hours, entry.lot.shelf_life_hours);

        if entry.status.expire_if_due(percent, &self.params) {
            tracing::info!(id = %id, "Rescue lot expired unclaimed");
            self.publish(RescueEvent::Expired { id: id.to_string() });
        }

        if let Err(e) = entry.status.try_claim(percent, &self.params) {
            tracing::warn!(id = %id, buyer = %buyer_id, "Rescue claim rejected: {}", e);
            return Err(e.into());
        }

        tracing::info!(id = %id, buyer = %buyer_id, percent_life_used = percent, "Rescue lot claimed");
        self.publish(RescueEvent::Claimed {
            id: id.to_string(),
            buyer_id: buyer_id.to_string(),
        });

        Ok(evaluate_rescue_with_status(
            &entry.lot,
            hours,
            entry.status.load(),
            &self.params,
        )?)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop claimed and expired lots past their retention window.
    ///
    /// Lots are re-evaluated first so one that ran out of shelf life unclaimed
    /// is marked expired before the check. Returns the number removed.
    pub async fn prune(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let entries: Vec<Arc<RescueEntry>> = self.entries.read().await.values().cloned().collect();
        for entry in &entries {
            self.evaluate_entry(entry, now)?;
        }

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_evictable(now, self.retention));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::info!(removed, remaining = entries.len(), "Rescue radar pruned");
        }
        Ok(removed)
    }

    /// Prune the registry on a fixed interval until the runtime shuts down
    pub fn spawn_prune_job(
        self: Arc<Self>,
        interval: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.prune(Utc::now()).await {
                    tracing::error!("Rescue radar sweep failed: {}", e);
                }
            }
        })
    }
}

/// Log every radar event until the channel closes
pub async fn log_rescue_events(mut events: broadcast::Receiver<RescueEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => tracing::debug!(?event, "Rescue radar event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Rescue event consumer lagged")
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Poll coordination and the equip service
//!
//! [`GearCoordinator`] is the only place that remembers the latest
//! [`GearSnapshot`]. Readers get an `Arc` to an immutable snapshot, so every
//! derivation made from one read is consistent. Equip requests are serialized
//! per bike and always plan against a freshly fetched list.

use crate::gear::{EquipError, EquipEvent, EquipReconciler};
use crate::logging::AppLogger;
use crate::models::GearSnapshot;
use crate::providers::{GearProvider, ProviderError};
use crate::constants::limits;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

pub struct GearCoordinator {
    provider: Arc<dyn GearProvider>,
    athlete_id: String,
    snapshot: RwLock<Option<Arc<GearSnapshot>>>,
    bike_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    events: broadcast::Sender<EquipEvent>,
}

impl GearCoordinator {
    pub fn new(provider: Arc<dyn GearProvider>, athlete_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(limits::EVENT_CHANNEL_CAPACITY);
        Self {
            provider,
            athlete_id: athlete_id.into(),
            snapshot: RwLock::new(None),
            bike_locks: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Latest snapshot, if any poll has succeeded yet
    pub async fn snapshot(&self) -> Option<Arc<GearSnapshot>> {
        self.snapshot.read().await.clone()
    }

    /// Receive an [`EquipEvent`] for every successful equip
    pub fn subscribe(&self) -> broadcast::Receiver<EquipEvent> {
        self.events.subscribe()
    }

    /// Fetch the gear list and replace the stored snapshot
    pub async fn refresh(&self) -> Result<Arc<GearSnapshot>, ProviderError> {
        let start = Instant::now();
        let result = self.provider.fetch_gear().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(records) => {
                AppLogger::log_poll(&self.athlete_id, records.len(), true, duration_ms);
                Ok(self.store(GearSnapshot::new(records)).await)
            }
            Err(e) => {
                AppLogger::log_poll(&self.athlete_id, 0, false, duration_ms);
                Err(e)
            }
        }
    }

    /// Initial refresh; failure means the tracker cannot start
    pub async fn first_refresh(&self) -> Result<Arc<GearSnapshot>> {
        self.refresh()
            .await
            .with_context(|| format!("Gear data not ready: could not fetch from {}", self.provider.provider_name()))
    }

    async fn store(&self, snapshot: GearSnapshot) -> Arc<GearSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.snapshot.write().await = Some(Arc::clone(&snapshot));
        snapshot
    }

    async fn bike_lock(&self, bike_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.bike_locks.lock().await;
        Arc::clone(locks.entry(bike_id.to_string()).or_default())
    }

    // Drop the entry once the map holds the only reference.
    async fn release_bike_lock(&self, bike_id: &str) {
        let mut locks = self.bike_locks.lock().await;
        if locks.get(bike_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(bike_id);
        }
    }

    /// Equip a component on a bike
    ///
    /// Calls for the same bike run one at a time. The gear list is re-fetched
    /// before planning, then refreshed again after a successful write.
    pub async fn equip(&self, bike_id: &str, component_id: &str, exclusive: bool) -> Result<EquipEvent, EquipError> {
        let lock = self.bike_lock(bike_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.equip_locked(bike_id, component_id, exclusive).await
        };
        drop(lock);
        self.release_bike_lock(bike_id).await;

        result
    }

    async fn equip_locked(&self, bike_id: &str, component_id: &str, exclusive: bool) -> Result<EquipEvent, EquipError> {
        let records = self.provider.fetch_gear().await.map_err(EquipError::FetchFailed)?;
        let current = self.store(GearSnapshot::new(records)).await;

        let event = EquipReconciler::new(self.provider.as_ref())
            .equip(bike_id, component_id, exclusive, &current)
            .await?;

        // No subscribers is fine
        let _ = self.events.send(event.clone());

        if let Err(e) = self.refresh().await {
            warn!(bike.id = %bike_id, error = %e, "Refresh after equip failed; keeping previous snapshot");
        }

        Ok(event)
    }

    /// Poll on a fixed interval until `shutdown` flips to true
    ///
    /// Failed polls keep the previous snapshot. Intervals shorter than
    /// [`limits::MIN_POLL_INTERVAL_SECS`] are raised to it.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let minimum = Duration::from_secs(limits::MIN_POLL_INTERVAL_SECS);
        if interval < minimum {
            warn!(
                configured_secs = interval.as_secs_f64(),
                minimum_secs = limits::MIN_POLL_INTERVAL_SECS,
                "Poll interval too short, using minimum"
            );
        }
        let interval = interval.max(minimum);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(athlete.id = %self.athlete_id, interval_secs = interval.as_secs(), "Gear polling started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        error!(athlete.id = %self.athlete_id, error = %e, "Error fetching gear data");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(athlete.id = %self.athlete_id, "Gear polling stopped");
    }
}

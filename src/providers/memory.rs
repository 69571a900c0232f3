// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! In-memory gear provider, used for offline runs against an exported gear
//! list and as a test double.

use async_trait::async_trait;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use crate::models::GearRecord;
use super::{GearProvider, ProviderError};

pub struct InMemoryProvider {
    records: Mutex<Vec<GearRecord>>,
    writes: AtomicUsize,
    fetches: AtomicUsize,
    rejection: Mutex<Option<(u16, String)>>,
    fetch_rejection: Mutex<Option<(u16, String)>>,
}

impl InMemoryProvider {
    pub fn new(records: Vec<GearRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            writes: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            rejection: Mutex::new(None),
            fetch_rejection: Mutex::new(None),
        }
    }

    /// Load a gear list exported from `GET /athlete/{id}/gear`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read gear file {}", path.display()))?;
        let records: Vec<GearRecord> = serde_json::from_str(&content)
            .context("Failed to parse gear file")?;
        Ok(Self::new(records))
    }

    /// Make every following write fail with the given status and body
    pub fn reject_writes(&self, status: u16, body: &str) {
        *lock(&self.rejection) = Some((status, body.to_string()));
    }

    /// Make every following fetch fail with the given status and body
    pub fn reject_fetches(&self, status: u16, body: &str) {
        *lock(&self.fetch_rejection) = Some((status, body.to_string()));
    }

    /// Let fetches succeed again
    pub fn accept_fetches(&self) {
        *lock(&self.fetch_rejection) = None;
    }

    /// Number of fetch calls received, rejected ones included
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of replacement calls received, rejected ones included
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current state of the stored gear list
    pub fn records(&self) -> Vec<GearRecord> {
        lock(&self.records).clone()
    }
}

// A poisoned lock only means a test panicked mid-write; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl GearProvider for InMemoryProvider {
    async fn fetch_gear(&self) -> Result<Vec<GearRecord>, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some((status, body)) = lock(&self.fetch_rejection).clone() {
            return Err(ProviderError::Rejected { status, body });
        }
        Ok(self.records())
    }

    async fn replace_components(&self, bike_id: &str, component_ids: &[String]) -> Result<(), ProviderError> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if let Some((status, body)) = lock(&self.rejection).clone() {
            return Err(ProviderError::Rejected { status, body });
        }

        let mut records = lock(&self.records);
        match records.iter_mut().find(|g| g.id == bike_id && !g.is_component) {
            Some(bike) => {
                bike.component_ids = component_ids.to_vec();
                Ok(())
            }
            None => Err(ProviderError::Rejected {
                status: 404,
                body: format!("Gear {} not found", bike_id),
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

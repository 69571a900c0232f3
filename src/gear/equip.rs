// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Equip Reconciler
//!
//! Computes a bike's new equipped-component list and writes it back as a
//! whole-list replacement. The remote service has no add/remove primitive,
//! so every equip sends the complete list.
//!
//! ## Algorithm
//!
//! 1. Resolve the bike (non-component) and the component; fail before any
//!    write if either is missing.
//! 2. Start from the bike's `component_ids`, order preserved.
//! 3. When exclusive, drop every id whose record has the target's type. Ids
//!    that no longer resolve are dropped by the same filter.
//! 4. Append the component unless it is already present.
//!
//! Calling equip again with the resulting list yields the same list.

use super::index_by_id;
use crate::logging::AppLogger;
use crate::models::GearSnapshot;
use crate::providers::{GearProvider, ProviderError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::info;

/// Which side of an equip request could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingGear {
    Bike,
    Component,
}

impl fmt::Display for MissingGear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bike => f.write_str("Bike"),
            Self::Component => f.write_str("Component"),
        }
    }
}

/// Errors that can occur while equipping a component
#[derive(Debug, thiserror::Error)]
pub enum EquipError {
    /// The bike or component id is not in the snapshot; nothing was written
    #[error("{kind} not found in gear list: {id}")]
    NotFound { kind: MissingGear, id: String },

    /// The remote service refused the whole-list replacement
    #[error("Gear update rejected: {0}")]
    RemoteRejected(#[from] ProviderError),

    /// The gear list could not be re-fetched before planning
    #[error("Failed to fetch current gear list: {0}")]
    FetchFailed(ProviderError),
}

impl EquipError {
    fn not_found(kind: MissingGear, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Outcome of planning an equip against one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct EquipPlan {
    pub bike_id: String,
    pub component_id: String,
    /// Full replacement list for the bike
    pub component_ids: Vec<String>,
    /// False when the list is identical to the bike's current one
    pub changed: bool,
}

/// Compute the new component list for `bike_id` without touching the remote
pub fn plan_equip(
    bike_id: &str,
    component_id: &str,
    exclusive: bool,
    snapshot: &GearSnapshot,
) -> Result<EquipPlan, EquipError> {
    let index = index_by_id(&snapshot.records);

    let bike = index
        .get(bike_id)
        .copied()
        .filter(|g| !g.is_component)
        .ok_or_else(|| EquipError::not_found(MissingGear::Bike, bike_id))?;
    let component = index
        .get(component_id)
        .copied()
        .filter(|g| g.is_component)
        .ok_or_else(|| EquipError::not_found(MissingGear::Component, component_id))?;

    let mut component_ids = bike.component_ids.clone();

    if exclusive {
        component_ids.retain(|id| {
            index
                .get(id.as_str())
                .is_some_and(|g| g.gear_type != component.gear_type)
        });
    }

    if !component_ids.iter().any(|id| id == component_id) {
        component_ids.push(component_id.to_string());
    }

    let changed = component_ids != bike.component_ids;

    Ok(EquipPlan {
        bike_id: bike.id.clone(),
        component_id: component.id.clone(),
        component_ids,
        changed,
    })
}

/// Notification emitted after a successful equip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipEvent {
    pub bike_id: String,
    pub component_ids: Vec<String>,
    pub status: String,
}

impl EquipEvent {
    pub fn updated(plan: &EquipPlan) -> Self {
        Self {
            bike_id: plan.bike_id.clone(),
            component_ids: plan.component_ids.clone(),
            status: "updated".to_string(),
        }
    }
}

/// Applies equip plans through a [`GearProvider`]
pub struct EquipReconciler<'a> {
    provider: &'a dyn GearProvider,
}

impl<'a> EquipReconciler<'a> {
    pub fn new(provider: &'a dyn GearProvider) -> Self {
        Self { provider }
    }

    /// Equip `component_id` on `bike_id` using the given snapshot
    ///
    /// Issues exactly one whole-list replacement when both ids resolve and
    /// none otherwise. The snapshot is not updated; callers refresh after.
    pub async fn equip(
        &self,
        bike_id: &str,
        component_id: &str,
        exclusive: bool,
        snapshot: &GearSnapshot,
    ) -> Result<EquipEvent, EquipError> {
        let start = Instant::now();

        let plan = match plan_equip(bike_id, component_id, exclusive, snapshot) {
            Ok(plan) => plan,
            Err(e) => {
                AppLogger::log_equip(bike_id, component_id, exclusive, false, 0);
                return Err(e);
            }
        };

        info!(
            bike.id = %plan.bike_id,
            component.id = %plan.component_id,
            exclusive = exclusive,
            changed = plan.changed,
            component_count = plan.component_ids.len(),
            "Replacing bike component list"
        );

        let result = self
            .provider
            .replace_components(&plan.bike_id, &plan.component_ids)
            .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        AppLogger::log_equip(bike_id, component_id, exclusive, result.is_ok(), duration_ms);
        result?;

        Ok(EquipEvent::updated(&plan))
    }
}

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Slot assignment for same-type components equipped on one parent.
//!
//! A slot is identified by `(parent_id, component_type, slot_index)`, never by
//! the component occupying it, so "the chain in slot 1" keeps its identity
//! when the physical chain is swapped. Slots are recomputed on every poll.

use super::{group_by_type, resolve_equipped, GearIndex};
use crate::constants::ids;
use crate::models::{GearRecord, GearType};
use serde::Serialize;

/// Stable identity of one slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotKey {
    pub parent_id: String,
    pub component_type: GearType,
    /// 1-based rank by ascending component id
    pub slot_index: usize,
}

impl SlotKey {
    pub fn new(parent_id: impl Into<String>, component_type: GearType, slot_index: usize) -> Self {
        Self {
            parent_id: parent_id.into(),
            component_type,
            slot_index,
        }
    }

    /// `""` for the first slot, `"_{n}"` for the following ones
    pub fn suffix(&self) -> String {
        if self.slot_index <= 1 {
            String::new()
        } else {
            format!("_{}", self.slot_index)
        }
    }

    /// Display label such as `Chain` or `Chain_2`
    pub fn label(&self) -> String {
        format!("{}{}", self.component_type, self.suffix())
    }

    /// Outward-facing identifier, e.g. `intervals_icu_gear_b1_equipped_Chain_2`
    pub fn unique_id(&self) -> String {
        format!(
            "{}_{}_equipped_{}",
            ids::GEAR_PREFIX,
            self.parent_id,
            self.label()
        )
    }
}

/// A slot and the component currently occupying it
#[derive(Debug, Clone)]
pub struct Slot<'a> {
    pub key: SlotKey,
    pub component: &'a GearRecord,
}

/// Assign slots for every component type equipped on `parent`
///
/// Output is ordered by component type, then by slot index.
pub fn assign_slots<'a>(parent: &GearRecord, index: &GearIndex<'a>) -> Vec<Slot<'a>> {
    let equipped = resolve_equipped(parent, index);

    group_by_type(&equipped)
        .into_iter()
        .flat_map(|(component_type, group)| {
            let parent_id = parent.id.clone();
            group.into_iter().enumerate().map(move |(i, component)| Slot {
                key: SlotKey::new(parent_id.clone(), component_type.clone(), i + 1),
                component,
            })
        })
        .collect()
}

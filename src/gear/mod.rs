// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Gear Repository View
//!
//! Pure derivations over one [`GearSnapshot`]: lookup by id, resolution of a
//! parent's equipped components, grouping by type in canonical slot order,
//! and reverse lookup of the parent a component is equipped on.
//!
//! Nothing in this module fails. References that cannot be resolved (stale
//! ids, ids pointing at non-component records) are dropped from the output.

pub mod equip;
pub mod slots;

use crate::logging::AppLogger;
use crate::models::{meters_to_km, GearRecord, GearSnapshot, GearType};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub use equip::{plan_equip, EquipError, EquipEvent, EquipPlan, EquipReconciler, MissingGear};
pub use slots::{assign_slots, Slot, SlotKey};

/// Lookup of gear records by id, borrowed from a snapshot
pub type GearIndex<'a> = HashMap<&'a str, &'a GearRecord>;

/// Build an id lookup; the last record wins when ids repeat
pub fn index_by_id(records: &[GearRecord]) -> GearIndex<'_> {
    records.iter().map(|r| (r.id.as_str(), r)).collect()
}

/// Resolve a parent's `component_ids` into component records, in list order
pub fn resolve_equipped<'a>(parent: &GearRecord, index: &GearIndex<'a>) -> Vec<&'a GearRecord> {
    parent
        .component_ids
        .iter()
        .filter_map(|id| match index.get(id.as_str()) {
            Some(record) if record.is_component => Some(*record),
            Some(_) => {
                AppLogger::log_stale_reference(&parent.id, id, "not a component");
                None
            }
            None => {
                AppLogger::log_stale_reference(&parent.id, id, "not in gear list");
                None
            }
        })
        .collect()
}

/// Partition components by type, each group sorted by id ascending
///
/// The per-group order is the canonical slot order and depends only on the
/// set of ids, not on the order they were passed in.
pub fn group_by_type<'a>(components: &[&'a GearRecord]) -> BTreeMap<GearType, Vec<&'a GearRecord>> {
    let mut groups: BTreeMap<GearType, Vec<&'a GearRecord>> = BTreeMap::new();
    for component in components {
        groups.entry(component.component_type()).or_default().push(*component);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.id.cmp(&b.id));
    }
    groups
}

/// Find the first parent whose `component_ids` lists the component
pub fn find_parent_of<'a>(component_id: &str, records: &'a [GearRecord]) -> Option<&'a GearRecord> {
    records
        .iter()
        .filter(|r| !r.is_component)
        .find(|r| r.has_component(component_id))
}

/// A parent together with its resolved slots
#[derive(Debug, Clone)]
pub struct ParentView<'a> {
    pub gear: &'a GearRecord,
    pub slots: Vec<Slot<'a>>,
}

/// A component together with the parent it is equipped on, if any
#[derive(Debug, Clone)]
pub struct ComponentView<'a> {
    pub gear: &'a GearRecord,
    pub equipped_on: Option<&'a GearRecord>,
}

/// Presentation hierarchy derived from one snapshot
///
/// Parents and components keep the snapshot's record order.
#[derive(Debug, Clone)]
pub struct GearView<'a> {
    pub parents: Vec<ParentView<'a>>,
    pub components: Vec<ComponentView<'a>>,
}

impl<'a> GearView<'a> {
    pub fn build(snapshot: &'a GearSnapshot) -> Self {
        let index = index_by_id(&snapshot.records);

        let mut parents = Vec::new();
        let mut components = Vec::new();
        for gear in &snapshot.records {
            if gear.is_component {
                components.push(ComponentView {
                    gear,
                    equipped_on: find_parent_of(&gear.id, &snapshot.records),
                });
            } else {
                parents.push(ParentView {
                    gear,
                    slots: assign_slots(gear, &index),
                });
            }
        }

        Self { parents, components }
    }

    pub fn parent(&self, parent_id: &str) -> Option<&ParentView<'a>> {
        self.parents.iter().find(|p| p.gear.id == parent_id)
    }

    pub fn component(&self, component_id: &str) -> Option<&ComponentView<'a>> {
        self.components.iter().find(|c| c.gear.id == component_id)
    }

    /// Every slot across all parents
    pub fn slots(&self) -> impl Iterator<Item = &Slot<'a>> {
        self.parents.iter().flat_map(|p| p.slots.iter())
    }
}

/// Short description of one equipped component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquippedComponent {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub gear_type: Option<String>,
    pub distance_km: Option<f64>,
}

/// Equipment overview for one parent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentSummary {
    /// Equipped components in snapshot order
    pub equipped: Vec<EquippedComponent>,
    /// Component type to component name; later entries overwrite earlier ones
    pub equipped_by_type: BTreeMap<String, Option<String>>,
}

impl ParentSummary {
    /// Summarize the records listed in the parent's `component_ids`
    ///
    /// Unlike [`resolve_equipped`] this walks the snapshot rather than the id
    /// list, so order follows the fetched list and the component flag is not
    /// checked. Distances of zero are reported as unknown.
    pub fn build(parent: &GearRecord, snapshot: &GearSnapshot) -> Self {
        let equipped: Vec<EquippedComponent> = snapshot
            .records
            .iter()
            .filter(|g| parent.has_component(&g.id))
            .map(|g| EquippedComponent {
                id: g.id.clone(),
                name: g.name.clone(),
                gear_type: g.gear_type.as_ref().map(|t| t.as_str().to_string()),
                distance_km: g.distance_meters.filter(|d| *d != 0.0).map(meters_to_km),
            })
            .collect();

        let mut equipped_by_type = BTreeMap::new();
        for component in &equipped {
            let key = component
                .gear_type
                .clone()
                .unwrap_or_else(|| crate::models::FALLBACK_COMPONENT_TYPE.to_string());
            equipped_by_type.insert(key, component.name.clone());
        }

        Self {
            equipped,
            equipped_by_type,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn ids(records: &[&GearRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_index_by_id_last_record_wins() {
        let mut duplicate = component("x1", GearType::Tyre);
        duplicate.name = Some("Second".to_string());
        let records = vec![component("x1", GearType::Chain), duplicate];

        let index = index_by_id(&records);
        assert_eq!(index.len(), 1);
        assert_eq!(index["x1"].name.as_deref(), Some("Second"));
    }

    #[test]
    fn test_index_by_id_empty() {
        let index = index_by_id(&[]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_resolve_equipped_drops_stale_and_non_component_ids() {
        let records = vec![
            bike("b1", &["x1", "missing", "b2", "x2"]),
            bike("b2", &[]),
            component("x1", GearType::Chain),
            component("x2", GearType::Tyre),
        ];
        let index = index_by_id(&records);

        let equipped = resolve_equipped(&records[0], &index);
        assert_eq!(ids(&equipped), vec!["x1", "x2"]);
    }

    #[test]
    fn test_resolve_equipped_keeps_list_order() {
        let records = vec![
            bike("b1", &["x3", "x1", "x2"]),
            component("x1", GearType::Chain),
            component("x2", GearType::Chain),
            component("x3", GearType::Tyre),
        ];
        let index = index_by_id(&records);

        assert_eq!(ids(&resolve_equipped(&records[0], &index)), vec!["x3", "x1", "x2"]);
    }

    #[test]
    fn test_group_by_type_sorts_by_id() {
        let records = vec![
            component("c3", GearType::Chain),
            component("t1", GearType::Tyre),
            component("c1", GearType::Chain),
            component("c2", GearType::Chain),
        ];
        let forward: Vec<&GearRecord> = records.iter().collect();
        let reversed: Vec<&GearRecord> = records.iter().rev().collect();

        let a = group_by_type(&forward);
        let b = group_by_type(&reversed);

        assert_eq!(ids(&a[&GearType::Chain]), vec!["c1", "c2", "c3"]);
        assert_eq!(ids(&a[&GearType::Tyre]), vec!["t1"]);
        assert_eq!(ids(&a[&GearType::Chain]), ids(&b[&GearType::Chain]));
    }

    #[test]
    fn test_group_by_type_untyped_components() {
        let mut untyped = component("u1", GearType::Chain);
        untyped.gear_type = None;
        let groups = group_by_type(&[&untyped]);

        assert!(groups.contains_key(&GearType::Other("Component".to_string())));
    }

    #[test]
    fn test_find_parent_of_first_match_wins() {
        let records = vec![
            component("x1", GearType::Chain),
            bike("b1", &["x2"]),
            bike("b2", &["x1"]),
            bike("b3", &["x1"]),
        ];

        assert_eq!(find_parent_of("x1", &records).map(|r| r.id.as_str()), Some("b2"));
        assert!(find_parent_of("x9", &records).is_none());
    }

    #[test]
    fn test_find_parent_of_ignores_component_records() {
        let mut odd = component("x2", GearType::Wheel);
        odd.component_ids = vec!["x1".to_string()];
        let records = vec![odd, component("x1", GearType::Tyre)];

        assert!(find_parent_of("x1", &records).is_none());
    }

    #[test]
    fn test_gear_view_build() {
        let snapshot = snapshot(vec![
            bike("b1", &["x1", "x2"]),
            component("x1", GearType::Chain),
            component("x2", GearType::Chain),
            component("x3", GearType::Cassette),
            bike("b2", &["x1"]),
        ]);

        let view = GearView::build(&snapshot);
        assert_eq!(view.parents.len(), 2);
        assert_eq!(view.components.len(), 3);

        let b1 = view.parent("b1").expect("b1 should be a parent");
        assert_eq!(b1.slots.len(), 2);

        // x1 is listed on two bikes; both keep it
        let b2 = view.parent("b2").expect("b2 should be a parent");
        assert_eq!(b2.slots.len(), 1);
        assert_eq!(b2.slots[0].component.id, "x1");

        let x1 = view.component("x1").expect("x1 should be a component");
        assert_eq!(x1.equipped_on.map(|g| g.id.as_str()), Some("b1"));
        let x3 = view.component("x3").expect("x3 should be a component");
        assert!(x3.equipped_on.is_none());

        assert_eq!(view.slots().count(), 3);
    }

    #[test]
    fn test_gear_view_empty_snapshot() {
        let snapshot = snapshot(Vec::new());
        let view = GearView::build(&snapshot);
        assert!(view.parents.is_empty());
        assert!(view.components.is_empty());
    }

    #[test]
    fn test_parent_summary() {
        let mut unmeasured = component("x3", GearType::Chain);
        unmeasured.distance_meters = Some(0.0);
        let snapshot = snapshot(vec![
            bike("b1", &["x3", "x1", "stale"]),
            component("x1", GearType::Tyre),
            unmeasured,
        ]);

        let summary = ParentSummary::build(&snapshot.records[0], &snapshot);
        let listed: Vec<&str> = summary.equipped.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(listed, vec!["x1", "x3"]);
        assert_eq!(summary.equipped[0].distance_km, Some(5.0));
        assert_eq!(summary.equipped[1].distance_km, None);
        assert_eq!(
            summary.equipped_by_type.get("Chain"),
            Some(&Some("Chain x3".to_string()))
        );
    }
}

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end tests for gear reconciliation: view derivation, slot naming,
//! equip planning and the coordinator's equip service.

use anyhow::Result;
use intervals_gear::coordinator::GearCoordinator;
use intervals_gear::display::render_all;
use intervals_gear::gear::{
    assign_slots, group_by_type, index_by_id, plan_equip, resolve_equipped, EquipError, GearView,
};
use intervals_gear::models::{GearRecord, GearSnapshot, GearType};
use intervals_gear::providers::memory::InMemoryProvider;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Helper to build a snapshot from intervals.icu-shaped JSON
fn snapshot_from(value: serde_json::Value) -> GearSnapshot {
    let records: Vec<GearRecord> = serde_json::from_value(value).expect("Failed to parse gear fixture");
    GearSnapshot::new(records)
}

/// Bike B1 with chain X1 equipped and a spare chain X2
fn chain_fixture() -> serde_json::Value {
    json!([
        { "id": "B1", "name": "Road Bike", "type": "Bike", "component_ids": ["X1"], "distance": 2000000.0 },
        { "id": "X1", "name": "Old Chain", "type": "Chain", "component": true, "distance": 3000000.0 },
        { "id": "X2", "name": "New Chain", "type": "Chain", "component": true, "distance": 0.0 }
    ])
}

fn with_bike_components(snapshot: &GearSnapshot, bike_id: &str, ids: &[String]) -> GearSnapshot {
    let mut records = snapshot.records.clone();
    for record in records.iter_mut().filter(|r| r.id == bike_id) {
        record.component_ids = ids.to_vec();
    }
    GearSnapshot::new(records)
}

#[test]
fn test_example_scenario() {
    let snapshot = snapshot_from(chain_fixture());

    let exclusive = plan_equip("B1", "X2", true, &snapshot).expect("exclusive equip should plan");
    assert_eq!(exclusive.component_ids, vec!["X2"]);

    let shared = plan_equip("B1", "X2", false, &snapshot).expect("non-exclusive equip should plan");
    assert_eq!(shared.component_ids, vec!["X1", "X2"]);

    let after = with_bike_components(&snapshot, "B1", &shared.component_ids);
    let index = index_by_id(&after.records);
    let slots = assign_slots(&after.records[0], &index);
    let labels: Vec<(String, &str)> = slots.iter().map(|s| (s.key.label(), s.component.id.as_str())).collect();
    assert_eq!(labels, vec![("Chain".to_string(), "X1"), ("Chain_2".to_string(), "X2")]);
}

#[test]
fn test_equip_is_idempotent_across_snapshots() {
    let snapshot = snapshot_from(json!([
        { "id": "B1", "type": "Bike", "component_ids": ["T1", "X1", "stale", "C1"] },
        { "id": "T1", "type": "Tyre", "component": true },
        { "id": "X1", "type": "Chain", "component": true },
        { "id": "X2", "type": "Chain", "component": true },
        { "id": "C1", "type": "Cassette", "component": true }
    ]));

    for target in ["X1", "X2", "T1", "C1"] {
        for exclusive in [false, true] {
            let first = plan_equip("B1", target, exclusive, &snapshot).expect("first plan");
            let next = with_bike_components(&snapshot, "B1", &first.component_ids);
            let second = plan_equip("B1", target, exclusive, &next).expect("second plan");
            assert_eq!(first.component_ids, second.component_ids, "target {} exclusive {}", target, exclusive);
        }
    }
}

#[test]
fn test_exclusive_leaves_one_of_type() {
    let snapshot = snapshot_from(json!([
        { "id": "B1", "type": "Bike", "component_ids": ["W1", "W2", "T1"] },
        { "id": "W1", "type": "Wheel", "component": true },
        { "id": "W2", "type": "Wheel", "component": true },
        { "id": "W3", "type": "Wheel", "component": true },
        { "id": "T1", "type": "Tyre", "component": true }
    ]));
    let index = index_by_id(&snapshot.records);

    let plan = plan_equip("B1", "W3", true, &snapshot).expect("plan should succeed");
    let wheels: Vec<&String> = plan
        .component_ids
        .iter()
        .filter(|id| index[id.as_str()].gear_type == Some(GearType::Wheel))
        .collect();
    assert_eq!(wheels, vec!["W3"]);
    assert!(plan.component_ids.contains(&"T1".to_string()));
}

#[test]
fn test_non_exclusive_only_appends() {
    let snapshot = snapshot_from(json!([
        { "id": "B1", "type": "Bike", "component_ids": ["W1", "missing", "T1"] },
        { "id": "W1", "type": "Wheel", "component": true },
        { "id": "W2", "type": "Wheel", "component": true },
        { "id": "T1", "type": "Tyre", "component": true }
    ]));

    let plan = plan_equip("B1", "W2", false, &snapshot).expect("plan should succeed");
    for original in &snapshot.records[0].component_ids {
        assert!(plan.component_ids.contains(original));
    }
    assert_eq!(plan.component_ids.last().map(String::as_str), Some("W2"));
}

#[test]
fn test_stale_references_are_omitted() {
    let snapshot = snapshot_from(json!([
        { "id": "B1", "type": "Bike", "component_ids": ["gone", "X1", "B2"] },
        { "id": "B2", "type": "Bike" },
        { "id": "X1", "type": "Chain", "component": true }
    ]));
    let index = index_by_id(&snapshot.records);

    let equipped = resolve_equipped(&snapshot.records[0], &index);
    let ids: Vec<&str> = equipped.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["X1"]);

    // Rendering the same snapshot does not fail either
    assert!(!render_all(&snapshot).is_empty());
}

#[test]
fn test_slot_order_ignores_fetch_order() {
    let forward = snapshot_from(json!([
        { "id": "B1", "type": "Bike", "component_ids": ["t-a", "t-b", "t-c"] },
        { "id": "t-a", "type": "Tyre", "component": true },
        { "id": "t-b", "type": "Tyre", "component": true },
        { "id": "t-c", "type": "Tyre", "component": true }
    ]));
    let shuffled = snapshot_from(json!([
        { "id": "t-c", "type": "Tyre", "component": true },
        { "id": "B1", "type": "Bike", "component_ids": ["t-c", "t-a", "t-b"] },
        { "id": "t-b", "type": "Tyre", "component": true },
        { "id": "t-a", "type": "Tyre", "component": true }
    ]));

    let order = |snapshot: &GearSnapshot| -> Vec<String> {
        let index = index_by_id(&snapshot.records);
        let bike = snapshot.records.iter().find(|r| r.id == "B1").expect("bike present");
        let equipped = resolve_equipped(bike, &index);
        group_by_type(&equipped)[&GearType::Tyre].iter().map(|r| r.id.clone()).collect()
    };

    assert_eq!(order(&forward), vec!["t-a", "t-b", "t-c"]);
    assert_eq!(order(&forward), order(&shuffled));
}

#[test]
fn test_unknown_bike_fails_closed() {
    let snapshot = snapshot_from(chain_fixture());
    let result = plan_equip("unknown-bike", "X1", false, &snapshot);
    assert!(matches!(result, Err(EquipError::NotFound { .. })));
}

#[test]
fn test_view_with_unknown_types() {
    let snapshot = snapshot_from(json!([
        { "id": "K1", "type": "Kayak", "component_ids": ["P1"] },
        { "id": "P1", "type": "Paddle", "component": true },
        { "id": "U1", "component": true }
    ]));

    let view = GearView::build(&snapshot);
    let kayak = view.parent("K1").expect("kayak should be a parent");
    assert_eq!(kayak.gear.gear_type, Some(GearType::Other("Kayak".to_string())));
    assert_eq!(kayak.slots[0].key.label(), "Paddle");
    assert!(view.component("U1").expect("untyped component").equipped_on.is_none());
}

#[tokio::test]
async fn test_coordinator_equip_emits_event() -> Result<()> {
    let records: Vec<GearRecord> = serde_json::from_value(chain_fixture())?;
    let provider = Arc::new(InMemoryProvider::new(records));
    let coordinator = GearCoordinator::new(provider.clone(), "i1");
    let mut events = coordinator.subscribe();

    let event = coordinator.equip("B1", "X2", false).await?;
    assert_eq!(event.component_ids, vec!["X1", "X2"]);

    let received = events.recv().await?;
    assert_eq!(received, event);
    assert_eq!(received.status, "updated");

    // Second call with the same arguments changes nothing
    let again = coordinator.equip("B1", "X2", false).await?;
    assert_eq!(again.component_ids, event.component_ids);
    assert_eq!(provider.write_count(), 2);

    let snapshot = coordinator.snapshot().await.expect("snapshot after equip");
    let sensors = render_all(&snapshot);
    assert!(sensors.iter().any(|s| s.unique_id == "intervals_icu_gear_B1_equipped_Chain_2"));

    Ok(())
}

#[tokio::test]
async fn test_coordinator_equip_not_found_has_no_side_effects() -> Result<()> {
    let records: Vec<GearRecord> = serde_json::from_value(chain_fixture())?;
    let provider = Arc::new(InMemoryProvider::new(records));
    let coordinator = GearCoordinator::new(provider.clone(), "i1");
    let mut events = coordinator.subscribe();

    let result = coordinator.equip("B1", "missing", true).await;
    assert!(matches!(result, Err(EquipError::NotFound { .. })));
    assert_eq!(provider.write_count(), 0);
    assert!(events.try_recv().is_err());

    Ok(())
}

#[tokio::test]
async fn test_coordinator_concurrent_equips_on_one_bike() -> Result<()> {
    let records: Vec<GearRecord> = serde_json::from_value(json!([
        { "id": "B1", "type": "Bike", "component_ids": [] },
        { "id": "X1", "type": "Chain", "component": true },
        { "id": "T1", "type": "Tyre", "component": true }
    ]))?;
    let provider = Arc::new(InMemoryProvider::new(records));
    let coordinator = Arc::new(GearCoordinator::new(provider.clone(), "i1"));

    let a = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.equip("B1", "X1", false).await })
    };
    let b = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.equip("B1", "T1", false).await })
    };
    a.await??;
    b.await??;

    // Serialized per bike, so neither write is lost
    let bike = provider.records().into_iter().find(|r| r.id == "B1").expect("bike present");
    assert_eq!(bike.component_ids.len(), 2);
    assert!(bike.has_component("X1"));
    assert!(bike.has_component("T1"));

    Ok(())
}

#[tokio::test]
async fn test_coordinator_run_stops_on_shutdown() -> Result<()> {
    let records: Vec<GearRecord> = serde_json::from_value(chain_fixture())?;
    let provider = Arc::new(InMemoryProvider::new(records));
    let coordinator = Arc::new(GearCoordinator::new(provider, "i1"));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.run(Duration::from_millis(10), shutdown_rx).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(true)?;
    tokio::time::timeout(Duration::from_secs(5), poller).await??;

    let snapshot = coordinator.snapshot().await.expect("poller should have stored a snapshot");
    assert_eq!(snapshot.len(), 3);

    Ok(())
}

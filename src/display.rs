// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Sensor Rendering
//!
//! Turns a [`GearView`] into flat, presentation-ready sensors. Every sensor is
//! produced by one function, [`render`], driven by a [`SensorDescriptor`]
//! that says which value to surface, how to name it and which unit it has.
//!
//! | Descriptor | Source | Name | Unique id |
//! |------------|--------|------|-----------|
//! | [`GEAR_MILEAGE`] | parent gear | `Mileage` | `intervals_icu_gear_{id}_mileage` |
//! | [`SLOT_NAME`] | equipped slot | `Chain_2` | `intervals_icu_gear_{parent}_equipped_Chain_2` |
//! | [`SLOT_MILEAGE`] | equipped slot | `Chain_2 Mileage` | `..._equipped_Chain_2_mileage` |
//! | [`COMPONENT_MILEAGE`] | any component | `Mileage` | `intervals_icu_component_{id}_mileage` |

use crate::constants::{api, ids};
use crate::gear::{ComponentView, GearView, ParentSummary, Slot};
use crate::models::{GearRecord, GearSnapshot};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Unit used for every distance sensor
pub const KILOMETERS: &str = "km";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    GearMileage,
    SlotName,
    SlotMileage,
    ComponentMileage,
}

/// Which field of the subject record becomes the sensor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueField {
    Name,
    DistanceKm,
}

/// Static description of one kind of sensor
#[derive(Debug, Clone, Copy)]
pub struct SensorDescriptor {
    pub kind: SensorKind,
    pub value: ValueField,
    /// Word appended to the source label, e.g. `Mileage`
    pub name: Option<&'static str>,
    /// Appended to the source's base id
    pub id_suffix: &'static str,
    pub unit: Option<&'static str>,
    /// Include activity count and moving time in the attributes
    pub telemetry: bool,
}

pub const GEAR_MILEAGE: SensorDescriptor = SensorDescriptor {
    kind: SensorKind::GearMileage,
    value: ValueField::DistanceKm,
    name: Some("Mileage"),
    id_suffix: "_mileage",
    unit: Some(KILOMETERS),
    telemetry: true,
};

pub const SLOT_NAME: SensorDescriptor = SensorDescriptor {
    kind: SensorKind::SlotName,
    value: ValueField::Name,
    name: None,
    id_suffix: "",
    unit: None,
    telemetry: false,
};

pub const SLOT_MILEAGE: SensorDescriptor = SensorDescriptor {
    kind: SensorKind::SlotMileage,
    value: ValueField::DistanceKm,
    name: Some("Mileage"),
    id_suffix: "_mileage",
    unit: Some(KILOMETERS),
    telemetry: true,
};

pub const COMPONENT_MILEAGE: SensorDescriptor = SensorDescriptor {
    kind: SensorKind::ComponentMileage,
    value: ValueField::DistanceKm,
    name: Some("Mileage"),
    id_suffix: "_mileage",
    unit: Some(KILOMETERS),
    telemetry: true,
};

/// What a sensor is rendered from
#[derive(Debug, Clone, Copy)]
pub enum SensorSource<'v, 'a> {
    Gear {
        gear: &'a GearRecord,
        snapshot: &'a GearSnapshot,
    },
    Slot {
        parent: &'a GearRecord,
        slot: &'v Slot<'a>,
    },
    Component(&'v ComponentView<'a>),
}

impl<'v, 'a> SensorSource<'v, 'a> {
    /// Record whose values the sensor shows
    fn subject(&self) -> &'a GearRecord {
        match *self {
            Self::Gear { gear, .. } => gear,
            Self::Slot { slot, .. } => slot.component,
            Self::Component(view) => view.gear,
        }
    }

    /// Record that owns the device the sensor is grouped under
    fn device_record(&self) -> &'a GearRecord {
        match *self {
            Self::Gear { gear, .. } => gear,
            Self::Slot { parent, .. } => parent,
            Self::Component(view) => view.gear,
        }
    }

    fn label(&self) -> Option<String> {
        match self {
            Self::Slot { slot, .. } => Some(slot.key.label()),
            _ => None,
        }
    }

    fn base_id(&self) -> String {
        match self {
            Self::Gear { gear, .. } => format!("{}_{}", ids::GEAR_PREFIX, gear.id),
            Self::Slot { slot, .. } => slot.key.unique_id(),
            Self::Component(view) => format!("{}_{}", ids::COMPONENT_PREFIX, view.gear.id),
        }
    }
}

/// Rendered sensor state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorState {
    Number(f64),
    Text(String),
}

/// Device a sensor belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifier: (String, String),
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensor {
    pub unique_id: String,
    pub kind: SensorKind,
    pub name: String,
    pub state: Option<SensorState>,
    pub unit: Option<String>,
    pub device: DeviceInfo,
    pub attributes: Map<String, Value>,
}

/// Render one sensor
pub fn render(descriptor: &SensorDescriptor, source: SensorSource<'_, '_>) -> Sensor {
    let subject = source.subject();

    let name = match (source.label(), descriptor.name) {
        (Some(label), Some(word)) => format!("{} {}", label, word),
        (Some(label), None) => label,
        (None, Some(word)) => word.to_string(),
        (None, None) => subject.display_name().to_string(),
    };

    let state = match descriptor.value {
        ValueField::Name => subject.name.clone().map(SensorState::Text),
        ValueField::DistanceKm => subject.distance_km().map(SensorState::Number),
    };

    let device_record = source.device_record();
    let device = DeviceInfo {
        identifier: (ids::DOMAIN.to_string(), device_record.id.clone()),
        name: device_record.display_name().to_string(),
        manufacturer: api::MANUFACTURER.to_string(),
        model: device_record.gear_type_label().to_string(),
    };

    Sensor {
        unique_id: format!("{}{}", source.base_id(), descriptor.id_suffix),
        kind: descriptor.kind,
        name,
        state,
        unit: descriptor.unit.map(str::to_string),
        device,
        attributes: attributes(descriptor, &source),
    }
}

fn attributes(descriptor: &SensorDescriptor, source: &SensorSource<'_, '_>) -> Map<String, Value> {
    let subject = source.subject();
    let mut attrs = Map::new();

    match source {
        SensorSource::Gear { gear, snapshot } => {
            let summary = ParentSummary::build(gear, snapshot);
            attrs.insert("gear_id".into(), json!(gear.id));
            attrs.insert("gear_type".into(), json!(gear.gear_type));
            attrs.insert("component_ids".into(), json!(gear.component_ids));
            attrs.insert("equipped_components".into(), json!(summary.equipped));
            attrs.insert("equipped_by_type".into(), json!(summary.equipped_by_type));
        }
        SensorSource::Slot { slot, .. } => {
            attrs.insert("component_id".into(), json!(slot.component.id));
            attrs.insert("component_name".into(), json!(slot.component.name));
            attrs.insert("component_type".into(), json!(slot.component.gear_type));
            attrs.insert("slot_index".into(), json!(slot.key.slot_index));
        }
        SensorSource::Component(view) => {
            let equipped_on = view.equipped_on;
            attrs.insert("gear_id".into(), json!(view.gear.id));
            attrs.insert("component_type".into(), json!(view.gear.gear_type));
            attrs.insert("equipped_on_id".into(), json!(equipped_on.map(|g| &g.id)));
            attrs.insert("equipped_on_name".into(), json!(equipped_on.and_then(|g| g.name.as_ref())));
            attrs.insert("equipped_on_type".into(), json!(equipped_on.and_then(|g| g.gear_type.as_ref())));
        }
    }

    if descriptor.telemetry {
        attrs.insert("activities".into(), json!(subject.activity_count));
        attrs.insert("time_seconds".into(), json!(subject.time_seconds));
    }

    attrs
}

/// Render every sensor for one snapshot
///
/// Each parent yields a mileage sensor followed by a name and a mileage
/// sensor per slot; each component yields its own mileage sensor.
pub fn render_all(snapshot: &GearSnapshot) -> Vec<Sensor> {
    let view = GearView::build(snapshot);
    let mut sensors = Vec::new();

    for parent in &view.parents {
        sensors.push(render(&GEAR_MILEAGE, SensorSource::Gear { gear: parent.gear, snapshot }));
        for slot in &parent.slots {
            let source = SensorSource::Slot { parent: parent.gear, slot };
            sensors.push(render(&SLOT_NAME, source));
            sensors.push(render(&SLOT_MILEAGE, source));
        }
    }

    for component in &view.components {
        sensors.push(render(&COMPONENT_MILEAGE, SensorSource::Component(component)));
    }

    sensors
}

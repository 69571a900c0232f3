// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Typed representation of the gear inventory returned by intervals.icu.
//!
//! The remote service returns loosely-shaped JSON objects where almost every
//! field is optional. They are validated once, at deserialization time, into
//! [`GearRecord`]; everything downstream works with typed fields only.
//!
//! ## Core Models
//!
//! - [`GearRecord`]: A single bike, pair of shoes or component
//! - [`GearType`]: Known gear categories, tolerant of unknown values
//! - [`GearSnapshot`]: One full fetch of the gear list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fallback type used for components that arrive without a `type` field
pub const FALLBACK_COMPONENT_TYPE: &str = "Component";

/// Fallback type shown for parent gear without a `type` field
pub const FALLBACK_GEAR_TYPE: &str = "Gear";

/// Fallback display name for records without a `name`
pub const FALLBACK_NAME: &str = "Unknown";

/// One item of the remote gear inventory
///
/// # Examples
///
/// ```rust
/// use intervals_gear::models::{GearRecord, GearType};
///
/// let record: GearRecord = serde_json::from_str(
///     r#"{"id": "b1", "name": "Road Bike", "type": "Bike", "component_ids": ["c1"], "distance": 12500.0}"#,
/// ).unwrap();
///
/// assert_eq!(record.gear_type, Some(GearType::Bike));
/// assert!(!record.is_component);
/// assert_eq!(record.distance_km(), Some(12.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearRecord {
    /// Opaque identifier, unique within one fetch
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Category tag
    #[serde(rename = "type", default)]
    pub gear_type: Option<GearType>,
    /// True when this record can be attached to a parent
    #[serde(rename = "component", default, deserialize_with = "null_as_default")]
    pub is_component: bool,
    /// Components currently equipped on this record, in remote order
    #[serde(default, deserialize_with = "null_as_default")]
    pub component_ids: Vec<String>,
    /// Total distance in meters; `None` means unknown
    #[serde(rename = "distance", default)]
    pub distance_meters: Option<f64>,
    /// Number of activities recorded with this gear, passed through as sent
    #[serde(rename = "activities", default)]
    pub activity_count: Option<f64>,
    /// Total moving time in seconds, passed through as sent
    #[serde(rename = "time", default)]
    pub time_seconds: Option<f64>,
}

impl GearRecord {
    /// Display name, falling back to a placeholder
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(FALLBACK_NAME)
    }

    /// Type used when grouping this record as an equipped component
    pub fn component_type(&self) -> GearType {
        self.gear_type
            .clone()
            .unwrap_or_else(|| GearType::Other(FALLBACK_COMPONENT_TYPE.to_string()))
    }

    /// Type label used when presenting this record as parent gear
    pub fn gear_type_label(&self) -> &str {
        self.gear_type
            .as_ref()
            .map(GearType::as_str)
            .unwrap_or(FALLBACK_GEAR_TYPE)
    }

    /// Distance in kilometers rounded to one decimal place
    pub fn distance_km(&self) -> Option<f64> {
        self.distance_meters.map(meters_to_km)
    }

    /// Whether the given component id is in this record's equipped list
    pub fn has_component(&self, component_id: &str) -> bool {
        self.component_ids.iter().any(|id| id == component_id)
    }
}

/// Convert meters to kilometers, rounded to one decimal place
pub fn meters_to_km(meters: f64) -> f64 {
    (meters / 100.0).round() / 10.0
}

/// Gear categories known to intervals.icu
///
/// Main gear and component types share one namespace on the remote side.
/// Values the service adds later are preserved as [`GearType::Other`] and
/// serialize back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GearType {
    // Main gear
    Bike,
    Shoes,
    Wetsuit,
    RowingMachine,
    Skis,
    Snowboard,
    Boat,
    Board,
    Equipment,

    // Components
    Chain,
    Cassette,
    Tyre,
    Wheel,
    Wheelset,
    Brake,
    BrakePads,
    Rotor,
    Drivetrain,
    BottomBracket,
    Chainrings,
    Crankset,
    Derailleur,
    Pedals,
    Lever,
    Cable,
    Frame,
    Fork,
    Handlebar,
    Headset,
    Saddle,
    Seatpost,
    Shock,
    Stem,
    Axel,
    Hub,
    Trainer,
    Tube,
    PowerMeter,
    Cleats,
    CyclingShoes,
    Paddle,
    Computer,
    Light,
    Battery,
    Accessories,
    Apparel,

    /// Any type string not listed above
    Other(String),
}

impl GearType {
    /// Wire representation, also used as the slot label
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bike => "Bike",
            Self::Shoes => "Shoes",
            Self::Wetsuit => "Wetsuit",
            Self::RowingMachine => "RowingMachine",
            Self::Skis => "Skis",
            Self::Snowboard => "Snowboard",
            Self::Boat => "Boat",
            Self::Board => "Board",
            Self::Equipment => "Equipment",
            Self::Chain => "Chain",
            Self::Cassette => "Cassette",
            Self::Tyre => "Tyre",
            Self::Wheel => "Wheel",
            Self::Wheelset => "Wheelset",
            Self::Brake => "Brake",
            Self::BrakePads => "BrakePads",
            Self::Rotor => "Rotor",
            Self::Drivetrain => "Drivetrain",
            Self::BottomBracket => "BottomBracket",
            Self::Chainrings => "Chainrings",
            Self::Crankset => "Crankset",
            Self::Derailleur => "Derailleur",
            Self::Pedals => "Pedals",
            Self::Lever => "Lever",
            Self::Cable => "Cable",
            Self::Frame => "Frame",
            Self::Fork => "Fork",
            Self::Handlebar => "Handlebar",
            Self::Headset => "Headset",
            Self::Saddle => "Saddle",
            Self::Seatpost => "Seatpost",
            Self::Shock => "Shock",
            Self::Stem => "Stem",
            Self::Axel => "Axel",
            Self::Hub => "Hub",
            Self::Trainer => "Trainer",
            Self::Tube => "Tube",
            Self::PowerMeter => "PowerMeter",
            Self::Cleats => "Cleats",
            Self::CyclingShoes => "CyclingShoes",
            Self::Paddle => "Paddle",
            Self::Computer => "Computer",
            Self::Light => "Light",
            Self::Battery => "Battery",
            Self::Accessories => "Accessories",
            Self::Apparel => "Apparel",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for GearType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Bike" => Self::Bike,
            "Shoes" => Self::Shoes,
            "Wetsuit" => Self::Wetsuit,
            "RowingMachine" => Self::RowingMachine,
            "Skis" => Self::Skis,
            "Snowboard" => Self::Snowboard,
            "Boat" => Self::Boat,
            "Board" => Self::Board,
            "Equipment" => Self::Equipment,
            "Chain" => Self::Chain,
            "Cassette" => Self::Cassette,
            "Tyre" => Self::Tyre,
            "Wheel" => Self::Wheel,
            "Wheelset" => Self::Wheelset,
            "Brake" => Self::Brake,
            "BrakePads" => Self::BrakePads,
            "Rotor" => Self::Rotor,
            "Drivetrain" => Self::Drivetrain,
            "BottomBracket" => Self::BottomBracket,
            "Chainrings" => Self::Chainrings,
            "Crankset" => Self::Crankset,
            "Derailleur" => Self::Derailleur,
            "Pedals" => Self::Pedals,
            "Lever" => Self::Lever,
            "Cable" => Self::Cable,
            "Frame" => Self::Frame,
            "Fork" => Self::Fork,
            "Handlebar" => Self::Handlebar,
            "Headset" => Self::Headset,
            "Saddle" => Self::Saddle,
            "Seatpost" => Self::Seatpost,
            "Shock" => Self::Shock,
            "Stem" => Self::Stem,
            "Axel" => Self::Axel,
            "Hub" => Self::Hub,
            "Trainer" => Self::Trainer,
            "Tube" => Self::Tube,
            "PowerMeter" => Self::PowerMeter,
            "Cleats" => Self::Cleats,
            "CyclingShoes" => Self::CyclingShoes,
            "Paddle" => Self::Paddle,
            "Computer" => Self::Computer,
            "Light" => Self::Light,
            "Battery" => Self::Battery,
            "Accessories" => Self::Accessories,
            "Apparel" => Self::Apparel,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for GearType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<GearType> for String {
    fn from(value: GearType) -> Self {
        match value {
            GearType::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for GearType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One complete fetch of the athlete's gear list
///
/// Snapshots are never patched; each poll produces a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GearSnapshot {
    /// Records in the order the remote service returned them
    pub records: Vec<GearRecord>,
    /// When the list was fetched (UTC)
    pub fetched_at: DateTime<Utc>,
}

impl GearSnapshot {
    /// Wrap a freshly fetched list, stamped with the current time
    pub fn new(records: Vec<GearRecord>) -> Self {
        Self {
            records,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

// `null` in the payload means the same as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

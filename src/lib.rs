// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Intervals Gear
//!
//! Mileage tracking for bikes and their replaceable components (chains,
//! tyres, cassettes, ...) backed by the intervals.icu gear API.
//!
//! ## Features
//!
//! - **Gear view**: parents with their equipped components, grouped by type
//! - **Slots**: stable `Chain`, `Chain_2`, ... naming when a bike carries
//!   several components of one type
//! - **Equip**: add a component to a bike, optionally evicting others of
//!   the same type, with idempotent re-equip
//! - **Sensors**: flat, presentation-ready mileage and name values
//!
//! ## Architecture
//!
//! - **Models**: typed gear records and snapshots
//! - **Gear**: pure derivations over one snapshot, plus the equip reconciler
//! - **Display**: data-driven sensor rendering
//! - **Providers**: remote gear inventory implementations
//! - **Coordinator**: polling, latest snapshot, serialized equip service
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use intervals_gear::config::Config;
//! use intervals_gear::gear::GearView;
//! use intervals_gear::providers::intervals::IntervalsProvider;
//! use intervals_gear::providers::GearProvider;
//! use intervals_gear::models::GearSnapshot;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let provider = IntervalsProvider::from_config(&config)?;
//!
//!     let snapshot = GearSnapshot::new(provider.fetch_gear().await?);
//!     let view = GearView::build(&snapshot);
//!
//!     for parent in &view.parents {
//!         for slot in &parent.slots {
//!             println!("{} {}: {}", parent.gear.display_name(), slot.key.label(), slot.component.display_name());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Typed gear records and snapshots
pub mod models;

/// Gear repository view, slot naming and the equip reconciler
pub mod gear;

/// Sensor rendering
pub mod display;

/// Remote gear providers
pub mod providers;

/// Polling and the equip service
pub mod coordinator;

/// Configuration management and persistence
pub mod config;

/// Application constants
pub mod constants;

/// Logging setup and structured events
pub mod logging;

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Application constants and environment-based configuration values.

/// intervals.icu API locations
pub mod api {
    /// Public API base
    pub const INTERVALS_API_BASE: &str = "https://intervals.icu/api/v1";

    /// Manufacturer string reported for every rendered device
    pub const MANUFACTURER: &str = "Intervals.icu";
}

/// Identifier prefixes and event names exposed to consumers
pub mod ids {
    /// Integration domain
    pub const DOMAIN: &str = "intervals_icu_gear";

    /// Prefix for parent gear and slot sensor ids
    pub const GEAR_PREFIX: &str = "intervals_icu_gear";

    /// Prefix for standalone component sensor ids
    pub const COMPONENT_PREFIX: &str = "intervals_icu_component";

    /// Event fired after a successful equip
    pub const EQUIPPED_EVENT: &str = "intervals_icu_gear_component_equipped";
}

/// Polling and transport defaults
pub mod limits {
    /// Default poll cadence: one hour
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3600;

    /// Shortest poll cadence accepted from configuration
    pub const MIN_POLL_INTERVAL_SECS: u64 = 60;

    /// Default HTTP request timeout
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Capacity of the equip event channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 32;
}

/// Environment variable names
pub mod env_vars {
    pub const API_KEY: &str = "INTERVALS_API_KEY";
    pub const ATHLETE_ID: &str = "INTERVALS_ATHLETE_ID";
    pub const BASE_URL: &str = "INTERVALS_BASE_URL";
    pub const POLL_INTERVAL_SECS: &str = "INTERVALS_POLL_INTERVAL_SECS";
    pub const REQUEST_TIMEOUT_SECS: &str = "INTERVALS_REQUEST_TIMEOUT_SECS";
}

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use async_trait::async_trait;
use anyhow::Result;
use crate::config::Config;
use crate::models::GearRecord;

pub mod intervals;
pub mod memory;

/// Remote gear inventory for one athlete
#[async_trait]
pub trait GearProvider: Send + Sync {
    /// Fetch the full gear list
    async fn fetch_gear(&self) -> Result<Vec<GearRecord>, ProviderError>;

    /// Replace a bike's equipped-component list as a whole
    async fn replace_components(&self, bike_id: &str, component_ids: &[String]) -> Result<(), ProviderError>;

    fn provider_name(&self) -> &'static str;
}

/// Errors reported by a gear provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Remote service responded with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode gear response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub fn create_provider(provider_type: &str, config: &Config) -> Result<Box<dyn GearProvider>> {
    match provider_type.to_lowercase().as_str() {
        "intervals" => Ok(Box::new(intervals::IntervalsProvider::from_config(config)?)),
        _ => Err(anyhow::anyhow!("Unknown provider: {}. Currently supported: intervals", provider_type)),
    }
}

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! intervals.icu provider implementation for gear data.
//!
//! Supports:
//! - Fetching the athlete's full gear list
//! - Replacing a bike's equipped-component list
//!
//! Authentication uses a bearer API key. Retries and backoff are not
//! performed here; a rejected request is reported once.
//!
//! # API Documentation
//! - [intervals.icu API](https://intervals.icu/api/v1/docs/swagger-ui/index.html)

use async_trait::async_trait;
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use crate::config::Config;
use crate::constants::api;
use crate::models::GearRecord;
use super::{GearProvider, ProviderError};

pub struct IntervalsProvider {
    client: Client,
    base_url: Url,
    athlete_id: String,
    api_key: String,
}

impl IntervalsProvider {
    /// Create a provider against the public intervals.icu API
    pub fn new(api_key: impl Into<String>, athlete_id: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api::INTERVALS_API_BASE, api_key, athlete_id, Client::new())
    }

    /// Create a provider against an arbitrary API base, e.g. a test server
    pub fn with_base_url(
        base_url: &str,
        api_key: impl Into<String>,
        athlete_id: impl Into<String>,
        client: Client,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid intervals.icu base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("intervals.icu base URL cannot carry a path: {}", base_url);
        }

        Ok(Self {
            client,
            base_url,
            athlete_id: athlete_id.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Self::with_base_url(&config.base_url, config.api_key.clone(), config.athlete_id.clone(), client)
    }

    pub fn athlete_id(&self) -> &str {
        &self.athlete_id
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turn a non-2xx response into [`ProviderError::Rejected`] with its body
async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl GearProvider for IntervalsProvider {
    async fn fetch_gear(&self) -> Result<Vec<GearRecord>, ProviderError> {
        let url = self.endpoint(&["athlete", self.athlete_id.as_str(), "gear"])?;
        debug!(url = %url, "Fetching intervals.icu gear list");

        let response = self.client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;

        // The API answers `null` for athletes without gear
        let records: Option<Vec<GearRecord>> = serde_json::from_str(&body)?;
        let records = records.unwrap_or_default();

        debug!(athlete.id = %self.athlete_id, gear.count = records.len(), "intervals.icu returned gear list");
        Ok(records)
    }

    async fn replace_components(&self, bike_id: &str, component_ids: &[String]) -> Result<(), ProviderError> {
        let url = self.endpoint(&["athlete", self.athlete_id.as_str(), "gear", bike_id])?;

        let response = self.client
            .put(url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "component_ids": component_ids }))
            .send()
            .await?;
        ensure_success(response).await?;

        info!(bike.id = %bike_id, component_count = component_ids.len(), "Bike component list replaced");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "intervals.icu"
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP client for the SakuraCloud IaaS API.
//!
//! DNS zones are global resources and are always addressed through the
//! `is1a` zone endpoint:
//!
//! - Read: `GET {root}/is1a/api/cloud/1.1/commonserviceitem/{id}`
//! - Update: `PUT {root}/is1a/api/cloud/1.1/commonserviceitem/{id}`
//!
//! Requests authenticate with HTTP basic auth (access token / access token
//! secret). No retries happen here; cert-manager retries failed challenges.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, Response};
use std::time::Duration;
use tracing::{debug, error, info};

use super::types::{ApiErrorBody, DnsRecord, DnsZone, ReadZoneResponse, UpdateZoneRequest};
use super::{Credentials, ZoneClient, ZoneClientFactory};
use crate::constants::{SAKURACLOUD_API_PATH, SAKURACLOUD_GLOBAL_ZONE};
use crate::errors::{ProviderError, SolverError};
use crate::metrics::record_provider_request;

/// Build the base URL for global resources from the configured API root.
///
/// Converts `https://secure.sakura.ad.jp/cloud/zone` (with or without a
/// trailing slash) to `https://secure.sakura.ad.jp/cloud/zone/is1a/api/cloud/1.1`.
#[must_use]
pub fn build_api_url(api_root: &str) -> String {
    format!(
        "{}/{SAKURACLOUD_GLOBAL_ZONE}/{SAKURACLOUD_API_PATH}",
        api_root.trim_end_matches('/')
    )
}

/// SakuraCloud API client bound to one set of credentials.
#[derive(Debug, Clone)]
pub struct SakuraCloudClient {
    http: HttpClient,
    base_url: String,
    credentials: Credentials,
}

impl SakuraCloudClient {
    /// Create a client sharing `http`'s connection pool.
    #[must_use]
    pub fn new(http: HttpClient, api_root: &str, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: build_api_url(api_root),
            credentials,
        }
    }

    fn zone_url(&self, zone_id: i64) -> String {
        format!("{}/commonserviceitem/{zone_id}", self.base_url)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&UpdateZoneRequest<'_>>,
    ) -> Result<Response, ProviderError> {
        debug!(method = %method, url = %url, "HTTP API request to SakuraCloud");

        let mut request = self
            .http
            .request(method.clone(), url)
            .basic_auth(
                &self.credentials.access_token,
                Some(&self.credentials.access_token_secret),
            );
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| ProviderError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
        error!(
            method = %method,
            url = %url,
            status = %status,
            error = %text,
            "SakuraCloud API request failed"
        );

        Err(ProviderError::Api {
            status: status.as_u16(),
            code: body.error_code.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown")
                    .to_lowercase()
                    .replace(' ', "_")
            }),
            message: body.error_msg.unwrap_or(text),
        })
    }

    async fn fetch_zone(&self, zone_id: i64, url: &str) -> Result<DnsZone, ProviderError> {
        let response = self.send(Method::GET, url, None).await?;
        let text = response.text().await.map_err(|source| ProviderError::Http {
            url: url.to_string(),
            source,
        })?;
        let parsed: ReadZoneResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Decode(format!("zone {zone_id}: {e}")))?;
        Ok(DnsZone::from(parsed.item))
    }
}

#[async_trait]
impl ZoneClient for SakuraCloudClient {
    async fn read_zone(&self, zone_id: i64) -> Result<DnsZone, ProviderError> {
        let url = self.zone_url(zone_id);

        let result = self.fetch_zone(zone_id, &url).await;

        record_provider_request("read_zone", result.is_ok());
        if let Ok(zone) = &result {
            debug!(
                zone_id = zone.id,
                zone = %zone.name,
                records = zone.records.len(),
                "Read SakuraCloud DNS zone"
            );
        }
        result
    }

    async fn update_records(
        &self,
        zone_id: i64,
        records: &[DnsRecord],
        settings_hash: &str,
    ) -> Result<(), ProviderError> {
        let url = self.zone_url(zone_id);
        let body = UpdateZoneRequest::new(records, settings_hash);

        let result = self.send(Method::PUT, &url, Some(&body)).await.map(|_| ());

        record_provider_request("update_zone", result.is_ok());
        if result.is_ok() {
            info!(
                zone_id = zone_id,
                records = records.len(),
                "Updated SakuraCloud DNS zone records"
            );
        }
        result
    }
}

/// Builds [`SakuraCloudClient`]s that share one HTTP connection pool.
#[derive(Debug, Clone)]
pub struct SakuraCloudClientFactory {
    http: HttpClient,
    api_root: String,
}

impl SakuraCloudClientFactory {
    /// Create a factory targeting `api_root` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_root: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(ProviderError::ClientBuild)?;

        Ok(Self {
            http,
            api_root: api_root.to_string(),
        })
    }
}

impl ZoneClientFactory for SakuraCloudClientFactory {
    fn zone_client(&self, credentials: Credentials) -> Result<Box<dyn ZoneClient>, SolverError> {
        Ok(Box::new(SakuraCloudClient::new(
            self.http.clone(),
            &self.api_root,
            credentials,
        )))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SakuraCloud DNS zone management.
//!
//! This module provides the pieces the solver needs from SakuraCloud:
//!
//! - [`ZoneClient`] - read a zone and replace its record list
//! - [`ZoneClientFactory`] - build a [`ZoneClient`] for a set of credentials
//! - [`SakuraCloudClient`] - the HTTP implementation against the IaaS API
//!
//! # Architecture
//!
//! Credentials are resolved per challenge (they come from the issuer's secret
//! references), so the solver holds a factory and builds a fresh client for
//! every call. The underlying `reqwest::Client` connection pool is shared.
//!
//! # Example
//!
//! ```rust,no_run
//! use sakuracloud_dns_webhook::sakuracloud::{
//!     Credentials, SakuraCloudClientFactory, ZoneClient, ZoneClientFactory,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let factory = SakuraCloudClientFactory::new(
//!     "https://secure.sakura.ad.jp/cloud/zone",
//!     std::time::Duration::from_secs(30),
//! )?;
//! let client = factory.zone_client(Credentials::new("token", "secret"))?;
//! let zone = client.read_zone(112_900_000_001).await?;
//! println!("{} has {} records", zone.name, zone.records.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod types;

pub use client::{SakuraCloudClient, SakuraCloudClientFactory};
pub use types::{DnsRecord, DnsZone, RecordType};

use async_trait::async_trait;
use std::fmt;

use crate::errors::{ProviderError, SolverError};

/// API credentials for SakuraCloud.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access token (basic auth user)
    pub access_token: String,
    /// Access token secret (basic auth password)
    pub access_token_secret: String,
}

impl Credentials {
    /// Credentials from an access token and its secret.
    #[must_use]
    pub fn new(access_token: impl Into<String>, access_token_secret: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Read-modify-write access to a single provider's DNS zones.
#[async_trait]
pub trait ZoneClient: Send + Sync {
    /// Read a zone, including its full record list and settings hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone does not exist or the API call fails.
    async fn read_zone(&self, zone_id: i64) -> Result<DnsZone, ProviderError>;

    /// Replace the zone's record list.
    ///
    /// `settings_hash` must be the hash returned by the read the records were
    /// derived from; the API rejects the update if the zone changed since.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    async fn update_records(
        &self,
        zone_id: i64,
        records: &[DnsRecord],
        settings_hash: &str,
    ) -> Result<(), ProviderError>;
}

/// Builds [`ZoneClient`]s for resolved credentials.
pub trait ZoneClientFactory: Send + Sync {
    /// Create a client authenticated with `credentials`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed.
    fn zone_client(&self, credentials: Credentials) -> Result<Box<dyn ZoneClient>, SolverError>;
}

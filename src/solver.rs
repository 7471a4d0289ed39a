// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS-01 challenge solver for SakuraCloud DNS.
//!
//! A solver converges a SakuraCloud zone towards containing (`present`) or not
//! containing (`cleanup`) the challenge TXT record. Both operations are a
//! single read-modify-write of the zone's record list:
//!
//! 1. Decode the issuer's [`ProviderConfig`]
//! 2. Resolve the API credentials from the referenced secrets
//! 3. Read the zone by ID
//! 4. Compute the record name relative to the zone
//! 5. Modify the record list and write it back with the zone's settings hash
//!
//! Both operations are idempotent; cert-manager calls them repeatedly and
//! owns retry and backoff.
//!
//! # Example
//!
//! ```rust
//! use sakuracloud_dns_webhook::solver::record_entry;
//!
//! let entry = record_entry(
//!     "example.com.",
//!     "_acme-challenge.example.com.",
//!     "example.com",
//! )
//! .unwrap();
//! assert_eq!(entry, "_acme-challenge");
//! ```

use async_trait::async_trait;
use kube::Client;
use std::sync::Arc;
use tracing::{debug, info};

use crate::challenge::ChallengeRequest;
use crate::constants::{CHALLENGE_RECORD_TTL_SECS, SOLVER_NAME};
use crate::errors::SolverError;
use crate::provider_config::ProviderConfig;
use crate::sakuracloud::{Credentials, DnsRecord, DnsZone, ZoneClient, ZoneClientFactory};
use crate::secrets::{KubeSecretStore, SecretStore};

/// Capability set cert-manager requires from a DNS-01 solver.
///
/// The webhook server routes each challenge to the solver whose [`Solver::name`]
/// matches the `solverName` configured on the issuer.
#[async_trait]
pub trait Solver: Send + Sync {
    /// Name used to route challenges to this solver.
    fn name(&self) -> &str;

    /// Prepare the solver once at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if required clients cannot be constructed; startup
    /// must not continue in that case.
    async fn initialize(&mut self, kube_config: kube::Config) -> Result<(), SolverError>;

    /// Make the challenge record visible. Must tolerate repeated calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be presented.
    async fn present(&self, challenge: &ChallengeRequest) -> Result<(), SolverError>;

    /// Remove the challenge record. Must tolerate the record being absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be removed.
    async fn cleanup(&self, challenge: &ChallengeRequest) -> Result<(), SolverError>;
}

/// Compute the record name relative to the SakuraCloud zone.
///
/// `zone_name` is normalized to end with a dot. `resolved_zone` must end with
/// the normalized name, and the entry is `resolved_fqdn` with `"." + zone_name`
/// removed from its end.
///
/// # Errors
///
/// Returns [`SolverError::InvalidZone`] if `resolved_zone` is not the configured
/// zone, or [`SolverError::InvalidFqdn`] if `resolved_fqdn` is not below it.
pub fn record_entry(
    resolved_zone: &str,
    resolved_fqdn: &str,
    zone_name: &str,
) -> Result<String, SolverError> {
    let zone_name = if zone_name.ends_with('.') {
        zone_name.to_string()
    } else {
        format!("{zone_name}.")
    };

    if !resolved_zone.ends_with(&zone_name) {
        return Err(SolverError::InvalidZone {
            resolved_zone: resolved_zone.to_string(),
            zone_name,
        });
    }

    resolved_fqdn
        .strip_suffix(&format!(".{zone_name}"))
        .map(str::to_string)
        .ok_or_else(|| SolverError::InvalidFqdn {
            resolved_fqdn: resolved_fqdn.to_string(),
            zone_name,
        })
}

/// Set the TXT record named `entry` to `value`, appending it if absent.
///
/// Only the first matching record is rewritten. Returns `true` if an existing
/// record was updated in place.
pub fn upsert_txt_record(records: &mut Vec<DnsRecord>, entry: &str, value: &str) -> bool {
    if let Some(existing) = records.iter_mut().find(|r| r.is_txt_named(entry)) {
        existing.rdata = value.to_string();
        return true;
    }

    records.push(DnsRecord::txt(entry, value, CHALLENGE_RECORD_TTL_SECS));
    false
}

/// Remove every TXT record named `entry`. Returns the number removed.
pub fn remove_txt_records(records: &mut Vec<DnsRecord>, entry: &str) -> usize {
    let before = records.len();
    records.retain(|r| !r.is_txt_named(entry));
    before - records.len()
}

/// Solver presenting challenges through the SakuraCloud IaaS API.
pub struct SakuraCloudSolver {
    secrets: Option<Arc<dyn SecretStore>>,
    zones: Arc<dyn ZoneClientFactory>,
}

impl SakuraCloudSolver {
    /// Create an uninitialized solver using `zones` to reach SakuraCloud.
    #[must_use]
    pub fn new(zones: Arc<dyn ZoneClientFactory>) -> Self {
        Self {
            secrets: None,
            zones,
        }
    }

    /// Use `secrets` instead of building a Kubernetes-backed store in `initialize`.
    #[must_use]
    pub fn with_secret_store(mut self, secrets: Arc<dyn SecretStore>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    async fn zone_client(
        &self,
        config: &ProviderConfig,
        namespace: &str,
    ) -> Result<Box<dyn ZoneClient>, SolverError> {
        let secrets = self
            .secrets
            .as_ref()
            .ok_or_else(|| SolverError::NotInitialized(SOLVER_NAME.to_string()))?;

        let access_token = secrets
            .secret_value(namespace, &config.access_token_ref)
            .await?;
        let access_token_secret = secrets
            .secret_value(namespace, &config.access_token_secret_ref)
            .await?;

        self.zones
            .zone_client(Credentials::new(access_token, access_token_secret))
    }

    /// Steps shared by `present` and `cleanup`: decode, authenticate, read, locate.
    async fn load(
        &self,
        challenge: &ChallengeRequest,
    ) -> Result<(Box<dyn ZoneClient>, DnsZone, String), SolverError> {
        let config = ProviderConfig::from_json(challenge.config.as_ref())?;
        let client = self
            .zone_client(&config, &challenge.resource_namespace)
            .await?;

        let zone = client
            .read_zone(config.zone_id)
            .await
            .map_err(|source| {
                if source.is_not_found() {
                    SolverError::ZoneNotFound {
                        zone_id: config.zone_id,
                    }
                } else {
                    SolverError::ZoneRead {
                        zone_id: config.zone_id,
                        source,
                    }
                }
            })?;

        let entry = record_entry(
            &challenge.resolved_zone,
            &challenge.resolved_fqdn,
            &zone.name,
        )?;

        Ok((client, zone, entry))
    }
}

#[async_trait]
impl Solver for SakuraCloudSolver {
    fn name(&self) -> &str {
        SOLVER_NAME
    }

    async fn initialize(&mut self, kube_config: kube::Config) -> Result<(), SolverError> {
        if self.secrets.is_some() {
            return Ok(());
        }

        let client = Client::try_from(kube_config).map_err(SolverError::KubeClient)?;
        self.secrets = Some(Arc::new(KubeSecretStore::new(client)));
        debug!(solver = SOLVER_NAME, "Solver initialized with Kubernetes secret store");
        Ok(())
    }

    async fn present(&self, challenge: &ChallengeRequest) -> Result<(), SolverError> {
        let (client, zone, entry) = self.load(challenge).await?;
        debug!(entry = %entry, zone = %zone.name, "present");

        let mut records = zone.records;
        let updated = upsert_txt_record(&mut records, &entry, &challenge.key);

        client
            .update_records(zone.id, &records, &zone.settings_hash)
            .await
            .map_err(|source| SolverError::ProviderUpdate {
                zone_id: zone.id,
                source,
            })?;

        info!(
            entry = %entry,
            zone = %zone.name,
            updated_existing = updated,
            "Presented challenge TXT record"
        );
        Ok(())
    }

    async fn cleanup(&self, challenge: &ChallengeRequest) -> Result<(), SolverError> {
        let (client, zone, entry) = self.load(challenge).await?;

        let mut records = zone.records;
        let removed = remove_txt_records(&mut records, &entry);
        if removed == 0 {
            debug!(entry = %entry, zone = %zone.name, "No challenge record to clean up");
            return Ok(());
        }

        debug!(entry = %entry, zone = %zone.name, removed = removed, "cleanup");
        client
            .update_records(zone.id, &records, &zone.settings_hash)
            .await
            .map_err(|source| SolverError::ProviderUpdate {
                zone_id: zone.id,
                source,
            })?;

        info!(
            entry = %entry,
            zone = %zone.name,
            removed = removed,
            "Cleaned up challenge TXT record"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "solver_tests.rs"]
mod solver_tests;

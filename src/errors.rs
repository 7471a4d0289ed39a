// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for challenge solving.
//!
//! This module provides specialized error types for:
//! - Decoding the per-issuer solver configuration
//! - Resolving SakuraCloud credentials from Kubernetes secrets
//! - Mapping a challenge FQDN onto a record inside a SakuraCloud zone
//! - SakuraCloud API failures while reading or updating a zone
//!
//! Every error is reported back to cert-manager as a failed challenge response;
//! cert-manager owns retry and backoff.

use thiserror::Error;

/// Errors returned by the SakuraCloud API client.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The HTTP request could not be sent or the response could not be read
    #[error("SakuraCloud API request to {url} failed: {source}")]
    Http {
        /// Request URL
        url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status code
    ///
    /// `code` and `message` are taken from the `error_code` and `error_msg`
    /// fields of the API error body when present.
    #[error("SakuraCloud API returned HTTP {status} ({code}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// SakuraCloud error code (e.g. `not_found`)
        code: String,
        /// Human readable error message
        message: String,
    },

    /// The response body did not match the expected schema
    #[error("Failed to decode SakuraCloud API response: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build SakuraCloud HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ProviderError {
    /// Returns `true` if the API reported that the requested resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

/// Errors that can occur while presenting or cleaning up a challenge record.
#[derive(Error, Debug)]
pub enum SolverError {
    /// The solver configuration attached to the issuer could not be decoded
    #[error("error decoding solver config: {0}")]
    ConfigDecode(String),

    /// The referenced Kubernetes secret does not exist
    #[error("secret '{name}' not found in namespace '{namespace}'")]
    SecretNotFound {
        /// Namespace the lookup ran in
        namespace: String,
        /// Secret name
        name: String,
    },

    /// The referenced key is missing from the secret's data
    #[error("key '{key}' not found in secret '{namespace}/{name}'")]
    SecretKeyNotFound {
        /// Namespace the lookup ran in
        namespace: String,
        /// Secret name
        name: String,
        /// Data key that was requested
        key: String,
    },

    /// The Kubernetes API failed while reading a secret
    #[error("failed to read secret '{namespace}/{name}': {source}")]
    SecretStore {
        /// Namespace the lookup ran in
        namespace: String,
        /// Secret name
        name: String,
        /// Kubernetes client error
        #[source]
        source: kube::Error,
    },

    /// The Kubernetes client could not be constructed
    #[error("failed to build Kubernetes client: {0}")]
    KubeClient(#[source] kube::Error),

    /// A challenge arrived before `initialize` built the secret store
    #[error("solver '{0}' has not been initialized")]
    NotInitialized(String),

    /// The configured zone does not exist or is not visible to the credentials
    #[error("DNS zone {zone_id} not found")]
    ZoneNotFound {
        /// Configured zone ID
        zone_id: i64,
    },

    /// The zone could not be read from SakuraCloud
    #[error("failed to read DNS zone {zone_id}: {source}")]
    ZoneRead {
        /// Configured zone ID
        zone_id: i64,
        /// Provider error
        #[source]
        source: ProviderError,
    },

    /// The challenge's resolved zone is not the configured SakuraCloud zone
    #[error("invalid zone, resolvedZone: {resolved_zone}, zoneName: {zone_name}")]
    InvalidZone {
        /// Zone resolved by cert-manager
        resolved_zone: String,
        /// Dot-terminated SakuraCloud zone name
        zone_name: String,
    },

    /// The challenge FQDN does not lie below the configured SakuraCloud zone
    #[error("invalid fqdn, resolvedFQDN: {resolved_fqdn}, zoneName: {zone_name}")]
    InvalidFqdn {
        /// FQDN resolved by cert-manager
        resolved_fqdn: String,
        /// Dot-terminated SakuraCloud zone name
        zone_name: String,
    },

    /// Submitting the updated record list failed
    #[error("failed to update DNS zone {zone_id}: {source}")]
    ProviderUpdate {
        /// Zone ID being updated
        zone_id: i64,
        /// Provider error
        #[source]
        source: ProviderError,
    },

}

impl SolverError {
    /// Short machine-readable category, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigDecode(_) => "config_decode",
            Self::SecretNotFound { .. } => "secret_not_found",
            Self::SecretKeyNotFound { .. } => "secret_key_not_found",
            Self::SecretStore { .. } | Self::KubeClient(_) => "secret_store",
            Self::NotInitialized(_) => "not_initialized",
            Self::ZoneNotFound { .. } => "zone_not_found",
            Self::ZoneRead { .. } => "zone_read",
            Self::InvalidZone { .. } => "invalid_zone",
            Self::InvalidFqdn { .. } => "invalid_fqdn",
            Self::ProviderUpdate { .. } => "provider_update",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;

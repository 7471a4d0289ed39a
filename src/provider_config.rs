// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-issuer solver configuration.
//!
//! Users set this in `issuer.spec.acme.solvers[].dns01.webhook.config`:
//!
//! ```yaml
//! config:
//!   zoneID: 112900000001
//!   accessTokenRef:
//!     name: sakuracloud-credentials
//!     key: access-token
//!   accessTokenSecretRef:
//!     name: sakuracloud-credentials
//!     key: access-token-secret
//! ```
//!
//! Credentials are never placed in the config itself; only references to a
//! Secret in the challenge's resource namespace.

use serde::{Deserialize, Serialize};

use crate::errors::SolverError;

/// Reference to a single key inside a namespaced Secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,

    /// Key inside the secret's `data`
    #[serde(default)]
    pub key: String,
}

/// Decoded solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProviderConfig {
    /// Numeric SakuraCloud resource ID of the DNS zone
    #[serde(rename = "zoneID")]
    pub zone_id: i64,

    /// Secret key holding the API access token
    pub access_token_ref: SecretKeySelector,

    /// Secret key holding the API access token secret
    pub access_token_secret_ref: SecretKeySelector,
}

impl ProviderConfig {
    /// Decode the raw issuer config attached to a challenge.
    ///
    /// A missing (or `null`) config yields the zero-value config so that the
    /// failure surfaces at secret resolution, matching how cert-manager treats
    /// solvers without configuration. A present config must match the schema
    /// exactly: unknown fields and missing required fields are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::ConfigDecode`] if the JSON does not match the schema.
    pub fn from_json(raw: Option<&serde_json::Value>) -> Result<Self, SolverError> {
        let Some(raw) = raw.filter(|value| !value.is_null()) else {
            return Ok(Self::default());
        };

        let config =
            Self::deserialize(raw).map_err(|e| SolverError::ConfigDecode(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check semantic constraints the JSON schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::ConfigDecode`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.zone_id <= 0 {
            return Err(SolverError::ConfigDecode(format!(
                "zoneID must be a positive integer, got {}",
                self.zone_id
            )));
        }

        for (field, selector) in [
            ("accessTokenRef", &self.access_token_ref),
            ("accessTokenSecretRef", &self.access_token_secret_ref),
        ] {
            if selector.name.trim().is_empty() {
                return Err(SolverError::ConfigDecode(format!(
                    "{field}.name must not be empty"
                )));
            }
            if selector.key.trim().is_empty() {
                return Err(SolverError::ConfigDecode(format!(
                    "{field}.key must not be empty"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "provider_config_tests.rs"]
mod provider_config_tests;

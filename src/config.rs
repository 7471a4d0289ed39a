// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Process startup configuration.
//!
//! Every setting can be given as a flag or through the environment. The only
//! required setting is the API group the webhook is registered under:
//!
//! ```text
//! GROUP_NAME=acme.example.com sakuracloud-dns-webhook \
//!     --tls-cert-file /tls/tls.crt --tls-private-key-file /tls/tls.key
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::constants::{
    DEFAULT_LISTEN_ADDR, DEFAULT_SAKURACLOUD_API_ROOT_URL, DEFAULT_SAKURACLOUD_TIMEOUT_SECS,
    GROUP_NAME_ENV,
};

/// Invalid startup configuration. Always fatal.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `GROUP_NAME` is empty
    #[error("GROUP_NAME must be specified")]
    MissingGroupName,

    /// Only one of the TLS certificate and private key files was given
    #[error("TLS certificate and private key must be configured together")]
    IncompleteTls,

    /// The SakuraCloud API root is not an absolute http(s) URL
    #[error("invalid SakuraCloud API root URL '{url}': {reason}")]
    InvalidApiRoot {
        /// Configured value
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// `SAKURACLOUD_TIMEOUT_SECS` is zero
    #[error("SakuraCloud request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Startup configuration for the webhook server.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "sakuracloud-dns-webhook", version, about)]
pub struct StartupConfig {
    /// API group the webhook is registered under (e.g. `acme.example.com`)
    #[arg(long, env = GROUP_NAME_ENV)]
    pub group_name: String,

    /// Address the webhook listens on
    #[arg(long, env = "WEBHOOK_LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: SocketAddr,

    /// PEM certificate chain served to the API aggregation layer
    #[arg(long, env = "WEBHOOK_TLS_CERT_FILE")]
    pub tls_cert_file: Option<PathBuf>,

    /// PEM private key matching `--tls-cert-file`
    #[arg(long, env = "WEBHOOK_TLS_KEY_FILE")]
    pub tls_private_key_file: Option<PathBuf>,

    /// Root URL of the SakuraCloud IaaS API
    #[arg(long, env = "SAKURACLOUD_API_ROOT_URL", default_value = DEFAULT_SAKURACLOUD_API_ROOT_URL)]
    pub sakuracloud_api_root: String,

    /// Per-request timeout for SakuraCloud API calls, in seconds
    #[arg(long, env = "SAKURACLOUD_TIMEOUT_SECS", default_value_t = DEFAULT_SAKURACLOUD_TIMEOUT_SECS)]
    pub sakuracloud_timeout_secs: u64,
}

impl StartupConfig {
    /// Validate settings clap cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_name.trim().is_empty() {
            return Err(ConfigError::MissingGroupName);
        }

        if self.tls_cert_file.is_some() != self.tls_private_key_file.is_some() {
            return Err(ConfigError::IncompleteTls);
        }

        let root = Url::parse(&self.sakuracloud_api_root).map_err(|e| {
            ConfigError::InvalidApiRoot {
                url: self.sakuracloud_api_root.clone(),
                reason: e.to_string(),
            }
        })?;
        if !matches!(root.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiRoot {
                url: self.sakuracloud_api_root.clone(),
                reason: format!("unsupported scheme '{}'", root.scheme()),
            });
        }

        if self.sakuracloud_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    /// Returns `(cert, key)` when TLS is configured.
    #[must_use]
    pub fn tls_files(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.tls_cert_file.as_ref().zip(self.tls_private_key_file.as_ref())
    }

    /// Per-request timeout for SakuraCloud API calls.
    #[must_use]
    pub fn sakuracloud_timeout(&self) -> Duration {
        Duration::from_secs(self.sakuracloud_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

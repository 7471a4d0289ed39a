// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # SakuraCloud DNS webhook for cert-manager
//!
//! A cert-manager DNS-01 webhook solver that proves domain ownership by
//! creating and removing `_acme-challenge` TXT records in SakuraCloud DNS.
//!
//! ## Overview
//!
//! cert-manager sends each DNS-01 challenge to the webhook as a
//! `ChallengePayload`. The solver:
//!
//! - Decodes the issuer's solver configuration (zone ID and secret references)
//! - Resolves the SakuraCloud API credentials from Kubernetes secrets
//! - Reads the zone, computes the record name relative to it
//! - Adds, updates or removes the TXT record and writes the record list back
//!
//! ## Modules
//!
//! - [`solver`] - The [`solver::Solver`] contract and the SakuraCloud implementation
//! - [`sakuracloud`] - SakuraCloud IaaS API client and DNS data model
//! - [`secrets`] - Credential lookup from Kubernetes secrets
//! - [`provider_config`] - Per-issuer solver configuration
//! - [`challenge`] - cert-manager webhook wire types
//! - [`server`] - HTTPS server speaking the webhook protocol
//! - [`config`] - Process startup configuration
//!
//! ## Example
//!
//! ```rust
//! use sakuracloud_dns_webhook::provider_config::ProviderConfig;
//! use serde_json::json;
//!
//! let raw = json!({
//!     "zoneID": 112900000001_i64,
//!     "accessTokenRef": { "name": "sakuracloud", "key": "access-token" },
//!     "accessTokenSecretRef": { "name": "sakuracloud", "key": "access-token-secret" }
//! });
//!
//! let config = ProviderConfig::from_json(Some(&raw)).unwrap();
//! assert_eq!(config.zone_id, 112900000001);
//! ```

pub mod challenge;
pub mod config;
pub mod constants;
pub mod errors;
pub mod metrics;
pub mod provider_config;
pub mod sakuracloud;
pub mod secrets;
pub mod server;
pub mod solver;
pub mod tls;

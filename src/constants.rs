// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the SakuraCloud DNS webhook.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Webhook API Constants
// ============================================================================

/// Version of the aggregated webhook API served under the configured group
pub const WEBHOOK_API_VERSION: &str = "v1alpha1";

/// Kind of the object exchanged between cert-manager and the webhook
pub const KIND_CHALLENGE_PAYLOAD: &str = "ChallengePayload";

/// Name under which the SakuraCloud solver is registered
///
/// Issuers reference this value in `spec.acme.solvers[].dns01.webhook.solverName`.
pub const SOLVER_NAME: &str = "sakuracloud-dns-solver";

/// Environment variable holding the API group used for webhook registration
pub const GROUP_NAME_ENV: &str = "GROUP_NAME";

// ============================================================================
// DNS Constants
// ============================================================================

/// TTL applied to challenge TXT records (1 minute)
pub const CHALLENGE_RECORD_TTL_SECS: u32 = 60;

// ============================================================================
// SakuraCloud API Constants
// ============================================================================

/// Default root URL of the SakuraCloud IaaS API
pub const DEFAULT_SAKURACLOUD_API_ROOT_URL: &str = "https://secure.sakura.ad.jp/cloud/zone";

/// Zone used for global resources such as DNS zones
pub const SAKURACLOUD_GLOBAL_ZONE: &str = "is1a";

/// Path of the IaaS API below the zone segment
pub const SAKURACLOUD_API_PATH: &str = "api/cloud/1.1";

/// Default timeout for a single SakuraCloud API request
pub const DEFAULT_SAKURACLOUD_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Server Constants
// ============================================================================

/// Default listen address for the webhook HTTPS server
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:443";

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the SakuraCloud DNS webhook.
//!
//! This module provides metrics collection with the namespace prefix
//! `sakuracloud_dns_solver_`.
//!
//! # Metrics Categories
//!
//! - **Challenge Metrics** - Track Present/CleanUp calls and their outcomes
//! - **Provider Metrics** - Track SakuraCloud API requests
//!
//! # Example
//!
//! ```rust,no_run
//! use sakuracloud_dns_webhook::metrics::{gather_metrics, record_challenge};
//!
//! record_challenge("present", true, std::time::Duration::from_millis(250));
//! let text = gather_metrics().unwrap();
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all webhook metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "sakuracloud_dns_solver";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Challenge Metrics
// ============================================================================

/// Total number of challenges handled by action and status
///
/// Labels:
/// - `action`: `present`, `cleanup` or `unknown`
/// - `status`: Outcome (`success`, `error`)
pub static CHALLENGES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_challenges_total"),
        "Total number of challenges handled by action and status",
    );
    let counter = CounterVec::new(opts, &["action", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of challenge handling in seconds
///
/// Labels:
/// - `action`: `present`, `cleanup` or `unknown`
pub static CHALLENGE_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_challenge_duration_seconds"),
        "Duration of challenge handling in seconds by action",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["action"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Provider Metrics
// ============================================================================

/// Total number of SakuraCloud API requests
///
/// Labels:
/// - `operation`: `read_zone` or `update_zone`
/// - `status`: Outcome (`success`, `error`)
pub static PROVIDER_REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_provider_requests_total"),
        "Total number of SakuraCloud API requests by operation and status",
    );
    let counter = CounterVec::new(opts, &["operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

fn status_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

/// Record a handled challenge
///
/// # Arguments
/// * `action` - Challenge action label
/// * `success` - Whether the solver succeeded
/// * `duration` - Time spent solving
pub fn record_challenge(action: &str, success: bool, duration: Duration) {
    CHALLENGES_TOTAL
        .with_label_values(&[action, status_label(success)])
        .inc();
    CHALLENGE_DURATION_SECONDS
        .with_label_values(&[action])
        .observe(duration.as_secs_f64());
}

/// Record a SakuraCloud API request
///
/// # Arguments
/// * `operation` - API operation label
/// * `success` - Whether the request succeeded
pub fn record_provider_request(operation: &str, success: bool) {
    PROVIDER_REQUESTS_TOTAL
        .with_label_values(&[operation, status_label(success)])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

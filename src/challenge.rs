// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wire types of the cert-manager DNS-01 webhook protocol.
//!
//! cert-manager talks to external solvers through the Kubernetes API aggregation
//! layer. Each challenge is `POST`ed as a `ChallengePayload` carrying a
//! [`ChallengeRequest`]; the webhook answers with the same payload carrying a
//! [`ChallengeResponse`].
//!
//! # Example
//!
//! ```json
//! {
//!   "apiVersion": "acme.example.com/v1alpha1",
//!   "kind": "ChallengePayload",
//!   "request": {
//!     "uid": "5b1c1a0e-...",
//!     "action": "Present",
//!     "type": "dns-01",
//!     "dnsName": "example.com",
//!     "key": "token-value",
//!     "resourceNamespace": "cert-manager",
//!     "resolvedFQDN": "_acme-challenge.example.com.",
//!     "resolvedZone": "example.com.",
//!     "config": { "zoneID": 112900000001 }
//!   }
//! }
//! ```

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use serde::{Deserialize, Serialize};

use crate::constants::KIND_CHALLENGE_PAYLOAD;

/// Action cert-manager asks the solver to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChallengeAction {
    /// Create the challenge TXT record
    Present,
    /// Remove the challenge TXT record
    CleanUp,
    /// Any action this webhook does not understand
    #[default]
    #[serde(other)]
    Unknown,
}

impl ChallengeAction {
    /// Lowercase label used in logs and metrics.
    #[must_use]
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::CleanUp => "cleanup",
            Self::Unknown => "unknown",
        }
    }
}

/// A single challenge handed to a solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeRequest {
    /// Identifier echoed back in the response
    pub uid: String,

    /// Requested action
    pub action: ChallengeAction,

    /// Challenge type, always `dns-01` for this webhook
    #[serde(rename = "type")]
    pub challenge_type: String,

    /// Domain being validated, without the `_acme-challenge` prefix
    pub dns_name: String,

    /// Value the TXT record must carry
    pub key: String,

    /// Namespace in which secret references are resolved
    pub resource_namespace: String,

    /// Fully qualified, dot-terminated record name (e.g. `_acme-challenge.example.com.`)
    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,

    /// Authoritative zone cert-manager resolved for the FQDN (e.g. `example.com.`)
    pub resolved_zone: String,

    /// Whether ambient credentials may be used (ignored by this solver)
    pub allow_ambient_credentials: bool,

    /// Solver configuration copied verbatim from the issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

/// Outcome of a challenge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeResponse {
    /// Identifier of the request this response answers
    pub uid: String,

    /// Whether the action succeeded
    pub success: bool,

    /// Failure details when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl ChallengeResponse {
    /// Successful response for the given request.
    #[must_use]
    pub fn success(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            success: true,
            status: None,
        }
    }

    /// Failed response carrying `message` in a `Failure` status.
    #[must_use]
    pub fn failure(uid: &str, message: impl Into<String>) -> Self {
        Self {
            uid: uid.to_string(),
            success: false,
            status: Some(Status {
                status: Some("Failure".to_string()),
                message: Some(message.into()),
                reason: Some("InternalError".to_string()),
                code: Some(500),
                ..Status::default()
            }),
        }
    }
}

/// Envelope exchanged with cert-manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    /// `<group>/v1alpha1`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    /// Always `ChallengePayload`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// Challenge to solve
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,

    /// Result of solving `request`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

impl ChallengePayload {
    /// Build the reply to `self`, defaulting type metadata from `api_version`.
    #[must_use]
    pub fn into_reply(self, api_version: &str, response: ChallengeResponse) -> Self {
        Self {
            api_version: if self.api_version.is_empty() {
                api_version.to_string()
            } else {
                self.api_version
            },
            kind: KIND_CHALLENGE_PAYLOAD.to_string(),
            request: self.request,
            response: Some(response),
        }
    }
}

#[cfg(test)]
#[path = "challenge_tests.rs"]
mod challenge_tests;

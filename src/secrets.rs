// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Credential lookup from Kubernetes secrets.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tracing::debug;

use crate::errors::SolverError;
use crate::provider_config::SecretKeySelector;

/// Resolves a single key of a namespaced secret.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Return the value stored under `selector.key` in secret `selector.name`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::SecretNotFound`] if the secret does not exist and
    /// [`SolverError::SecretKeyNotFound`] if the key is missing from its data.
    async fn secret_value(
        &self,
        namespace: &str,
        selector: &SecretKeySelector,
    ) -> Result<String, SolverError>;
}

/// [`SecretStore`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    /// Read secrets through `client`.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn secret_value(
        &self,
        namespace: &str,
        selector: &SecretKeySelector,
    ) -> Result<String, SolverError> {
        let secret_api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        debug!(
            namespace = %namespace,
            secret = %selector.name,
            key = %selector.key,
            "Reading credential from secret"
        );

        let secret = secret_api
            .get_opt(&selector.name)
            .await
            .map_err(|source| SolverError::SecretStore {
                namespace: namespace.to_string(),
                name: selector.name.clone(),
                source,
            })?
            .ok_or_else(|| SolverError::SecretNotFound {
                namespace: namespace.to_string(),
                name: selector.name.clone(),
            })?;

        secret
            .data
            .as_ref()
            .and_then(|data| data.get(&selector.key))
            .map(|value| String::from_utf8_lossy(&value.0).into_owned())
            .ok_or_else(|| SolverError::SecretKeyNotFound {
                namespace: namespace.to_string(),
                name: selector.name.clone(),
                key: selector.key.clone(),
            })
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod secrets_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Webhook HTTP server.
//!
//! cert-manager reaches the webhook through the Kubernetes API aggregation
//! layer, which registers it as an extension API server for
//! `<group>/v1alpha1`. This module serves the small part of that API the
//! aggregation layer and cert-manager need:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `POST` | `/apis/{group}/v1alpha1/{solver}` | Present / CleanUp a challenge |
//! | `GET` | `/apis`, `/apis/{group}`, `/apis/{group}/v1alpha1` | API discovery |
//! | `GET` | `/healthz`, `/readyz`, `/livez` | Probes |
//! | `GET` | `/metrics` | Prometheus metrics |

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::challenge::{ChallengeAction, ChallengePayload, ChallengeResponse};
use crate::config::StartupConfig;
use crate::constants::{KIND_CHALLENGE_PAYLOAD, METRICS_SERVER_PATH, WEBHOOK_API_VERSION};
use crate::metrics::{gather_metrics, record_challenge};
use crate::solver::Solver;
use crate::tls::{load_server_config, TlsListener};

/// Shared state of the webhook router.
#[derive(Clone)]
pub struct WebhookState {
    group_name: Arc<str>,
    solvers: Arc<BTreeMap<String, Arc<dyn Solver>>>,
}

impl WebhookState {
    /// Build state routing challenges for `group_name` to `solvers` by name.
    ///
    /// # Errors
    ///
    /// Returns an error if two solvers share a name.
    pub fn new(group_name: &str, solvers: Vec<Arc<dyn Solver>>) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for solver in solvers {
            let name = solver.name().to_string();
            if by_name.insert(name.clone(), solver).is_some() {
                anyhow::bail!("Solver name '{name}' registered more than once");
            }
        }

        Ok(Self {
            group_name: Arc::from(group_name),
            solvers: Arc::new(by_name),
        })
    }

    fn group_version(&self) -> String {
        format!("{}/{WEBHOOK_API_VERSION}", self.group_name)
    }
}

/// Build the webhook router.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/apis", get(api_group_list))
        .route("/apis/{group}", get(api_group))
        .route("/apis/{group}/v1alpha1", get(api_resource_list))
        .route("/apis/{group}/v1alpha1/{solver}", post(solve_challenge))
        .route("/healthz", get(health))
        .route("/readyz", get(health))
        .route("/livez", get(health))
        .route(METRICS_SERVER_PATH, get(metrics))
        .with_state(state)
}

/// Initialize `solvers` and serve the webhook until SIGTERM/SIGINT.
///
/// This is the process entry point's only dependency: it validates nothing
/// itself, so `config` must already have passed [`StartupConfig::validate`].
///
/// # Errors
///
/// Returns an error if a solver fails to initialize, TLS material cannot be
/// loaded, or the listener cannot be bound. All are fatal at startup.
pub async fn run_webhook_server(
    config: StartupConfig,
    solvers: Vec<Box<dyn Solver>>,
) -> Result<()> {
    let kube_config = kube::Config::infer()
        .await
        .context("Failed to load Kubernetes client configuration")?;

    let mut initialized: Vec<Arc<dyn Solver>> = Vec::with_capacity(solvers.len());
    for mut solver in solvers {
        solver
            .initialize(kube_config.clone())
            .await
            .with_context(|| format!("Failed to initialize solver '{}'", solver.name()))?;
        info!(solver = solver.name(), "Registered DNS-01 solver");
        initialized.push(Arc::from(solver));
    }

    let state = WebhookState::new(&config.group_name, initialized)?;
    let app = router(state);

    let tcp = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    match config.tls_files() {
        Some((cert, key)) => {
            let tls = load_server_config(cert, key)?;
            let listener =
                TlsListener::new(tcp, tls).context("Failed to start TLS listener")?;
            info!(
                listen = %config.listen,
                group = %config.group_name,
                "Serving webhook over HTTPS"
            );
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Webhook server failed")?;
        }
        None => {
            warn!(
                listen = %config.listen,
                group = %config.group_name,
                "No TLS certificate configured, serving webhook over plain HTTP"
            );
            serve(tcp, app, shutdown_signal()).await?;
        }
    }

    info!("Webhook server stopped");
    Ok(())
}

/// Serve `app` over plain HTTP on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Webhook server failed")
}

/// Resolves on SIGTERM (Unix) or Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn solve_challenge(
    State(state): State<WebhookState>,
    Path((group, solver_name)): Path<(String, String)>,
    Json(payload): Json<ChallengePayload>,
) -> Result<Json<ChallengePayload>, (StatusCode, String)> {
    if group != *state.group_name {
        return Err((StatusCode::NOT_FOUND, format!("unknown API group '{group}'")));
    }

    let solver = state.solvers.get(&solver_name).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("no solver named '{solver_name}' is registered"),
        )
    })?;

    let request = payload.request.clone().ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "ChallengePayload has no request".to_string(),
        )
    })?;

    debug!(
        uid = %request.uid,
        action = request.action.as_label(),
        solver = %solver_name,
        fqdn = %request.resolved_fqdn,
        "Received challenge"
    );

    let started = Instant::now();
    let result = match request.action {
        ChallengeAction::Present => solver.present(&request).await,
        ChallengeAction::CleanUp => solver.cleanup(&request).await,
        ChallengeAction::Unknown => {
            record_challenge(request.action.as_label(), false, started.elapsed());
            let response =
                ChallengeResponse::failure(&request.uid, "unsupported challenge action");
            return Ok(Json(payload.into_reply(&state.group_version(), response)));
        }
    };
    record_challenge(request.action.as_label(), result.is_ok(), started.elapsed());

    let response = match result {
        Ok(()) => {
            info!(
                uid = %request.uid,
                action = request.action.as_label(),
                fqdn = %request.resolved_fqdn,
                "Challenge action succeeded"
            );
            ChallengeResponse::success(&request.uid)
        }
        Err(e) => {
            error!(
                uid = %request.uid,
                action = request.action.as_label(),
                fqdn = %request.resolved_fqdn,
                kind = e.kind(),
                error = %e,
                "Challenge action failed"
            );
            ChallengeResponse::failure(&request.uid, e.to_string())
        }
    };

    Ok(Json(payload.into_reply(&state.group_version(), response)))
}

async fn api_group_list(State(state): State<WebhookState>) -> Json<Value> {
    Json(json!({
        "kind": "APIGroupList",
        "apiVersion": "v1",
        "groups": [api_group_document(&state)],
    }))
}

async fn api_group(
    State(state): State<WebhookState>,
    Path(group): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    if group != *state.group_name {
        return Err(StatusCode::NOT_FOUND);
    }

    let mut document = api_group_document(&state);
    document["kind"] = json!("APIGroup");
    document["apiVersion"] = json!("v1");
    Ok(Json(document))
}

async fn api_resource_list(
    State(state): State<WebhookState>,
    Path(group): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    if group != *state.group_name {
        return Err(StatusCode::NOT_FOUND);
    }

    let resources: Vec<Value> = state
        .solvers
        .keys()
        .map(|name| {
            json!({
                "name": name,
                "singularName": name,
                "namespaced": false,
                "kind": KIND_CHALLENGE_PAYLOAD,
                "verbs": ["create"],
            })
        })
        .collect();

    Ok(Json(json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": state.group_version(),
        "resources": resources,
    })))
}

fn api_group_document(state: &WebhookState) -> Value {
    let version = json!({
        "groupVersion": state.group_version(),
        "version": WEBHOOK_API_VERSION,
    });

    json!({
        "name": &*state.group_name,
        "versions": [version.clone()],
        "preferredVersion": version,
    })
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics() -> impl IntoResponse {
    match gather_metrics() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

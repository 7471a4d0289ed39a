// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TLS termination for the webhook server.
//!
//! The Kubernetes API aggregation layer only talks HTTPS to extension API
//! servers, so the webhook terminates TLS itself with the certificate mounted
//! into the pod (typically issued by cert-manager for the webhook service).

use anyhow::{Context, Result};
use axum::serve::Listener;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, warn};

/// Upper bound on a single handshake.
const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Completed handshakes buffered ahead of `accept`.
const HANDSHAKE_BACKLOG: usize = 128;

/// Build a rustls server configuration from PEM files.
///
/// # Errors
///
/// Returns an error if either file cannot be read or parsed, or if the key
/// does not match the certificate.
pub fn load_server_config(cert_file: &Path, key_file: &Path) -> Result<rustls::ServerConfig> {
    let certs = CertificateDer::pem_file_iter(cert_file)
        .with_context(|| format!("Failed to open TLS certificate {}", cert_file.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse TLS certificate {}", cert_file.display()))?;
    if certs.is_empty() {
        anyhow::bail!("No certificates found in {}", cert_file.display());
    }

    let key = PrivateKeyDer::from_pem_file(key_file)
        .with_context(|| format!("Failed to load TLS private key {}", key_file.display()))?;

    let mut config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .context("Failed to select TLS protocol versions")?
    .with_no_client_auth()
    .with_single_cert(certs, key)
    .context("TLS certificate and private key do not match")?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(config)
}

type Accepted = (TlsStream<TcpStream>, SocketAddr);

/// TCP listener handing TLS-terminated connections to axum.
///
/// A background task accepts TCP connections and runs each handshake in its
/// own task, so a peer that never finishes its handshake only holds up itself.
pub struct TlsListener {
    local_addr: SocketAddr,
    ready: mpsc::Receiver<Accepted>,
    accept_task: JoinHandle<()>,
}

impl TlsListener {
    /// Start accepting TLS connections on `inner`. Must run inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the local address of `inner` cannot be read.
    pub fn new(inner: TcpListener, config: rustls::ServerConfig) -> std::io::Result<Self> {
        let local_addr = inner.local_addr()?;
        let acceptor = TlsAcceptor::from(Arc::new(config));
        let (tx, ready) = mpsc::channel(HANDSHAKE_BACKLOG);

        Ok(Self {
            local_addr,
            ready,
            accept_task: tokio::spawn(accept_loop(inner, acceptor, tx)),
        })
    }
}

impl Drop for TlsListener {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    ready: mpsc::Sender<Accepted>,
) {
    while !ready.is_closed() {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                // Usually EMFILE; back off instead of spinning.
                warn!(error = %e, "Failed to accept TCP connection");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let ready = ready.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(TLS_HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                Ok(Ok(tls)) => {
                    if ready.send((tls, addr)).await.is_err() {
                        debug!(peer = %addr, "Listener closed before connection was served");
                    }
                }
                Ok(Err(e)) => debug!(peer = %addr, error = %e, "TLS handshake failed"),
                Err(_) => debug!(peer = %addr, "TLS handshake timed out"),
            }
        });
    }
}

impl Listener for TlsListener {
    type Io = TlsStream<TcpStream>;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        match self.ready.recv().await {
            Some(accepted) => accepted,
            // The accept loop only exits once this receiver is gone.
            None => std::future::pending().await,
        }
    }

    fn local_addr(&self) -> std::io::Result<Self::Addr> {
        Ok(self.local_addr)
    }
}

#[cfg(test)]
#[path = "tls_tests.rs"]
mod tls_tests;

//! API server lifecycle: binds a socket, serves `api_router()` in a
//! background task, and hands back a handle with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::router::api_router;
use crate::api::types::ApiLimits;
use crate::pipeline::evaluation::Evaluator;

// ═══════════════════════════════════════════════════════════
// Public types
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind API server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read bound address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Metadata for a running server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSession {
    pub session_id: String,
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running API server.
pub struct ServerHandle {
    pub session: ServerSession,
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The bound address (resolves port 0 to the actual port).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal graceful shutdown. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait until the server task has exited.
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            tracing::error!("API server task failed: {e}");
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Server lifecycle
// ═══════════════════════════════════════════════════════════

/// Bind `addr` and serve the API in a background tokio task.
pub async fn start_server_on(
    evaluator: Arc<Evaluator>,
    addr: SocketAddr,
    limits: ApiLimits,
) -> Result<ServerHandle, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    tracing::info!(%addr, "API server binding");

    let embedding_model = evaluator.embedding_model().to_string();
    let app = api_router(evaluator, limits);

    let session = ServerSession {
        session_id: Uuid::new_v4().to_string(),
        server_addr: addr.to_string(),
        port: addr.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, embedding_model, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ServerHandle {
        session,
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    use crate::pipeline::evaluation::HashingEmbedder;

    fn test_evaluator() -> Arc<Evaluator> {
        Arc::new(Evaluator::with_embedder(Arc::new(HashingEmbedder::default())))
    }

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let mut server = start_server_on(test_evaluator(), loopback(), ApiLimits::default())
            .await
            .expect("server should start");

        assert!(!server.session.session_id.is_empty());
        assert!(server.session.port > 0);

        let url = format!("http://127.0.0.1:{}/api/health", server.session.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert!(resp.status().is_success());
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");

        server.shutdown();
        server.stopped().await;
    }

    #[tokio::test]
    async fn evaluates_over_http() {
        let mut server = start_server_on(test_evaluator(), loopback(), ApiLimits::default())
            .await
            .expect("server should start");

        let url = format!("http://{}/api/evaluate", server.addr());
        let resp = reqwest::Client::new()
            .post(&url)
            .json(&serde_json::json!({
                "original": "No fracture is seen.",
                "simplified": "The bone is not broken."
            }))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["critical_terms_missing"], serde_json::json!(["fracture"]));

        server.shutdown();
        server.stopped().await;
    }

    #[tokio::test]
    async fn session_has_valid_metadata() {
        let mut server = start_server_on(test_evaluator(), loopback(), ApiLimits::default())
            .await
            .expect("server should start");

        assert!(!server.session.started_at.is_empty());
        assert!(server.session.server_addr.contains(':'));
        assert_eq!(server.addr().port(), server.session.port);

        server.shutdown();
    }

    #[tokio::test]
    async fn bind_conflict_is_error() {
        let mut first = start_server_on(test_evaluator(), loopback(), ApiLimits::default())
            .await
            .unwrap();
        let taken = first.addr();

        let second = start_server_on(test_evaluator(), taken, ApiLimits::default()).await;
        assert!(matches!(second, Err(ServerError::Bind { .. })));

        first.shutdown();
    }
}

//! HTTP/SSE server for the release-notes engine.
//!
//! ```text
//! +--------------------------------------------+
//! |  Axum HTTP Server                          |
//! |  /health (GET)             -> health check |
//! |  /api/release-notes (POST) -> SSE stream   |
//! +--------------------------------------------+
//!          |
//!          v
//! +--------------------------------------------+
//! |  Relevance filter -> orchestrator -> codec |
//! |  (one sequential producer per request)     |
//! +--------------------------------------------+
//! ```
//!
//! Start with `relnotes --serve --port 8787`.

mod handlers;
pub mod types;

pub use handlers::AppState;
pub use types::{ErrorResponse, GenerateRequest, HealthResponse};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Start the HTTP server.
///
/// # Arguments
///
/// * `port` - Port to listen on. Use 0 for a random available port.
/// * `state` - Shared generation and enrichment capabilities
///
/// # Returns
///
/// The actual bound address (useful when port=0) and a cancellation token
/// for graceful shutdown.
pub async fn start_server(
    port: u16,
    state: Arc<AppState>,
) -> anyhow::Result<(SocketAddr, CancellationToken)> {
    let shutdown_token = CancellationToken::new();
    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("HTTP server listening on {}", actual_addr);

    let server_shutdown = shutdown_token.clone();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(server_shutdown.cancelled_owned())
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_token))
}

/// Create the router with all routes configured.
///
/// This is separated from `start_server` to enable easier testing.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/release-notes", post(handlers::release_notes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::NoopEnricher;
    use crate::generate::ScriptedGenerator;

    fn test_state() -> Arc<AppState> {
        AppState::new(
            Arc::new(ScriptedGenerator::new(["x"])),
            Arc::new(NoopEnricher),
        )
    }

    #[tokio::test]
    async fn start_server_binds_to_port() {
        let (addr, shutdown) = start_server(0, test_state())
            .await
            .expect("Server should start");
        assert!(addr.port() > 0);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn start_server_returns_shutdown_token() {
        let (_, shutdown) = start_server(0, test_state())
            .await
            .expect("Server should start");
        assert!(!shutdown.is_cancelled());
        shutdown.cancel();
        assert!(shutdown.is_cancelled());
    }

    mod integration_tests {
        use super::*;
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        #[tokio::test]
        async fn health_endpoint_works() {
            let app = create_router(test_state());
            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/health")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), axum::http::StatusCode::OK);
        }

        #[tokio::test]
        async fn malformed_body_is_rejected_before_streaming() {
            let app = create_router(test_state());
            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/release-notes")
                        .header("content-type", "application/json")
                        .body(Body::from("{not json"))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert!(response.status().is_client_error());
        }
    }
}

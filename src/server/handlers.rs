//! HTTP request handlers.
//!
//! The release-notes handler validates and filters before the first byte of
//! the stream goes out; from then on every failure is an in-band error frame,
//! never an HTTP status.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

use super::types::{ErrorResponse, GenerateRequest, HealthResponse};
use crate::enrich::Enricher;
use crate::filter::{filter_relevant, FilterPolicy};
use crate::generate::{run_generation, NoteGenerator};
use crate::stream::frame::StreamFrame;

/// Frames buffered between the orchestrator and the SSE response. When the
/// buffer is full the orchestrator's send suspends, which is what throttles
/// generation to transport capacity.
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Application state shared across all handlers
pub struct AppState {
    /// Generation capability driving both note channels
    pub generator: Arc<dyn NoteGenerator>,
    /// Enrichment capability; failures degrade to empty payloads
    pub enricher: Arc<dyn Enricher>,
}

impl AppState {
    pub fn new(generator: Arc<dyn NoteGenerator>, enricher: Arc<dyn Enricher>) -> Arc<Self> {
        Arc::new(Self {
            generator,
            enricher,
        })
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Generate release notes and stream frames via SSE.
///
/// # Response
///
/// - `200 OK`: SSE stream of frames (`data: <json>` records)
/// - `400 Bad Request`: no items, unknown policy, or nothing relevant
///
/// Once streaming has started, errors arrive as in-band error frames.
pub async fn release_notes(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<ErrorResponse>)> {
    if req.items.is_empty() {
        return Err(bad_request("Request contains no items", "EMPTY_REQUEST"));
    }

    let policy_name = req.policy_name();
    let policy = FilterPolicy::preset(policy_name).ok_or_else(|| {
        bad_request(
            format!("Unknown filter policy '{policy_name}'"),
            "UNKNOWN_POLICY",
        )
    })?;

    let accepted = filter_relevant(&req.items, &policy);
    if accepted.is_empty() {
        return Err(bad_request(
            "No items passed the relevance filter",
            "NO_RELEVANT_ITEMS",
        ));
    }

    tracing::info!(
        "[server] Streaming notes for {}/{} item(s), policy={}",
        accepted.len(),
        req.items.len(),
        policy_name
    );

    let (tx, rx) = mpsc::channel::<StreamFrame>(FRAME_CHANNEL_CAPACITY);
    let generator = state.generator.clone();
    let enricher = state.enricher.clone();
    tokio::spawn(async move {
        // The error frame already went out in-band; the stream just ends.
        if let Err(err) = run_generation(accepted, generator, enricher, tx).await {
            tracing::warn!("[server] Note stream ended early: {}", err);
        }
    });

    let stream = ReceiverStream::new(rx)
        .filter_map(|frame| frame_to_sse(&frame))
        .map(Ok);

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

fn bad_request(
    message: impl Into<String>,
    code: &str,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::with_code(message, code)),
    )
}

/// Serialize one frame as an SSE event. Serialization of a frame cannot
/// normally fail; if it ever does, the frame is dropped and logged rather
/// than poisoning the stream.
fn frame_to_sse(frame: &StreamFrame) -> Option<Event> {
    match serde_json::to_string(frame) {
        Ok(json) => Some(Event::default().data(json)),
        Err(err) => {
            tracing::error!("[server] Dropping unserializable frame: {}", err);
            None
        }
    }
}

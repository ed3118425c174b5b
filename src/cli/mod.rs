//! Command-line interface: one-shot local generation, remote consumption,
//! and server mode.

pub mod args;
pub mod output;

pub use args::Args;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::enrich::{Enricher, GithubEnricher};
use crate::filter::{filter_relevant, FilterPolicy};
use crate::generate::{run_generation, AnthropicConfig, AnthropicGenerator, NoteGenerator};
use crate::model::DiffItem;
use crate::server::{self, AppState};
use crate::settings::{get_with_env_fallback, RelnotesSettings};
use crate::stream::codec::{Decoded, FrameDecoder};
use crate::stream::reducer::{Applied, NotesState};

/// Frames buffered between the orchestrator and the local consumer.
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Generate notes locally: filter, orchestrate, reduce, render.
pub async fn run_local(args: &Args, settings: &RelnotesSettings) -> Result<()> {
    let items = read_items(required_items(args)?)?;
    let policy = resolve_policy(args, settings)?;
    let generator = build_generator(args, settings)?;
    let enricher = build_enricher(settings);
    run_pipeline(items, &policy, generator, enricher, args.json).await
}

/// The local pipeline behind [`run_local`], with capabilities injected.
pub(crate) async fn run_pipeline(
    items: Vec<DiffItem>,
    policy: &FilterPolicy,
    generator: Arc<dyn NoteGenerator>,
    enricher: Arc<dyn Enricher>,
    json_mode: bool,
) -> Result<()> {
    let accepted = filter_relevant(&items, policy);
    anyhow::ensure!(!accepted.is_empty(), "No items passed the relevance filter");
    tracing::info!(
        "[cli] {}/{} item(s) accepted by the filter",
        accepted.len(),
        items.len()
    );

    let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
    let task = tokio::spawn(run_generation(accepted, generator, enricher, tx));

    let (state, fatal) = output::consume(rx, json_mode).await?;
    // The task result is already reflected by the error frame, if any.
    let _ = task.await?;

    output::render_notes(&state, json_mode)?;
    if let Some(message) = fatal {
        anyhow::bail!("{message}");
    }
    Ok(())
}

/// Consume a running server's stream and reconstruct the notes client-side.
pub async fn run_remote(args: &Args, url: &str) -> Result<()> {
    let items = read_items(required_items(args)?)?;
    let endpoint = format!("{}/api/release-notes", url.trim_end_matches('/'));
    let body = serde_json::json!({ "items": items, "policy": args.policy });

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Failed to reach {endpoint}"))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        anyhow::bail!("Server rejected the request ({status}): {text}");
    }

    let mut decoder = FrameDecoder::new();
    let mut state = NotesState::new();
    let mut fatal = None;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        for decoded in decoder.feed(&chunk?) {
            match decoded {
                Decoded::Frame(frame) => {
                    output::print_frame(&frame, args.json)?;
                    let (next, applied) = state.apply(frame);
                    state = next;
                    if let Applied::Fatal { message } = applied {
                        fatal = Some(message);
                    }
                }
                // Already logged and counted by the decoder.
                Decoded::Malformed { .. } => {}
            }
        }
    }
    if decoder.skipped() > 0 {
        tracing::warn!("[cli] Skipped {} malformed record(s)", decoder.skipped());
    }

    output::render_notes(&state, args.json)?;
    if let Some(message) = fatal {
        anyhow::bail!("{message}");
    }
    Ok(())
}

/// Run the HTTP server until interrupted.
pub async fn run_serve(args: &Args, settings: &RelnotesSettings) -> Result<()> {
    let generator = build_generator(args, settings)?;
    let enricher = build_enricher(settings);
    let state = AppState::new(generator, enricher);

    let port = args.port.unwrap_or(settings.server.port);
    let (addr, shutdown) = server::start_server(port, state).await?;
    println!("Listening on http://{addr}");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    shutdown.cancel();
    Ok(())
}

fn required_items(args: &Args) -> Result<&Path> {
    args.items
        .as_deref()
        .context("-f/--items <FILE> is required for this mode")
}

fn read_items(path: &Path) -> Result<Vec<DiffItem>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let items: Vec<DiffItem> =
        serde_json::from_str(&contents).context("Items file is not a JSON array of diff items")?;
    Ok(items)
}

fn resolve_policy(args: &Args, settings: &RelnotesSettings) -> Result<FilterPolicy> {
    let name = args
        .policy
        .as_deref()
        .unwrap_or(&settings.filter.default_policy);
    FilterPolicy::preset(name).with_context(|| format!("Unknown filter policy '{name}'"))
}

fn build_generator(args: &Args, settings: &RelnotesSettings) -> Result<Arc<dyn NoteGenerator>> {
    let api_key = args
        .api_key
        .clone()
        .or_else(|| get_with_env_fallback(&settings.generation.api_key, &["ANTHROPIC_API_KEY"], None))
        .context(
            "No API key: pass --api-key, set ANTHROPIC_API_KEY, or configure generation.api_key",
        )?;

    let mut config = AnthropicConfig::new(api_key);
    config.model = settings.generation.model.clone();
    config.max_tokens = settings.generation.max_tokens;
    config.temperature = settings.generation.temperature;
    Ok(Arc::new(AnthropicGenerator::new(config)))
}

fn build_enricher(settings: &RelnotesSettings) -> Arc<dyn Enricher> {
    let token = get_with_env_fallback(&settings.github.token, &["GITHUB_TOKEN"], None);
    Arc::new(GithubEnricher::new(token))
}

//! Sequential two-channel note generation.
//!
//! One item's pair of generation jobs fully completes before the next item
//! starts, and within an item the developer channel closes before the
//! marketing channel opens. The strict ordering lets the reconstruction side
//! get by without any PR-level completion index. Each channel costs one unit
//! of generation capacity, which is why items run sequentially instead of
//! fanning out.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;

use crate::enrich::Enricher;
use crate::error::{RelnotesError, Result};
use crate::generate::llm::NoteGenerator;
use crate::model::{Channel, DiffItem};
use crate::prompts::{developer_prompt, marketing_prompt, DEVELOPER_SYSTEM, MARKETING_SYSTEM};
use crate::stream::frame::StreamFrame;

/// Lifecycle of one item's generation jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPhase {
    PendingDeveloper,
    PendingMarketing,
    Complete,
    Failed,
}

impl ItemPhase {
    /// The channel to generate next, or `None` in a terminal phase.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            ItemPhase::PendingDeveloper => Some(Channel::Developer),
            ItemPhase::PendingMarketing => Some(Channel::Marketing),
            ItemPhase::Complete | ItemPhase::Failed => None,
        }
    }

    /// Next phase after the current channel's job succeeded.
    pub fn advance(self) -> Self {
        match self {
            ItemPhase::PendingDeveloper => ItemPhase::PendingMarketing,
            ItemPhase::PendingMarketing => ItemPhase::Complete,
            terminal => terminal,
        }
    }
}

/// Run the generation loop over the accepted items, writing frames to `tx`.
///
/// On the first failure one error frame naming the item is emitted and the
/// loop stops; remaining items are never started. `tx` is dropped on every
/// exit path, so the transport sees end-of-stream exactly once.
pub async fn run_generation(
    items: Vec<DiffItem>,
    generator: Arc<dyn NoteGenerator>,
    enricher: Arc<dyn Enricher>,
    tx: mpsc::Sender<StreamFrame>,
) -> Result<()> {
    tracing::info!(
        "[generate] Starting {} item(s) via {}",
        items.len(),
        generator.description()
    );

    for item in &items {
        if let Err(err) = generate_item(item, generator.as_ref(), enricher.as_ref(), &tx).await {
            tracing::error!("[generate] Item {} failed: {}", item.id, err);
            // The transport may already be gone; nothing more to do then.
            let _ = tx
                .send(StreamFrame::Error {
                    message: format!("Generating notes for {} failed: {err}", item.id),
                })
                .await;
            return Err(err);
        }
    }

    Ok(())
}

/// Drive one item through its phase machine: developer, marketing, tools.
async fn generate_item(
    item: &DiffItem,
    generator: &dyn NoteGenerator,
    enricher: &dyn Enricher,
    tx: &mpsc::Sender<StreamFrame>,
) -> Result<()> {
    let mut phase = ItemPhase::PendingDeveloper;

    while let Some(section) = phase.channel() {
        match stream_channel(item, section, generator, tx).await {
            Ok(()) => phase = phase.advance(),
            Err(err) => {
                phase = ItemPhase::Failed;
                tracing::debug!("[generate] Item {} entered {:?}", item.id, phase);
                return Err(err);
            }
        }
    }

    // Enrichment never fails the stream; the enricher swallows its errors.
    let tools = enricher.enrich(item).await;
    send(
        tx,
        StreamFrame::Tools {
            pr_id: item.id.clone(),
            tools,
        },
    )
    .await
}

/// One channel's job: open, stream fragments in arrival order, close.
async fn stream_channel(
    item: &DiffItem,
    section: Channel,
    generator: &dyn NoteGenerator,
    tx: &mpsc::Sender<StreamFrame>,
) -> Result<()> {
    send(tx, StreamFrame::channel_open(&item.id, section)).await?;

    let (system, user) = match section {
        Channel::Developer => (DEVELOPER_SYSTEM, developer_prompt(item)),
        Channel::Marketing => (MARKETING_SYSTEM, marketing_prompt(item)),
    };

    let mut fragments = generator.stream_note(system, &user).await?;
    while let Some(fragment) = fragments.next().await {
        send(
            tx,
            StreamFrame::Content {
                pr_id: item.id.clone(),
                section,
                content: fragment?,
            },
        )
        .await?;
    }

    send(
        tx,
        StreamFrame::Done {
            pr_id: item.id.clone(),
            section,
        },
    )
    .await
}

/// A full channel means the consumer is behind; awaiting here is the
/// backpressure. A closed channel means the consumer went away, which is
/// fatal for the whole stream.
async fn send(tx: &mpsc::Sender<StreamFrame>, frame: StreamFrame) -> Result<()> {
    tx.send(frame)
        .await
        .map_err(|_| RelnotesError::Transport("consumer stopped reading".to_string()))
}

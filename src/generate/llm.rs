//! Generation capability abstraction.
//!
//! The orchestrator only ever sees a lazy sequence of text fragments behind
//! this trait; which backend produces them is a deployment concern.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{stream, Stream};

use crate::error::{RelnotesError, Result};

/// Lazy, finite sequence of text fragments. Exhaustion is the completion
/// signal; an `Err` item is fatal for the job.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A backend that turns a role-tagged prompt into a fragment stream.
#[async_trait]
pub trait NoteGenerator: Send + Sync {
    /// Start one generation job.
    async fn stream_note(&self, system: &str, user: &str) -> Result<FragmentStream>;

    /// Description of this backend for logging.
    fn description(&self) -> String;
}

/// Deterministic backend that replays a fixed fragment script for every
/// request. The offline backend, and the test double for everything above
/// the generation boundary.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    fragments: Vec<String>,
    fail_after: Option<usize>,
}

impl ScriptedGenerator {
    pub fn new<S: Into<String>>(fragments: impl IntoIterator<Item = S>) -> Self {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            fail_after: None,
        }
    }

    /// Variant that yields `n` fragments and then fails the job.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

#[async_trait]
impl NoteGenerator for ScriptedGenerator {
    async fn stream_note(&self, _system: &str, _user: &str) -> Result<FragmentStream> {
        let mut items: Vec<Result<String>> = self
            .fragments
            .iter()
            .take(self.fail_after.unwrap_or(usize::MAX))
            .cloned()
            .map(Ok)
            .collect();
        if self.fail_after.is_some() {
            items.push(Err(RelnotesError::Generation(
                "scripted failure".to_string(),
            )));
        }
        Ok(Box::pin(stream::iter(items)))
    }

    fn description(&self) -> String {
        format!("Scripted ({} fragments)", self.fragments.len())
    }
}

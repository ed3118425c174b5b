//! Note generation: the external text-generation capability and the
//! sequential per-item orchestration loop that multiplexes its output.

pub mod anthropic;
pub mod llm;
pub mod orchestrator;

pub use anthropic::{AnthropicConfig, AnthropicGenerator};
pub use llm::{FragmentStream, NoteGenerator, ScriptedGenerator};
pub use orchestrator::{run_generation, ItemPhase};

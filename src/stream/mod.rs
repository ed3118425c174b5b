//! The multiplexed note-stream protocol.
//!
//! A single byte stream carries two logical channels (developer, marketing)
//! per work item plus one-shot enrichment and a fatal error signal. This
//! module owns the wire frames, the SSE record codec used on both ends, and
//! the client-side reducer that reconstructs per-item note pairs from
//! arbitrarily fragmented input.

pub mod codec;
pub mod frame;
pub mod reducer;

pub use codec::{encode_frame, Decoded, FrameDecoder, RecordBuffer};
pub use frame::StreamFrame;
pub use reducer::{merge_overlap, Applied, NoteState, NotesState};

//! Client-side reconstruction of per-item note pairs.
//!
//! The reducer is a pure function over an owned state value: every frame
//! application returns the next state, which makes replay in tests
//! deterministic. Fragment text is appended with an overlap-safe merge so a
//! re-delivered boundary never duplicates text.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Channel, ToolsInfo};
use crate::stream::frame::StreamFrame;

/// Accumulated notes for one item. Strings only grow.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteState {
    pub developer: String,
    pub marketing: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsInfo>,
}

impl NoteState {
    fn channel_mut(&mut self, section: Channel) -> &mut String {
        match section {
            Channel::Developer => &mut self.developer,
            Channel::Marketing => &mut self.marketing,
        }
    }

    /// Read accessor for one channel's accumulated text.
    pub fn channel(&self, section: Channel) -> &str {
        match section {
            Channel::Developer => &self.developer,
            Channel::Marketing => &self.marketing,
        }
    }
}

/// What applying one frame did.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Appended { pr_id: String, section: Channel },
    ChannelClosed { pr_id: String, section: Channel },
    ToolsAttached { pr_id: String },
    /// Terminal signal for the whole stream; accumulated state is retained.
    Fatal { message: String },
}

/// All per-item note state reconstructed from a stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotesState {
    items: HashMap<String, NoteState>,
}

impl NotesState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one frame, returning the next state and what happened.
    ///
    /// An item's `NoteState` is created by the first frame referencing its
    /// id. Completion frames never mutate text; a tools frame replaces the
    /// enrichment wholesale; an error frame changes nothing and surfaces as
    /// [`Applied::Fatal`].
    pub fn apply(mut self, frame: StreamFrame) -> (Self, Applied) {
        let applied = match frame {
            StreamFrame::Content {
                pr_id,
                section,
                content,
            } => {
                let note = self.items.entry(pr_id.clone()).or_default();
                let slot = note.channel_mut(section);
                *slot = merge_overlap(slot, &content);
                Applied::Appended { pr_id, section }
            }
            StreamFrame::Done { pr_id, section } => {
                self.items.entry(pr_id.clone()).or_default();
                Applied::ChannelClosed { pr_id, section }
            }
            StreamFrame::Tools { pr_id, tools } => {
                self.items.entry(pr_id.clone()).or_default().tools = Some(tools);
                Applied::ToolsAttached { pr_id }
            }
            StreamFrame::Error { message } => Applied::Fatal { message },
        };
        (self, applied)
    }

    pub fn get(&self, pr_id: &str) -> Option<&NoteState> {
        self.items.get(pr_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NoteState)> {
        self.items.iter()
    }

    pub fn into_items(self) -> HashMap<String, NoteState> {
        self.items
    }
}

/// Concatenate two fragments, dropping the largest suffix of `prev` that the
/// start of `fragment` re-delivers.
///
/// The scan checks the largest candidate overlap first so the maximal valid
/// overlap wins over a smaller coincidental match. Worst case is quadratic in
/// fragment length; fragments here are short natural-language deltas, bounded
/// upstream by the generation provider.
pub fn merge_overlap(prev: &str, fragment: &str) -> String {
    if prev.is_empty() {
        return fragment.to_string();
    }
    if fragment.is_empty() {
        return prev.to_string();
    }

    let max = prev.len().min(fragment.len());
    for k in (1..=max).rev() {
        if !fragment.is_char_boundary(k) {
            continue;
        }
        if prev.ends_with(&fragment[..k]) {
            return format!("{prev}{}", &fragment[k..]);
        }
    }
    format!("{prev}{fragment}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn content(pr_id: &str, section: Channel, content: &str) -> StreamFrame {
        StreamFrame::Content {
            pr_id: pr_id.to_string(),
            section,
            content: content.to_string(),
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn overlapping_boundary_is_deduplicated() {
            assert_eq!(merge_overlap("ab", "bc"), "abc");
            assert_eq!(merge_overlap("hello wor", "world!"), "hello world!");
        }

        #[test]
        fn empty_sides_short_circuit() {
            assert_eq!(merge_overlap("", "x"), "x");
            assert_eq!(merge_overlap("x", ""), "x");
            assert_eq!(merge_overlap("", ""), "");
        }

        #[test]
        fn no_overlap_is_plain_concatenation() {
            assert_eq!(merge_overlap("abc", "xyz"), "abcxyz");
        }

        #[test]
        fn largest_overlap_wins() {
            // Both "a" and "aba" are valid overlaps; the longest must win.
            assert_eq!(merge_overlap("xaba", "abab"), "xabab");
        }

        #[test]
        fn full_repeat_collapses() {
            assert_eq!(merge_overlap("abc", "abc"), "abc");
        }

        #[test]
        fn merge_is_not_commutative() {
            assert_ne!(merge_overlap("ab", "ba"), merge_overlap("ba", "ab"));
        }

        #[test]
        fn multi_byte_fragments_merge_cleanly() {
            assert_eq!(merge_overlap("caf", "fé au lait"), "café au lait");
            assert_eq!(merge_overlap("½ cup", " cupful"), "½ cupful");
        }

        proptest! {
            #[test]
            fn merged_text_starts_with_prev(prev in ".*", fragment in ".*") {
                let merged = merge_overlap(&prev, &fragment);
                prop_assert!(merged.starts_with(&prev));
            }

            #[test]
            fn merged_text_never_exceeds_plain_concat(prev in ".*", fragment in ".*") {
                let merged = merge_overlap(&prev, &fragment);
                prop_assert!(merged.len() <= prev.len() + fragment.len());
            }

            #[test]
            fn merging_a_full_repeat_is_identity(text in ".+") {
                prop_assert_eq!(merge_overlap(&text, &text), text);
            }
        }
    }

    mod reducer_tests {
        use super::*;

        #[test]
        fn content_creates_item_and_appends() {
            let state = NotesState::new();
            let (state, applied) = state.apply(content("42", Channel::Developer, "Fixed "));
            assert_eq!(
                applied,
                Applied::Appended {
                    pr_id: "42".to_string(),
                    section: Channel::Developer
                }
            );
            assert_eq!(state.get("42").unwrap().developer, "Fixed ");
            assert_eq!(state.get("42").unwrap().marketing, "");
        }

        #[test]
        fn two_fragments_equal_one_merged_fragment() {
            let split = {
                let (state, _) = NotesState::new().apply(content("1", Channel::Developer, "ab"));
                let (state, _) = state.apply(content("1", Channel::Developer, "bc"));
                state
            };
            let merged = {
                let (state, _) = NotesState::new().apply(content(
                    "1",
                    Channel::Developer,
                    &merge_overlap("ab", "bc"),
                ));
                state
            };
            assert_eq!(split, merged);
        }

        #[test]
        fn completion_frame_never_changes_text() {
            let (state, _) = NotesState::new().apply(content("42", Channel::Marketing, "done."));
            let before = state.get("42").unwrap().clone();
            let (state, applied) = state.apply(StreamFrame::Done {
                pr_id: "42".to_string(),
                section: Channel::Marketing,
            });
            assert_eq!(
                applied,
                Applied::ChannelClosed {
                    pr_id: "42".to_string(),
                    section: Channel::Marketing
                }
            );
            assert_eq!(state.get("42").unwrap(), &before);
        }

        #[test]
        fn tools_frame_attaches_without_touching_text() {
            let (state, _) = NotesState::new().apply(content("42", Channel::Developer, "note"));
            let tools = ToolsInfo {
                related_issues: vec!["https://github.com/o/r/issues/9".to_string()],
                contributors: vec![],
            };
            let (state, applied) = state.apply(StreamFrame::Tools {
                pr_id: "42".to_string(),
                tools: tools.clone(),
            });
            assert_eq!(
                applied,
                Applied::ToolsAttached {
                    pr_id: "42".to_string()
                }
            );
            let note = state.get("42").unwrap();
            assert_eq!(note.developer, "note");
            assert_eq!(note.tools.as_ref().unwrap(), &tools);
        }

        #[test]
        fn tools_frame_replaces_wholesale() {
            let first = ToolsInfo {
                related_issues: vec!["a".to_string()],
                contributors: vec![],
            };
            let second = ToolsInfo {
                related_issues: vec!["b".to_string()],
                contributors: vec![],
            };
            let (state, _) = NotesState::new().apply(StreamFrame::Tools {
                pr_id: "1".to_string(),
                tools: first,
            });
            let (state, _) = state.apply(StreamFrame::Tools {
                pr_id: "1".to_string(),
                tools: second.clone(),
            });
            assert_eq!(state.get("1").unwrap().tools.as_ref().unwrap(), &second);
        }

        #[test]
        fn error_frame_is_terminal_but_retains_state() {
            let (state, _) = NotesState::new().apply(content("42", Channel::Developer, "kept"));
            let (state, applied) = state.apply(StreamFrame::Error {
                message: "upstream failed".to_string(),
            });
            assert_eq!(
                applied,
                Applied::Fatal {
                    message: "upstream failed".to_string()
                }
            );
            assert_eq!(state.get("42").unwrap().developer, "kept");
        }

        #[test]
        fn channels_accumulate_independently() {
            let (state, _) = NotesState::new().apply(content("1", Channel::Developer, "dev"));
            let (state, _) = state.apply(content("1", Channel::Marketing, "mkt"));
            let note = state.get("1").unwrap();
            assert_eq!(note.developer, "dev");
            assert_eq!(note.marketing, "mkt");
        }

        #[test]
        fn end_to_end_marketing_merge_scenario() {
            // Two fragments with an overlapping "is " boundary, then done,
            // then enrichment.
            let (state, _) =
                NotesState::new().apply(content("42", Channel::Marketing, "The cache is "));
            let (state, _) = state.apply(content("42", Channel::Marketing, "is now faster."));
            assert_eq!(
                state.get("42").unwrap().marketing,
                "The cache is now faster."
            );

            let (state, _) = state.apply(StreamFrame::Done {
                pr_id: "42".to_string(),
                section: Channel::Marketing,
            });
            assert_eq!(
                state.get("42").unwrap().marketing,
                "The cache is now faster."
            );

            let tools = ToolsInfo {
                related_issues: vec!["https://github.com/o/r/issues/3".to_string()],
                contributors: vec![],
            };
            let (state, _) = state.apply(StreamFrame::Tools {
                pr_id: "42".to_string(),
                tools,
            });
            let note = state.get("42").unwrap();
            assert_eq!(note.marketing, "The cache is now faster.");
            assert!(note.tools.is_some());
        }
    }
}

//! Wire frames for the multiplexed note stream.
//!
//! Four shapes share one JSON object layout; which fields are present decides
//! the variant. Serialization goes through a single [`WireFrame`] struct so
//! the wire contract lives in exactly one place.

use serde::{Deserialize, Serialize};

use crate::model::{Channel, ToolsInfo};

/// One discrete protocol message on the multiplexed stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// A text fragment to append to one channel of one item.
    Content {
        pr_id: String,
        section: Channel,
        content: String,
    },
    /// Channel completion marker; carries no content.
    Done { pr_id: String, section: Channel },
    /// One-shot enrichment delivery, channel-less.
    Tools { pr_id: String, tools: ToolsInfo },
    /// Fatal signal for the whole stream.
    Error { message: String },
}

impl StreamFrame {
    /// Channel-open signal: a content frame with empty content.
    pub fn channel_open(pr_id: &str, section: Channel) -> Self {
        StreamFrame::Content {
            pr_id: pr_id.to_string(),
            section,
            content: String::new(),
        }
    }

    /// The item this frame refers to, if any.
    pub fn pr_id(&self) -> Option<&str> {
        match self {
            StreamFrame::Content { pr_id, .. }
            | StreamFrame::Done { pr_id, .. }
            | StreamFrame::Tools { pr_id, .. } => Some(pr_id),
            StreamFrame::Error { .. } => None,
        }
    }
}

/// Flattened JSON layout shared by all frame variants.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WireFrame {
    #[serde(rename = "prId", skip_serializing_if = "Option::is_none")]
    pr_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    section: Option<Channel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    done: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<ToolsInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl From<&StreamFrame> for WireFrame {
    fn from(frame: &StreamFrame) -> Self {
        match frame {
            StreamFrame::Content {
                pr_id,
                section,
                content,
            } => WireFrame {
                pr_id: Some(pr_id.clone()),
                section: Some(*section),
                content: Some(content.clone()),
                ..WireFrame::default()
            },
            StreamFrame::Done { pr_id, section } => WireFrame {
                pr_id: Some(pr_id.clone()),
                section: Some(*section),
                done: Some(true),
                ..WireFrame::default()
            },
            StreamFrame::Tools { pr_id, tools } => WireFrame {
                pr_id: Some(pr_id.clone()),
                kind: Some("tools".to_string()),
                tools: Some(tools.clone()),
                ..WireFrame::default()
            },
            StreamFrame::Error { message } => WireFrame {
                kind: Some("error".to_string()),
                message: Some(message.clone()),
                ..WireFrame::default()
            },
        }
    }
}

impl TryFrom<WireFrame> for StreamFrame {
    type Error = String;

    fn try_from(wire: WireFrame) -> Result<Self, String> {
        match wire.kind.as_deref() {
            Some("error") => {
                let message = wire.message.ok_or("error frame without message")?;
                return Ok(StreamFrame::Error { message });
            }
            Some("tools") => {
                let pr_id = wire.pr_id.ok_or("tools frame without prId")?;
                let tools = wire.tools.ok_or("tools frame without tools")?;
                return Ok(StreamFrame::Tools { pr_id, tools });
            }
            Some(other) => return Err(format!("unknown frame type '{other}'")),
            None => {}
        }

        let pr_id = wire.pr_id.ok_or("frame without prId")?;
        let section = wire.section.ok_or("frame without section")?;
        if wire.done == Some(true) {
            return Ok(StreamFrame::Done { pr_id, section });
        }
        match wire.content {
            Some(content) => Ok(StreamFrame::Content {
                pr_id,
                section,
                content,
            }),
            None => Err("frame with neither content nor done".to_string()),
        }
    }
}

impl Serialize for StreamFrame {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        WireFrame::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StreamFrame {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = WireFrame::deserialize(deserializer)?;
        StreamFrame::try_from(wire).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Contributor;

    #[test]
    fn content_frame_wire_shape() {
        let frame = StreamFrame::Content {
            pr_id: "42".to_string(),
            section: Channel::Developer,
            content: "The cache ".to_string(),
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(
            json,
            r#"{"prId":"42","section":"developer","content":"The cache "}"#
        );
    }

    #[test]
    fn done_frame_wire_shape() {
        let frame = StreamFrame::Done {
            pr_id: "42".to_string(),
            section: Channel::Marketing,
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"prId":"42","section":"marketing","done":true}"#);
    }

    #[test]
    fn tools_frame_wire_shape() {
        let frame = StreamFrame::Tools {
            pr_id: "42".to_string(),
            tools: ToolsInfo {
                related_issues: vec!["https://github.com/o/r/issues/7".to_string()],
                contributors: vec![Contributor {
                    name: "octocat".to_string(),
                    avatar: "a".to_string(),
                    contributions: 9,
                }],
            },
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains(r#""type":"tools""#));
        assert!(json.contains(r#""prId":"42""#));
        assert!(json.contains(r#""relatedIssues""#));
    }

    #[test]
    fn error_frame_wire_shape() {
        let frame = StreamFrame::Error {
            message: "boom".to_string(),
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"boom"}"#);
    }

    #[test]
    fn all_variants_round_trip() {
        let frames = vec![
            StreamFrame::channel_open("1", Channel::Developer),
            StreamFrame::Content {
                pr_id: "1".to_string(),
                section: Channel::Developer,
                content: "x".to_string(),
            },
            StreamFrame::Done {
                pr_id: "1".to_string(),
                section: Channel::Developer,
            },
            StreamFrame::Tools {
                pr_id: "1".to_string(),
                tools: ToolsInfo::default(),
            },
            StreamFrame::Error {
                message: "fatal".to_string(),
            },
        ];
        for frame in frames {
            let json = serde_json::to_string(&frame).unwrap();
            let back: StreamFrame = serde_json::from_str(&json).unwrap();
            assert_eq!(back, frame);
        }
    }

    #[test]
    fn done_wins_over_absent_content() {
        let back: StreamFrame =
            serde_json::from_str(r#"{"prId":"7","section":"developer","done":true}"#).unwrap();
        assert_eq!(
            back,
            StreamFrame::Done {
                pr_id: "7".to_string(),
                section: Channel::Developer
            }
        );
    }

    #[test]
    fn incomplete_frames_are_rejected() {
        assert!(serde_json::from_str::<StreamFrame>(r#"{"prId":"7"}"#).is_err());
        assert!(serde_json::from_str::<StreamFrame>(r#"{"type":"error"}"#).is_err());
        assert!(serde_json::from_str::<StreamFrame>(r#"{"type":"mystery"}"#).is_err());
    }

    #[test]
    fn channel_open_is_empty_content() {
        match StreamFrame::channel_open("9", Channel::Marketing) {
            StreamFrame::Content {
                pr_id,
                section,
                content,
            } => {
                assert_eq!(pr_id, "9");
                assert_eq!(section, Channel::Marketing);
                assert!(content.is_empty());
            }
            other => panic!("expected content frame, got {other:?}"),
        }
    }
}

//! CLI output handling.
//!
//! Consumes the frame stream, renders progress, and reduces frames into the
//! final per-item note pairs. The reducer here is the same one a remote
//! consumer uses; the CLI is just a consumer with a local transport.

use std::io::{self, Write};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::stream::frame::StreamFrame;
use crate::stream::reducer::{Applied, NotesState};

/// Drain a frame channel, printing progress and reducing into note state.
///
/// Returns the reconstructed state and the fatal error message, if the
/// stream ended with an error frame.
pub async fn consume(
    mut rx: mpsc::Receiver<StreamFrame>,
    json_mode: bool,
) -> Result<(NotesState, Option<String>)> {
    let mut state = NotesState::new();
    let mut fatal = None;

    while let Some(frame) = rx.recv().await {
        print_frame(&frame, json_mode)?;
        let (next, applied) = state.apply(frame);
        state = next;
        if let Applied::Fatal { message } = applied {
            fatal = Some(message);
        }
    }

    Ok((state, fatal))
}

/// Render one frame as it arrives.
pub fn print_frame(frame: &StreamFrame, json_mode: bool) -> Result<()> {
    if json_mode {
        println!("{}", serde_json::to_string(frame)?);
        io::stdout().flush()?;
        return Ok(());
    }

    match frame {
        StreamFrame::Content {
            pr_id,
            section,
            content,
        } => {
            if content.is_empty() {
                // Channel-open signal.
                eprintln!("\n[{pr_id} {section}]");
            } else {
                print!("{content}");
                io::stdout().flush()?;
            }
        }
        StreamFrame::Done { .. } => println!(),
        StreamFrame::Tools { pr_id, tools } => {
            if !tools.is_empty() {
                eprintln!(
                    "[{pr_id} tools] {} issue(s), {} contributor(s)",
                    tools.related_issues.len(),
                    tools.contributors.len()
                );
            }
        }
        StreamFrame::Error { message } => eprintln!("Error: {message}"),
    }

    Ok(())
}

/// Render the final reconstructed notes.
pub fn render_notes(state: &NotesState, json_mode: bool) -> Result<()> {
    if json_mode {
        let map: std::collections::HashMap<_, _> = state.iter().collect();
        println!("{}", serde_json::to_string(&map)?);
        return Ok(());
    }

    let mut entries: Vec<_> = state.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    println!("\n=== Release notes ===");
    for (id, note) in entries {
        println!("\n## {id}");
        println!("developer: {}", note.developer.trim());
        println!("marketing: {}", note.marketing.trim());
        if let Some(tools) = &note.tools {
            for issue in &tools.related_issues {
                println!("related:   {issue}");
            }
            for contributor in &tools.contributors {
                println!(
                    "credit:    {} ({} contributions)",
                    contributor.name, contributor.contributions
                );
            }
        }
    }

    Ok(())
}

//! CLI argument parsing using clap.

use clap::Parser;
use std::path::PathBuf;

/// Streaming release-notes generator for merged pull requests
#[derive(Parser, Debug, Clone)]
#[command(name = "relnotes")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// JSON file with the diff items to process
    #[arg(short = 'f', long)]
    pub items: Option<PathBuf>,

    /// Run the HTTP/SSE server instead of a one-shot run
    #[arg(long, conflicts_with_all = ["items", "remote"])]
    pub serve: bool,

    /// Port for --serve (overrides settings; 0 picks a random port)
    #[arg(long, requires = "serve")]
    pub port: Option<u16>,

    /// Base URL of a running server to consume instead of generating locally
    #[arg(long)]
    pub remote: Option<String>,

    /// Filter policy preset: conservative | permissive
    #[arg(long)]
    pub policy: Option<String>,

    /// Anthropic API key (overrides settings)
    #[arg(long, env = "ANTHROPIC_API_KEY")]
    pub api_key: Option<String>,

    /// Output frames and final notes as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

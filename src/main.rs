//! relnotes - Streaming release-notes generator for merged pull requests
//!
//! # Usage
//!
//! ```bash
//! # Generate notes for a batch of diff items
//! relnotes -f items.json
//!
//! # Permissive filtering, JSON output for scripting
//! relnotes -f items.json --policy permissive --json | jq .
//!
//! # Run the HTTP/SSE server
//! relnotes --serve --port 8787
//!
//! # Consume a running server, reconstructing notes client-side
//! relnotes -f items.json --remote http://localhost:8787
//! ```

use anyhow::Result;
use clap::Parser;

use relnotes::cli::{self, Args};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let directive = if args.verbose {
        "relnotes=debug"
    } else {
        "relnotes=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = relnotes::settings::load()?;

    if args.serve {
        cli::run_serve(&args, &settings).await
    } else if let Some(url) = args.remote.clone() {
        cli::run_remote(&args, &url).await
    } else {
        cli::run_local(&args, &settings).await
    }
}

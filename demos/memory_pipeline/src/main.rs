//! Memory Pipeline Demo
//!
//! Runs the HTTP source in front of a [`MemoryChannel`] and logs every event a
//! background consumer drains from it.
//!
//! # Usage
//!
//! ```bash
//! SPOUT_SOURCE__PORT=8080 cargo run --package memory-pipeline
//!
//! curl -X POST localhost:8080 \
//!     -H 'Content-Type: application/json; charset=UTF-8' \
//!     -d '[{"headers": {"a": "b"}, "body": "random_body"}]'
//! ```
//!
//! A `spout.toml` in the working directory is picked up as well:
//!
//! ```toml
//! [source]
//! port = 8080
//! handler = "blob"
//! "handler.mandatoryParameters" = "file"
//!
//! [channel]
//! capacity = 1000
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use spout::prelude::*;
use spout::runtime::ConfigLoader;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "memory-pipeline", about = "Spout HTTP source into an in-memory channel")]
struct Args {
    /// Configuration file (defaults to searching for spout.toml / spout.yaml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. `production`.
    #[arg(short, long)]
    profile: Option<String>,

    /// Maximum number of events drained per batch.
    #[arg(long, default_value_t = 100)]
    drain_batch: usize,
}

async fn drain(channel: Arc<MemoryChannel>, max: usize) {
    loop {
        let events = channel.take(max).await;
        info!(events = events.len(), remaining = channel.len(), "Drained batch");
        for event in events {
            info!(
                headers = ?event.headers(),
                body = event.body_str().unwrap_or("<binary>"),
                "Event"
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    if let Some(profile) = args.profile {
        loader = loader.profile(profile);
    }
    let config = loader.load()?;

    let channel = Arc::new(MemoryChannel::from_config(&config.channel));
    let runtime = SpoutRuntime::from_config(&config, channel.clone());

    let consumer = tokio::spawn(drain(channel.clone(), args.drain_batch.max(1)));
    let result = runtime.run().await;
    consumer.abort();

    info!(undelivered = channel.len(), "Memory pipeline finished");
    result?;
    Ok(())
}

//! # Spout
//!
//! An HTTP ingestion source. Clients POST (or GET) events to `/`, a pluggable
//! handler decodes each request into an ordered batch, and the batch is
//! committed to a downstream channel in one atomic call.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐     ┌────────────┐     ┌─────────┐
//! │ Transport │────▶│ Dispatcher │────▶│ Handler │  decode request → EventBatch
//! │  (axum)   │     │            │     └─────────┘
//! │           │◀────│            │────▶┌─────────┐
//! └───────────┘     └────────────┘     │ Channel │  commit batch atomically
//!                                      └─────────┘
//! ```
//!
//! | outcome | status |
//! |---------|--------|
//! | batch committed | 200 |
//! | handler cannot decode the request | 400 |
//! | channel is full | 503 |
//! | any other handler or channel failure | 500 |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use spout::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = spout::runtime::config::load_config()?;
//!     let channel = Arc::new(MemoryChannel::from_config(&config.channel));
//!
//!     SpoutRuntime::from_config(&config, channel).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Handlers
//!
//! ```rust,ignore
//! use spout::prelude::*;
//!
//! struct LineHandler;
//!
//! impl SourceHandler for LineHandler {
//!     fn get_events(&self, request: &SourceRequest) -> HandlerResult<EventBatch> {
//!         let text = std::str::from_utf8(request.body())
//!             .map_err(|e| HandlerError::decode(e.to_string()))?;
//!         Ok(text.lines().map(Event::with_body).collect())
//!     }
//! }
//!
//! #[register_handler(lines)]
//! fn lines() -> LineHandler {
//!     LineHandler
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): load `spout.toml`
//! - `yaml-config`: load `spout.yaml`
//! - `json-log`: JSON log output

pub use spout_core as core;
pub use spout_handlers as handlers;
pub use spout_runtime as runtime;
pub use spout_transport as transport;

pub use spout_macros::register_handler;

/// Commonly used types.
pub mod prelude {
    pub use spout_core::prelude::*;
    pub use spout_core::{BoxedChannel, BoxedHandler, SourceResponse};
    pub use spout_macros::register_handler;
    pub use spout_runtime::{
        HttpSource, MemoryChannel, RuntimeError, RuntimeResult, SourceStatus, SpoutConfig,
        SpoutRuntime,
    };
}

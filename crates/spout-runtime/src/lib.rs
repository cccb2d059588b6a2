//! Spout Runtime - lifecycle and orchestration for the Spout HTTP source.
//!
//! This crate provides:
//! - [`HttpSource`]: configure / start / stop around the HTTP transport
//! - [`Dispatcher`]: maps handler and channel outcomes to HTTP responses
//! - [`MemoryChannel`]: a bounded, transactional in-memory channel
//! - [`SpoutRuntime`]: configuration loading, logging and signal handling
//!
//! ```ignore
//! use std::sync::Arc;
//! use spout_runtime::{MemoryChannel, SpoutRuntime};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = spout_runtime::config::load_config()?;
//!     let channel = Arc::new(MemoryChannel::from_config(&config.channel));
//!
//!     SpoutRuntime::from_config(&config, channel).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! The handlers in `spout-handlers` are linked in by this crate, so `json` and
//! `blob` are always available as `handler` identifiers.

pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod source;

pub use channel::MemoryChannel;
pub use config::{ConfigLoadError, ConfigLoader, SpoutConfig};
pub use dispatcher::Dispatcher;
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{RuntimeBuilder, SpoutRuntime};
pub use source::{HttpSource, SourceStatus};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}

//! # Spout Core
//!
//! Core types and contracts for the Spout HTTP ingestion source.
//!
//! Spout accepts events over HTTP, lets a pluggable handler decode each request
//! into an ordered batch, and commits that batch to a downstream channel in a
//! single atomic call.
//!
//! ## Request Flow
//!
//! ```text
//! ┌───────────┐     ┌────────────┐     ┌───────────┐     ┌───────────┐
//! │ Transport │────▶│ Dispatcher │────▶│  Handler  │     │  Channel  │
//! │  (axum)   │◀────│            │────────────────────▶│           │
//! └───────────┘     └────────────┘     └───────────┘     └───────────┘
//! ```
//!
//! This crate defines the pieces every layer agrees on:
//!
//! - [`Event`] / [`EventBatch`] - the data model
//! - [`SourceRequest`] / [`SourceResponse`] - transport-neutral HTTP exchange
//! - [`Context`] - flat key/value configuration
//! - [`SourceHandler`] / [`ConfiguredHandler`] - the pluggable decoder
//! - [`Channel`] - the downstream sink
//! - [`Dispatch`] - the per-request entry point the transport calls
//! - [`HANDLER_REGISTRY`] - link-time registry of named handler factories
//! - the error taxonomy in [`error`]

pub mod channel;
pub mod context;
pub mod error;
pub mod event;
pub mod handler;
pub mod registry;
pub mod request;

pub use channel::{BoxedChannel, BoxedDispatch, Channel, Dispatch};
pub use context::Context;
pub use error::{
    ChannelError, ChannelResult, ConfigError, ConfigResult, HandlerError, HandlerResult,
    LifecycleError, SourceError, SourceResult, TransportError, TransportResult,
};
pub use event::{Event, EventBatch};
pub use handler::{BoxedHandler, ConfiguredHandler, SourceHandler};
pub use registry::{
    HANDLER_REGISTRY, HandlerFactory, HandlerRegistration, registered_handlers, resolve_handler,
};
pub use request::{SourceRequest, SourceResponse};

// Used by `#[register_handler]` expansions in downstream crates.
#[doc(hidden)]
pub use linkme;

/// Prelude for handler and channel implementors.
pub mod prelude {
    pub use super::{
        Channel, ChannelError, ChannelResult, ConfigError, ConfigResult, Context, Event,
        EventBatch, HandlerError, HandlerResult, SourceHandler, SourceRequest,
    };
}

//! # Spout Transport
//!
//! HTTP transport binding for Spout sources.
//!
//! The transport owns everything between the TCP socket and the source's
//! [`Dispatch`](spout_core::Dispatch) implementation: binding, HTTP framing,
//! converting requests into [`SourceRequest`](spout_core::SourceRequest)s and
//! writing [`SourceResponse`](spout_core::SourceResponse)s back.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  spout-runtime      │  (source lifecycle, dispatcher)
//! ├─────────────────────┤
//! │  spout-core         │  (Dispatch trait, request/response)
//! ├─────────────────────┤
//! │  spout-transport    │  <- This crate (axum server)
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spout_transport::http_listen;
//!
//! let handle = http_listen("0.0.0.0:8080", dispatcher).await?;
//! // ... serve requests ...
//! handle.shutdown().await?;
//! ```

pub mod server;

pub use server::{ServerHandle, http_listen};

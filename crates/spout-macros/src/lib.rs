//! Procedural macros for Spout.
//!
//! This crate provides:
//!
//! - `#[register_handler(name)]` - Adds a handler factory to the static
//!   handler registry in `spout-core`
//!
//! # Handler Registration
//!
//! ```rust,ignore
//! use spout_macros::register_handler;
//!
//! #[register_handler(json)]
//! fn json_handler() -> JsonHandler {
//!     JsonHandler::default()
//! }
//! ```
//!
//! The source can then select the handler with `handler = "json"`.

mod handler;

use proc_macro::TokenStream;

/// Registers a zero-argument constructor as a named handler factory.
///
/// The attribute argument is the identifier used in the `handler` option,
/// written either as a bare identifier or a string literal (for names that are
/// not valid Rust identifiers):
///
/// ```rust,ignore
/// #[register_handler(blob)]
/// fn blob_handler() -> BlobHandler { BlobHandler::default() }
///
/// #[register_handler("json-lines")]
/// fn json_lines_handler() -> JsonLinesHandler { JsonLinesHandler }
/// ```
///
/// The function is left unchanged. The return type must implement
/// `spout_core::SourceHandler + 'static`.
#[proc_macro_attribute]
pub fn register_handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    handler::register_handler(attr, item)
}

//! Reference handlers for Spout.
//!
//! Every handler in this crate registers itself in the static handler registry
//! of `spout-core`, so linking the crate is enough to make it selectable by
//! name through the source's `handler` option.
//!
//! | identifier | handler | input |
//! |------------|---------|-------|
//! | `json` *(default)* | [`JsonHandler`] | JSON array of `{headers, body}` objects |
//! | `blob` | [`BlobHandler`] | raw body, query parameters as headers |

pub mod blob;
pub mod json;

pub use blob::{BLOB_HANDLER, BlobHandler, MANDATORY_PARAMETERS};
pub use json::{JSON_HANDLER, JsonHandler};

/// Identifier of the handler a source uses when none is configured.
pub const DEFAULT_HANDLER: &str = JSON_HANDLER;

/// Keeps this crate's registry entries in the final binary.
///
/// Registration statics are only linked when the object holding them is
/// referenced, and a binary that selects handlers purely by name never names
/// their types. The source calls this before resolving a handler.
#[inline(never)]
pub fn link_builtin_handlers() {
    std::hint::black_box(json::json_handler as fn() -> JsonHandler);
    std::hint::black_box(blob::blob_handler as fn() -> BlobHandler);
}

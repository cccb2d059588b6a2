//! Binary large object handler.
//!
//! Turns the whole request body into a single event. Query parameters are
//! copied into the event headers, which lets clients attach metadata such as
//! a file name without touching the payload.
//!
//! # Configuration
//!
//! | key | effect |
//! |-----|--------|
//! | `mandatoryParameters` | comma-separated query parameters every request must carry |

use std::collections::BTreeMap;

use spout_core::prelude::*;
use spout_macros::register_handler;
use tracing::{debug, trace};

/// Registry identifier of [`BlobHandler`].
pub const BLOB_HANDLER: &str = "blob";

/// Configuration key listing required query parameters.
pub const MANDATORY_PARAMETERS: &str = "mandatoryParameters";

/// Stores the raw request body as one event.
#[derive(Debug, Default, Clone)]
pub struct BlobHandler {
    mandatory_parameters: Vec<String>,
}

impl BlobHandler {
    /// Creates a handler with no mandatory parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the configured mandatory parameters.
    pub fn mandatory_parameters(&self) -> &[String] {
        &self.mandatory_parameters
    }
}

impl SourceHandler for BlobHandler {
    fn configure(&mut self, context: &Context) -> ConfigResult<()> {
        self.mandatory_parameters = context
            .get_string(MANDATORY_PARAMETERS)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            mandatory = ?self.mandatory_parameters,
            "Configured blob handler"
        );
        Ok(())
    }

    fn get_events(&self, request: &SourceRequest) -> HandlerResult<EventBatch> {
        let mut headers = BTreeMap::new();
        for (key, value) in request.query_pairs() {
            // First occurrence wins for repeated parameters.
            headers
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        if let Some(missing) = self
            .mandatory_parameters
            .iter()
            .find(|p| !headers.contains_key(p.as_str()))
        {
            return Err(HandlerError::decode(format!(
                "missing mandatory parameter: {missing}"
            )));
        }

        if request.body().is_empty() {
            trace!("Empty blob request, no event produced");
            return Ok(Vec::new());
        }

        Ok(vec![Event::new(headers, request.body().to_vec())])
    }
}

#[register_handler(blob)]
pub(crate) fn blob_handler() -> BlobHandler {
    BlobHandler::new()
}

//! Static handler registry.
//!
//! Handler crates contribute named factories to [`HANDLER_REGISTRY`] at link
//! time, usually through `#[spout_macros::register_handler(name)]`. The source
//! resolves its `handler` option against this list instead of loading code by
//! name at runtime.

use linkme::distributed_slice;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::handler::BoxedHandler;

/// Constructor for a fresh, unconfigured handler.
pub type HandlerFactory = fn() -> BoxedHandler;

/// One entry in [`HANDLER_REGISTRY`].
#[derive(Debug, Clone, Copy)]
pub struct HandlerRegistration {
    /// Identifier used in the `handler` option.
    pub name: &'static str,
    /// Builds a new instance.
    pub factory: HandlerFactory,
}

/// Registry of handler factories.
/// Each crate that provides handlers contributes one entry per handler.
#[distributed_slice]
pub static HANDLER_REGISTRY: [HandlerRegistration];

/// Instantiates the handler registered under `name`.
///
/// Identifiers are matched case-insensitively.
pub fn resolve_handler(name: &str) -> ConfigResult<BoxedHandler> {
    let wanted = name.trim();
    match HANDLER_REGISTRY
        .iter()
        .find(|reg| reg.name.eq_ignore_ascii_case(wanted))
    {
        Some(reg) => {
            debug!(handler = reg.name, "Resolved handler from registry");
            Ok((reg.factory)())
        }
        None => Err(ConfigError::UnknownHandler {
            name: wanted.to_string(),
            available: registered_handlers().join(", "),
        }),
    }
}

/// Returns the identifiers of all registered handlers, sorted.
pub fn registered_handlers() -> Vec<&'static str> {
    let mut names: Vec<_> = HANDLER_REGISTRY.iter().map(|reg| reg.name).collect();
    names.sort_unstable();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerResult;
    use crate::event::EventBatch;
    use crate::handler::SourceHandler;
    use crate::request::SourceRequest;

    struct EmptyHandler;

    impl SourceHandler for EmptyHandler {
        fn get_events(&self, _request: &SourceRequest) -> HandlerResult<EventBatch> {
            Ok(Vec::new())
        }
    }

    #[distributed_slice(HANDLER_REGISTRY)]
    static EMPTY_HANDLER: HandlerRegistration = HandlerRegistration {
        name: "registry-test-empty",
        factory: || -> BoxedHandler { Box::new(EmptyHandler) },
    };

    #[test]
    fn test_resolve_registered_handler() {
        let handler = resolve_handler("Registry-Test-Empty").unwrap();
        let events = handler.get_events(&SourceRequest::new("GET", "/")).unwrap();
        assert!(events.is_empty());
        assert!(registered_handlers().contains(&"registry-test-empty"));
    }

    #[test]
    fn test_resolve_unknown_handler() {
        let err = resolve_handler("does-not-exist").err().unwrap();
        match err {
            ConfigError::UnknownHandler { name, available } => {
                assert_eq!(name, "does-not-exist");
                assert!(available.contains("registry-test-empty"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

//! The pluggable handler contract and its configure-once wrapper.
//!
//! A [`SourceHandler`] turns one [`SourceRequest`] into an ordered
//! [`EventBatch`]. Handlers are configured exactly once, through
//! [`ConfiguredHandler::configure`], which consumes the mutable handler and
//! returns a shared read-only wrapper. Nothing can reach
//! [`SourceHandler::configure`] after that point.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{ConfigError, ConfigResult, HandlerResult};
use crate::event::EventBatch;
use crate::request::SourceRequest;

/// Decodes HTTP requests into event batches.
///
/// `get_events` is called concurrently from many request tasks, so
/// implementations must either hold no mutable state or synchronise it
/// internally.
///
/// # Example
///
/// ```rust,ignore
/// struct LineHandler;
///
/// impl SourceHandler for LineHandler {
///     fn get_events(&self, request: &SourceRequest) -> HandlerResult<EventBatch> {
///         let text = std::str::from_utf8(request.body())
///             .map_err(|e| HandlerError::decode(e.to_string()))?;
///         Ok(text.lines().map(Event::with_body).collect())
///     }
/// }
/// ```
pub trait SourceHandler: Send + Sync {
    /// Applies handler-specific configuration (the `handler.*` keys with the
    /// prefix stripped). Called exactly once, before any request.
    fn configure(&mut self, _context: &Context) -> ConfigResult<()> {
        Ok(())
    }

    /// Decodes a request.
    ///
    /// Returns [`HandlerError::Decode`](crate::HandlerError::Decode) when the
    /// request cannot be interpreted and
    /// [`HandlerError::Internal`](crate::HandlerError::Internal) for anything
    /// else.
    fn get_events(&self, request: &SourceRequest) -> HandlerResult<EventBatch>;
}

/// Boxed, not yet configured handler.
pub type BoxedHandler = Box<dyn SourceHandler>;

/// A handler that has been configured and is now immutable.
///
/// Cloning is cheap and shares the same instance.
#[derive(Clone)]
pub struct ConfiguredHandler {
    name: Arc<str>,
    inner: Arc<dyn SourceHandler>,
}

impl ConfiguredHandler {
    /// Configures `handler` once and freezes it.
    pub fn configure(
        name: impl Into<Arc<str>>,
        handler: BoxedHandler,
        context: &Context,
    ) -> ConfigResult<Self> {
        Self::try_configure(name, handler, context).map_err(|(err, _)| err)
    }

    /// Like [`configure`](Self::configure), but hands the handler back when
    /// it rejects `context` so the caller can retry with other settings.
    pub fn try_configure(
        name: impl Into<Arc<str>>,
        mut handler: BoxedHandler,
        context: &Context,
    ) -> Result<Self, (ConfigError, BoxedHandler)> {
        if let Err(err) = handler.configure(context) {
            return Err((err, handler));
        }
        Ok(Self {
            name: name.into(),
            inner: Arc::from(handler),
        })
    }

    /// Returns the identifier the handler was resolved under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decodes a request with the frozen handler.
    pub fn get_events(&self, request: &SourceRequest) -> HandlerResult<EventBatch> {
        self.inner.get_events(request)
    }
}

impl fmt::Debug for ConfiguredHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredHandler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

//! The HTTP source and its lifecycle.
//!
//! ```text
//! Unconfigured ──configure──▶ Configured ──start──▶ Started ──stop──▶ Stopped
//! ```
//!
//! Every transition runs under one async lock, so concurrent `start`/`stop`
//! calls observe each other's effects. A stopped source cannot be restarted.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use spout_core::{
    BoxedChannel, BoxedHandler, ConfigError, ConfiguredHandler, Context, LifecycleError,
    SourceResult, TransportError, resolve_handler,
};
use spout_handlers::{DEFAULT_HANDLER, link_builtin_handlers};
use spout_transport::{ServerHandle, http_listen};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;

/// Mandatory TCP port.
pub const CONFIG_PORT: &str = "port";
/// Host to bind, defaults to [`DEFAULT_BIND`].
pub const CONFIG_BIND: &str = "bind";
/// Registry identifier of the handler, defaults to `json`.
pub const CONFIG_HANDLER: &str = "handler";
/// Prefix of the keys forwarded to the handler.
pub const CONFIG_HANDLER_PREFIX: &str = "handler.";

pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Name given to a handler injected with [`HttpSource::with_handler`] when no
/// `handler` key is configured.
const INJECTED_HANDLER: &str = "custom";

/// Observable lifecycle state of an [`HttpSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Unconfigured,
    Configured,
    Started,
    Stopped,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::Started => "started",
            Self::Stopped => "stopped",
        })
    }
}

#[derive(Clone)]
struct SourceSettings {
    bind: String,
    port: u16,
    dispatcher: Arc<Dispatcher>,
}

impl SourceSettings {
    fn listen_addr(&self) -> String {
        if self.bind.contains(':') && !self.bind.starts_with('[') {
            format!("[{}]:{}", self.bind, self.port)
        } else {
            format!("{}:{}", self.bind, self.port)
        }
    }
}

enum SourceState {
    Unconfigured,
    Configured(SourceSettings),
    Started {
        settings: SourceSettings,
        server: ServerHandle,
    },
    Stopped,
}

impl SourceState {
    fn status(&self) -> SourceStatus {
        match self {
            Self::Unconfigured => SourceStatus::Unconfigured,
            Self::Configured(_) => SourceStatus::Configured,
            Self::Started { .. } => SourceStatus::Started,
            Self::Stopped => SourceStatus::Stopped,
        }
    }
}

/// Accepts events over HTTP and commits them to a channel.
///
/// # Example
///
/// ```rust,ignore
/// let channel = Arc::new(MemoryChannel::new(1000, Duration::from_secs(3)));
/// let source = HttpSource::new("ingest", channel.clone());
///
/// source.configure(&Context::new().with("port", "8080")).await?;
/// source.start().await?;
/// // ...
/// source.stop().await;
/// ```
pub struct HttpSource {
    name: Arc<str>,
    channel: BoxedChannel,
    injected: parking_lot::Mutex<Option<BoxedHandler>>,
    state: Mutex<SourceState>,
}

impl HttpSource {
    pub fn new(name: impl Into<Arc<str>>, channel: BoxedChannel) -> Self {
        Self {
            name: name.into(),
            channel,
            injected: parking_lot::Mutex::new(None),
            state: Mutex::new(SourceState::Unconfigured),
        }
    }

    /// Uses a pre-built handler instead of resolving `handler` from the
    /// registry. It is still configured with the `handler.*` keys.
    pub fn with_handler(self, handler: BoxedHandler) -> Self {
        *self.injected.lock() = Some(handler);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn status(&self) -> SourceStatus {
        self.state.lock().await.status()
    }

    /// Address the transport is bound to while started.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state.lock().await {
            SourceState::Started { server, .. } => Some(server.local_addr()),
            _ => None,
        }
    }

    /// Reads the source options and configures the handler.
    ///
    /// May be called once.
    pub async fn configure(&self, context: &Context) -> SourceResult<()> {
        let mut state = self.state.lock().await;
        match &*state {
            SourceState::Unconfigured => {}
            SourceState::Stopped => return Err(LifecycleError::Stopped.into()),
            _ => return Err(LifecycleError::AlreadyConfigured.into()),
        }

        let port = context
            .get_integer::<u16>(CONFIG_PORT)?
            .ok_or_else(|| ConfigError::missing_field(CONFIG_PORT))?;
        let bind = context.get_string_or(CONFIG_BIND, DEFAULT_BIND).trim();
        if bind.is_empty() {
            return Err(ConfigError::invalid_value(CONFIG_BIND, bind, "host is empty").into());
        }

        let injected = self.injected.lock().take();
        let is_injected = injected.is_some();
        let (handler_name, handler) = match injected {
            Some(handler) => (
                context
                    .get_string_or(CONFIG_HANDLER, INJECTED_HANDLER)
                    .to_string(),
                handler,
            ),
            None => {
                link_builtin_handlers();
                let name = context.get_string_or(CONFIG_HANDLER, DEFAULT_HANDLER);
                (name.trim().to_ascii_lowercase(), resolve_handler(name)?)
            }
        };

        let handler_context = context.sub_properties(CONFIG_HANDLER_PREFIX);
        debug!(
            source = %self.name,
            handler = %handler_name,
            keys = handler_context.len(),
            "Configuring handler"
        );
        let handler = match ConfiguredHandler::try_configure(
            handler_name,
            handler,
            &handler_context,
        ) {
            Ok(handler) => handler,
            Err((err, handler)) => {
                // An injected handler stays available for the next attempt.
                if is_injected {
                    *self.injected.lock() = Some(handler);
                }
                return Err(err.into());
            }
        };

        info!(
            source = %self.name,
            bind = %bind,
            port,
            handler = %handler.name(),
            "HTTP source configured"
        );

        *state = SourceState::Configured(SourceSettings {
            bind: bind.to_string(),
            port,
            dispatcher: Arc::new(Dispatcher::new(
                self.name.clone(),
                handler,
                self.channel.clone(),
            )),
        });
        Ok(())
    }

    /// Binds the transport and starts serving requests.
    pub async fn start(&self) -> SourceResult<()> {
        let mut state = self.state.lock().await;
        let settings = match &*state {
            SourceState::Configured(settings) => settings.clone(),
            SourceState::Unconfigured => return Err(LifecycleError::NotConfigured.into()),
            SourceState::Started { .. } => {
                error!(
                    source = %self.name,
                    "A running HTTP server was found in the source before starting one"
                );
                return Err(LifecycleError::AlreadyStarted.into());
            }
            SourceState::Stopped => return Err(LifecycleError::Stopped.into()),
        };

        let addr = settings.listen_addr();
        let server = http_listen(&addr, settings.dispatcher.clone()).await?;
        if !server.is_running() {
            let addr = server.local_addr();
            if let Err(e) = server.shutdown().await {
                error!(
                    source = %self.name,
                    addr = %addr,
                    error = %e,
                    "Error stopping HTTP server after failed start"
                );
            }
            return Err(TransportError::NotRunning.into());
        }

        info!(
            source = %self.name,
            addr = %server.local_addr(),
            handler = %settings.dispatcher.handler().name(),
            "HTTP source started"
        );
        *state = SourceState::Started { settings, server };
        Ok(())
    }

    /// Stops the transport and waits for the serve loop to exit.
    ///
    /// Failures are logged, never returned. A source that is not started is
    /// left untouched.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, SourceState::Stopped) {
            SourceState::Started { settings, server } => {
                let addr = server.local_addr();
                if let Err(e) = server.shutdown().await {
                    error!(
                        source = %self.name,
                        addr = %addr,
                        error = %e,
                        "Error stopping HTTP server"
                    );
                }
                info!(
                    source = %self.name,
                    addr = %addr,
                    handler = %settings.dispatcher.handler().name(),
                    "HTTP source stopped"
                );
            }
            previous => {
                warn!(
                    source = %self.name,
                    status = %previous.status(),
                    "HTTP source is not started, nothing to stop"
                );
                *state = previous;
            }
        }
    }
}

impl fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use spout_core::{
        Channel, ChannelError, ChannelResult, EventBatch, HandlerResult, SourceError,
        SourceHandler, SourceRequest,
    };

    use crate::channel::MemoryChannel;

    struct FullChannel;

    #[async_trait]
    impl Channel for FullChannel {
        async fn process_batch(&self, _events: EventBatch) -> ChannelResult<()> {
            Err(ChannelError::full("capacity reached"))
        }
    }

    /// Reports the configured `tag` in every event body.
    #[derive(Default)]
    struct TagHandler {
        tag: String,
    }

    impl SourceHandler for TagHandler {
        fn configure(&mut self, context: &Context) -> spout_core::ConfigResult<()> {
            self.tag = context
                .get_string("tag")
                .ok_or_else(|| ConfigError::missing_field("tag"))?
                .to_string();
            Ok(())
        }

        fn get_events(&self, _request: &SourceRequest) -> HandlerResult<EventBatch> {
            Ok(vec![spout_core::Event::with_body(self.tag.clone())])
        }
    }

    fn local_context() -> Context {
        Context::new().with("bind", "127.0.0.1").with("port", "0")
    }

    fn memory_channel() -> Arc<MemoryChannel> {
        Arc::new(MemoryChannel::new(100, Duration::ZERO))
    }

    async fn started(channel: BoxedChannel, context: Context) -> (HttpSource, String) {
        let source = HttpSource::new("test", channel);
        source.configure(&context).await.unwrap();
        source.start().await.unwrap();
        let url = format!("http://{}/", source.local_addr().await.unwrap());
        (source, url)
    }

    #[tokio::test]
    async fn test_post_json_commits_batch() {
        let channel = memory_channel();
        let (source, url) = started(channel.clone(), local_context()).await;

        let resp = reqwest::Client::new()
            .post(&url)
            .header("content-type", "application/json; charset=UTF-8")
            .body(r#"[{"headers":{"a":"b"},"body":"random_body"}]"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);

        let events = channel.try_take(10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].header("a"), Some("b"));
        assert_eq!(events[0].body_str(), Some("random_body"));

        source.stop().await;
        assert_eq!(source.status().await, SourceStatus::Stopped);
    }

    #[tokio::test]
    async fn test_bad_body_is_rejected_without_submission() {
        let channel = memory_channel();
        let (source, url) = started(channel.clone(), local_context()).await;

        let resp = reqwest::Client::new()
            .post(&url)
            .body("not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        assert!(
            resp.text()
                .await
                .unwrap()
                .starts_with("Bad request from client.")
        );
        assert!(channel.is_empty());

        source.stop().await;
    }

    #[tokio::test]
    async fn test_full_channel_is_service_unavailable() {
        let (source, url) = started(Arc::new(FullChannel), local_context()).await;

        let resp = reqwest::Client::new()
            .post(&url)
            .body(r#"[{"body":"x"}]"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 503);

        source.stop().await;
    }

    #[tokio::test]
    async fn test_get_uses_same_path() {
        let channel = memory_channel();
        let (source, url) = started(channel.clone(), local_context().with("handler", "blob")).await;

        let resp = reqwest::Client::new()
            .get(format!("{url}?file=a.log"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        // Empty body decodes to an empty batch.
        assert!(channel.is_empty());

        source.stop().await;
    }

    #[tokio::test]
    async fn test_start_twice_keeps_first_binding() {
        let channel = memory_channel();
        let (source, url) = started(channel.clone(), local_context()).await;

        let err = source.start().await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Lifecycle(LifecycleError::AlreadyStarted)
        ));

        let resp = reqwest::Client::new()
            .post(&url)
            .body("[]")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);

        source.stop().await;
    }

    #[tokio::test]
    async fn test_configure_requires_port() {
        let source = HttpSource::new("test", memory_channel());
        let err = source.configure(&Context::new()).await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Config(ConfigError::MissingField { .. })
        ));
        assert_eq!(source.status().await, SourceStatus::Unconfigured);

        for port in ["http", "70000", "-1"] {
            let err = source
                .configure(&Context::new().with("port", port))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                SourceError::Config(ConfigError::InvalidValue { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_handler() {
        let source = HttpSource::new("test", memory_channel());
        let err = source
            .configure(&local_context().with("handler", "no-such-handler"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SourceError::Config(ConfigError::UnknownHandler { .. })
        ));
    }

    #[tokio::test]
    async fn test_handler_properties_are_forwarded() {
        let channel = memory_channel();
        let source = HttpSource::new("test", channel.clone())
            .with_handler(Box::new(TagHandler::default()));

        source
            .configure(&local_context().with("handler.tag", "t1"))
            .await
            .unwrap();
        source.start().await.unwrap();
        let url = format!("http://{}/", source.local_addr().await.unwrap());

        let resp = reqwest::Client::new().post(&url).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(channel.try_take(10)[0].body_str(), Some("t1"));

        source.stop().await;
    }

    #[tokio::test]
    async fn test_rejected_handler_config_can_be_retried() {
        let channel = memory_channel();
        let source = HttpSource::new("test", channel.clone())
            .with_handler(Box::new(TagHandler::default()));

        // Without `handler.tag` the injected handler refuses its configuration.
        let err = source.configure(&local_context()).await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Config(ConfigError::MissingField { .. })
        ));
        assert_eq!(source.status().await, SourceStatus::Unconfigured);

        // The retry must still use the injected handler, not the json default.
        source
            .configure(&local_context().with("handler.tag", "x"))
            .await
            .unwrap();
        source.start().await.unwrap();
        let url = format!("http://{}/", source.local_addr().await.unwrap());

        let resp = reqwest::Client::new()
            .post(&url)
            .body("anything")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(channel.try_take(10)[0].body_str(), Some("x"));

        source.stop().await;
    }

    #[tokio::test]
    async fn test_lifecycle_guards() {
        let source = HttpSource::new("test", memory_channel());
        assert!(matches!(
            source.start().await,
            Err(SourceError::Lifecycle(LifecycleError::NotConfigured))
        ));

        // Stop before start is a no-op.
        source.stop().await;
        assert_eq!(source.status().await, SourceStatus::Unconfigured);

        source.configure(&local_context()).await.unwrap();
        assert!(matches!(
            source.configure(&local_context()).await,
            Err(SourceError::Lifecycle(LifecycleError::AlreadyConfigured))
        ));
        source.stop().await;
        assert_eq!(source.status().await, SourceStatus::Configured);

        source.start().await.unwrap();
        assert!(source.local_addr().await.is_some());
        source.stop().await;
        assert!(source.local_addr().await.is_none());

        assert!(matches!(
            source.start().await,
            Err(SourceError::Lifecycle(LifecycleError::Stopped))
        ));
    }

    #[tokio::test]
    async fn test_bind_failure_keeps_source_configured() {
        let (first, _) = started(memory_channel(), local_context()).await;
        let port = first.local_addr().await.unwrap().port().to_string();

        let second = HttpSource::new("second", memory_channel());
        second
            .configure(&Context::new().with("bind", "127.0.0.1").with("port", port))
            .await
            .unwrap();
        assert!(matches!(
            second.start().await,
            Err(SourceError::Transport(TransportError::BindFailed { .. }))
        ));
        assert_eq!(second.status().await, SourceStatus::Configured);

        first.stop().await;
    }

    #[test]
    fn test_ipv6_listen_addr() {
        let handler = ConfiguredHandler::configure(
            "tag",
            Box::new(TagHandler {
                tag: String::new(),
            }),
            &Context::new().with("tag", "x"),
        )
        .unwrap();
        let settings = SourceSettings {
            bind: "::1".to_string(),
            port: 8080,
            dispatcher: Arc::new(Dispatcher::new("test", handler, memory_channel())),
        };
        assert_eq!(settings.listen_addr(), "[::1]:8080");
    }
}

//! Runtime orchestration: configuration, logging and the source lifecycle.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use spout_runtime::{MemoryChannel, SpoutRuntime};
//!
//! let config = spout_runtime::config::load_config()?;
//! let channel = Arc::new(MemoryChannel::from_config(&config.channel));
//! let runtime = SpoutRuntime::from_config(&config, channel.clone());
//!
//! // Serves until Ctrl+C or SIGTERM.
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::net::SocketAddr;

use spout_core::{BoxedChannel, BoxedHandler};
use tokio::signal;
use tracing::{debug, info};

use crate::config::{ConfigLoader, SpoutConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::source::{HttpSource, SourceStatus};

/// Runs one [`HttpSource`] configured from a [`SpoutConfig`].
pub struct SpoutRuntime {
    config: SpoutConfig,
    source: HttpSource,
}

impl SpoutRuntime {
    /// Creates a runtime builder for custom configuration.
    ///
    /// ```rust,ignore
    /// let runtime = SpoutRuntime::builder()
    ///     .config_file("config/spout.toml")
    ///     .profile("production")
    ///     .build(channel)?;
    /// ```
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from a loaded configuration.
    ///
    /// Initializes logging from `config.logging` unless a subscriber is
    /// already installed.
    pub fn from_config(config: &SpoutConfig, channel: BoxedChannel) -> Self {
        Self::with_source(config, HttpSource::new(config.source.name.as_str(), channel))
    }

    fn with_source(config: &SpoutConfig, source: HttpSource) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            source = %config.source.name,
            "Spout runtime created"
        );

        Self {
            config: config.clone(),
            source,
        }
    }

    pub fn config(&self) -> &SpoutConfig {
        &self.config
    }

    pub fn source(&self) -> &HttpSource {
        &self.source
    }

    /// Address the source is bound to while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.source.local_addr().await
    }

    /// Configures the source on first use and starts it.
    pub async fn start(&self) -> RuntimeResult<()> {
        if self.source.status().await == SourceStatus::Unconfigured {
            let context = self.config.source.to_context();
            debug!(keys = context.len(), "Configuring source from [source] section");
            self.source.configure(&context).await?;
        }
        self.source.start().await?;
        info!("Spout runtime started");
        Ok(())
    }

    /// Stops the source. Never fails.
    pub async fn stop(&self) {
        self.source.stop().await;
        info!("Spout runtime stopped");
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;
        info!("Spout is now running. Press Ctrl+C to stop.");

        let signal = wait_for_shutdown().await;
        self.stop().await;
        signal
    }

    /// Runs until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await;
        Ok(())
    }
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(|e| RuntimeError::Signal(e.to_string()))?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.map_err(|e| RuntimeError::Signal(e.to_string()))?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .map_err(|e| RuntimeError::Signal(e.to_string()))?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`SpoutRuntime`] with custom configuration loading.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    handler: Option<BoxedHandler>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            handler: None,
        }
    }

    /// Loads this file instead of searching for one.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Overrides files and environment with `values`, see
    /// [`ConfigLoader::merge`].
    pub fn merge<T: serde::Serialize>(mut self, values: T) -> Self {
        self.config_loader = self.config_loader.merge(values);
        self
    }

    /// Uses a pre-built handler instead of the registry.
    pub fn handler(mut self, handler: BoxedHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Loads the configuration and builds the runtime around `channel`.
    pub fn build(self, channel: BoxedChannel) -> RuntimeResult<SpoutRuntime> {
        let config = self.config_loader.load()?;
        let mut source = HttpSource::new(config.source.name.as_str(), channel);
        if let Some(handler) = self.handler {
            source = source.with_handler(handler);
        }
        Ok(SpoutRuntime::with_source(&config, source))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

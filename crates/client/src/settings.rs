use std::path::Path;
use std::time::Duration;

use busline_core::config::{EngineConfig, EngineConfigError};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, FileFormat};
use reqwest::Url;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ClientConfigError {
    #[error("{msg}: {source}")]
    ConfigReadError {
        msg: String,
        source: config::ConfigError,
    },
    #[error("api_base '{value}' is not a usable base url: {reason}")]
    InvalidApiBase { value: String, reason: String },
    #[error(transparent)]
    Engine(#[from] EngineConfigError),
}

/// Settings of the headless client.
///
/// Read from an optional TOML file, then from `BUSLINE_*` environment
/// variables (`BUSLINE_API_BASE`, `BUSLINE_ENGINE__EVICTION_CYCLES`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base: String,
    /// `tracing` filter directives, used when `RUST_LOG` is unset
    pub log_filter: String,
    pub request_timeout_secs: u64,
    pub engine: EngineConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_owned(),
            log_filter: "info,busline_core=debug".to_owned(),
            request_timeout_secs: 10,
            engine: EngineConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ClientConfigError> {
        let mut builder = Config::builder();
        let origin = match path {
            Some(path) => {
                let path = path.to_string_lossy();
                builder = builder.add_source(config::File::new(&path, FileFormat::Toml));
                format!("'{path}'")
            }
            None => "the environment".to_owned(),
        };

        Self::build(builder, &origin)
    }

    fn build(
        builder: ConfigBuilder<DefaultState>,
        origin: &str,
    ) -> Result<Self, ClientConfigError> {
        let config = builder
            .add_source(
                Environment::with_prefix("BUSLINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ClientConfigError::ConfigReadError {
                msg: format!("failed reading {origin}"),
                source: e,
            })?;

        let client = config
            .try_deserialize::<ClientConfig>()
            .map_err(|e| ClientConfigError::ConfigReadError {
                msg: format!("failed deserializing {origin}"),
                source: e,
            })?;

        client.validate()?;
        Ok(client)
    }

    pub fn validate(&self) -> Result<(), ClientConfigError> {
        self.api_base_url()?;
        self.engine.validate()?;
        Ok(())
    }

    pub fn api_base_url(&self) -> Result<Url, ClientConfigError> {
        let invalid = |reason: String| ClientConfigError::InvalidApiBase {
            value: self.api_base.clone(),
            reason,
        };

        let url = Url::parse(&self.api_base).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("cannot carry a path".to_owned()));
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

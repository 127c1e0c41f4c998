//! Configuration for the completion client and its HTTP transport

use std::path::Path;
use log::{debug, error};
use serde::{Deserialize, Serialize};

/// Model used when neither the request nor the config names one
pub const FALLBACK_MODEL: &str = "llama3-70b-8192";

/// Timeout applied to non-streaming completion calls
pub const COMPLETION_TIMEOUT_MS: u64 = 600_000;

const DEFAULT_API_BASE: &str = "http://localhost:51119";
const DEFAULT_STREAM_BASE: &str = "http://localhost:51119/api";

/// Client configuration
///
/// Owned by a single [`crate::client::MedInfoClient`]; read when
/// building requests and mutated only through the client's setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig
{   /// Whether the advanced editing UI is enabled
    pub advanced: bool
  , /// Chat completion route on the backend proxy
    pub api_endpoint: String
  , /// Model listing route on the backend proxy
    pub models_endpoint: String
  , /// Model used when a request does not name one
    pub selected_model: Option<String>
  , /// Models reported by the last successful listing
    pub available_models: Vec<crate::request::ModelInfo>
  , /// Timeout for non-streaming completion calls
    pub completion_timeout_ms: u64
}

impl Default for ClientConfig
{   fn default() -> Self
    {   ClientConfig
        {   advanced: true
          , api_endpoint: "chat/completions".to_string()
          , models_endpoint: "models".to_string()
          , selected_model: Some(FALLBACK_MODEL.to_string())
          , available_models: vec![]
          , completion_timeout_ms: COMPLETION_TIMEOUT_MS
        }
    }
}

impl ClientConfig
{   /// Parse a config from JSON; missing fields take defaults
    pub fn from_json_str(json: &str)
      -> Result<Self, crate::error::Error>
    {   serde_json::from_str(json).map_err(|e| {
          error!("Bad client config: {}", e);
          crate::error::Error::InvalidConfiguration(e.to_string())
        })
    }

    /// Load a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading client config from {}", path.display());
        let text = read_config_file(path)?;
        Self::from_json_str(&text)
    }

    /// Model to use for a request, falling back to the
    /// selected model and then to [`FALLBACK_MODEL`]
    pub fn resolve_model(&self, requested: Option<&str>) -> String
    {   requested
          .filter(|m| !m.is_empty())
          .or(self.selected_model.as_deref().filter(|m| !m.is_empty()))
          .unwrap_or(FALLBACK_MODEL)
          .to_string()
    }
}

/// Base URLs for the HTTP transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig
{   /// Base URL for regular JSON calls
    pub api_base: String
  , /// Base URL for the streaming completion proxy
    pub stream_base: String
}

impl Default for TransportConfig
{   fn default() -> Self
    {   TransportConfig
        {   api_base: DEFAULT_API_BASE.to_string()
          , stream_base: DEFAULT_STREAM_BASE.to_string()
        }
    }
}

impl TransportConfig
{   /// Defaults overridden by `MEDINFO_API_BASE` and
    /// `MEDINFO_STREAM_BASE` when set
    pub fn from_env() -> Self
    {   let mut config = TransportConfig::default();
        if let Ok(base) = std::env::var("MEDINFO_API_BASE")
        {   debug!("api_base from environment: {}", base);
            config.api_base = base;
        }
        if let Ok(base) = std::env::var("MEDINFO_STREAM_BASE")
        {   debug!("stream_base from environment: {}", base);
            config.stream_base = base;
        }
        config
    }

    /// Parse a transport config from JSON
    pub fn from_json_str(json: &str)
      -> Result<Self, crate::error::Error>
    {   serde_json::from_str(json).map_err(|e| {
          error!("Bad transport config: {}", e);
          crate::error::Error::InvalidConfiguration(e.to_string())
        })
    }

    /// Load a transport config from a JSON file
    pub fn from_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let text = read_config_file(path.as_ref())?;
        Self::from_json_str(&text)
    }
}

fn read_config_file(path: &Path)
  -> Result<String, crate::error::Error>
{   std::fs::read_to_string(path).map_err(|e| {
      error!("Cannot read {}: {}", path.display(), e);
      crate::error::Error::InvalidConfiguration(
        format!("{}: {}", path.display(), e)
      )
    })
}

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stl_decoder::DecoderConfig;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_USER_AGENT: &str = concat!("stl-client/", env!("CARGO_PKG_VERSION"));

/// Client configuration, usually read from a TOML file.
///
/// ```toml
/// uri = "https://storage.example.com"
/// binary = true
///
/// [decoder]
/// kind = "process"
/// runtime = "node"
/// timeout_ms = 30000
///
/// [transport]
/// timeout_ms = 10000
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URI of the storage.
    pub uri: Option<String>,
    /// Request the binary timeline encoding.
    pub binary: bool,
    pub decoder: DecoderConfig,
    pub transport: TransportConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Limit on one whole exchange. `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> ClientResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// The configured storage URI, required to open a storage.
    pub fn require_uri(&self) -> ClientResult<&str> {
        self.uri
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ClientError::Config("no storage uri configured".into()))
    }
}

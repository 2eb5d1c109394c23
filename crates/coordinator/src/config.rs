//! Coordinator configuration.

use crate::dispatch::DemoFallbackPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vitalis_common::{Result, VitalisError};
use vitalis_llm::LlmConfig;
use vitalis_store::DEMO_NAMES;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoordinatorConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub demo: DemoConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Demo-identity retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_demo_names")]
    pub known_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_demo_names() -> Vec<String> {
    DEMO_NAMES.iter().map(|n| n.to_string()).collect()
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            known_names: default_demo_names(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl CoordinatorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| VitalisError::Config(format!("invalid configuration: {e}")))
    }

    pub fn demo_policy(&self) -> DemoFallbackPolicy {
        DemoFallbackPolicy {
            enabled: self.demo.enabled,
            known_names: self.demo.known_names.clone(),
        }
    }
}

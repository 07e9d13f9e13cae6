use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{LeafLensError, LeafLensResult};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub mock: MockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Key into `endpoints`, or "mock" for the built-in provider.
    #[serde(default = "default_active_provider")]
    pub active: String,
    #[serde(default)]
    pub endpoints: HashMap<String, EndpointEntry>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            active: default_active_provider(),
            endpoints: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointEntry {
    pub display_name: String,
    pub api_base: String,
    /// Optional API key stored in config.toml (falls back to env var LEAFLENS_<ID>_API_KEY).
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Assumed on-screen container for the CLI, standing in for a live layout
/// measurement. A front end replaces this with real resize events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_container_width")]
    pub container_width: f64,
    #[serde(default = "default_container_height")]
    pub container_height: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            container_width: default_container_width(),
            container_height: default_container_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Height in pixels reserved for the label drawn directly above each box.
    #[serde(default = "default_label_height")]
    pub label_height_px: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            label_height_px: default_label_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated processing delay before the mock verdict comes back.
    #[serde(default = "default_mock_delay_ms")]
    pub delay_ms: u64,
    /// Share of uploads reported healthy, 0.0 to 1.0.
    #[serde(default = "default_healthy_bias")]
    pub healthy_bias: f64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_mock_delay_ms(),
            healthy_bias: default_healthy_bias(),
        }
    }
}

fn default_active_provider() -> String {
    "mock".to_string()
}

fn default_container_width() -> f64 {
    800.0
}

fn default_container_height() -> f64 {
    600.0
}

fn default_label_height() -> f64 {
    18.0
}

fn default_mock_delay_ms() -> u64 {
    250
}

fn default_healthy_bias() -> f64 {
    0.3
}

fn resolve_config_path() -> LeafLensResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(LeafLensError::Config(
        "config.toml not found next to executable or in working directory".into(),
    ))
}

pub fn load_config() -> LeafLensResult<AppConfig> {
    let path = resolve_config_path()?;
    let content = std::fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), provider = %config.provider.active, "config loaded");
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> LeafLensResult<()> {
    let path = resolve_config_path()?;
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_mock_provider() {
        let config = AppConfig::default();
        assert_eq!(config.provider.active, "mock");
        assert!(config.provider.endpoints.is_empty());
        assert_eq!(config.overlay.label_height_px, 18.0);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [provider]
            active = "greenhouse"

            [provider.endpoints.greenhouse]
            display_name = "Greenhouse API"
            api_base = "https://api.example.com/analyze"
            "#,
        )
        .unwrap();
        assert_eq!(config.provider.active, "greenhouse");
        assert_eq!(config.display.container_width, 800.0);
        assert_eq!(config.mock.delay_ms, 250);
        let entry = &config.provider.endpoints["greenhouse"];
        assert!(entry.api_key.is_none());
    }
}

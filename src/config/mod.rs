pub mod schema;

pub use schema::AgentConfig;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file name inside the home directory.
pub const CONFIG_FILE: &str = "agent.toml";

/// Default home directory (~/.tool-agent).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".tool-agent"))
        .unwrap_or_else(|| PathBuf::from(".tool-agent"))
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path).context("Failed to read agent config file")?;
        let config: AgentConfig =
            toml::from_str(&contents).context("Failed to parse agent config (TOML)")?;
        Ok(config)
    } else {
        debug!("No config at {}, using defaults", path.display());
        Ok(AgentConfig::default())
    }
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &AgentConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}

/// Apply secrets and endpoints from the environment over the file values.
pub fn apply_env_overrides(config: &mut AgentConfig) {
    apply_overrides(config, |name| std::env::var(name).ok());
}

fn apply_overrides(config: &mut AgentConfig, var: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| var(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = get("AMAP_KEY").or_else(|| get("GD_KEY")) {
        config.amap_key = key;
    }
    if let Some(key) = get("OPENAI_API_KEY") {
        config.model_api_key = key;
    }
    if let Some(url) = get("OPENAI_BASE_URL") {
        config.model_api_url = url;
    }
}

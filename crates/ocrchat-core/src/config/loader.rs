//! Config loader — reads `~/.ocrchat/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.ocrchat/config.json`
//! 3. Environment variables `OCRCHAT_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    let config = load_config_from_path(&config_path);
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `OCRCHAT_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `OCRCHAT_DEFAULTS__MODEL` → `defaults.model`
/// - `OCRCHAT_DEFAULTS__MAX_TOKENS` → `defaults.max_tokens`
/// - `OCRCHAT_DEFAULTS__TIMEOUT_SECS` → `defaults.timeout_secs`
/// - `OCRCHAT_DEFAULTS__SYSTEM_INSTRUCTION` → `defaults.system_instruction`
/// - `OCRCHAT_PROVIDERS__<NAME>__API_KEY` → `providers.<name>.api_key`
/// - `OCRCHAT_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
fn apply_env_overrides<F>(mut config: Config, var: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = var("OCRCHAT_DEFAULTS__MODEL") {
        config.defaults.model = val;
    }
    if let Some(val) = var("OCRCHAT_DEFAULTS__MAX_TOKENS") {
        match val.parse::<u32>() {
            Ok(n) => config.defaults.max_tokens = n,
            Err(_) => warn!(value = %val, "ignoring invalid OCRCHAT_DEFAULTS__MAX_TOKENS"),
        }
    }
    if let Some(val) = var("OCRCHAT_DEFAULTS__TIMEOUT_SECS") {
        match val.parse::<u64>() {
            Ok(n) => config.defaults.timeout_secs = Some(n),
            Err(_) => warn!(value = %val, "ignoring invalid OCRCHAT_DEFAULTS__TIMEOUT_SECS"),
        }
    }
    if let Some(val) = var("OCRCHAT_DEFAULTS__SYSTEM_INSTRUCTION") {
        config.defaults.system_instruction = Some(val);
    }

    apply_provider_env(&mut config.providers.anthropic, "ANTHROPIC", &var);
    apply_provider_env(&mut config.providers.gemini, "GEMINI", &var);
    apply_provider_env(&mut config.providers.openai, "OPENAI", &var);

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env<F>(provider: &mut ProviderConfig, name: &str, var: &F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = var(&format!("OCRCHAT_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Some(val) = var(&format!("OCRCHAT_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

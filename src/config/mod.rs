//! Configuration file parsing, environment-variable overrides, and the
//! provider/key resolution order described in spec §4.E and §6.
//!
//! The config file is a flat TOML table — no sections, just `key = "value"`
//! assignment and `#` comments — which is exactly what spec.md §6
//! specifies, so the `toml` crate's ordinary table parsing applies as-is.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One `name=cmd arg1 arg2` entry from the `mcp_servers` config key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpServerConfig {
    pub name: String,
    pub argv: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    default_provider: Option<String>,
    default_model: Option<String>,
    memory_backend: Option<String>,
    fallback_providers: Option<String>,
    api_key: Option<String>,
    discord_token: Option<String>,
    discord_webhook: Option<String>,
    telegram_token: Option<String>,
    mcp_servers: Option<String>,
}

/// Fully resolved configuration for one BareClaw process.
#[derive(Debug, Clone)]
pub struct Config {
    pub default_provider: String,
    pub default_model: String,
    pub memory_backend: String,
    pub fallback_providers: Vec<String>,
    pub api_key: Option<String>,
    pub discord_token: Option<String>,
    pub discord_webhook: Option<String>,
    pub telegram_token: Option<String>,
    pub mcp_servers: Vec<McpServerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: "echo".to_string(),
            default_model: "default".to_string(),
            memory_backend: "markdown".to_string(),
            fallback_providers: Vec::new(),
            api_key: None,
            discord_token: None,
            discord_webhook: None,
            telegram_token: None,
            mcp_servers: Vec::new(),
        }
    }
}

/// Default config path: `<home>/.bareclaw/config.toml`.
pub fn default_config_path(home: &Path) -> PathBuf {
    home.join(".bareclaw").join("config.toml")
}

/// Load configuration from `path` if it exists, applying environment
/// overrides afterwards regardless. A missing file is not an error — it
/// yields `Config::default()` with overrides applied on top.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let raw = match std::fs::read_to_string(path) {
        Ok(content) => parse_config_str(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => RawConfig::default(),
        Err(e) => return Err(e.into()),
    };

    let mut config = Config {
        default_provider: raw.default_provider.unwrap_or_else(|| "echo".to_string()),
        default_model: raw.default_model.unwrap_or_else(|| "default".to_string()),
        memory_backend: raw.memory_backend.unwrap_or_else(|| "markdown".to_string()),
        fallback_providers: raw
            .fallback_providers
            .map(|s| split_csv(&s))
            .unwrap_or_default(),
        api_key: raw.api_key,
        discord_token: raw.discord_token,
        discord_webhook: raw.discord_webhook,
        telegram_token: raw.telegram_token,
        mcp_servers: raw
            .mcp_servers
            .as_deref()
            .map(parse_mcp_servers)
            .unwrap_or_default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn parse_config_str(content: &str) -> anyhow::Result<RawConfig> {
    toml::from_str(content).map_err(|e| anyhow::anyhow!("failed to parse config.toml: {e}"))
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `mcp_servers`: pipe-separated `name=cmd arg1 arg2` entries.
pub fn parse_mcp_servers(spec: &str) -> Vec<McpServerConfig> {
    spec.split('|')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let (name, rest) = entry.split_once('=')?;
            let argv: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
            if argv.is_empty() {
                return None;
            }
            Some(McpServerConfig {
                name: name.trim().to_string(),
                argv,
            })
        })
        .collect()
}

/// Override config fields from environment variables, exactly the set spec
/// §6 lists. Env vars win over whatever was parsed from the file.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(v) = env_nonempty("DISCORD_BOT_TOKEN") {
        config.discord_token = Some(v);
    }
    if let Some(v) = env_nonempty("TELEGRAM_BOT_TOKEN") {
        config.telegram_token = Some(v);
    }
    // BARECLAW_API_KEY / API_KEY act as a generic override for `api_key`;
    // per-provider resolution (resolve_api_key) layers the more specific
    // env vars on top of this at call time.
    if let Some(v) = env_nonempty("BARECLAW_API_KEY").or_else(|| env_nonempty("API_KEY")) {
        config.api_key = Some(v);
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Resolve the API key for `provider` following spec §4.E's order:
/// backend-specific env var, then `BARECLAW_API_KEY`, then the config file
/// value. Ollama is keyless and always resolves to `None`.
pub fn resolve_api_key(provider: &str, config: &Config) -> Option<String> {
    let backend_env = match provider {
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "openai" | "openai-compatible" => Some("OPENAI_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        _ => None,
    };

    if let Some(name) = backend_env {
        if let Some(v) = env_nonempty(name) {
            return Some(v);
        }
    }

    if let Some(v) = env_nonempty("BARECLAW_API_KEY") {
        return Some(v);
    }

    config.api_key.clone()
}

/// Base URL override for providers that read one (Ollama, a custom
/// OpenAI-compatible gateway).
pub fn resolve_ollama_url() -> Option<String> {
    env_nonempty("OLLAMA_URL")
}

pub fn resolve_openai_compatible_url() -> Option<String> {
    env_nonempty("BARECLAW_API_URL")
}

#[cfg(test)]
mod tests;

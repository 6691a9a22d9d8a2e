//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults, so a missing file still yields a usable config.
//! Secrets are referenced by env-var name and resolved at runtime; the
//! `ESPN_TRANSACTION_*` / `ESPN_LINEUP_*` variables override the write
//! endpoints after the file is loaded.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_READ_BASE: &str = "https://lm-api-reads.fantasy.espn.com";
pub const DEFAULT_WRITE_BASE: &str = "https://lm-api-writes.fantasy.espn.com";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub espn: EspnConfig,
    #[serde(default)]
    pub transactions: TransactionsConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    /// League context document (ids, credentials, strategy, tracking).
    pub context_path: String,
    /// Hard cap on interactive regenerations per cycle.
    pub max_regenerations: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "waiverwire".into(),
            context_path: "context.json".into(),
            max_regenerations: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EspnConfig {
    pub read_base: String,
    pub write_base: String,
    pub timeout_secs: u64,
    /// Env var holding the SWID cookie.
    pub swid_env: String,
    /// Env var holding the espn_s2 cookie.
    pub espn_s2_env: String,
    pub free_agent_pool_size: usize,
}

impl Default for EspnConfig {
    fn default() -> Self {
        Self {
            read_base: DEFAULT_READ_BASE.into(),
            write_base: DEFAULT_WRITE_BASE.into(),
            timeout_secs: 30,
            swid_env: "SWID".into(),
            espn_s2_env: "ESPN_S2".into(),
            free_agent_pool_size: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TransactionsConfig {
    #[serde(default)]
    pub add_drop: EndpointConfig,
    #[serde(default)]
    pub lineup: EndpointConfig,
}

/// One write endpoint. `url` replaces the whole URL; otherwise
/// `base` (or `espn.write_base`) + the league transactions path.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: Option<String>,
    pub base: Option<String>,
    /// Defaults differ per endpoint: none for add/drop, `/` for lineup.
    pub trailing_slash: Option<bool>,
    /// Inline JSON body template.
    pub body: Option<String>,
    /// Path to a JSON body template; used instead of `body` when it exists.
    pub body_file: Option<String>,
}

impl EndpointConfig {
    /// Apply `{prefix}_URL`, `{prefix}_BASE`, `{prefix}_BODY`, `{prefix}_BODY_FILE`.
    pub fn with_env_overrides(mut self, prefix: &str) -> Self {
        let lookup = |suffix: &str| {
            std::env::var(format!("{prefix}_{suffix}"))
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(url) = lookup("URL") {
            self.url = Some(url);
        }
        if let Some(base) = lookup("BASE") {
            self.base = Some(base);
        }
        if let Some(body) = lookup("BODY") {
            self.body = Some(body);
        }
        if let Some(file) = lookup("BODY_FILE") {
            self.body_file = Some(file);
        }
        self
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
    /// Env var holding the API password. Unset → open access.
    pub password_env: String,
    pub allowed_origins: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8000,
            password_env: "BOT_API_PASSWORD".into(),
            allowed_origins: vec![
                "http://localhost:5173".into(),
                "http://127.0.0.1:5173".into(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load `path` if it exists, else defaults; then apply env overrides.
    pub fn load_or_default(path: &str) -> Result<Self> {
        let config = if Path::new(path).exists() {
            info!(path, "Loading configuration");
            Self::load(path)?
        } else {
            warn!(path, "Config file not found, using defaults");
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        self.transactions.add_drop = self
            .transactions
            .add_drop
            .with_env_overrides("ESPN_TRANSACTION");
        self.transactions.lineup = self.transactions.lineup.with_env_overrides("ESPN_LINEUP");
        self
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Dashboard password, if one is configured.
    pub fn dashboard_password(&self) -> Option<String> {
        Self::resolve_env(&self.dashboard.password_env)
            .ok()
            .filter(|p| !p.is_empty())
    }
}

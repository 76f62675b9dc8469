//! Configuration types and loading.
//!
//! Config is loaded once at startup from an optional JSON file and the environment.
//! Environment variables take precedence over the file; the result is immutable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Azure Translator settings.
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Bot registration (app id and password) used for connector auth.
    #[serde(default)]
    pub bot: BotConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 3978). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    3978
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Azure Translator endpoint, credentials, and call limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorConfig {
    /// Subscription key. Overridden by AZURE_TRANSLATOR_KEY env. Required to serve.
    pub key: Option<String>,

    /// Base URL of the Translator API. Overridden by AZURE_TRANSLATOR_ENDPOINT env.
    #[serde(default = "default_translator_endpoint")]
    pub endpoint: String,

    /// Resource region. Overridden by AZURE_TRANSLATOR_REGION env.
    #[serde(default = "default_translator_region")]
    pub region: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt for transport errors, 429 and 5xx.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

pub const DEFAULT_TRANSLATOR_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";

fn default_translator_endpoint() -> String {
    DEFAULT_TRANSLATOR_ENDPOINT.to_string()
}

fn default_translator_region() -> String {
    "eastus".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            key: None,
            endpoint: default_translator_endpoint(),
            region: default_translator_region(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Bot Framework registration. Both empty means local/emulator mode (no auth, no token).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Microsoft app id. Overridden by BOT_APP_ID env.
    #[serde(default)]
    pub app_id: String,

    /// Microsoft app password. Overridden by BOT_APP_PASSWORD env.
    #[serde(default)]
    pub app_password: String,

    /// Hosts a connector token may be sent to (activity `serviceUrl`). A leading `*.` matches
    /// any subdomain. Only consulted when an app id is configured.
    #[serde(default = "default_trusted_service_hosts")]
    pub trusted_service_hosts: Vec<String>,
}

fn default_trusted_service_hosts() -> Vec<String> {
    [
        "*.botframework.com",
        "smba.trafficmanager.net",
        "*.botframework.azure.us",
        "*.botframework.us",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_password: String::new(),
            trusted_service_hosts: default_trusted_service_hosts(),
        }
    }
}

/// Non-empty, trimmed value of an environment variable.
fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the translator key: env AZURE_TRANSLATOR_KEY overrides config.
pub fn resolve_translator_key(config: &Config) -> Option<String> {
    env_non_empty("AZURE_TRANSLATOR_KEY").or_else(|| {
        config
            .translator
            .key
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Apply environment overrides to a loaded config.
pub fn apply_env(mut config: Config) -> Config {
    config.translator.key = resolve_translator_key(&config);
    if let Some(endpoint) = env_non_empty("AZURE_TRANSLATOR_ENDPOINT") {
        config.translator.endpoint = endpoint;
    }
    if let Some(region) = env_non_empty("AZURE_TRANSLATOR_REGION") {
        config.translator.region = region;
    }
    if let Some(app_id) = env_non_empty("BOT_APP_ID") {
        config.bot.app_id = app_id;
    }
    if let Some(password) = env_non_empty("BOT_APP_PASSWORD") {
        config.bot.app_password = password;
    }
    if let Some(port) = env_non_empty("PORT") {
        match port.parse::<u16>() {
            Ok(p) => config.gateway.port = p,
            Err(_) => log::warn!("ignoring invalid PORT value: {}", port),
        }
    }
    config
}

/// Resolve config path from env. There is no default file; absent means defaults + env only.
pub fn default_config_path() -> Option<PathBuf> {
    env_non_empty("TRANSBOT_CONFIG_PATH").map(PathBuf::from)
}

/// Read a config file. Missing file => default config.
pub fn read_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        return Ok(Config::default());
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing config from {}", path.display()))
}

/// Load config from the given path (or TRANSBOT_CONFIG_PATH), then apply environment overrides.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path.or_else(default_config_path) {
        Some(p) => read_config_file(&p)?,
        None => Config::default(),
    };
    Ok(apply_env(config))
}

/// Environment variables the operator may set, with a one-line description each.
pub const ENV_GUIDANCE: &[(&str, &str)] = &[
    ("AZURE_TRANSLATOR_KEY", "Your Azure Translator API key"),
    (
        "BOT_APP_ID",
        "Your bot's application ID (optional for local testing)",
    ),
    (
        "BOT_APP_PASSWORD",
        "Your bot's application password (optional for local testing)",
    ),
];

/// Check that everything required to serve is present.
pub fn validate(config: &Config) -> Result<()> {
    if config
        .translator
        .key
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .is_empty()
    {
        anyhow::bail!("missing required environment variables: [\"AZURE_TRANSLATOR_KEY\"]");
    }
    Ok(())
}

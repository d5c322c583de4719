mod defaults;


use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::KasbotError;
use defaults::*;

/// Top-level kasbot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub sheet: SheetConfig,
    #[serde(default)]
    pub job: JobConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Shared secret expected in the `x-api-key` header. Required.
    #[serde(default)]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            api_key: String::new(),
        }
    }
}

/// WhatsApp Web bridge configuration.
///
/// The bridge sidecar owns the browser session and persists its auth artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_bridge_url")]
    pub url: String,
    /// Bearer token for the bridge, if it requires one.
    #[serde(default)]
    pub token: Option<String>,
    /// Long-poll timeout for `/events`.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Phone numbers allowed to issue chat commands. Empty = allow all.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: default_bridge_url(),
            token: None,
            poll_timeout_secs: default_poll_timeout(),
            allowed_users: Vec::new(),
        }
    }
}

/// Google Sheets source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    /// Single cell in A1 notation, read from the first sheet.
    #[serde(default = "default_sheet_range")]
    pub range: String,
    /// API key (works for link-shared sheets).
    #[serde(default)]
    pub api_key: Option<String>,
    /// OAuth access token. Takes precedence over `api_key`.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_sheets_base_url")]
    pub base_url: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            range: default_sheet_range(),
            api_key: None,
            access_token: None,
            base_url: default_sheets_base_url(),
        }
    }
}

/// Group label job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Group to rename (e.g. `120363001234567890@g.us`).
    #[serde(default)]
    pub group_id: String,
    #[serde(default = "default_job_interval")]
    pub interval_secs: u64,
    /// Text between the marker and the amount.
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
    /// Start the job at boot instead of waiting for `start-cron-job`.
    #[serde(default)]
    pub autostart: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            group_id: String::new(),
            interval_secs: default_job_interval(),
            label_prefix: default_label_prefix(),
            autostart: false,
        }
    }
}

impl Config {
    /// Override secrets and deployment-specific values from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Config::apply_env_overrides`] with an injectable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("KASBOT_API_KEY") {
            self.api.api_key = v;
        }
        if let Some(v) = get("KASBOT_GROUP_ID") {
            self.job.group_id = v;
        }
        if let Some(v) = get("KASBOT_SPREADSHEET_ID") {
            self.sheet.spreadsheet_id = v;
        }
        if let Some(v) = get("KASBOT_SHEETS_API_KEY") {
            self.sheet.api_key = Some(v);
        }
        if let Some(v) = get("KASBOT_SHEETS_ACCESS_TOKEN") {
            self.sheet.access_token = Some(v);
        }
        if let Some(v) = get("KASBOT_BRIDGE_TOKEN") {
            self.bridge.token = Some(v);
        }
    }

    /// Reject configurations the gateway cannot run with.
    pub fn validate(&self) -> Result<(), KasbotError> {
        if self.api.api_key.is_empty() {
            return Err(KasbotError::Config(
                "api.api_key is empty. Set it in config.toml or KASBOT_API_KEY.".into(),
            ));
        }
        if self.job.group_id.is_empty() {
            return Err(KasbotError::Config(
                "job.group_id is empty. Set it in config.toml or KASBOT_GROUP_ID.".into(),
            ));
        }
        if self.job.interval_secs == 0 {
            return Err(KasbotError::Config(
                "job.interval_secs must be greater than zero".into(),
            ));
        }
        self.validate_sheet()
    }

    /// Sheet settings only (used by `check-sheet`).
    pub fn validate_sheet(&self) -> Result<(), KasbotError> {
        if self.sheet.spreadsheet_id.is_empty() {
            return Err(KasbotError::Config(
                "sheet.spreadsheet_id is empty. Set it in config.toml or KASBOT_SPREADSHEET_ID."
                    .into(),
            ));
        }
        if self.sheet.range.is_empty() {
            return Err(KasbotError::Config("sheet.range is empty".into()));
        }
        Ok(())
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Environment overrides are
/// not applied here; see [`Config::apply_env_overrides`].
pub fn load(path: &str) -> Result<Config, KasbotError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| KasbotError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| KasbotError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}

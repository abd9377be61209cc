use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_currency() -> String {
    "usd".into()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_feed_base_url() -> String {
    "https://api.coingecko.com/api/v3/simple/price".into()
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_notifier_kind() -> String {
    "telegram".into()
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Fiat currency the feed quotes prices in (e.g. `"usd"`, `"eur"`).
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Period between alert evaluation passes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_base_url")]
    pub base_url: String,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_feed_base_url(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub token: String,
    /// Long-poll timeout handed to getUpdates.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NotifierConfig {
    /// Accepted values: `"telegram"` | `"terminal"`. Terminal logs triggered
    /// alerts instead of messaging the subscriber, for dry runs.
    #[serde(default = "default_notifier_kind")]
    pub kind: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: default_notifier_kind(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_NOTIFIER_KINDS: &[&str] = &["telegram", "terminal"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_currency(config)?;
    validate_intervals(config)?;
    validate_bot_token(config)?;
    validate_notifier_kind(config)?;
    Ok(())
}

fn validate_currency(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.general.currency.is_empty() {
        return Err(Report::new(ConfigError::Validation {
            field: "general.currency must not be empty".into(),
        }));
    }
    Ok(())
}

fn validate_intervals(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.general.poll_interval_secs == 0 {
        return Err(Report::new(ConfigError::Validation {
            field: "general.poll_interval_secs must be at least 1".into(),
        }));
    }
    if config.feed.requests_per_second == 0 {
        return Err(Report::new(ConfigError::Validation {
            field: "feed.requests_per_second must be at least 1".into(),
        }));
    }
    Ok(())
}

fn validate_bot_token(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if config.bot.token.is_empty() {
        return Err(Report::new(ConfigError::Validation {
            field: "bot.token must not be empty".into(),
        }));
    }
    Ok(())
}

fn validate_notifier_kind(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_NOTIFIER_KINDS.contains(&config.notifier.kind.as_str()) {
        return Err(Report::new(ConfigError::Validation {
            field: format!("notifier.kind \"{}\" is not valid", config.notifier.kind),
        }));
    }
    Ok(())
}

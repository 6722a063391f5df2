//! Configuration: an optional TOML file plus environment overrides.
//!
//! The file is optional. A missing or empty file yields `Config::default()`,
//! and every section and key may be omitted. Environment variables are
//! applied on top of the file and take precedence:
//!
//! | Variable              | Effect                                   |
//! |-----------------------|------------------------------------------|
//! | `DISCORD_TOKEN`       | bot token                                |
//! | `DISCORD_CHANNEL_IDS` | comma-separated channel ids              |
//! | `DISCORD_CHANNEL_ID`  | single channel id, used if the above is unset |
//! | `MAX_NEWS_PER_POST`   | articles per run                         |
//! | `STRICT_TECH_FILTER`  | `true`/`false`                           |
//! | `PORT`                | enables the health server on this port   |
use crate::feed::{FeedSource, NormalizeOptions};
use crate::filter::{FilterPolicy, RuleTable};
use crate::pipeline::PipelineSettings;
use crate::schedule::DailyTrigger;
use chrono::TimeDelta;
use secrecy::SecretString;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("No Discord token: set DISCORD_TOKEN or discord.token")]
    MissingToken,

    #[error("No channels configured: set DISCORD_CHANNEL_IDS or discord.channel_ids")]
    NoChannels,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All sections use `#[serde(default)]` so any subset of keys can be given.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discord: DiscordConfig,
    pub schedule: ScheduleConfig,
    pub news: NewsConfig,
    pub translation: TranslationConfig,
    pub health: HealthConfig,
    pub filter: FilterConfig,
}

/// Custom Debug impl masks `token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token. `DISCORD_TOKEN` takes precedence.
    pub token: Option<String>,
    pub channel_ids: Vec<u64>,
    /// Users allowed to run `!news`.
    pub admin_user_ids: Vec<u64>,
    /// Roles whose members may run `!news`.
    pub admin_role_ids: Vec<u64>,
    pub command_prefix: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            channel_ids: Vec::new(),
            admin_user_ids: Vec::new(),
            admin_role_ids: Vec::new(),
            command_prefix: "!".to_string(),
        }
    }
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("channel_ids", &self.channel_ids)
            .field("admin_user_ids", &self.admin_user_ids)
            .field("admin_role_ids", &self.admin_role_ids)
            .field("command_prefix", &self.command_prefix)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// UTC hour (0-23) of the daily post.
    pub trigger_hour_utc: u32,
    /// How often the trigger is checked.
    pub poll_interval_minutes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            trigger_hour_utc: 1,
            poll_interval_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub sources: Vec<FeedSource>,
    /// Articles older than this are never posted.
    pub recency_hours: i64,
    pub max_per_post: usize,
    pub strict_tech_filter: bool,
    pub summary_max_chars: usize,
    pub max_entries_per_source: usize,
    pub post_delay_ms: u64,
    pub channel_delay_ms: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            sources: FeedSource::defaults(),
            recency_hours: 24,
            max_per_post: 3,
            strict_tech_filter: true,
            summary_max_chars: 300,
            max_entries_per_source: 20,
            post_delay_ms: 1000,
            channel_delay_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// When off, articles are posted in the source language.
    pub enabled: bool,
    pub target_language: String,
    pub source_language: String,
    /// Override for the translation endpoint.
    pub base_url: Option<String>,
    pub max_chunk_chars: usize,
    pub max_retries: u32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_language: "mn".to_string(),
            source_language: "en".to_string(),
            base_url: None,
            max_chunk_chars: 500,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: IpAddr::from([0, 0, 0, 0]),
            port: 10000,
        }
    }
}

impl HealthConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Replacement rule tables. Absent tables keep the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub category_rules: Option<RuleTable>,
    pub keyword_rules: Option<RuleTable>,
}

/// One year.
const MAX_RECENCY_HOURS: i64 = 24 * 365;

const KNOWN_SECTIONS: &[(&str, &[&str])] = &[
    (
        "discord",
        &[
            "token",
            "channel_ids",
            "admin_user_ids",
            "admin_role_ids",
            "command_prefix",
        ],
    ),
    ("schedule", &["trigger_hour_utc", "poll_interval_minutes"]),
    (
        "news",
        &[
            "sources",
            "recency_hours",
            "max_per_post",
            "strict_tech_filter",
            "summary_max_chars",
            "max_entries_per_source",
            "post_delay_ms",
            "channel_delay_ms",
        ],
    ),
    (
        "translation",
        &[
            "enabled",
            "target_language",
            "source_language",
            "base_url",
            "max_chunk_chars",
            "max_retries",
        ],
    ),
    ("health", &["enabled", "bind", "port"]),
    ("filter", &["category_rules", "keyword_rules"]),
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parses TOML content, warning about keys that would be ignored.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in unknown_keys(&raw) {
                tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            channels = config.discord.channel_ids.len(),
            sources = config.news.sources.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides using `lookup` to read variables.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("DISCORD_TOKEN") {
            self.discord.token = Some(token.trim().to_string());
        }

        if let Some(ids) = get("DISCORD_CHANNEL_IDS") {
            self.discord.channel_ids = parse_channel_ids(&ids)?;
        } else if let Some(id) = get("DISCORD_CHANNEL_ID") {
            self.discord.channel_ids = parse_channel_ids(&id)?;
        }

        if let Some(max) = get("MAX_NEWS_PER_POST") {
            self.news.max_per_post = max.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("MAX_NEWS_PER_POST is not a number: {:?}", max))
            })?;
        }

        if let Some(strict) = get("STRICT_TECH_FILTER") {
            self.news.strict_tech_filter = parse_bool(&strict).ok_or_else(|| {
                ConfigError::Invalid(format!("STRICT_TECH_FILTER is not a boolean: {:?}", strict))
            })?;
        }

        if let Some(port) = get("PORT") {
            self.health.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a port: {:?}", port)))?;
            self.health.enabled = true;
        }

        Ok(())
    }

    /// Checks everything except the token, which only live runs need.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.channel_ids.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        if self.discord.channel_ids.contains(&0) {
            return Err(ConfigError::Invalid("channel id 0 is not valid".into()));
        }
        if self.discord.command_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("command_prefix is empty".into()));
        }
        if DailyTrigger::new(self.schedule.trigger_hour_utc).is_none() {
            return Err(ConfigError::Invalid(format!(
                "trigger_hour_utc must be 0-23, got {}",
                self.schedule.trigger_hour_utc
            )));
        }
        // The trigger only fires while the clock is inside the trigger hour,
        // so a poll must land in every hour-long window.
        if !(1..=60).contains(&self.schedule.poll_interval_minutes) {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_minutes must be 1-60, got {}",
                self.schedule.poll_interval_minutes
            )));
        }
        if !(1..=MAX_RECENCY_HOURS).contains(&self.news.recency_hours) {
            return Err(ConfigError::Invalid(format!(
                "recency_hours must be 1-{}, got {}",
                MAX_RECENCY_HOURS, self.news.recency_hours
            )));
        }
        if self.news.max_per_post == 0 {
            return Err(ConfigError::Invalid("max_per_post must be positive".into()));
        }
        if self.news.sources.is_empty() {
            return Err(ConfigError::Invalid("no news sources configured".into()));
        }
        for feed in &self.news.sources {
            match url::Url::parse(&feed.url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "invalid feed URL for {}: {}",
                        feed.source, feed.url
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn token(&self) -> Result<SecretString, ConfigError> {
        self.discord
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::from(t.to_string()))
            .ok_or(ConfigError::MissingToken)
    }

    pub fn trigger(&self) -> Result<DailyTrigger, ConfigError> {
        DailyTrigger::new(self.schedule.trigger_hour_utc).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "trigger_hour_utc must be 0-23, got {}",
                self.schedule.trigger_hour_utc
            ))
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.poll_interval_minutes.saturating_mul(60))
    }

    pub fn filter_policy(&self) -> FilterPolicy {
        FilterPolicy {
            cutoff: TimeDelta::hours(self.news.recency_hours),
            max_per_post: self.news.max_per_post,
            strict: self.news.strict_tech_filter,
            categories: self
                .filter
                .category_rules
                .clone()
                .map(RuleTable::normalized)
                .unwrap_or_else(RuleTable::default_categories),
            keywords: self
                .filter
                .keyword_rules
                .clone()
                .map(RuleTable::normalized)
                .unwrap_or_else(RuleTable::default_keywords),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            sources: self.news.sources.clone(),
            normalize: NormalizeOptions {
                max_entries_per_source: self.news.max_entries_per_source,
                summary_max_chars: self.news.summary_max_chars,
            },
            policy: self.filter_policy(),
            channels: self.discord.channel_ids.clone(),
            target_language: self.translation.target_language.clone(),
            post_delay: Duration::from_millis(self.news.post_delay_ms),
            channel_delay: Duration::from_millis(self.news.channel_delay_ms),
        }
    }
}

fn unknown_keys(raw: &toml::Table) -> Vec<String> {
    let mut unknown = Vec::new();
    for (key, value) in raw {
        match KNOWN_SECTIONS.iter().find(|(name, _)| name == key) {
            None => unknown.push(key.clone()),
            Some((section, fields)) => {
                if let Some(table) = value.as_table() {
                    for field in table.keys() {
                        if !fields.contains(&field.as_str()) {
                            unknown.push(format!("{}.{}", section, field));
                        }
                    }
                }
            }
        }
    }
    unknown
}

fn parse_channel_ids(value: &str) -> Result<Vec<u64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| ConfigError::Invalid(format!("invalid channel id: {:?}", s)))
        })
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

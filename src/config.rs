//! Process configuration.
//!
//! Built once at startup and handed to the orchestrator and batcher.
//!
//! ## Environment
//!
//! - `STATE_FILE`: ledger path (default: `state.json`)
//! - `DEFAULT_POLL_INTERVAL_SECS`: poll interval for every source (default: 60)
//! - `<SOURCE>_POLL_INTERVAL_SECS`: per-source override, e.g. `IPPODO_POLL_INTERVAL_SECS`
//! - `POLL_TIMEOUT_SECS`: bound on one adapter call (default: 10)
//! - `NOTIFY_INTERVAL_SECS`: batcher cadence (default: 5)
//! - `ENABLE_NOTIFICATIONS`: `true`/`false` (default: true)
//! - `MAX_PAGE_CHARS` / `MAX_PAGE_LINES`: page caps (default: 4096 / 15); the
//!   line cap includes the caption, so it must be at least 2
//! - `NOTIFY_WEBHOOK_URL`: restock webhook; notifications are only logged if unset
//! - `OPERATOR_WEBHOOK_URL`: operator alert webhook; alerts are only logged if unset
//! - `HOST` / `PORT`: query API bind address (default: 0.0.0.0 / 8001)

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::batcher::BatcherConfig;
use crate::notify::{PageLimits, MIN_PAGE_LINES};
use crate::orchestrator::PollSchedule;
use crate::types::Source;

/// Error for a malformed configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Value present but not parseable.
    #[error("Invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelConfig {
    /// Ledger path.
    pub state_file: PathBuf,
    /// Interval for sources without an override.
    pub default_poll_interval: Duration,
    /// Per-source interval overrides.
    pub poll_interval_overrides: BTreeMap<Source, Duration>,
    /// Adapter call timeout.
    pub poll_timeout: Duration,
    /// Batcher cadence.
    pub notify_interval: Duration,
    /// Delivery switch.
    pub notifications_enabled: bool,
    /// Page caps.
    pub page_limits: PageLimits,
    /// Restock webhook.
    pub notify_webhook_url: Option<String>,
    /// Operator alert webhook.
    pub operator_webhook_url: Option<String>,
    /// Query API host.
    pub host: String,
    /// Query API port.
    pub port: u16,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("state.json"),
            default_poll_interval: Duration::from_secs(60),
            poll_interval_overrides: BTreeMap::new(),
            poll_timeout: Duration::from_secs(10),
            notify_interval: Duration::from_secs(5),
            notifications_enabled: true,
            page_limits: PageLimits::default(),
            notify_webhook_url: None,
            operator_webhook_url: None,
            host: "0.0.0.0".to_string(),
            port: 8001,
        }
    }
}

impl SentinelConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut poll_interval_overrides = BTreeMap::new();
        for source in Source::ALL {
            let key = format!("{}_POLL_INTERVAL_SECS", source.env_prefix());
            if let Some(secs) = parse_opt::<u64>(&key, get(&key))? {
                poll_interval_overrides.insert(source, Duration::from_secs(secs));
            }
        }

        let max_lines = parse_opt::<usize>("MAX_PAGE_LINES", get("MAX_PAGE_LINES"))?
            .unwrap_or(defaults.page_limits.max_lines);
        if max_lines < MIN_PAGE_LINES {
            return Err(ConfigError::Invalid {
                key: "MAX_PAGE_LINES".to_string(),
                value: max_lines.to_string(),
            });
        }
        let page_limits = PageLimits::new(
            parse_opt("MAX_PAGE_CHARS", get("MAX_PAGE_CHARS"))?
                .unwrap_or(defaults.page_limits.max_chars),
            max_lines,
        );

        Ok(Self {
            state_file: get("STATE_FILE").map(PathBuf::from).unwrap_or(defaults.state_file),
            default_poll_interval: secs_or("DEFAULT_POLL_INTERVAL_SECS", &get, defaults.default_poll_interval)?,
            poll_interval_overrides,
            poll_timeout: secs_or("POLL_TIMEOUT_SECS", &get, defaults.poll_timeout)?,
            notify_interval: secs_or("NOTIFY_INTERVAL_SECS", &get, defaults.notify_interval)?,
            notifications_enabled: match get("ENABLE_NOTIFICATIONS") {
                Some(value) => parse_bool("ENABLE_NOTIFICATIONS", &value)?,
                None => defaults.notifications_enabled,
            },
            page_limits,
            notify_webhook_url: get("NOTIFY_WEBHOOK_URL"),
            operator_webhook_url: get("OPERATOR_WEBHOOK_URL"),
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_opt("PORT", get("PORT"))?.unwrap_or(defaults.port),
        })
    }

    /// Poll schedule for `source`.
    pub fn schedule_for(&self, source: Source) -> PollSchedule {
        let interval = self
            .poll_interval_overrides
            .get(&source)
            .copied()
            .unwrap_or(self.default_poll_interval);
        PollSchedule::new(interval, self.poll_timeout)
    }

    /// Batcher settings.
    pub fn batcher_config(&self) -> BatcherConfig {
        BatcherConfig {
            interval: self.notify_interval,
            notifications_enabled: self.notifications_enabled,
            page_limits: self.page_limits,
        }
    }
}

fn parse_opt<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.parse::<T>().map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: v.clone(),
            })
        })
        .transpose()
}

fn secs_or<G>(key: &str, get: &G, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt::<u64>(key, get(key))?
        .map(Duration::from_secs)
        .unwrap_or(default))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_defaults() {
        let config = SentinelConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SentinelConfig::default());
        assert_eq!(config.schedule_for(Source::Sazen), PollSchedule::default());
    }

    #[test]
    fn test_per_source_override() {
        let config = SentinelConfig::from_lookup(lookup(&[
            ("DEFAULT_POLL_INTERVAL_SECS", "90"),
            ("IPPODO_POLL_INTERVAL_SECS", "300"),
            ("POLL_TIMEOUT_SECS", "20"),
        ]))
        .unwrap();

        assert_eq!(config.schedule_for(Source::Ippodo).interval, Duration::from_secs(300));
        assert_eq!(config.schedule_for(Source::Sazen).interval, Duration::from_secs(90));
        assert_eq!(config.schedule_for(Source::Sazen).timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_batcher_settings() {
        let config = SentinelConfig::from_lookup(lookup(&[
            ("ENABLE_NOTIFICATIONS", "false"),
            ("NOTIFY_INTERVAL_SECS", "30"),
            ("MAX_PAGE_LINES", "10"),
            ("NOTIFY_WEBHOOK_URL", "  "),
        ]))
        .unwrap();

        let batcher = config.batcher_config();
        assert!(!batcher.notifications_enabled);
        assert_eq!(batcher.interval, Duration::from_secs(30));
        assert_eq!(batcher.page_limits, PageLimits::new(4096, 10));
        assert_eq!(config.notify_webhook_url, None);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = SentinelConfig::from_lookup(lookup(&[("POLL_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "POLL_TIMEOUT_SECS".to_string(),
                value: "soon".to_string(),
            }
        );
        assert!(SentinelConfig::from_lookup(lookup(&[("ENABLE_NOTIFICATIONS", "maybe")])).is_err());
    }

    #[test]
    fn test_line_cap_must_leave_room_for_a_line() {
        let err = SentinelConfig::from_lookup(lookup(&[("MAX_PAGE_LINES", "1")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "MAX_PAGE_LINES".to_string(),
                value: "1".to_string(),
            }
        );

        let config = SentinelConfig::from_lookup(lookup(&[("MAX_PAGE_LINES", "2")])).unwrap();
        assert_eq!(config.page_limits.max_lines, 2);
    }
}

use crate::config::retry::RetryPolicy;
use crate::config::settings::Settings;
use crate::config::{ConfigError, InvalidParameterValueSnafu};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Minimum interval between two network checks of the same URI.
    pub recheck_interval: Duration,
    pub cache_size: usize,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(15),
            recheck_interval: Duration::from_secs(30),
            cache_size: 185,
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let connect_timeout = seconds(settings, "fetch_connect_timeout_secs")?
            .unwrap_or(defaults.connect_timeout);
        let read_timeout =
            seconds(settings, "fetch_read_timeout_secs")?.unwrap_or(defaults.read_timeout);
        let recheck_interval =
            seconds(settings, "fetch_recheck_secs")?.unwrap_or(defaults.recheck_interval);
        let cache_size = match settings.get_int("fetch_cache_size") {
            Some(size) => match usize::try_from(size) {
                Ok(size) if size >= 1 => size,
                _ => {
                    return InvalidParameterValueSnafu {
                        parameter: "fetch_cache_size",
                        value: size.to_string(),
                        explanation: "Cache must hold at least one entry",
                    }
                    .fail();
                }
            },
            None => defaults.cache_size,
        };
        Ok(Self {
            connect_timeout,
            read_timeout,
            recheck_interval,
            cache_size,
            retry: RetryPolicy::from_settings(settings)?,
        })
    }
}

fn seconds(settings: &dyn Settings, key: &str) -> Result<Option<Duration>, ConfigError> {
    match settings.get_int(key) {
        Some(secs) if secs < 0 => InvalidParameterValueSnafu {
            parameter: key,
            value: secs.to_string(),
            explanation: "Duration must not be negative",
        }
        .fail(),
        Some(secs) => Ok(Some(Duration::from_secs(secs as u64))),
        None => Ok(None),
    }
}

use crate::config::ConfigError;
use crate::config::InvalidParameterValueSnafu;
use crate::config::settings::Settings;
use std::time::Duration;

/// Retry policy for revocation fetches. A failed fetch is cached as a
/// negative result afterwards, so the budget here bounds one validation only.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Which request kinds may be retried at all.
    pub http: HttpPolicy,
    /// Maximum number of attempts for a request.
    pub max_attempts: u32,
    pub backoff: BackoffConfig,
    /// Total time budget across attempts.
    pub max_elapsed: Duration,
}

#[derive(Clone, Debug)]
pub struct BackoffConfig {
    pub base: Duration,
    pub factor: f64,
    pub cap: Duration,
    pub jitter: Jitter,
}

#[derive(Clone, Debug)]
pub enum Jitter {
    None,
    Full,
    Decorrelated,
}

#[derive(Clone, Debug)]
pub struct HttpPolicy {
    /// CRL and certificate downloads (GET).
    pub retry_safe_reads: bool,
    /// OCSP requests (POST). The request carries no side effects but a nonce
    /// makes every attempt distinct.
    pub retry_post: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            http: HttpPolicy {
                retry_safe_reads: true,
                retry_post: true,
            },
            max_attempts: 3,
            backoff: BackoffConfig {
                base: Duration::from_millis(100),
                factor: 2.0,
                cap: Duration::from_millis(2000),
                jitter: Jitter::Decorrelated,
            },
            max_elapsed: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no sleeping.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        let mut policy = Self::default();
        if let Some(attempts) = settings.get_int("fetch_max_attempts") {
            policy.max_attempts = match u32::try_from(attempts) {
                Ok(attempts) if attempts >= 1 => attempts,
                _ => {
                    return InvalidParameterValueSnafu {
                        parameter: "fetch_max_attempts",
                        value: attempts.to_string(),
                        explanation: "Expected between 1 and 4294967295 attempts",
                    }
                    .fail();
                }
            };
        }
        if let Some(jitter) = settings.get_string("fetch_retry_jitter") {
            policy.backoff.jitter = match jitter.to_uppercase().as_str() {
                "NONE" => Jitter::None,
                "FULL" => Jitter::Full,
                "DECORRELATED" => Jitter::Decorrelated,
                _ => {
                    return InvalidParameterValueSnafu {
                        parameter: "fetch_retry_jitter",
                        value: jitter,
                        explanation: "Allowed values are NONE, FULL and DECORRELATED",
                    }
                    .fail();
                }
            };
        }
        if let Some(secs) = settings.get_int("fetch_retry_budget_secs") {
            policy.max_elapsed = Duration::from_secs(secs.max(0) as u64);
        }
        Ok(policy)
    }
}

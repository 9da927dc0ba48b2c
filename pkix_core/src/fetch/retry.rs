use super::{DeadlineExceededSnafu, FetchError, HttpStatusSnafu, TimeoutSnafu, TransportSnafu};
use crate::config::retry::{BackoffConfig, HttpPolicy, Jitter, RetryPolicy};
use rand::{Rng, rng};
use reqwest::{Method, Response, StatusCode};
use snafu::IntoError;
use std::time::{Duration, Instant};

/// Sends the request built by `build_request` until it yields a response
/// that is not worth retrying. Success, 304 and non-retryable statuses are
/// returned to the caller; transport failures and exhausted retries become
/// `FetchError`s.
pub async fn execute_with_retry<B>(
    uri: &str,
    method: &Method,
    build_request: B,
    policy: &RetryPolicy,
) -> Result<Response, FetchError>
where
    B: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt: u32 = 0;
    let mut sleep_ms: f64 = policy.backoff.base.as_millis() as f64;
    let start = Instant::now();
    let retry_allowed = allow_retry(method, &policy.http);

    loop {
        attempt += 1;
        let elapsed = start.elapsed();
        if elapsed >= policy.max_elapsed {
            return DeadlineExceededSnafu {
                uri,
                configured: policy.max_elapsed,
                elapsed,
            }
            .fail();
        }
        let remaining = policy.max_elapsed - elapsed;

        let delay = match build_request().send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() || !should_retry_status(status) || !retry_allowed {
                    return Ok(resp);
                }
                if attempt >= policy.max_attempts {
                    return HttpStatusSnafu {
                        uri,
                        status: status.as_u16(),
                    }
                    .fail();
                }
                sleep_ms = next_delay_ms(sleep_ms, &policy.backoff);
                parse_retry_after(&resp).unwrap_or(Duration::from_millis(sleep_ms as u64))
            }
            Err(e) => {
                if !is_retryable_transport(&e) || !retry_allowed || attempt >= policy.max_attempts
                {
                    return Err(transport_error(uri, e));
                }
                sleep_ms = next_delay_ms(sleep_ms, &policy.backoff);
                Duration::from_millis(sleep_ms as u64)
            }
        };
        if delay > remaining {
            return DeadlineExceededSnafu {
                uri,
                configured: policy.max_elapsed,
                elapsed: start.elapsed() + delay,
            }
            .fail();
        }
        tracing::debug!(
            target: "pkix_core::fetch",
            "Retrying {method} {uri} in {delay:?} (attempt {attempt})"
        );
        tokio::time::sleep(delay).await;
    }
}

pub(crate) fn transport_error(uri: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        TimeoutSnafu { uri }.build()
    } else {
        TransportSnafu { uri }.into_error(e)
    }
}

fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

fn allow_retry(method: &Method, http: &HttpPolicy) -> bool {
    match *method {
        Method::GET | Method::HEAD => http.retry_safe_reads,
        Method::POST => http.retry_post,
        _ => false,
    }
}

fn next_delay_ms(prev_ms: f64, backoff: &BackoffConfig) -> f64 {
    let base = backoff.base.as_millis() as f64;
    let cap = backoff.cap.as_millis() as f64;
    match backoff.jitter {
        Jitter::None => (prev_ms.max(base) * backoff.factor).min(cap),
        Jitter::Full => {
            let max = (prev_ms.max(base) * backoff.factor).min(cap);
            rng().random_range(0.0..=max)
        }
        Jitter::Decorrelated => {
            let upper = (prev_ms.max(base) * 3.0).min(cap).max(base);
            rng().random_range(base..=upper)
        }
    }
}

fn parse_retry_after(resp: &Response) -> Option<Duration> {
    let header = resp.headers().get(reqwest::header::RETRY_AFTER)?;
    let secs = header.to_str().ok()?.parse::<u64>().ok()?;
    Some(Duration::from_secs(secs))
}

fn is_retryable_transport(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
}

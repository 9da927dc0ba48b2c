use super::config::FetchConfig;
use super::{
    CachedFailureSnafu, Conditional, FetchError, FetchResponse, Fetcher, MutexPoisonedSnafu,
};
use lru::LruCache;
use once_cell::sync::OnceCell;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::{KeyValue, global};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum CacheEntry {
    Hit {
        body: Vec<u8>,
        checked_at: Instant,
        etag: Option<String>,
        last_modified: Option<String>,
    },
    /// Only network failures are kept; local ones are recomputed.
    Failure {
        message: String,
        checked_at: Instant,
    },
}

impl CacheEntry {
    fn checked_at(&self) -> Instant {
        match self {
            CacheEntry::Hit { checked_at, .. } | CacheEntry::Failure { checked_at, .. } => {
                *checked_at
            }
        }
    }
}

#[derive(Debug, Clone)]
struct FetchMetrics {
    get_total: Counter<u64>,
    get_ms: Histogram<u64>,
}

impl FetchMetrics {
    fn init(meter: &Meter) -> Self {
        Self {
            get_total: meter.u64_counter("fetch_get_total").build(),
            get_ms: meter.u64_histogram("fetch_get_ms").build(),
        }
    }
}

fn metrics() -> &'static FetchMetrics {
    static METRICS: OnceCell<FetchMetrics> = OnceCell::new();
    METRICS.get_or_init(|| {
        let meter = global::meter("pkix_core.fetch");
        FetchMetrics::init(&meter)
    })
}

fn record(source: &'static str, start: Instant) {
    let attrs = [KeyValue::new("source", source)];
    metrics()
        .get_ms
        .record(start.elapsed().as_millis() as u64, &attrs);
    metrics().get_total.add(1, &attrs);
}

/// Bounded LRU in front of another `Fetcher`.
///
/// A URI hits the network at most once per `recheck_interval`; stale entries
/// are revalidated with the stored `ETag` / `Last-Modified`. Failures are
/// cached for the same window so an unreachable distribution point or
/// responder is not retried on every certificate. POSTs are never served
/// from cache, only their failures are.
#[derive(Debug)]
pub struct CachingFetcher {
    inner: Arc<dyn Fetcher>,
    entries: Mutex<LruCache<String, CacheEntry>>,
    recheck_interval: Duration,
}

impl CachingFetcher {
    pub fn new(inner: Arc<dyn Fetcher>, capacity: usize, recheck_interval: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
            recheck_interval,
        }
    }

    pub fn from_config(inner: Arc<dyn Fetcher>, config: &FetchConfig) -> Self {
        Self::new(inner, config.cache_size, config.recheck_interval)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    fn lookup(&self, key: &str) -> Result<Option<CacheEntry>, FetchError> {
        let mut entries = self.entries.lock().map_err(|e| {
            MutexPoisonedSnafu {
                message: format!("fetch cache poisoned: {e}"),
            }
            .build()
        })?;
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, entry: CacheEntry) -> Result<(), FetchError> {
        let mut entries = self.entries.lock().map_err(|e| {
            MutexPoisonedSnafu {
                message: format!("fetch cache poisoned: {e}"),
            }
            .build()
        })?;
        entries.put(key.to_string(), entry);
        Ok(())
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.checked_at().elapsed() < self.recheck_interval
    }

    fn remember_failure(&self, key: &str, error: &FetchError) -> Result<(), FetchError> {
        if !error.is_network() {
            return Ok(());
        }
        tracing::debug!(target: "pkix_core::fetch", "Caching failure for {key}: {error}");
        self.store(
            key,
            CacheEntry::Failure {
                message: error.to_string(),
                checked_at: Instant::now(),
            },
        )
    }
}

impl Fetcher for CachingFetcher {
    /// Conditional headers from the caller are ignored; the cache manages
    /// revalidation itself and always answers with a body.
    fn get(&self, uri: &str, _conditional: &Conditional) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let cached = self.lookup(uri)?;
        let conditional = match &cached {
            Some(entry) if self.is_fresh(entry) => {
                record("memory", start);
                return match entry {
                    CacheEntry::Hit {
                        body,
                        etag,
                        last_modified,
                        ..
                    } => Ok(FetchResponse::Body {
                        bytes: body.clone(),
                        etag: etag.clone(),
                        last_modified: last_modified.clone(),
                    }),
                    CacheEntry::Failure { message, .. } => CachedFailureSnafu {
                        uri,
                        message: message.clone(),
                    }
                    .fail(),
                };
            }
            Some(CacheEntry::Hit {
                etag,
                last_modified,
                ..
            }) => Conditional {
                etag: etag.clone(),
                last_modified: last_modified.clone(),
            },
            _ => Conditional::default(),
        };

        match self.inner.get(uri, &conditional) {
            Ok(FetchResponse::NotModified) => {
                let Some(CacheEntry::Hit {
                    body,
                    etag,
                    last_modified,
                    ..
                }) = cached
                else {
                    // A 304 without a cached body cannot be answered.
                    return CachedFailureSnafu {
                        uri,
                        message: "Not modified without cached content",
                    }
                    .fail();
                };
                self.store(
                    uri,
                    CacheEntry::Hit {
                        body: body.clone(),
                        checked_at: Instant::now(),
                        etag: etag.clone(),
                        last_modified: last_modified.clone(),
                    },
                )?;
                record("revalidated", start);
                Ok(FetchResponse::Body {
                    bytes: body,
                    etag,
                    last_modified,
                })
            }
            Ok(FetchResponse::Body {
                bytes,
                etag,
                last_modified,
            }) => {
                self.store(
                    uri,
                    CacheEntry::Hit {
                        body: bytes.clone(),
                        checked_at: Instant::now(),
                        etag: etag.clone(),
                        last_modified: last_modified.clone(),
                    },
                )?;
                record("network", start);
                Ok(FetchResponse::Body {
                    bytes,
                    etag,
                    last_modified,
                })
            }
            Err(e) => {
                self.remember_failure(uri, &e)?;
                Err(e)
            }
        }
    }

    fn post(&self, uri: &str, content_type: &str, body: &[u8]) -> Result<Vec<u8>, FetchError> {
        let key = format!("POST {uri}");
        if let Some(CacheEntry::Failure { message, checked_at }) = self.lookup(&key)?
            && checked_at.elapsed() < self.recheck_interval
        {
            return CachedFailureSnafu { uri, message }.fail();
        }
        match self.inner.post(uri, content_type, body) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.remember_failure(&key, &e)?;
                Err(e)
            }
        }
    }
}

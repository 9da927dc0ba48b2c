use crate::cert::{Certificate, TrustAnchor};
use crate::crypto::{AlgorithmPolicy, SignatureVerifier};
use crate::error::{NetworkFailureSnafu, PkixError};
use crate::fetch::{FetchError, Fetcher};
use crate::path::store::CertStore;
use crate::revocation::{IssuerInfo, RevocationConfig, RevocationMode, RevocationStatus, crl, ocsp};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::{KeyValue, global};
use snafu::IntoError;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct RevocationMetrics {
    check_total: Counter<u64>,
}

impl RevocationMetrics {
    fn init(meter: &Meter) -> Self {
        Self {
            check_total: meter.u64_counter("revocation_check_total").build(),
        }
    }
}

fn metrics() -> &'static RevocationMetrics {
    static METRICS: OnceCell<RevocationMetrics> = OnceCell::new();
    METRICS.get_or_init(|| {
        let meter = global::meter("pkix_core.path");
        RevocationMetrics::init(&meter)
    })
}

/// What a revocation check may consult besides the certificate itself.
#[derive(Debug, Clone)]
pub struct RevocationContext<'a> {
    pub date: DateTime<Utc>,
    /// Certificates already being validated further up the call stack.
    pub stacked: &'a [Arc<Certificate>],
    pub anchors: &'a [TrustAnchor],
    pub stores: &'a [Arc<dyn CertStore>],
    pub verifier: &'a dyn SignatureVerifier,
    pub algorithms: &'a AlgorithmPolicy,
    /// Engine used when a CRL issuer's own path has to be built.
    pub revocation: Option<Arc<RevocationEngine>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Ocsp,
    Crl,
}

impl Method {
    fn label(&self) -> &'static str {
        match self {
            Method::Ocsp => "ocsp",
            Method::Crl => "crl",
        }
    }
}

/// Runs OCSP and CRL checks in the configured order until one of them
/// decides the status.
#[derive(Debug)]
pub struct RevocationEngine {
    config: RevocationConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl RevocationEngine {
    /// Without a fetcher only CRLs from the cert stores are consulted.
    pub fn new(config: RevocationConfig, fetcher: Option<Arc<dyn Fetcher>>) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &RevocationConfig {
        &self.config
    }

    fn methods(&self) -> Vec<Method> {
        let mut methods = match self.config.mode {
            RevocationMode::PreferOcsp => vec![Method::Ocsp, Method::Crl],
            RevocationMode::PreferCrls => vec![Method::Crl, Method::Ocsp],
            RevocationMode::OnlyCrls => vec![Method::Crl],
        };
        if !self.config.ocsp_enabled {
            methods.retain(|m| *m != Method::Ocsp);
        }
        if self.config.no_fallback {
            methods.truncate(1);
        }
        methods
    }

    /// Status of `cert`, issued by `issuer`. Only local failures, such as a
    /// fetch runtime that cannot start, are returned as errors.
    pub fn check_revocation(
        &self,
        cert: &Certificate,
        issuer: &IssuerInfo,
        ctx: &RevocationContext<'_>,
    ) -> Result<RevocationStatus, PkixError> {
        let mut failures: Vec<String> = Vec::new();
        let mut all_network = true;
        for method in self.methods() {
            let status = match method {
                Method::Ocsp => match &self.fetcher {
                    Some(fetcher) => ocsp::check(&self.config, fetcher.as_ref(), cert, issuer, ctx)?,
                    None => RevocationStatus::undetermined("no fetcher for OCSP", false),
                },
                Method::Crl => crl::check(&self.config, self.fetcher.as_deref(), cert, issuer, ctx)?,
            };
            metrics().check_total.add(
                1,
                &[
                    KeyValue::new("method", method.label()),
                    KeyValue::new("outcome", status.outcome()),
                ],
            );
            match status {
                RevocationStatus::Undetermined { message, network } => {
                    tracing::debug!(target: "pkix_core::revocation", "{} check for {} undetermined: {message}", method.label(), cert.subject());
                    all_network &= network;
                    failures.push(format!("{}: {message}", method.label()));
                }
                decided => {
                    tracing::debug!(target: "pkix_core::revocation", "{} check for {}: {decided:?}", method.label(), cert.subject());
                    return Ok(decided);
                }
            }
        }
        if failures.is_empty() {
            return Ok(RevocationStatus::undetermined(
                "no revocation method enabled",
                false,
            ));
        }
        Ok(RevocationStatus::undetermined(
            failures.join("; "),
            all_network,
        ))
    }
}

/// Maps a failed fetch onto a status. Network failures and unsupported
/// locations leave the status undetermined; local failures are errors.
pub(crate) fn fetch_failure(uri: &str, error: FetchError) -> Result<RevocationStatus, PkixError> {
    if error.is_network() {
        tracing::info!(target: "pkix_core::revocation", "Fetching {uri} failed: {error}");
        return Ok(RevocationStatus::undetermined(error.to_string(), true));
    }
    if matches!(error, FetchError::UnsupportedScheme { .. }) {
        return Ok(RevocationStatus::undetermined(error.to_string(), false));
    }
    Err(NetworkFailureSnafu { uri }.into_error(error))
}

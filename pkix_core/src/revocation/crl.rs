//! CRL-based revocation checking, RFC 5280 6.3.

use crate::cert::{
    Certificate, Crl, DistinguishedName, DistributionPoint, DistributionPointName, GeneralName,
    KeyUsage, PublicKey, ReasonFlags, RevocationReason, oid,
};
use crate::error::PkixError;
use crate::fetch::Fetcher;
use crate::path::builder::{self, SearchInputs};
use crate::path::selector::{CertSelector, CrlSelector};
use crate::revocation::engine::{RevocationContext, fetch_failure};
use crate::revocation::{IssuerInfo, RevocationConfig, RevocationStatus};
use const_oid::ObjectIdentifier;
use std::sync::Arc;

const CRL_EXTENSIONS: &[ObjectIdentifier] = &[
    oid::ISSUING_DISTRIBUTION_POINT,
    oid::DELTA_CRL_INDICATOR,
    oid::CRL_NUMBER,
    oid::AUTHORITY_KEY_IDENTIFIER,
];

const ENTRY_EXTENSIONS: &[ObjectIdentifier] = &[
    oid::CRL_REASON,
    oid::CERTIFICATE_ISSUER,
    oid::INVALIDITY_DATE,
];

enum Outcome {
    Revoked {
        reason: RevocationReason,
        time: chrono::DateTime<chrono::Utc>,
    },
    /// The CRL lists nothing for the certificate and covers these reasons.
    Covered(ReasonFlags),
    /// The CRL covers no reason that is still missing.
    Redundant,
}

/// Failures seen while trying CRLs. The status is network-related only
/// when every failure was.
struct Failures {
    messages: Vec<String>,
    all_network: bool,
}

impl Failures {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
            all_network: true,
        }
    }

    fn push(&mut self, message: impl Into<String>, network: bool) {
        self.messages.push(message.into());
        self.all_network &= network;
    }
}

pub(crate) fn check(
    config: &RevocationConfig,
    fetcher: Option<&dyn Fetcher>,
    cert: &Certificate,
    issuer: &IssuerInfo,
    ctx: &RevocationContext<'_>,
) -> Result<RevocationStatus, PkixError> {
    let points = distribution_points(cert);
    let mut mask = ReasonFlags::default();
    let mut failures = Failures::new();

    for point in &points {
        let mut crls = collect_from_stores(point, cert, ctx);
        if config.crldp_enabled {
            if let Some(fetcher) = fetcher {
                crls.extend(download(fetcher, point, &mut failures)?);
            }
        }
        for crl in crls {
            match evaluate(&crl, point, cert, issuer, config, ctx, mask) {
                Ok(Outcome::Revoked { reason, time }) => {
                    tracing::info!(target: "pkix_core::crl", "{} is revoked by CRL of {}: {reason}", cert.subject(), crl.issuer());
                    return Ok(RevocationStatus::Revoked {
                        reason,
                        revocation_time: time,
                    });
                }
                Ok(Outcome::Covered(reasons)) => mask = mask.union(reasons),
                Ok(Outcome::Redundant) => {}
                Err(message) => {
                    tracing::debug!(target: "pkix_core::crl", "CRL of {} skipped: {message}", crl.issuer());
                    failures.push(message, false);
                }
            }
            if mask.is_all() {
                return Ok(RevocationStatus::Good);
            }
        }
    }

    if failures.messages.is_empty() {
        return Ok(RevocationStatus::undetermined(
            format!("no usable CRL covers {}", cert.subject()),
            false,
        ));
    }
    Ok(RevocationStatus::undetermined(
        failures.messages.join("; "),
        failures.all_network,
    ))
}

/// The certificate's distribution points, or a single point naming its
/// issuer when it has none.
fn distribution_points(cert: &Certificate) -> Vec<DistributionPoint> {
    let points = cert.crl_distribution_points();
    if !points.is_empty() {
        return points.to_vec();
    }
    vec![DistributionPoint {
        name: Some(DistributionPointName::FullName(vec![GeneralName::Directory(
            cert.issuer().clone(),
        )])),
        reasons: None,
        crl_issuer: None,
    }]
}

fn crl_issuer_names(point: &DistributionPoint) -> Vec<DistinguishedName> {
    point
        .crl_issuer
        .iter()
        .flatten()
        .filter_map(|name| match name {
            GeneralName::Directory(dn) => Some(dn.clone()),
            _ => None,
        })
        .collect()
}

fn collect_from_stores(
    point: &DistributionPoint,
    cert: &Certificate,
    ctx: &RevocationContext<'_>,
) -> Vec<Arc<Crl>> {
    let mut issuers = crl_issuer_names(point);
    if issuers.is_empty() {
        issuers.push(cert.issuer().clone());
    }
    let selector = CrlSelector::for_issuers(issuers);
    let mut crls: Vec<Arc<Crl>> = Vec::new();
    for store in ctx.stores {
        for crl in store.crls(&selector) {
            if !crls.contains(&crl) {
                crls.push(crl);
            }
        }
    }
    crls
}

fn download(
    fetcher: &dyn Fetcher,
    point: &DistributionPoint,
    failures: &mut Failures,
) -> Result<Vec<Arc<Crl>>, PkixError> {
    let mut crls = Vec::new();
    for uri in point.uris() {
        tracing::debug!(target: "pkix_core::crl", "Fetching CRL from {uri}");
        match fetcher.get_bytes(uri) {
            Ok(bytes) => match Crl::from_der(&bytes) {
                Ok(crl) => crls.push(Arc::new(crl)),
                Err(e) => failures.push(format!("CRL from {uri}: {e}"), false),
            },
            Err(e) => {
                if let RevocationStatus::Undetermined { message, network } = fetch_failure(uri, e)? {
                    failures.push(message, network);
                }
            }
        }
    }
    Ok(crls)
}

fn evaluate(
    crl: &Crl,
    point: &DistributionPoint,
    cert: &Certificate,
    issuer: &IssuerInfo,
    config: &RevocationConfig,
    ctx: &RevocationContext<'_>,
    mask: ReasonFlags,
) -> Result<Outcome, String> {
    let skew = config.max_clock_skew;
    if ctx.date < crl.this_update() - skew
        || crl.next_update().is_some_and(|next| ctx.date > next + skew)
    {
        return Err(format!(
            "CRL of {} is not current at {}",
            crl.issuer(),
            ctx.date
        ));
    }
    if crl.is_delta() {
        return Err("delta CRLs are not processed".to_string());
    }
    let unknown: Vec<String> = crl
        .critical_extension_oids()
        .iter()
        .filter(|o| !CRL_EXTENSIONS.contains(o))
        .map(|o| o.to_string())
        .collect();
    if !unknown.is_empty() {
        return Err(format!("unsupported critical CRL extensions {unknown:?}"));
    }

    let indirect_issuers = crl_issuer_names(point);
    if indirect_issuers.is_empty() {
        if crl.issuer() != cert.issuer() {
            return Err(format!("CRL issuer {} is not {}", crl.issuer(), cert.issuer()));
        }
    } else if !indirect_issuers.contains(crl.issuer()) || !crl.is_indirect() {
        return Err(format!(
            "CRL of {} is not an indirect CRL for this distribution point",
            crl.issuer()
        ));
    }

    let mut scope = ReasonFlags::ALL;
    if let Some(idp) = crl.issuing_distribution_point() {
        if let Some(name) = &idp.name {
            if !point_names_match(name, point) {
                return Err("issuing distribution point does not match".to_string());
            }
        }
        if idp.only_user_certs && cert.is_ca() {
            return Err("CRL only covers end-entity certificates".to_string());
        }
        if idp.only_ca_certs && !cert.is_ca() {
            return Err("CRL only covers CA certificates".to_string());
        }
        if idp.only_attribute_certs {
            return Err("CRL only covers attribute certificates".to_string());
        }
        if let Some(reasons) = idp.only_some_reasons {
            scope = scope.intersection(reasons);
        }
    }
    if let Some(reasons) = point.reasons {
        scope = scope.intersection(reasons);
    }
    if !scope.adds_to(mask) {
        return Ok(Outcome::Redundant);
    }

    let key = signing_key(crl, cert, issuer, ctx)?;
    if !ctx.algorithms.permits(crl.signature_algorithm()) {
        return Err(format!(
            "CRL signed with disabled algorithm {}",
            crl.signature_algorithm().name()
        ));
    }
    ctx.verifier
        .verify(
            &key,
            crl.signature_algorithm(),
            crl.tbs_bytes(),
            crl.signature(),
        )
        .map_err(|e| format!("CRL signature: {e}"))?;

    if let Some(entry) = crl.find_revoked(cert.serial(), cert.issuer()) {
        if entry.critical.iter().any(|o| !ENTRY_EXTENSIONS.contains(o)) {
            return Err("unsupported critical CRL entry extension".to_string());
        }
        let reason = entry.reason.unwrap_or(RevocationReason::Unspecified);
        if reason != RevocationReason::RemoveFromCrl {
            return Ok(Outcome::Revoked {
                reason,
                time: entry.revocation_date,
            });
        }
    }
    Ok(Outcome::Covered(scope))
}

fn point_names(name: &DistributionPointName) -> Vec<GeneralName> {
    match name {
        DistributionPointName::FullName(names) => names.clone(),
        DistributionPointName::RelativeToIssuer(dn) => vec![GeneralName::Directory(dn.clone())],
    }
}

/// The IDP name must share a name with the distribution point, or with its
/// cRLIssuer when the point is unnamed.
fn point_names_match(idp_name: &DistributionPointName, point: &DistributionPoint) -> bool {
    let idp_names = point_names(idp_name);
    let candidates = match &point.name {
        Some(name) => point_names(name),
        None => point.crl_issuer.clone().unwrap_or_default(),
    };
    candidates.iter().any(|n| idp_names.contains(n))
}

fn key_id_matches(crl: &Crl, key_id: Option<&[u8]>) -> bool {
    match (crl.authority_key_id(), key_id) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => true,
    }
}

/// Key the CRL must verify under: the certificate's issuer when it may sign
/// CRLs, a trust anchor of the CRL issuer's name, or the end of a separate
/// path built for a CRL-signing certificate.
fn signing_key(
    crl: &Crl,
    cert: &Certificate,
    issuer: &IssuerInfo,
    ctx: &RevocationContext<'_>,
) -> Result<PublicKey, String> {
    if crl.issuer() == &issuer.name && issuer.crl_sign && key_id_matches(crl, issuer.key_id.as_deref())
    {
        return Ok(issuer.public_key.clone());
    }
    for anchor in ctx.anchors {
        let key_id = anchor
            .certificate()
            .and_then(|c| c.extensions().subject_key_id.as_deref());
        if anchor.name() == crl.issuer() && anchor.crl_sign() && key_id_matches(crl, key_id) {
            return Ok(anchor.public_key().clone());
        }
    }

    let mut stacked = ctx.stacked.to_vec();
    stacked.push(Arc::new(cert.clone()));
    let mut target = CertSelector::for_subject(crl.issuer().clone())
        .with_key_usage(KeyUsage::CRL_SIGN)
        .with_valid_at(ctx.date);
    target.subject_key_id = crl.authority_key_id().map(<[u8]>::to_vec);
    tracing::debug!(target: "pkix_core::crl", "Building a path for CRL signer {}", crl.issuer());
    let inputs = SearchInputs::for_crl_signer(&target, ctx, &stacked);
    match builder::search(inputs) {
        Ok(result) => Ok(result.public_key),
        Err(failure) => Err(format!(
            "no path to CRL signer {}: {}",
            crl.issuer(),
            failure.error
        )),
    }
}

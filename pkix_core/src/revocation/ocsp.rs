//! OCSP requests and basic responses (RFC 6960), and the status check
//! built on them.

use crate::cert::parser::{OcspSnafu, ParseError};
use crate::cert::{
    AlgorithmIdentifier, Certificate, DistinguishedName, PublicKey, RevocationReason, oid,
};
use crate::error::PkixError;
use crate::fetch::Fetcher;
use crate::revocation::engine::{RevocationContext, fetch_failure};
use crate::revocation::{IssuerInfo, RevocationConfig, RevocationStatus};
use aws_lc_rs::digest;
use chrono::{DateTime, Utc};
use der::asn1::{Any, OctetString};
use der::{Decode, Encode};
use x509_cert::ext::Extension;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_ocsp::{
    BasicOcspResponse, CertStatus, OcspGeneralizedTime, OcspRequest, OcspResponse,
    OcspResponseStatus, Request, ResponderId, SingleResponse, TbsRequest, Version,
};

pub use x509_ocsp::CertId;

pub const OCSP_REQUEST_CONTENT_TYPE: &str = "application/ocsp-request";

fn malformed(what: &str, error: der::Error) -> ParseError {
    OcspSnafu {
        message: format!("{what}: {error}"),
    }
    .build()
}

pub(crate) fn sha1(data: &[u8]) -> Vec<u8> {
    digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, data)
        .as_ref()
        .to_vec()
}

/// Identifies `cert` to a responder: SHA-1 hashes of the issuer's name and
/// key plus the serial number.
pub fn cert_id(cert: &Certificate, issuer: &IssuerInfo) -> Result<CertId, ParseError> {
    Ok(CertId {
        hash_algorithm: AlgorithmIdentifierOwned {
            oid: oid::SHA1,
            parameters: Some(Any::null()),
        },
        issuer_name_hash: OctetString::new(sha1(issuer.name.as_der()))
            .map_err(|e| malformed("issuer name hash", e))?,
        issuer_key_hash: OctetString::new(sha1(&issuer.public_key.key))
            .map_err(|e| malformed("issuer key hash", e))?,
        serial_number: SerialNumber::new(cert.serial()).map_err(|e| malformed("serial", e))?,
    })
}

/// Responders may re-encode the serial; compare by value.
fn same_certificate(a: &CertId, b: &CertId) -> bool {
    a.hash_algorithm.oid == b.hash_algorithm.oid
        && a.issuer_name_hash == b.issuer_name_hash
        && a.issuer_key_hash == b.issuer_key_hash
        && a.serial_number.as_bytes() == b.serial_number.as_bytes()
}

/// The extnValue of a nonce extension: the nonce as an OCTET STRING.
pub(crate) fn nonce_value(nonce: &[u8]) -> Result<Vec<u8>, der::Error> {
    OctetString::new(nonce)?.to_der()
}

/// DER OCSPRequest for one certificate, with an optional nonce extension.
pub fn encode_request(cert_id: &CertId, nonce: Option<&[u8]>) -> Result<Vec<u8>, ParseError> {
    let request_extensions = match nonce {
        Some(nonce) => {
            let value = nonce_value(nonce).map_err(|e| malformed("nonce", e))?;
            Some(vec![Extension {
                extn_id: oid::OCSP_NONCE,
                critical: false,
                extn_value: OctetString::new(value).map_err(|e| malformed("nonce", e))?,
            }])
        }
        None => None,
    };
    OcspRequest {
        tbs_request: TbsRequest {
            version: Version::V1,
            requestor_name: None,
            request_list: vec![Request {
                req_cert: cert_id.clone(),
                single_request_extensions: None,
            }],
            request_extensions,
        },
        optional_signature: None,
    }
    .to_der()
    .map_err(|e| malformed("request", e))
}

pub fn decode_response(der: &[u8]) -> Result<OcspResponse, ParseError> {
    OcspResponse::from_der(der).map_err(|e| malformed("OCSPResponse", e))
}

/// The BasicOCSPResponse inside a successful response.
pub fn decode_basic(response: &OcspResponse) -> Result<Option<BasicOcspResponse>, ParseError> {
    let Some(bytes) = &response.response_bytes else {
        return Ok(None);
    };
    if bytes.response_type != oid::OCSP_BASIC {
        return OcspSnafu {
            message: format!("unsupported response type {}", bytes.response_type),
        }
        .fail();
    }
    BasicOcspResponse::from_der(bytes.response.as_bytes())
        .map(Some)
        .map_err(|e| malformed("BasicOCSPResponse", e))
}

/// Conditions on the responder side that a later attempt may not hit.
fn is_transient(status: &OcspResponseStatus) -> bool {
    matches!(
        status,
        OcspResponseStatus::InternalError | OcspResponseStatus::TryLater
    )
}

fn ocsp_time(time: &OcspGeneralizedTime) -> Option<DateTime<Utc>> {
    let since_epoch = time.0.to_unix_duration();
    DateTime::from_timestamp(i64::try_from(since_epoch.as_secs()).ok()?, 0)
}

fn responder_matches(responder: &ResponderId, name: &DistinguishedName, key: &PublicKey) -> bool {
    match responder {
        ResponderId::ByName(responder) => responder
            .to_der()
            .ok()
            .and_then(|der| DistinguishedName::from_der(&der).ok())
            .is_some_and(|responder| &responder == name),
        ResponderId::ByKey(hash) => hash.as_bytes() == sha1(&key.key).as_slice(),
    }
}

fn algorithm(identifier: &AlgorithmIdentifierOwned) -> AlgorithmIdentifier {
    AlgorithmIdentifier {
        oid: identifier.oid,
        parameters: identifier
            .parameters
            .as_ref()
            .filter(|p| !p.is_null() && !p.value().is_empty())
            .map(|p| p.value().to_vec()),
    }
}

/// Certificates the responder attached to the response.
fn attached_certificates(basic: &BasicOcspResponse) -> Result<Vec<Certificate>, ParseError> {
    basic
        .certs
        .iter()
        .flatten()
        .map(|cert| {
            let der = cert.to_der().map_err(|e| malformed("responder certificate", e))?;
            Certificate::from_der(&der)
        })
        .collect()
}

/// Asks the responder for the status of `cert`.
pub(crate) fn check(
    config: &RevocationConfig,
    fetcher: &dyn Fetcher,
    cert: &Certificate,
    issuer: &IssuerInfo,
    ctx: &RevocationContext<'_>,
) -> Result<RevocationStatus, PkixError> {
    let uris: Vec<String> = match &config.ocsp_responder_url {
        Some(uri) => vec![uri.clone()],
        None => cert.ocsp_uris(),
    };
    if uris.is_empty() {
        return Ok(RevocationStatus::undetermined(
            format!("{} names no OCSP responder", cert.subject()),
            false,
        ));
    }

    let cert_id = match cert_id(cert, issuer) {
        Ok(id) => id,
        Err(e) => return Ok(RevocationStatus::undetermined(e.to_string(), false)),
    };
    let mut last = None;
    for uri in &uris {
        let nonce: Option<[u8; 16]> = config.ocsp_nonce.then(rand::random);
        let request = match encode_request(&cert_id, nonce.as_ref().map(|n| n.as_slice())) {
            Ok(request) => request,
            Err(e) => return Ok(RevocationStatus::undetermined(e.to_string(), false)),
        };
        tracing::debug!(target: "pkix_core::ocsp", "Querying {uri} for {}", cert.subject());
        let status = match fetcher.post(uri, OCSP_REQUEST_CONTENT_TYPE, &request) {
            Ok(body) => evaluate(&body, config, &cert_id, nonce.as_ref(), issuer, ctx),
            Err(e) => fetch_failure(uri, e)?,
        };
        match status {
            RevocationStatus::Undetermined { network: true, .. } => last = Some(status),
            decided => return Ok(decided),
        }
    }
    Ok(last.unwrap_or_else(|| RevocationStatus::undetermined("no OCSP responder answered", true)))
}

fn evaluate(
    body: &[u8],
    config: &RevocationConfig,
    cert_id: &CertId,
    nonce: Option<&[u8; 16]>,
    issuer: &IssuerInfo,
    ctx: &RevocationContext<'_>,
) -> RevocationStatus {
    let response = match decode_response(body) {
        Ok(response) => response,
        Err(e) => return RevocationStatus::undetermined(format!("bad OCSP response: {e}"), false),
    };
    if !matches!(response.response_status, OcspResponseStatus::Successful) {
        return RevocationStatus::undetermined(
            format!("OCSP responder returned {:?}", response.response_status),
            is_transient(&response.response_status),
        );
    }
    let basic = match decode_basic(&response) {
        Ok(Some(basic)) => basic,
        Ok(None) => {
            return RevocationStatus::undetermined("OCSP response carries no body", false);
        }
        Err(e) => return RevocationStatus::undetermined(format!("bad OCSP response: {e}"), false),
    };

    let signer = match responder_key(&basic, config, issuer, ctx) {
        Ok(key) => key,
        Err(message) => return RevocationStatus::undetermined(message, false),
    };
    let signature_algorithm = algorithm(&basic.signature_algorithm);
    if !ctx.algorithms.permits(&signature_algorithm) {
        return RevocationStatus::undetermined(
            format!(
                "OCSP response signed with disabled algorithm {}",
                signature_algorithm.name()
            ),
            false,
        );
    }
    let tbs = match basic.tbs_response_data.to_der() {
        Ok(tbs) => tbs,
        Err(e) => return RevocationStatus::undetermined(format!("bad OCSP response: {e}"), false),
    };
    if let Err(e) = ctx.verifier.verify(
        &signer,
        &signature_algorithm,
        &tbs,
        basic.signature.raw_bytes(),
    ) {
        return RevocationStatus::undetermined(format!("OCSP response signature: {e}"), false);
    }

    let data = &basic.tbs_response_data;
    if let Some(sent) = nonce {
        let echoed = data
            .response_extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == oid::OCSP_NONCE);
        if let Some(echoed) = echoed {
            let expected = nonce_value(sent).unwrap_or_default();
            if echoed.extn_value.as_bytes() != expected.as_slice() {
                return RevocationStatus::undetermined("OCSP nonce mismatch", false);
            }
        }
    }

    let Some(single) = data
        .responses
        .iter()
        .find(|r| same_certificate(&r.cert_id, cert_id))
    else {
        return RevocationStatus::undetermined("OCSP response does not cover the certificate", false);
    };
    if let Err(message) = check_currency(single, ctx.date, config.max_clock_skew) {
        return RevocationStatus::undetermined(message, false);
    }

    match &single.cert_status {
        CertStatus::Good(_) => RevocationStatus::Good,
        CertStatus::Revoked(info) => match ocsp_time(&info.revocation_time) {
            Some(revocation_time) => RevocationStatus::Revoked {
                reason: info
                    .revocation_reason
                    .and_then(|r| RevocationReason::from_code(r as u32 as u8))
                    .unwrap_or(RevocationReason::Unspecified),
                revocation_time,
            },
            None => RevocationStatus::undetermined("OCSP revocation time out of range", false),
        },
        CertStatus::Unknown(_) => {
            RevocationStatus::undetermined("OCSP responder does not know the certificate", false)
        }
    }
}

/// `date` must fall in `[thisUpdate - skew, nextUpdate + skew]`; without a
/// nextUpdate the window closes at `thisUpdate + skew`.
fn check_currency(
    single: &SingleResponse,
    date: DateTime<Utc>,
    skew: chrono::Duration,
) -> Result<(), String> {
    let this_update =
        ocsp_time(&single.this_update).ok_or("OCSP thisUpdate out of range".to_string())?;
    let next_update = match &single.next_update {
        Some(t) => ocsp_time(t).ok_or("OCSP nextUpdate out of range".to_string())?,
        None => this_update,
    };
    if date < this_update - skew || date > next_update + skew {
        return Err(format!(
            "OCSP response for {date} is not current (thisUpdate {this_update})"
        ));
    }
    Ok(())
}

/// Key that may sign the response: the configured responder, the issuer
/// itself, or a responder the issuer delegated to with id-kp-OCSPSigning.
fn responder_key(
    basic: &BasicOcspResponse,
    config: &RevocationConfig,
    issuer: &IssuerInfo,
    ctx: &RevocationContext<'_>,
) -> Result<PublicKey, String> {
    let responder = &basic.tbs_response_data.responder_id;
    if let Some(trusted) = &config.ocsp_responder_cert {
        if !trusted.is_valid_at(ctx.date) {
            return Err(format!(
                "configured OCSP responder {} is not valid",
                trusted.subject()
            ));
        }
        if responder_matches(responder, trusted.subject(), trusted.public_key()) {
            if !trusted.has_ocsp_no_check() {
                tracing::debug!(target: "pkix_core::ocsp", "Configured responder {} has no id-pkix-ocsp-nocheck; trusting it by configuration", trusted.subject());
            }
            return Ok(trusted.public_key().clone());
        }
    }
    if responder_matches(responder, &issuer.name, &issuer.public_key) {
        return Ok(issuer.public_key.clone());
    }
    let attached = attached_certificates(basic).map_err(|e| e.to_string())?;
    for candidate in &attached {
        if !responder_matches(responder, candidate.subject(), candidate.public_key()) {
            continue;
        }
        if candidate.issuer() != &issuer.name {
            return Err(format!(
                "OCSP responder {} is not issued by {}",
                candidate.subject(),
                issuer.name
            ));
        }
        if !candidate.has_extended_key_usage(&oid::KP_OCSP_SIGNING) {
            return Err(format!(
                "OCSP responder {} lacks id-kp-OCSPSigning",
                candidate.subject()
            ));
        }
        if !candidate.is_valid_at(ctx.date) {
            return Err(format!(
                "OCSP responder {} is not valid",
                candidate.subject()
            ));
        }
        ctx.verifier
            .verify(
                &issuer.public_key,
                candidate.signature_algorithm(),
                candidate.tbs_bytes(),
                candidate.signature(),
            )
            .map_err(|e| format!("OCSP responder certificate signature: {e}"))?;
        if !candidate.has_ocsp_no_check() {
            tracing::debug!(target: "pkix_core::ocsp", "Responder {} has no id-pkix-ocsp-nocheck; its status is not checked", candidate.subject());
        }
        return Ok(candidate.public_key().clone());
    }
    Err("OCSP response is not signed by an authorized responder".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::AlgorithmPolicy;
    use crate::test_utils::{CertBuilder, DerCertBuilder, FakeVerifier, OcspResponseBuilder, dn, key_for};
    use chrono::Duration;
    use std::sync::Arc;

    fn issuer_info() -> IssuerInfo {
        IssuerInfo {
            name: dn("CN=CA"),
            public_key: key_for("CN=CA"),
            key_id: None,
            crl_sign: true,
        }
    }

    fn leaf() -> Certificate {
        CertBuilder::new("CN=Leaf", "CN=CA").serial(7).build()
    }

    fn leaf_id() -> CertId {
        cert_id(&leaf(), &issuer_info()).unwrap()
    }

    struct Fixture {
        config: RevocationConfig,
        verifier: FakeVerifier,
        algorithms: AlgorithmPolicy,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: RevocationConfig::default(),
                verifier: FakeVerifier,
                algorithms: AlgorithmPolicy::permissive(),
            }
        }

        fn with_responder(responder: Certificate) -> Self {
            let mut fixture = Self::new();
            fixture.config.ocsp_responder_cert = Some(Arc::new(responder));
            fixture
        }

        fn evaluate(&self, body: &[u8], nonce: Option<&[u8; 16]>) -> RevocationStatus {
            let ctx = RevocationContext {
                date: Utc::now(),
                stacked: &[],
                anchors: &[],
                stores: &[],
                verifier: &self.verifier,
                algorithms: &self.algorithms,
                revocation: None,
            };
            evaluate(body, &self.config, &leaf_id(), nonce, &issuer_info(), &ctx)
        }
    }

    fn assert_undetermined(status: RevocationStatus, expected: &str) {
        match status {
            RevocationStatus::Undetermined { message, network } => {
                assert!(message.contains(expected), "{message}");
                assert!(!network);
            }
            other => panic!("expected undetermined, got {other:?}"),
        }
    }

    #[test]
    fn test_cert_id_hashes_issuer() {
        let id = cert_id(&CertBuilder::new("CN=Leaf", "CN=CA").serial(0x1234).build(), &issuer_info())
            .unwrap();
        assert_eq!(id.hash_algorithm.oid, oid::SHA1);
        assert_eq!(id.issuer_name_hash.as_bytes(), sha1(dn("CN=CA").as_der()).as_slice());
        assert_eq!(id.issuer_key_hash.as_bytes(), sha1(&key_for("CN=CA").key).as_slice());
        assert_eq!(id.serial_number.as_bytes(), &[0x12, 0x34]);
    }

    #[test]
    fn test_request_carries_cert_id_and_nonce() {
        let request = encode_request(&leaf_id(), Some(&[9; 16])).unwrap();
        let decoded = OcspRequest::from_der(&request).unwrap();

        let tbs = decoded.tbs_request;
        assert_eq!(tbs.request_list.len(), 1);
        assert!(same_certificate(&tbs.request_list[0].req_cert, &leaf_id()));
        let extensions = tbs.request_extensions.unwrap();
        assert_eq!(extensions[0].extn_id, oid::OCSP_NONCE);
        assert_eq!(extensions[0].extn_value.as_bytes(), nonce_value(&[9; 16]).unwrap());
        assert!(decoded.optional_signature.is_none());
    }

    #[test]
    fn test_request_without_nonce() {
        let request = encode_request(&leaf_id(), None).unwrap();
        let decoded = OcspRequest::from_der(&request).unwrap();
        assert!(decoded.tbs_request.request_extensions.is_none());
    }

    #[test]
    fn test_decode_revoked_response() {
        let now = Utc::now();
        let der = OcspResponseBuilder::new(leaf_id(), "CN=CA")
            .revoked(now, Some(RevocationReason::KeyCompromise))
            .build();
        let response = decode_response(&der).unwrap();
        let basic = decode_basic(&response).unwrap().unwrap();
        let single = &basic.tbs_response_data.responses[0];
        assert!(same_certificate(&single.cert_id, &leaf_id()));
        assert!(matches!(
            basic.tbs_response_data.responder_id,
            ResponderId::ByName(_)
        ));

        assert_eq!(
            Fixture::new().evaluate(&der, None),
            RevocationStatus::Revoked {
                reason: RevocationReason::KeyCompromise,
                revocation_time: DateTime::from_timestamp(now.timestamp(), 0).unwrap(),
            }
        );
    }

    #[test]
    fn test_transient_error_status_is_network() {
        let der = OcspResponseBuilder::error_status(OcspResponseStatus::TryLater);
        assert!(decode_basic(&decode_response(&der).unwrap()).unwrap().is_none());
        assert!(matches!(
            Fixture::new().evaluate(&der, None),
            RevocationStatus::Undetermined { network: true, .. }
        ));
    }

    #[test]
    fn test_unauthorized_status_is_not_network() {
        let der = OcspResponseBuilder::error_status(OcspResponseStatus::Unauthorized);
        assert_undetermined(Fixture::new().evaluate(&der, None), "Unauthorized");
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(decode_response(b"not der").is_err());
        assert_undetermined(Fixture::new().evaluate(b"not der", None), "bad OCSP response");
    }

    #[test]
    fn test_good_signed_by_issuer() {
        let der = OcspResponseBuilder::new(leaf_id(), "CN=CA").build();
        assert_eq!(Fixture::new().evaluate(&der, None), RevocationStatus::Good);
    }

    #[test]
    fn test_responder_identified_by_key_hash() {
        let der = OcspResponseBuilder::new(leaf_id(), "CN=CA")
            .responder_by_key()
            .build();
        assert_eq!(Fixture::new().evaluate(&der, None), RevocationStatus::Good);
    }

    #[test]
    fn test_unknown_is_authoritative_undetermined() {
        let der = OcspResponseBuilder::new(leaf_id(), "CN=CA").unknown().build();
        assert_undetermined(Fixture::new().evaluate(&der, None), "does not know");
    }

    #[test]
    fn test_forged_signature_is_rejected() {
        let der = OcspResponseBuilder::new(leaf_id(), "CN=CA")
            .signed_by("CN=Mallory")
            .build();
        assert_undetermined(Fixture::new().evaluate(&der, None), "signature");
    }

    #[test]
    fn test_nonce_must_echo_request() {
        let sent = [1u8; 16];
        let echoed = OcspResponseBuilder::new(leaf_id(), "CN=CA")
            .nonce(nonce_value(&sent).unwrap())
            .build();
        assert_eq!(Fixture::new().evaluate(&echoed, Some(&sent)), RevocationStatus::Good);

        let other = OcspResponseBuilder::new(leaf_id(), "CN=CA")
            .nonce(nonce_value(&[2u8; 16]).unwrap())
            .build();
        assert_undetermined(Fixture::new().evaluate(&other, Some(&sent)), "nonce mismatch");
    }

    #[test]
    fn test_missing_nonce_echo_is_accepted() {
        let der = OcspResponseBuilder::new(leaf_id(), "CN=CA").build();
        assert_eq!(Fixture::new().evaluate(&der, Some(&[1; 16])), RevocationStatus::Good);
    }

    #[test]
    fn test_response_for_other_certificate() {
        let other = CertBuilder::new("CN=Other", "CN=CA").serial(8).build();
        let der = OcspResponseBuilder::new(cert_id(&other, &issuer_info()).unwrap(), "CN=CA").build();
        assert_undetermined(Fixture::new().evaluate(&der, None), "does not cover");
    }

    #[test]
    fn test_currency_window() {
        let now = Utc::now();
        let expired = OcspResponseBuilder::new(leaf_id(), "CN=CA")
            .this_update(now - Duration::days(2))
            .next_update(now - Duration::days(1))
            .build();
        assert_undetermined(Fixture::new().evaluate(&expired, None), "not current");

        let future = OcspResponseBuilder::new(leaf_id(), "CN=CA")
            .this_update(now + Duration::hours(1))
            .build();
        assert_undetermined(Fixture::new().evaluate(&future, None), "not current");

        let within_skew = OcspResponseBuilder::new(leaf_id(), "CN=CA")
            .this_update(now - Duration::days(1))
            .next_update(now - Duration::minutes(5))
            .build();
        assert_eq!(Fixture::new().evaluate(&within_skew, None), RevocationStatus::Good);

        let no_next_update = OcspResponseBuilder::new(leaf_id(), "CN=CA")
            .this_update(now - Duration::hours(1))
            .build();
        assert_undetermined(Fixture::new().evaluate(&no_next_update, None), "not current");
    }

    #[test]
    fn test_delegated_responder() {
        let responder = DerCertBuilder::new("CN=Responder", "CN=CA")
            .ocsp_signing()
            .ocsp_no_check()
            .build();
        let der = OcspResponseBuilder::new(leaf_id(), "CN=Responder")
            .certificate(&responder)
            .build();
        assert_eq!(Fixture::new().evaluate(&der, None), RevocationStatus::Good);
    }

    #[test]
    fn test_delegated_responder_needs_ocsp_signing() {
        let responder = DerCertBuilder::new("CN=Responder", "CN=CA").build();
        let der = OcspResponseBuilder::new(leaf_id(), "CN=Responder")
            .certificate(&responder)
            .build();
        assert_undetermined(Fixture::new().evaluate(&der, None), "lacks id-kp-OCSPSigning");
    }

    #[test]
    fn test_delegated_responder_must_be_issued_by_issuer() {
        let responder = DerCertBuilder::new("CN=Responder", "CN=Other CA")
            .ocsp_signing()
            .build();
        let der = OcspResponseBuilder::new(leaf_id(), "CN=Responder")
            .certificate(&responder)
            .build();
        assert_undetermined(Fixture::new().evaluate(&der, None), "is not issued by");
    }

    #[test]
    fn test_expired_delegated_responder() {
        let now = Utc::now();
        let responder = DerCertBuilder::new("CN=Responder", "CN=CA")
            .ocsp_signing()
            .validity(now - Duration::days(30), now - Duration::days(1))
            .build();
        let der = OcspResponseBuilder::new(leaf_id(), "CN=Responder")
            .certificate(&responder)
            .build();
        assert_undetermined(Fixture::new().evaluate(&der, None), "is not valid");
    }

    #[test]
    fn test_unknown_signer_is_rejected() {
        let der = OcspResponseBuilder::new(leaf_id(), "CN=Stranger").build();
        assert_undetermined(
            Fixture::new().evaluate(&der, None),
            "not signed by an authorized responder",
        );
    }

    #[test]
    fn test_configured_responder_certificate() {
        // Trusted by configuration, so neither its issuer nor its EKU matter.
        let trusted = DerCertBuilder::new("CN=Trusted Responder", "CN=Elsewhere").build();
        let der = OcspResponseBuilder::new(leaf_id(), "CN=Trusted Responder").build();
        assert_eq!(
            Fixture::with_responder(trusted).evaluate(&der, None),
            RevocationStatus::Good
        );
    }

    #[test]
    fn test_expired_configured_responder() {
        let now = Utc::now();
        let trusted = DerCertBuilder::new("CN=Trusted Responder", "CN=Elsewhere")
            .validity(now - Duration::days(30), now - Duration::days(1))
            .build();
        let der = OcspResponseBuilder::new(leaf_id(), "CN=Trusted Responder").build();
        assert_undetermined(
            Fixture::with_responder(trusted).evaluate(&der, None),
            "configured OCSP responder",
        );
    }
}

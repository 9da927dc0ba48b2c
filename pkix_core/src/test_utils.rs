//! Fixtures shared by the unit tests: model certificates signed with a
//! digest-based scheme, DER CRLs and OCSP responses, and a canned fetcher.

use crate::cert::extensions::{AccessDescription, PolicyQualifier};
use crate::cert::{
    AlgorithmIdentifier, BasicConstraints, Certificate, Crl, DistinguishedName, DistributionPoint,
    DistributionPointName, Extensions, GeneralName, GeneralSubtree, KeyUsage, NameConstraints,
    PolicyConstraints, PolicyInformation, PolicyMapping, PublicKey, ReasonFlags, RevocationReason,
    TrustAnchor, oid,
};
use crate::checker::{CheckContext, PolicyParameters};
use crate::crypto::verifier::BadSignatureSnafu;
use crate::crypto::{AlgorithmPolicy, SignatureVerifier, VerifyError};
use crate::fetch::{
    Conditional, FetchError, FetchResponse, Fetcher, HttpStatusSnafu, TimeoutSnafu,
    UnsupportedSchemeSnafu,
};
use crate::path::selector::CertSelector;
use crate::revocation::IssuerInfo;
use crate::revocation::ocsp::CertId;
use chrono::{DateTime, Duration, Utc};
use const_oid::ObjectIdentifier;
use der::asn1::{BitString, GeneralizedTime, Ia5String, Null, OctetString, Uint, UtcTime};
use der::flagset::FlagSet;
use der::{Decode, Encode};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::crl::dp::IssuingDistributionPoint;
use x509_cert::ext::pkix::name::{
    DistributionPointName as DerDistributionPointName, GeneralName as DerGeneralName,
};
use x509_cert::ext::pkix::{AuthorityKeyIdentifier, CrlReason, ExtendedKeyUsage};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};
use x509_cert::{TbsCertificate, Version};
use x509_ocsp::{
    BasicOcspResponse, CertStatus, OcspGeneralizedTime, OcspResponse, OcspResponseStatus,
    ResponderId, ResponseBytes, ResponseData, RevokedInfo, SingleResponse,
};

pub fn dn(name: &str) -> DistinguishedName {
    name.parse().unwrap()
}

/// Deterministic key named after its holder.
pub fn key_for(name: &str) -> PublicKey {
    PublicKey {
        algorithm: oid::ED25519,
        curve: None,
        key: Sha256::digest(name.as_bytes()).to_vec(),
        bits: None,
    }
}

pub fn key_id(key: &PublicKey) -> Vec<u8> {
    Sha256::digest(&key.key)[..20].to_vec()
}

pub fn key_anchor(name: &str) -> TrustAnchor {
    TrustAnchor::from_public_key(dn(name), key_for(name))
}

/// Accepts signatures equal to `SHA-256(key || data)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeVerifier;

impl FakeVerifier {
    pub fn sign(key: &PublicKey, data: &[u8]) -> Vec<u8> {
        let mut digest = Sha256::new();
        digest.update(&key.key);
        digest.update(data);
        digest.finalize().to_vec()
    }
}

impl SignatureVerifier for FakeVerifier {
    fn verify(
        &self,
        public_key: &PublicKey,
        _algorithm: &AlgorithmIdentifier,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), VerifyError> {
        if Self::sign(public_key, data) == signature {
            Ok(())
        } else {
            BadSignatureSnafu.fail()
        }
    }
}

static NO_POLICY_CONSTRAINTS: PolicyParameters = PolicyParameters {
    initial_policies: BTreeSet::new(),
    explicit_policy_required: false,
    policy_mapping_inhibited: false,
    any_policy_inhibited: false,
    reject_policy_qualifiers: false,
};
static ANY_TARGET: Lazy<CertSelector> = Lazy::new(CertSelector::default);
static PERMISSIVE: Lazy<AlgorithmPolicy> = Lazy::new(AlgorithmPolicy::permissive);

/// Context for checking a target issued directly by `anchor`.
pub fn context_for<'a>(anchor: &'a TrustAnchor, verifier: &'a FakeVerifier) -> CheckContext<'a> {
    CheckContext {
        date: Utc::now(),
        index: 1,
        is_target: true,
        anchor: Some(anchor),
        issuer: IssuerInfo::from_anchor(anchor),
        verifier,
        algorithms: &PERMISSIVE,
        target: &ANY_TARGET,
        policy: &NO_POLICY_CONSTRAINTS,
        anchors: std::slice::from_ref(anchor),
        stores: &[],
        stacked: &[],
    }
}

fn serial_bytes(serial: u64) -> Vec<u8> {
    let mut bytes: Vec<u8> = serial
        .to_be_bytes()
        .into_iter()
        .skip_while(|b| *b == 0)
        .collect();
    if bytes.first().is_none_or(|b| b & 0x80 != 0) {
        bytes.insert(0, 0);
    }
    bytes
}

fn crl_reason(reason: RevocationReason) -> CrlReason {
    match reason {
        RevocationReason::Unspecified => CrlReason::Unspecified,
        RevocationReason::KeyCompromise => CrlReason::KeyCompromise,
        RevocationReason::CaCompromise => CrlReason::CaCompromise,
        RevocationReason::AffiliationChanged => CrlReason::AffiliationChanged,
        RevocationReason::Superseded => CrlReason::Superseded,
        RevocationReason::CessationOfOperation => CrlReason::CessationOfOperation,
        RevocationReason::CertificateHold => CrlReason::CertificateHold,
        RevocationReason::RemoveFromCrl => CrlReason::RemoveFromCRL,
        RevocationReason::PrivilegeWithdrawn => CrlReason::PrivilegeWithdrawn,
        RevocationReason::AaCompromise => CrlReason::AaCompromise,
    }
}

fn x509_name(name: &str) -> Name {
    Name::from_der(dn(name).as_der()).unwrap()
}

fn serial_number(serial: u64) -> SerialNumber {
    SerialNumber::new(&serial_bytes(serial)).unwrap()
}

fn ed25519() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: oid::ED25519,
        parameters: None,
    }
}

fn since_epoch(time: DateTime<Utc>) -> std::time::Duration {
    std::time::Duration::from_secs(time.timestamp() as u64)
}

fn utc_time(time: DateTime<Utc>) -> Time {
    Time::UtcTime(UtcTime::from_unix_duration(since_epoch(time)).unwrap())
}

fn ocsp_time(time: DateTime<Utc>) -> OcspGeneralizedTime {
    OcspGeneralizedTime(GeneralizedTime::from_unix_duration(since_epoch(time)).unwrap())
}

fn extension(id: ObjectIdentifier, critical: bool, value: &impl Encode) -> Extension {
    Extension {
        extn_id: id,
        critical,
        extn_value: OctetString::new(value.to_der().unwrap()).unwrap(),
    }
}

fn signature_bits(signer: &PublicKey, tbs: &[u8]) -> BitString {
    BitString::from_bytes(&FakeVerifier::sign(signer, tbs)).unwrap()
}

const CPS_QUALIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.2.1");

/// Builds certificates in memory. The key of every party is `key_for` its
/// name, and the certificate is signed with the issuer's key unless
/// `signed_by` says otherwise.
pub struct CertBuilder {
    subject: DistinguishedName,
    issuer: DistinguishedName,
    signer: String,
    serial: Vec<u8>,
    public_key: PublicKey,
    signature_algorithm: AlgorithmIdentifier,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    extensions: Extensions,
}

impl CertBuilder {
    pub fn new(subject: &str, issuer: &str) -> Self {
        let public_key = key_for(subject);
        let extensions = Extensions {
            subject_key_id: Some(key_id(&public_key)),
            ..Extensions::default()
        };
        let now = Utc::now();
        Self {
            subject: dn(subject),
            issuer: dn(issuer),
            signer: issuer.to_string(),
            serial: serial_bytes(1),
            public_key,
            signature_algorithm: AlgorithmIdentifier::new(oid::ED25519),
            not_before: now - Duration::days(1),
            not_after: now + Duration::days(365),
            extensions,
        }
    }

    pub fn serial(mut self, serial: u64) -> Self {
        self.serial = serial_bytes(serial);
        self
    }

    /// Replaces the subject key with the one named `name`.
    pub fn subject_key(mut self, name: &str) -> Self {
        self.public_key = key_for(name);
        self.extensions.subject_key_id = Some(key_id(&self.public_key));
        self
    }

    pub fn authority_key_id(mut self, name: &str) -> Self {
        self.extensions.authority_key_id = Some(key_id(&key_for(name)));
        self
    }

    pub fn signed_by(mut self, name: &str) -> Self {
        self.signer = name.to_string();
        self
    }

    pub fn signature_algorithm(mut self, algorithm: AlgorithmIdentifier) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    pub fn ca(mut self, path_len: Option<u32>) -> Self {
        self.extensions.basic_constraints = Some(BasicConstraints { ca: true, path_len });
        self
    }

    pub fn key_usage(mut self, bits: u16) -> Self {
        self.extensions.key_usage = Some(KeyUsage(bits));
        self
    }

    pub fn extended_key_usage(mut self, purposes: Vec<ObjectIdentifier>) -> Self {
        self.extensions.extended_key_usage = Some(purposes);
        self
    }

    pub fn critical_extension(mut self, id: ObjectIdentifier) -> Self {
        self.extensions.critical.insert(id);
        self
    }

    pub fn policies(mut self, policies: &[ObjectIdentifier]) -> Self {
        self.extensions.certificate_policies = Some(
            policies
                .iter()
                .map(|policy_id| PolicyInformation {
                    policy_id: *policy_id,
                    qualifiers: Vec::new(),
                })
                .collect(),
        );
        self
    }

    /// A single policy carrying a CPS pointer qualifier.
    pub fn policies_with_qualifier(mut self, policy_id: ObjectIdentifier, critical: bool) -> Self {
        let cps = Ia5String::new("http://cps.example.com").unwrap();
        self.extensions.certificate_policies = Some(vec![PolicyInformation {
            policy_id,
            qualifiers: vec![PolicyQualifier {
                id: CPS_QUALIFIER,
                qualifier: cps.to_der().unwrap(),
            }],
        }]);
        if critical {
            self.extensions.critical.insert(oid::CERTIFICATE_POLICIES);
        }
        self
    }

    pub fn policy_constraints(mut self, constraints: PolicyConstraints) -> Self {
        self.extensions.policy_constraints = Some(constraints);
        self
    }

    pub fn policy_mappings(mut self, mappings: Vec<PolicyMapping>) -> Self {
        self.extensions.policy_mappings = Some(mappings);
        self
    }

    pub fn inhibit_any_policy(mut self, skip_certs: u32) -> Self {
        self.extensions.inhibit_any_policy = Some(skip_certs);
        self
    }

    pub fn permitted_dns(mut self, domain: &str) -> Self {
        let constraints = self
            .extensions
            .name_constraints
            .get_or_insert_with(NameConstraints::default);
        constraints
            .permitted
            .get_or_insert_with(Vec::new)
            .push(GeneralSubtree {
                base: GeneralName::Dns(domain.to_string()),
            });
        self
    }

    pub fn dns_name(mut self, name: &str) -> Self {
        self.extensions
            .subject_alt_names
            .get_or_insert_with(Vec::new)
            .push(GeneralName::Dns(name.to_string()));
        self
    }

    pub fn crl_distribution_point(mut self, uri: &str) -> Self {
        self.extensions
            .crl_distribution_points
            .get_or_insert_with(Vec::new)
            .push(DistributionPoint {
                name: Some(DistributionPointName::FullName(vec![GeneralName::Uri(
                    uri.to_string(),
                )])),
                reasons: None,
                crl_issuer: None,
            });
        self
    }

    /// A distribution point naming only a separate CRL issuer.
    pub fn crl_issuer(mut self, name: &str) -> Self {
        self.extensions
            .crl_distribution_points
            .get_or_insert_with(Vec::new)
            .push(DistributionPoint {
                name: None,
                reasons: None,
                crl_issuer: Some(vec![GeneralName::Directory(dn(name))]),
            });
        self
    }

    pub fn ocsp_uri(mut self, uri: &str) -> Self {
        self.extensions.authority_info_access.push(AccessDescription {
            method: oid::AD_OCSP,
            location: GeneralName::Uri(uri.to_string()),
        });
        self
    }

    pub fn build(self) -> Certificate {
        let tbs = format!(
            "subject={} issuer={} serial={} key={} not_before={} not_after={} alg={} ext={:?}",
            self.subject,
            self.issuer,
            hex::encode(&self.serial),
            hex::encode(&self.public_key.key),
            self.not_before.timestamp(),
            self.not_after.timestamp(),
            self.signature_algorithm.oid,
            self.extensions,
        )
        .into_bytes();
        let signature = FakeVerifier::sign(&key_for(&self.signer), &tbs);
        Certificate {
            encoded: Vec::new(),
            tbs,
            serial: self.serial,
            signature_algorithm: self.signature_algorithm,
            signature,
            issuer: self.issuer,
            subject: self.subject,
            not_before: self.not_before,
            not_after: self.not_after,
            public_key: self.public_key,
            extensions: self.extensions,
        }
    }
}

struct RevokedSerial {
    serial: u64,
    certificate_issuer: Option<String>,
    reason: RevocationReason,
}

/// Builds DER CRLs signed with the issuer's key.
pub struct CrlBuilder {
    issuer: String,
    signing_key: PublicKey,
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
    revoked: Vec<RevokedSerial>,
    crl_number: u64,
    distribution_point: Option<String>,
    only_user_certs: bool,
    only_some_reasons: Option<ReasonFlags>,
    indirect: bool,
}

impl CrlBuilder {
    pub fn new(issuer: &str) -> Self {
        let now = Utc::now();
        Self {
            issuer: issuer.to_string(),
            signing_key: key_for(issuer),
            this_update: now - Duration::hours(1),
            next_update: Some(now + Duration::days(1)),
            revoked: Vec::new(),
            crl_number: 1,
            distribution_point: None,
            only_user_certs: false,
            only_some_reasons: None,
            indirect: false,
        }
    }

    pub fn this_update(mut self, time: DateTime<Utc>) -> Self {
        self.this_update = time;
        self
    }

    pub fn next_update(mut self, time: DateTime<Utc>) -> Self {
        self.next_update = Some(time);
        self
    }

    pub fn signed_with(mut self, key: PublicKey) -> Self {
        self.signing_key = key;
        self
    }

    pub fn crl_number(mut self, number: u64) -> Self {
        self.crl_number = number;
        self
    }

    pub fn revoke(mut self, serial: u64, reason: RevocationReason) -> Self {
        self.revoked.push(RevokedSerial {
            serial,
            certificate_issuer: None,
            reason,
        });
        self
    }

    /// Entry for a certificate issued by `issuer`, for indirect CRLs.
    pub fn revoke_for(mut self, serial: u64, issuer: &str, reason: RevocationReason) -> Self {
        self.revoked.push(RevokedSerial {
            serial,
            certificate_issuer: Some(issuer.to_string()),
            reason,
        });
        self
    }

    pub fn distribution_point(mut self, uri: &str) -> Self {
        self.distribution_point = Some(uri.to_string());
        self
    }

    pub fn only_user_certs(mut self) -> Self {
        self.only_user_certs = true;
        self
    }

    pub fn only_some_reasons(mut self, reasons: ReasonFlags) -> Self {
        self.only_some_reasons = Some(reasons);
        self
    }

    pub fn indirect(mut self) -> Self {
        self.indirect = true;
        self
    }

    fn issuing_distribution_point(&self) -> Option<IssuingDistributionPoint> {
        let has_idp = self.distribution_point.is_some()
            || self.only_user_certs
            || self.only_some_reasons.is_some()
            || self.indirect;
        has_idp.then(|| IssuingDistributionPoint {
            distribution_point: self.distribution_point.as_ref().map(|uri| {
                DerDistributionPointName::FullName(vec![DerGeneralName::UniformResourceIdentifier(
                    Ia5String::new(uri).unwrap(),
                )])
            }),
            only_contains_user_certs: self.only_user_certs,
            only_contains_ca_certs: false,
            // Both sides number the reason bits from the DER bit 0.
            only_some_reasons: self.only_some_reasons.map(|r| FlagSet::new_truncated(r.0)),
            indirect_crl: self.indirect,
            only_contains_attribute_certs: false,
        })
    }

    fn revoked_certificate(&self, entry: &RevokedSerial) -> RevokedCert {
        let mut extensions = vec![extension(
            oid::CRL_REASON,
            false,
            &crl_reason(entry.reason),
        )];
        if let Some(issuer) = &entry.certificate_issuer {
            let names = vec![DerGeneralName::DirectoryName(x509_name(issuer))];
            extensions.push(extension(oid::CERTIFICATE_ISSUER, true, &names));
        }
        RevokedCert {
            serial_number: serial_number(entry.serial),
            revocation_date: utc_time(self.this_update),
            crl_entry_extensions: Some(extensions),
        }
    }

    fn tbs(&self) -> TbsCertList {
        let akid = AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(key_id(&key_for(&self.issuer))).unwrap()),
            ..AuthorityKeyIdentifier::default()
        };
        let mut extensions = vec![
            extension(
                oid::CRL_NUMBER,
                false,
                &Uint::new(&self.crl_number.to_be_bytes()).unwrap(),
            ),
            extension(oid::AUTHORITY_KEY_IDENTIFIER, false, &akid),
        ];
        if let Some(idp) = self.issuing_distribution_point() {
            extensions.push(extension(oid::ISSUING_DISTRIBUTION_POINT, true, &idp));
        }
        let revoked: Vec<RevokedCert> = self
            .revoked
            .iter()
            .map(|entry| self.revoked_certificate(entry))
            .collect();
        TbsCertList {
            version: Version::V2,
            signature: ed25519(),
            issuer: x509_name(&self.issuer),
            this_update: utc_time(self.this_update),
            next_update: self.next_update.map(utc_time),
            revoked_certificates: (!revoked.is_empty()).then_some(revoked),
            crl_extensions: Some(extensions),
        }
    }

    pub fn build(self) -> Crl {
        let tbs = self.tbs();
        let signature = signature_bits(&self.signing_key, &tbs.to_der().unwrap());
        let crl = CertificateList {
            tbs_cert_list: tbs,
            signature_algorithm: ed25519(),
            signature,
        };
        Crl::from_der(&crl.to_der().unwrap()).expect("CrlBuilder output must parse")
    }
}

/// Builds real DER certificates, signed the `FakeVerifier` way, for
/// structures that embed certificates such as OCSP responses.
pub struct DerCertBuilder {
    subject: String,
    issuer: String,
    serial: u64,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    extended_key_usage: Vec<ObjectIdentifier>,
    ocsp_no_check: bool,
}

impl DerCertBuilder {
    pub fn new(subject: &str, issuer: &str) -> Self {
        let now = Utc::now();
        Self {
            subject: subject.to_string(),
            issuer: issuer.to_string(),
            serial: 1,
            not_before: now - Duration::days(1),
            not_after: now + Duration::days(30),
            extended_key_usage: Vec::new(),
            ocsp_no_check: false,
        }
    }

    pub fn ocsp_signing(mut self) -> Self {
        self.extended_key_usage.push(oid::KP_OCSP_SIGNING);
        self
    }

    pub fn ocsp_no_check(mut self) -> Self {
        self.ocsp_no_check = true;
        self
    }

    pub fn validity(mut self, not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn build(self) -> Certificate {
        let mut extensions = Vec::new();
        if !self.extended_key_usage.is_empty() {
            extensions.push(extension(
                oid::EXTENDED_KEY_USAGE,
                false,
                &ExtendedKeyUsage(self.extended_key_usage.clone()),
            ));
        }
        if self.ocsp_no_check {
            extensions.push(extension(oid::OCSP_NO_CHECK, false, &Null));
        }
        let tbs = TbsCertificate {
            version: Version::V3,
            serial_number: serial_number(self.serial),
            signature: ed25519(),
            issuer: x509_name(&self.issuer),
            validity: Validity {
                not_before: utc_time(self.not_before),
                not_after: utc_time(self.not_after),
            },
            subject: x509_name(&self.subject),
            subject_public_key_info: SubjectPublicKeyInfoOwned {
                algorithm: ed25519(),
                subject_public_key: BitString::from_bytes(&key_for(&self.subject).key).unwrap(),
            },
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        };
        let signature = signature_bits(&key_for(&self.issuer), &tbs.to_der().unwrap());
        let cert = x509_cert::Certificate {
            tbs_certificate: tbs,
            signature_algorithm: ed25519(),
            signature,
        };
        Certificate::from_der(&cert.to_der().unwrap()).expect("DerCertBuilder output must parse")
    }
}

/// Builds DER OCSP responses, by default signed by and naming the
/// responder given at construction.
pub struct OcspResponseBuilder {
    cert_id: CertId,
    responder: String,
    signer: String,
    by_key: bool,
    status: CertStatus,
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
    nonce: Option<Vec<u8>>,
    certs: Vec<Vec<u8>>,
}

impl OcspResponseBuilder {
    pub fn new(cert_id: CertId, responder: &str) -> Self {
        Self {
            cert_id,
            responder: responder.to_string(),
            signer: responder.to_string(),
            by_key: false,
            status: CertStatus::Good(Null),
            this_update: Utc::now() - Duration::minutes(1),
            next_update: None,
            nonce: None,
            certs: Vec::new(),
        }
    }

    /// An OCSPResponse carrying only a non-successful status.
    pub fn error_status(status: OcspResponseStatus) -> Vec<u8> {
        OcspResponse {
            response_status: status,
            response_bytes: None,
        }
        .to_der()
        .unwrap()
    }

    pub fn revoked(mut self, time: DateTime<Utc>, reason: Option<RevocationReason>) -> Self {
        self.status = CertStatus::Revoked(RevokedInfo {
            revocation_time: ocsp_time(time),
            revocation_reason: reason.map(crl_reason),
        });
        self
    }

    pub fn unknown(mut self) -> Self {
        self.status = CertStatus::Unknown(Null);
        self
    }

    pub fn this_update(mut self, time: DateTime<Utc>) -> Self {
        self.this_update = time;
        self
    }

    pub fn next_update(mut self, time: DateTime<Utc>) -> Self {
        self.next_update = Some(time);
        self
    }

    /// Raw extnValue of the nonce extension.
    pub fn nonce(mut self, value: Vec<u8>) -> Self {
        self.nonce = Some(value);
        self
    }

    pub fn signed_by(mut self, name: &str) -> Self {
        self.signer = name.to_string();
        self
    }

    /// Identifies the responder by the SHA-1 hash of its key.
    pub fn responder_by_key(mut self) -> Self {
        self.by_key = true;
        self
    }

    pub fn certificate(mut self, cert: &Certificate) -> Self {
        self.certs.push(cert.encoded().to_vec());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let responder_id = if self.by_key {
            let hash = crate::revocation::ocsp::sha1(&key_for(&self.responder).key);
            ResponderId::ByKey(OctetString::new(hash).unwrap())
        } else {
            ResponderId::ByName(x509_name(&self.responder))
        };
        let data = ResponseData {
            version: x509_ocsp::Version::V1,
            responder_id,
            produced_at: ocsp_time(Utc::now()),
            responses: vec![SingleResponse {
                cert_id: self.cert_id,
                cert_status: self.status,
                this_update: ocsp_time(self.this_update),
                next_update: self.next_update.map(ocsp_time),
                single_extensions: None,
            }],
            response_extensions: self
                .nonce
                .map(|value| vec![extension_raw(oid::OCSP_NONCE, value)]),
        };
        let signature = signature_bits(&key_for(&self.signer), &data.to_der().unwrap());
        let certs = (!self.certs.is_empty()).then(|| {
            self.certs
                .iter()
                .map(|der| x509_cert::Certificate::from_der(der).unwrap())
                .collect()
        });
        let basic = BasicOcspResponse {
            tbs_response_data: data,
            signature_algorithm: ed25519(),
            signature,
            certs,
        };
        OcspResponse {
            response_status: OcspResponseStatus::Successful,
            response_bytes: Some(ResponseBytes {
                response_type: oid::OCSP_BASIC,
                response: OctetString::new(basic.to_der().unwrap()).unwrap(),
            }),
        }
        .to_der()
        .unwrap()
    }
}

fn extension_raw(id: ObjectIdentifier, value: Vec<u8>) -> Extension {
    Extension {
        extn_id: id,
        critical: false,
        extn_value: OctetString::new(value).unwrap(),
    }
}

enum Canned {
    Body { bytes: Vec<u8>, etag: Option<String> },
    Timeout,
}

#[derive(Default)]
struct StubState {
    responses: HashMap<String, Canned>,
    gets: HashMap<String, usize>,
    posts: HashMap<String, usize>,
    conditionals: HashMap<String, Conditional>,
}

/// Serves canned bodies for GET and POST. Unknown http URIs answer 404,
/// other schemes are unsupported.
#[derive(Default)]
pub struct StubFetcher {
    state: Mutex<StubState>,
}

impl std::fmt::Debug for StubFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StubFetcher")
    }
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, uri: &str, bytes: Vec<u8>) {
        self.set(uri, Canned::Body { bytes, etag: None });
    }

    pub fn respond_with_etag(&self, uri: &str, bytes: Vec<u8>, etag: &str) {
        self.set(
            uri,
            Canned::Body {
                bytes,
                etag: Some(etag.to_string()),
            },
        );
    }

    pub fn time_out(&self, uri: &str) {
        self.set(uri, Canned::Timeout);
    }

    pub fn get_count(&self, uri: &str) -> usize {
        self.state.lock().unwrap().gets.get(uri).copied().unwrap_or(0)
    }

    pub fn post_count(&self, uri: &str) -> usize {
        self.state.lock().unwrap().posts.get(uri).copied().unwrap_or(0)
    }

    pub fn last_conditional(&self, uri: &str) -> Option<Conditional> {
        self.state.lock().unwrap().conditionals.get(uri).cloned()
    }

    fn set(&self, uri: &str, canned: Canned) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(uri.to_string(), canned);
    }

    fn check_scheme(uri: &str) -> Result<(), FetchError> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            Ok(())
        } else {
            UnsupportedSchemeSnafu { uri }.fail()
        }
    }
}

impl Fetcher for StubFetcher {
    fn get(&self, uri: &str, conditional: &Conditional) -> Result<FetchResponse, FetchError> {
        Self::check_scheme(uri)?;
        let mut state = self.state.lock().unwrap();
        *state.gets.entry(uri.to_string()).or_default() += 1;
        state
            .conditionals
            .insert(uri.to_string(), conditional.clone());
        match state.responses.get(uri) {
            Some(Canned::Body { bytes, etag }) => {
                if etag.is_some() && conditional.etag == *etag {
                    return Ok(FetchResponse::NotModified);
                }
                Ok(FetchResponse::Body {
                    bytes: bytes.clone(),
                    etag: etag.clone(),
                    last_modified: None,
                })
            }
            Some(Canned::Timeout) => TimeoutSnafu { uri }.fail(),
            None => HttpStatusSnafu { uri, status: 404u16 }.fail(),
        }
    }

    fn post(&self, uri: &str, _content_type: &str, _body: &[u8]) -> Result<Vec<u8>, FetchError> {
        Self::check_scheme(uri)?;
        let mut state = self.state.lock().unwrap();
        *state.posts.entry(uri.to_string()).or_default() += 1;
        match state.responses.get(uri) {
            Some(Canned::Body { bytes, .. }) => Ok(bytes.clone()),
            Some(Canned::Timeout) => TimeoutSnafu { uri }.fail(),
            None => HttpStatusSnafu { uri, status: 404u16 }.fail(),
        }
    }
}

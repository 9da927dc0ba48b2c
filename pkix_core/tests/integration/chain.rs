use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{
    BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
};
use openssl::x509::{X509, X509Name, X509NameBuilder};
use pkix_core::cert::oid;
use pkix_core::crypto::AlgorithmPolicy;
use pkix_core::path::{CertSelector, CollectionCertStore};
use pkix_core::{
    BuildDirection, BuildParameters, CertPathValidator, Certificate, PathBuilder, PkixError,
    TrustAnchor,
};
use std::sync::Arc;
use test_case::test_case;

fn gen_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

fn make_name(cn: &str) -> X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    builder.append_entry_by_text("CN", cn).unwrap();
    builder.build()
}

enum Role {
    Root,
    Intermediate,
    Leaf,
}

fn issue(
    subject: &str,
    subject_key: &PKey<Private>,
    issuer: &str,
    issuer_key: &PKey<Private>,
    role: Role,
    days: u32,
) -> X509 {
    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&make_name(subject)).unwrap();
    builder.set_issuer_name(&make_name(issuer)).unwrap();
    builder.set_pubkey(subject_key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(days).unwrap())
        .unwrap();
    match role {
        Role::Root => {
            builder
                .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                .unwrap();
            builder
                .append_extension(
                    KeyUsage::new()
                        .critical()
                        .key_cert_sign()
                        .crl_sign()
                        .build()
                        .unwrap(),
                )
                .unwrap();
        }
        Role::Intermediate => {
            builder
                .append_extension(
                    BasicConstraints::new()
                        .critical()
                        .ca()
                        .pathlen(0)
                        .build()
                        .unwrap(),
                )
                .unwrap();
            builder
                .append_extension(
                    KeyUsage::new()
                        .critical()
                        .key_cert_sign()
                        .crl_sign()
                        .build()
                        .unwrap(),
                )
                .unwrap();
        }
        Role::Leaf => {
            builder
                .append_extension(BasicConstraints::new().critical().build().unwrap())
                .unwrap();
            builder
                .append_extension(
                    KeyUsage::new()
                        .critical()
                        .digital_signature()
                        .key_encipherment()
                        .build()
                        .unwrap(),
                )
                .unwrap();
            builder
                .append_extension(ExtendedKeyUsage::new().server_auth().build().unwrap())
                .unwrap();
            let san = SubjectAlternativeName::new()
                .dns("test.example.com")
                .build(&builder.x509v3_context(None, None))
                .unwrap();
            builder.append_extension(san).unwrap();
        }
    }
    builder.sign(issuer_key, MessageDigest::sha256()).unwrap();
    builder.build()
}

fn parse(cert: &X509) -> Certificate {
    Certificate::from_der(&cert.to_der().unwrap()).unwrap()
}

struct Pki {
    root: Certificate,
    intermediate: Certificate,
    leaf: Certificate,
}

impl Pki {
    fn new() -> Self {
        let root_key = gen_key();
        let intermediate_key = gen_key();
        let leaf_key = gen_key();
        let root = issue("Test Root", &root_key, "Test Root", &root_key, Role::Root, 3650);
        let intermediate = issue(
            "Test Intermediate",
            &intermediate_key,
            "Test Root",
            &root_key,
            Role::Intermediate,
            365,
        );
        let leaf = issue(
            "test.example.com",
            &leaf_key,
            "Test Intermediate",
            &intermediate_key,
            Role::Leaf,
            30,
        );
        Self {
            root: parse(&root),
            intermediate: parse(&intermediate),
            leaf: parse(&leaf),
        }
    }

    /// Same names as `new`, but the leaf is signed by a key nobody trusts.
    fn with_forged_leaf() -> Self {
        let mut pki = Self::new();
        let stranger = gen_key();
        let leaf_key = gen_key();
        let forged = issue(
            "test.example.com",
            &leaf_key,
            "Test Intermediate",
            &stranger,
            Role::Leaf,
            30,
        );
        pki.leaf = parse(&forged);
        pki
    }

    fn params(&self) -> BuildParameters {
        let mut store = CollectionCertStore::new();
        store.add_certificate(self.intermediate.clone());
        BuildParameters::new(
            CertSelector::for_certificate(Arc::new(self.leaf.clone())),
            vec![TrustAnchor::from_certificate(self.root.clone())],
        )
        .with_store(Arc::new(store))
    }
}

#[test_case(BuildDirection::Forward; "forward")]
#[test_case(BuildDirection::Reverse; "reverse")]
fn should_build_rsa_chain_to_root(direction: BuildDirection) {
    // Given a root, an intermediate and a leaf issued with openssl
    let pki = Pki::new();
    let params = pki.params().with_direction(direction);

    // When the path is built
    let result = PathBuilder::build(&params).expect("path to build");

    // Then it runs leaf, intermediate and ends at the root
    assert_eq!(result.path.len(), 2);
    assert_eq!(result.path[0].subject(), pki.leaf.subject());
    assert_eq!(result.path[1].subject(), pki.intermediate.subject());
    assert_eq!(result.trust_anchor.name(), pki.root.subject());
    assert_eq!(&result.public_key, pki.leaf.public_key());
    assert!(result.adjacency.rejected().next().is_none());
}

#[test]
fn should_revalidate_built_path() {
    let pki = Pki::new();
    let params = pki.params();
    let built = PathBuilder::build(&params).unwrap();

    let validated = CertPathValidator::validate(&built.path, &params).unwrap();

    assert_eq!(validated.trust_anchor, built.trust_anchor);
    assert_eq!(&validated.public_key, pki.leaf.public_key());
}

#[test]
fn should_reject_leaf_signed_by_unknown_key() {
    let pki = Pki::with_forged_leaf();

    let failure = PathBuilder::build(&pki.params()).unwrap_err();

    assert!(
        matches!(failure.error, PkixError::SignatureInvalid { .. }),
        "unexpected error: {failure}"
    );
    assert_eq!(failure.adjacency.rejected().count(), 1);
}

#[test]
fn should_reject_disabled_signature_algorithm() {
    let pki = Pki::new();
    let params = pki
        .params()
        .with_algorithms(AlgorithmPolicy::default().disable(oid::SHA256_WITH_RSA));

    let failure = PathBuilder::build(&params).unwrap_err();

    assert!(
        matches!(failure.error, PkixError::AlgorithmDisabled { .. }),
        "unexpected error: {failure}"
    );
}

#[test]
fn should_reject_expired_leaf() {
    let pki = Pki::new();
    let params = pki
        .params()
        .with_date(chrono::Utc::now() + chrono::Duration::days(90));

    let failure = PathBuilder::build(&params).unwrap_err();

    assert!(
        matches!(failure.error, PkixError::Expired { .. }),
        "unexpected error: {failure}"
    );
}

#[test]
fn should_report_adjacency_as_json() {
    let pki = Pki::with_forged_leaf();

    let failure = PathBuilder::build(&pki.params()).unwrap_err();
    let json: serde_json::Value =
        serde_json::from_str(&failure.adjacency.to_json().unwrap()).unwrap();

    let vertices = json["vertices"].as_array().unwrap();
    assert_eq!(vertices.len(), 2);
    assert_eq!(vertices[0]["subject"], "CN=test.example.com");
    assert!(vertices[0]["rejection"].is_null());
    assert_eq!(vertices[1]["subject"], "CN=Test Intermediate");
    assert_eq!(vertices[1]["depth"], 1);
    assert!(vertices[1]["rejection"].is_string());
}

//! Conversion of DER certificates and CRLs into the owned model.

use crate::cert::certificate::{AlgorithmIdentifier, Certificate, PublicKey};
use crate::cert::crl::{Crl, RevokedEntry};
use crate::cert::extensions::{
    AccessDescription, BasicConstraints, DistributionPoint, DistributionPointName, Extensions,
    GeneralSubtree, IssuingDistributionPoint, KeyUsage, NameConstraints, PolicyConstraints,
    PolicyInformation, PolicyMapping, PolicyQualifier, ReasonFlags, RevocationReason,
};
use crate::cert::name::{DistinguishedName, GeneralName};
use crate::cert::oid;
use chrono::{DateTime, Utc};
use const_oid::ObjectIdentifier;
use snafu::{Location, ResultExt, Snafu};
use std::collections::BTreeSet;
use x509_parser::extensions::{self as ext, ParsedExtension, X509Extension};
use x509_parser::oid_registry::Oid;
use x509_parser::prelude::*;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum ParseError {
    #[snafu(display("Failed to parse certificate"))]
    CertificateParse {
        source: x509_parser::nom::Err<x509_parser::error::X509Error>,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to parse CRL"))]
    CrlParse {
        source: x509_parser::nom::Err<x509_parser::error::X509Error>,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Malformed extension {oid}: {message}"))]
    Extension {
        oid: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Invalid object identifier: {message}"))]
    Oid {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Invalid distinguished name: {message}"))]
    Name {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Time value out of range"))]
    InvalidTime {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Malformed OCSP structure: {message}"))]
    Ocsp {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

pub fn parse_certificate(der: &[u8]) -> Result<Certificate, ParseError> {
    let (_, cert) = X509Certificate::from_der(der).context(CertificateParseSnafu)?;

    let issuer = DistinguishedName::from_der(cert.issuer().as_raw())?;
    let subject = DistinguishedName::from_der(cert.subject().as_raw())?;
    let validity = cert.validity();
    let not_before =
        asn1_time_to_datetime(&validity.not_before).ok_or_else(|| InvalidTimeSnafu.build())?;
    let not_after =
        asn1_time_to_datetime(&validity.not_after).ok_or_else(|| InvalidTimeSnafu.build())?;
    let extensions = convert_extensions(cert.extensions(), &issuer)?;

    Ok(Certificate {
        encoded: der.to_vec(),
        tbs: cert.tbs_certificate.as_ref().to_vec(),
        serial: cert.raw_serial().to_vec(),
        signature_algorithm: convert_algorithm(&cert.signature_algorithm)?,
        signature: cert.signature_value.data.to_vec(),
        issuer,
        subject,
        not_before,
        not_after,
        public_key: convert_public_key(cert.public_key())?,
        extensions,
    })
}

pub fn parse_crl(der: &[u8]) -> Result<Crl, ParseError> {
    let (_, crl) = CertificateRevocationList::from_der(der).context(CrlParseSnafu)?;
    let tbs = &crl.tbs_cert_list;

    let issuer = DistinguishedName::from_der(tbs.issuer.as_raw())?;
    let this_update =
        asn1_time_to_datetime(&tbs.this_update).ok_or_else(|| InvalidTimeSnafu.build())?;
    let next_update = match &tbs.next_update {
        Some(t) => Some(asn1_time_to_datetime(t).ok_or_else(|| InvalidTimeSnafu.build())?),
        None => None,
    };

    let mut critical = BTreeSet::new();
    let mut crl_number = None;
    let mut authority_key_id = None;
    let mut issuing_distribution_point = None;
    let mut delta = false;
    for extension in tbs.extensions() {
        let id = convert_oid(&extension.oid)?;
        if extension.critical {
            critical.insert(id);
        }
        match extension.parsed_extension() {
            ParsedExtension::CRLNumber(number) => crl_number = Some(number.to_bytes_be()),
            ParsedExtension::AuthorityKeyIdentifier(akid) => {
                authority_key_id = akid.key_identifier.as_ref().map(|k| k.0.to_vec())
            }
            ParsedExtension::IssuingDistributionPoint(idp) => {
                issuing_distribution_point = Some(IssuingDistributionPoint {
                    name: convert_dp_name(idp.distribution_point.as_ref(), &issuer)?,
                    only_user_certs: idp.only_contains_user_certs,
                    only_ca_certs: idp.only_contains_ca_certs,
                    only_some_reasons: idp.only_some_reasons.as_ref().map(|r| ReasonFlags(r.flags)),
                    indirect_crl: idp.indirect_crl,
                    only_attribute_certs: idp.only_contains_attribute_certs,
                })
            }
            ParsedExtension::ParseError { error } => {
                return ExtensionSnafu {
                    oid: id.to_string(),
                    message: error.to_string(),
                }
                .fail();
            }
            _ if id == oid::DELTA_CRL_INDICATOR => delta = true,
            _ => {}
        }
    }

    // certificateIssuer applies to the entry carrying it and every later entry
    // until the next one (RFC 5280 5.3.3).
    let mut current_issuer = issuer.clone();
    let mut revoked = Vec::with_capacity(tbs.revoked_certificates.len());
    for entry in crl.iter_revoked_certificates() {
        let mut entry_critical = BTreeSet::new();
        for extension in entry.extensions() {
            let id = convert_oid(&extension.oid)?;
            if extension.critical {
                entry_critical.insert(id);
            }
            if id == oid::CERTIFICATE_ISSUER
                && let Some(dn) = certificate_issuer_name(extension)?
            {
                current_issuer = dn;
            }
        }
        revoked.push(RevokedEntry {
            serial: entry.raw_serial().to_vec(),
            revocation_date: asn1_time_to_datetime(&entry.revocation_date)
                .ok_or_else(|| InvalidTimeSnafu.build())?,
            reason: entry
                .reason_code()
                .and_then(|(_, code)| RevocationReason::from_code(code.0)),
            certificate_issuer: current_issuer.clone(),
            critical: entry_critical,
        });
    }

    Ok(Crl {
        encoded: der.to_vec(),
        tbs: tbs.as_ref().to_vec(),
        signature_algorithm: convert_algorithm(&crl.signature_algorithm)?,
        signature: crl.signature_value.data.to_vec(),
        issuer,
        this_update,
        next_update,
        revoked,
        crl_number,
        authority_key_id,
        issuing_distribution_point,
        delta,
        critical,
    })
}

fn certificate_issuer_name(
    extension: &X509Extension,
) -> Result<Option<DistinguishedName>, ParseError> {
    // CertificateIssuer ::= GeneralNames, the same shape as subjectAltName
    let (_, names) = ext::SubjectAlternativeName::from_der(extension.value).map_err(|e| {
        ExtensionSnafu {
            oid: oid::CERTIFICATE_ISSUER.to_string(),
            message: e.to_string(),
        }
        .build()
    })?;
    for name in &names.general_names {
        if let ext::GeneralName::DirectoryName(dn) = name {
            return Ok(Some(DistinguishedName::from_der(dn.as_raw())?));
        }
    }
    Ok(None)
}

fn convert_extensions(
    extensions: &[X509Extension],
    issuer: &DistinguishedName,
) -> Result<Extensions, ParseError> {
    let mut out = Extensions::default();
    for extension in extensions {
        let id = convert_oid(&extension.oid)?;
        if extension.critical {
            out.critical.insert(id);
        }
        match extension.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => {
                out.basic_constraints = Some(BasicConstraints {
                    ca: bc.ca,
                    path_len: bc.path_len_constraint,
                })
            }
            ParsedExtension::KeyUsage(ku) => out.key_usage = Some(KeyUsage(ku.flags)),
            ParsedExtension::ExtendedKeyUsage(eku) => {
                let mut purposes = Vec::new();
                let known = [
                    (eku.any, oid::ANY_EXTENDED_KEY_USAGE),
                    (eku.server_auth, oid::KP_SERVER_AUTH),
                    (eku.client_auth, oid::KP_CLIENT_AUTH),
                    (eku.code_signing, oid::KP_CODE_SIGNING),
                    (eku.email_protection, oid::KP_EMAIL_PROTECTION),
                    (eku.time_stamping, oid::KP_TIME_STAMPING),
                    (eku.ocsp_signing, oid::KP_OCSP_SIGNING),
                ];
                purposes.extend(known.iter().filter(|(set, _)| *set).map(|(_, o)| *o));
                for other in &eku.other {
                    purposes.push(convert_oid(other)?);
                }
                out.extended_key_usage = Some(purposes);
            }
            ParsedExtension::NameConstraints(nc) => {
                out.name_constraints = Some(NameConstraints {
                    permitted: convert_subtrees(nc.permitted_subtrees.as_deref())?,
                    excluded: convert_subtrees(nc.excluded_subtrees.as_deref())?,
                })
            }
            ParsedExtension::CertificatePolicies(policies) => {
                let mut converted = Vec::with_capacity(policies.len());
                for policy in policies {
                    let mut qualifiers = Vec::new();
                    for q in policy.policy_qualifiers.iter().flatten() {
                        qualifiers.push(PolicyQualifier {
                            id: convert_oid(&q.policy_qualifier_id)?,
                            qualifier: q.qualifier.to_vec(),
                        });
                    }
                    converted.push(PolicyInformation {
                        policy_id: convert_oid(&policy.policy_id)?,
                        qualifiers,
                    });
                }
                out.certificate_policies = Some(converted);
            }
            ParsedExtension::PolicyMappings(pm) => {
                let mut mappings = Vec::with_capacity(pm.mappings.len());
                for m in &pm.mappings {
                    mappings.push(PolicyMapping {
                        issuer_domain_policy: convert_oid(&m.issuer_domain_policy)?,
                        subject_domain_policy: convert_oid(&m.subject_domain_policy)?,
                    });
                }
                out.policy_mappings = Some(mappings);
            }
            ParsedExtension::PolicyConstraints(pc) => {
                out.policy_constraints = Some(PolicyConstraints {
                    require_explicit_policy: pc.require_explicit_policy,
                    inhibit_policy_mapping: pc.inhibit_policy_mapping,
                })
            }
            ParsedExtension::InhibitAnyPolicy(iap) => out.inhibit_any_policy = Some(iap.skip_certs),
            ParsedExtension::AuthorityKeyIdentifier(akid) => {
                out.authority_key_id = akid.key_identifier.as_ref().map(|k| k.0.to_vec())
            }
            ParsedExtension::SubjectKeyIdentifier(skid) => {
                out.subject_key_id = Some(skid.0.to_vec())
            }
            ParsedExtension::SubjectAlternativeName(san) => {
                out.subject_alt_names = Some(convert_general_names(&san.general_names)?)
            }
            ParsedExtension::CRLDistributionPoints(points) => {
                let mut converted = Vec::with_capacity(points.points.len());
                for point in &points.points {
                    let crl_issuer = match &point.crl_issuer {
                        Some(names) => Some(convert_general_names(names)?),
                        None => None,
                    };
                    // A relative name resolves against the CRL issuer when one is
                    // given, otherwise against the certificate issuer.
                    let base = crl_issuer
                        .as_ref()
                        .and_then(|names| {
                            names.iter().find_map(|n| match n {
                                GeneralName::Directory(dn) => Some(dn.clone()),
                                _ => None,
                            })
                        })
                        .unwrap_or_else(|| issuer.clone());
                    converted.push(DistributionPoint {
                        name: convert_dp_name(point.distribution_point.as_ref(), &base)?,
                        reasons: point.reasons.as_ref().map(|r| ReasonFlags(r.flags)),
                        crl_issuer,
                    });
                }
                out.crl_distribution_points = Some(converted);
            }
            ParsedExtension::AuthorityInfoAccess(aia) => {
                for desc in &aia.accessdescs {
                    out.authority_info_access.push(AccessDescription {
                        method: convert_oid(&desc.access_method)?,
                        location: convert_general_name(&desc.access_location)?,
                    });
                }
            }
            ParsedExtension::ParseError { error } => {
                return ExtensionSnafu {
                    oid: id.to_string(),
                    message: error.to_string(),
                }
                .fail();
            }
            _ if id == oid::OCSP_NO_CHECK => out.ocsp_no_check = true,
            _ => {}
        }
    }
    Ok(out)
}

fn convert_subtrees(
    subtrees: Option<&[ext::GeneralSubtree]>,
) -> Result<Option<Vec<GeneralSubtree>>, ParseError> {
    let Some(subtrees) = subtrees else {
        return Ok(None);
    };
    let mut out = Vec::with_capacity(subtrees.len());
    for subtree in subtrees {
        out.push(GeneralSubtree {
            base: convert_general_name(&subtree.base)?,
        });
    }
    Ok(Some(out))
}

fn convert_dp_name(
    name: Option<&ext::DistributionPointName>,
    base: &DistinguishedName,
) -> Result<Option<DistributionPointName>, ParseError> {
    Ok(match name {
        None => None,
        Some(ext::DistributionPointName::FullName(names)) => {
            Some(DistributionPointName::FullName(convert_general_names(names)?))
        }
        Some(ext::DistributionPointName::NameRelativeToCRLIssuer(rdn)) => {
            let mut attributes = Vec::new();
            for atv in rdn.iter() {
                let value = match atv.as_str() {
                    Ok(s) => s.to_string(),
                    Err(_) => format!("#{}", hex::encode(atv.attr_value().data)),
                };
                attributes.push((convert_oid(atv.attr_type())?, value));
            }
            Some(DistributionPointName::RelativeToIssuer(
                base.with_relative_rdn(attributes),
            ))
        }
    })
}

fn convert_general_names(names: &[ext::GeneralName]) -> Result<Vec<GeneralName>, ParseError> {
    names.iter().map(convert_general_name).collect()
}

fn convert_general_name(name: &ext::GeneralName) -> Result<GeneralName, ParseError> {
    Ok(match name {
        ext::GeneralName::RFC822Name(v) => GeneralName::Rfc822(v.to_string()),
        ext::GeneralName::DNSName(v) => GeneralName::Dns(v.to_string()),
        ext::GeneralName::URI(v) => GeneralName::Uri(v.to_string()),
        ext::GeneralName::IPAddress(v) => GeneralName::IpAddress(v.to_vec()),
        ext::GeneralName::DirectoryName(dn) => {
            GeneralName::Directory(DistinguishedName::from_der(dn.as_raw())?)
        }
        ext::GeneralName::RegisteredID(id) => GeneralName::RegisteredId(convert_oid(id)?),
        ext::GeneralName::OtherName(id, _) => GeneralName::Unsupported(format!("otherName:{id}")),
        ext::GeneralName::X400Address(_) => GeneralName::Unsupported("x400Address".to_string()),
        ext::GeneralName::EDIPartyName(_) => GeneralName::Unsupported("ediPartyName".to_string()),
    })
}

fn convert_algorithm(
    algorithm: &x509_parser::x509::AlgorithmIdentifier,
) -> Result<AlgorithmIdentifier, ParseError> {
    Ok(AlgorithmIdentifier {
        oid: convert_oid(&algorithm.algorithm)?,
        parameters: algorithm
            .parameters
            .as_ref()
            .filter(|p| !p.data.is_empty())
            .map(|p| p.data.to_vec()),
    })
}

fn convert_public_key(spki: &SubjectPublicKeyInfo) -> Result<PublicKey, ParseError> {
    let algorithm = convert_oid(&spki.algorithm.algorithm)?;
    let curve = spki
        .algorithm
        .parameters
        .as_ref()
        .and_then(|p| ObjectIdentifier::from_bytes(p.data).ok());
    let bits = spki
        .parsed()
        .ok()
        .map(|k| k.key_size())
        .filter(|size| *size > 0);
    Ok(PublicKey {
        algorithm,
        curve,
        key: spki.subject_public_key.data.to_vec(),
        bits,
    })
}

pub(crate) fn convert_oid(oid: &Oid) -> Result<ObjectIdentifier, ParseError> {
    ObjectIdentifier::from_bytes(oid.as_bytes()).map_err(|e| {
        OidSnafu {
            message: format!("{oid}: {e}"),
        }
        .build()
    })
}

pub(crate) fn asn1_time_to_datetime(
    asn1_time: &x509_parser::time::ASN1Time,
) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(asn1_time.timestamp(), 0)
}

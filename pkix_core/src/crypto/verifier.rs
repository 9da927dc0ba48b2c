use crate::cert::oid;
use crate::cert::{AlgorithmIdentifier, PublicKey};
use aws_lc_rs::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use snafu::{Location, Snafu};

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum VerifyError {
    #[snafu(display("Unsupported signature algorithm {algorithm} for {key_algorithm} key"))]
    UnsupportedAlgorithm {
        algorithm: String,
        key_algorithm: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Signature does not verify"))]
    BadSignature {
        #[snafu(implicit)]
        location: Location,
    },
}

/// Signature primitive used for certificates, CRLs and OCSP responses.
pub trait SignatureVerifier: Send + Sync + std::fmt::Debug {
    fn verify(
        &self,
        public_key: &PublicKey,
        algorithm: &AlgorithmIdentifier,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), VerifyError>;
}

/// `SignatureVerifier` backed by aws-lc-rs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AwsLcVerifier;

impl AwsLcVerifier {
    fn select(
        public_key: &PublicKey,
        algorithm: &AlgorithmIdentifier,
    ) -> Option<&'static dyn VerificationAlgorithm> {
        let alg = algorithm.oid;
        if public_key.algorithm == oid::RSA_ENCRYPTION {
            let params: &'static signature::RsaParameters = if alg == oid::SHA256_WITH_RSA {
                &signature::RSA_PKCS1_2048_8192_SHA256
            } else if alg == oid::SHA384_WITH_RSA {
                &signature::RSA_PKCS1_2048_8192_SHA384
            } else if alg == oid::SHA512_WITH_RSA {
                &signature::RSA_PKCS1_2048_8192_SHA512
            } else if alg == oid::SHA1_WITH_RSA {
                &signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY
            } else {
                return None;
            };
            return Some(params);
        }
        if public_key.algorithm == oid::EC_PUBLIC_KEY {
            let curve = public_key.curve?;
            let params: &'static signature::EcdsaVerificationAlgorithm =
                match (curve, alg) {
                    (c, a) if c == oid::SECP256R1 && a == oid::ECDSA_WITH_SHA256 => {
                        &signature::ECDSA_P256_SHA256_ASN1
                    }
                    (c, a) if c == oid::SECP256R1 && a == oid::ECDSA_WITH_SHA384 => {
                        &signature::ECDSA_P256_SHA384_ASN1
                    }
                    (c, a) if c == oid::SECP384R1 && a == oid::ECDSA_WITH_SHA384 => {
                        &signature::ECDSA_P384_SHA384_ASN1
                    }
                    (c, a) if c == oid::SECP384R1 && a == oid::ECDSA_WITH_SHA256 => {
                        &signature::ECDSA_P384_SHA256_ASN1
                    }
                    (c, a) if c == oid::SECP521R1 && a == oid::ECDSA_WITH_SHA512 => {
                        &signature::ECDSA_P521_SHA512_ASN1
                    }
                    _ => return None,
                };
            return Some(params);
        }
        if public_key.algorithm == oid::ED25519 && alg == oid::ED25519 {
            return Some(&signature::ED25519);
        }
        None
    }
}

impl SignatureVerifier for AwsLcVerifier {
    fn verify(
        &self,
        public_key: &PublicKey,
        algorithm: &AlgorithmIdentifier,
        data: &[u8],
        sig: &[u8],
    ) -> Result<(), VerifyError> {
        let Some(verification) = Self::select(public_key, algorithm) else {
            return UnsupportedAlgorithmSnafu {
                algorithm: algorithm.name(),
                key_algorithm: public_key.algorithm.to_string(),
            }
            .fail();
        };
        UnparsedPublicKey::new(verification, &public_key.key)
            .verify(data, sig)
            .map_err(|_| BadSignatureSnafu.build())
    }
}

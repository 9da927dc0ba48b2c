use crate::cert::oid;
use crate::cert::{AlgorithmIdentifier, PublicKey};
use crate::config::settings::Settings;
use crate::config::{ConfigError, InvalidParameterValueSnafu};
use const_oid::ObjectIdentifier;
use std::collections::BTreeSet;

/// Which signature algorithms and key sizes are acceptable. Built once from
/// configuration and handed to every component that verifies signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmPolicy {
    disabled: BTreeSet<ObjectIdentifier>,
    min_rsa_bits: usize,
    min_ec_bits: usize,
}

impl Default for AlgorithmPolicy {
    fn default() -> Self {
        Self {
            disabled: [oid::MD2_WITH_RSA, oid::MD5_WITH_RSA].into_iter().collect(),
            min_rsa_bits: 1024,
            min_ec_bits: 0,
        }
    }
}

impl AlgorithmPolicy {
    /// Nothing disabled, no key size floor.
    pub fn permissive() -> Self {
        Self {
            disabled: BTreeSet::new(),
            min_rsa_bits: 0,
            min_ec_bits: 0,
        }
    }

    pub fn disable(mut self, algorithm: ObjectIdentifier) -> Self {
        self.disabled.insert(algorithm);
        self
    }

    pub fn with_min_rsa_bits(mut self, bits: usize) -> Self {
        self.min_rsa_bits = bits;
        self
    }

    pub fn with_min_ec_bits(mut self, bits: usize) -> Self {
        self.min_ec_bits = bits;
        self
    }

    pub fn permits(&self, algorithm: &AlgorithmIdentifier) -> bool {
        !self.disabled.contains(&algorithm.oid)
    }

    /// Keys of unknown size are accepted; the verifier rejects what it
    /// cannot parse.
    pub fn permits_key(&self, key: &PublicKey) -> bool {
        let floor = if key.algorithm == oid::RSA_ENCRYPTION {
            self.min_rsa_bits
        } else if key.algorithm == oid::EC_PUBLIC_KEY {
            self.min_ec_bits
        } else {
            0
        };
        key.bits.is_none_or(|bits| bits >= floor)
    }

    /// Parses a comma separated list such as `MD2, MD5, SHA1, RSA keySize < 2048`.
    /// Digest names disable every signature algorithm using that digest.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let mut policy = Self::permissive();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let upper = entry.to_uppercase();
            if let Some(rest) = upper.strip_prefix("RSA KEYSIZE <") {
                policy.min_rsa_bits = parse_bits(entry, rest)?;
                continue;
            }
            if let Some(rest) = upper.strip_prefix("EC KEYSIZE <") {
                policy.min_ec_bits = parse_bits(entry, rest)?;
                continue;
            }
            let by_digest: &[ObjectIdentifier] = match upper.as_str() {
                "MD2" => &[oid::MD2_WITH_RSA],
                "MD5" => &[oid::MD5_WITH_RSA],
                "SHA1" | "SHA-1" => &[oid::SHA1_WITH_RSA, oid::ECDSA_WITH_SHA1],
                _ => &[],
            };
            if !by_digest.is_empty() {
                policy.disabled.extend(by_digest.iter().copied());
                continue;
            }
            if let Some(found) = oid::algorithm_by_name(entry) {
                policy.disabled.insert(found);
                continue;
            }
            match ObjectIdentifier::new(entry) {
                Ok(dotted) => {
                    policy.disabled.insert(dotted);
                }
                Err(_) => {
                    return InvalidParameterValueSnafu {
                        parameter: "disabled_algorithms",
                        value: entry,
                        explanation: "Unknown algorithm name",
                    }
                    .fail();
                }
            }
        }
        Ok(policy)
    }

    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        match settings.get_string("disabled_algorithms") {
            Some(list) => Self::parse(&list),
            None => Ok(Self::default()),
        }
    }
}

fn parse_bits(entry: &str, rest: &str) -> Result<usize, ConfigError> {
    rest.trim().parse::<usize>().map_err(|e| {
        InvalidParameterValueSnafu {
            parameter: "disabled_algorithms",
            value: entry,
            explanation: format!("Invalid key size: {e}"),
        }
        .build()
    })
}

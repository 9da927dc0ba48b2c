use crate::cert::oid::AT_EMAIL_ADDRESS;
use crate::cert::parser::{NameSnafu, ParseError};
use const_oid::ObjectIdentifier;
use der::{Tag, Tagged};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use x509_cert::der::{Decode, Encode};
use x509_cert::name::Name;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Attribute {
    oid: ObjectIdentifier,
    value: String,
}

/// An X.500 distinguished name.
///
/// Equality follows a simplified RFC 5280 7.1 comparison: string attribute
/// values are compared case-insensitively with internal whitespace collapsed,
/// attributes inside one RDN are compared as a set.
#[derive(Clone)]
pub struct DistinguishedName {
    encoded: Vec<u8>,
    rdns: Vec<Vec<Attribute>>,
    text: String,
}

impl DistinguishedName {
    pub fn from_der(bytes: &[u8]) -> Result<Self, ParseError> {
        let name = Name::from_der(bytes).map_err(|e| {
            NameSnafu {
                message: e.to_string(),
            }
            .build()
        })?;
        Ok(Self::from_name(&name, bytes.to_vec()))
    }

    fn from_name(name: &Name, encoded: Vec<u8>) -> Self {
        let rdns = name
            .0
            .iter()
            .map(|rdn| {
                let mut attributes: Vec<Attribute> = rdn
                    .0
                    .iter()
                    .map(|atv| Attribute {
                        oid: atv.oid,
                        value: normalize_value(atv.value.tag(), atv.value.value()),
                    })
                    .collect();
                attributes.sort();
                attributes
            })
            .collect();
        Self {
            encoded,
            rdns,
            text: name.to_string(),
        }
    }

    /// DER encoding of the name as it appeared in the source structure.
    pub fn as_der(&self) -> &[u8] {
        &self.encoded
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    pub fn rdn_count(&self) -> usize {
        self.rdns.len()
    }

    /// Number of leading RDNs shared with `other`.
    pub fn common_prefix_len(&self, other: &DistinguishedName) -> usize {
        self.rdns
            .iter()
            .zip(other.rdns.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// True when `base` is a (non-strict) RDN prefix of this name, i.e. this
    /// name lies in the directory subtree rooted at `base`.
    pub fn is_within(&self, base: &DistinguishedName) -> bool {
        base.rdns.len() <= self.rdns.len() && self.common_prefix_len(base) == base.rdns.len()
    }

    /// Appends one RDN below this name, as a distribution point name
    /// relative to its CRL issuer is resolved.
    pub(crate) fn with_relative_rdn(&self, attributes: Vec<(ObjectIdentifier, String)>) -> Self {
        let mut rdn: Vec<Attribute> = attributes
            .into_iter()
            .map(|(oid, value)| Attribute {
                value: collapse(&value),
                oid,
            })
            .collect();
        rdn.sort();
        let text = rdn
            .iter()
            .map(|a| format!("{}={}", a.oid, a.value))
            .collect::<Vec<_>>()
            .join("+");
        let mut rdns = self.rdns.clone();
        rdns.push(rdn);
        Self {
            encoded: Vec::new(),
            rdns,
            text: format!("{text},{}", self.text),
        }
    }

    /// Legacy emailAddress attribute values carried in the subject.
    pub fn email_addresses(&self) -> Vec<String> {
        self.rdns
            .iter()
            .flatten()
            .filter(|a| a.oid == AT_EMAIL_ADDRESS)
            .map(|a| a.value.clone())
            .collect()
    }
}

fn normalize_value(tag: Tag, value: &[u8]) -> String {
    let decoded = match tag {
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::Ia5String
        | Tag::VisibleString
        | Tag::NumericString
        | Tag::TeletexString => String::from_utf8_lossy(value).into_owned(),
        Tag::BmpString => {
            let units: Vec<u16> = value
                .chunks(2)
                .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => return format!("#{}", hex::encode(value)),
    };
    collapse(&decoded)
}

fn collapse(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl FromStr for DistinguishedName {
    type Err = ParseError;

    /// Parses an RFC 4514 string such as `CN=Leaf,O=Example`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = Name::from_str(s).map_err(|e| {
            NameSnafu {
                message: format!("{s}: {e}"),
            }
            .build()
        })?;
        let encoded = name.to_der().map_err(|e| {
            NameSnafu {
                message: e.to_string(),
            }
            .build()
        })?;
        Ok(Self::from_name(&name, encoded))
    }
}

impl PartialEq for DistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl Eq for DistinguishedName {}

impl Hash for DistinguishedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rdns.hash(state);
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DistinguishedName({})", self.text)
    }
}

/// The GeneralName forms that name constraints and distribution points use.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeneralName {
    Rfc822(String),
    Dns(String),
    Directory(DistinguishedName),
    Uri(String),
    IpAddress(Vec<u8>),
    RegisteredId(ObjectIdentifier),
    /// otherName, x400Address and ediPartyName; carried but never matched.
    Unsupported(String),
}

impl fmt::Display for GeneralName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneralName::Rfc822(v) => write!(f, "email:{v}"),
            GeneralName::Dns(v) => write!(f, "DNS:{v}"),
            GeneralName::Directory(v) => write!(f, "DirName:{v}"),
            GeneralName::Uri(v) => write!(f, "URI:{v}"),
            GeneralName::IpAddress(v) => write!(f, "IP:{}", hex::encode(v)),
            GeneralName::RegisteredId(v) => write!(f, "RID:{v}"),
            GeneralName::Unsupported(v) => write!(f, "{v}"),
        }
    }
}

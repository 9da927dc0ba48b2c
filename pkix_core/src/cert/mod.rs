pub mod anchor;
pub mod certificate;
pub mod crl;
pub mod extensions;
pub mod name;
pub mod oid;
pub mod parser;

pub use anchor::TrustAnchor;
pub use certificate::{AlgorithmIdentifier, Certificate, PublicKey};
pub use crl::{Crl, RevokedEntry};
pub use extensions::{
    BasicConstraints, DistributionPoint, DistributionPointName, Extensions, GeneralSubtree,
    IssuingDistributionPoint, KeyUsage, NameConstraints, PolicyConstraints, PolicyInformation,
    PolicyMapping, ReasonFlags, RevocationReason,
};
pub use name::{DistinguishedName, GeneralName};
pub use parser::ParseError;

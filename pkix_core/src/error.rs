use crate::cert::{ParseError, RevocationReason};
use crate::fetch::FetchError;
use crate::path::vertex::AdjacencyList;
use chrono::{DateTime, Utc};
use snafu::{Location, Snafu};
use std::fmt;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum PkixError {
    #[snafu(display("Certificate {subject} was revoked at {revocation_time}, reason: {reason}"))]
    Revoked {
        subject: String,
        reason: RevocationReason,
        revocation_time: DateTime<Utc>,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Revocation status of {subject} could not be determined: {message}"))]
    UndeterminedRevocationStatus {
        subject: String,
        message: String,
        /// Set when every failed source failed for network reasons.
        network: bool,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Path length constraint exceeded at {subject}"))]
    PathTooLong {
        subject: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Certificate {subject} already appears in the path"))]
    LoopDetected {
        subject: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Unrecognized critical extensions {oids:?} in {subject}"))]
    UnrecognizedCriticalExtension {
        subject: String,
        oids: Vec<String>,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Name constraints violated by {subject}: {message}"))]
    InvalidNameConstraints {
        subject: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Policy processing failed at {subject}: {message}"))]
    InvalidPolicy {
        subject: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("No trust anchor issued {subject}"))]
    NoTrustAnchor {
        subject: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Signature of {subject} is invalid: {message}"))]
    SignatureInvalid {
        subject: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Algorithm {algorithm} used by {subject} is disabled"))]
    AlgorithmDisabled {
        subject: String,
        algorithm: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Certificate {subject} expired at {not_after}"))]
    Expired {
        subject: String,
        not_after: DateTime<Utc>,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Certificate {subject} is not valid before {not_before}"))]
    NotYetValid {
        subject: String,
        not_before: DateTime<Utc>,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Issuer of {subject} is {actual}, expected {expected}"))]
    NameChaining {
        subject: String,
        expected: String,
        actual: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Key usage of {subject} does not permit the operation: {message}"))]
    InvalidKeyUsage {
        subject: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Certificate {subject} is not a CA certificate"))]
    NotCaCertificate {
        subject: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Target {subject} does not satisfy the requested constraints: {message}"))]
    TargetMismatch {
        subject: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Network failure fetching {uri}"))]
    NetworkFailure {
        uri: String,
        source: FetchError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Malformed input"))]
    MalformedInput {
        source: ParseError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("No certification path found: {message}"))]
    NoPathFound {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl PkixError {
    /// Rank used to pick the failure reported when a whole search fails.
    /// Higher wins; ties go to the most recent failure.
    pub fn specificity(&self) -> u8 {
        match self {
            PkixError::Revoked { .. } => 3,
            PkixError::NoPathFound { .. } => 0,
            PkixError::LoopDetected { .. } => 1,
            _ => 2,
        }
    }

    /// Network-level failures are the only ones soft-fail may downgrade.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            PkixError::NetworkFailure { .. }
                | PkixError::UndeterminedRevocationStatus { network: true, .. }
        )
    }
}

/// Terminal failure of a path build: the most specific error seen plus
/// enough context to diagnose it.
#[derive(Debug)]
pub struct BuildFailure {
    pub error: PkixError,
    /// Certificates in the partial path when the reported error occurred.
    pub path_length: usize,
    /// The certificate the reported error was raised for.
    pub certificate: Option<String>,
    pub adjacency: AdjacencyList,
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (path length {}", self.error, self.path_length)?;
        if let Some(cert) = &self.certificate {
            write!(f, ", certificate {cert}")?;
        }
        f.write_str(")")
    }
}

impl std::error::Error for BuildFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

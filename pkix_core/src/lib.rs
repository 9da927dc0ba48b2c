extern crate tracing;
extern crate tracing_subscriber;

pub mod cert;
pub mod checker;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod path;
pub mod revocation;
pub mod validator;

#[cfg(test)]
mod test_utils;

pub use cert::{Certificate, Crl, TrustAnchor};
pub use error::PkixError;
pub use path::{BuildDirection, BuildParameters, BuildResult, PathBuilder};
pub use validator::{CertPathValidator, ValidationResult};

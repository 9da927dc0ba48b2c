pub mod algorithm;
pub mod verifier;

pub use algorithm::AlgorithmPolicy;
pub use verifier::{AwsLcVerifier, SignatureVerifier, VerifyError};

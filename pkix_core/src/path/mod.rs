//! Certification path construction: candidate stores, search state and the
//! depth-first builder.

pub mod builder;
pub mod selector;
pub mod state;
pub mod store;
pub mod vertex;

pub use builder::{BuildDirection, BuildParameters, BuildResult, PathBuilder};
pub use selector::{CertSelector, CrlSelector};
pub use store::{CertStore, CollectionCertStore};
pub use vertex::{AdjacencyList, Vertex};

use crate::cert::Certificate;
use serde::Serialize;
use std::fmt;

/// One certificate considered during the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vertex {
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    /// Number of certificates already in the partial path when this one was
    /// tried.
    pub depth: usize,
    /// Why the candidate was rejected; `None` if it was accepted.
    pub rejection: Option<String>,
}

/// Every candidate the builder tried, in the order it tried them.
/// Diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdjacencyList {
    vertices: Vec<Vertex>,
}

impl AdjacencyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, cert: &Certificate, depth: usize) -> usize {
        self.vertices.push(Vertex {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial: cert.serial_hex(),
            depth,
            rejection: None,
        });
        self.vertices.len() - 1
    }

    pub(crate) fn reject(&mut self, index: usize, reason: impl fmt::Display) {
        if let Some(vertex) = self.vertices.get_mut(index) {
            vertex.rejection = Some(reason.to_string());
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn rejected(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter().filter(|v| v.rejection.is_some())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for AdjacencyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for vertex in &self.vertices {
            write!(
                f,
                "{:indent$}{} <- {} [{}]",
                "",
                vertex.subject,
                vertex.issuer,
                vertex.serial,
                indent = vertex.depth * 2
            )?;
            match &vertex.rejection {
                Some(reason) => writeln!(f, " rejected: {reason}")?,
                None => writeln!(f, " accepted")?,
            }
        }
        Ok(())
    }
}

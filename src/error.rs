//! Error types for model loading and graph queries.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a model or querying its graph.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Malformed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// Unexpected element nesting or an element missing a required part.
    #[error("Invalid structure: {0}")]
    Structure(String),

    /// Missing required attribute on an element.
    #[error("Missing required attribute `{attribute}` on <{element}>")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    /// A failure while processing a document, with its location.
    #[error("Parsing error in line {line} of {document}: {source}")]
    Document {
        document: String,
        line: usize,
        #[source]
        source: Box<ModelError>,
    },

    /// References still unresolved after the fixpoint.
    #[error("Cannot resolve {} from {document}", .ids.join(","))]
    UnresolvedReferences { document: String, ids: Vec<String> },

    /// An id defined more than once in the session.
    #[error("Ambiguous reference: {id} is defined {count} times")]
    AmbiguousReference { id: String, count: usize },

    /// Lookup of an id that no entity carries.
    #[error("No entity with id {0}")]
    NotFound(String),

    /// Association with other than two ends.
    #[error("Association {id} must have exactly two ends, found {ends}")]
    MalformedAssociation { id: String, ends: usize },

    /// Association end combination outside the inference table.
    #[error(
        "Unsupported multiplicity between {end} ({participant}) and {partner} ({partner_participant}): {detail}"
    )]
    UnsupportedMultiplicity {
        end: String,
        participant: String,
        partner: String,
        partner_participant: String,
        detail: String,
    },

    /// `related_to` tag without the `related_by` path.
    #[error("Association end {end} is related to {target} but has no `related_by` path")]
    MissingRelatedPath { end: String, target: String },

    /// Class referenced only through a relation outside the ordered set.
    #[error("Class {0} could have an undeclared external relation. Please check it.")]
    UndeclaredRelation(String),

    /// Generalization cycle that is not a simple self-reference.
    #[error("Generalization cycle among {}", .0.join(", "))]
    GeneralizationCycle(Vec<String>),

    /// Packages depending on each other.
    #[error(
        "Simple circular dependencies found between {}. Please check relation direction between packages, or create an inherited class in some package.",
        display_pairs(.pairs)
    )]
    CircularDependency { pairs: Vec<(String, String)> },

    /// Menu entries not reachable from the traversal seed.
    #[error(
        "Unlinked menus: {}. Check for undirected associations or loops in directed associations.",
        .0.join(", ")
    )]
    UnlinkedMenus(Vec<String>),

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Well-known profile missing from every search location.
    #[error("Profile {url} not found. Search paths: {}", display_paths(.searched))]
    ProfileNotFound { url: String, searched: Vec<PathBuf> },

    /// Network document that could not be fetched.
    #[error("Cannot fetch {url}: {message}")]
    Fetch { url: String, message: String },
}

impl ModelError {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    /// Create a structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }

    /// Create a missing attribute error.
    pub fn missing_attribute(element: impl Into<String>, attribute: &'static str) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute,
        }
    }

    /// Create a fetch error.
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Attach the failing document and line.
    pub fn in_document(self, document: impl Into<String>, line: usize) -> Self {
        Self::Document {
            document: document.into(),
            line,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through document locations.
    pub fn root_cause(&self) -> &ModelError {
        match self {
            Self::Document { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn display_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(a, b)| format!("{a} and {b}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

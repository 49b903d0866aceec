//! # umlgraph-base
//!
//! Core library for loading UML 1.4 XMI models (as written by ArgoUML) into a
//! resolved, typed semantic graph.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! host        → ModelHost: load protocol, document memo, transactions
//!   ↓
//! graph       → multiplicity, ordering, dependencies, menus, aggregation
//! validation  → read-only structural checks
//!   ↓
//! xmi         → stream classifier + document builder
//!   ↓
//! resolve     → deferred create/append/set with a fixpoint
//!   ↓
//! model       → entity arena, typed views, tag dictionaries
//!   ↓
//! base        → XmiId, UML vocabulary constants
//! ```

// ============================================================================
// MODULES (dependency order: base → model → resolve → xmi → graph → host)
// ============================================================================

/// Foundation types: XmiId, vocabulary constants
pub mod base;

/// Error types shared by every layer
pub mod error;

/// Semantic graph: entities, views, tags
pub mod model;

/// Deferred entity resolution
pub mod resolve;

/// XMI stream reading
pub mod xmi;

/// Algorithms over a committed model
pub mod graph;

/// Structural validation
pub mod validation;

/// Loader settings
pub mod config;

/// Document identities and byte sources
pub mod source;

/// Loading session
pub mod host;

// Re-export the loading surface
pub use config::LoaderConfig;
pub use error::ModelError;
pub use host::ModelHost;
pub use source::{DocumentId, Fetcher, OfflineFetcher};
#[cfg(feature = "http")]
pub use source::HttpFetcher;

// Re-export the model surface
pub use base::XmiId;
pub use model::{
    AssociationEndView, AssociationView, AttributeView, ClassView, Entity, EntityData, EntityKind,
    EntityRef, EntityView, EnumerationView, GeneralizationView, Model, ModelElement,
    MultiplicityRange, OperationView, PackageView, StateMachineView, StateView, TagDictionary,
    TransitionView, UseCaseView,
};

pub use graph::{MemberFilter, Multiplicity};
pub use resolve::Resolver;
pub use validation::{Diagnostic, Severity, ValidationReport, Validator};

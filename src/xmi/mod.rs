//! XMI 1.2 (UML 1.4) reader.
//!
//! ## Design
//!
//! Reading is split in two layers so each can be tested alone:
//!
//! ```text
//! bytes ──► Classifier ──► ClassifiedEvent ──► DocumentBuilder ──► Resolver
//!           (quick-xml,     (kind, phase,       (ParserContext      (create /
//!            envelope,       tag, element,       slots, typed        append /
//!            owner stack)    owners)             scopes)             set)
//! ```
//!
//! The builder never touches the model directly; every entity goes through
//! the resolver so forward and cross-document references are deferred
//! uniformly.

mod builder;
mod classify;
mod context;

pub use builder::{DocumentBuilder, DocumentSession, ExternalDocument};
pub use classify::{
    ClassifiedEvent, Classifier, EventHandler, Owner, Phase, RefKind, UmlTag, XmiElement,
};
pub use context::{ParserContext, TransitionSlots};

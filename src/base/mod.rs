//! Foundation types for the umlgraph toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`XmiId`] - Interchange element identifiers (`xmi.id` / `xmi.idref`)
//! - Domain constants (UML vocabulary, well-known tags and stereotypes,
//!   base namespaces, profile locations)
//!
//! This module has NO dependencies on other umlgraph modules.

pub mod constants;
mod id;

pub use id::XmiId;

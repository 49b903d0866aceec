//! Graph analysis tests
//!
//! Tests for the derived views over a loaded model:
//! - Multiplicity inference
//! - Generalization ordering
//! - Package dependencies
//! - Menu ordering
//! - Inherited members

pub mod tests_dependencies;
pub mod tests_menus;
pub mod tests_multiplicity;

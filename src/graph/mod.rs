//! Algorithms over a committed model.
//!
//! Everything here is read-only: functions take views or a `&Model` and
//! return derived data.
//!
//! - [`multiplicity`]: relation kind of an association end
//! - [`ordering`]: parents before children
//! - [`dependencies`]: package dependency sets and cycles
//! - [`menus`]: breadth-first order of linked use cases
//! - [`aggregate`]: members and relations through inheritance

pub mod aggregate;
pub mod dependencies;
pub mod menus;
pub mod multiplicity;
pub mod ordering;

pub use aggregate::MemberFilter;
pub use dependencies::{DependencyMap, check_circular, package_dependencies};
pub use menus::order_menus;
pub use multiplicity::{Multiplicity, infer, walk_related};
pub use ordering::{order_by_generalization, order_classes};

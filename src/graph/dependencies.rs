//! Package dependency sets and circularity checking.
//!
//! A package `P` depends on the package of:
//! - the datatype of every attribute declared in `P`
//! - the participant of every navigable end whose partner's participant is
//!   in `P`
//! - the parent of every generalization whose child is in `P`
//! - every name listed in the `depends` tag of `P`
//!
//! Empty names, base namespaces and `P` itself are dropped. Packages
//! stereotyped `external` are not analyzed.

use indexmap::{IndexMap, IndexSet};

use crate::config::LoaderConfig;
use crate::error::ModelError;
use crate::model::{EntityKind, EntityView, Model, PackageView};

/// Package name → names of the packages it depends on.
pub type DependencyMap = IndexMap<String, IndexSet<String>>;

fn package_name(view: &EntityView<'_>) -> String {
    view.package()
        .map(|p| p.label().to_string())
        .unwrap_or_default()
}

fn in_package(view: &EntityView<'_>, package: &PackageView<'_>) -> bool {
    view.package().is_some_and(|p| p.handle() == package.handle())
}

/// Compute the dependency set of every analyzed package.
pub fn package_dependencies(model: &Model, config: &LoaderConfig) -> DependencyMap {
    let mut map = DependencyMap::new();
    for package in model.iter_kind(EntityKind::Package).filter_map(|v| v.as_package()) {
        if package.is_external() {
            tracing::trace!(package = package.label(), "external package skipped");
            continue;
        }
        let deps = collect(model, &package);
        let own = package.label();
        map.entry(own.to_string())
            .or_default()
            .extend(deps.into_iter().filter(|name| {
                !name.is_empty() && name != own && !config.is_base_namespace(name)
            }));
    }
    map
}

fn collect(model: &Model, package: &PackageView<'_>) -> IndexSet<String> {
    let mut deps = IndexSet::new();

    for attribute in model.iter_kind(EntityKind::Attribute) {
        if !in_package(&attribute, package) {
            continue;
        }
        if let Some(datatype) = attribute.as_attribute().and_then(|a| a.datatype()) {
            deps.insert(package_name(&datatype));
        }
    }

    for end in model
        .iter_kind(EntityKind::AssociationEnd)
        .filter_map(|v| v.as_association_end())
    {
        if !end.is_navigable() {
            continue;
        }
        let holder = end.partner().and_then(|p| p.participant());
        if !holder.is_some_and(|h| in_package(&h, package)) {
            continue;
        }
        if let Some(participant) = end.participant() {
            deps.insert(package_name(&participant));
        }
    }

    for generalization in model
        .iter_kind(EntityKind::Generalization)
        .filter_map(|v| v.as_generalization())
    {
        if in_package(&generalization.child(), package) {
            deps.insert(package_name(&generalization.parent()));
        }
    }

    deps.extend(package.declared_dependencies());
    deps
}

/// Fail if two packages depend on each other.
///
/// Every mutual pair is reported once, with its names in sorted order.
pub fn check_circular(map: &DependencyMap) -> Result<(), ModelError> {
    let mut pairs = Vec::new();
    for (package, deps) in map {
        for dep in deps {
            if package < dep && map.get(dep).is_some_and(|back| back.contains(package)) {
                pairs.push((package.clone(), dep.clone()));
            }
        }
    }
    if pairs.is_empty() {
        Ok(())
    } else {
        tracing::debug!(count = pairs.len(), "circular package dependencies");
        Err(ModelError::CircularDependency { pairs })
    }
}

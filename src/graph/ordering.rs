//! Generalization ordering: parents before children.
//!
//! ## Design
//!
//! ```text
//! input order ──► adjacency (parent → children, in input order)
//!                 in-degree = in-scope parents of each node
//!             ──► for each root, depth first:
//!                   emit node, release children whose parents are all emitted
//!             ──► leftovers: a cycle
//! ```
//!
//! A class with several in-scope parents is emitted once, after the last of
//! them. Self-generalizations are dropped with a warning.

use indexmap::{IndexMap, IndexSet};

use crate::error::ModelError;
use crate::model::{ClassView, EntityRef, EntityView};

/// Which generalization edges take part in the ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    /// Edges between classes of the same package. Such an edge leaving the
    /// input set is an error.
    SamePackage,
    /// Edges between members of the input set only.
    InputSet,
}

/// Order the classes of one package so that every class follows its
/// in-package parents.
pub fn order_classes<'m>(classes: &[ClassView<'m>]) -> Result<Vec<ClassView<'m>>, ModelError> {
    let nodes: Vec<EntityView<'m>> = classes.iter().map(|c| c.inner).collect();
    let ordered = order(&nodes, Scope::SamePackage)?;
    Ok(ordered.into_iter().filter_map(|v| v.as_class()).collect())
}

/// Order arbitrary entities by the generalizations among them.
pub fn order_by_generalization<'m>(
    entities: &[EntityView<'m>],
) -> Result<Vec<EntityView<'m>>, ModelError> {
    order(entities, Scope::InputSet)
}

fn order<'m>(nodes: &[EntityView<'m>], scope: Scope) -> Result<Vec<EntityView<'m>>, ModelError> {
    let mut views: IndexMap<EntityRef, EntityView<'m>> = IndexMap::new();
    for node in nodes {
        views.entry(node.handle()).or_insert(*node);
    }

    let mut children: IndexMap<EntityRef, Vec<EntityRef>> =
        views.keys().map(|k| (*k, Vec::new())).collect();
    let mut pending: IndexMap<EntityRef, usize> = views.keys().map(|k| (*k, 0)).collect();

    for node in views.values() {
        let mut parents = IndexSet::new();
        for parent in node.parents() {
            if !in_scope(node, &parent, scope, &views)? {
                continue;
            }
            if parent.handle() == node.handle() {
                tracing::warn!(class = node.label(), "ignoring self generalization");
                continue;
            }
            parents.insert(parent.handle());
        }
        for parent in &parents {
            if let Some(list) = children.get_mut(parent) {
                list.push(node.handle());
            }
        }
        pending.insert(node.handle(), parents.len());

        if scope == Scope::SamePackage {
            for child in node.children() {
                in_scope(node, &child, scope, &views)?;
            }
        }
    }

    let mut ordered = Vec::with_capacity(views.len());
    let roots: Vec<EntityRef> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(handle, _)| *handle)
        .collect();
    for root in roots {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            ordered.push(views[&handle]);
            let mut ready = Vec::new();
            for child in &children[&handle] {
                if let Some(count) = pending.get_mut(child) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(*child);
                    }
                }
            }
            stack.extend(ready.into_iter().rev());
        }
    }

    if ordered.len() < views.len() {
        let emitted: IndexSet<EntityRef> = ordered.iter().map(|v| v.handle()).collect();
        let cycle = views
            .values()
            .filter(|v| !emitted.contains(&v.handle()))
            .map(|v| v.label().to_string())
            .collect();
        return Err(ModelError::GeneralizationCycle(cycle));
    }
    Ok(ordered)
}

/// Whether the edge between `node` and `other` counts for ordering.
fn in_scope(
    node: &EntityView<'_>,
    other: &EntityView<'_>,
    scope: Scope,
    views: &IndexMap<EntityRef, EntityView<'_>>,
) -> Result<bool, ModelError> {
    let listed = views.contains_key(&other.handle());
    match scope {
        Scope::InputSet => Ok(listed),
        Scope::SamePackage => {
            if other.package() != node.package() {
                return Ok(false);
            }
            if !listed {
                return Err(ModelError::UndeclaredRelation(other.label().to_string()));
            }
            Ok(true)
        }
    }
}

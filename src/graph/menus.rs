//! Menu navigation over use cases.
//!
//! Use cases are linked by associations navigable in one direction only:
//! the navigable end points at the next menu entry.
//!
//! ```text
//!   root ──► sales ──► orders
//!                └───► quotes
//! ```
//!
//! Ordering is breadth first from the predecessor-less entries reachable
//! backwards from the first menu, expanding each level in name order.

use indexmap::IndexSet;

use crate::error::ModelError;
use crate::model::{AssociationEndView, EntityRef, UseCaseView};

impl<'m> UseCaseView<'m> {
    /// Use cases this one leads to.
    pub fn nexts(&self) -> Vec<UseCaseView<'m>> {
        self.linked(|own, partner| partner.is_navigable() && !own.is_navigable())
    }

    /// Use cases leading to this one.
    pub fn prevs(&self) -> Vec<UseCaseView<'m>> {
        self.linked(|own, partner| own.is_navigable() && !partner.is_navigable())
    }

    /// Entries without predecessors reachable backwards from this one,
    /// sorted by name. An entry without predecessors is its own leaf.
    pub fn prev_leaves(&self) -> Vec<UseCaseView<'m>> {
        let mut visited = IndexSet::new();
        let mut leaves = Vec::new();
        let mut frontier = vec![*self];
        while let Some(node) = frontier.pop() {
            if !visited.insert(node.handle()) {
                continue;
            }
            let prevs = node.prevs();
            if prevs.is_empty() {
                leaves.push(node);
            }
            frontier.extend(prevs);
        }
        sort_by_name(&mut leaves);
        leaves
    }

    fn linked<F>(&self, keep: F) -> Vec<UseCaseView<'m>>
    where
        F: Fn(&AssociationEndView<'m>, &AssociationEndView<'m>) -> bool,
    {
        let mut out = Vec::new();
        for own in self.inner.association_ends() {
            let Some(partner) = own.partner() else {
                continue;
            };
            if !keep(&own, &partner) {
                continue;
            }
            if let Some(use_case) = partner.participant().and_then(|p| p.as_use_case()) {
                out.push(use_case);
            }
        }
        out
    }
}

fn sort_by_name(views: &mut [UseCaseView<'_>]) {
    views.sort_by(|a, b| a.label().cmp(b.label()));
}

/// Order `menus` breadth first from the leaves before the first of them.
///
/// Fails with the unreached entries when some are not linked to the rest.
pub fn order_menus<'m>(menus: &[UseCaseView<'m>]) -> Result<Vec<UseCaseView<'m>>, ModelError> {
    let Some(first) = menus.first() else {
        return Ok(Vec::new());
    };
    let wanted: IndexSet<EntityRef> = menus.iter().map(|m| m.handle()).collect();

    let mut visited = IndexSet::new();
    let mut ordered = Vec::new();
    let mut frontier = first.prev_leaves();
    while !frontier.is_empty() {
        for node in &frontier {
            if visited.insert(node.handle()) && wanted.contains(&node.handle()) {
                ordered.push(*node);
            }
        }
        let mut next: Vec<UseCaseView<'m>> = Vec::new();
        let mut seen = IndexSet::new();
        for node in &frontier {
            for candidate in node.nexts() {
                if !visited.contains(&candidate.handle()) && seen.insert(candidate.handle()) {
                    next.push(candidate);
                }
            }
        }
        sort_by_name(&mut next);
        frontier = next;
    }

    if ordered.len() != wanted.len() {
        let reached: IndexSet<EntityRef> = ordered.iter().map(|m| m.handle()).collect();
        let mut unlinked: Vec<String> = menus
            .iter()
            .filter(|m| !reached.contains(&m.handle()))
            .map(|m| m.label().to_string())
            .collect();
        unlinked.dedup();
        tracing::debug!(count = unlinked.len(), "unlinked menu entries");
        return Err(ModelError::UnlinkedMenus(unlinked));
    }
    Ok(ordered)
}

//! Two-phase entity construction.
//!
//! ## Design
//!
//! The document builder describes each entity as a [`Blueprint`] whose
//! reference parameters are [`Ref`]s. [`Resolver::create`] commits it at once
//! when every reference already names a committed entity, and otherwise
//! defers it. Appends to ordered collections and attribute assignments follow
//! the same discipline.
//!
//! When a document has been read, [`Resolver::finish`] runs the fixpoint:
//!
//! ```text
//! status: id → Pending | Committed     (seeded from deferred ids + model)
//! referenced id with no status         → hopeless, fail naming those ids
//! repeat pass over the FIFO worklist:
//!     all refs resolve → commit, status = Committed
//!     otherwise        → back of the queue
//! pass without progress:
//!     nested load, waiting on awaited ids → carry to the enclosing load
//!     otherwise                           → fail naming every unresolved id
//! flush appends, then sets (carrying those behind a carried one)
//! ```
//!
//! The queues belong to one load. Nested loads park them on a
//! [`QueueStack`] so a referenced document resolves against its own state.
//! An id reached through an href into a document that is still being read
//! further up the stack is *awaited*: it is not an error for the nested load
//! to leave work on it, which [`Resolver::resume`] queues behind the
//! enclosing load's own.

mod blueprint;
mod stack;

pub use blueprint::{Blueprint, Body, Ref};
pub use stack::{Deferred, PendingAppend, PendingQueues, PendingSet, QueueStack, SetValue};

use std::collections::{BTreeSet, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::XmiId;
use crate::error::ModelError;
use crate::model::{Collection, EntityRef, Model};

/// Resolution state of an id during the fixpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IdStatus {
    Pending,
    Committed,
    /// Defined by a document an enclosing load is still reading.
    Awaited,
}

/// Builds entities, deferring those whose references are not yet known.
#[derive(Debug, Default)]
pub struct Resolver {
    queues: QueueStack,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Immediate-or-deferred operations ────────────────────────────

    /// Commit `blueprint` now if possible, else defer it.
    ///
    /// Returns the committed handle, or the blueprint's id as a placeholder.
    pub fn create(&mut self, model: &mut Model, blueprint: Blueprint) -> Result<Ref, ModelError> {
        if blueprint.unresolved(model)?.is_empty() {
            let entity = blueprint.realize(model)?;
            let handle = model.insert(entity);
            tracing::trace!(id = %blueprint.id, kind = %model.entity(handle).kind(), "created");
            return Ok(Ref::Entity(handle));
        }
        tracing::trace!(id = %blueprint.id, "deferred creation");
        let placeholder = Ref::Id(blueprint.id.clone());
        self.queues.current_mut().defer(blueprint);
        Ok(placeholder)
    }

    /// Append `child` to `parent`'s collection now if both are known.
    ///
    /// Once an append is deferred, later appends queue behind it so every
    /// collection keeps document order.
    pub fn append(
        &mut self,
        model: &mut Model,
        parent: Ref,
        collection: Collection,
        child: Ref,
    ) -> Result<(), ModelError> {
        if self.queues.current().appends.is_empty() {
            if let (Some(p), Some(c)) = (parent.try_resolve(model)?, child.try_resolve(model)?) {
                return model.append(p, collection, c);
            }
        }
        self.queues.current_mut().appends.push(PendingAppend {
            parent,
            collection,
            child,
        });
        Ok(())
    }

    /// Assign `value` to `target` now if everything is known.
    pub fn set(&mut self, model: &mut Model, target: Ref, value: SetValue) -> Result<(), ModelError> {
        if self.queues.current().sets.is_empty() {
            if let Some(handle) = target.try_resolve(model)? {
                if let Some(resolved) = resolve_all(model, &value.refs())? {
                    return apply_set(model, handle, &value, resolved);
                }
            }
        }
        self.queues
            .current_mut()
            .sets
            .push(PendingSet { target, value });
        Ok(())
    }

    // ── Nested loads ────────────────────────────────────────────────

    /// Park the current load's queues before a nested load.
    pub fn suspend(&mut self) {
        self.queues.suspend();
    }

    /// Restore the enclosing load's queues after a nested load.
    pub fn resume(&mut self) {
        self.queues.resume();
    }

    /// Record that `id` belongs to a document an enclosing load is still
    /// reading, so the current load may leave work on it behind.
    pub fn await_outer(&mut self, id: impl Into<XmiId>) {
        self.queues.current_mut().awaited.insert(id.into());
    }

    /// Drop all pending work (after a failed load).
    pub fn reset(&mut self) {
        self.queues.clear();
    }

    pub fn pending(&self) -> &PendingQueues {
        self.queues.current()
    }

    pub fn depth(&self) -> usize {
        self.queues.depth()
    }

    // ── Fixpoint ────────────────────────────────────────────────────

    /// Resolve all deferred work of the current load.
    ///
    /// A nested load may leave work that waits on awaited ids in its
    /// queues; [`Resolver::resume`] hands it to the enclosing load. On
    /// failure the current queues are left empty; the caller rolls the
    /// model back.
    pub fn finish(&mut self, model: &mut Model, document: &str) -> Result<(), ModelError> {
        let nested = self.queues.depth() > 0;
        let PendingQueues {
            mut creates,
            appends,
            sets,
            awaited,
        } = std::mem::take(self.queues.current_mut());
        // Only an enclosing load can still define an awaited id.
        let awaited = if nested { awaited } else { FxHashSet::default() };

        let unresolved = |ids: BTreeSet<XmiId>| ModelError::UnresolvedReferences {
            document: document.to_string(),
            ids: ids.into_iter().map(|id| id.as_str().to_string()).collect(),
        };

        // Seed the status map and reject ids that nothing can ever define.
        let mut status: FxHashMap<XmiId, IdStatus> = FxHashMap::default();
        for deferred in &creates {
            status.insert(deferred.blueprint.id.clone(), IdStatus::Pending);
        }
        let referenced = creates
            .iter()
            .flat_map(|d| d.blueprint.refs())
            .chain(appends.iter().flat_map(|a| [&a.parent, &a.child]))
            .chain(sets.iter().flat_map(|s| {
                let mut refs = s.value.refs();
                refs.push(&s.target);
                refs
            }))
            .filter_map(Ref::pending_id);
        let mut hopeless = BTreeSet::new();
        for id in referenced {
            if status.contains_key(id) {
                continue;
            }
            if model.contains_id(id.as_str()) {
                status.insert(id.clone(), IdStatus::Committed);
            } else if awaited.contains(id) {
                status.insert(id.clone(), IdStatus::Awaited);
            } else {
                hopeless.insert(id.clone());
            }
        }
        if !hopeless.is_empty() {
            return Err(unresolved(hopeless));
        }

        let mut carry = PendingQueues::default();
        let mut passes = 0usize;
        while !creates.is_empty() {
            passes += 1;
            let mut progressed = false;
            for _ in 0..creates.len() {
                let Some(deferred) = creates.pop_front() else {
                    break;
                };
                if deferred.blueprint.unresolved(model)?.is_empty() {
                    let entity = deferred.blueprint.realize(model)?;
                    model.insert(entity);
                    status.insert(deferred.blueprint.id.clone(), IdStatus::Committed);
                    progressed = true;
                } else {
                    creates.push_back(deferred);
                }
            }
            if !progressed {
                let (carried, stuck) = split_carried(model, std::mem::take(&mut creates), &awaited)?;
                if !stuck.is_empty() {
                    let mut remaining = BTreeSet::new();
                    for deferred in &stuck {
                        remaining.extend(deferred.blueprint.unresolved(model)?);
                    }
                    return Err(unresolved(remaining));
                }
                carry.creates = carried;
            }
        }
        debug_assert!(nested || status.values().all(|s| *s == IdStatus::Committed));
        tracing::trace!(document, passes, carried = carry.creates.len(), "deferred creations resolved");

        // Ids a carried item may still wait on.
        let mut known = awaited.clone();
        known.extend(carry.creates.iter().map(|d| d.blueprint.id.clone()));

        // Once one item is carried, later ones follow it to keep order.
        let mut missing = BTreeSet::new();
        let mut ready_appends = Vec::new();
        for append in appends {
            let ids = pending_ids(model, &[&append.parent, &append.child])?;
            if ids.is_empty() && carry.appends.is_empty() {
                ready_appends.push(append);
                continue;
            }
            missing.extend(ids.into_iter().filter(|id| !known.contains(id)));
            carry.appends.push(append);
        }
        let mut ready_sets = Vec::new();
        for set in sets {
            let mut refs = set.value.refs();
            refs.push(&set.target);
            let ids = pending_ids(model, &refs)?;
            if ids.is_empty() && carry.sets.is_empty() {
                ready_sets.push(set);
                continue;
            }
            missing.extend(ids.into_iter().filter(|id| !known.contains(id)));
            carry.sets.push(set);
        }
        if !missing.is_empty() {
            return Err(unresolved(missing));
        }

        for append in ready_appends {
            let parent = append.parent.resolve(model)?;
            let child = append.child.resolve(model)?;
            model.append(parent, append.collection, child)?;
        }
        for set in ready_sets {
            let target = set.target.resolve(model)?;
            let values = set
                .value
                .refs()
                .into_iter()
                .map(|r| r.resolve(model))
                .collect::<Result<Vec<_>, _>>()?;
            apply_set(model, target, &set.value, values)?;
        }

        if !(carry.creates.is_empty() && carry.appends.is_empty() && carry.sets.is_empty()) {
            tracing::debug!(
                document,
                creates = carry.creates.len(),
                appends = carry.appends.len(),
                sets = carry.sets.len(),
                "left for the enclosing load"
            );
            carry.awaited = awaited;
        }
        *self.queues.current_mut() = carry;
        Ok(())
    }
}

/// Split stuck creations into those that only wait on awaited ids, directly
/// or through each other, and the rest. Both keep queue order.
fn split_carried(
    model: &Model,
    stuck: VecDeque<Deferred>,
    awaited: &FxHashSet<XmiId>,
) -> Result<(VecDeque<Deferred>, Vec<Deferred>), ModelError> {
    let mut entries = Vec::with_capacity(stuck.len());
    for deferred in stuck {
        let ids = deferred.blueprint.unresolved(model)?;
        entries.push((deferred, ids, false));
    }
    let mut known = awaited.clone();
    loop {
        let mut grew = false;
        for (deferred, ids, carried) in entries.iter_mut() {
            if !*carried && ids.iter().all(|id| known.contains(id)) {
                *carried = true;
                known.insert(deferred.blueprint.id.clone());
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }
    let mut carried = VecDeque::new();
    let mut rest = Vec::new();
    for (deferred, _, is_carried) in entries {
        if is_carried {
            carried.push_back(deferred);
        } else {
            rest.push(deferred);
        }
    }
    Ok((carried, rest))
}

/// Ids of the references that are not committed yet.
fn pending_ids(model: &Model, refs: &[&Ref]) -> Result<Vec<XmiId>, ModelError> {
    let mut ids = Vec::new();
    for r in refs {
        if r.try_resolve(model)?.is_none() {
            ids.extend(r.pending_id().cloned());
        }
    }
    Ok(ids)
}

/// Every reference resolved, or `None` if any is still unknown.
fn resolve_all(model: &Model, refs: &[&Ref]) -> Result<Option<Vec<EntityRef>>, ModelError> {
    let mut resolved = Vec::with_capacity(refs.len());
    for r in refs {
        match r.try_resolve(model)? {
            Some(handle) => resolved.push(handle),
            None => return Ok(None),
        }
    }
    Ok(Some(resolved))
}

fn apply_set(
    model: &mut Model,
    target: EntityRef,
    value: &SetValue,
    resolved: Vec<EntityRef>,
) -> Result<(), ModelError> {
    match value {
        SetValue::Stereotypes(_) => model.set_stereotypes(target, resolved),
        SetValue::Context(_) => match resolved.first() {
            Some(context) => model.set_context(target, *context),
            None => Ok(()),
        },
        SetValue::Top(_) => match resolved.first() {
            Some(top) => model.set_top(target, *top),
            None => Ok(()),
        },
    }
}

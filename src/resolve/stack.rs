//! Per-load deferred queues and the stack that isolates nested loads.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::base::XmiId;
use crate::model::Collection;

use super::blueprint::{Blueprint, Ref};

/// A creation waiting for its references.
#[derive(Clone, Debug)]
pub struct Deferred {
    pub blueprint: Blueprint,
}

/// An append waiting for its parent or child.
#[derive(Clone, Debug)]
pub struct PendingAppend {
    pub parent: Ref,
    pub collection: Collection,
    pub child: Ref,
}

/// Value of a deferred attribute assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum SetValue {
    /// Replace the stereotype set.
    Stereotypes(Vec<Ref>),
    /// Attach a state machine to the entity it describes.
    Context(Ref),
    /// Set the top composite state of a state machine.
    Top(Ref),
}

impl SetValue {
    pub(crate) fn refs(&self) -> Vec<&Ref> {
        match self {
            SetValue::Stereotypes(refs) => refs.iter().collect(),
            SetValue::Context(r) | SetValue::Top(r) => vec![r],
        }
    }
}

/// An assignment waiting for its target or value.
#[derive(Clone, Debug)]
pub struct PendingSet {
    pub target: Ref,
    pub value: SetValue,
}

/// The deferred work of one document load.
#[derive(Debug, Default)]
pub struct PendingQueues {
    pub creates: VecDeque<Deferred>,
    pub appends: Vec<PendingAppend>,
    pub sets: Vec<PendingSet>,
    /// Ids that live in a document an enclosing load is still reading.
    pub awaited: FxHashSet<XmiId>,
}

impl PendingQueues {
    pub(crate) fn defer(&mut self, blueprint: Blueprint) {
        self.creates.push_back(Deferred { blueprint });
    }

    pub fn is_empty(&self) -> bool {
        self.creates.is_empty()
            && self.appends.is_empty()
            && self.sets.is_empty()
            && self.awaited.is_empty()
    }

    /// Queue `later` behind this load's own work.
    fn absorb(&mut self, later: PendingQueues) {
        self.creates.extend(later.creates);
        self.appends.extend(later.appends);
        self.sets.extend(later.sets);
        self.awaited.extend(later.awaited);
    }
}

/// Active queues plus the queues of every suspended outer load.
///
/// ```text
/// load(a.xmi)            current = Qa
///   href → b.xmi         suspend: stack = [Qa], current = Qb
///     href → a.xmi#x     a is loading: x awaited in Qb
///     finish(Qb)         commits what it can; work on x stays in Qb
///   resume               current = Qa + rest of Qb, stack = []
/// finish(Qa)
/// ```
#[derive(Debug, Default)]
pub struct QueueStack {
    current: PendingQueues,
    suspended: Vec<PendingQueues>,
}

impl QueueStack {
    pub fn current(&self) -> &PendingQueues {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut PendingQueues {
        &mut self.current
    }

    /// Park the active queues and start a fresh, empty set.
    pub fn suspend(&mut self) {
        let outer = std::mem::take(&mut self.current);
        self.suspended.push(outer);
    }

    /// Restore the most recently parked queues. Work the nested load left
    /// behind queues after the outer load's own.
    pub fn resume(&mut self) {
        let nested = std::mem::replace(&mut self.current, self.suspended.pop().unwrap_or_default());
        self.current.absorb(nested);
    }

    /// Number of suspended loads.
    pub fn depth(&self) -> usize {
        self.suspended.len()
    }

    /// Drop every queue, active and suspended.
    pub fn clear(&mut self) {
        self.current = PendingQueues::default();
        self.suspended.clear();
    }
}

//! Per-document parser state.
//!
//! Slots hold what the enclosing elements have established so far: the
//! current package, class, association, and the "last referenced" classifier,
//! multiplicity range or state waiting to be consumed by an end handler.
//! Typed sub-elements (attributes, parameters, association ends and
//! generalizations) save the shared slots on entry and restore them on exit,
//! so a nested reference can never leak into the enclosing element.

use crate::model::MultiplicityRange;
use crate::resolve::Ref;

/// Saved shared slots of an enclosing typed scope.
#[derive(Clone, Debug, Default)]
struct SlotFrame {
    datatype: Option<Ref>,
    range: Option<MultiplicityRange>,
}

/// Slots of the transition being read.
#[derive(Clone, Debug, Default)]
pub struct TransitionSlots {
    pub source: Option<Ref>,
    pub target: Option<Ref>,
    pub guard: Option<String>,
    pub effect: Option<Ref>,
    pub trigger: Option<Ref>,
}

#[derive(Debug, Default)]
pub struct ParserContext {
    pub model: Option<Ref>,
    /// Open packages, innermost last.
    pub packages: Vec<Ref>,
    /// Current class with its display label, for nesting diagnostics.
    pub class: Option<(Ref, String)>,
    pub enumeration: Option<Ref>,
    pub operation: Option<Ref>,
    pub association: Option<Ref>,

    /// Last classifier referenced in the current typed scope.
    pub datatype: Option<Ref>,
    /// Last multiplicity range read in the current typed scope.
    pub range: Option<MultiplicityRange>,
    saved: Vec<SlotFrame>,

    pub generalization_parent: Option<Ref>,
    pub generalization_child: Option<Ref>,

    pub tag_definition: Option<Ref>,
    pub tag_value: Option<String>,

    /// Stereotype lists being collected, innermost last.
    pub stereotype_lists: Vec<Vec<Ref>>,

    pub machine: Option<Ref>,
    /// Open composite states, outermost (the top) first.
    pub composite_states: Vec<Ref>,
    /// Last state referenced (transition source/target).
    pub state_ref: Option<Ref>,
    /// Last event referenced (transition trigger).
    pub event_ref: Option<Ref>,
    pub transition: TransitionSlots,
    pub action_script: Option<String>,
}

impl ParserContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The innermost open package.
    pub fn package(&self) -> Option<Ref> {
        self.packages.last().cloned()
    }

    pub fn class_ref(&self) -> Option<Ref> {
        self.class.as_ref().map(|(r, _)| r.clone())
    }

    /// Save and clear the shared typed slots.
    pub fn enter_typed_scope(&mut self) {
        self.saved.push(SlotFrame {
            datatype: self.datatype.take(),
            range: self.range.take(),
        });
    }

    /// Restore the shared typed slots saved by the matching
    /// [`enter_typed_scope`](Self::enter_typed_scope).
    pub fn leave_typed_scope(&mut self) {
        let frame = self.saved.pop().unwrap_or_default();
        self.datatype = frame.datatype;
        self.range = frame.range;
    }

    /// Depth of nested typed scopes.
    pub fn scope_depth(&self) -> usize {
        self.saved.len()
    }
}

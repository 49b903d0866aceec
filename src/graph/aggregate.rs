//! Inheritance-aware collection of members, relations and machines.
//!
//! Results list the class's own items first, then each parent's in
//! generalization order, recursively. Nothing is deduplicated: an item
//! reachable through two parents appears twice, so callers can detect
//! overrides. Recursion stops when a class reappears on the current path.

use crate::model::{
    AssociationEndView, AttributeView, ClassView, EntityKind, EntityRef, EntityView,
    EnumerationView, ModelElement, StateMachineView,
};

/// Selection of entities by kind and stereotypes.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemberFilter<'a> {
    pub kind: Option<EntityKind>,
    /// When non-empty, at least one must be present.
    pub stereotypes: &'a [&'a str],
    /// None of these may be present.
    pub excluded_stereotypes: &'a [&'a str],
}

impl<'a> MemberFilter<'a> {
    /// Accept everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn kind(kind: EntityKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn with_stereotypes(mut self, stereotypes: &'a [&'a str]) -> Self {
        self.stereotypes = stereotypes;
        self
    }

    pub fn excluding(mut self, stereotypes: &'a [&'a str]) -> Self {
        self.excluded_stereotypes = stereotypes;
        self
    }

    pub fn matches(&self, view: &EntityView<'_>) -> bool {
        if self.kind.is_some_and(|kind| !view.is_a(kind)) {
            return false;
        }
        if !self.stereotypes.is_empty() && !self.stereotypes.iter().any(|s| view.is_stereotype(s)) {
            return false;
        }
        !self
            .excluded_stereotypes
            .iter()
            .any(|s| view.is_stereotype(s))
    }
}

/// Depth-first walk over `class` and its ancestors, cycle-safe per path.
fn walk<'m, F>(class: ClassView<'m>, path: &mut Vec<EntityRef>, visit: &mut F)
where
    F: FnMut(ClassView<'m>),
{
    if path.contains(&class.handle()) {
        tracing::trace!(class = class.label(), "generalization loop cut");
        return;
    }
    path.push(class.handle());
    visit(class);
    for parent in class.parents() {
        walk(parent, path, visit);
    }
    path.pop();
}

impl<'m> ClassView<'m> {
    /// Members of this class and its ancestors matching `filter`.
    pub fn all_members(&self, filter: &MemberFilter<'_>) -> Vec<EntityView<'m>> {
        let mut out = Vec::new();
        walk(*self, &mut Vec::new(), &mut |class| {
            out.extend(class.members().into_iter().filter(|m| filter.matches(m)));
        });
        out
    }

    pub fn all_attributes(&self) -> Vec<AttributeView<'m>> {
        self.all_members(&MemberFilter::kind(EntityKind::Attribute))
            .into_iter()
            .filter_map(|m| m.as_attribute())
            .collect()
    }

    /// Relations of this class and its ancestors whose target matches
    /// `filter`.
    pub fn all_associations(&self, filter: &MemberFilter<'_>) -> Vec<AssociationEndView<'m>> {
        let mut out = Vec::new();
        walk(*self, &mut Vec::new(), &mut |class| {
            out.extend(
                class
                    .associations()
                    .into_iter()
                    .filter(|end| end.participant().is_some_and(|p| filter.matches(&p))),
            );
        });
        out
    }

    /// State machines of this class and its ancestors.
    pub fn all_state_machines(&self) -> Vec<StateMachineView<'m>> {
        let mut out = Vec::new();
        walk(*self, &mut Vec::new(), &mut |class| {
            out.extend(class.state_machines());
        });
        out
    }
}

impl<'m> EnumerationView<'m> {
    /// Literals of this enumeration and its ancestors.
    pub fn all_literals(&self) -> Vec<EntityView<'m>> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        collect_literals(*self, &mut path, &mut out);
        out
    }
}

fn collect_literals<'m>(
    enumeration: EnumerationView<'m>,
    path: &mut Vec<EntityRef>,
    out: &mut Vec<EntityView<'m>>,
) {
    if path.contains(&enumeration.handle()) {
        return;
    }
    path.push(enumeration.handle());
    out.extend(enumeration.literals());
    for parent in enumeration.parents() {
        collect_literals(parent, path, out);
    }
    path.pop();
}

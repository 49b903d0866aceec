//! Typed borrowed views over [`Model`].
//!
//! Zero-copy views that give kind-faithful navigation over the semantic
//! graph. [`EntityView`] works for any entity; the typed views wrap it once
//! the kind is known and expose that kind's fields and relations.
//!
//! ## Usage
//!
//! ```ignore
//! use umlgraph::{ModelElement, ModelHost};
//!
//! let host = ModelHost::from_path("model.xmi")?;
//! for class in host.model().iter_kind(EntityKind::Class).filter_map(|v| v.as_class()) {
//!     println!("{}: {:?}", class.qualified_name("."), class.tags().get("label"));
//! }
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::base::XmiId;
use crate::base::constants::{stereotypes, tags};

use super::entity::{
    Aggregation, Entity, EntityData, EntityKind, EntityRef, MultiplicityRange,
    ParameterDirection, PseudoKind, StateKind,
};
use super::{Model, TagDictionary};

// ============================================================================
// POLYMORPHIC BEHAVIOR
// ============================================================================

/// Behavior shared by every kind of entity.
pub trait ModelElement<'m> {
    /// The untyped view of this element.
    fn element(&self) -> EntityView<'m>;

    /// Fully qualified name, joined with `separator`.
    fn qualified_name(&self, separator: &str) -> String;

    /// Names of the applied stereotypes, in declaration order.
    fn stereotype_names(&self) -> Vec<&'m str> {
        let view = self.element();
        view.model.stereotype_names(view.handle)
    }

    fn is_stereotype(&self, name: &str) -> bool {
        let view = self.element();
        view.model.is_stereotype(view.handle, name)
    }

    /// Tag dictionary snapshot (kind defaults, then tagged values).
    fn tags(&self) -> TagDictionary {
        let view = self.element();
        view.model.tags(view.handle)
    }
}

fn package_qualified(view: EntityView<'_>, separator: &str) -> String {
    match view.package() {
        Some(package) => format!("{}{separator}{}", package.label(), view.label()),
        None => view.label().to_string(),
    }
}

// ============================================================================
// CORE VIEW
// ============================================================================

/// A borrowed view over any entity.
#[derive(Clone, Copy)]
pub struct EntityView<'m> {
    handle: EntityRef,
    entity: &'m Entity,
    model: &'m Model,
}

impl<'m> EntityView<'m> {
    /// Create a view. Panics if `handle` does not belong to `model`.
    pub fn new(handle: EntityRef, model: &'m Model) -> Self {
        Self {
            handle,
            entity: model.entity(handle),
            model,
        }
    }

    fn view(&self, handle: EntityRef) -> EntityView<'m> {
        EntityView::new(handle, self.model)
    }

    fn views(&self, handles: &[EntityRef]) -> Vec<EntityView<'m>> {
        handles.iter().map(|h| self.view(*h)).collect()
    }

    // ── Identity ────────────────────────────────────────────────────

    pub fn handle(&self) -> EntityRef {
        self.handle
    }

    pub fn entity(&self) -> &'m Entity {
        self.entity
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    pub fn data(&self) -> &'m EntityData {
        &self.entity.data
    }

    pub fn xmi_id(&self) -> &'m XmiId {
        &self.entity.xmi_id
    }

    pub fn id(&self) -> &'m str {
        self.entity.xmi_id.as_str()
    }

    /// The declared name (None for anonymous entities).
    pub fn name(&self) -> Option<&'m str> {
        self.entity.name.as_deref()
    }

    /// The name, or the id for anonymous entities.
    pub fn label(&self) -> &'m str {
        self.entity.label()
    }

    pub fn kind(&self) -> EntityKind {
        self.entity.kind()
    }

    pub fn is_a(&self, kind: EntityKind) -> bool {
        self.kind().is_a(kind)
    }

    // ── Ownership ───────────────────────────────────────────────────

    /// The owning package.
    pub fn package(&self) -> Option<PackageView<'m>> {
        self.entity
            .package
            .and_then(|p| self.view(p).as_package())
    }

    pub fn stereotypes(&self) -> Vec<EntityView<'m>> {
        self.views(&self.entity.stereotypes)
    }

    // ── Generalization ──────────────────────────────────────────────

    /// Generalizations in which this entity is the child.
    pub fn child_of(&self) -> Vec<GeneralizationView<'m>> {
        self.model
            .generalizations_of_child(self.handle)
            .into_iter()
            .filter_map(|g| self.view(g).as_generalization())
            .collect()
    }

    /// Generalizations in which this entity is the parent.
    pub fn parent_of(&self) -> Vec<GeneralizationView<'m>> {
        self.model
            .generalizations_of_parent(self.handle)
            .into_iter()
            .filter_map(|g| self.view(g).as_generalization())
            .collect()
    }

    pub fn parents(&self) -> Vec<EntityView<'m>> {
        self.child_of().iter().map(|g| g.parent()).collect()
    }

    pub fn children(&self) -> Vec<EntityView<'m>> {
        self.parent_of().iter().map(|g| g.child()).collect()
    }

    // ── Associations ────────────────────────────────────────────────

    /// Association ends attached to this entity.
    pub fn association_ends(&self) -> Vec<AssociationEndView<'m>> {
        self.model
            .ends_of_participant(self.handle)
            .into_iter()
            .filter_map(|e| self.view(e).as_association_end())
            .collect()
    }

    /// The far ends of every association this entity takes part in.
    ///
    /// Each returned end is a relation navigating away from this entity: its
    /// participant is the related entity and its name is the field name.
    pub fn associations(&self) -> Vec<AssociationEndView<'m>> {
        self.association_ends()
            .iter()
            .flat_map(|end| end.swap())
            .collect()
    }

    /// The far end named `name`.
    pub fn association_by_name(&self, name: &str) -> Option<AssociationEndView<'m>> {
        self.associations()
            .into_iter()
            .find(|end| end.name() == Some(name))
    }

    // ── Downcast to typed views ─────────────────────────────────────

    pub fn as_package(&self) -> Option<PackageView<'m>> {
        (self.kind() == EntityKind::Package).then_some(PackageView { inner: *self })
    }

    pub fn as_class(&self) -> Option<ClassView<'m>> {
        (self.kind() == EntityKind::Class).then_some(ClassView { inner: *self })
    }

    pub fn as_enumeration(&self) -> Option<EnumerationView<'m>> {
        (self.kind() == EntityKind::Enumeration).then_some(EnumerationView { inner: *self })
    }

    pub fn as_attribute(&self) -> Option<AttributeView<'m>> {
        (self.kind() == EntityKind::Attribute).then_some(AttributeView { inner: *self })
    }

    pub fn as_operation(&self) -> Option<OperationView<'m>> {
        (self.kind() == EntityKind::Operation).then_some(OperationView { inner: *self })
    }

    pub fn as_association(&self) -> Option<AssociationView<'m>> {
        (self.kind() == EntityKind::Association).then_some(AssociationView { inner: *self })
    }

    pub fn as_association_end(&self) -> Option<AssociationEndView<'m>> {
        (self.kind() == EntityKind::AssociationEnd).then_some(AssociationEndView { inner: *self })
    }

    pub fn as_generalization(&self) -> Option<GeneralizationView<'m>> {
        (self.kind() == EntityKind::Generalization).then_some(GeneralizationView { inner: *self })
    }

    pub fn as_state_machine(&self) -> Option<StateMachineView<'m>> {
        (self.kind() == EntityKind::StateMachine).then_some(StateMachineView { inner: *self })
    }

    pub fn as_state(&self) -> Option<StateView<'m>> {
        (self.kind() == EntityKind::State).then_some(StateView { inner: *self })
    }

    pub fn as_transition(&self) -> Option<TransitionView<'m>> {
        (self.kind() == EntityKind::Transition).then_some(TransitionView { inner: *self })
    }

    pub fn as_use_case(&self) -> Option<UseCaseView<'m>> {
        (self.kind() == EntityKind::UseCase).then_some(UseCaseView { inner: *self })
    }
}

impl<'m> ModelElement<'m> for EntityView<'m> {
    fn element(&self) -> EntityView<'m> {
        *self
    }

    fn qualified_name(&self, separator: &str) -> String {
        if let Some(package) = self.as_package() {
            return package.qualified_name(separator);
        }
        if let Some(attribute) = self.as_attribute() {
            return attribute.qualified_name(separator);
        }
        if let Some(operation) = self.as_operation() {
            return operation.qualified_name(separator);
        }
        if let Some(machine) = self.as_state_machine() {
            return machine.qualified_name(separator);
        }
        match self.kind() {
            EntityKind::Class
            | EntityKind::DataType
            | EntityKind::Enumeration
            | EntityKind::UseCase
            | EntityKind::Actor => package_qualified(*self, separator),
            _ => self.label().to_string(),
        }
    }
}

impl PartialEq for EntityView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && std::ptr::eq(self.model, other.model)
    }
}

impl Eq for EntityView<'_> {}

impl Hash for EntityView<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl fmt::Debug for EntityView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityView")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

macro_rules! typed_view {
    ($(#[$meta:meta])* $view:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $view<'m> {
            pub inner: EntityView<'m>,
        }

        impl<'m> $view<'m> {
            pub fn name(&self) -> Option<&'m str> {
                self.inner.name()
            }

            pub fn label(&self) -> &'m str {
                self.inner.label()
            }

            pub fn handle(&self) -> EntityRef {
                self.inner.handle()
            }
        }
    };
}

macro_rules! label_qualified {
    ($($view:ident),* $(,)?) => {
        $(
            impl<'m> ModelElement<'m> for $view<'m> {
                fn element(&self) -> EntityView<'m> {
                    self.inner
                }

                fn qualified_name(&self, _separator: &str) -> String {
                    self.inner.label().to_string()
                }
            }
        )*
    };
}

macro_rules! package_qualified {
    ($($view:ident),* $(,)?) => {
        $(
            impl<'m> ModelElement<'m> for $view<'m> {
                fn element(&self) -> EntityView<'m> {
                    self.inner
                }

                fn qualified_name(&self, separator: &str) -> String {
                    package_qualified(self.inner, separator)
                }
            }
        )*
    };
}

// ============================================================================
// PACKAGE VIEW
// ============================================================================

typed_view!(
    /// View over a Package.
    PackageView
);

impl<'m> PackageView<'m> {
    /// The model this package belongs to.
    pub fn owning_model(&self) -> Option<EntityView<'m>> {
        match self.inner.data() {
            EntityData::Package { model } => model.map(|m| self.inner.view(m)),
            _ => None,
        }
    }

    /// The enclosing package.
    pub fn parent(&self) -> Option<PackageView<'m>> {
        self.inner.package()
    }

    /// Entities directly owned by this package.
    pub fn owned(&self) -> Vec<EntityView<'m>> {
        let owned = self.inner.model.entities_of_package(self.inner.handle);
        self.inner.views(&owned)
    }

    /// Owned entities of `kind` carrying at least one of `stereotypes` (when
    /// given) and none of `excluded`.
    pub fn entities(
        &self,
        kind: EntityKind,
        stereotypes: &[&str],
        excluded: &[&str],
    ) -> Vec<EntityView<'m>> {
        self.owned()
            .into_iter()
            .filter(|v| v.is_a(kind))
            .filter(|v| stereotypes.is_empty() || stereotypes.iter().any(|s| v.is_stereotype(s)))
            .filter(|v| !excluded.iter().any(|s| v.is_stereotype(s)))
            .collect()
    }

    /// Owned classes, filtered like [`entities`](Self::entities).
    pub fn classes(&self, stereotypes: &[&str], excluded: &[&str]) -> Vec<ClassView<'m>> {
        self.entities(EntityKind::Class, stereotypes, excluded)
            .into_iter()
            .filter_map(|v| v.as_class())
            .collect()
    }

    /// Provided by another system; not analyzed for dependencies.
    pub fn is_external(&self) -> bool {
        self.inner.is_stereotype(stereotypes::EXTERNAL)
    }

    /// Dependencies declared through the `depends` tag.
    pub fn declared_dependencies(&self) -> Vec<String> {
        self.inner
            .tags()
            .list(tags::DEPENDS)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

label_qualified!(PackageView);

// ============================================================================
// CLASS VIEW
// ============================================================================

typed_view!(
    /// View over a Class.
    ClassView
);

impl<'m> ClassView<'m> {
    pub fn is_abstract(&self) -> bool {
        matches!(self.inner.data(), EntityData::Class { is_abstract: true, .. })
    }

    /// Declared attributes and operations, in declaration order.
    pub fn members(&self) -> Vec<EntityView<'m>> {
        match self.inner.data() {
            EntityData::Class { members, .. } => self.inner.views(members),
            _ => Vec::new(),
        }
    }

    pub fn attributes(&self) -> Vec<AttributeView<'m>> {
        self.members()
            .into_iter()
            .filter_map(|m| m.as_attribute())
            .collect()
    }

    pub fn operations(&self) -> Vec<OperationView<'m>> {
        self.members()
            .into_iter()
            .filter_map(|m| m.as_operation())
            .collect()
    }

    /// Whether a declared member of `kind` is named `name`.
    pub fn has_member(&self, name: &str, kind: EntityKind) -> bool {
        self.members()
            .iter()
            .any(|m| m.kind() == kind && m.name() == Some(name))
    }

    pub fn child_of(&self) -> Vec<GeneralizationView<'m>> {
        self.inner.child_of()
    }

    pub fn parent_of(&self) -> Vec<GeneralizationView<'m>> {
        self.inner.parent_of()
    }

    /// Parent classes, in generalization order.
    pub fn parents(&self) -> Vec<ClassView<'m>> {
        self.inner
            .parents()
            .into_iter()
            .filter_map(|p| p.as_class())
            .collect()
    }

    pub fn children(&self) -> Vec<ClassView<'m>> {
        self.inner
            .children()
            .into_iter()
            .filter_map(|c| c.as_class())
            .collect()
    }

    /// Whether this class extends a parent in place.
    pub fn is_extended(&self) -> bool {
        self.child_of().iter().any(|g| g.is_extend())
    }

    /// Relations navigating away from this class.
    pub fn associations(&self) -> Vec<AssociationEndView<'m>> {
        self.inner.associations()
    }

    pub fn association_by_name(&self, name: &str) -> Option<AssociationEndView<'m>> {
        self.inner.association_by_name(name)
    }

    /// State machines describing this class.
    pub fn state_machines(&self) -> Vec<StateMachineView<'m>> {
        self.inner
            .model
            .machines_of_context(self.inner.handle)
            .into_iter()
            .filter_map(|m| self.inner.view(m).as_state_machine())
            .collect()
    }
}

package_qualified!(ClassView, UseCaseView);

// ============================================================================
// ENUMERATION VIEW
// ============================================================================

typed_view!(
    /// View over an Enumeration.
    EnumerationView
);

impl<'m> EnumerationView<'m> {
    /// Declared literals, in declaration order.
    pub fn literals(&self) -> Vec<EntityView<'m>> {
        match self.inner.data() {
            EntityData::Enumeration { literals } => self.inner.views(literals),
            _ => Vec::new(),
        }
    }

    pub fn parents(&self) -> Vec<EnumerationView<'m>> {
        self.inner
            .parents()
            .into_iter()
            .filter_map(|p| p.as_enumeration())
            .collect()
    }
}

package_qualified!(EnumerationView);

// ============================================================================
// MEMBER VIEWS
// ============================================================================

typed_view!(
    /// View over an Attribute.
    AttributeView
);

impl<'m> AttributeView<'m> {
    /// The class declaring this attribute.
    pub fn owner(&self) -> Option<EntityView<'m>> {
        match self.inner.data() {
            EntityData::Attribute { owner, .. } => Some(self.inner.view(*owner)),
            _ => None,
        }
    }

    pub fn datatype(&self) -> Option<EntityView<'m>> {
        match self.inner.data() {
            EntityData::Attribute { datatype, .. } => datatype.map(|d| self.inner.view(d)),
            _ => None,
        }
    }

    pub fn multiplicity(&self) -> Option<MultiplicityRange> {
        match self.inner.data() {
            EntityData::Attribute { multiplicity, .. } => *multiplicity,
            _ => None,
        }
    }

    /// Field width, from the `size` tag.
    pub fn size(&self) -> Option<u32> {
        self.inner.tags().get(tags::SIZE)?.trim().parse().ok()
    }

    pub fn is_required(&self) -> bool {
        self.multiplicity().is_some_and(|m| m.lower > 0)
    }
}

impl<'m> ModelElement<'m> for AttributeView<'m> {
    fn element(&self) -> EntityView<'m> {
        self.inner
    }

    fn qualified_name(&self, separator: &str) -> String {
        match self.owner() {
            Some(owner) => format!("{}{separator}{}", owner.qualified_name(separator), self.label()),
            None => self.label().to_string(),
        }
    }
}

typed_view!(
    /// View over an Operation.
    OperationView
);

impl<'m> OperationView<'m> {
    pub fn owner(&self) -> Option<EntityView<'m>> {
        match self.inner.data() {
            EntityData::Operation { owner, .. } => Some(self.inner.view(*owner)),
            _ => None,
        }
    }

    /// All parameters, including the return parameter.
    pub fn parameters(&self) -> Vec<EntityView<'m>> {
        match self.inner.data() {
            EntityData::Operation { parameters, .. } => self.inner.views(parameters),
            _ => Vec::new(),
        }
    }

    /// Parameters passed by the caller.
    pub fn arguments(&self) -> Vec<EntityView<'m>> {
        self.parameters()
            .into_iter()
            .filter(|p| !is_return(p))
            .collect()
    }

    /// Type of the return parameter.
    pub fn return_type(&self) -> Option<EntityView<'m>> {
        self.parameters()
            .into_iter()
            .find(is_return)
            .and_then(|p| match p.data() {
                EntityData::Parameter { datatype, .. } => datatype.map(|d| self.inner.view(d)),
                _ => None,
            })
    }
}

fn is_return(parameter: &EntityView<'_>) -> bool {
    matches!(
        parameter.data(),
        EntityData::Parameter {
            direction: ParameterDirection::Return,
            ..
        }
    ) || parameter.name() == Some("return")
}

impl<'m> ModelElement<'m> for OperationView<'m> {
    fn element(&self) -> EntityView<'m> {
        self.inner
    }

    fn qualified_name(&self, separator: &str) -> String {
        match self.owner() {
            Some(owner) => format!("{}{separator}{}", owner.qualified_name(separator), self.label()),
            None => self.label().to_string(),
        }
    }
}

// ============================================================================
// ASSOCIATION VIEWS
// ============================================================================

typed_view!(
    /// View over an Association.
    AssociationView
);

impl<'m> AssociationView<'m> {
    pub fn ends(&self) -> Vec<AssociationEndView<'m>> {
        match self.inner.data() {
            EntityData::Association { ends } => ends
                .iter()
                .filter_map(|e| self.inner.view(*e).as_association_end())
                .collect(),
            _ => Vec::new(),
        }
    }
}

typed_view!(
    /// View over an AssociationEnd.
    AssociationEndView
);

impl<'m> AssociationEndView<'m> {
    fn fields(&self) -> Option<(EntityRef, EntityRef, bool, Aggregation, Option<MultiplicityRange>)> {
        match self.inner.data() {
            EntityData::AssociationEnd {
                association,
                participant,
                navigable,
                aggregation,
                multiplicity,
            } => Some((*association, *participant, *navigable, *aggregation, *multiplicity)),
            _ => None,
        }
    }

    pub fn association(&self) -> Option<AssociationView<'m>> {
        self.fields()
            .and_then(|(a, ..)| self.inner.view(a).as_association())
    }

    /// The entity at this end.
    pub fn participant(&self) -> Option<EntityView<'m>> {
        self.fields().map(|(_, p, ..)| self.inner.view(p))
    }

    pub fn is_navigable(&self) -> bool {
        self.fields().is_some_and(|(_, _, n, ..)| n)
    }

    pub fn aggregation(&self) -> Aggregation {
        self.fields().map(|(_, _, _, a, _)| a).unwrap_or_default()
    }

    pub fn multiplicity(&self) -> Option<MultiplicityRange> {
        self.fields().and_then(|(.., m)| m)
    }

    pub fn is_required(&self) -> bool {
        self.multiplicity().is_some_and(|m| m.lower > 0)
    }

    /// The other ends of the owning association.
    pub fn swap(&self) -> Vec<AssociationEndView<'m>> {
        self.association()
            .map(|a| {
                a.ends()
                    .into_iter()
                    .filter(|e| e.handle() != self.handle())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The single other end.
    pub fn partner(&self) -> Option<AssociationEndView<'m>> {
        match self.swap().as_slice() {
            [partner] => Some(*partner),
            _ => None,
        }
    }
}

impl<'m> ModelElement<'m> for AssociationEndView<'m> {
    fn element(&self) -> EntityView<'m> {
        self.inner
    }

    /// Named after the class on the other side, which holds this end as a field.
    fn qualified_name(&self, separator: &str) -> String {
        match self.partner().and_then(|p| p.participant()) {
            Some(holder) => format!("{}{separator}{}", holder.qualified_name(separator), self.label()),
            None => self.label().to_string(),
        }
    }
}

// ============================================================================
// GENERALIZATION VIEW
// ============================================================================

typed_view!(
    /// View over a Generalization edge.
    GeneralizationView
);

impl<'m> GeneralizationView<'m> {
    fn ends(&self) -> (EntityRef, EntityRef) {
        match self.inner.data() {
            EntityData::Generalization { parent, child } => (*parent, *child),
            _ => (self.inner.handle, self.inner.handle),
        }
    }

    pub fn parent(&self) -> EntityView<'m> {
        self.inner.view(self.ends().0)
    }

    pub fn child(&self) -> EntityView<'m> {
        self.inner.view(self.ends().1)
    }

    /// The child extends its parent in place instead of deriving a new type.
    pub fn is_extend(&self) -> bool {
        self.inner.is_stereotype(stereotypes::EXTEND)
    }
}

label_qualified!(AssociationView, GeneralizationView, StateView, TransitionView);

// ============================================================================
// STATE MACHINE VIEWS
// ============================================================================

typed_view!(
    /// View over a StateMachine.
    StateMachineView
);

impl<'m> StateMachineView<'m> {
    /// The entity whose behavior this machine describes.
    pub fn context(&self) -> Option<EntityView<'m>> {
        match self.inner.data() {
            EntityData::StateMachine { context, .. } => context.map(|c| self.inner.view(c)),
            _ => None,
        }
    }

    /// The top composite state.
    pub fn top(&self) -> Option<StateView<'m>> {
        match self.inner.data() {
            EntityData::StateMachine { top, .. } => {
                top.and_then(|t| self.inner.view(t).as_state())
            }
            _ => None,
        }
    }

    /// Every state of the machine, at any depth, in creation order.
    pub fn states(&self) -> Vec<StateView<'m>> {
        let machine = self.handle();
        self.inner
            .model
            .iter_kind(EntityKind::State)
            .filter_map(|v| v.as_state())
            .filter(|s| s.machine_handle() == Some(machine))
            .collect()
    }

    pub fn transitions(&self) -> Vec<TransitionView<'m>> {
        let machine = self.handle();
        self.inner
            .model
            .iter_kind(EntityKind::Transition)
            .filter_map(|v| v.as_transition())
            .filter(|t| t.machine_handle() == Some(machine))
            .collect()
    }

    /// Initial pseudostates directly under the top state.
    pub fn initial_states(&self) -> Vec<StateView<'m>> {
        let top = self.top().map(|t| t.handle());
        self.states()
            .into_iter()
            .filter(|s| s.kind() == Some(StateKind::Pseudo(PseudoKind::Initial)))
            .filter(|s| s.container().map(|c| c.handle()) == top)
            .collect()
    }

    pub fn final_states(&self) -> Vec<StateView<'m>> {
        self.states()
            .into_iter()
            .filter(|s| s.kind() == Some(StateKind::Final))
            .collect()
    }

    /// Working states: everything except pseudostates, final states and the top.
    pub fn middle_states(&self) -> Vec<StateView<'m>> {
        let top = self.top().map(|t| t.handle());
        self.states()
            .into_iter()
            .filter(|s| matches!(s.kind(), Some(StateKind::Simple | StateKind::Composite)))
            .filter(|s| Some(s.handle()) != top)
            .collect()
    }

    /// States carrying the stereotype `name`.
    pub fn stereotype_states(&self, name: &str) -> Vec<StateView<'m>> {
        self.states()
            .into_iter()
            .filter(|s| s.inner.is_stereotype(name))
            .collect()
    }
}

impl<'m> ModelElement<'m> for StateMachineView<'m> {
    fn element(&self) -> EntityView<'m> {
        self.inner
    }

    fn qualified_name(&self, separator: &str) -> String {
        match self.context() {
            Some(context) => format!("{}{separator}{}", context.qualified_name(separator), self.label()),
            None => self.label().to_string(),
        }
    }
}

typed_view!(
    /// View over a state of any variant.
    StateView
);

impl<'m> StateView<'m> {
    fn fields(&self) -> Option<(EntityRef, Option<EntityRef>, StateKind)> {
        match self.inner.data() {
            EntityData::State {
                machine,
                container,
                kind,
            } => Some((*machine, *container, *kind)),
            _ => None,
        }
    }

    fn machine_handle(&self) -> Option<EntityRef> {
        self.fields().map(|(m, ..)| m)
    }

    pub fn kind(&self) -> Option<StateKind> {
        self.fields().map(|(.., k)| k)
    }

    pub fn machine(&self) -> Option<StateMachineView<'m>> {
        self.machine_handle()
            .and_then(|m| self.inner.view(m).as_state_machine())
    }

    /// The composite state this state is nested in.
    pub fn container(&self) -> Option<StateView<'m>> {
        self.fields()
            .and_then(|(_, c, _)| c)
            .and_then(|c| self.inner.view(c).as_state())
    }

    /// States nested directly in this one.
    pub fn subvertices(&self) -> Vec<StateView<'m>> {
        let this = self.handle();
        self.machine()
            .map(|m| m.states())
            .unwrap_or_default()
            .into_iter()
            .filter(|s| s.container().map(|c| c.handle()) == Some(this))
            .collect()
    }

    pub fn outgoing(&self) -> Vec<TransitionView<'m>> {
        let this = self.handle();
        self.machine()
            .map(|m| m.transitions())
            .unwrap_or_default()
            .into_iter()
            .filter(|t| t.source().map(|s| s.handle()) == Some(this))
            .collect()
    }

    pub fn incoming(&self) -> Vec<TransitionView<'m>> {
        let this = self.handle();
        self.machine()
            .map(|m| m.transitions())
            .unwrap_or_default()
            .into_iter()
            .filter(|t| t.target().map(|s| s.handle()) == Some(this))
            .collect()
    }
}

typed_view!(
    /// View over a Transition.
    TransitionView
);

impl<'m> TransitionView<'m> {
    fn machine_handle(&self) -> Option<EntityRef> {
        match self.inner.data() {
            EntityData::Transition { machine, .. } => Some(*machine),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<StateView<'m>> {
        match self.inner.data() {
            EntityData::Transition { source, .. } => self.inner.view(*source).as_state(),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<StateView<'m>> {
        match self.inner.data() {
            EntityData::Transition { target, .. } => self.inner.view(*target).as_state(),
            _ => None,
        }
    }

    /// Guard expression body.
    pub fn guard(&self) -> Option<&'m str> {
        match self.inner.data() {
            EntityData::Transition { guard, .. } => guard.as_deref(),
            _ => None,
        }
    }

    /// The effect action.
    pub fn effect(&self) -> Option<EntityView<'m>> {
        match self.inner.data() {
            EntityData::Transition { effect, .. } => effect.map(|e| self.inner.view(e)),
            _ => None,
        }
    }

    /// Script of the effect action.
    pub fn effect_script(&self) -> Option<&'m str> {
        match self.effect()?.data() {
            EntityData::Action { script } => script.as_deref(),
            _ => None,
        }
    }

    pub fn trigger(&self) -> Option<EntityView<'m>> {
        match self.inner.data() {
            EntityData::Transition { trigger, .. } => trigger.map(|t| self.inner.view(t)),
            _ => None,
        }
    }
}

// ============================================================================
// USE CASE VIEW
// ============================================================================

typed_view!(
    /// View over a UseCase. Menu navigation lives in [`crate::graph::menus`].
    UseCaseView
);

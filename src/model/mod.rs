//! The committed semantic graph.
//!
//! ## Design
//!
//! Entities live in an arena indexed by [`EntityRef`]. The arena only grows
//! during a session; references between entities are handles, so a committed
//! model can never contain a dangling id. Ids are indexed separately because
//! the same id may legitimately be defined by two documents, in which case a
//! lookup reports the ambiguity instead of guessing.
//!
//! ```text
//! Model
//! ├── entities: Vec<Entity>                          (creation order)
//! ├── index: FxHashMap<XmiId, Vec<EntityRef>>
//! ├── tag_defaults: kind → default tags
//! └── journal: undo log while a load transaction is open
//! ```
//!
//! Navigation relations that point "backwards" (generalizations of a child,
//! association ends of a participant, tagged values of an owner) are computed
//! by scanning, so they are always consistent with the arena.

mod entity;
mod tags;
mod views;

pub use entity::{
    Aggregation, Collection, Entity, EntityData, EntityKind, EntityRef, EventKind,
    MultiplicityRange, ParameterDirection, PseudoKind, StateKind,
};
pub use tags::{TagDefaults, TagDictionary};
pub use views::{
    AssociationEndView, AssociationView, AttributeView, ClassView, EntityView, EnumerationView,
    GeneralizationView, ModelElement, OperationView, PackageView, StateMachineView, StateView,
    TransitionView, UseCaseView,
};

use rustc_hash::FxHashMap;

use crate::base::XmiId;
use crate::error::ModelError;

// ============================================================================
// TRANSACTIONS
// ============================================================================

/// Position to roll a model back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    entities: usize,
    journal: usize,
}

/// Undo record for a change to an entity that already existed.
#[derive(Debug)]
enum Undo {
    Append { parent: EntityRef, collection: Collection },
    Stereotypes { target: EntityRef, previous: Vec<EntityRef> },
    Context { machine: EntityRef, previous: Option<EntityRef> },
    Top { machine: EntityRef, previous: Option<EntityRef> },
}

// ============================================================================
// MODEL
// ============================================================================

/// Store of all committed entities of a session.
#[derive(Debug, Default)]
pub struct Model {
    entities: Vec<Entity>,
    index: FxHashMap<XmiId, Vec<EntityRef>>,
    tag_defaults: TagDefaults,
    journal: Vec<Undo>,
    open_transactions: usize,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model whose tag dictionaries start from `defaults`.
    pub fn with_tag_defaults(defaults: TagDefaults) -> Self {
        Self {
            tag_defaults: defaults,
            ..Self::default()
        }
    }

    // ── Mutation (load pipeline only) ───────────────────────────────

    /// Commit a new entity.
    pub(crate) fn insert(&mut self, entity: Entity) -> EntityRef {
        let handle = EntityRef::from_index(self.entities.len());
        self.index
            .entry(entity.xmi_id.clone())
            .or_default()
            .push(handle);
        self.entities.push(entity);
        handle
    }

    /// Append `child` to one of `parent`'s ordered collections.
    pub(crate) fn append(
        &mut self,
        parent: EntityRef,
        collection: Collection,
        child: EntityRef,
    ) -> Result<(), ModelError> {
        let entity = self.entity_mut(parent)?;
        let label = entity.label().to_string();
        let kind = entity.kind();
        let items = entity.data.collection_mut(collection).ok_or_else(|| {
            ModelError::structure(format!(
                "{kind} {label} cannot hold {collection:?}"
            ))
        })?;
        items.push(child);
        self.record(Undo::Append { parent, collection });
        Ok(())
    }

    /// Replace the stereotype set of `target`.
    pub(crate) fn set_stereotypes(
        &mut self,
        target: EntityRef,
        stereotypes: Vec<EntityRef>,
    ) -> Result<(), ModelError> {
        let entity = self.entity_mut(target)?;
        let previous = std::mem::replace(&mut entity.stereotypes, stereotypes);
        self.record(Undo::Stereotypes { target, previous });
        Ok(())
    }

    /// Attach a state machine to the entity it describes.
    pub(crate) fn set_context(
        &mut self,
        machine: EntityRef,
        context: EntityRef,
    ) -> Result<(), ModelError> {
        let entity = self.entity_mut(machine)?;
        let label = entity.label().to_string();
        let EntityData::StateMachine { context: slot, .. } = &mut entity.data else {
            return Err(ModelError::structure(format!(
                "{label} is not a state machine"
            )));
        };
        let previous = slot.replace(context);
        self.record(Undo::Context { machine, previous });
        Ok(())
    }

    /// Set the top composite state of a state machine.
    pub(crate) fn set_top(&mut self, machine: EntityRef, top: EntityRef) -> Result<(), ModelError> {
        let entity = self.entity_mut(machine)?;
        let label = entity.label().to_string();
        let EntityData::StateMachine { top: slot, .. } = &mut entity.data else {
            return Err(ModelError::structure(format!(
                "{label} is not a state machine"
            )));
        };
        let previous = slot.replace(top);
        self.record(Undo::Top { machine, previous });
        Ok(())
    }

    fn entity_mut(&mut self, handle: EntityRef) -> Result<&mut Entity, ModelError> {
        self.entities
            .get_mut(handle.index())
            .ok_or_else(|| ModelError::NotFound(handle.to_string()))
    }

    fn record(&mut self, undo: Undo) {
        if self.open_transactions > 0 {
            self.journal.push(undo);
        }
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Open a transaction; every change after this point can be undone.
    pub fn begin(&mut self) -> Checkpoint {
        self.open_transactions += 1;
        Checkpoint {
            entities: self.entities.len(),
            journal: self.journal.len(),
        }
    }

    /// Keep every change made since `checkpoint`.
    pub fn commit(&mut self, _checkpoint: Checkpoint) {
        self.open_transactions = self.open_transactions.saturating_sub(1);
        if self.open_transactions == 0 {
            self.journal.clear();
        }
    }

    /// Undo every change made since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.journal {
            let Some(undo) = self.journal.pop() else {
                break;
            };
            self.undo(undo);
        }
        for entity in self.entities.drain(checkpoint.entities..) {
            if let Some(handles) = self.index.get_mut(&entity.xmi_id) {
                handles.retain(|h| h.index() < checkpoint.entities);
                if handles.is_empty() {
                    self.index.remove(&entity.xmi_id);
                }
            }
        }
        self.open_transactions = self.open_transactions.saturating_sub(1);
    }

    fn undo(&mut self, undo: Undo) {
        match undo {
            Undo::Append { parent, collection } => {
                if let Some(items) = self
                    .entities
                    .get_mut(parent.index())
                    .and_then(|e| e.data.collection_mut(collection))
                {
                    items.pop();
                }
            }
            Undo::Stereotypes { target, previous } => {
                if let Some(entity) = self.entities.get_mut(target.index()) {
                    entity.stereotypes = previous;
                }
            }
            Undo::Context { machine, previous } => {
                if let Some(EntityData::StateMachine { context, .. }) =
                    self.entities.get_mut(machine.index()).map(|e| &mut e.data)
                {
                    *context = previous;
                }
            }
            Undo::Top { machine, previous } => {
                if let Some(EntityData::StateMachine { top, .. }) =
                    self.entities.get_mut(machine.index()).map(|e| &mut e.data)
                {
                    *top = previous;
                }
            }
        }
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// Number of committed entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The entity behind a handle. Panics on a handle from another model.
    pub fn entity(&self, handle: EntityRef) -> &Entity {
        &self.entities[handle.index()]
    }

    pub fn get(&self, handle: EntityRef) -> Option<&Entity> {
        self.entities.get(handle.index())
    }

    /// The single entity carrying `id`.
    ///
    /// Fails with [`ModelError::NotFound`] when no entity carries it and with
    /// [`ModelError::AmbiguousReference`] when several do.
    pub fn lookup(&self, id: &str) -> Result<EntityRef, ModelError> {
        self.find_unique(id)?
            .ok_or_else(|| ModelError::NotFound(id.to_string()))
    }

    /// Like [`lookup`](Self::lookup), but absence is not an error.
    pub fn find_unique(&self, id: &str) -> Result<Option<EntityRef>, ModelError> {
        match self.index.get(id).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([handle]) => Ok(Some(*handle)),
            Some(handles) => Err(ModelError::AmbiguousReference {
                id: id.to_string(),
                count: handles.len(),
            }),
        }
    }

    /// Whether any entity carries `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.index.get(id).is_some_and(|h| !h.is_empty())
    }

    /// View of the single entity carrying `id`.
    pub fn find(&self, id: &str) -> Result<EntityView<'_>, ModelError> {
        self.lookup(id).map(|handle| self.view(handle))
    }

    pub fn view(&self, handle: EntityRef) -> EntityView<'_> {
        EntityView::new(handle, self)
    }

    // ── Iteration ───────────────────────────────────────────────────

    /// All entities in creation order.
    pub fn iter(&self) -> impl Iterator<Item = EntityView<'_>> {
        (0..self.entities.len()).map(|i| self.view(EntityRef::from_index(i)))
    }

    /// Entities of a kind (with the data-type family), in creation order.
    pub fn iter_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityView<'_>> {
        self.iter().filter(move |v| v.kind().is_a(kind))
    }

    /// Entities of a kind that satisfy `filter`.
    pub fn iter_where<'m, F>(
        &'m self,
        kind: EntityKind,
        filter: F,
    ) -> impl Iterator<Item = EntityView<'m>>
    where
        F: Fn(&EntityView<'m>) -> bool + 'm,
    {
        self.iter_kind(kind).filter(move |v| filter(v))
    }

    // ── Tags and stereotypes ────────────────────────────────────────

    /// Tag dictionary of an entity: kind defaults, then tagged values.
    pub fn tags(&self, handle: EntityRef) -> TagDictionary {
        let mut tags = TagDictionary::new();
        let entity = self.entity(handle);
        if let Some(defaults) = self.tag_defaults.get(&entity.kind()) {
            for (name, value) in defaults {
                tags.insert(name.clone(), value.clone());
            }
        }
        for tagged in self.tagged_values_of(handle) {
            let EntityData::TaggedValue {
                definition, value, ..
            } = &self.entity(tagged).data
            else {
                continue;
            };
            if let Some(name) = self.entity(*definition).name() {
                tags.insert(name, value.clone());
            }
        }
        tags
    }

    /// Names of an entity's stereotypes, in declaration order.
    pub fn stereotype_names(&self, handle: EntityRef) -> Vec<&str> {
        self.entity(handle)
            .stereotypes
            .iter()
            .filter_map(|s| self.entity(*s).name())
            .collect()
    }

    pub fn is_stereotype(&self, handle: EntityRef, name: &str) -> bool {
        self.entity(handle)
            .stereotypes
            .iter()
            .any(|s| self.entity(*s).name() == Some(name))
    }

    // ── Reverse relations ───────────────────────────────────────────

    fn scan<'m, F>(&'m self, mut pred: F) -> impl Iterator<Item = EntityRef> + 'm
    where
        F: FnMut(&EntityData) -> bool + 'm,
    {
        self.entities
            .iter()
            .enumerate()
            .filter(move |(_, e)| pred(&e.data))
            .map(|(i, _)| EntityRef::from_index(i))
    }

    /// Generalizations in which `handle` is the child.
    pub fn generalizations_of_child(&self, handle: EntityRef) -> Vec<EntityRef> {
        self.scan(move |d| matches!(d, EntityData::Generalization { child, .. } if *child == handle))
            .collect()
    }

    /// Generalizations in which `handle` is the parent.
    pub fn generalizations_of_parent(&self, handle: EntityRef) -> Vec<EntityRef> {
        self.scan(move |d| matches!(d, EntityData::Generalization { parent, .. } if *parent == handle))
            .collect()
    }

    /// Association ends whose participant is `handle`.
    pub fn ends_of_participant(&self, handle: EntityRef) -> Vec<EntityRef> {
        self.scan(move |d| {
            matches!(d, EntityData::AssociationEnd { participant, .. } if *participant == handle)
        })
        .collect()
    }

    /// Tagged values attached to `handle`.
    pub fn tagged_values_of(&self, handle: EntityRef) -> Vec<EntityRef> {
        self.scan(move |d| matches!(d, EntityData::TaggedValue { owner, .. } if *owner == handle))
            .collect()
    }

    /// State machines whose context is `handle`.
    pub fn machines_of_context(&self, handle: EntityRef) -> Vec<EntityRef> {
        self.scan(move |d| {
            matches!(d, EntityData::StateMachine { context: Some(c), .. } if *c == handle)
        })
        .collect()
    }

    /// Entities directly owned by a package.
    pub fn entities_of_package(&self, package: EntityRef) -> Vec<EntityRef> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.package == Some(package))
            .map(|(i, _)| EntityRef::from_index(i))
            .collect()
    }
}

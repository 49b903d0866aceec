//! Entity blueprints: construction parameters that may still name ids.

use crate::base::XmiId;
use crate::error::ModelError;
use crate::model::{
    Aggregation, Entity, EntityData, EntityRef, Model, MultiplicityRange, ParameterDirection,
    StateKind,
};

/// A reference parameter: either a committed entity or a bare id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ref {
    Entity(EntityRef),
    Id(XmiId),
}

impl Ref {
    /// The committed entity, failing when the id is unknown or ambiguous.
    pub fn resolve(&self, model: &Model) -> Result<EntityRef, ModelError> {
        match self {
            Ref::Entity(handle) => Ok(*handle),
            Ref::Id(id) => model.lookup(id.as_str()),
        }
    }

    /// Like [`resolve`](Self::resolve), but an unknown id is `None`.
    pub fn try_resolve(&self, model: &Model) -> Result<Option<EntityRef>, ModelError> {
        match self {
            Ref::Entity(handle) => Ok(Some(*handle)),
            Ref::Id(id) => model.find_unique(id.as_str()),
        }
    }

    /// The bare id, when not yet resolved.
    pub fn pending_id(&self) -> Option<&XmiId> {
        match self {
            Ref::Entity(_) => None,
            Ref::Id(id) => Some(id),
        }
    }
}

impl From<EntityRef> for Ref {
    fn from(handle: EntityRef) -> Self {
        Ref::Entity(handle)
    }
}

impl From<XmiId> for Ref {
    fn from(id: XmiId) -> Self {
        Ref::Id(id)
    }
}

impl From<&str> for Ref {
    fn from(id: &str) -> Self {
        Ref::Id(XmiId::new(id))
    }
}

/// Kind-specific construction parameters.
///
/// Every [`Ref`] field is flagged "must resolve to an entity"; everything
/// else is taken as is.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// A payload without references.
    Plain(EntityData),
    Package {
        model: Option<Ref>,
    },
    EnumerationLiteral {
        enumeration: Ref,
    },
    Attribute {
        owner: Ref,
        datatype: Option<Ref>,
        multiplicity: Option<MultiplicityRange>,
    },
    Operation {
        owner: Ref,
    },
    Parameter {
        operation: Ref,
        datatype: Option<Ref>,
        direction: ParameterDirection,
    },
    AssociationEnd {
        association: Ref,
        participant: Ref,
        navigable: bool,
        aggregation: Aggregation,
        multiplicity: Option<MultiplicityRange>,
    },
    Generalization {
        parent: Ref,
        child: Ref,
    },
    TaggedValue {
        definition: Ref,
        owner: Ref,
        value: String,
    },
    State {
        machine: Ref,
        container: Option<Ref>,
        kind: StateKind,
    },
    Transition {
        machine: Ref,
        source: Ref,
        target: Ref,
        guard: Option<String>,
        effect: Option<Ref>,
        trigger: Option<Ref>,
    },
}

/// Everything needed to construct one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Blueprint {
    pub id: XmiId,
    pub name: Option<String>,
    pub package: Option<Ref>,
    pub body: Body,
}

impl Blueprint {
    pub fn new(id: impl Into<XmiId>, body: Body) -> Self {
        Self {
            id: id.into(),
            name: None,
            package: None,
            body,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_package(mut self, package: Option<Ref>) -> Self {
        self.package = package;
        self
    }

    /// The reference mask: every parameter that must resolve.
    pub fn refs(&self) -> Vec<&Ref> {
        let mut refs: Vec<&Ref> = self.package.iter().collect();
        match &self.body {
            Body::Plain(_) => {}
            Body::Package { model } => refs.extend(model),
            Body::EnumerationLiteral { enumeration } => refs.push(enumeration),
            Body::Attribute {
                owner, datatype, ..
            } => {
                refs.push(owner);
                refs.extend(datatype);
            }
            Body::Operation { owner } => refs.push(owner),
            Body::Parameter {
                operation,
                datatype,
                ..
            } => {
                refs.push(operation);
                refs.extend(datatype);
            }
            Body::AssociationEnd {
                association,
                participant,
                ..
            } => {
                refs.push(association);
                refs.push(participant);
            }
            Body::Generalization { parent, child } => {
                refs.push(parent);
                refs.push(child);
            }
            Body::TaggedValue {
                definition, owner, ..
            } => {
                refs.push(definition);
                refs.push(owner);
            }
            Body::State {
                machine, container, ..
            } => {
                refs.push(machine);
                refs.extend(container);
            }
            Body::Transition {
                machine,
                source,
                target,
                effect,
                trigger,
                ..
            } => {
                refs.push(machine);
                refs.push(source);
                refs.push(target);
                refs.extend(effect);
                refs.extend(trigger);
            }
        }
        refs
    }

    /// Ids among the references that the model cannot resolve yet.
    pub fn unresolved(&self, model: &Model) -> Result<Vec<XmiId>, ModelError> {
        let mut missing = Vec::new();
        for reference in self.refs() {
            if reference.try_resolve(model)?.is_none() {
                if let Some(id) = reference.pending_id() {
                    missing.push(id.clone());
                }
            }
        }
        Ok(missing)
    }

    /// Build the entity, resolving every reference against `model`.
    pub fn realize(&self, model: &Model) -> Result<Entity, ModelError> {
        let resolve = |r: &Ref| r.resolve(model);
        let resolve_opt = |r: &Option<Ref>| r.as_ref().map(|r| r.resolve(model)).transpose();

        let data = match &self.body {
            Body::Plain(data) => data.clone(),
            Body::Package { model: owner } => EntityData::Package {
                model: resolve_opt(owner)?,
            },
            Body::EnumerationLiteral { enumeration } => EntityData::EnumerationLiteral {
                enumeration: resolve(enumeration)?,
            },
            Body::Attribute {
                owner,
                datatype,
                multiplicity,
            } => EntityData::Attribute {
                owner: resolve(owner)?,
                datatype: resolve_opt(datatype)?,
                multiplicity: *multiplicity,
            },
            Body::Operation { owner } => EntityData::Operation {
                owner: resolve(owner)?,
                parameters: Vec::new(),
            },
            Body::Parameter {
                operation,
                datatype,
                direction,
            } => EntityData::Parameter {
                operation: resolve(operation)?,
                datatype: resolve_opt(datatype)?,
                direction: *direction,
            },
            Body::AssociationEnd {
                association,
                participant,
                navigable,
                aggregation,
                multiplicity,
            } => EntityData::AssociationEnd {
                association: resolve(association)?,
                participant: resolve(participant)?,
                navigable: *navigable,
                aggregation: *aggregation,
                multiplicity: *multiplicity,
            },
            Body::Generalization { parent, child } => EntityData::Generalization {
                parent: resolve(parent)?,
                child: resolve(child)?,
            },
            Body::TaggedValue {
                definition,
                owner,
                value,
            } => EntityData::TaggedValue {
                definition: resolve(definition)?,
                owner: resolve(owner)?,
                value: value.clone(),
            },
            Body::State {
                machine,
                container,
                kind,
            } => EntityData::State {
                machine: resolve(machine)?,
                container: resolve_opt(container)?,
                kind: *kind,
            },
            Body::Transition {
                machine,
                source,
                target,
                guard,
                effect,
                trigger,
            } => EntityData::Transition {
                machine: resolve(machine)?,
                source: resolve(source)?,
                target: resolve(target)?,
                guard: guard.clone(),
                effect: resolve_opt(effect)?,
                trigger: resolve_opt(trigger)?,
            },
        };

        Ok(Entity::new(self.id.clone(), data)
            .with_name(self.name.clone())
            .with_package(resolve_opt(&self.package)?))
    }
}

//! Entity kinds and their payloads.
//!
//! Every entity shares a small header (id, name, owning package, stereotypes)
//! and carries one [`EntityData`] variant with the kind-specific fields.
//! References between committed entities are [`EntityRef`] handles into the
//! [`Model`](super::Model) arena, never id strings.

use std::fmt;

use crate::base::XmiId;

// ============================================================================
// HANDLES
// ============================================================================

/// Handle of a committed entity.
///
/// The index is also the creation order: an entity created later always has
/// a larger handle, which gives deterministic iteration everywhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityRef(u32);

impl EntityRef {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position in the arena (and in creation order).
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// KINDS
// ============================================================================

/// The kind of an entity, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    Model,
    Package,
    DataType,
    Class,
    Enumeration,
    EnumerationLiteral,
    Attribute,
    Operation,
    Parameter,
    Association,
    AssociationEnd,
    Generalization,
    Stereotype,
    TagDefinition,
    TaggedValue,
    UseCase,
    Actor,
    StateMachine,
    State,
    Transition,
    Action,
    Event,
}

impl EntityKind {
    /// Whether an entity of this kind also counts as `other`.
    ///
    /// `Class` and `Enumeration` are data types.
    pub fn is_a(self, other: EntityKind) -> bool {
        self == other
            || (other == EntityKind::DataType
                && matches!(self, EntityKind::Class | EntityKind::Enumeration))
    }

    /// Attributes and operations.
    pub fn is_member(self) -> bool {
        matches!(self, EntityKind::Attribute | EntityKind::Operation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Model => "Model",
            EntityKind::Package => "Package",
            EntityKind::DataType => "DataType",
            EntityKind::Class => "Class",
            EntityKind::Enumeration => "Enumeration",
            EntityKind::EnumerationLiteral => "EnumerationLiteral",
            EntityKind::Attribute => "Attribute",
            EntityKind::Operation => "Operation",
            EntityKind::Parameter => "Parameter",
            EntityKind::Association => "Association",
            EntityKind::AssociationEnd => "AssociationEnd",
            EntityKind::Generalization => "Generalization",
            EntityKind::Stereotype => "Stereotype",
            EntityKind::TagDefinition => "TagDefinition",
            EntityKind::TaggedValue => "TaggedValue",
            EntityKind::UseCase => "UseCase",
            EntityKind::Actor => "Actor",
            EntityKind::StateMachine => "StateMachine",
            EntityKind::State => "State",
            EntityKind::Transition => "Transition",
            EntityKind::Action => "Action",
            EntityKind::Event => "Event",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VALUE TYPES
// ============================================================================

/// Lower/upper bound pair of an association end or attribute.
///
/// `upper == None` is the unbounded `*` (serialized as `-1`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiplicityRange {
    pub lower: u32,
    pub upper: Option<u32>,
}

impl MultiplicityRange {
    pub const fn new(lower: u32, upper: Option<u32>) -> Self {
        Self { lower, upper }
    }

    /// Parse the `lower`/`upper` attribute pair of a `MultiplicityRange`.
    pub fn parse(lower: &str, upper: &str) -> Option<Self> {
        let lower = lower.trim().parse::<u32>().ok()?;
        let upper = match upper.trim() {
            "-1" | "*" => None,
            value => Some(value.parse::<u32>().ok()?),
        };
        Some(Self { lower, upper })
    }

    pub fn is_unbounded(&self) -> bool {
        self.upper.is_none()
    }
}

impl fmt::Display for MultiplicityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "({},{})", self.lower, upper),
            None => write!(f, "({},-1)", self.lower),
        }
    }
}

/// Aggregation kind of an association end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Aggregation {
    #[default]
    None,
    Aggregate,
    Composite,
}

impl Aggregation {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "aggregate" => Some(Self::Aggregate),
            "composite" => Some(Self::Composite),
            _ => None,
        }
    }
}

/// Direction of an operation parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParameterDirection {
    #[default]
    In,
    Out,
    InOut,
    Return,
}

impl ParameterDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "inout" => Some(Self::InOut),
            "return" => Some(Self::Return),
            _ => None,
        }
    }
}

/// Kind of a pseudostate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PseudoKind {
    Initial,
    DeepHistory,
    ShallowHistory,
    Join,
    Fork,
    Junction,
    Choice,
    /// A `kind` value outside UML 1.4.
    Unrecognised,
}

impl PseudoKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "initial" => Some(Self::Initial),
            "deepHistory" => Some(Self::DeepHistory),
            "shallowHistory" => Some(Self::ShallowHistory),
            "join" => Some(Self::Join),
            "fork" => Some(Self::Fork),
            "junction" => Some(Self::Junction),
            "choice" => Some(Self::Choice),
            _ => None,
        }
    }
}

/// State variants of a state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    Composite,
    Simple,
    Pseudo(PseudoKind),
    Final,
}

/// Event variants usable as transition triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Call,
    Signal,
}

// ============================================================================
// ENTITIES
// ============================================================================

/// Ordered collections that can grow after an entity is committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Attributes and operations of a class.
    Members,
    /// Literals of an enumeration.
    Literals,
    /// Ends of an association.
    Ends,
    /// Parameters of an operation.
    Parameters,
}

/// Kind-specific payload of an entity.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityData {
    Model,
    Package {
        /// The model this package belongs to.
        model: Option<EntityRef>,
    },
    DataType,
    Class {
        is_abstract: bool,
        members: Vec<EntityRef>,
    },
    Enumeration {
        literals: Vec<EntityRef>,
    },
    EnumerationLiteral {
        enumeration: EntityRef,
    },
    Attribute {
        owner: EntityRef,
        datatype: Option<EntityRef>,
        multiplicity: Option<MultiplicityRange>,
    },
    Operation {
        owner: EntityRef,
        parameters: Vec<EntityRef>,
    },
    Parameter {
        operation: EntityRef,
        datatype: Option<EntityRef>,
        direction: ParameterDirection,
    },
    Association {
        ends: Vec<EntityRef>,
    },
    AssociationEnd {
        association: EntityRef,
        participant: EntityRef,
        navigable: bool,
        aggregation: Aggregation,
        multiplicity: Option<MultiplicityRange>,
    },
    Generalization {
        parent: EntityRef,
        child: EntityRef,
    },
    Stereotype,
    TagDefinition,
    TaggedValue {
        definition: EntityRef,
        owner: EntityRef,
        value: String,
    },
    UseCase,
    Actor,
    StateMachine {
        context: Option<EntityRef>,
        top: Option<EntityRef>,
    },
    State {
        machine: EntityRef,
        container: Option<EntityRef>,
        kind: StateKind,
    },
    Transition {
        machine: EntityRef,
        source: EntityRef,
        target: EntityRef,
        guard: Option<String>,
        effect: Option<EntityRef>,
        trigger: Option<EntityRef>,
    },
    Action {
        script: Option<String>,
    },
    Event {
        kind: EventKind,
    },
}

impl EntityData {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityData::Model => EntityKind::Model,
            EntityData::Package { .. } => EntityKind::Package,
            EntityData::DataType => EntityKind::DataType,
            EntityData::Class { .. } => EntityKind::Class,
            EntityData::Enumeration { .. } => EntityKind::Enumeration,
            EntityData::EnumerationLiteral { .. } => EntityKind::EnumerationLiteral,
            EntityData::Attribute { .. } => EntityKind::Attribute,
            EntityData::Operation { .. } => EntityKind::Operation,
            EntityData::Parameter { .. } => EntityKind::Parameter,
            EntityData::Association { .. } => EntityKind::Association,
            EntityData::AssociationEnd { .. } => EntityKind::AssociationEnd,
            EntityData::Generalization { .. } => EntityKind::Generalization,
            EntityData::Stereotype => EntityKind::Stereotype,
            EntityData::TagDefinition => EntityKind::TagDefinition,
            EntityData::TaggedValue { .. } => EntityKind::TaggedValue,
            EntityData::UseCase => EntityKind::UseCase,
            EntityData::Actor => EntityKind::Actor,
            EntityData::StateMachine { .. } => EntityKind::StateMachine,
            EntityData::State { .. } => EntityKind::State,
            EntityData::Transition { .. } => EntityKind::Transition,
            EntityData::Action { .. } => EntityKind::Action,
            EntityData::Event { .. } => EntityKind::Event,
        }
    }

    /// The growable collection of this payload, if it has one of that kind.
    pub(crate) fn collection_mut(&mut self, collection: Collection) -> Option<&mut Vec<EntityRef>> {
        match (self, collection) {
            (EntityData::Class { members, .. }, Collection::Members) => Some(members),
            (EntityData::Enumeration { literals }, Collection::Literals) => Some(literals),
            (EntityData::Association { ends }, Collection::Ends) => Some(ends),
            (EntityData::Operation { parameters, .. }, Collection::Parameters) => Some(parameters),
            _ => None,
        }
    }
}

/// A committed entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub xmi_id: XmiId,
    pub name: Option<String>,
    /// Owning package (the enclosing package for packages themselves).
    pub package: Option<EntityRef>,
    pub stereotypes: Vec<EntityRef>,
    pub data: EntityData,
}

impl Entity {
    pub fn new(xmi_id: impl Into<XmiId>, data: EntityData) -> Self {
        Self {
            xmi_id: xmi_id.into(),
            name: None,
            package: None,
            stereotypes: Vec::new(),
            data,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_package(mut self, package: Option<EntityRef>) -> Self {
        self.package = package;
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.data.kind()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The name, or the id for anonymous entities.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.xmi_id.as_str())
    }
}

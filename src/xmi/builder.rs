//! Classified events → blueprints, appends and sets.

use crate::base::constants::{ATTR_HREF, ATTR_ID, ATTR_IDREF};
use crate::error::ModelError;
use crate::model::{
    Aggregation, Collection, EntityData, EventKind, Model, MultiplicityRange, ParameterDirection,
    PseudoKind, StateKind,
};
use crate::resolve::{Blueprint, Body, Ref, Resolver, SetValue};
use crate::source::DocumentId;

use super::classify::{ClassifiedEvent, EventHandler, Phase, RefKind, UmlTag, XmiElement};
use super::context::ParserContext;

/// State of the document an href points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalDocument {
    /// Fully loaded, now or by an earlier load.
    Loaded,
    /// An enclosing load is still reading it.
    Loading,
}

/// What the builder needs from the session that owns the model.
pub trait DocumentSession {
    /// The committed model and the resolver of the current load.
    fn parts(&mut self) -> (&mut Model, &mut Resolver);

    /// Load the document behind `url` (relative to `from`) before the
    /// current element's reference is used. Must not reload documents
    /// already loaded or being loaded.
    fn load_external(&mut self, url: &str, from: &DocumentId) -> Result<ExternalDocument, ModelError>;
}

/// Turns the events of one document into entities.
pub struct DocumentBuilder<'s, S: DocumentSession> {
    session: &'s mut S,
    document: DocumentId,
    ctx: ParserContext,
}

impl<'s, S: DocumentSession> DocumentBuilder<'s, S> {
    pub fn new(session: &'s mut S, document: DocumentId) -> Self {
        Self {
            session,
            document,
            ctx: ParserContext::new(),
        }
    }

    // ── Resolver access ─────────────────────────────────────────────

    fn create(&mut self, blueprint: Blueprint) -> Result<Ref, ModelError> {
        let (model, resolver) = self.session.parts();
        resolver.create(model, blueprint)
    }

    fn append(&mut self, parent: Ref, collection: Collection, child: Ref) -> Result<(), ModelError> {
        let (model, resolver) = self.session.parts();
        resolver.append(model, parent, collection, child)
    }

    fn set(&mut self, target: Ref, value: SetValue) -> Result<(), ModelError> {
        let (model, resolver) = self.session.parts();
        resolver.set(model, target, value)
    }

    /// Blueprint of a described element in the current package.
    fn describe(&self, element: &XmiElement, body: Body) -> Result<Blueprint, ModelError> {
        let id = element.require(ATTR_ID)?;
        Ok(Blueprint::new(id, body)
            .with_name(element.display_name())
            .with_package(self.ctx.package()))
    }

    /// The target of a reference element, loading its document if needed.
    fn reference(&mut self, kind: RefKind, element: &XmiElement) -> Result<Option<Ref>, ModelError> {
        match kind {
            RefKind::Reference => Ok(Some(Ref::from(element.require(ATTR_IDREF)?))),
            RefKind::ExternalReference => {
                let href = element.require(ATTR_HREF)?;
                let Some((url, fragment)) = href.split_once('#') else {
                    tracing::trace!(href, "external reference without fragment");
                    return Ok(None);
                };
                if !url.is_empty() {
                    let from = self.document.clone();
                    if self.session.load_external(url, &from)? == ExternalDocument::Loading {
                        let (_, resolver) = self.session.parts();
                        resolver.await_outer(fragment);
                    }
                }
                Ok(Some(Ref::from(fragment)))
            }
            RefKind::Description | RefKind::Plain => Ok(None),
        }
    }

    // ── Description handlers ────────────────────────────────────────

    fn description_start(&mut self, event: &ClassifiedEvent<'_>) -> Result<(), ModelError> {
        let element = event.element;
        match event.tag {
            UmlTag::Model => {
                let model = self.create(self.describe(element, Body::Plain(EntityData::Model))?)?;
                self.ctx.model = Some(model);
            }
            UmlTag::Package => {
                let body = Body::Package {
                    model: self.ctx.model.clone(),
                };
                let package = self.create(self.describe(element, body)?)?;
                self.ctx.packages.push(package);
            }
            UmlTag::Class => {
                let label = element
                    .display_name()
                    .or_else(|| element.id().map(str::to_string))
                    .unwrap_or_default();
                if let Some((_, outer)) = &self.ctx.class {
                    return Err(ModelError::structure(format!(
                        "Class {label} is inside the class {outer}"
                    )));
                }
                let body = Body::Plain(EntityData::Class {
                    is_abstract: element.flag("isAbstract"),
                    members: Vec::new(),
                });
                let class = self.create(self.describe(element, body)?)?;
                self.ctx.class = Some((class, label));
            }
            UmlTag::DataType => {
                self.create(self.describe(element, Body::Plain(EntityData::DataType))?)?;
            }
            UmlTag::Enumeration => {
                let body = Body::Plain(EntityData::Enumeration {
                    literals: Vec::new(),
                });
                let enumeration = self.create(self.describe(element, body)?)?;
                self.ctx.enumeration = Some(enumeration);
            }
            UmlTag::EnumerationLiteral => {
                let Some(enumeration) = self.ctx.enumeration.clone() else {
                    tracing::trace!(id = ?element.id(), "literal outside an enumeration");
                    return Ok(());
                };
                let body = Body::EnumerationLiteral {
                    enumeration: enumeration.clone(),
                };
                let literal = self.create(self.describe(element, body)?)?;
                self.append(enumeration, Collection::Literals, literal)?;
            }
            UmlTag::Operation => {
                let Some(owner) = self.ctx.class_ref() else {
                    tracing::trace!(id = ?element.id(), "operation outside a class");
                    return Ok(());
                };
                let body = Body::Operation {
                    owner: owner.clone(),
                };
                let operation = self.create(self.describe(element, body)?)?;
                self.append(owner, Collection::Members, operation.clone())?;
                self.ctx.operation = Some(operation);
            }
            UmlTag::Attribute | UmlTag::Parameter | UmlTag::AssociationEnd => {
                self.ctx.enter_typed_scope();
            }
            UmlTag::Generalization => {
                self.ctx.enter_typed_scope();
                self.ctx.generalization_parent = None;
                self.ctx.generalization_child = None;
            }
            UmlTag::Association => {
                let body = Body::Plain(EntityData::Association { ends: Vec::new() });
                let association = self.create(self.describe(element, body)?)?;
                self.ctx.association = Some(association);
            }
            UmlTag::MultiplicityRange => {
                let lower = element.require("lower")?;
                let upper = element.require("upper")?;
                self.ctx.range = MultiplicityRange::parse(lower, upper);
                if self.ctx.range.is_none() {
                    return Err(ModelError::structure(format!(
                        "Invalid multiplicity range {lower}..{upper}"
                    )));
                }
            }
            UmlTag::Stereotype => {
                self.create(self.describe(element, Body::Plain(EntityData::Stereotype))?)?;
            }
            UmlTag::TagDefinition => {
                self.create(self.describe(element, Body::Plain(EntityData::TagDefinition))?)?;
            }
            UmlTag::TaggedValue => {
                self.ctx.tag_definition = None;
                self.ctx.tag_value = None;
            }
            UmlTag::UseCase => {
                self.create(self.describe(element, Body::Plain(EntityData::UseCase))?)?;
            }
            UmlTag::Actor => {
                self.create(self.describe(element, Body::Plain(EntityData::Actor))?)?;
            }
            UmlTag::StateMachine => {
                let body = Body::Plain(EntityData::StateMachine {
                    context: None,
                    top: None,
                });
                let machine = self.create(self.describe(element, body)?)?;
                self.ctx.machine = Some(machine);
                self.ctx.composite_states.clear();
            }
            tag if tag.is_state() => self.state_start(element, tag)?,
            UmlTag::Transition => {
                self.ctx.transition = Default::default();
            }
            UmlTag::BooleanExpression => {
                self.ctx.transition.guard = element.attr("body").map(str::to_string);
            }
            UmlTag::CallAction => {
                self.ctx.action_script = None;
            }
            UmlTag::ActionExpression => {
                self.ctx.action_script = element.attr("body").map(str::to_string);
            }
            UmlTag::CallEvent | UmlTag::SignalEvent => {
                let kind = if event.tag == UmlTag::CallEvent {
                    EventKind::Call
                } else {
                    EventKind::Signal
                };
                self.create(self.describe(element, Body::Plain(EntityData::Event { kind }))?)?;
            }
            tag => {
                tracing::trace!(?tag, name = %element.name, "unhandled description start");
            }
        }
        Ok(())
    }

    fn state_start(&mut self, element: &XmiElement, tag: UmlTag) -> Result<(), ModelError> {
        let Some(machine) = self.ctx.machine.clone() else {
            tracing::trace!(id = ?element.id(), "state outside a state machine");
            return Ok(());
        };
        let kind = match tag {
            UmlTag::CompositeState => StateKind::Composite,
            UmlTag::FinalState => StateKind::Final,
            UmlTag::Pseudostate => StateKind::Pseudo(pseudo_kind(element)),
            _ => StateKind::Simple,
        };
        let container = self.ctx.composite_states.last().cloned();
        let body = Body::State {
            machine: machine.clone(),
            container: container.clone(),
            kind,
        };
        let state = self.create(self.describe(element, body)?)?;
        if tag == UmlTag::CompositeState {
            if container.is_none() {
                self.set(machine, SetValue::Top(state.clone()))?;
            }
            self.ctx.composite_states.push(state);
        }
        Ok(())
    }

    fn description_end(&mut self, event: &ClassifiedEvent<'_>) -> Result<(), ModelError> {
        let element = event.element;
        match event.tag {
            UmlTag::Package => {
                self.ctx.packages.pop();
            }
            UmlTag::Class => self.ctx.class = None,
            UmlTag::Enumeration => self.ctx.enumeration = None,
            UmlTag::Operation => self.ctx.operation = None,
            UmlTag::Association => self.ctx.association = None,
            UmlTag::Attribute => {
                let result = self.attribute_end(element);
                self.ctx.leave_typed_scope();
                result?;
            }
            UmlTag::Parameter => {
                let result = self.parameter_end(element);
                self.ctx.leave_typed_scope();
                result?;
            }
            UmlTag::AssociationEnd => {
                let result = self.association_end(element);
                self.ctx.leave_typed_scope();
                result?;
            }
            UmlTag::Generalization => {
                let result = self.generalization_end(element);
                self.ctx.leave_typed_scope();
                result?;
            }
            UmlTag::TaggedValue => self.tagged_value_end(event)?,
            UmlTag::StateMachine => {
                self.ctx.machine = None;
                self.ctx.composite_states.clear();
            }
            UmlTag::CompositeState => {
                self.ctx.composite_states.pop();
            }
            UmlTag::Transition => self.transition_end(element)?,
            UmlTag::CallAction => {
                let body = Body::Plain(EntityData::Action {
                    script: self.ctx.action_script.take(),
                });
                let action = self.create(self.describe(element, body)?)?;
                if self.ctx.machine.is_some() {
                    self.ctx.transition.effect = Some(action);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn attribute_end(&mut self, element: &XmiElement) -> Result<(), ModelError> {
        let Some(owner) = self.ctx.class_ref() else {
            tracing::trace!(id = ?element.id(), "attribute outside a class");
            return Ok(());
        };
        let body = Body::Attribute {
            owner: owner.clone(),
            datatype: self.ctx.datatype.take(),
            multiplicity: self.ctx.range.take(),
        };
        let attribute = self.create(self.describe(element, body)?)?;
        self.append(owner, Collection::Members, attribute)
    }

    fn parameter_end(&mut self, element: &XmiElement) -> Result<(), ModelError> {
        let Some(operation) = self.ctx.operation.clone() else {
            tracing::trace!(id = ?element.id(), "parameter outside an operation");
            return Ok(());
        };
        let body = Body::Parameter {
            operation: operation.clone(),
            datatype: self.ctx.datatype.take(),
            direction: element
                .attr("kind")
                .and_then(ParameterDirection::parse)
                .unwrap_or_default(),
        };
        let parameter = self.create(self.describe(element, body)?)?;
        self.append(operation, Collection::Parameters, parameter)
    }

    fn association_end(&mut self, element: &XmiElement) -> Result<(), ModelError> {
        let Some(association) = self.ctx.association.clone() else {
            tracing::trace!(id = ?element.id(), "association end outside an association");
            return Ok(());
        };
        let participant = self.ctx.datatype.take().ok_or_else(|| {
            ModelError::structure(format!(
                "Association end {} has no participant",
                element.id().unwrap_or("?")
            ))
        })?;
        let body = Body::AssociationEnd {
            association: association.clone(),
            participant,
            navigable: element.flag("isNavigable"),
            aggregation: element
                .attr("aggregation")
                .and_then(Aggregation::parse)
                .unwrap_or_default(),
            multiplicity: self.ctx.range.take(),
        };
        let end = self.create(self.describe(element, body)?)?;
        self.append(association, Collection::Ends, end)
    }

    fn generalization_end(&mut self, element: &XmiElement) -> Result<(), ModelError> {
        let (Some(parent), Some(child)) = (
            self.ctx.generalization_parent.take(),
            self.ctx.generalization_child.take(),
        ) else {
            return Err(ModelError::structure(format!(
                "Generalization {} needs a parent and a child",
                element.id().unwrap_or("?")
            )));
        };
        let blueprint = self.describe(element, Body::Generalization { parent, child })?;
        self.create(blueprint).map(|_| ())
    }

    fn tagged_value_end(&mut self, event: &ClassifiedEvent<'_>) -> Result<(), ModelError> {
        let definition = self.ctx.tag_definition.take();
        let value = self.ctx.tag_value.take().unwrap_or_default();
        let Some(owner) = event.owners.last().filter(|o| o.tag.creates_entity()) else {
            tracing::trace!(id = ?event.element.id(), "tagged value without an entity owner");
            return Ok(());
        };
        let Some(definition) = definition else {
            tracing::trace!(id = ?event.element.id(), "tagged value without a definition");
            return Ok(());
        };
        let id = event.element.require(ATTR_ID)?;
        let blueprint = Blueprint::new(
            id,
            Body::TaggedValue {
                definition,
                owner: Ref::from(owner.id.as_str()),
                value,
            },
        );
        self.create(blueprint).map(|_| ())
    }

    fn transition_end(&mut self, element: &XmiElement) -> Result<(), ModelError> {
        let Some(machine) = self.ctx.machine.clone() else {
            tracing::trace!(id = ?element.id(), "transition outside a state machine");
            return Ok(());
        };
        let slots = std::mem::take(&mut self.ctx.transition);
        let label = element.id().unwrap_or("?").to_string();
        let source = slots
            .source
            .ok_or_else(|| ModelError::structure(format!("Transition {label} has no source")))?;
        let target = slots
            .target
            .ok_or_else(|| ModelError::structure(format!("Transition {label} has no target")))?;
        let body = Body::Transition {
            machine,
            source,
            target,
            guard: slots.guard,
            effect: slots.effect,
            trigger: slots.trigger,
        };
        let blueprint = self.describe(element, body)?;
        self.create(blueprint).map(|_| ())
    }

    // ── Reference and property handlers ─────────────────────────────

    fn reference_start(&mut self, event: &ClassifiedEvent<'_>) -> Result<(), ModelError> {
        let Some(target) = self.reference(event.kind, event.element)? else {
            return Ok(());
        };
        match event.tag {
            tag if tag.is_classifier() => self.ctx.datatype = Some(target),
            tag if tag.is_state() => self.ctx.state_ref = Some(target),
            UmlTag::CallEvent | UmlTag::SignalEvent => self.ctx.event_ref = Some(target),
            UmlTag::TagDefinition => self.ctx.tag_definition = Some(target),
            UmlTag::Stereotype => match self.ctx.stereotype_lists.last_mut() {
                Some(list) => list.push(target),
                None => tracing::trace!(?target, "stereotype reference outside a list"),
            },
            tag => tracing::trace!(?tag, ?target, "unhandled reference"),
        }
        Ok(())
    }

    fn plain_end(&mut self, event: &ClassifiedEvent<'_>) -> Result<(), ModelError> {
        match event.tag {
            UmlTag::ModelElementStereotype => {
                let list = self.ctx.stereotype_lists.pop().unwrap_or_default();
                match event.owners.last().filter(|o| o.tag.creates_entity()) {
                    Some(owner) => {
                        let target = Ref::from(owner.id.as_str());
                        self.set(target, SetValue::Stereotypes(list))?;
                    }
                    None => tracing::trace!("stereotypes without an entity owner"),
                }
            }
            UmlTag::GeneralizationChild => {
                self.ctx.generalization_child = self.ctx.datatype.take();
            }
            UmlTag::GeneralizationParent => {
                self.ctx.generalization_parent = self.ctx.datatype.take();
            }
            UmlTag::TaggedValueDataValue => {
                self.ctx.tag_value = Some(event.element.text.clone());
            }
            UmlTag::StateMachineContext => {
                let context = self.ctx.datatype.take();
                if let (Some(machine), Some(context)) = (self.ctx.machine.clone(), context) {
                    self.set(machine, SetValue::Context(context))?;
                }
            }
            UmlTag::TransitionSource => self.ctx.transition.source = self.ctx.state_ref.take(),
            UmlTag::TransitionTarget => self.ctx.transition.target = self.ctx.state_ref.take(),
            UmlTag::TransitionTrigger => self.ctx.transition.trigger = self.ctx.event_ref.take(),
            _ => {}
        }
        Ok(())
    }
}

/// A missing `kind` means an initial state.
fn pseudo_kind(element: &XmiElement) -> PseudoKind {
    let Some(value) = element.attr("kind") else {
        return PseudoKind::Initial;
    };
    PseudoKind::parse(value).unwrap_or_else(|| {
        tracing::trace!(id = ?element.id(), kind = value, "unrecognised pseudostate kind");
        PseudoKind::Unrecognised
    })
}

impl<S: DocumentSession> EventHandler for DocumentBuilder<'_, S> {
    fn handle(&mut self, event: &ClassifiedEvent<'_>) -> Result<(), ModelError> {
        match (event.kind, event.phase) {
            (RefKind::Description, Phase::Start) => self.description_start(event),
            (RefKind::Description, Phase::End) => self.description_end(event),
            (RefKind::Reference | RefKind::ExternalReference, Phase::Start) => {
                self.reference_start(event)
            }
            (RefKind::Plain, Phase::Start) => {
                if event.tag == UmlTag::ModelElementStereotype {
                    self.ctx.stereotype_lists.push(Vec::new());
                }
                Ok(())
            }
            (RefKind::Plain, Phase::End) => self.plain_end(event),
            (RefKind::Reference | RefKind::ExternalReference, Phase::End) => Ok(()),
        }
    }
}

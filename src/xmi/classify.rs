//! Stream classifier: quick-xml events → [`ClassifiedEvent`]s.
//!
//! Every element inside the `XMI` envelope is classified by how it refers to
//! a model element (its [`RefKind`]), the [`Phase`] of the event and its
//! [`UmlTag`]. Self-closing elements produce a start and an end event. End
//! events carry the start's attributes and the text accumulated in between.

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::base::constants::{ATTR_HREF, ATTR_ID, ATTR_IDREF, XMI_ENVELOPE};
use crate::error::ModelError;

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// How an element refers to a model element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// Defines an element (`xmi.id`).
    Description,
    /// Points at an element of the same session (`xmi.idref`).
    Reference,
    /// Points into another document (`href`).
    ExternalReference,
    /// Property holder or wrapper without identity.
    Plain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    End,
}

/// UML 1.4 element vocabulary, by local name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UmlTag {
    Model,
    Package,
    Class,
    DataType,
    Enumeration,
    EnumerationLiteral,
    Attribute,
    Operation,
    Parameter,
    Association,
    AssociationEnd,
    MultiplicityRange,
    Generalization,
    GeneralizationChild,
    GeneralizationParent,
    Stereotype,
    ModelElementStereotype,
    TagDefinition,
    TaggedValue,
    TaggedValueDataValue,
    UseCase,
    Actor,
    StateMachine,
    StateMachineContext,
    StateMachineTop,
    CompositeState,
    SimpleState,
    Pseudostate,
    FinalState,
    Transition,
    TransitionSource,
    TransitionTarget,
    TransitionGuard,
    TransitionEffect,
    TransitionTrigger,
    Guard,
    BooleanExpression,
    CallAction,
    ActionExpression,
    CallEvent,
    SignalEvent,
    Other,
}

impl UmlTag {
    pub fn from_local_name(name: &str) -> Self {
        match name {
            "Model" => Self::Model,
            "Package" => Self::Package,
            "Class" => Self::Class,
            "DataType" => Self::DataType,
            "Enumeration" => Self::Enumeration,
            "EnumerationLiteral" => Self::EnumerationLiteral,
            "Attribute" => Self::Attribute,
            "Operation" => Self::Operation,
            "Parameter" => Self::Parameter,
            "Association" => Self::Association,
            "AssociationEnd" => Self::AssociationEnd,
            "MultiplicityRange" => Self::MultiplicityRange,
            "Generalization" => Self::Generalization,
            "Generalization.child" => Self::GeneralizationChild,
            "Generalization.parent" => Self::GeneralizationParent,
            "Stereotype" => Self::Stereotype,
            "ModelElement.stereotype" => Self::ModelElementStereotype,
            "TagDefinition" => Self::TagDefinition,
            "TaggedValue" => Self::TaggedValue,
            "TaggedValue.dataValue" => Self::TaggedValueDataValue,
            "UseCase" => Self::UseCase,
            "Actor" => Self::Actor,
            "StateMachine" => Self::StateMachine,
            "StateMachine.context" => Self::StateMachineContext,
            "StateMachine.top" => Self::StateMachineTop,
            "CompositeState" => Self::CompositeState,
            "SimpleState" => Self::SimpleState,
            "Pseudostate" => Self::Pseudostate,
            "FinalState" => Self::FinalState,
            "Transition" => Self::Transition,
            "Transition.source" => Self::TransitionSource,
            "Transition.target" => Self::TransitionTarget,
            "Transition.guard" => Self::TransitionGuard,
            "Transition.effect" => Self::TransitionEffect,
            "Transition.trigger" => Self::TransitionTrigger,
            "Guard" => Self::Guard,
            "BooleanExpression" => Self::BooleanExpression,
            "CallAction" => Self::CallAction,
            "ActionExpression" => Self::ActionExpression,
            "CallEvent" => Self::CallEvent,
            "SignalEvent" => Self::SignalEvent,
            _ => Self::Other,
        }
    }

    /// Whether a description of this tag becomes an entity.
    pub fn creates_entity(self) -> bool {
        matches!(
            self,
            Self::Model
                | Self::Package
                | Self::Class
                | Self::DataType
                | Self::Enumeration
                | Self::EnumerationLiteral
                | Self::Attribute
                | Self::Operation
                | Self::Parameter
                | Self::Association
                | Self::AssociationEnd
                | Self::Generalization
                | Self::Stereotype
                | Self::TagDefinition
                | Self::TaggedValue
                | Self::UseCase
                | Self::Actor
                | Self::StateMachine
                | Self::CompositeState
                | Self::SimpleState
                | Self::Pseudostate
                | Self::FinalState
                | Self::Transition
                | Self::CallAction
                | Self::CallEvent
                | Self::SignalEvent
        )
    }

    /// State variants.
    pub fn is_state(self) -> bool {
        matches!(
            self,
            Self::CompositeState | Self::SimpleState | Self::Pseudostate | Self::FinalState
        )
    }

    /// Elements that can type an attribute, parameter or association end.
    pub fn is_classifier(self) -> bool {
        matches!(
            self,
            Self::Class | Self::DataType | Self::Enumeration | Self::UseCase | Self::Actor
        )
    }
}

/// An element with its attributes and text content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmiElement {
    /// Local name (namespace prefix stripped).
    pub name: String,
    pub attrs: IndexMap<String, String>,
    pub text: String,
}

impl XmiElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// A required attribute.
    pub fn require(&self, name: &'static str) -> Result<&str, ModelError> {
        self.attr(name)
            .ok_or_else(|| ModelError::missing_attribute(self.name.clone(), name))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr(ATTR_ID)
    }

    /// The `name` attribute; empty names count as absent.
    pub fn display_name(&self) -> Option<String> {
        self.attr("name")
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }

    /// Boolean attribute (`"true"`), false when absent.
    pub fn flag(&self, name: &str) -> bool {
        self.attr(name) == Some("true")
    }

    pub fn kind(&self) -> RefKind {
        if self.attrs.contains_key(ATTR_ID) {
            RefKind::Description
        } else if self.attrs.contains_key(ATTR_IDREF) {
            RefKind::Reference
        } else if self.attrs.contains_key(ATTR_HREF) {
            RefKind::ExternalReference
        } else {
            RefKind::Plain
        }
    }
}

/// An enclosing description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owner {
    pub id: String,
    pub tag: UmlTag,
}

/// One classified event.
#[derive(Debug)]
pub struct ClassifiedEvent<'a> {
    pub kind: RefKind,
    pub phase: Phase,
    pub tag: UmlTag,
    pub element: &'a XmiElement,
    /// Enclosing descriptions, innermost last. On a description's start the
    /// element itself is already on top; on its end it has been removed.
    pub owners: &'a [Owner],
}

/// Receiver of classified events.
pub trait EventHandler {
    fn handle(&mut self, event: &ClassifiedEvent<'_>) -> Result<(), ModelError>;
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Drives quick-xml over one document.
#[derive(Debug)]
pub struct Classifier {
    document: String,
    open: Vec<(XmiElement, RefKind, UmlTag)>,
    owners: Vec<Owner>,
    inside_envelope: bool,
}

impl Classifier {
    /// `document` names the input in error messages.
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            open: Vec::new(),
            owners: Vec::new(),
            inside_envelope: false,
        }
    }

    /// Classify every element of `input`, feeding `handler`.
    ///
    /// Errors are reported with the document name and 1-based line.
    pub fn run<H: EventHandler>(mut self, input: &[u8], handler: &mut H) -> Result<(), ModelError> {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(true);
        let mut lines = LineCounter::default();
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf);
            let line = lines.line_at(input, reader.buffer_position() as usize);
            let step = match event {
                Ok(Event::Start(ref e)) => self.start(e, handler),
                Ok(Event::Empty(ref e)) => self.start(e, handler).and_then(|_| self.end(handler)),
                Ok(Event::End(_)) => self.end(handler),
                Ok(Event::Text(ref t)) => t
                    .unescape()
                    .map_err(|e| ModelError::xml(format!("Text error: {e}")))
                    .map(|text| self.text(&text)),
                Ok(Event::CData(t)) => {
                    let bytes = t.into_inner();
                    self.text(&String::from_utf8_lossy(&bytes));
                    Ok(())
                }
                Ok(Event::Eof) => break,
                Err(e) => Err(ModelError::xml(format!(
                    "XML parse error at position {}: {e}",
                    reader.error_position()
                ))),
                _ => Ok(()),
            };
            step.map_err(|e| e.in_document(self.document.clone(), line))?;
            if self.inside_envelope && self.open.is_empty() {
                // Envelope closed: anything after it is not model content.
                break;
            }
            buf.clear();
        }
        Ok(())
    }

    fn start<H: EventHandler>(&mut self, e: &BytesStart<'_>, handler: &mut H) -> Result<(), ModelError> {
        let local = e.name().local_name();
        let name = std::str::from_utf8(local.as_ref())
            .map_err(|e| ModelError::xml(format!("Invalid tag name: {e}")))?
            .to_string();

        if !self.inside_envelope {
            if name == XMI_ENVELOPE {
                self.inside_envelope = true;
                self.open
                    .push((XmiElement { name, ..Default::default() }, RefKind::Plain, UmlTag::Other));
            }
            return Ok(());
        }

        let mut attrs = IndexMap::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| ModelError::xml(format!("Attribute error: {e}")))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| ModelError::xml(format!("Attribute key error: {e}")))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| ModelError::xml(format!("Attribute value error: {e}")))?
                .to_string();
            attrs.insert(key, value);
        }

        let element = XmiElement {
            name,
            attrs,
            text: String::new(),
        };
        let kind = element.kind();
        let tag = UmlTag::from_local_name(&element.name);

        if kind == RefKind::Description {
            if let Some(id) = element.id() {
                self.owners.push(Owner {
                    id: id.to_string(),
                    tag,
                });
            }
        }
        handler.handle(&ClassifiedEvent {
            kind,
            phase: Phase::Start,
            tag,
            element: &element,
            owners: &self.owners,
        })?;
        self.open.push((element, kind, tag));
        Ok(())
    }

    fn end<H: EventHandler>(&mut self, handler: &mut H) -> Result<(), ModelError> {
        if !self.inside_envelope {
            return Ok(());
        }
        let Some((element, kind, tag)) = self.open.pop() else {
            return Err(ModelError::structure("Unbalanced end tag"));
        };
        if self.open.is_empty() {
            // The envelope itself.
            return Ok(());
        }
        if kind == RefKind::Description {
            self.owners.pop();
        }
        handler.handle(&ClassifiedEvent {
            kind,
            phase: Phase::End,
            tag,
            element: &element,
            owners: &self.owners,
        })
    }

    fn text(&mut self, text: &str) {
        if let Some((element, ..)) = self.open.last_mut() {
            element.text.push_str(text);
        }
    }
}

/// Incremental byte offset → 1-based line number.
#[derive(Debug, Default)]
struct LineCounter {
    offset: usize,
    newlines: usize,
}

impl LineCounter {
    fn line_at(&mut self, input: &[u8], position: usize) -> usize {
        let position = position.min(input.len());
        if position > self.offset {
            self.newlines += input[self.offset..position]
                .iter()
                .filter(|b| **b == b'\n')
                .count();
            self.offset = position;
        }
        self.newlines + 1
    }
}

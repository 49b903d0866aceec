//! Structural checks over a committed model.
//!
//! Validation never mutates the model and may run any number of times.
//! Findings are collected into a [`ValidationReport`] and logged as they are
//! found.

use std::fmt;

use indexmap::IndexMap;

use crate::model::{
    ClassView, EntityKind, EntityRef, EntityView, Model, ModelElement, StateMachineView,
};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Severity {
    Error,
    Warning,
}

/// Codes of the individual checks.
pub mod codes {
    pub const UNNAMED_MACHINE: &str = "E001";
    pub const MACHINE_WITHOUT_CONTEXT: &str = "E002";
    pub const INITIAL_STATE_COUNT: &str = "E003";
    pub const NO_FINAL_STATE: &str = "E004";
    pub const DUPLICATE_FIELD: &str = "E005";
    /// The same declaration inherited along two paths.
    pub const REPEATED_INHERITANCE: &str = "W001";
}

/// One finding about one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    /// Id of the offending entity.
    pub entity: String,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: &'static str, entity: &EntityView<'_>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            entity: entity.id().to_string(),
            message: message.into(),
        }
    }

    pub fn warning(code: &'static str, entity: &EntityView<'_>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, entity, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}[{}] {}: {}", self.code, self.entity, self.message)
    }
}

/// Outcome of a validation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// True when no error was found. Warnings do not fail a model.
    pub fn passed(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Runs every check over a model.
pub struct Validator<'m> {
    model: &'m Model,
    report: ValidationReport,
}

impl<'m> Validator<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            report: ValidationReport::default(),
        }
    }

    pub fn run(mut self) -> ValidationReport {
        let model = self.model;
        for machine in model
            .iter_kind(EntityKind::StateMachine)
            .filter_map(|v| v.as_state_machine())
        {
            self.check_state_machine(machine);
        }
        for class in model.iter_kind(EntityKind::Class).filter_map(|v| v.as_class()) {
            self.check_field_names(class);
        }
        tracing::debug!(
            diagnostics = self.report.diagnostics.len(),
            passed = self.report.passed(),
            "validation finished"
        );
        self.report
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!(
                code = diagnostic.code,
                entity = %diagnostic.entity,
                "{}",
                diagnostic.message
            ),
            Severity::Warning => tracing::warn!(
                code = diagnostic.code,
                entity = %diagnostic.entity,
                "{}",
                diagnostic.message
            ),
        }
        self.report.diagnostics.push(diagnostic);
    }

    // ── State machines ──────────────────────────────────────────────

    fn check_state_machine(&mut self, machine: StateMachineView<'m>) {
        let view = machine.inner;
        let display = machine.qualified_name(".");
        if machine.name().is_none() {
            self.push(Diagnostic::error(
                codes::UNNAMED_MACHINE,
                &view,
                format!("State machine {} has no name", view.id()),
            ));
        }
        if machine.context().is_none() {
            self.push(Diagnostic::error(
                codes::MACHINE_WITHOUT_CONTEXT,
                &view,
                format!("State machine {display} does not describe any entity"),
            ));
        }
        let initial = machine.initial_states().len();
        if initial != 1 {
            self.push(Diagnostic::error(
                codes::INITIAL_STATE_COUNT,
                &view,
                format!("State machine {display} has {initial} initial states, expected one"),
            ));
        }
        if machine.final_states().is_empty() {
            self.push(Diagnostic::error(
                codes::NO_FINAL_STATE,
                &view,
                format!("State machine {display} has no final state"),
            ));
        }
    }

    // ── Field names ─────────────────────────────────────────────────

    /// Attributes and relations of a class, own and inherited, must not
    /// share a name.
    fn check_field_names(&mut self, class: ClassView<'m>) {
        let mut fields: IndexMap<&'m str, Vec<EntityRef>> = IndexMap::new();
        let attributes = class.all_attributes().into_iter().map(|a| a.inner);
        let relations = class
            .all_associations(&Default::default())
            .into_iter()
            .map(|end| end.inner);
        for field in attributes.chain(relations) {
            if let Some(name) = field.name() {
                fields.entry(name).or_default().push(field.handle());
            }
        }

        let owner = class.inner;
        for (name, declarations) in fields {
            if declarations.len() < 2 {
                continue;
            }
            let mut distinct = declarations.clone();
            distinct.sort();
            distinct.dedup();
            if distinct.len() > 1 {
                self.push(Diagnostic::error(
                    codes::DUPLICATE_FIELD,
                    &owner,
                    format!(
                        "Class {} declares field {name} {} times",
                        class.qualified_name("."),
                        distinct.len()
                    ),
                ));
            } else {
                self.push(Diagnostic::warning(
                    codes::REPEATED_INHERITANCE,
                    &owner,
                    format!(
                        "Class {} inherits field {name} along several paths",
                        class.qualified_name(".")
                    ),
                ));
            }
        }
    }
}

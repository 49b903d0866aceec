//! Association multiplicity inference.
//!
//! Each end gets a cardinality from its aggregation and range:
//!
//! ```text
//! aggregation          one                    many
//! aggregate/composite  unset, (0,1), (1,1)    (0,*), (1,*)
//! none                 (0,1), (1,1)           unset, (0,*), (1,*)
//! ```
//!
//! The relation of an end is `<partner>2<self>`. Anything outside the table
//! is reported, never guessed.

use std::fmt;

use crate::base::constants::tags;
use crate::error::ModelError;
use crate::model::{
    Aggregation, AssociationEndView, EntityView, ModelElement, MultiplicityRange,
};

/// Kind of relation an association end represents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Multiplicity {
    One2One,
    One2Many,
    Many2One,
    Many2Many,
    /// Computed field following `path` from the holder to `target`.
    Related { target: String, path: Vec<String> },
}

impl Multiplicity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Multiplicity::One2One => "one2one",
            Multiplicity::One2Many => "one2many",
            Multiplicity::Many2One => "many2one",
            Multiplicity::Many2Many => "many2many",
            Multiplicity::Related { .. } => "related",
        }
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cardinality {
    One,
    Many,
}

fn cardinality(aggregation: Aggregation, range: Option<MultiplicityRange>) -> Option<Cardinality> {
    let bounds = range.map(|r| (r.lower, r.upper));
    match (aggregation, bounds) {
        (Aggregation::Aggregate | Aggregation::Composite, None | Some((0 | 1, Some(1)))) => {
            Some(Cardinality::One)
        }
        (Aggregation::Aggregate | Aggregation::Composite, Some((0 | 1, None))) => {
            Some(Cardinality::Many)
        }
        (Aggregation::None, Some((0 | 1, Some(1)))) => Some(Cardinality::One),
        (Aggregation::None, None | Some((0 | 1, None))) => Some(Cardinality::Many),
        _ => None,
    }
}

fn end_cardinality(
    end: &AssociationEndView<'_>,
    partner: &AssociationEndView<'_>,
) -> Result<Cardinality, ModelError> {
    cardinality(end.aggregation(), end.multiplicity()).ok_or_else(|| {
        let range = end
            .multiplicity()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unset".to_string());
        ModelError::UnsupportedMultiplicity {
            end: end.label().to_string(),
            participant: participant_label(end),
            partner: partner.label().to_string(),
            partner_participant: participant_label(partner),
            detail: format!(
                "aggregation {:?} with range {range} on {}",
                end.aggregation(),
                end.label()
            ),
        }
    })
}

fn participant_label(end: &AssociationEndView<'_>) -> String {
    end.participant()
        .map(|p| p.label().to_string())
        .unwrap_or_default()
}

/// Classify the relation represented by `end`.
pub fn infer(end: &AssociationEndView<'_>) -> Result<Multiplicity, ModelError> {
    let end_tags = end.tags();
    if let Some(target) = end_tags.get(tags::RELATED_TO) {
        let path = end_tags
            .get(tags::RELATED_BY)
            .ok_or_else(|| ModelError::MissingRelatedPath {
                end: end.label().to_string(),
                target: target.to_string(),
            })?;
        return Ok(Multiplicity::Related {
            target: target.to_string(),
            path: path
                .split('.')
                .map(str::trim)
                .filter(|step| !step.is_empty())
                .map(str::to_string)
                .collect(),
        });
    }

    let partner = end.partner().ok_or_else(|| ModelError::MalformedAssociation {
        id: end
            .association()
            .map(|a| a.inner.id().to_string())
            .unwrap_or_else(|| end.inner.id().to_string()),
        ends: end.swap().len() + 1,
    })?;
    let mine = end_cardinality(end, &partner)?;
    let theirs = end_cardinality(&partner, end)?;
    Ok(match (theirs, mine) {
        (Cardinality::One, Cardinality::One) => Multiplicity::One2One,
        (Cardinality::One, Cardinality::Many) => Multiplicity::One2Many,
        (Cardinality::Many, Cardinality::One) => Multiplicity::Many2One,
        (Cardinality::Many, Cardinality::Many) => Multiplicity::Many2Many,
    })
}

/// Follow a chain of association names from `start`.
///
/// Each step takes the far end named by the step and moves to its
/// participant; `None` when a step has no such relation.
pub fn walk_related<'m, S: AsRef<str>>(start: EntityView<'m>, path: &[S]) -> Option<EntityView<'m>> {
    let mut current = start;
    for step in path {
        current = current.association_by_name(step.as_ref())?.participant()?;
    }
    Some(current)
}

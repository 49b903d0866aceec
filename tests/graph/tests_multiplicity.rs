//! Relation kinds inferred from association ends.

use crate::helpers::host_helpers::*;
use crate::helpers::xmi_fixtures::*;
use rstest::rstest;
use umlgraph::graph::{Multiplicity, infer, walk_related};
use umlgraph::{ModelError, ModelHost};

// =============================================================================
// HELPERS
// =============================================================================

fn end_xml(id: &str, participant: &str, aggregation: &str, bounds: Option<(i32, i32)>, extra: &str) -> String {
    let multiplicity = bounds
        .map(|(lower, upper)| range("AssociationEnd", id, lower, upper))
        .unwrap_or_default();
    format!(
        r#"<UML:AssociationEnd xmi.id="{id}" name="{id}" isNavigable="true" aggregation="{aggregation}">
{extra}
{multiplicity}
<UML:AssociationEnd.participant><UML:Class xmi.idref="{participant}"/></UML:AssociationEnd.participant>
</UML:AssociationEnd>"#
    )
}

/// Classes `a` and `b` joined by ends `a_end` and `b_end`.
fn pair(a: (&str, Option<(i32, i32)>), b: (&str, Option<(i32, i32)>), b_extra: &str) -> ModelHost {
    let xml = document(&format!(
        r#"<UML:TagDefinition xmi.id="td_related_to" name="related_to"/>
<UML:TagDefinition xmi.id="td_related_by" name="related_by"/>
<UML:Class xmi.id="a" name="a"/>
<UML:Class xmi.id="b" name="b"/>
<UML:Association xmi.id="as_ab">
  <UML:Association.connection>
{}
{}
  </UML:Association.connection>
</UML:Association>"#,
        end_xml("a_end", "a", a.0, a.1, ""),
        end_xml("b_end", "b", b.0, b.1, b_extra),
    ));
    host_from_xmi(&xml)
}

fn tag(id: &str, definition: &str, value: &str) -> String {
    format!(
        r#"<UML:ModelElement.taggedValue>
  <UML:TaggedValue xmi.id="{id}">
    <UML:TaggedValue.dataValue>{value}</UML:TaggedValue.dataValue>
    <UML:TaggedValue.type><UML:TagDefinition xmi.idref="{definition}"/></UML:TaggedValue.type>
  </UML:TaggedValue>
</UML:ModelElement.taggedValue>"#
    )
}

fn infer_b(host: &ModelHost) -> Result<Multiplicity, ModelError> {
    let end = entity(host.model(), "b_end").as_association_end().unwrap();
    infer(&end)
}

// =============================================================================
// CARDINALITY
// =============================================================================

#[rstest]
#[case(("none", Some((0, -1))), ("none", Some((0, 1))), Multiplicity::Many2One)]
#[case(("composite", Some((1, 1))), ("none", Some((0, -1))), Multiplicity::One2Many)]
#[case(("none", Some((0, 1))), ("none", Some((1, 1))), Multiplicity::One2One)]
#[case(("none", None), ("none", Some((1, -1))), Multiplicity::Many2Many)]
#[case(("aggregate", None), ("none", None), Multiplicity::One2Many)]
#[case(("aggregate", None), ("none", Some((0, 1))), Multiplicity::One2One)]
#[case(("composite", None), ("none", Some((0, -1))), Multiplicity::One2Many)]
#[case(("none", Some((0, -1))), ("composite", None), Multiplicity::Many2One)]
#[case(("none", Some((1, 1))), ("none", Some((0, -1))), Multiplicity::One2Many)]
fn test_relation_kind(
    #[case] a: (&str, Option<(i32, i32)>),
    #[case] b: (&str, Option<(i32, i32)>),
    #[case] expected: Multiplicity,
) {
    let host = pair(a, b, "");
    assert_eq!(infer_b(&host).unwrap(), expected);
}

#[test]
fn test_relation_kind_reads_from_the_holder_side() {
    let host = host_from_xmi(SALES);
    let model = host.model();

    let lines = entity(model, "e_lines").as_association_end().unwrap();
    assert_eq!(infer(&lines).unwrap(), Multiplicity::One2Many);
    let order = entity(model, "e_order").as_association_end().unwrap();
    assert_eq!(infer(&order).unwrap(), Multiplicity::Many2One);
    let product = entity(model, "e_product").as_association_end().unwrap();
    assert_eq!(infer(&product).unwrap().to_string(), "many2one");
}

#[test]
fn test_each_end_swaps_to_the_other() {
    let host = pair(("none", Some((0, 1))), ("none", Some((0, -1))), "");
    let model = host.model();
    let a_end = entity(model, "a_end").as_association_end().unwrap();
    let b_end = entity(model, "b_end").as_association_end().unwrap();

    assert_eq!(a_end.swap(), vec![b_end]);
    assert_eq!(b_end.swap(), vec![a_end]);
    assert_eq!(a_end.partner(), Some(b_end));
}

#[test]
fn test_unsupported_range_names_both_ends() {
    let host = pair(("none", Some((0, 1))), ("none", Some((2, 5))), "");
    match infer_b(&host) {
        Err(ModelError::UnsupportedMultiplicity {
            end,
            participant,
            partner,
            partner_participant,
            ..
        }) => {
            assert_eq!(end, "b_end");
            assert_eq!(participant, "b");
            assert_eq!(partner, "a_end");
            assert_eq!(partner_participant, "a");
        }
        other => panic!("Expected an unsupported multiplicity, got {other:?}"),
    }
}

#[test]
fn test_unsupported_partner_range_is_reported() {
    let host = pair(("composite", Some((0, 3))), ("none", Some((0, 1))), "");
    assert!(matches!(
        infer_b(&host),
        Err(ModelError::UnsupportedMultiplicity { ref end, .. }) if end == "a_end"
    ));
}

// =============================================================================
// RELATED FIELDS
// =============================================================================

#[test]
fn test_related_field_splits_path() {
    let extra = format!(
        "{}\n{}",
        tag("tv_to", "td_related_to", "name"),
        tag("tv_by", "td_related_by", "order_id.partner_id")
    );
    let host = pair(("none", Some((0, 1))), ("none", Some((0, 1))), &extra);
    assert_eq!(
        infer_b(&host).unwrap(),
        Multiplicity::Related {
            target: "name".to_string(),
            path: vec!["order_id".to_string(), "partner_id".to_string()],
        }
    );
}

#[test]
fn test_related_field_without_path_fails() {
    let extra = tag("tv_to", "td_related_to", "name");
    let host = pair(("none", Some((0, 1))), ("none", Some((0, 1))), &extra);
    match infer_b(&host) {
        Err(ModelError::MissingRelatedPath { end, target }) => {
            assert_eq!(end, "b_end");
            assert_eq!(target, "name");
        }
        other => panic!("Expected a missing path, got {other:?}"),
    }
}

#[test]
fn test_walk_related_follows_association_names() {
    let host = host_from_xmi(SALES);
    let order = entity(host.model(), "c_order");

    let target = walk_related(order, &["line_ids", "product_id"]);
    assert_eq!(target.map(|t| t.label()), Some("product"));
    assert!(walk_related(order, &["line_ids", "missing"]).is_none());
    assert_eq!(walk_related(order, &[] as &[&str]), Some(order));
}

//! Loading a single document into a model.

use crate::helpers::host_helpers::*;
use crate::helpers::xmi_fixtures::*;
use umlgraph::model::{PseudoKind, StateKind};
use umlgraph::{EntityKind, ModelElement, ModelError, MultiplicityRange};

// =============================================================================
// ENTITIES
// =============================================================================

#[test]
fn test_sales_entities_are_created() {
    let host = host_from_xmi(SALES);
    let model = host.model();

    assert_eq!(model.iter_kind(EntityKind::Package).count(), 3);
    assert_eq!(model.iter_kind(EntityKind::Class).count(), 4);
    assert_eq!(model.iter_kind(EntityKind::Association).count(), 2);
    assert_eq!(model.iter_kind(EntityKind::AssociationEnd).count(), 4);
    assert_eq!(model.iter_kind(EntityKind::Generalization).count(), 1);
}

#[test]
fn test_entities_belong_to_their_package() {
    let host = host_from_xmi(SALES);
    let model = host.model();

    let order = class(model, "c_order");
    assert_eq!(order.inner.package().map(|p| p.label()), Some("sale"));
    assert_eq!(order.qualified_name("."), "sale.order");

    let string = entity(model, "dt_string");
    assert!(string.package().is_none());
}

#[test]
fn test_members_keep_declaration_order() {
    let host = host_from_xmi(SALES);
    let order = class(host.model(), "c_order");

    assert_eq!(labels(order.members()), vec!["customer", "confirm"]);
    assert_eq!(labels(order.attributes()), vec!["customer"]);
    assert!(order.has_member("confirm", EntityKind::Operation));
    assert!(!order.has_member("confirm", EntityKind::Attribute));
}

#[test]
fn test_attribute_type_multiplicity_and_size() {
    let host = host_from_xmi(SALES);
    let model = host.model();
    let name = entity(model, "a_name").as_attribute().unwrap();

    assert_eq!(name.datatype().map(|d| d.label()), Some("String"));
    assert_eq!(name.multiplicity(), Some(MultiplicityRange::new(1, Some(1))));
    assert!(name.is_required());
    assert_eq!(name.size(), Some(64));
    assert_eq!(name.qualified_name("_"), "product_product_name");
}

#[test]
fn test_operation_parameters() {
    let host = host_from_xmi(SALES);
    let confirm = entity(host.model(), "o_confirm").as_operation().unwrap();

    assert_eq!(confirm.parameters().len(), 2);
    assert_eq!(labels(confirm.arguments()), vec!["force"]);
    assert_eq!(confirm.return_type().map(|t| t.label()), Some("String"));
    assert_eq!(confirm.owner().map(|o| o.label()), Some("order"));
}

#[test]
fn test_tags_and_stereotypes() {
    let host = host_from_xmi(SALES);
    let model = host.model();

    let product = class(model, "c_product");
    assert_eq!(product.tags().get("label"), Some("Product"));

    let sale = entity(model, "p_sale").as_package().unwrap();
    assert_eq!(sale.declared_dependencies(), vec!["stock", "res"]);

    let stock = entity(model, "p_stock").as_package().unwrap();
    assert!(stock.is_external());
    assert_eq!(stock.stereotype_names(), vec!["external"]);
    assert!(!sale.is_external());
}

#[test]
fn test_association_ends_and_partners() {
    let host = host_from_xmi(SALES);
    let model = host.model();

    let lines = entity(model, "e_lines").as_association_end().unwrap();
    let partner = lines.partner().unwrap();
    assert_eq!(partner.label(), "order_id");
    assert_eq!(lines.participant().map(|p| p.label()), Some("order_line"));
    assert_eq!(lines.qualified_name("."), "sale.order.line_ids");

    let order = class(model, "c_order");
    assert_eq!(labels(order.associations()), vec!["line_ids"]);
    assert!(order.association_by_name("line_ids").is_some());

    let line = class(model, "c_line");
    assert_eq!(labels(line.associations()), vec!["order_id", "product_id"]);
}

#[test]
fn test_generalization_navigation() {
    let host = host_from_xmi(SALES);
    let model = host.model();

    let special = class(model, "c_special");
    assert_eq!(labels(special.parents()), vec!["order"]);
    assert!(!special.is_extended());

    let order = class(model, "c_order");
    assert_eq!(labels(order.children()), vec!["special_order"]);
}

#[test]
fn test_tag_defaults_are_overridden_by_tagged_values() {
    let config = offline_config()
        .with_tag_default(EntityKind::Class, "label", "Unnamed")
        .with_tag_default(EntityKind::Class, "menu_sequence", "10");
    let mut host = umlgraph::ModelHost::with_config(config);
    host.load_str("sales.xmi", SALES).unwrap();
    let model = host.model();

    let product = class(model, "c_product");
    assert_eq!(product.tags().get("label"), Some("Product"));
    assert_eq!(product.tags().get("menu_sequence"), Some("10"));
    assert_eq!(class(model, "c_line").tags().get("label"), Some("Unnamed"));
}

// =============================================================================
// STATE MACHINES
// =============================================================================

#[test]
fn test_state_machine_structure() {
    let host = host_from_xmi(ORDER_WORKFLOW);
    let model = host.model();

    let order = class(model, "c_order");
    let machines = order.state_machines();
    assert_eq!(machines.len(), 1);
    let machine = machines[0];

    assert_eq!(machine.context().map(|c| c.label()), Some("order"));
    assert_eq!(machine.top().map(|t| t.label()), Some("top"));
    assert_eq!(machine.states().len(), 4);
    assert_eq!(machine.initial_states().len(), 1);
    assert_eq!(labels(machine.final_states()), vec!["done"]);
    assert_eq!(labels(machine.middle_states()), vec!["draft"]);
    assert_eq!(machine.qualified_name("."), "sale.order.workflow");

    let init = entity(model, "s_init").as_state().unwrap();
    assert_eq!(init.kind(), Some(StateKind::Pseudo(PseudoKind::Initial)));
    assert_eq!(init.container().map(|c| c.label()), Some("top"));
}

#[test]
fn test_pseudostate_kinds() {
    let host = host_from_xmi(&document(
        r#"<UML:StateMachine xmi.id="sm_flow" name="flow">
  <UML:StateMachine.top>
    <UML:CompositeState xmi.id="s_top" name="top">
      <UML:CompositeState.subvertex>
        <UML:Pseudostate xmi.id="s_bare"/>
        <UML:Pseudostate xmi.id="s_choice" kind="choice"/>
        <UML:Pseudostate xmi.id="s_branch" kind="branch"/>
      </UML:CompositeState.subvertex>
    </UML:CompositeState>
  </UML:StateMachine.top>
</UML:StateMachine>"#,
    ));
    let model = host.model();
    let kind = |id: &str| entity(model, id).as_state().unwrap().kind();

    assert_eq!(kind("s_bare"), Some(StateKind::Pseudo(PseudoKind::Initial)));
    assert_eq!(kind("s_choice"), Some(StateKind::Pseudo(PseudoKind::Choice)));
    assert_eq!(kind("s_branch"), Some(StateKind::Pseudo(PseudoKind::Unrecognised)));
}

#[test]
fn test_transition_details() {
    let host = host_from_xmi(ORDER_WORKFLOW);
    let model = host.model();

    let confirm = entity(model, "t_confirm").as_transition().unwrap();
    assert_eq!(confirm.source().map(|s| s.label()), Some("draft"));
    assert_eq!(confirm.target().map(|s| s.label()), Some("done"));
    assert_eq!(confirm.guard(), Some("lines_ok"));
    assert_eq!(confirm.effect_script(), Some("action_confirm()"));
    assert_eq!(confirm.trigger().map(|t| t.label()), Some("confirm"));

    let draft = entity(model, "s_draft").as_state().unwrap();
    assert_eq!(draft.incoming().len(), 1);
    assert_eq!(draft.outgoing().len(), 1);
}

// =============================================================================
// STRUCTURAL ERRORS
// =============================================================================

#[test]
fn test_nested_class_is_rejected() {
    let xml = document(
        r#"<UML:Class xmi.id="c_outer" name="outer">
  <UML:Namespace.ownedElement>
    <UML:Class xmi.id="c_inner" name="inner"/>
  </UML:Namespace.ownedElement>
</UML:Class>"#,
    );
    match load_error(&xml) {
        ModelError::Structure(message) => {
            assert!(message.contains("inner"), "{message}");
            assert!(message.contains("outer"), "{message}");
        }
        other => panic!("Expected a structure error, got {other:?}"),
    }
}

#[test]
fn test_association_with_one_end_is_malformed() {
    let xml = document(
        r#"<UML:Class xmi.id="c_a" name="a"/>
<UML:Association xmi.id="as_single">
  <UML:Association.connection>
    <UML:AssociationEnd xmi.id="e_single" name="a_id" isNavigable="true">
      <UML:AssociationEnd.participant><UML:Class xmi.idref="c_a"/></UML:AssociationEnd.participant>
    </UML:AssociationEnd>
  </UML:Association.connection>
</UML:Association>"#,
    );
    match load_error(&xml) {
        ModelError::MalformedAssociation { id, ends } => {
            assert_eq!(id, "as_single");
            assert_eq!(ends, 1);
        }
        other => panic!("Expected a malformed association, got {other:?}"),
    }
}

#[test]
fn test_invalid_xml_reports_document_and_line() {
    let mut host = offline_host();
    let err = host
        .load_str("broken.xmi", "<XMI>\n<XMI.content>\n<UML:Class xmi.id=\"a\">\n</XMI>")
        .unwrap_err();
    match err {
        ModelError::Document { document, line, .. } => {
            assert_eq!(document, "broken.xmi");
            assert!(line >= 3, "line {line}");
        }
        other => panic!("Expected a located error, got {other:?}"),
    }
    assert_eq!(host.model().len(), 0);
}

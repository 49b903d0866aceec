//! Breadth-first menu ordering over use cases.

use crate::helpers::host_helpers::*;
use crate::helpers::xmi_fixtures::*;
use umlgraph::graph::order_menus;
use umlgraph::{EntityKind, ModelElement, ModelError, ModelHost};

// =============================================================================
// HELPERS
// =============================================================================

/// Directed link `from → to` between use cases.
fn link(from: &str, to: &str) -> String {
    format!(
        r#"<UML:Association xmi.id="as_{from}_{to}">
  <UML:Association.connection>
    <UML:AssociationEnd xmi.id="e_{from}_{to}_src" isNavigable="false">
      <UML:AssociationEnd.participant><UML:UseCase xmi.idref="{from}"/></UML:AssociationEnd.participant>
    </UML:AssociationEnd>
    <UML:AssociationEnd xmi.id="e_{from}_{to}_dst" isNavigable="true">
      <UML:AssociationEnd.participant><UML:UseCase xmi.idref="{to}"/></UML:AssociationEnd.participant>
    </UML:AssociationEnd>
  </UML:Association.connection>
</UML:Association>"#
    )
}

fn use_case_xml(name: &str, menu: bool) -> String {
    let stereotype = if menu {
        r#"<UML:ModelElement.stereotype><UML:Stereotype xmi.idref="st_menu"/></UML:ModelElement.stereotype>"#
    } else {
        ""
    };
    format!(r#"<UML:UseCase xmi.id="{name}" name="{name}">{stereotype}</UML:UseCase>"#)
}

/// `root → sales → {quotes, orders}`, plus whatever `extra` adds.
fn menus(extra: &str) -> ModelHost {
    let owned = [
        r#"<UML:Stereotype xmi.id="st_menu" name="menu"/>"#.to_string(),
        use_case_xml("root", false),
        use_case_xml("sales", true),
        use_case_xml("quotes", true),
        use_case_xml("orders", true),
        link("root", "sales"),
        link("sales", "quotes"),
        link("sales", "orders"),
        extra.to_string(),
    ]
    .join("\n");
    host_from_xmi(&document(&owned))
}

fn menu_entries(host: &ModelHost) -> Vec<umlgraph::UseCaseView<'_>> {
    host.model()
        .iter_kind(EntityKind::UseCase)
        .filter_map(|v| v.as_use_case())
        .filter(|u| u.is_stereotype("menu"))
        .collect()
}

// =============================================================================
// NAVIGATION
// =============================================================================

#[test]
fn test_nexts_and_prevs_follow_navigability() {
    let host = menus("");
    let model = host.model();

    let sales = use_case(model, "sales");
    assert_eq!(labels(sales.nexts()), vec!["quotes", "orders"]);
    assert_eq!(labels(sales.prevs()), vec!["root"]);
    assert!(use_case(model, "root").prevs().is_empty());
    assert_eq!(labels(use_case(model, "orders").prev_leaves()), vec!["root"]);
}

#[test]
fn test_prev_leaves_of_an_entry_point_is_itself() {
    let host = menus("");
    let root = use_case(host.model(), "root");
    assert_eq!(root.prev_leaves(), vec![root]);
}

// =============================================================================
// ORDERING
// =============================================================================

#[test]
fn test_menus_are_ordered_breadth_first_by_name() {
    let host = menus("");
    let ordered = order_menus(&menu_entries(&host)).unwrap();
    assert_eq!(labels(ordered), vec!["sales", "orders", "quotes"]);
}

#[test]
fn test_empty_menu_list() {
    assert!(order_menus(&[]).unwrap().is_empty());
}

#[test]
fn test_unlinked_menu_is_reported() {
    let host = menus(&use_case_xml("lonely", true));
    match order_menus(&menu_entries(&host)) {
        Err(ModelError::UnlinkedMenus(names)) => assert_eq!(names, vec!["lonely"]),
        other => panic!("Expected unlinked menus, got {other:?}"),
    }
}

#[test]
fn test_menu_loop_terminates() {
    let host = menus(&link("orders", "sales"));
    // `sales` now has two predecessors; only `root` has none.
    let ordered = order_menus(&menu_entries(&host)).unwrap();
    assert_eq!(labels(ordered), vec!["sales", "orders", "quotes"]);
}

//! Deferred resolution of forward references and its failure modes.

use crate::helpers::host_helpers::*;
use crate::helpers::xmi_fixtures::*;
use umlgraph::{EntityKind, ModelElement, ModelError};

#[test]
fn test_forward_references_resolve() {
    let host = host_from_xmi(FORWARD_REFERENCES);
    let model = host.model();

    let car = class(model, "c_car");
    assert_eq!(labels(car.parents()), vec!["vehicle"]);
    assert!(car.is_stereotype("group"));

    let plate = entity(model, "a_plate").as_attribute().unwrap();
    assert_eq!(plate.datatype().map(|d| d.label()), Some("Plate"));
}

#[test]
fn test_deferred_members_keep_document_order() {
    let host = host_from_xmi(FORWARD_REFERENCES);
    let car = class(host.model(), "c_car");

    // `plate` waits for its type, `seats` does not.
    assert_eq!(labels(car.attributes()), vec!["plate", "seats"]);
}

#[test]
fn test_unresolved_reference_is_named() {
    let xml = document(
        r#"<UML:Class xmi.id="c_a" name="a">
  <UML:Classifier.feature>
    <UML:Attribute xmi.id="a_ghost" name="ghost">
      <UML:StructuralFeature.type><UML:DataType xmi.idref="dt_missing"/></UML:StructuralFeature.type>
    </UML:Attribute>
  </UML:Classifier.feature>
</UML:Class>"#,
    );
    match load_error(&xml) {
        ModelError::UnresolvedReferences { document, ids } => {
            assert_eq!(document, "test.xmi");
            assert_eq!(ids, vec!["dt_missing".to_string()]);
        }
        other => panic!("Expected unresolved references, got {other:?}"),
    }
}

#[test]
fn test_failed_load_leaves_model_untouched() {
    let mut host = offline_host();
    host.load_str("sales.xmi", SALES).unwrap();
    let before = host.model().len();

    let xml = document(
        r#"<UML:Class xmi.id="c_orphan" name="orphan">
  <UML:ModelElement.stereotype><UML:Stereotype xmi.idref="st_nowhere"/></UML:ModelElement.stereotype>
</UML:Class>"#,
    );
    assert!(host.load_str("orphan.xmi", &xml).is_err());
    assert_eq!(host.model().len(), before);
    assert!(!host.model().contains_id("c_orphan"));
    assert_eq!(host.loaded_documents().count(), 1);

    // The session stays usable.
    let more = document(r#"<UML:Class xmi.id="c_extra" name="extra"/>"#);
    host.load_str("extra.xmi", &more).unwrap();
    assert!(host.model().contains_id("c_extra"));
}

#[test]
fn test_session_recovers_after_failure() {
    let mut host = offline_host();
    let broken = document(
        r#"<UML:Generalization xmi.id="g_x">
  <UML:Generalization.child><UML:Class xmi.idref="nobody"/></UML:Generalization.child>
  <UML:Generalization.parent><UML:Class xmi.idref="nobody_else"/></UML:Generalization.parent>
</UML:Generalization>"#,
    );
    assert!(host.load_str("broken.xmi", &broken).is_err());
    assert!(host.model().is_empty());

    host.load_str("forward.xmi", FORWARD_REFERENCES).unwrap();
    assert_eq!(host.model().iter_kind(EntityKind::Class).count(), 2);
}

#[test]
fn test_duplicate_ids_across_documents_are_ambiguous() {
    let mut host = offline_host();
    host.load_str("first.xmi", &document(r#"<UML:Class xmi.id="c_dup" name="first"/>"#))
        .unwrap();
    host.load_str("second.xmi", &document(r#"<UML:Class xmi.id="c_dup" name="second"/>"#))
        .unwrap();

    match host.model().lookup("c_dup") {
        Err(ModelError::AmbiguousReference { id, count }) => {
            assert_eq!(id, "c_dup");
            assert_eq!(count, 2);
        }
        other => panic!("Expected an ambiguous reference, got {other:?}"),
    }
}

#[test]
fn test_loading_the_same_document_twice_is_a_no_op() {
    let mut host = offline_host();
    assert!(host.load_str("sales.xmi", SALES).unwrap());
    let count = host.model().len();
    assert!(!host.load_str("sales.xmi", SALES).unwrap());
    assert_eq!(host.model().len(), count);
}

//! Package dependency sets.

use crate::helpers::host_helpers::*;
use crate::helpers::xmi_fixtures::*;
use umlgraph::{LoaderConfig, ModelError, ModelHost};

fn deps_of<'a>(map: &'a umlgraph::graph::DependencyMap, package: &str) -> Vec<&'a str> {
    map[package].iter().map(String::as_str).collect()
}

#[test]
fn test_sales_dependencies() {
    let host = host_from_xmi(SALES);
    let map = host.dependencies();

    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["product", "sale"]);
    assert!(map["product"].is_empty());
    // Navigable relation to product, declared stock; `res` is a base namespace.
    assert_eq!(deps_of(&map, "sale"), vec!["product", "stock"]);
}

#[test]
fn test_external_packages_are_not_analyzed() {
    let host = host_from_xmi(SALES);
    assert!(!host.dependencies().contains_key("stock"));
}

#[test]
fn test_base_namespaces_are_configurable() {
    let config = LoaderConfig::new()
        .without_profile_dir()
        .with_base_namespaces(["stock"]);
    let mut host = ModelHost::with_config(config);
    host.load_str("sales.xmi", SALES).unwrap();

    let map = host.dependencies();
    assert_eq!(deps_of(&map, "sale"), vec!["product", "res"]);
}

#[test]
fn test_attribute_types_count_as_dependencies() {
    let host = host_from_xmi(&document(
        r#"<UML:Package xmi.id="p_types" name="types">
  <UML:Namespace.ownedElement><UML:DataType xmi.id="dt_money" name="Money"/></UML:Namespace.ownedElement>
</UML:Package>
<UML:Package xmi.id="p_account" name="account">
  <UML:Namespace.ownedElement>
    <UML:Class xmi.id="c_invoice" name="invoice">
      <UML:Classifier.feature>
        <UML:Attribute xmi.id="a_amount" name="amount">
          <UML:StructuralFeature.type><UML:DataType xmi.idref="dt_money"/></UML:StructuralFeature.type>
        </UML:Attribute>
      </UML:Classifier.feature>
    </UML:Class>
  </UML:Namespace.ownedElement>
</UML:Package>"#,
    ));
    let map = host.dependencies();
    assert_eq!(deps_of(&map, "account"), vec!["types"]);
    assert!(map["types"].is_empty());
}

#[test]
fn test_mutual_dependency_is_circular() {
    let host = host_from_xmi(&document(
        r#"<UML:TagDefinition xmi.id="td_depends" name="depends"/>
<UML:Package xmi.id="p_stock" name="stock">
  <UML:ModelElement.taggedValue>
    <UML:TaggedValue xmi.id="tv_stock">
      <UML:TaggedValue.dataValue>sale</UML:TaggedValue.dataValue>
      <UML:TaggedValue.type><UML:TagDefinition xmi.idref="td_depends"/></UML:TaggedValue.type>
    </UML:TaggedValue>
  </UML:ModelElement.taggedValue>
</UML:Package>
<UML:Package xmi.id="p_sale" name="sale">
  <UML:ModelElement.taggedValue>
    <UML:TaggedValue xmi.id="tv_sale">
      <UML:TaggedValue.dataValue>stock</UML:TaggedValue.dataValue>
      <UML:TaggedValue.type><UML:TagDefinition xmi.idref="td_depends"/></UML:TaggedValue.type>
    </UML:TaggedValue>
  </UML:ModelElement.taggedValue>
</UML:Package>"#,
    ));

    match host.checked_dependencies() {
        Err(ModelError::CircularDependency { pairs }) => {
            assert_eq!(pairs, vec![("sale".to_string(), "stock".to_string())]);
        }
        other => panic!("Expected a circular dependency, got {other:?}"),
    }
}

#[test]
fn test_acyclic_dependencies_pass_the_check() {
    let host = host_from_xmi(SALES);
    let map = host.checked_dependencies().unwrap();
    assert_eq!(map.len(), 2);
}

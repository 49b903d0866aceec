//! References into other documents: profiles, relative files and fetched
//! URLs.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::helpers::host_helpers::*;
use crate::helpers::xmi_fixtures::*;
use tempfile::TempDir;
use umlgraph::source::cache_key;
use umlgraph::{
    DocumentId, Fetcher, LoaderConfig, ModelElement, ModelError, ModelHost, OfflineFetcher,
};

// =============================================================================
// HELPERS
// =============================================================================

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// Serves one document for one URL, counting requests.
#[derive(Debug)]
struct StaticFetcher {
    url: &'static str,
    body: String,
    fetches: Arc<AtomicUsize>,
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ModelError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if url == self.url {
            Ok(self.body.clone().into_bytes())
        } else {
            Err(ModelError::fetch(url, "unknown url"))
        }
    }
}

// =============================================================================
// PROFILES
// =============================================================================

#[test]
fn test_bundled_profile_is_loaded_on_demand() {
    let host = host_from_xmi(PROFILE_USER);
    let model = host.model();

    let fleet = entity(model, "p_fleet").as_package().unwrap();
    assert!(fleet.is_external());

    let plate = entity(model, "a_plate").as_attribute().unwrap();
    let string = plate.datatype().unwrap();
    assert_eq!(string.id(), PROFILE_STRING_ID);
    assert_eq!(string.label(), "String");

    assert_eq!(host.loaded_documents().count(), 2);
    assert!(host.loaded_documents().next().unwrap().is_url());
}

#[test]
fn test_profile_store_takes_precedence() {
    let store = TempDir::new().unwrap();
    let profile = document(&format!(
        r#"<UML:Stereotype xmi.id="-84-17--56-5-43645a83:11466542d86:-8000:0000000000000890" name="external"/>
<UML:DataType xmi.id="{PROFILE_STRING_ID}" name="Text"/>"#
    ))
    .replace("xmi.id=\"m1\"", "xmi.id=\"profile_model\"");
    write(store.path(), "default-uml14.xmi", &profile);

    let mut host = ModelHost::with_config(LoaderConfig::new().with_profile_dir(store.path()));
    host.load_str("fleet.xmi", PROFILE_USER).unwrap();

    let plate = entity(host.model(), "a_plate").as_attribute().unwrap();
    assert_eq!(plate.datatype().map(|d| d.label()), Some("Text"));
}

#[test]
fn test_missing_profile_lists_search_paths() {
    let store = TempDir::new().unwrap();
    let config = LoaderConfig::new()
        .with_profile_dir(store.path())
        .with_bundled_profiles(false);
    let mut host = ModelHost::with_config(config);

    let err = host.load_str("fleet.xmi", PROFILE_USER).unwrap_err();
    match err.root_cause() {
        ModelError::ProfileNotFound { url, searched } => {
            assert!(url.ends_with("default-uml14.xmi"));
            assert_eq!(searched, &vec![store.path().join("default-uml14.xmi")]);
        }
        other => panic!("Expected a missing profile, got {other:?}"),
    }
    assert!(host.model().is_empty());
}

// =============================================================================
// LOCAL FILES
// =============================================================================

const CORE: &str = r#"<UML:Package xmi.id="p_core" name="core">
  <UML:Namespace.ownedElement>
    <UML:Class xmi.id="c_partner" name="partner"/>
  </UML:Namespace.ownedElement>
</UML:Package>"#;

const APP: &str = r#"<UML:Package xmi.id="p_app" name="app">
  <UML:Namespace.ownedElement>
    <UML:Class xmi.id="c_customer" name="customer"/>
    <UML:Generalization xmi.id="g_customer">
      <UML:Generalization.child><UML:Class xmi.idref="c_customer"/></UML:Generalization.child>
      <UML:Generalization.parent><UML:Class href="core.xmi#c_partner"/></UML:Generalization.parent>
    </UML:Generalization>
  </UML:Namespace.ownedElement>
</UML:Package>"#;

#[test]
fn test_relative_href_loads_sibling_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "core.xmi", &document(CORE).replace("\"m1\"", "\"m_core\""));
    write(dir.path(), "app.xmi", &document(APP));

    let mut host = offline_host();
    assert!(host.load_path(dir.path().join("app.xmi")).unwrap());
    let model = host.model();

    let customer = class(model, "c_customer");
    assert_eq!(labels(customer.parents()), vec!["partner"]);
    assert_eq!(host.loaded_documents().count(), 2);
    assert!(host.is_loaded(&DocumentId::from_path(dir.path().join("core.xmi"))));

    let deps = host.dependencies();
    assert_eq!(deps["app"].iter().collect::<Vec<_>>(), vec!["core"]);
    assert!(deps["core"].is_empty());
}

#[test]
fn test_already_loaded_dependency_is_not_reloaded() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "core.xmi", &document(CORE).replace("\"m1\"", "\"m_core\""));
    write(dir.path(), "app.xmi", &document(APP));

    let mut host = offline_host();
    host.load_path(dir.path().join("core.xmi")).unwrap();
    let after_core = host.model().len();
    host.load_path(dir.path().join("app.xmi")).unwrap();

    assert_eq!(host.loaded_documents().count(), 2);
    assert!(host.model().lookup("c_partner").is_ok());
    assert!(host.model().len() > after_core);
}

#[test]
fn test_mutually_referencing_documents() {
    let dir = TempDir::new().unwrap();
    let left = document(
        r#"<UML:Class xmi.id="c_left" name="left"/>
<UML:Class xmi.id="c_left_child" name="left_child"/>
<UML:Generalization xmi.id="g_left">
  <UML:Generalization.child><UML:Class xmi.idref="c_left_child"/></UML:Generalization.child>
  <UML:Generalization.parent><UML:Class href="right.xmi#c_right"/></UML:Generalization.parent>
</UML:Generalization>"#,
    );
    let right = document(
        r#"<UML:Class xmi.id="c_right" name="right">
  <UML:Classifier.feature>
    <UML:Attribute xmi.id="a_left" name="left">
      <UML:StructuralFeature.type><UML:Class href="left.xmi#c_left"/></UML:StructuralFeature.type>
    </UML:Attribute>
  </UML:Classifier.feature>
</UML:Class>"#,
    )
    .replace("\"m1\"", "\"m_right\"");
    write(dir.path(), "left.xmi", &left);
    write(dir.path(), "right.xmi", &right);

    let mut host = offline_host();
    host.load_path(dir.path().join("left.xmi")).unwrap();
    let model = host.model();

    assert_eq!(labels(class(model, "c_left_child").parents()), vec!["right"]);
    let attribute = entity(model, "a_left").as_attribute().unwrap();
    assert_eq!(attribute.datatype().map(|d| d.label()), Some("left"));
    assert_eq!(host.loaded_documents().count(), 2);
}

#[test]
fn test_back_reference_to_class_declared_after_href() {
    let dir = TempDir::new().unwrap();
    // right.xmi is read while left.xmi still lacks c_left.
    let left = document(
        r#"<UML:Generalization xmi.id="g_left">
  <UML:Generalization.child><UML:Class xmi.idref="c_left"/></UML:Generalization.child>
  <UML:Generalization.parent><UML:Class href="right.xmi#c_right"/></UML:Generalization.parent>
</UML:Generalization>
<UML:Class xmi.id="c_left" name="left"/>"#,
    );
    let right = document(
        r#"<UML:Class xmi.id="c_right" name="right">
  <UML:Classifier.feature>
    <UML:Attribute xmi.id="a_left" name="left">
      <UML:StructuralFeature.type><UML:Class href="left.xmi#c_left"/></UML:StructuralFeature.type>
    </UML:Attribute>
    <UML:Attribute xmi.id="a_code" name="code"/>
  </UML:Classifier.feature>
</UML:Class>"#,
    )
    .replace("\"m1\"", "\"m_right\"");
    write(dir.path(), "left.xmi", &left);
    write(dir.path(), "right.xmi", &right);

    let mut host = offline_host();
    assert!(host.load_path(dir.path().join("left.xmi")).unwrap());
    let model = host.model();

    assert_eq!(labels(class(model, "c_left").parents()), vec!["right"]);
    let attribute = entity(model, "a_left").as_attribute().unwrap();
    assert_eq!(attribute.datatype().map(|d| d.label()), Some("left"));
    let members: Vec<_> = class(model, "c_right")
        .members()
        .iter()
        .map(|m| m.id())
        .collect();
    assert_eq!(members, vec!["a_left", "a_code"]);
    assert_eq!(host.loaded_documents().count(), 2);
}

#[test]
fn test_back_reference_to_missing_class_still_fails() {
    let dir = TempDir::new().unwrap();
    let left = document(
        r#"<UML:Generalization xmi.id="g_left">
  <UML:Generalization.child><UML:Class xmi.idref="c_left"/></UML:Generalization.child>
  <UML:Generalization.parent><UML:Class href="right.xmi#c_right"/></UML:Generalization.parent>
</UML:Generalization>
<UML:Class xmi.id="c_left" name="left"/>"#,
    );
    let right = document(
        r#"<UML:Class xmi.id="c_right" name="right">
  <UML:Classifier.feature>
    <UML:Attribute xmi.id="a_ghost" name="ghost">
      <UML:StructuralFeature.type><UML:Class href="left.xmi#c_ghost"/></UML:StructuralFeature.type>
    </UML:Attribute>
  </UML:Classifier.feature>
</UML:Class>"#,
    )
    .replace("\"m1\"", "\"m_right\"");
    write(dir.path(), "left.xmi", &left);
    write(dir.path(), "right.xmi", &right);

    let mut host = offline_host();
    let err = host.load_path(dir.path().join("left.xmi")).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        ModelError::UnresolvedReferences { ids, .. } if ids == &["c_ghost".to_string()]
    ));
    assert!(host.model().is_empty());
    assert_eq!(host.loaded_documents().count(), 0);
}

#[test]
fn test_failing_dependency_aborts_the_outer_load() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "core.xmi",
        &document(r#"<UML:Class xmi.id="c_partner" name="partner"><UML:ModelElement.stereotype><UML:Stereotype xmi.idref="st_missing"/></UML:ModelElement.stereotype></UML:Class>"#)
            .replace("\"m1\"", "\"m_core\""),
    );
    write(dir.path(), "app.xmi", &document(APP));

    let mut host = offline_host();
    let err = host.load_path(dir.path().join("app.xmi")).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        ModelError::UnresolvedReferences { ids, .. } if ids == &["st_missing".to_string()]
    ));
    assert!(host.model().is_empty());
    assert_eq!(host.loaded_documents().count(), 0);
}

// =============================================================================
// FETCHED DOCUMENTS
// =============================================================================

const TYPES_URL: &str = "http://example.org/models/types.xmi";

fn fetched_user() -> String {
    document(&format!(
        r#"<UML:Class xmi.id="c_invoice" name="invoice">
  <UML:Classifier.feature>
    <UML:Attribute xmi.id="a_amount" name="amount">
      <UML:StructuralFeature.type><UML:DataType href="{TYPES_URL}#dt_money"/></UML:StructuralFeature.type>
    </UML:Attribute>
  </UML:Classifier.feature>
</UML:Class>"#
    ))
}

fn types_document() -> String {
    document(r#"<UML:DataType xmi.id="dt_money" name="Money"/>"#)
        .replace("\"m1\"", "\"m_types\"")
}

#[test]
fn test_fetched_document_is_stored_by_url_hash() {
    let store = TempDir::new().unwrap();
    let fetches = Arc::new(AtomicUsize::new(0));
    let config = LoaderConfig::new()
        .with_profile_dir(store.path())
        .with_fetcher(StaticFetcher {
            url: TYPES_URL,
            body: types_document(),
            fetches: Arc::clone(&fetches),
        });
    let mut host = ModelHost::with_config(config);
    host.load_str("invoice.xmi", &fetched_user()).unwrap();

    let amount = entity(host.model(), "a_amount").as_attribute().unwrap();
    assert_eq!(amount.datatype().map(|d| d.label()), Some("Money"));
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(store.path().join(cache_key(TYPES_URL)).is_file());

    // A second session reads the stored copy instead of fetching.
    let config = LoaderConfig::new()
        .with_profile_dir(store.path())
        .with_fetcher(StaticFetcher {
            url: TYPES_URL,
            body: String::new(),
            fetches: Arc::clone(&fetches),
        });
    let mut cached = ModelHost::with_config(config);
    cached.load_str("invoice.xmi", &fetched_user()).unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(
        entity(cached.model(), "a_amount")
            .as_attribute()
            .and_then(|a| a.datatype())
            .map(|d| d.qualified_name(".")),
        Some("Money".to_string())
    );
}

#[test]
fn test_offline_session_cannot_fetch() {
    let store = TempDir::new().unwrap();
    let config = LoaderConfig::new()
        .with_profile_dir(store.path())
        .with_fetcher(OfflineFetcher);
    let mut host = ModelHost::with_config(config);
    let err = host.load_str("invoice.xmi", &fetched_user()).unwrap_err();
    assert!(matches!(err.root_cause(), ModelError::Fetch { url, .. } if url == TYPES_URL));
    assert!(!store.path().join(cache_key(TYPES_URL)).exists());
}

#[cfg(feature = "http")]
mod over_http {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use umlgraph::HttpFetcher;

    /// Serve `body` to the first request on a local port.
    fn serve_once(body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
        });
        format!("http://{addr}/models/types.xmi")
    }

    #[test]
    fn test_http_fetch_then_store_then_reuse() {
        let url = serve_once(types_document());
        let user = fetched_user().replace(TYPES_URL, &url);
        let store = TempDir::new().unwrap();

        let client = reqwest::blocking::Client::builder().no_proxy().build().unwrap();
        let config = LoaderConfig::new()
            .with_profile_dir(store.path())
            .with_fetcher(HttpFetcher::with_client(client));
        let mut host = ModelHost::with_config(config);
        host.load_str("invoice.xmi", &user).unwrap();
        assert_eq!(entity(host.model(), "dt_money").label(), "Money");
        assert!(host.is_loaded(&DocumentId::Url(url.clone())));
        assert!(store.path().join(cache_key(&url)).is_file());

        // The server is gone; only the store can answer now.
        let config = LoaderConfig::new()
            .with_profile_dir(store.path())
            .with_fetcher(OfflineFetcher);
        let mut offline = ModelHost::with_config(config);
        offline.load_str("invoice.xmi", &user).unwrap();
        assert!(offline.model().contains_id("dt_money"));
    }
}

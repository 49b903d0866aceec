//! Entry point for loading and querying a model.
//!
//! `ModelHost` owns the session: the committed [`Model`], the [`Resolver`]
//! with its queue stack, and the memo of loaded documents.
//!
//! ## Quick start
//!
//! ```ignore
//! use umlgraph::ModelHost;
//!
//! let mut host = ModelHost::new();
//! host.load_path("sales.xmi")?;
//! for class in host.model().iter_kind(EntityKind::Class) {
//!     println!("{}", class.label());
//! }
//! ```
//!
//! ## Load protocol
//!
//! ```text
//! load(doc)                              top level: one transaction
//! ├── memo hit                     → no-op
//! ├── classify + build             → may call load_external(href):
//! │     ├── memo hit               → no-op
//! │     ├── in-progress hit        → fragment id is awaited
//! │     └── suspend queues, load nested doc, resume queues
//! │         (work waiting on awaited ids joins the outer queues)
//! ├── fixpoint (resolver.finish)
//! ├── memoize
//! └── every new association has two ends
//!                                  on any error: roll back model + memo
//! ```

use std::path::Path;

use indexmap::IndexSet;

use crate::config::LoaderConfig;
use crate::error::ModelError;
use crate::graph::dependencies::{self, DependencyMap};
use crate::model::{EntityData, Model};
use crate::resolve::Resolver;
use crate::source::{self, DocumentId};
use crate::validation::{ValidationReport, Validator};
use crate::xmi::{Classifier, DocumentBuilder, DocumentSession, ExternalDocument};

/// Owner of one loading session.
#[derive(Debug)]
pub struct ModelHost {
    model: Model,
    resolver: Resolver,
    /// Fully loaded documents, in load order.
    loaded: IndexSet<DocumentId>,
    /// Documents whose load has started but not finished.
    in_progress: IndexSet<DocumentId>,
    config: LoaderConfig,
}

impl Default for ModelHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelHost {
    // ── Construction ─────────────────────────────────────────────────

    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            model: Model::with_tag_defaults(config.tag_defaults.clone()),
            resolver: Resolver::new(),
            loaded: IndexSet::new(),
            in_progress: IndexSet::new(),
            config,
        }
    }

    /// Build from a file with the default configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let mut host = Self::new();
        host.load_path(path)?;
        Ok(host)
    }

    /// Build from an in-memory document with the default configuration.
    pub fn from_xmi(name: &str, bytes: &[u8]) -> Result<Self, ModelError> {
        let mut host = Self::new();
        host.load_bytes(name, bytes)?;
        Ok(host)
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Load a local file. Returns `false` if it was already loaded.
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<bool, ModelError> {
        self.load(DocumentId::from_path(path), None)
    }

    /// Load a network document or well-known profile.
    pub fn load_url(&mut self, url: &str) -> Result<bool, ModelError> {
        self.load(DocumentId::identify(url, None), None)
    }

    /// Load an in-memory document named `name`.
    ///
    /// Relative hrefs inside it resolve against the working directory.
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<bool, ModelError> {
        self.load(DocumentId::Inline(name.to_string()), Some(bytes))
    }

    pub fn load_str(&mut self, name: &str, xml: &str) -> Result<bool, ModelError> {
        self.load_bytes(name, xml.as_bytes())
    }

    /// Top-level load: all or nothing.
    fn load(&mut self, id: DocumentId, bytes: Option<&[u8]>) -> Result<bool, ModelError> {
        if self.loaded.contains(&id) {
            tracing::debug!(document = %id, "already loaded");
            return Ok(false);
        }
        let checkpoint = self.model.begin();
        let memo = self.loaded.len();
        let start = self.model.len();
        // Associations are checked once nested loads have handed back
        // their carried ends.
        let result = self
            .load_document(&id, bytes)
            .and_then(|()| self.check_associations(start));
        match result {
            Ok(()) => {
                self.model.commit(checkpoint);
                Ok(true)
            }
            Err(e) => {
                tracing::debug!(document = %id, error = %e, "load failed, rolling back");
                self.model.rollback(checkpoint);
                self.loaded.truncate(memo);
                self.in_progress.clear();
                self.resolver.reset();
                Err(e)
            }
        }
    }

    fn load_document(&mut self, id: &DocumentId, bytes: Option<&[u8]>) -> Result<(), ModelError> {
        let fetched;
        let input = match bytes {
            Some(bytes) => bytes,
            None => {
                fetched = source::read_document(id, &self.config)?;
                fetched.as_slice()
            }
        };

        tracing::debug!(document = %id, depth = self.resolver.depth(), "loading");
        let start = self.model.len();
        self.in_progress.insert(id.clone());
        let result = self.parse_document(id, input);
        self.in_progress.shift_remove(id);
        result?;

        self.loaded.insert(id.clone());
        tracing::debug!(document = %id, entities = self.model.len() - start, "loaded");
        Ok(())
    }

    fn parse_document(&mut self, id: &DocumentId, input: &[u8]) -> Result<(), ModelError> {
        let name = id.to_string();
        let mut builder = DocumentBuilder::new(self, id.clone());
        Classifier::new(name.clone()).run(input, &mut builder)?;
        self.resolver.finish(&mut self.model, &name)
    }

    /// Every association created since `start` must have exactly two ends.
    fn check_associations(&self, start: usize) -> Result<(), ModelError> {
        for view in self.model.iter().skip(start) {
            if let EntityData::Association { ends } = view.data() {
                if ends.len() != 2 {
                    return Err(ModelError::MalformedAssociation {
                        id: view.id().to_string(),
                        ends: ends.len(),
                    });
                }
            }
        }
        Ok(())
    }

    // ── Access ───────────────────────────────────────────────────────

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loaded documents, in load order.
    pub fn loaded_documents(&self) -> impl Iterator<Item = &DocumentId> {
        self.loaded.iter()
    }

    pub fn is_loaded(&self, id: &DocumentId) -> bool {
        self.loaded.contains(id)
    }

    // ── Analysis ─────────────────────────────────────────────────────

    /// Dependency set of every package.
    pub fn dependencies(&self) -> DependencyMap {
        dependencies::package_dependencies(&self.model, &self.config)
    }

    /// Dependency sets, failing on packages that depend on each other.
    pub fn checked_dependencies(&self) -> Result<DependencyMap, ModelError> {
        let map = self.dependencies();
        dependencies::check_circular(&map)?;
        Ok(map)
    }

    pub fn validate(&self) -> ValidationReport {
        Validator::new(&self.model).run()
    }
}

impl DocumentSession for ModelHost {
    fn parts(&mut self) -> (&mut Model, &mut Resolver) {
        (&mut self.model, &mut self.resolver)
    }

    fn load_external(&mut self, url: &str, from: &DocumentId) -> Result<ExternalDocument, ModelError> {
        let id = DocumentId::identify(url, Some(from));
        if self.in_progress.contains(&id) {
            tracing::trace!(document = %id, "reference into a document still loading");
            return Ok(ExternalDocument::Loading);
        }
        if self.loaded.contains(&id) {
            tracing::trace!(document = %id, "memo hit");
            return Ok(ExternalDocument::Loaded);
        }
        self.resolver.suspend();
        let result = self.load_document(&id, None);
        self.resolver.resume();
        result.map(|()| ExternalDocument::Loaded)
    }
}

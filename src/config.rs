//! Loader configuration.

use std::path::PathBuf;

use directories::{BaseDirs, ProjectDirs};

use crate::base::constants::BASE_NAMESPACES;
use crate::model::{EntityKind, TagDefaults};
use crate::source::{self, Fetcher};

/// Settings of a [`ModelHost`](crate::ModelHost) session.
#[derive(Debug)]
pub struct LoaderConfig {
    /// Local profile store: well-known profiles by file name, fetched
    /// documents by URL hash. `None` disables the store.
    pub profile_dir: Option<PathBuf>,
    /// Fall back to the profiles shipped with the crate.
    pub bundled_profiles: bool,
    /// Namespaces excluded from package dependency sets.
    pub base_namespaces: Vec<String>,
    /// Kind-level default tags.
    pub tag_defaults: TagDefaults,
    /// Source of network documents; HTTP unless built without `http`.
    pub fetcher: Box<dyn Fetcher>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            profile_dir: default_profile_dir(),
            bundled_profiles: true,
            base_namespaces: BASE_NAMESPACES.iter().map(|s| s.to_string()).collect(),
            tag_defaults: TagDefaults::default(),
            fetcher: source::default_fetcher(),
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(dir.into());
        self
    }

    /// Never read or write the local profile store.
    pub fn without_profile_dir(mut self) -> Self {
        self.profile_dir = None;
        self
    }

    pub fn with_bundled_profiles(mut self, enabled: bool) -> Self {
        self.bundled_profiles = enabled;
        self
    }

    pub fn with_base_namespaces<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_namespaces = names.into_iter().map(Into::into).collect();
        self
    }

    /// Default value of tag `name` for every entity of `kind`.
    pub fn with_tag_default(
        mut self,
        kind: EntityKind,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.tag_defaults
            .entry(kind)
            .or_default()
            .insert(name.into(), value.into());
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn is_base_namespace(&self, name: &str) -> bool {
        self.base_namespaces.iter().any(|n| n == name)
    }
}

/// Platform data directory for profiles, else `~/.umlgraph/profiles`.
pub fn default_profile_dir() -> Option<PathBuf> {
    if let Some(dirs) = ProjectDirs::from("org", "umlgraph", "umlgraph") {
        return Some(dirs.data_dir().join("profiles"));
    }
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".umlgraph").join("profiles"))
}

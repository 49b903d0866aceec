//! Tag dictionaries.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::entity::EntityKind;

/// Kind-level default tags, merged under explicit tagged values.
pub type TagDefaults = FxHashMap<EntityKind, IndexMap<String, String>>;

/// Snapshot of an entity's tags: tag-definition name to value.
///
/// Built fresh on every query from the kind defaults followed by the
/// entity's tagged values in creation order; later values win.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagDictionary {
    entries: IndexMap<String, String>,
}

impl TagDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// The value of `name`, or `default` when the tag is absent.
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// A comma-separated tag split into trimmed, non-empty items.
    pub fn list(&self, name: &str) -> Vec<&str> {
        self.get(name)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

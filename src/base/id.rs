use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifier of an interchange element.
///
/// This corresponds to `xmi.id` on a definition, `xmi.idref` on a local
/// reference, and the fragment of an `href` on a cross-document reference.
/// Ids only live on during resolution: once an entity is committed, other
/// entities point at it through an [`EntityRef`](crate::model::EntityRef).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XmiId(pub Arc<str>);

impl XmiId {
    /// Create a new id.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for XmiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for XmiId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for XmiId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for XmiId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

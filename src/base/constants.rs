//! Domain constants shared across the crate.

/// Local name of the interchange envelope element.
pub const XMI_ENVELOPE: &str = "XMI";

/// Attribute carrying the id of a definition.
pub const ATTR_ID: &str = "xmi.id";
/// Attribute carrying the id of a local reference.
pub const ATTR_IDREF: &str = "xmi.idref";
/// Attribute carrying a cross-document reference (`url#fragment`).
pub const ATTR_HREF: &str = "href";

/// Namespaces every generated module may use without declaring them.
pub const BASE_NAMESPACES: &[&str] = &["res", "ir"];

/// URL prefixes of profiles shipped with ArgoUML.
///
/// Documents under these prefixes are looked up by file name in the local
/// profile directory, then in the bundled copies.
pub const PROFILE_URL_PREFIXES: &[&str] = &[
    "http://argouml.org/user-profiles/",
    "http://argouml.org/profiles/uml14/",
];

/// Tag names with a meaning for the graph algorithms.
pub mod tags {
    /// Target of a computed relation.
    pub const RELATED_TO: &str = "related_to";
    /// Association path walked to reach a `related_to` target.
    pub const RELATED_BY: &str = "related_by";
    /// Comma-separated list of explicit package dependencies.
    pub const DEPENDS: &str = "depends";
    /// Field width of an attribute.
    pub const SIZE: &str = "size";
    pub const LABEL: &str = "label";
    pub const DOCUMENTATION: &str = "documentation";
}

/// Stereotype names with a meaning for the graph algorithms.
pub mod stereotypes {
    /// Package provided by another system; excluded from dependency analysis.
    pub const EXTERNAL: &str = "external";
    /// Generalization that extends its parent in place.
    pub const EXTEND: &str = "extend";
    pub const MENU: &str = "menu";
    pub const SERVER_ACTION: &str = "server_action";
    pub const GROUP: &str = "group";
    pub const EXCEPTIONAL: &str = "exceptional";
}

//! core::types
//!
//! Strong types for the virtual object tree.
//!
//! # Types
//!
//! - [`ObjectType`] - The six fixed categories under the overlay entry
//! - [`ProviderConfig`] - Which revision or index view a provider serves
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RefName`] - Validated Git reference name
//!
//! # Examples
//!
//! ```
//! use gitoverlay::core::types::{ObjectType, Oid, RefName};
//!
//! assert_eq!(ObjectType::from_name("changesInIndex"), Some(ObjectType::ChangesInIndex));
//! assert!(ObjectType::from_name("stash").is_none());
//!
//! let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
//! assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
//!
//! let refname = RefName::new("refs/tags/v1.0").unwrap();
//! assert_eq!(refname.tag_name(), Some("v1.0"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// A category of virtual objects exposed under the overlay entry.
///
/// The declaration order is the listing order of the overlay root and is
/// part of the contract; see [`ObjectType::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// The checked-out revision.
    #[serde(rename = "HEAD")]
    Head,
    /// Local branches, one directory per branch.
    #[serde(rename = "branches")]
    Branches,
    /// Tags, one directory per tag.
    #[serde(rename = "tags")]
    Tags,
    /// Every reachable commit, one directory per commit id.
    #[serde(rename = "commits")]
    Commits,
    /// The staged index.
    #[serde(rename = "index")]
    Index,
    /// Index entries that differ from `HEAD`.
    #[serde(rename = "changesInIndex")]
    ChangesInIndex,
}

impl ObjectType {
    /// All object types in overlay-root listing order.
    pub const ALL: [ObjectType; 6] = [
        ObjectType::Head,
        ObjectType::Branches,
        ObjectType::Tags,
        ObjectType::Commits,
        ObjectType::Index,
        ObjectType::ChangesInIndex,
    ];

    /// The directory name of this object type.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Head => "HEAD",
            ObjectType::Branches => "branches",
            ObjectType::Tags => "tags",
            ObjectType::Commits => "commits",
            ObjectType::Index => "index",
            ObjectType::ChangesInIndex => "changesInIndex",
        }
    }

    /// Parse a directory name. Matching is exact (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Whether this type has a name level (`branches/<name>`, ...).
    ///
    /// `HEAD`, `index` and `changesInIndex` map straight onto a file tree.
    ///
    /// ```
    /// use gitoverlay::core::types::ObjectType;
    ///
    /// assert!(ObjectType::Tags.has_names());
    /// assert!(!ObjectType::Index.has_names());
    /// ```
    pub fn has_names(self) -> bool {
        matches!(
            self,
            ObjectType::Branches | ObjectType::Tags | ObjectType::Commits
        )
    }

    /// The overlay-root listing, as owned names.
    pub fn listing() -> Vec<String> {
        Self::ALL.iter().map(|t| t.as_str().to_string()).collect()
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects the view a data provider serves for one repository.
///
/// Two configs share a provider iff their [canonical](Self::canonical)
/// forms are equal. Canonicalization lowers an unset `use_index` to
/// `Some(false)`, so "unset" and "explicitly false" collapse together.
/// `use_changes_in_index` is keyed as given.
///
/// The `Display` impl renders the canonical JSON serialization.
///
/// ```
/// use gitoverlay::core::types::ProviderConfig;
///
/// let unset = ProviderConfig { use_index: None, use_changes_in_index: None, revision_ref: "main".into() };
/// let explicit = ProviderConfig { use_index: Some(false), ..unset.clone() };
/// assert_eq!(unset.canonical(), explicit.canonical());
/// assert_eq!(unset.to_string(), r#"{"useIndex":false,"revisionRef":"main"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_changes_in_index: Option<bool>,
    pub revision_ref: String,
}

impl ProviderConfig {
    /// Config for the type-level views (`HEAD`, `index`, `changesInIndex`).
    pub fn for_head_view(object_type: ObjectType) -> Self {
        Self {
            use_index: Some(object_type == ObjectType::Index),
            use_changes_in_index: Some(object_type == ObjectType::ChangesInIndex),
            revision_ref: "HEAD".to_string(),
        }
    }

    /// Config for `<object_type>/<name>`, pinned to the namespace the name
    /// is listed under: `refs/heads/<name>` for branches, `refs/tags/<name>`
    /// for tags and the full commit id for commits.
    ///
    /// # Errors
    ///
    /// Returns a `TypeError` if `name` cannot be a branch, tag or commit id,
    /// or if `object_type` has no name level.
    ///
    /// ```
    /// use gitoverlay::core::types::{ObjectType, ProviderConfig};
    ///
    /// let config = ProviderConfig::for_name(ObjectType::Tags, "v1").unwrap();
    /// assert_eq!(config.revision_ref, "refs/tags/v1");
    /// assert!(ProviderConfig::for_name(ObjectType::Branches, "main~1").is_err());
    /// ```
    pub fn for_name(object_type: ObjectType, name: &str) -> Result<Self, TypeError> {
        let revision = match object_type {
            ObjectType::Branches | ObjectType::Tags => {
                let namespace = if object_type == ObjectType::Branches {
                    "refs/heads/"
                } else {
                    "refs/tags/"
                };
                let refname = RefName::new(format!("{namespace}{name}"))?;
                if refname.short_name_for(object_type) != Some(name) {
                    return Err(TypeError::InvalidRefName(format!(
                        "'{name}' is not a single-level {object_type} name"
                    )));
                }
                refname.to_string()
            }
            ObjectType::Commits => Oid::new(name)?.to_string(),
            _ => {
                return Err(TypeError::InvalidRefName(format!(
                    "{object_type} has no names"
                )))
            }
        };
        Ok(Self::for_revision(revision))
    }

    /// Config for an exact revision: a full ref name or a commit id.
    pub fn for_revision(revision_ref: impl Into<String>) -> Self {
        Self {
            use_index: Some(false),
            use_changes_in_index: None,
            revision_ref: revision_ref.into(),
        }
    }

    /// The cache-equivalence form of this config.
    pub fn canonical(&self) -> Self {
        Self {
            use_index: Some(self.use_index.unwrap_or(false)),
            use_changes_in_index: self.use_changes_in_index,
            revision_ref: self.revision_ref.clone(),
        }
    }

    pub fn wants_index(&self) -> bool {
        self.use_index.unwrap_or(false)
    }

    pub fn wants_changes_in_index(&self) -> bool {
        self.use_changes_in_index.unwrap_or(false)
    }
}

impl fmt::Display for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.canonical()).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated, fully qualified Git reference name (`refs/...` or `HEAD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Short name of a local branch ref, if this is a single-level
    /// `refs/heads/<name>`.
    ///
    /// Nested names (`refs/heads/feature/x`) are not addressable as one
    /// path fragment and yield `None`.
    pub fn branch_name(&self) -> Option<&str> {
        Self::single_level(self.0.strip_prefix("refs/heads/")?)
    }

    /// Short name of a tag ref, if this is a single-level `refs/tags/<name>`.
    pub fn tag_name(&self) -> Option<&str> {
        Self::single_level(self.0.strip_prefix("refs/tags/")?)
    }

    /// Short name of this ref within the namespace listed by `object_type`.
    pub fn short_name_for(&self, object_type: ObjectType) -> Option<&str> {
        match object_type {
            ObjectType::Branches => self.branch_name(),
            ObjectType::Tags => self.tag_name(),
            _ => None,
        }
    }

    fn single_level(rest: &str) -> Option<&str> {
        (!rest.is_empty() && !rest.contains('/')).then_some(rest)
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidRefName("ref name cannot be empty".into()));
        }
        if name.starts_with('/') || name.ends_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot start or end with '/'".into(),
            ));
        }
        if name.ends_with(".lock") {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '.lock'".into(),
            ));
        }
        for bad in ["..", "@{", "//"] {
            if name.contains(bad) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{bad}'"
                )));
            }
        }
        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if let Some(c) = name
            .chars()
            .find(|c| INVALID_CHARS.contains(c) || c.is_ascii_control())
        {
            return Err(TypeError::InvalidRefName(format!(
                "ref name cannot contain {c:?}"
            )));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod object_type {
        use super::*;

        #[test]
        fn listing_order_is_fixed() {
            assert_eq!(
                ObjectType::listing(),
                vec!["HEAD", "branches", "tags", "commits", "index", "changesInIndex"]
            );
        }

        #[test]
        fn parse_is_exact() {
            for t in ObjectType::ALL {
                assert_eq!(ObjectType::from_name(t.as_str()), Some(t));
            }
            assert_eq!(ObjectType::from_name("head"), None);
            assert_eq!(ObjectType::from_name("Branches"), None);
            assert_eq!(ObjectType::from_name(""), None);
        }

        #[test]
        fn only_ref_like_types_have_names() {
            let named: Vec<_> = ObjectType::ALL.into_iter().filter(|t| t.has_names()).collect();
            assert_eq!(
                named,
                vec![ObjectType::Branches, ObjectType::Tags, ObjectType::Commits]
            );
        }

        #[test]
        fn serde_uses_directory_names() {
            let json = serde_json::to_string(&ObjectType::ChangesInIndex).unwrap();
            assert_eq!(json, "\"changesInIndex\"");
        }
    }

    mod provider_config {
        use super::*;

        #[test]
        fn unset_index_flag_collapses_with_false() {
            let a = ProviderConfig {
                use_index: None,
                use_changes_in_index: None,
                revision_ref: "HEAD".into(),
            };
            let b = ProviderConfig {
                use_index: Some(false),
                ..a.clone()
            };
            assert_ne!(a, b);
            assert_eq!(a.canonical(), b.canonical());
            assert_eq!(a.to_string(), b.to_string());
        }

        #[test]
        fn index_true_is_distinct() {
            let a = ProviderConfig::for_head_view(ObjectType::Index);
            let b = ProviderConfig::for_head_view(ObjectType::Head);
            assert_ne!(a.canonical(), b.canonical());
            assert!(a.wants_index());
            assert!(!b.wants_index());
        }

        #[test]
        fn head_view_flags() {
            let c = ProviderConfig::for_head_view(ObjectType::ChangesInIndex);
            assert!(c.wants_changes_in_index());
            assert!(!c.wants_index());
            assert_eq!(c.revision_ref, "HEAD");
        }

        #[test]
        fn names_are_pinned_to_their_namespace() {
            let branch = ProviderConfig::for_name(ObjectType::Branches, "rel").unwrap();
            let tag = ProviderConfig::for_name(ObjectType::Tags, "rel").unwrap();
            assert_eq!(branch.revision_ref, "refs/heads/rel");
            assert_eq!(tag.revision_ref, "refs/tags/rel");
            assert_ne!(branch.canonical(), tag.canonical());

            let sha = "ABCDEF1234567890ABCDEF1234567890ABCDEF12";
            let commit = ProviderConfig::for_name(ObjectType::Commits, sha).unwrap();
            assert_eq!(commit.revision_ref, sha.to_ascii_lowercase());
        }

        #[test]
        fn revision_expressions_are_not_names() {
            assert!(ProviderConfig::for_name(ObjectType::Branches, "main~1").is_err());
            assert!(ProviderConfig::for_name(ObjectType::Tags, "v1^{}").is_err());
            assert!(ProviderConfig::for_name(ObjectType::Commits, "HEAD").is_err());
            assert!(ProviderConfig::for_name(ObjectType::Commits, "abc123").is_err());
            assert!(ProviderConfig::for_name(ObjectType::Index, "x").is_err());
        }

        #[test]
        fn canonical_serialization() {
            let c = ProviderConfig::for_head_view(ObjectType::Index);
            assert_eq!(
                c.to_string(),
                r#"{"useIndex":true,"useChangesInIndex":false,"revisionRef":"HEAD"}"#
            );
        }
    }

    mod oid {
        use super::*;

        #[test]
        fn normalizes_to_lowercase() {
            let oid = Oid::new("ABCDEF1234567890ABCDEF1234567890ABCDEF12").unwrap();
            assert_eq!(oid.as_str(), "abcdef1234567890abcdef1234567890abcdef12");
        }

        #[test]
        fn invalid_length() {
            assert!(Oid::new("abc").is_err());
        }

        #[test]
        fn non_hex_rejected() {
            assert!(Oid::new("g".repeat(40)).is_err());
        }
    }

    mod ref_name {
        use super::*;

        #[test]
        fn branch_and_tag_short_names() {
            let head = RefName::new("refs/heads/master").unwrap();
            assert_eq!(head.branch_name(), Some("master"));
            assert_eq!(head.tag_name(), None);
            assert_eq!(head.short_name_for(ObjectType::Branches), Some("master"));
            assert_eq!(head.short_name_for(ObjectType::Tags), None);

            let tag = RefName::new("refs/tags/myTag").unwrap();
            assert_eq!(tag.short_name_for(ObjectType::Tags), Some("myTag"));
        }

        #[test]
        fn nested_names_are_not_listed() {
            let nested = RefName::new("refs/heads/feature/x").unwrap();
            assert_eq!(nested.branch_name(), None);
        }

        #[test]
        fn other_namespaces_are_not_listed() {
            let remote = RefName::new("refs/remotes/origin/main").unwrap();
            assert_eq!(remote.branch_name(), None);
            assert_eq!(remote.tag_name(), None);
        }

        #[test]
        fn invalid_rejected() {
            assert!(RefName::new("").is_err());
            assert!(RefName::new("refs/heads/a..b").is_err());
            assert!(RefName::new("refs/heads/x.lock").is_err());
            assert!(RefName::new("refs/heads/has space").is_err());
        }
    }
}

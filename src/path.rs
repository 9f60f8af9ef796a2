//! Folder path normalization for the storage listing API.
//!
//! The listing protocol addresses the account root with the empty string and
//! every other folder with an absolute, `/`-prefixed path. [`FolderPath`] is
//! the only way the harvester hands a path to a [`StorageClient`], so raw user
//! input always passes through [`FolderPath::normalize`] first.
//!
//! [`StorageClient`]: crate::storage::StorageClient

use std::fmt;

use serde::Serialize;

/// Canonical folder path accepted by the listing protocol.
///
/// Either the empty string (account root) or a string starting with `/`.
/// Only the leading slash is canonicalized: a trailing `/` is kept as typed,
/// so `"docs/"` becomes `"/docs/"`, and the provider decides whether it is
/// acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FolderPath(String);

impl FolderPath {
    /// The account root.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalizes raw user input into canonical form.
    ///
    /// Surrounding whitespace is trimmed. An empty value or a bare `/` becomes
    /// the root; anything else gets a leading `/` when it lacks one. No other
    /// validation happens here: a malformed path is reported by the listing
    /// call that uses it.
    ///
    /// ```
    /// use harvester_core::FolderPath;
    ///
    /// assert_eq!(FolderPath::normalize("  / ").as_str(), "");
    /// assert_eq!(FolderPath::normalize("Documents/Papers").as_str(), "/Documents/Papers");
    /// assert_eq!(FolderPath::normalize("/Documents").as_str(), "/Documents");
    /// assert_eq!(FolderPath::normalize("docs/").as_str(), "/docs/");
    /// ```
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Self::root();
        }
        if trimmed.starts_with('/') {
            Self(trimmed.to_string())
        } else {
            Self(format!("/{trimmed}"))
        }
    }

    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when this path addresses the account root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl AsRef<str> for FolderPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_root_variants_yield_empty_string() {
        for raw in ["", "/", "   ", " / ", "\t/\n", "\n"] {
            assert_eq!(FolderPath::normalize(raw).as_str(), "", "input: {raw:?}");
            assert!(FolderPath::normalize(raw).is_root());
        }
    }

    #[test]
    fn test_normalize_prepends_single_slash() {
        assert_eq!(FolderPath::normalize("docs").as_str(), "/docs");
        assert_eq!(
            FolderPath::normalize("Work/Reports 2024").as_str(),
            "/Work/Reports 2024"
        );
    }

    #[test]
    fn test_normalize_keeps_trailing_slash() {
        assert_eq!(FolderPath::normalize("docs/").as_str(), "/docs/");
        assert_eq!(FolderPath::normalize("/docs/").as_str(), "/docs/");
        assert_eq!(FolderPath::normalize(" a/b/ ").as_str(), "/a/b/");
    }

    #[test]
    fn test_normalize_trims_before_prefixing() {
        assert_eq!(FolderPath::normalize("  docs  ").as_str(), "/docs");
        assert_eq!(FolderPath::normalize("\t/docs\n").as_str(), "/docs");
    }

    #[test]
    fn test_normalize_keeps_absolute_path_unchanged() {
        assert_eq!(FolderPath::normalize("/A/B").as_str(), "/A/B");
        assert_eq!(FolderPath::normalize("//double").as_str(), "//double");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["/docs", "docs", " /a/b ", "/", "", "x/y/z.pdf", "//double"] {
            let once = FolderPath::normalize(raw);
            let twice = FolderPath::normalize(once.as_str());
            assert_eq!(once, twice, "input: {raw:?}");
        }
    }

    #[test]
    fn test_display_renders_root_as_slash() {
        assert_eq!(FolderPath::root().to_string(), "/");
        assert_eq!(FolderPath::normalize("docs").to_string(), "/docs");
    }
}

//! Listing data model returned by the storage protocol.

use serde::Deserialize;

/// Metadata shared by every listed object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntryMetadata {
    /// Leaf name of the object.
    pub name: String,
    /// Lowercased full remote path, used as the identifier for fetches.
    #[serde(default)]
    pub path_lower: String,
    /// Full remote path with the user's casing, used for local layout.
    #[serde(default)]
    pub path_display: String,
}

impl EntryMetadata {
    /// Builds metadata from a display path, deriving the leaf name and the
    /// lowercased identifier.
    #[must_use]
    pub fn from_display_path(path_display: impl Into<String>) -> Self {
        let path_display = path_display.into();
        let name = path_display
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            path_lower: path_display.to_lowercase(),
            path_display,
        }
    }
}

/// One object from a folder listing.
///
/// The protocol tags each entry with `.tag`; only [`RemoteEntry::File`] is
/// ever a download candidate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = ".tag", rename_all = "lowercase")]
pub enum RemoteEntry {
    /// A regular file.
    File(EntryMetadata),
    /// A folder.
    Folder(EntryMetadata),
    /// A tombstone for a removed object.
    Deleted(EntryMetadata),
}

impl RemoteEntry {
    /// Shorthand for a file entry at `path_display`.
    #[must_use]
    pub fn file(path_display: impl Into<String>) -> Self {
        Self::File(EntryMetadata::from_display_path(path_display))
    }

    /// Shorthand for a folder entry at `path_display`.
    #[must_use]
    pub fn folder(path_display: impl Into<String>) -> Self {
        Self::Folder(EntryMetadata::from_display_path(path_display))
    }

    /// Shorthand for a deleted entry at `path_display`.
    #[must_use]
    pub fn deleted(path_display: impl Into<String>) -> Self {
        Self::Deleted(EntryMetadata::from_display_path(path_display))
    }

    #[must_use]
    pub fn metadata(&self) -> &EntryMetadata {
        match self {
            Self::File(meta) | Self::Folder(meta) | Self::Deleted(meta) => meta,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    #[must_use]
    pub fn path_lower(&self) -> &str {
        &self.metadata().path_lower
    }

    #[must_use]
    pub fn path_display(&self) -> &str {
        &self.metadata().path_display
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Returns the file metadata when this entry is a file.
    #[must_use]
    pub fn as_file(&self) -> Option<&EntryMetadata> {
        match self {
            Self::File(meta) => Some(meta),
            Self::Folder(_) | Self::Deleted(_) => None,
        }
    }
}

/// One batch of listing results plus the continuation state.
///
/// When `has_more` is set, `cursor` must be non-empty and is passed to
/// `list_folder_continue` to fetch the next batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingPage {
    /// Entries in protocol order.
    pub entries: Vec<RemoteEntry>,
    /// Opaque continuation token.
    #[serde(default)]
    pub cursor: String,
    /// Whether another page follows.
    #[serde(default)]
    pub has_more: bool,
}

impl ListingPage {
    /// A final page (no continuation).
    #[must_use]
    pub fn last(entries: Vec<RemoteEntry>) -> Self {
        Self {
            entries,
            cursor: String::new(),
            has_more: false,
        }
    }

    /// A page followed by more results under `cursor`.
    #[must_use]
    pub fn continued(entries: Vec<RemoteEntry>, cursor: impl Into<String>) -> Self {
        Self {
            entries,
            cursor: cursor.into(),
            has_more: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_page_deserializes_tagged_entries() {
        let body = r#"{
            "entries": [
                {".tag": "folder", "name": "Reports", "path_lower": "/reports", "path_display": "/Reports", "id": "id:1"},
                {".tag": "file", "name": "Q1.PDF", "path_lower": "/reports/q1.pdf", "path_display": "/Reports/Q1.PDF", "size": 1024, "id": "id:2"},
                {".tag": "deleted", "name": "old.pdf", "path_lower": "/reports/old.pdf", "path_display": "/Reports/old.pdf"}
            ],
            "cursor": "AAE-cursor",
            "has_more": true
        }"#;

        let page: ListingPage = serde_json::from_str(body).unwrap();

        assert_eq!(page.entries.len(), 3);
        assert!(matches!(page.entries[0], RemoteEntry::Folder(_)));
        assert!(page.entries[1].is_file());
        assert_eq!(page.entries[1].name(), "Q1.PDF");
        assert_eq!(page.entries[1].path_lower(), "/reports/q1.pdf");
        assert_eq!(page.entries[1].path_display(), "/Reports/Q1.PDF");
        assert!(matches!(page.entries[2], RemoteEntry::Deleted(_)));
        assert_eq!(page.cursor, "AAE-cursor");
        assert!(page.has_more);
    }

    #[test]
    fn test_listing_page_missing_paths_default_to_empty() {
        let body = r#"{"entries": [{".tag": "file", "name": "a.pdf"}], "cursor": "c", "has_more": false}"#;
        let page: ListingPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.entries[0].path_display(), "");
        assert_eq!(page.entries[0].path_lower(), "");
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let body = r#"{"entries": [{".tag": "symlink", "name": "x"}], "cursor": "", "has_more": false}"#;
        assert!(serde_json::from_str::<ListingPage>(body).is_err());
    }

    #[test]
    fn test_entry_helpers_derive_name_and_lower_path() {
        let entry = RemoteEntry::file("/Team/Specs/Design.PDF");
        assert_eq!(entry.name(), "Design.PDF");
        assert_eq!(entry.path_lower(), "/team/specs/design.pdf");
        assert!(entry.as_file().is_some());
        assert!(RemoteEntry::folder("/Team").as_file().is_none());
        assert!(!RemoteEntry::deleted("/gone.pdf").is_file());
    }
}

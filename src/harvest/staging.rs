//! Invocation-scoped local staging directory.
//!
//! Each harvest writes into its own freshly created directory whose layout
//! mirrors the remote tree, so two files with the same leaf name in different
//! remote folders never collide. The directory outlives the harvest: cleanup
//! belongs to whoever asked for the harvest.

use std::io;
use std::path::{Component, Path, PathBuf};

use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::debug;

use super::HarvestError;

/// Name prefix of every staging directory.
pub const STAGING_PREFIX: &str = "pdf-harvest-";

/// Length of the random suffix appended to [`STAGING_PREFIX`].
const SUFFIX_LEN: usize = 12;

/// Attempts before giving up on finding an unused directory name.
const MAX_CREATE_ATTEMPTS: usize = 8;

/// A uniquely named directory exclusively owned by one harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Creates a new staging directory under `parent`.
    ///
    /// `parent` is created if absent. The staging directory itself is created
    /// with exclusive semantics (`create_dir`, not `create_dir_all`), so a name
    /// already taken by a concurrent invocation is never reused.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Staging`] if the directory cannot be created.
    pub async fn create_in(parent: &Path) -> Result<Self, HarvestError> {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| HarvestError::staging(parent, e))?;

        let mut last_collision = None;
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let candidate = parent.join(format!("{STAGING_PREFIX}{}", random_suffix()));
            match tokio::fs::create_dir(&candidate).await {
                Ok(()) => {
                    debug!(path = %candidate.display(), "created staging directory");
                    return Ok(Self { root: candidate });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %candidate.display(), "staging name taken, retrying");
                    last_collision = Some(e);
                }
                Err(e) => return Err(HarvestError::staging(parent, e)),
            }
        }

        let error = last_collision.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AlreadyExists, "no unused staging name found")
        });
        Err(HarvestError::staging(parent, error))
    }

    /// Root directory of this staging area.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Consumes the area, returning its root. Nothing is deleted.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        self.root
    }

    /// Maps a remote display path to its local target under this area.
    ///
    /// The single leading `/` is stripped and the rest is joined onto the
    /// root. Returns `None` when the result would be the root itself or could
    /// leave it (`..`, `.`, absolute or prefixed components).
    #[must_use]
    pub fn target_for(&self, path_display: &str) -> Option<PathBuf> {
        let relative = path_display.strip_prefix('/').unwrap_or(path_display);
        if relative.is_empty() {
            return None;
        }

        let relative = Path::new(relative);
        let mut has_segment = false;
        for component in relative.components() {
            match component {
                Component::Normal(_) => has_segment = true,
                Component::CurDir
                | Component::ParentDir
                | Component::RootDir
                | Component::Prefix(_) => return None,
            }
        }
        has_segment.then(|| self.root.join(relative))
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn area(root: &str) -> StagingArea {
        StagingArea {
            root: PathBuf::from(root),
        }
    }

    #[tokio::test]
    async fn test_create_in_makes_distinct_prefixed_directories() {
        let temp_dir = TempDir::new().unwrap();

        let first = StagingArea::create_in(temp_dir.path()).await.unwrap();
        let second = StagingArea::create_in(temp_dir.path()).await.unwrap();

        assert_ne!(first.root(), second.root());
        for staging in [&first, &second] {
            assert!(staging.root().is_dir());
            assert_eq!(staging.root().parent(), Some(temp_dir.path()));
            let name = staging.root().file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with(STAGING_PREFIX), "unexpected name: {name}");
            assert_eq!(name.len(), STAGING_PREFIX.len() + SUFFIX_LEN);
        }
    }

    #[tokio::test]
    async fn test_create_in_creates_missing_parent() {
        let temp_dir = TempDir::new().unwrap();
        let parent = temp_dir.path().join("nested").join("parent");

        let staging = StagingArea::create_in(&parent).await.unwrap();

        assert!(staging.root().starts_with(&parent));
        assert!(staging.root().is_dir());
    }

    #[tokio::test]
    async fn test_create_in_fails_when_parent_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let result = StagingArea::create_in(&blocker).await;

        assert!(matches!(result, Err(HarvestError::Staging { .. })));
    }

    #[test]
    fn test_target_for_mirrors_remote_structure() {
        let staging = area("/tmp/pdf-harvest-abc");
        assert_eq!(
            staging.target_for("/Reports/2024/Q1.pdf"),
            Some(PathBuf::from("/tmp/pdf-harvest-abc/Reports/2024/Q1.pdf"))
        );
        assert_eq!(
            staging.target_for("top.pdf"),
            Some(PathBuf::from("/tmp/pdf-harvest-abc/top.pdf"))
        );
    }

    #[test]
    fn test_target_for_same_leaf_name_in_different_folders_is_distinct() {
        let staging = area("/tmp/pdf-harvest-abc");
        let a = staging.target_for("/A/notes.pdf").unwrap();
        let b = staging.target_for("/B/notes.pdf").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.file_name(), b.file_name());
    }

    #[test]
    fn test_target_for_rejects_escaping_or_empty_paths() {
        let staging = area("/tmp/pdf-harvest-abc");
        for bad in ["", "/", "/../etc/passwd.pdf", "/a/../../b.pdf", "//abs.pdf", "/./x.pdf"] {
            assert_eq!(staging.target_for(bad), None, "input: {bad:?}");
        }
    }

    #[test]
    fn test_into_path_returns_root() {
        let staging = area("/tmp/pdf-harvest-xyz");
        assert_eq!(staging.into_path(), PathBuf::from("/tmp/pdf-harvest-xyz"));
    }
}

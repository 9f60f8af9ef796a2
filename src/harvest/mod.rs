//! Folder-scoped PDF harvesting.
//!
//! A harvest runs four phases, strictly one after another:
//!
//! 1. Enumerate the folder recursively, following the listing cursor chain
//!    until the protocol reports no more pages.
//! 2. Keep file entries whose name ends in `.pdf` (any case).
//! 3. Create a fresh [`StagingArea`] and download each candidate into it,
//!    mirroring the remote directory layout.
//! 4. Report the leaf names that were retrieved.
//!
//! A failed download skips that file and the batch continues. Missing
//! configuration, listing failures and rejected credentials abort the whole
//! harvest.
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::harvest::Harvester;
//! use harvester_core::storage::{DropboxClient, DropboxSettings, StorageClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DropboxClient::from_settings(&DropboxSettings::with_token("sl.token"))?;
//! let harvester = Harvester::new(std::env::temp_dir());
//! let result = harvester
//!     .harvest(client.as_ref().map(|c| c as &dyn StorageClient), "Papers/2024")
//!     .await?;
//! println!("{} PDFs in {}", result.count(), result.staging_dir().display());
//! # Ok(())
//! # }
//! ```

mod error;
mod staging;

pub use error::HarvestError;
pub use staging::{STAGING_PREFIX, StagingArea};

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::ser::SerializeStruct;
use tracing::{debug, info, instrument, warn};

use crate::path::FolderPath;
use crate::storage::{EntryMetadata, RemoteEntry, StorageClient, StorageError};

/// Extension (without the dot) that marks a download candidate.
const PDF_EXTENSION: &str = "pdf";

/// Outcome of one harvest invocation.
///
/// Files that failed to download are simply absent. The staging directory is
/// NOT removed when this value is dropped: the caller owns it and is
/// responsible for cleaning it up once the files are no longer needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestResult {
    staging_dir: PathBuf,
    retrieved_filenames: Vec<String>,
}

impl HarvestResult {
    #[must_use]
    pub fn new(staging_dir: PathBuf, retrieved_filenames: Vec<String>) -> Self {
        Self {
            staging_dir,
            retrieved_filenames,
        }
    }

    /// Leaf names of the retrieved PDFs, in download order.
    #[must_use]
    pub fn retrieved_filenames(&self) -> &[String] {
        &self.retrieved_filenames
    }

    /// Number of retrieved PDFs; always `retrieved_filenames().len()`.
    #[must_use]
    pub fn count(&self) -> usize {
        self.retrieved_filenames.len()
    }

    /// Directory holding the downloaded files.
    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retrieved_filenames.is_empty()
    }
}

impl Serialize for HarvestResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("HarvestResult", 3)?;
        state.serialize_field("staging_dir", &self.staging_dir)?;
        state.serialize_field("retrieved_filenames", &self.retrieved_filenames)?;
        state.serialize_field("count", &self.count())?;
        state.end()
    }
}

/// What happened to one candidate during the download phase.
#[derive(Debug)]
pub enum CandidateOutcome {
    /// The file was written to `path`.
    Retrieved {
        /// Leaf name reported to the caller.
        name: String,
        /// Local file path.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// The file was skipped; the batch continues.
    Skipped {
        /// Leaf name of the skipped candidate.
        name: String,
        /// Why it was skipped.
        reason: String,
    },
}

/// Returns true when `entry` is a file whose name ends in `.pdf` (any case).
#[must_use]
pub fn is_pdf_candidate(entry: &RemoteEntry) -> bool {
    entry.as_file().is_some_and(|meta| has_pdf_extension(&meta.name))
}

fn has_pdf_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(PDF_EXTENSION))
}

/// Enumerates `folder` recursively and returns its PDF candidates in the
/// order the listing protocol produced them.
///
/// # Errors
///
/// Any listing failure aborts enumeration; partial results are discarded.
/// Auth failures become [`HarvestError::Auth`], everything else
/// [`HarvestError::Enumeration`]. A page that claims more results without a
/// cursor is reported as an enumeration error rather than followed.
#[instrument(skip(client, folder), fields(client = client.name(), folder = %folder))]
pub async fn collect_pdf_candidates(
    client: &dyn StorageClient,
    folder: &FolderPath,
) -> Result<Vec<EntryMetadata>, HarvestError> {
    let listing_error = |source| HarvestError::listing(folder.to_string(), source);

    let mut page = client
        .list_folder(folder, true)
        .await
        .map_err(listing_error)?;
    let mut candidates = Vec::new();
    let mut pages = 1usize;
    let mut visited = 0usize;

    loop {
        visited += page.entries.len();
        candidates.extend(
            page.entries.into_iter().filter_map(|entry| match entry {
                RemoteEntry::File(meta) if has_pdf_extension(&meta.name) => Some(meta),
                RemoteEntry::File(_) | RemoteEntry::Folder(_) | RemoteEntry::Deleted(_) => None,
            }),
        );

        if !page.has_more {
            break;
        }
        if page.cursor.is_empty() {
            return Err(listing_error(StorageError::protocol(
                "page reported more results without a continuation cursor",
            )));
        }

        debug!(pages, candidates = candidates.len(), "following listing cursor");
        page = client
            .list_folder_continue(&page.cursor)
            .await
            .map_err(listing_error)?;
        pages += 1;
    }

    info!(
        pages,
        entries = visited,
        candidates = candidates.len(),
        "enumeration complete"
    );
    Ok(candidates)
}

/// Downloads one candidate into `staging`.
///
/// Per-file problems (unmappable path, directory creation failure, transfer
/// failure) come back as [`CandidateOutcome::Skipped`].
///
/// # Errors
///
/// Only an auth failure is returned as an error: a rejected credential will
/// fail every remaining candidate too, so the batch stops. The error carries
/// the staging root so the caller can still find files fetched earlier.
pub async fn fetch_candidate(
    client: &dyn StorageClient,
    staging: &StagingArea,
    candidate: &EntryMetadata,
) -> Result<CandidateOutcome, HarvestError> {
    let skipped = |reason: String| CandidateOutcome::Skipped {
        name: candidate.name.clone(),
        reason,
    };

    let Some(target) = staging.target_for(&candidate.path_display) else {
        return Ok(skipped(format!(
            "display path '{}' cannot be mapped into the staging directory",
            candidate.path_display
        )));
    };

    if let Some(parent) = target.parent()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        return Ok(skipped(format!(
            "cannot create directory {}: {e}",
            parent.display()
        )));
    }

    match client
        .download_to_file(&target, &candidate.path_lower)
        .await
    {
        Ok(bytes) => Ok(CandidateOutcome::Retrieved {
            name: candidate.name.clone(),
            path: target,
            bytes,
        }),
        Err(source) if source.is_auth() => Err(HarvestError::Auth {
            source,
            staging_dir: Some(staging.root().to_path_buf()),
        }),
        Err(source) => Ok(skipped(source.to_string())),
    }
}

/// Runs folder harvests into staging directories under a fixed parent.
#[derive(Debug, Clone)]
pub struct Harvester {
    staging_parent: PathBuf,
}

impl Default for Harvester {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl Harvester {
    /// Creates a harvester whose staging directories live under
    /// `staging_parent`.
    #[must_use]
    pub fn new(staging_parent: impl Into<PathBuf>) -> Self {
        Self {
            staging_parent: staging_parent.into(),
        }
    }

    /// Parent directory of every staging area this harvester creates.
    #[must_use]
    pub fn staging_parent(&self) -> &Path {
        &self.staging_parent
    }

    /// Harvests every PDF under `raw_path` into a new staging directory.
    ///
    /// `client` is `None` when no credential is configured; that fails with
    /// [`HarvestError::Configuration`] before any listing call.
    ///
    /// The staging directory is created after enumeration succeeds and is
    /// never deleted here; see [`HarvestResult`].
    ///
    /// # Errors
    ///
    /// - [`HarvestError::Configuration`] when `client` is `None`
    /// - [`HarvestError::Auth`] when the credential is rejected at any point.
    ///   A rejection during the download phase happens after the staging
    ///   directory exists; [`HarvestError::staging_dir`] returns it so the
    ///   caller can clean up whatever was already fetched.
    /// - [`HarvestError::Enumeration`] when the folder cannot be listed
    /// - [`HarvestError::Staging`] when the staging directory cannot be created
    ///
    /// Individual download failures are not errors; those files are left out
    /// of the result.
    #[instrument(skip(self, client), fields(staging_parent = %self.staging_parent.display()))]
    pub async fn harvest(
        &self,
        client: Option<&dyn StorageClient>,
        raw_path: &str,
    ) -> Result<HarvestResult, HarvestError> {
        let Some(client) = client else {
            return Err(HarvestError::missing_client());
        };

        let folder = FolderPath::normalize(raw_path);
        info!(folder = %folder, client = client.name(), "starting harvest");

        let candidates = collect_pdf_candidates(client, &folder).await?;
        let staging = StagingArea::create_in(&self.staging_parent).await?;

        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            outcomes.push(fetch_candidate(client, &staging, candidate).await?);
        }

        let mut retrieved = Vec::with_capacity(outcomes.len());
        let mut skipped = 0usize;
        for outcome in outcomes {
            match outcome {
                CandidateOutcome::Retrieved { name, path, bytes } => {
                    debug!(name = %name, path = %path.display(), bytes, "retrieved");
                    retrieved.push(name);
                }
                CandidateOutcome::Skipped { name, reason } => {
                    warn!(name = %name, reason = %reason, "skipped candidate");
                    skipped += 1;
                }
            }
        }

        info!(
            folder = %folder,
            retrieved = retrieved.len(),
            skipped,
            staging_dir = %staging.root().display(),
            "harvest complete"
        );

        Ok(HarvestResult::new(staging.into_path(), retrieved))
    }
}

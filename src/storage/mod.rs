//! Remote storage capability consumed by the harvester.
//!
//! # Architecture
//!
//! - [`StorageClient`] - Async trait exposing the three protocol operations
//! - [`RemoteEntry`] / [`ListingPage`] - Listing data model
//! - [`StorageError`] - Structured protocol and transport errors
//! - [`DropboxClient`] - HTTPS implementation for the Dropbox API v2
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::FolderPath;
//! use harvester_core::storage::{DropboxClient, DropboxSettings, StorageClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = DropboxSettings::with_token("sl.example-token");
//! let Some(client) = DropboxClient::from_settings(&settings)? else {
//!     return Ok(());
//! };
//! let page = client.list_folder(&FolderPath::normalize("/Papers"), true).await?;
//! println!("{} entries, more: {}", page.entries.len(), page.has_more);
//! # Ok(())
//! # }
//! ```

mod constants;
mod dropbox;
mod entry;
mod error;

pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_API_BASE_URL, DEFAULT_CONTENT_BASE_URL, READ_TIMEOUT_SECS,
};
pub use dropbox::{DropboxClient, DropboxSettings, encode_api_arg};
pub use entry::{EntryMetadata, ListingPage, RemoteEntry};
pub use error::StorageError;

use std::path::Path;

use async_trait::async_trait;

use crate::path::FolderPath;

/// A pre-authenticated client for a remote storage account.
///
/// The harvester only ever talks to storage through this trait, so tests can
/// substitute a scripted double for the network client.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `&dyn StorageClient`. Rust 2024 native async traits are not object-safe.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Returns the client's name (used for logging only).
    fn name(&self) -> &str;

    /// Lists the first page of `path`, descending into subfolders when
    /// `recursive` is set.
    async fn list_folder(
        &self,
        path: &FolderPath,
        recursive: bool,
    ) -> Result<ListingPage, StorageError>;

    /// Fetches the page that follows `cursor`.
    async fn list_folder_continue(&self, cursor: &str) -> Result<ListingPage, StorageError>;

    /// Downloads the file identified by `remote_path_lower` to `local_path`,
    /// returning the number of bytes written.
    ///
    /// The parent directory of `local_path` must already exist.
    async fn download_to_file(
        &self,
        local_path: &Path,
        remote_path_lower: &str,
    ) -> Result<u64, StorageError>;
}

//! PDF Harvester Core Library
//!
//! This library harvests PDF documents from a folder of a remote
//! cloud-storage account into a local staging directory that mirrors the
//! remote layout.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`path`] - Folder path normalization for the listing API
//! - [`storage`] - Storage capability trait, listing model, Dropbox client
//! - [`harvest`] - Enumeration, filtering, staging and the download loop
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::{DropboxClient, DropboxSettings, Harvester, StorageClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = DropboxSettings::with_token(std::env::var("DROPBOX_ACCESS_TOKEN")?);
//! let client = DropboxClient::from_settings(&settings)?;
//! let result = Harvester::default()
//!     .harvest(client.as_ref().map(|c| c as &dyn StorageClient), "/Papers")
//!     .await?;
//! for name in result.retrieved_filenames() {
//!     println!("{name}");
//! }
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod harvest;
pub mod path;
pub mod storage;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use harvest::{HarvestError, HarvestResult, Harvester, StagingArea};
pub use path::FolderPath;
pub use storage::{
    DropboxClient, DropboxSettings, ListingPage, RemoteEntry, StorageClient, StorageError,
};

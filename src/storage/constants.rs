//! Constants for the storage module (endpoints, timeouts).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Base URL for RPC-style endpoints (listing).
pub const DEFAULT_API_BASE_URL: &str = "https://api.dropboxapi.com";

/// Base URL for content endpoints (download).
pub const DEFAULT_CONTENT_BASE_URL: &str = "https://content.dropboxapi.com";

pub(crate) const LIST_FOLDER_ENDPOINT: &str = "2/files/list_folder";
pub(crate) const LIST_FOLDER_CONTINUE_ENDPOINT: &str = "2/files/list_folder/continue";
pub(crate) const DOWNLOAD_ENDPOINT: &str = "2/files/download";

/// Header carrying the JSON argument of content endpoints.
pub(crate) const API_ARG_HEADER: &str = "Dropbox-API-Arg";

/// Longest response body excerpt kept in an error summary.
pub(crate) const MAX_ERROR_SUMMARY_CHARS: usize = 200;

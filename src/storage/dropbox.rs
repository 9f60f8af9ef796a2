//! Dropbox API v2 implementation of [`StorageClient`].
//!
//! Listing goes through the RPC endpoints (`files/list_folder` and
//! `files/list_folder/continue`, JSON in and out). Downloads go through the
//! content endpoint `files/download`, whose argument travels in the
//! `Dropbox-API-Arg` header and whose response body is the raw file, streamed
//! straight to disk.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{
    API_ARG_HEADER, CONNECT_TIMEOUT_SECS, DEFAULT_API_BASE_URL, DEFAULT_CONTENT_BASE_URL,
    DOWNLOAD_ENDPOINT, LIST_FOLDER_CONTINUE_ENDPOINT, LIST_FOLDER_ENDPOINT,
    MAX_ERROR_SUMMARY_CHARS, READ_TIMEOUT_SECS,
};
use super::{ListingPage, StorageClient, StorageError};
use crate::path::FolderPath;
use crate::user_agent;

/// Connection settings for [`DropboxClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct DropboxSettings {
    /// OAuth2 bearer token. `None` (or blank) means no credential is configured.
    pub access_token: Option<String>,
    /// Base URL for RPC endpoints.
    pub api_base_url: String,
    /// Base URL for content endpoints.
    pub content_base_url: String,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for DropboxSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            content_base_url: DEFAULT_CONTENT_BASE_URL.to_string(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl DropboxSettings {
    /// Default settings with the given access token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Points both endpoint families at one base URL (test servers, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.api_base_url.clone_from(&base_url);
        self.content_base_url = base_url;
        self
    }

    fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

impl fmt::Debug for DropboxSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxSettings")
            .field("access_token", &self.token().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("content_base_url", &self.content_base_url)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .finish()
    }
}

/// Pre-authenticated Dropbox client.
///
/// Created once per invocation and reused for every listing and download call,
/// taking advantage of connection pooling.
#[derive(Clone)]
pub struct DropboxClient {
    client: Client,
    token: String,
    api_base: Url,
    content_base: Url,
}

impl fmt::Debug for DropboxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxClient")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base.as_str())
            .field("content_base", &self.content_base.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ListFolderArg<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Serialize)]
struct ListFolderContinueArg<'a> {
    cursor: &'a str,
}

#[derive(Serialize)]
struct DownloadArg<'a> {
    path: &'a str,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error_summary: String,
}

impl DropboxClient {
    /// Builds a client from settings.
    ///
    /// Returns `Ok(None)` when no access token is configured, so the caller can
    /// report a configuration error before any request is made.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidEndpoint`] for an unusable base URL and
    /// [`StorageError::ClientBuild`] if the HTTP client cannot be constructed.
    #[instrument(level = "debug", skip(settings))]
    pub fn from_settings(settings: &DropboxSettings) -> Result<Option<Self>, StorageError> {
        let Some(token) = settings.token() else {
            debug!("no access token configured");
            return Ok(None);
        };

        let api_base = parse_base_url(&settings.api_base_url)?;
        let content_base = parse_base_url(&settings.content_base_url)?;
        let client = build_http_client(settings.connect_timeout_secs, settings.read_timeout_secs)?;

        debug!(
            api_base = %api_base,
            content_base = %content_base,
            connect_timeout_secs = settings.connect_timeout_secs,
            read_timeout_secs = settings.read_timeout_secs,
            "creating dropbox client"
        );

        Ok(Some(Self {
            client,
            token: token.to_string(),
            api_base,
            content_base,
        }))
    }

    fn endpoint_url(base: &Url, endpoint: &str) -> Result<Url, StorageError> {
        base.join(endpoint)
            .map_err(|_| StorageError::InvalidEndpoint {
                url: format!("{base}{endpoint}"),
            })
    }

    /// Calls an RPC endpoint with a JSON body and decodes the JSON reply.
    async fn rpc<B, T>(&self, endpoint: &str, body: &B) -> Result<T, StorageError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = Self::endpoint_url(&self.api_base, endpoint)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| StorageError::transport(endpoint, e))?;
        let response = check_status(endpoint, response).await?;

        let text = response
            .text()
            .await
            .map_err(|e| StorageError::transport(endpoint, e))?;
        serde_json::from_str(&text).map_err(|e| StorageError::payload(endpoint, e))
    }
}

#[async_trait]
impl StorageClient for DropboxClient {
    fn name(&self) -> &str {
        "dropbox"
    }

    #[instrument(skip(self, path), fields(path = %path))]
    async fn list_folder(
        &self,
        path: &FolderPath,
        recursive: bool,
    ) -> Result<ListingPage, StorageError> {
        let arg = ListFolderArg {
            path: path.as_str(),
            recursive,
        };
        let page: ListingPage = self.rpc(LIST_FOLDER_ENDPOINT, &arg).await?;
        debug!(
            entries = page.entries.len(),
            has_more = page.has_more,
            "listed folder"
        );
        Ok(page)
    }

    #[instrument(skip(self, cursor))]
    async fn list_folder_continue(&self, cursor: &str) -> Result<ListingPage, StorageError> {
        let arg = ListFolderContinueArg { cursor };
        let page: ListingPage = self.rpc(LIST_FOLDER_CONTINUE_ENDPOINT, &arg).await?;
        debug!(
            entries = page.entries.len(),
            has_more = page.has_more,
            "listed continuation page"
        );
        Ok(page)
    }

    #[instrument(skip(self, local_path), fields(local_path = %local_path.display()))]
    async fn download_to_file(
        &self,
        local_path: &Path,
        remote_path_lower: &str,
    ) -> Result<u64, StorageError> {
        let endpoint = DOWNLOAD_ENDPOINT;
        let url = Self::endpoint_url(&self.content_base, endpoint)?;
        let arg = encode_api_arg(remote_path_lower)
            .map_err(|e| StorageError::payload(endpoint, e))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header(API_ARG_HEADER, arg)
            .send()
            .await
            .map_err(|e| StorageError::transport(endpoint, e))?;
        let response = check_status(endpoint, response).await?;

        let mut file = File::create(local_path)
            .await
            .map_err(|e| StorageError::io(local_path, e))?;

        let stream_result = stream_to_file(&mut file, response, endpoint, local_path).await;
        if stream_result.is_err() {
            debug!(path = %local_path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(local_path).await;
        }
        let bytes = stream_result?;

        info!(path = %local_path.display(), bytes, "download complete");
        Ok(bytes)
    }
}

/// Encodes the `Dropbox-API-Arg` header value for a download.
///
/// Header values must be ASCII, so every non-ASCII character (and DEL) is
/// written as a JSON `\uXXXX` escape, using surrogate pairs outside the BMP.
///
/// ```
/// use harvester_core::storage::encode_api_arg;
///
/// let arg = encode_api_arg("/café/notes.pdf").unwrap();
/// assert_eq!(arg, r#"{"path":"/caf\u00e9/notes.pdf"}"#);
/// ```
///
/// # Errors
///
/// Returns the serializer error if the argument cannot be encoded as JSON.
pub fn encode_api_arg(remote_path: &str) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(&DownloadArg { path: remote_path })?;
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() && ch != '\u{7f}' {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    Ok(out)
}

/// Maps a non-success response onto a [`StorageError`].
async fn check_status(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let status_code = status.as_u16();
    let body = response.text().await.unwrap_or_default();
    let summary = error_summary(&body);

    debug!(endpoint, status = status_code, summary = %summary, "request rejected");

    if matches!(status_code, 401 | 403) {
        return Err(StorageError::auth_rejected(endpoint, status_code, summary));
    }
    Err(StorageError::api(endpoint, status_code, summary))
}

/// Extracts `error_summary` from a JSON error body, falling back to a
/// truncated copy of the raw body.
fn error_summary(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return parsed.error_summary;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no error details".to_string();
    }
    trimmed.chars().take(MAX_ERROR_SUMMARY_CHARS).collect()
}

/// Streams response body to file, returning bytes written.
///
/// This is extracted to enable cleanup on error in the caller.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    endpoint: &str,
    file_path: &Path,
) -> Result<u64, StorageError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| StorageError::transport(endpoint, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| StorageError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| StorageError::io(file_path, e))?;

    Ok(bytes_written)
}

fn parse_base_url(raw: &str) -> Result<Url, StorageError> {
    let invalid = || StorageError::InvalidEndpoint {
        url: raw.to_string(),
    };
    let mut url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    // `Url::join` replaces the last segment unless the base ends in '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn build_http_client(
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
) -> Result<Client, StorageError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .build()
        .map_err(|source| StorageError::ClientBuild { source })
}

//! Google Drive v3 client implementing [`RemoteSource`] over REST.
//!
//! Listing excludes trashed items and items not owned by the caller, ordered
//! most-recently-modified first. The Drive API does not support a `size`
//! query term, so size filtering is the caller's job. Google-native document
//! types cannot be downloaded as raw bytes; they are exported to a fixed
//! conventional format instead, and the saved path carries the export
//! format's extension.
//!
//! Obtaining the OAuth token is out of scope here: the client takes a ready
//! bearer token (see [`load_access_token`](crate::load_config::load_access_token)).

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::{Response, StatusCode};
use tracing::{debug, info};

use crate::contract::{
    AuthError, FilePage, ProgressFn, RemoteFileRecord, RemoteSource, SourceError,
};
use crate::eligibility::is_google_doc;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Listing query: non-trashed files owned by the caller.
const LIST_QUERY: &str = "'me' in owners and trashed = false";

const LIST_FIELDS: &str = "nextPageToken, files(id, name, size, mimeType, modifiedTime, parents)";

/// Export formats for Google-native document types: `(export_mime, extension)`.
const GOOGLE_DOC_EXPORTS: &[(&str, &str, &str)] = &[
    (
        "application/vnd.google-apps.document",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    (
        "application/vnd.google-apps.spreadsheet",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    (
        "application/vnd.google-apps.presentation",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "pptx",
    ),
    ("application/vnd.google-apps.drawing", "image/png", "png"),
];

/// The `(export_mime, extension)` pair for a Google-native MIME type.
pub fn export_format(mime_type: &str) -> Option<(&'static str, &'static str)> {
    GOOGLE_DOC_EXPORTS
        .iter()
        .find(|(source_mime, _, _)| *source_mime == mime_type)
        .map(|(_, export_mime, extension)| (*export_mime, *extension))
}

/// Wire shape of one file in a Drive listing. Populated with defaults so the
/// core never sees missing fields: Drive reports `size` as a decimal string
/// and omits it entirely for Google-native documents.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    modified_time: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
}

impl From<DriveFile> for RemoteFileRecord {
    fn from(file: DriveFile) -> Self {
        RemoteFileRecord {
            id: file.id,
            name: file.name,
            size: file
                .size
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            mime_type: file.mime_type,
            modified_time: file.modified_time.filter(|s| !s.is_empty()),
            parents: file.parents,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Drive v3 REST client.
pub struct DriveClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl DriveClient {
    pub fn new(access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DRIVE_API_BASE.to_string(),
            access_token,
        }
    }

    /// Point the client at a different API root (local test servers).
    pub fn with_base_url(access_token: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            access_token,
        }
    }

    /// Map auth statuses to [`AuthError`] and any other non-success status to
    /// a plain boxed error.
    async fn checked(&self, response: Response) -> Result<Response, SourceError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(Box::new(AuthError(format!("HTTP {status}: {body}"))));
        }
        if !status.is_success() {
            let url = response.url().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Drive API error {status} at {url}: {body}").into());
        }
        Ok(response)
    }

    /// Stream a response body to a temporary sibling of `dest`, then rename.
    /// The final path never holds a partial file.
    async fn stream_to_file(
        &self,
        response: Response,
        dest: &Path,
        progress: &ProgressFn,
    ) -> Result<(), SourceError> {
        let total = response.content_length().unwrap_or(0);
        let file_name = dest
            .file_name()
            .ok_or_else(|| format!("not a file path: {}", dest.display()))?
            .to_string_lossy()
            .into_owned();
        let temp_path =
            dest.with_file_name(format!(".{}.{}.part", file_name, uuid::Uuid::new_v4()));

        let result = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            let mut stream = response.bytes_stream();
            let mut downloaded: u64 = 0;

            while let Some(chunk) = stream.next().await {
                let chunk =
                    chunk.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
                tokio::io::AsyncWriteExt::write_all(&mut file, &chunk).await?;
                downloaded += chunk.len() as u64;
                progress(downloaded, total);
            }

            tokio::io::AsyncWriteExt::flush(&mut file).await?;
            drop(file);
            tokio::fs::rename(&temp_path, dest).await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(format!("Failed to save {}: {e}", dest.display()).into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteSource for DriveClient {
    async fn list_page(
        &self,
        page_token: Option<String>,
        page_size: usize,
    ) -> Result<FilePage, SourceError> {
        let url = format!("{}/files", self.base_url);
        let mut request = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", LIST_QUERY),
                ("fields", LIST_FIELDS),
                ("orderBy", "modifiedTime desc"),
            ])
            .query(&[("pageSize", page_size)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| -> SourceError { format!("Failed to list files: {e}").into() })?;
        let listing: DriveFileList = self.checked(response).await?.json().await?;

        debug!(
            files = listing.files.len(),
            has_next = listing.next_page_token.is_some(),
            "Fetched listing page"
        );
        Ok(FilePage {
            files: listing.files.into_iter().map(Into::into).collect(),
            next_page_token: listing.next_page_token,
        })
    }

    async fn download(
        &self,
        file_id: &str,
        mime_type: &str,
        dest: &Path,
        progress: ProgressFn,
    ) -> Result<PathBuf, SourceError> {
        let (request, actual_path) = if is_google_doc(mime_type) {
            let (export_mime, extension) = export_format(mime_type)
                .ok_or_else(|| format!("No export format for {mime_type}"))?;
            let url = format!("{}/files/{}/export", self.base_url, file_id);
            (
                self.http
                    .get(&url)
                    .bearer_auth(&self.access_token)
                    .query(&[("mimeType", export_mime)]),
                dest.with_extension(extension),
            )
        } else {
            let url = format!("{}/files/{}", self.base_url, file_id);
            (
                self.http
                    .get(&url)
                    .bearer_auth(&self.access_token)
                    .query(&[("alt", "media")]),
                dest.to_path_buf(),
            )
        };

        let response = request
            .send()
            .await
            .map_err(|e| -> SourceError { format!("Failed to download file: {e}").into() })?;
        let response = self.checked(response).await?;

        self.stream_to_file(response, &actual_path, &progress).await?;
        info!(file_id, path = %actual_path.display(), "Download complete");
        Ok(actual_path)
    }

    async fn trash(&self, file_id: &str) -> Result<(), SourceError> {
        let url = format!("{}/files/{}", self.base_url, file_id);
        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "trashed": true }))
            .send()
            .await
            .map_err(|e| -> SourceError { format!("Failed to trash file: {e}").into() })?;
        self.checked(response).await?;

        info!(file_id, "Moved remote file to trash");
        Ok(())
    }
}

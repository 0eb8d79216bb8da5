use crate::ingest::{RemoteFileFetcher, RemoteFileLister};
use crate::sources::SourceError;
use crate::utils::remove_file_best_effort;
use app_state::DriveSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_types::RemoteFile;
use futures_util::{Stream, StreamExt};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use url::Url;

const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,md5Checksum,createdTime)";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
    md5_checksum: Option<String>,
    created_time: Option<DateTime<Utc>>,
}

impl From<DriveFile> for RemoteFile {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            checksum: file.md5_checksum,
            mime_type: file.mime_type,
            created_at: file.created_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DriveErrorBody {
    error: DriveErrorDetail,
}

#[derive(Debug, Deserialize)]
struct DriveErrorDetail {
    message: String,
}

/// Google Drive v3 client, used both to list a folder and to download its files.
#[derive(Clone)]
pub struct DriveClient {
    http_client: Client,
    api_url: Url,
    access_token: Option<String>,
    page_size: u32,
}

impl DriveClient {
    pub fn new(
        http_client: Client,
        settings: &DriveSettings,
        access_token: Option<String>,
    ) -> Result<Self, SourceError> {
        // A trailing slash keeps `join` from replacing the last path segment.
        let mut base = settings.api_url.trim_end_matches('/').to_owned();
        base.push('/');
        Ok(Self {
            http_client,
            api_url: Url::parse(&base)?,
            access_token,
            page_size: settings.page_size,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<DriveFileList, SourceError> {
        let url = self.api_url.join("files")?;
        let page_size = self.page_size.to_string();
        let query = folder_query(folder_id);
        let mut params = vec![
            ("q", query.as_str()),
            ("fields", LIST_FIELDS),
            ("pageSize", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self
            .authorized(self.http_client.get(url))
            .query(&params)
            .send()
            .await?;
        let response = check_status(response, folder_id).await?;
        Ok(response.json().await?)
    }
}

/// Drive search expression for the non-trashed images directly inside a folder.
fn folder_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}' in parents and mimeType contains 'image/' and trashed = false")
}

async fn check_status(response: Response, id: &str) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(SourceError::NotFound(id.to_owned()));
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<DriveErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    Err(SourceError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteFileLister for DriveClient {
    #[instrument(skip(self))]
    async fn list_files(&self, folder_id: &str) -> Result<Vec<RemoteFile>, SourceError> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.fetch_page(folder_id, page_token.as_deref()).await?;
            debug!("Listed {} files from drive folder", page.files.len());
            files.extend(page.files.into_iter().map(RemoteFile::from));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(files)
    }
}

/// Streams into a sibling `.part` file that is renamed once complete, so a half-written
/// original never has the final name. The partial file is removed on any failure.
async fn save_stream<S, B, E>(stream: S, destination: &Path) -> Result<(), SourceError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    SourceError: From<E>,
{
    let partial = destination.with_extension("part");
    let result = write_stream(stream, &partial, destination).await;
    if result.is_err() {
        remove_file_best_effort(&partial).await;
    }
    result
}

async fn write_stream<S, B, E>(
    mut stream: S,
    partial: &Path,
    destination: &Path,
) -> Result<(), SourceError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    SourceError: From<E>,
{
    let mut file = fs::File::create(partial).await?;
    while let Some(chunk) = stream.next().await {
        file.write_all(chunk?.as_ref()).await?;
    }
    file.flush().await?;
    drop(file);

    fs::rename(partial, destination).await?;
    Ok(())
}

#[async_trait]
impl RemoteFileFetcher for DriveClient {
    #[instrument(skip(self, destination))]
    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), SourceError> {
        let url = self.api_url.join(&format!("files/{file_id}"))?;
        let response = self
            .authorized(self.http_client.get(url))
            .query(&[("alt", "media")])
            .send()
            .await?;
        let response = check_status(response, file_id).await?;

        save_stream(response.bytes_stream(), destination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_file_list_page() -> color_eyre::Result<()> {
        let body = r#"{
            "nextPageToken": "page-2",
            "files": [
                {
                    "id": "1AbC",
                    "name": "IMG_0001.jpg",
                    "mimeType": "image/jpeg",
                    "md5Checksum": "5eb63bbbe01eeed093cb22bb8f5acdc3",
                    "createdTime": "2021-05-01T10:00:00.000Z"
                },
                { "id": "2DeF", "name": "scan.png", "mimeType": "image/png" }
            ]
        }"#;

        let page: DriveFileList = serde_json::from_str(body)?;
        let files: Vec<RemoteFile> = page.files.into_iter().map(RemoteFile::from).collect();

        assert_eq!(page.next_page_token.as_deref(), Some("page-2"));
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, "1AbC");
        assert_eq!(
            files[0].checksum.as_deref(),
            Some("5eb63bbbe01eeed093cb22bb8f5acdc3")
        );
        assert!(files[0].created_at.is_some());
        assert_eq!(files[1].checksum, None);
        Ok(())
    }

    #[test]
    fn last_page_has_no_token() -> color_eyre::Result<()> {
        let page: DriveFileList = serde_json::from_str(r#"{"files": []}"#)?;

        assert!(page.next_page_token.is_none());
        assert!(page.files.is_empty());
        Ok(())
    }

    #[test]
    fn folder_query_excludes_trash_and_non_images() {
        let query = folder_query("root'folder");

        assert_eq!(
            query,
            r"'root\'folder' in parents and mimeType contains 'image/' and trashed = false"
        );
    }

    #[tokio::test]
    async fn streamed_download_lands_at_destination() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let destination = dir.path().join("photo.jpg");
        let chunks = vec![Ok::<_, std::io::Error>(b"jpeg ".to_vec()), Ok(b"bytes".to_vec())];

        save_stream(futures_util::stream::iter(chunks), &destination).await?;

        assert_eq!(std::fs::read(&destination)?, b"jpeg bytes");
        assert!(!destination.with_extension("part").exists());
        Ok(())
    }

    #[tokio::test]
    async fn broken_stream_leaves_no_partial_file() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let destination = dir.path().join("photo.jpg");
        let chunks = vec![
            Ok(b"jpeg".to_vec()),
            Err(std::io::Error::other("connection reset")),
        ];

        let result = save_stream(futures_util::stream::iter(chunks), &destination).await;

        assert!(result.is_err());
        assert!(!destination.exists());
        assert!(!destination.with_extension("part").exists());
        Ok(())
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_partial_file() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        // A non-empty directory at the destination makes the final rename fail.
        let destination = dir.path().join("photo.jpg");
        std::fs::create_dir_all(destination.join("inner"))?;
        let chunks = vec![Ok::<_, std::io::Error>(b"jpeg".to_vec())];

        let result = save_stream(futures_util::stream::iter(chunks), &destination).await;

        assert!(matches!(result, Err(SourceError::Io(_))));
        assert!(!destination.with_extension("part").exists());
        Ok(())
    }

    #[test]
    fn api_url_keeps_its_path() -> color_eyre::Result<()> {
        let settings = DriveSettings {
            api_url: "https://www.googleapis.com/drive/v3".to_owned(),
            page_size: 100,
        };

        let client = DriveClient::new(Client::new(), &settings, None)?;

        assert_eq!(
            client.api_url.join("files")?.as_str(),
            "https://www.googleapis.com/drive/v3/files"
        );
        Ok(())
    }
}

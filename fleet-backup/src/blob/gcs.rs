//! Google Cloud Storage backend using the JSON API.
//!
//! Authentication is a pre-issued OAuth2 bearer token; token minting is left
//! to the deployment (workload identity, `gcloud auth print-access-token`, ...).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::{BlobEntry, BlobStore};
use crate::utils::errors::{BackupError, Result};

pub struct GcsBlobStore {
    client: reqwest::Client,
    endpoint: Url,
    bucket: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<GcsObject>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GcsObject {
    name: String,
    time_created: DateTime<Utc>,
}

impl GcsBlobStore {
    pub fn new(endpoint: &str, bucket: &str, access_token: Option<String>) -> Result<Self> {
        if bucket.is_empty() {
            return Err(BackupError::Config("No bucket name provided".into()));
        }
        let endpoint = Url::parse(endpoint)
            .map_err(|e| BackupError::Config(format!("Invalid GCS endpoint {}: {}", endpoint, e)))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            bucket: bucket.to_string(),
            access_token,
        })
    }

    fn url_with_segments(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| BackupError::Config(format!("GCS endpoint cannot be a base: {}", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `<endpoint>/storage/v1/b/<bucket>/o`
    fn objects_url(&self) -> Result<Url> {
        self.url_with_segments(&["storage", "v1", "b", self.bucket.as_str(), "o"])
    }

    /// `<endpoint>/storage/v1/b/<bucket>/o/<percent-encoded key>`
    fn object_url(&self, key: &str) -> Result<Url> {
        // A single segment, so `/` inside the key is encoded as %2F
        self.url_with_segments(&["storage", "v1", "b", self.bucket.as_str(), "o", key])
    }

    fn upload_url(&self, key: &str) -> Result<Url> {
        let mut url = self.url_with_segments(&["upload", "storage", "v1", "b", self.bucket.as_str(), "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", key);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn check(response: reqwest::Response, key: &str) -> Result<reqwest::Response> {
    if response.status() == StatusCode::NOT_FOUND {
        return Err(BackupError::NotFound(key.to_string()));
    }
    Ok(response.error_for_status()?)
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn put(&self, local: &Path, key: &str) -> Result<()> {
        let body = tokio::fs::read(local).await?;
        let size = body.len();
        let response = self
            .authorize(self.client.post(self.upload_url(key)?))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        response.error_for_status()?;
        tracing::debug!(bucket = %self.bucket, key = %key, size, "Uploaded object");
        Ok(())
    }

    async fn get(&self, key: &str, local: &Path) -> Result<()> {
        let mut url = self.object_url(key)?;
        url.query_pairs_mut().append_pair("alt", "media");

        let response = self.authorize(self.client.get(url)).send().await?;
        let mut response = check(response, key)?;

        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(local).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.objects_url()?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("prefix", prefix);
                query.append_pair("fields", "items(name,timeCreated),nextPageToken");
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.authorize(self.client.get(url)).send().await?;
            let page: ListResponse = response.error_for_status()?.json().await?;

            entries.extend(page.items.into_iter().map(|o| BlobEntry {
                name: o.name,
                created_at: o.time_created,
            }));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(entries)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .authorize(self.client.delete(self.object_url(key)?))
            .send()
            .await?;
        // Already gone counts as deleted, matching the local backend
        match check(response, key) {
            Ok(_) => {}
            Err(BackupError::NotFound(_)) => {
                tracing::debug!(bucket = %self.bucket, key = %key, "Object already deleted");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        tracing::debug!(bucket = %self.bucket, key = %key, "Deleted object");
        Ok(())
    }
}

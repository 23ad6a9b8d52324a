//! Object-storage clients.
//!
//! Uploads go to one of several category endpoints that all share the same
//! multipart request (`file` field) and JSON response shape. Deletes go to a
//! single endpoint with a client-side deadline.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use estrella_core::assets::{AssetRef, CandidateFile};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::{check_status, join_url, parse_response};

/// Upload endpoints per asset category.
pub mod endpoints {
    pub const QR_IMAGE: &str = "/api/upload/qr-image";
    pub const REFERENCE_IMAGE: &str = "/api/upload/reference-image";
    pub const CONVOCATORIA_DOCUMENT: &str = "/api/upload/convocatoria-document";
    pub const RESOURCE_THUMBNAIL: &str = "/api/upload/resource-thumbnail";
    pub const RESOURCE_FILE: &str = "/api/upload/resource-file";
    pub const IMAGE: &str = "/api/upload/image";

    /// Delete endpoint shared by every category.
    pub const DELETE: &str = "/api/spaces/delete";
}

/// Successful upload response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
}

impl UploadedAsset {
    /// Reference to store on the entity. Falls back to the original file
    /// name for the alt text when the server does not provide one.
    pub fn into_asset_ref(self, file: &CandidateFile) -> AssetRef {
        let alt = self
            .alt
            .or(self.original_name)
            .or_else(|| Some(file.name.clone()));
        AssetRef::new(self.url, alt)
    }
}

/// Uploads a single file to a category endpoint.
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, endpoint: &str, file: &CandidateFile)
        -> Result<UploadedAsset, ClientError>;
}

/// Removes a previously uploaded asset by URL.
#[async_trait]
pub trait DeleteService: Send + Sync {
    async fn delete(&self, url: &str) -> Result<(), ClientError>;
}

/// HTTP client for the object-storage endpoints of the admin app.
#[derive(Debug, Clone)]
pub struct SpacesClient {
    client: reqwest::Client,
    base_url: String,
    delete_timeout: Duration,
    /// No deadline when `None`.
    upload_timeout: Option<Duration>,
}

impl SpacesClient {
    /// * `base_url` - Origin of the admin app, e.g. `http://host:3000`.
    pub fn new(base_url: impl Into<String>, delete_timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, delete_timeout)
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        delete_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            delete_timeout,
            upload_timeout: None,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &ClientConfig) -> Self {
        let mut spaces = Self::with_client(client, config.api_url.clone(), config.delete_timeout());
        spaces.upload_timeout = config.upload_timeout();
        spaces
    }

    /// Give up on uploads that take longer than `timeout`, including reading
    /// the response body.
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl UploadService for SpacesClient {
    /// Sends a `POST <endpoint>` multipart request with the file under the
    /// `file` field.
    async fn upload(
        &self,
        endpoint: &str,
        file: &CandidateFile,
    ) -> Result<UploadedAsset, ClientError> {
        let bytes = file.read_bytes().await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.normalized_mime())?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = join_url(&self.base_url, endpoint);
        tracing::info!(%url, file = %file.name, size_bytes = file.size_bytes, "Uploading asset");

        let request = async {
            let response = self.client.post(&url).multipart(form).send().await?;
            parse_response::<UploadedAsset>(response).await
        };
        let uploaded = match self.upload_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| ClientError::Timeout(limit))??,
            None => request.await?,
        };

        tracing::info!(url = %uploaded.url, "Asset uploaded");
        Ok(uploaded)
    }
}

#[async_trait]
impl DeleteService for SpacesClient {
    /// Sends a `POST /api/spaces/delete` request with `{ "url": ... }`,
    /// giving up after the configured deadline. The deadline covers the
    /// whole exchange, error bodies included.
    async fn delete(&self, url: &str) -> Result<(), ClientError> {
        let endpoint = join_url(&self.base_url, endpoints::DELETE);
        let request = async {
            let response = self
                .client
                .post(&endpoint)
                .json(&serde_json::json!({ "url": url }))
                .send()
                .await?;
            check_status(response).await
        };

        tokio::time::timeout(self.delete_timeout, request)
            .await
            .map_err(|_| ClientError::Timeout(self.delete_timeout))??;

        tracing::info!(%url, "Asset deleted from storage");
        Ok(())
    }
}

//! Blob storage seam.
//!
//! `BlobContainer` is the only thing the upload transfer knows about remote
//! storage. `AzureContainer` is the production implementation, built from a
//! [`StorageConfig`] by [`get_container_client`].

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use azure_core::{StatusCode, error::Error as AzureError};
use azure_storage::ConnectionString;
use azure_storage_blobs::prelude::{ClientBuilder, ContainerClient};
use bytes::Bytes;
use url::Url;

use crate::{
    config::StorageConfig,
    error::{PipelineError, PipelineResult},
};

/// Metadata attached to every uploaded blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSettings {
    pub content_type: Option<String>,
}

/// One remote container.
#[async_trait]
pub trait BlobContainer: Send + Sync {
    /// Writes `data` to `blob_name`, replacing any existing blob.
    async fn upload_bytes(
        &self,
        blob_name: &str,
        data: Bytes,
        settings: &ContentSettings,
    ) -> PipelineResult<()>;

    /// Has the storage service copy `source` into `blob_name` itself. The blob
    /// keeps whatever content type the source served; [`ContentSettings`] only
    /// apply to [`upload_bytes`](Self::upload_bytes).
    async fn upload_from_url(
        &self,
        blob_name: &str,
        source: &Url,
        overwrite: bool,
    ) -> PipelineResult<()>;
}

pub type ContainerHandle = Arc<dyn BlobContainer>;

pub struct AzureContainer {
    client: ContainerClient,
}

impl AzureContainer {
    pub fn new(client: ContainerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobContainer for AzureContainer {
    async fn upload_bytes(
        &self,
        blob_name: &str,
        data: Bytes,
        settings: &ContentSettings,
    ) -> PipelineResult<()> {
        let mut put = self.client.blob_client(blob_name).put_block_blob(data);
        if let Some(content_type) = &settings.content_type {
            put = put.content_type(content_type.clone());
        }
        put.await.map_err(|e| classify_azure_error(blob_name, e))?;
        Ok(())
    }

    async fn upload_from_url(
        &self,
        blob_name: &str,
        source: &Url,
        overwrite: bool,
    ) -> PipelineResult<()> {
        let blob = self.client.blob_client(blob_name);
        if !overwrite {
            let exists = blob
                .exists()
                .await
                .map_err(|e| classify_azure_error(blob_name, e))?;
            if exists {
                return Err(PipelineError::transfer(blob_name, "blob already exists"));
            }
        }
        blob.copy_from_url(source.clone())
            .is_synchronous(true)
            .await
            .map_err(|e| classify_azure_error(blob_name, e))?;
        Ok(())
    }
}

fn classify_azure_error(blob_name: &str, err: AzureError) -> PipelineError {
    let denied = err
        .as_http_error()
        .is_some_and(|http| matches!(http.status(), StatusCode::Unauthorized | StatusCode::Forbidden));
    if denied {
        PipelineError::Auth(err.to_string())
    } else {
        PipelineError::transfer(blob_name, err)
    }
}

/// Builds a handle to the configured container. Credentials are only checked
/// by the service, on the first request made through the handle.
pub fn get_container_client(config: &StorageConfig) -> PipelineResult<ContainerHandle> {
    let connection_string = ConnectionString::new(&config.connection_string)
        .map_err(|e| PipelineError::Auth(format!("invalid connection string: {e}")))?;

    let builder = if connection_string.use_development_storage == Some(true) {
        ClientBuilder::emulator()
    } else {
        let account = connection_string.account_name.ok_or_else(|| {
            PipelineError::Auth("connection string has no AccountName".to_string())
        })?;
        let credentials = connection_string
            .storage_credentials()
            .map_err(|e| PipelineError::Auth(format!("invalid connection string: {e}")))?;
        ClientBuilder::new(account, credentials)
    };

    let client = builder.container_client(config.container_name.clone());
    Ok(Arc::new(AzureContainer::new(client)))
}

pub fn get_content_settings(config: &StorageConfig) -> ContentSettings {
    ContentSettings {
        content_type: config.content_type.clone(),
    }
}

/// Blob name for a file, under the configured storage path if there is one.
pub fn blob_name(storage_path: &str, file_name: &str) -> String {
    let prefix = storage_path.trim_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{prefix}/{file_name}")
    }
}

/// Something that can produce storage settings, and from them a container.
pub trait ConfigBacked {
    fn storage_config(&self) -> PipelineResult<StorageConfig>;

    fn resolve_container_handle(&self) -> PipelineResult<ContainerHandle> {
        get_container_client(&self.storage_config()?)
    }
}

/// Storage settings read from a YAML file (or the environment when the file
/// is absent), freshly on every call.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigBacked for SettingsFile {
    fn storage_config(&self) -> PipelineResult<StorageConfig> {
        StorageConfig::load(&self.path)
    }
}

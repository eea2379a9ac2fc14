use std::{
    fmt,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::{
    blob::{ConfigBacked, ContainerHandle, ContentSettings, blob_name, get_content_settings},
    error::{PipelineError, PipelineResult},
    link_scraper::FileLink,
    ratelimit::{RateLimiter, RatePolicy},
};

use super::{FailurePolicy, Transferable};

/// Where a blob's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadItem {
    /// Copied by the storage service straight from the URL.
    Remote(FileLink),
    /// Read from disk and deleted once the upload succeeds.
    Local(PathBuf),
}

impl fmt::Display for UploadItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadItem::Remote(link) => write!(f, "{link}"),
            UploadItem::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

pub struct UploadTransfer {
    container: ContainerHandle,
    content_settings: ContentSettings,
    storage_path: String,
    rate_limiter: RateLimiter,
    failure_policy: FailurePolicy,
}

impl UploadTransfer {
    pub fn new(
        container: ContainerHandle,
        content_settings: ContentSettings,
        storage_path: impl Into<String>,
        rate_policy: RatePolicy,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            container,
            content_settings,
            storage_path: storage_path.into(),
            rate_limiter: RateLimiter::new(rate_policy),
            failure_policy,
        }
    }

    /// Loads the storage settings and resolves the container they name.
    pub fn from_config(
        source: &impl ConfigBacked,
        rate_policy: RatePolicy,
        failure_policy: FailurePolicy,
    ) -> PipelineResult<Self> {
        let config = source.storage_config()?;
        let container = source.resolve_container_handle()?;
        Ok(Self::new(
            container,
            get_content_settings(&config),
            config.storage_path,
            rate_policy,
            failure_policy,
        ))
    }

    async fn upload_remote(&self, link: &FileLink) -> PipelineResult<String> {
        let source = Url::parse(link.as_str())
            .map_err(|e| PipelineError::transfer(link, format!("not an absolute URL: {e}")))?;
        let file_name = link
            .file_name()
            .ok_or_else(|| PipelineError::transfer(link, "link has no file name"))?;
        let name = blob_name(&self.storage_path, file_name);

        self.container.upload_from_url(&name, &source, true).await?;
        log::info!("Uploaded to storage: {link} -> {name}");
        Ok(name)
    }

    async fn upload_local(&self, path: &Path) -> PipelineResult<String> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| PipelineError::transfer(path.display(), "path has no file name"))?;
        let name = blob_name(&self.storage_path, file_name);

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::transfer(path.display(), e))?;
        self.container
            .upload_bytes(&name, Bytes::from(data), &self.content_settings)
            .await?;
        log::info!("Uploaded to storage: {}", path.display());

        match tokio::fs::remove_file(path).await {
            Ok(()) => log::info!("Removed: {}", path.display()),
            Err(e) => log::warn!("Uploaded but could not remove {}: {e}", path.display()),
        }
        Ok(name)
    }
}

#[async_trait]
impl Transferable for UploadTransfer {
    type Item = UploadItem;
    type Output = String;

    fn verb(&self) -> &'static str {
        "upload"
    }

    fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    async fn transfer_one(&self, item: &UploadItem) -> PipelineResult<String> {
        match item {
            UploadItem::Remote(link) => self.upload_remote(link).await,
            UploadItem::Local(path) => self.upload_local(path).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        blob::testing::MemoryContainer,
        config::StorageConfig,
    };

    fn uploader(container: Arc<MemoryContainer>, policy: FailurePolicy) -> UploadTransfer {
        UploadTransfer::new(
            container,
            ContentSettings {
                content_type: Some("application/vnd.apache.parquet".to_string()),
            },
            "",
            RatePolicy::unlimited(),
            policy,
        )
    }

    fn local_file(dir: &Path, name: &str, contents: &str) -> UploadItem {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        UploadItem::Local(path)
    }

    #[tokio::test]
    async fn local_upload_deletes_file_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let container = Arc::new(MemoryContainer::default());
        let item = local_file(dir.path(), "green_2021-03.parquet", "PAR1");

        let report = uploader(container.clone(), FailurePolicy::Abort)
            .transfer_all(&[item])
            .await
            .unwrap();

        assert_eq!(report.completed, vec!["green_2021-03.parquet".to_string()]);
        assert!(!dir.path().join("green_2021-03.parquet").exists());
        let blobs = container.blobs.lock().unwrap();
        let blob = &blobs["green_2021-03.parquet"];
        assert_eq!(&blob.data[..], b"PAR1");
        assert_eq!(
            blob.content_type.as_deref(),
            Some("application/vnd.apache.parquet")
        );
    }

    #[tokio::test]
    async fn failed_upload_keeps_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let container = Arc::new(MemoryContainer::default());
        container.fail_on("bad.parquet");
        let items = vec![
            local_file(dir.path(), "bad.parquet", "x"),
            local_file(dir.path(), "good.parquet", "y"),
        ];

        let report = uploader(container.clone(), FailurePolicy::Continue)
            .transfer_all(&items)
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(dir.path().join("bad.parquet").exists());
        assert!(!dir.path().join("good.parquet").exists());
        assert_eq!(container.blob_names(), vec!["good.parquet".to_string()]);
    }

    #[tokio::test]
    async fn uploading_same_file_twice_leaves_one_blob() {
        let dir = tempfile::tempdir().unwrap();
        let container = Arc::new(MemoryContainer::default());
        let transfer = uploader(container.clone(), FailurePolicy::Abort);

        let first = local_file(dir.path(), "fhv_2020-01.parquet", "v1");
        assert!(transfer.transfer_all(&[first]).await.unwrap().is_success());
        let second = local_file(dir.path(), "fhv_2020-01.parquet", "v2");
        assert!(transfer.transfer_all(&[second]).await.unwrap().is_success());

        assert_eq!(container.blob_names(), vec!["fhv_2020-01.parquet".to_string()]);
        let blobs = container.blobs.lock().unwrap();
        assert_eq!(&blobs["fhv_2020-01.parquet"].data[..], b"v2");
    }

    #[tokio::test]
    async fn remote_upload_copies_from_url_under_storage_path() {
        let container = Arc::new(MemoryContainer::default());
        let transfer = UploadTransfer::new(
            container.clone(),
            ContentSettings {
                content_type: Some("application/vnd.apache.parquet".to_string()),
            },
            "raw/tlc",
            RatePolicy::unlimited(),
            FailurePolicy::Abort,
        );
        let link = FileLink::new("https://cdn.example.com/trip-data/yellow_tripdata_2022-05.parquet");

        let report = transfer
            .transfer_all(&[UploadItem::Remote(link.clone())])
            .await
            .unwrap();

        assert_eq!(
            report.completed,
            vec!["raw/tlc/yellow_tripdata_2022-05.parquet".to_string()]
        );
        let blobs = container.blobs.lock().unwrap();
        let blob = &blobs["raw/tlc/yellow_tripdata_2022-05.parquet"];
        assert_eq!(blob.copied_from.as_deref(), Some(link.as_str()));
        assert_eq!(blob.content_type, None);
    }

    #[tokio::test]
    async fn relative_link_cannot_be_copied() {
        let container = Arc::new(MemoryContainer::default());
        let report = uploader(container.clone(), FailurePolicy::Abort)
            .transfer_all(&[UploadItem::Remote(FileLink::new("2019_yellow.parquet"))])
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(container.blob_names().is_empty());
    }

    #[tokio::test]
    async fn auth_failure_ends_batch_even_when_continuing() {
        let dir = tempfile::tempdir().unwrap();
        let container = Arc::new(MemoryContainer {
            deny_all: true,
            ..Default::default()
        });
        let items = vec![
            local_file(dir.path(), "a.parquet", "a"),
            local_file(dir.path(), "b.parquet", "b"),
        ];

        let err = uploader(container, FailurePolicy::Continue)
            .transfer_all(&items)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Auth(_)));
        assert!(dir.path().join("a.parquet").exists());
        assert!(dir.path().join("b.parquet").exists());
    }

    struct FixedConfig;

    impl ConfigBacked for FixedConfig {
        fn storage_config(&self) -> PipelineResult<StorageConfig> {
            Ok(StorageConfig {
                connection_string: "AccountName=tripdata;AccountKey=a2V5".to_string(),
                container_name: "trips".to_string(),
                storage_path: "nyc".to_string(),
                content_type: Some("text/csv".to_string()),
            })
        }

        fn resolve_container_handle(&self) -> PipelineResult<ContainerHandle> {
            Ok(Arc::new(MemoryContainer::default()))
        }
    }

    #[test]
    fn from_config_takes_path_and_content_type() {
        let transfer =
            UploadTransfer::from_config(&FixedConfig, RatePolicy::unlimited(), FailurePolicy::Abort)
                .unwrap();
        assert_eq!(transfer.storage_path, "nyc");
        assert_eq!(transfer.content_settings.content_type.as_deref(), Some("text/csv"));
    }
}

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    error::{PipelineError, PipelineResult},
    link_scraper::FileLink,
    ratelimit::{RateLimiter, RatePolicy},
    requests::RequestClient,
};

use super::{FailurePolicy, Transferable};

/// Fetches each link into `target_dir/<file name>`.
///
/// A file name is written at most once per transfer; a later link that maps
/// to an already written name fails instead of overwriting it.
pub struct DownloadTransfer {
    request_client: RequestClient,
    target_dir: PathBuf,
    rate_limiter: RateLimiter,
    failure_policy: FailurePolicy,
    written: Mutex<HashSet<PathBuf>>,
}

impl DownloadTransfer {
    pub fn new(
        request_client: RequestClient,
        target_dir: impl Into<PathBuf>,
        rate_policy: RatePolicy,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            request_client,
            target_dir: target_dir.into(),
            rate_limiter: RateLimiter::new(rate_policy),
            failure_policy,
            written: Mutex::new(HashSet::new()),
        }
    }

    fn already_written(&self, path: &Path) -> bool {
        self.written
            .lock()
            .map(|written| written.contains(path))
            .unwrap_or(false)
    }

    fn mark_written(&self, path: &Path) {
        if let Ok(mut written) = self.written.lock() {
            written.insert(path.to_path_buf());
        }
    }

    fn local_path(&self, link: &FileLink) -> PipelineResult<PathBuf> {
        let file_name = link
            .file_name()
            .ok_or_else(|| PipelineError::transfer(link, "link has no file name"))?;
        Ok(self.target_dir.join(file_name))
    }
}

#[async_trait]
impl Transferable for DownloadTransfer {
    type Item = FileLink;
    type Output = PathBuf;

    fn verb(&self) -> &'static str {
        "download"
    }

    fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    async fn transfer_one(&self, link: &FileLink) -> PipelineResult<PathBuf> {
        let path = self.local_path(link)?;
        if self.already_written(&path) {
            return Err(PipelineError::transfer(
                link,
                format!("{} was already written by an earlier link", path.display()),
            ));
        }
        let body = self
            .request_client
            .fetch_url_bytes(link.as_str())
            .await
            .map_err(|e| PipelineError::transfer(link, e))?;

        tokio::fs::create_dir_all(&self.target_dir).await?;
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| PipelineError::transfer(link, e))?;
        self.mark_written(&path);

        log::info!("Downloaded: {link} -> {}", path.display());
        Ok(path)
    }
}

mod download;
mod upload;

pub use download::DownloadTransfer;
pub use upload::{UploadItem, UploadTransfer};

use std::fmt;

use async_trait::async_trait;

use crate::{error::PipelineResult, progress::transfer_bar, ratelimit::RateLimiter};

/// What a batch does when one of its items fails. Fatal errors (config, auth)
/// end the batch under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Stop at the first failed item; the rest are reported as skipped.
    #[default]
    Abort,
    /// Record the failure and move on to the next item.
    Continue,
}

#[derive(Debug)]
pub struct TransferFailure<I> {
    pub item: I,
    pub error: crate::error::PipelineError,
}

#[derive(Debug)]
pub struct TransferReport<I, O> {
    pub completed: Vec<O>,
    pub failures: Vec<TransferFailure<I>>,
    pub skipped: Vec<I>,
}

impl<I, O> TransferReport<I, O> {
    fn new() -> Self {
        Self {
            completed: vec![],
            failures: vec![],
            skipped: vec![],
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }
}

impl<I: fmt::Display, O> TransferReport<I, O> {
    pub fn log_summary(&self, verb: &str) {
        log::info!(
            "{verb}: {} succeeded, {} failed, {} skipped",
            self.completed.len(),
            self.failures.len(),
            self.skipped.len()
        );
        for failure in &self.failures {
            log::error!("{verb} failed for {}: {}", failure.item, failure.error);
        }
    }
}

/// A sequential, rate limited batch transfer.
#[async_trait]
pub trait Transferable: Send + Sync {
    type Item: Clone + fmt::Display + Send + Sync;
    type Output: Send;

    fn verb(&self) -> &'static str;

    fn rate_limiter(&self) -> &RateLimiter;

    fn failure_policy(&self) -> FailurePolicy;

    async fn transfer_one(&self, item: &Self::Item) -> PipelineResult<Self::Output>;

    async fn transfer_all(
        &self,
        items: &[Self::Item],
    ) -> PipelineResult<TransferReport<Self::Item, Self::Output>> {
        let bar = transfer_bar(items.len(), self.verb());
        let mut report = TransferReport::new();

        for (index, item) in items.iter().enumerate() {
            self.rate_limiter().wait_until_ready().await;
            bar.set_message(item.to_string());

            match self.transfer_one(item).await {
                Ok(output) => report.completed.push(output),
                Err(err) if err.is_fatal() => {
                    bar.abandon();
                    return Err(err);
                }
                Err(err) => {
                    log::error!("{err}");
                    report.failures.push(TransferFailure {
                        item: item.clone(),
                        error: err,
                    });
                    if self.failure_policy() == FailurePolicy::Abort {
                        report.skipped.extend(items[index + 1..].iter().cloned());
                        break;
                    }
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        Ok(report)
    }
}

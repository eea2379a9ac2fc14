pub mod blob;
pub mod cli;
pub mod config;
mod error;
pub mod link_scraper;
mod orchestrator;
mod pipeline_context;
mod progress;
pub mod prompt;
pub mod ratelimit;
mod requests;
mod text_manipulators;
pub mod transfer;

pub use blob::{BlobContainer, ConfigBacked, ContainerHandle, ContentSettings, SettingsFile};
pub use config::{PipelineConfig, StorageConfig, UploadMode};
pub use error::{PipelineError, PipelineResult};
pub use link_scraper::{FileLink, LinkScraper, ScrapeRequest};
pub use orchestrator::{Orchestrator, RunOutcome, RunParams, RunSummary, Stage};
pub use pipeline_context::PipelineContext;
pub use prompt::{ConsolePrompter, Decision, Prompter};
pub use requests::RequestClient;
pub use transfer::{DownloadTransfer, FailurePolicy, Transferable, UploadItem, UploadTransfer};

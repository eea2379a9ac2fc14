use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{PipelineError, PipelineResult},
    ratelimit::RatePolicy,
    transfer::FailurePolicy,
};

pub const DEFAULT_PAGE_URL: &str = "https://www.nyc.gov/site/tlc/about/tlc-trip-record-data.page";
pub const DEFAULT_FILE_SUFFIX: &str = ".parquet";
pub const DEFAULT_DATA_DIR: &str = "data/";
pub const DEFAULT_SETTINGS_PATH: &str = "config/storage.yaml";

/// Connection parameters for the blob container the files end up in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(alias = "azure_storage_connectionstring")]
    pub connection_string: String,
    #[serde(alias = "dataset_nyc_container_name")]
    pub container_name: String,
    #[serde(default, alias = "azure_storage_path")]
    pub storage_path: String,
    #[serde(default, alias = "content_type")]
    pub content_type: Option<String>,
}

/// The env vars read when no settings file is present.
#[derive(Debug, Deserialize)]
pub struct StorageEnv {
    storage_connection_string: String,
    storage_container_name: String,
    #[serde(default)]
    storage_path: String,
    storage_content_type: Option<String>,
}

impl StorageConfig {
    pub fn load_from_file(path: &Path) -> PipelineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read settings file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&raw)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    pub fn from_env() -> PipelineResult<Self> {
        let env = StorageEnv::load_from_env().map_err(|e| PipelineError::Config(format!("{e:#}")))?;
        Ok(Self {
            connection_string: env.storage_connection_string,
            container_name: env.storage_container_name,
            storage_path: env.storage_path,
            content_type: env.storage_content_type,
        })
    }

    /// Reads the settings file if there is one, the environment otherwise.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            log::debug!(
                "settings file {} not found, reading storage config from env",
                path.display()
            );
            Self::from_env()
        }
    }
}

/// Where uploaded blobs get their bytes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UploadMode {
    /// Download to the data directory, upload from disk, then delete.
    #[default]
    Local,
    /// Let the storage service copy straight from the scraped URLs.
    Remote,
}

/// Everything a run needs besides the user's answers.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub page_url: String,
    pub file_suffix: String,
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
    pub rate_policy: RatePolicy,
    pub failure_policy: FailurePolicy,
    pub upload_mode: UploadMode,
    /// Answer yes to every confirmation.
    pub assume_yes: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            file_suffix: DEFAULT_FILE_SUFFIX.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            rate_policy: RatePolicy::default(),
            failure_policy: FailurePolicy::default(),
            upload_mode: UploadMode::default(),
            assume_yes: false,
        }
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}

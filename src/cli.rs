use std::{num::NonZeroU32, path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    config::{
        DEFAULT_DATA_DIR, DEFAULT_FILE_SUFFIX, DEFAULT_PAGE_URL, DEFAULT_SETTINGS_PATH,
        PipelineConfig, UploadMode,
    },
    orchestrator::RunParams,
    ratelimit::RatePolicy,
    transfer::FailurePolicy,
};

#[derive(Debug, Parser)]
#[command(name = "catalog-harvester")]
#[command(
    about = "Scrape a data catalog for dataset files, download them and push them to blob storage",
    long_about = None
)]
pub struct Cli {
    /// First year to match (asked for when omitted)
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last year to match, inclusive (asked for when omitted)
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Token every link must contain, e.g. yellow; empty for no filter
    #[arg(long)]
    pub category: Option<String>,

    /// Catalog page to scrape
    #[arg(long, env = "HARVEST_PAGE_URL", default_value = DEFAULT_PAGE_URL)]
    pub page_url: String,

    /// Suffix every link must contain
    #[arg(long, default_value = DEFAULT_FILE_SUFFIX)]
    pub file_suffix: String,

    /// Directory downloads are written to
    #[arg(long, env = "HARVEST_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// YAML storage settings; env vars are used when the file does not exist
    #[arg(long, env = "HARVEST_SETTINGS", default_value = DEFAULT_SETTINGS_PATH)]
    pub config: PathBuf,

    #[arg(long, value_enum, default_value_t = UploadMode::Local)]
    pub upload_mode: UploadMode,

    #[arg(long, value_enum, default_value_t = FailurePolicy::Abort)]
    pub on_failure: FailurePolicy,

    /// Seconds between transfers; 0 disables the cooldown
    #[arg(long, default_value_t = 5)]
    pub cooldown_secs: u64,

    /// Transfers allowed per cooldown interval
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub burst: u32,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineConfig {
        let burst = NonZeroU32::new(self.burst).unwrap_or(NonZeroU32::MIN);
        PipelineConfig {
            page_url: self.page_url.clone(),
            file_suffix: self.file_suffix.clone(),
            data_dir: self.data_dir.clone(),
            settings_path: self.config.clone(),
            rate_policy: RatePolicy::new(burst, Duration::from_secs(self.cooldown_secs)),
            failure_policy: self.on_failure,
            upload_mode: self.upload_mode,
            assume_yes: self.yes,
        }
    }

    pub fn run_params(&self) -> RunParams {
        RunParams {
            start_year: self.start_year,
            end_year: self.end_year,
            category: self.category.clone(),
        }
    }
}

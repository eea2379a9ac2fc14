use std::path::PathBuf;

use chrono::{Datelike, Utc};

use crate::{
    blob::ConfigBacked,
    config::UploadMode,
    error::{PipelineError, PipelineResult},
    link_scraper::{FileLink, LinkScraper, ScrapeRequest},
    pipeline_context::PipelineContext,
    prompt::{Decision, Prompter, confirm_question},
    transfer::{DownloadTransfer, FailurePolicy, Transferable, UploadItem, UploadTransfer},
};

const START_YEAR_QUESTION: &str = "What year do you want to start from? ";
const END_YEAR_QUESTION: &str = "What year do you want to end at? (blank for this year) ";
const CATEGORY_QUESTION: &str =
    "What type of taxi do you want to download? (yellow, green, fhv, blank for all) ";

/// Answers given up front, e.g. on the command line. Anything left `None` is
/// asked for interactively.
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Upload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub found: usize,
    pub downloaded: usize,
    pub uploaded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// The user said no at a confirmation gate.
    Declined { stage: Stage, summary: RunSummary },
}

impl RunOutcome {
    pub fn summary(&self) -> &RunSummary {
        match self {
            RunOutcome::Completed(summary) | RunOutcome::Declined { summary, .. } => summary,
        }
    }

    /// 1 when any item failed, even if the user stopped the run afterwards.
    pub fn exit_code(&self) -> i32 {
        if self.summary().failed > 0 { 1 } else { 0 }
    }
}

pub struct Orchestrator<P, C> {
    context: PipelineContext,
    storage: C,
    prompter: P,
}

impl<P: Prompter, C: ConfigBacked> Orchestrator<P, C> {
    pub fn new(context: PipelineContext, storage: C, prompter: P) -> Self {
        Self {
            context,
            storage,
            prompter,
        }
    }

    pub fn into_prompter(self) -> P {
        self.prompter
    }

    pub async fn run(&mut self, params: RunParams) -> PipelineResult<RunOutcome> {
        // Broken settings should stop the run before anything is fetched.
        self.storage.storage_config()?;

        let request = self.collect_request(params)?;
        let scraper = LinkScraper::new(self.context.request_client.clone());
        let links = scraper.scrape(&request).await?;

        let mut summary = RunSummary {
            found: links.len(),
            ..Default::default()
        };
        if links.is_empty() {
            log::warn!("No files matched, nothing to transfer");
            return Ok(RunOutcome::Completed(summary));
        }

        let items: Vec<UploadItem> = match self.context.pipeline_config.upload_mode {
            UploadMode::Remote => links.into_iter().map(UploadItem::Remote).collect(),
            UploadMode::Local => {
                if self.confirm("download")? == Decision::Decline {
                    return Ok(RunOutcome::Declined {
                        stage: Stage::Download,
                        summary,
                    });
                }
                let downloaded = self.download(&links, &mut summary).await?;
                if summary.failed > 0
                    && self.context.pipeline_config.failure_policy == FailurePolicy::Abort
                {
                    return Ok(RunOutcome::Completed(summary));
                }
                downloaded.into_iter().map(UploadItem::Local).collect()
            }
        };
        if items.is_empty() {
            log::warn!("Nothing was downloaded, nothing to upload");
            return Ok(RunOutcome::Completed(summary));
        }

        if self.confirm("upload")? == Decision::Decline {
            return Ok(RunOutcome::Declined {
                stage: Stage::Upload,
                summary,
            });
        }
        self.upload(&items, &mut summary).await?;

        Ok(RunOutcome::Completed(summary))
    }

    fn collect_request(&mut self, params: RunParams) -> PipelineResult<ScrapeRequest> {
        let start_year = match params.start_year {
            Some(year) => year,
            None => parse_year(&self.prompter.ask(START_YEAR_QUESTION)?)?
                .ok_or_else(|| PipelineError::Input("a start year is required".to_string()))?,
        };
        let end_year = match params.end_year {
            Some(year) => year,
            None => parse_year(&self.prompter.ask(END_YEAR_QUESTION)?)?
                .unwrap_or_else(|| Utc::now().year()),
        };
        let category = match params.category {
            Some(category) => category,
            None => self.prompter.ask(CATEGORY_QUESTION)?,
        };
        let category = category.trim();

        if start_year > end_year {
            log::warn!("Start year {start_year} is after end year {end_year}, nothing will match");
        }

        let config = &self.context.pipeline_config;
        Ok(ScrapeRequest {
            page_url: config.page_url.clone(),
            start_year,
            end_year,
            file_suffix: config.file_suffix.clone(),
            category_filter: (!category.is_empty()).then(|| category.to_string()),
        })
    }

    fn confirm(&mut self, verb: &str) -> PipelineResult<Decision> {
        if self.context.pipeline_config.assume_yes {
            return Ok(Decision::Proceed);
        }
        let decision = Decision::from_answer(&self.prompter.ask(&confirm_question(verb))?);
        if decision == Decision::Decline {
            println!("Ok, bye!");
        }
        Ok(decision)
    }

    async fn download(
        &self,
        links: &[FileLink],
        summary: &mut RunSummary,
    ) -> PipelineResult<Vec<PathBuf>> {
        let config = &self.context.pipeline_config;
        let transfer = DownloadTransfer::new(
            self.context.request_client.clone(),
            &config.data_dir,
            config.rate_policy,
            config.failure_policy,
        );
        let report = transfer.transfer_all(links).await?;
        report.log_summary("download");

        summary.downloaded = report.completed.len();
        summary.failed += report.failures.len();
        Ok(report.completed)
    }

    async fn upload(&self, items: &[UploadItem], summary: &mut RunSummary) -> PipelineResult<()> {
        let config = &self.context.pipeline_config;
        let transfer =
            UploadTransfer::from_config(&self.storage, config.rate_policy, config.failure_policy)?;
        let report = transfer.transfer_all(items).await?;
        report.log_summary("upload");

        summary.uploaded = report.completed.len();
        summary.failed += report.failures.len();
        Ok(())
    }
}

fn parse_year(answer: &str) -> PipelineResult<Option<i32>> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(None);
    }
    answer
        .parse()
        .map(Some)
        .map_err(|_| PipelineError::Input(format!("'{answer}' is not a year")))
}

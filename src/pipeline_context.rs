use crate::{
    blob::SettingsFile, config::PipelineConfig, error::PipelineResult, requests::RequestClient,
};

pub struct PipelineContext {
    pub pipeline_config: PipelineConfig,
    pub request_client: RequestClient,
}

impl PipelineContext {
    pub fn new(pipeline_config: PipelineConfig) -> PipelineResult<Self> {
        let request_client = RequestClient::new()?;
        Ok(PipelineContext {
            pipeline_config,
            request_client,
        })
    }

    pub fn settings_file(&self) -> SettingsFile {
        SettingsFile::new(&self.pipeline_config.settings_path)
    }
}

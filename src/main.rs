use catalog_harvester::{
    ConsolePrompter, Orchestrator, PipelineContext, PipelineError, RunOutcome, cli::Cli,
};
use clap::Parser;
use dotenv::dotenv;

extern crate env_logger;
extern crate log;

use log::LevelFilter;

use log::{error, info};

async fn run(cli: Cli) -> Result<RunOutcome, PipelineError> {
    let context = PipelineContext::new(cli.pipeline_config())?;
    let settings = context.settings_file();
    let mut orchestrator = Orchestrator::new(context, settings, ConsolePrompter);
    orchestrator.run(cli.run_params()).await
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(outcome) => {
            info!("{outcome:?}");
            outcome.exit_code()
        }
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}

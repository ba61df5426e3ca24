use audioscribe::cli::{Cli, Commands};
use audioscribe::commands::{self, RunOverrides};
use audioscribe::config::Config;
use audioscribe::transcribe::runner;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("audioscribe=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig { force, path } => {
            commands::init_config(path.as_deref(), force)?;
            Ok(())
        }
        Commands::Run {
            audio,
            title,
            output_dir,
            interval,
            max_attempts,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            let overrides = RunOverrides {
                title,
                output_dir,
                interval,
                max_attempts,
            };
            let (config, request) = commands::prepare_run(config, &audio, overrides)?;
            tracing::debug!("Using config: {:?}", config);
            runner::run_transcribe(&config, &request)
        }
        Commands::Upload { audio } => {
            let config = Config::load(cli.config.as_deref())?;
            commands::upload_only(&config, &audio)
        }
        Commands::Status { job_id } => {
            let config = Config::load(cli.config.as_deref())?;
            commands::show_job_status(&config, &job_id)
        }
    }
}

//! gempreload CLI
//!
//! Downloads a repository's specs index and issues a HEAD request for every
//! listed gem, warming any caching mirror in between.

mod args;
mod error;
mod progress;

use clap::Parser;
use gempreload::logging::init_logging;
use gempreload::{PreloadRunner, ReqwestClient};
use tracing::info;

use args::Cli;
use error::CliError;
use progress::ProbeProgress;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.load_config()?;
    let settings = cli.resolve(&config);

    // Held until exit so buffered file logs are flushed.
    let _log_guard = init_logging(&settings.logging)?;

    info!(
        url = %settings.url,
        index = %settings.source,
        workers = settings.run.effective_workers(),
        skip = settings.run.skip,
        limit = ?settings.run.limit,
        "Starting gempreload"
    );

    let client =
        ReqwestClient::with_timeout(&settings.url, settings.timeout).map_err(CliError::Client)?;

    let progress = ProbeProgress::new(settings.progress);
    let mut runner = PreloadRunner::new(&client, settings.source)
        .with_config(settings.run)
        .with_failure_handler(progress.failure_callback());
    if let Some(callback) = progress.progress_callback() {
        runner = runner.with_progress(callback);
    }

    let result = runner.run();
    progress.finish();
    result?;
    Ok(())
}

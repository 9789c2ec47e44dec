use anyhow::Context as _;
use chrono::Utc;
use loadkit_report::{JsonResults, ReportWriter, SyntheticResults, ingest, render};

use crate::cli::ReportArgs;
use crate::exit_codes::ExitCode;
use crate::run_error::RunError;

pub async fn report(args: ReportArgs) -> Result<ExitCode, RunError> {
    let now = Utc::now();

    let data = match &args.results {
        Some(path) => ingest(&mut JsonResults::new(path)),
        None => ingest(&mut SyntheticResults::new(now)),
    }
    .context("failed to load results")
    .map_err(RunError::InvalidInput)?;

    let html = render(&data, now)
        .context("failed to render report")
        .map_err(RunError::RuntimeError)?;

    let path = ReportWriter::new(&args.out_dir)
        .write(&html)
        .await
        .context("failed to write report")
        .map_err(RunError::RuntimeError)?;

    println!("{}", path.display());
    Ok(ExitCode::Success)
}

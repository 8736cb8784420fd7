use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use u21_export::{cli, errors};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(
                error = %e,
                job_id = ?e.job_id(),
                status = ?e.status(),
                "Export failed"
            );
            ExitCode::FAILURE
        }
    }
}

fn run() -> errors::AppResult<()> {
    let rt =
        tokio::runtime::Runtime::new().map_err(|e| errors::AppError::IoError(e.to_string()))?;

    if let Some(saved) = rt.block_on(cli::cli())? {
        println!("{}", saved.display());
    }
    Ok(())
}

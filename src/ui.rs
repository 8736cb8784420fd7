use crate::errors::{AppError, AppResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Creates a byte-count progress bar with the standard application styling.
///
/// Used for downloads whose size is announced by the server. Hidden automatically when
/// stderr is not a terminal.
///
/// # Example
///
/// ```no_run
/// use u21_export::ui;
///
/// # fn main() -> Result<(), u21_export::errors::AppError> {
/// let pb = ui::create_progress_bar(1_048_576)?;
/// pb.inc(4096);
/// pb.finish_with_message("Done");
/// # Ok(())
/// # }
/// ```
pub fn create_progress_bar(total_bytes: u64) -> AppResult<ProgressBar> {
    let pb = ProgressBar::new(total_bytes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} {msg}",
            )
            .map_err(|e| AppError::IoError(format!("Failed to create progress bar template: {e}")))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Creates a spinner for transfers of unknown size.
pub fn create_spinner() -> AppResult<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {bytes} {msg}")
            .map_err(|e| AppError::IoError(format!("Failed to create spinner template: {e}")))?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

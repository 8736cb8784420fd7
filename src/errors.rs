use thiserror::Error;

/// Every way an export call can fail.
///
/// The first group mirrors the lifecycle of an export: HTTP failures surfaced by the
/// request executor, then failures of the individual job stages. The remaining variants
/// cover local concerns (transport, parsing, validation, file system).
#[derive(Debug, Error)]
pub enum AppError {
    /// Non-retryable HTTP status
    #[error("HTTP {status} from {method} {url}: {message}")]
    ClientError {
        status: u16,
        method: String,
        url: String,
        message: String,
    },
    /// Retry budget spent on a retryable status
    #[error("{method} {url} still failing with HTTP {status} after {attempts} attempts")]
    RemoteExhausted {
        status: u16,
        method: String,
        url: String,
        attempts: u32,
    },
    /// The request did not complete within the transport timeout
    #[error("{method} {url} timed out: {message}")]
    Timeout {
        method: String,
        url: String,
        message: String,
    },
    /// The bulk-export endpoint answered without a usable job id
    #[error("Export submission to {url} returned no job id (response: {body})")]
    SubmissionError { url: String, body: String },
    /// The remote service marked the job as failed
    #[error("Export job {job_id} failed on the remote side")]
    JobFailed { job_id: u64 },
    /// Polling ran past the configured wall-clock timeout
    #[error("Export job {job_id} was not ready after {elapsed_minutes} minutes")]
    JobTimeout { job_id: u64, elapsed_minutes: f64 },
    /// The download-resolution response carried no URL
    #[error("No download URL returned for export job {job_id}")]
    NoDownloadUrl { job_id: u64 },
    /// Transfer or post-write check failed
    #[error("Download to {path} failed: {message}")]
    DownloadError { path: String, message: String },
    /// Transport failed before any HTTP status was received
    #[error("Network error: {0}")]
    NetworkError(String),
    /// A successful response could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Invalid input or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
}

impl AppError {
    /// Job id the error refers to, when it belongs to a specific export job.
    pub fn job_id(&self) -> Option<u64> {
        match self {
            AppError::JobFailed { job_id }
            | AppError::JobTimeout { job_id, .. }
            | AppError::NoDownloadUrl { job_id } => Some(*job_id),
            _ => None,
        }
    }

    /// HTTP status observed by the remote call, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::ClientError { status, .. } | AppError::RemoteExhausted { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

// Conversion implementations for common errors
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::NetworkError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::InvalidInput(format!("Invalid URL: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::InvalidInput(format!("Invalid date (expected YYYY-MM-DD): {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;

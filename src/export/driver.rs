use crate::api::{HttpTransport, RequestExecutor, TransportSettings};
use crate::config::{PollPolicy, ResolvedConfig, RetryPolicy};
use crate::constants::{FILE_EXPORTS_DOWNLOAD_PATH, FILE_EXPORTS_LIST_PATH};
use crate::errors::{AppError, AppResult};
use crate::export::adapter::RecordTypeAdapter;
use crate::export::download_url::extract_download_url;
use crate::models::{DownloadHandle, ExportJob, ExportRequest, JobStatus};
use crate::utils::{format_duration, minutes};
use reqwest::Method;
use serde_json::{json, Value};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

/// Drives one export job from submission to a file on disk.
///
/// Holds no job state between calls: every stage receives what it needs as arguments.
pub struct ExportDriver {
    executor: RequestExecutor,
    base_url: String,
    poll: PollPolicy,
}

impl ExportDriver {
    /// `base_url` is the API root, e.g. `https://api.unit21.com/v1`.
    pub fn new(executor: RequestExecutor, base_url: impl Into<String>, poll: PollPolicy) -> Self {
        Self {
            executor,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll,
        }
    }

    /// Builds transport, executor and driver for one export call.
    ///
    /// The API key ends up in the transport owned by the returned driver and is dropped
    /// with it.
    pub fn from_config(config: &ResolvedConfig, api_key: &str) -> AppResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(
            api_key,
            TransportSettings {
                request_timeout: Duration::from_secs(config.request_timeout_secs),
                allow_insecure_http: config.allow_insecure_http,
            },
        )?;
        let executor = RequestExecutor::new(transport, RetryPolicy::from(config));
        Ok(Self::new(
            executor,
            config.base_url()?,
            PollPolicy::from(config),
        ))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Runs the whole lifecycle: submit, await completion, resolve the URL, download.
    ///
    /// Any stage failing aborts the remaining ones; a job is never re-submitted.
    /// Returns the path the archive was saved to.
    pub async fn run(&self, request: ExportRequest) -> AppResult<PathBuf> {
        request.validate()?;
        let started = Instant::now();

        info!(
            record_type = request.record_type.display_name(),
            start = %request.date_range.start(),
            end = %request.date_range.end(),
            destination = %request.destination.display(),
            "Starting export"
        );

        let job = ExportJob::new(self.submit(&request).await?);
        let job = self.await_job(job).await?;
        let handle = self.resolve_download_url(job.id).await?;
        let saved = self.download(handle, &request.destination).await?;

        info!(
            job_id = job.id,
            file_path = %saved.display(),
            elapsed = %format_duration(started.elapsed()),
            "Export completed successfully"
        );
        Ok(saved)
    }

    /// Submits the export and returns the job id issued by the remote service.
    ///
    /// # Errors
    ///
    /// `SubmissionError` when the response carries no integer `id`; otherwise whatever
    /// the executor reports.
    pub async fn submit(&self, request: &ExportRequest) -> AppResult<u64> {
        let adapter = RecordTypeAdapter::for_record_type(request.record_type);
        let url = self.endpoint(adapter.endpoint);
        let body = adapter.build_body(request);

        let response = self.executor.execute(Method::POST, &url, Some(&body)).await?;
        let job_id = response
            .get("id")
            .and_then(parse_id)
            .ok_or_else(|| AppError::SubmissionError {
                url: url.clone(),
                body: response.to_string(),
            })?;

        info!(
            job_id = job_id,
            record_type = request.record_type.display_name(),
            "Export job submitted"
        );
        Ok(job_id)
    }

    /// Polls the file-exports listing until the job is ready, failed, or the wall-clock
    /// timeout runs out.
    ///
    /// For a job submitted outside this driver; the job's `created_at` is the moment
    /// tracking starts. See [`ExportDriver::await_job`].
    pub async fn await_completion(&self, job_id: u64) -> AppResult<ExportJob> {
        self.await_job(ExportJob::new(job_id)).await
    }

    /// Polls until `job` reaches a terminal status, updating only its status.
    ///
    /// A job that is not listed yet counts as pending. Each poll request retries on its
    /// own through the executor before the poll interval sleep applies.
    pub async fn await_job(&self, mut job: ExportJob) -> AppResult<ExportJob> {
        let job_id = job.id;
        let url = self.endpoint(FILE_EXPORTS_LIST_PATH);
        let body = json!({
            "file_export_ids": [job_id],
            "offset": 1,
            "limit": 1,
        });
        let started = Instant::now();
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            let listing = self.executor.execute(Method::POST, &url, Some(&body)).await?;

            match find_status(&listing, job_id) {
                Some(status) => {
                    if status != job.status {
                        info!(
                            job_id = job_id,
                            from = job.status.as_str(),
                            to = status.as_str(),
                            "Export status changed"
                        );
                    }
                    job.status = status;
                }
                None => {
                    debug!(job_id = job_id, polls = polls, "Export not listed yet");
                }
            }

            if job.status.is_terminal() {
                if job.status == JobStatus::Failed {
                    warn!(job_id = job_id, polls = polls, "Export job failed remotely");
                    return Err(AppError::JobFailed { job_id });
                }
                info!(
                    job_id = job_id,
                    polls = polls,
                    elapsed = %format_duration(started.elapsed()),
                    "Export ready for download"
                );
                return Ok(job);
            }

            let elapsed = started.elapsed();
            if elapsed >= self.poll.timeout {
                warn!(
                    job_id = job_id,
                    polls = polls,
                    elapsed = %format_duration(elapsed),
                    "Gave up waiting for export"
                );
                return Err(AppError::JobTimeout {
                    job_id,
                    elapsed_minutes: minutes(elapsed),
                });
            }

            debug!(
                job_id = job_id,
                status = job.status.as_str(),
                interval_ms = self.poll.interval.as_millis() as u64,
                "Waiting before next poll"
            );
            tokio::time::sleep(self.poll.interval).await;
        }
    }

    /// Asks the service for the signed URL of a finished job.
    pub async fn resolve_download_url(&self, job_id: u64) -> AppResult<DownloadHandle> {
        let url = self.endpoint(&format!("{FILE_EXPORTS_DOWNLOAD_PATH}/{job_id}"));
        let response = self.executor.execute(Method::GET, &url, None).await?;

        let raw = extract_download_url(&response).ok_or(AppError::NoDownloadUrl { job_id })?;
        let signed = Url::parse(raw).map_err(|e| {
            warn!(job_id = job_id, error = %e, "Download URL is not a valid URL");
            AppError::NoDownloadUrl { job_id }
        })?;

        debug!(
            job_id = job_id,
            host = signed.host_str().unwrap_or(""),
            "Resolved download URL"
        );
        Ok(DownloadHandle { url: signed })
    }

    /// Streams the export behind `handle` to `destination` and returns the saved path.
    ///
    /// # Errors
    ///
    /// `DownloadError` if the directory cannot be created, the transfer fails, or the
    /// file is missing afterwards.
    pub async fn download(&self, handle: DownloadHandle, destination: &Path) -> AppResult<PathBuf> {
        let download_error = |message: String| AppError::DownloadError {
            path: destination.display().to_string(),
            message,
        };

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    download_error(format!(
                        "failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let tmp_path = part_path(destination);
        // Remove stale tmp file if present (best-effort)
        if tmp_path.exists() {
            if let Err(e) = fs::remove_file(&tmp_path).await {
                warn!(
                    file_path = %tmp_path.display(),
                    error = %e,
                    "Failed to remove stale temp file"
                );
            }
        }

        let DownloadHandle { url } = handle;
        self.executor
            .transport()
            .download(&url, &tmp_path, destination)
            .await?;

        if fs::metadata(destination).await.is_err() {
            return Err(download_error(
                "file not found after download completed".to_string(),
            ));
        }

        Ok(destination.to_path_buf())
    }
}

/// Accepts an id sent either as a JSON integer or as a string of digits.
fn parse_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Status of `job_id` in a file-exports listing, if the job is listed with a known status.
fn find_status(listing: &Value, job_id: u64) -> Option<JobStatus> {
    let entry = listing
        .get("file_exports")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("id").and_then(parse_id) == Some(job_id))?;

    let raw = entry.get("status")?.as_str()?;
    let status = JobStatus::parse(raw);
    if status.is_none() {
        warn!(
            job_id = job_id,
            status = raw,
            "Unrecognised export status, still waiting"
        );
    }
    status
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name: OsString = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

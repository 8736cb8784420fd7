use crate::constants::*;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use url::Url;

/// Kind of record a bulk export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Alert,
    Case,
    Sar,
}

impl RecordType {
    /// Returns a human-readable name for the record type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Alert => "Alerts",
            Self::Case => "Cases",
            Self::Sar => "SARs",
        }
    }

    /// Short lowercase name used in file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Alert => "alerts",
            Self::Case => "cases",
            Self::Sar => "sars",
        }
    }

    /// Default archive path for an export of this type over `range`.
    pub fn default_output_path(&self, range: &DateRange) -> PathBuf {
        Path::new(DEFAULT_OUTPUT_DIR).join(format!(
            "{}_{}_{}.zip",
            self.slug(),
            range.start().format("%Y%m%d"),
            range.end().format("%Y%m%d")
        ))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for RecordType {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        // Trim whitespace and compare case-insensitively
        let lower = value.trim().to_lowercase();

        if ALERT_ALIASES.contains(&lower.as_str()) {
            Ok(Self::Alert)
        } else if CASE_ALIASES.contains(&lower.as_str()) {
            Ok(Self::Case)
        } else if SAR_ALIASES.contains(&lower.as_str()) {
            Ok(Self::Sar)
        } else {
            Err(AppError::InvalidInput(format!(
                "Unknown record type '{value}'. Expected one of: alert, case, sar"
            )))
        }
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::InvalidInput(format!(
                "Start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parses two `YYYY-MM-DD` strings into a range.
    pub fn parse(start: &str, end: &str) -> AppResult<Self> {
        let start = NaiveDate::parse_from_str(start.trim(), DATE_INPUT_FORMAT)?;
        let end = NaiveDate::parse_from_str(end.trim(), DATE_INPUT_FORMAT)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Record-type-specific switches sent along with the export request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportFlags {
    /// Summary instead of detailed alert export. Ignored for other record types.
    pub is_summary: bool,
}

/// A validated request for one bulk export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub record_type: RecordType,
    pub date_range: DateRange,
    pub flags: ExportFlags,
    pub destination: PathBuf,
}

impl ExportRequest {
    pub fn new(
        record_type: RecordType,
        date_range: DateRange,
        flags: ExportFlags,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            record_type,
            date_range,
            flags,
            destination: destination.into(),
        }
    }

    /// Rejects values the remote service or the local file system cannot take.
    pub fn validate(&self) -> AppResult<()> {
        if self.destination.as_os_str().is_empty() {
            return Err(AppError::InvalidInput(
                "Destination path must not be empty".to_string(),
            ));
        }
        if self.destination.to_string_lossy().contains('\0') {
            return Err(AppError::InvalidInput(
                "Destination path must not contain NUL characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Remote status of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Requested,
    Generating,
    ReadyForDownload,
    Failed,
}

impl JobStatus {
    /// Parses the status string reported by the file-exports listing.
    ///
    /// Returns `None` for statuses this client does not know about.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "REQUESTED" => Some(Self::Requested),
            "GENERATING" => Some(Self::Generating),
            "READY_FOR_DOWNLOAD" => Some(Self::ReadyForDownload),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ReadyForDownload | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Generating => "GENERATING",
            Self::ReadyForDownload => "READY_FOR_DOWNLOAD",
            Self::Failed => "FAILED",
        }
    }
}

/// An export job as tracked by the driver for the duration of one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub id: u64,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl ExportJob {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            status: JobStatus::Requested,
            created_at: Utc::now(),
        }
    }
}

/// Signed, time-limited URL for a finished export. Consumed by the download step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadHandle {
    pub url: Url,
}

/// Bookkeeping for one logical remote call and its retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryContext {
    pub attempt: u32,
    pub started_at: Instant,
}

impl RetryContext {
    pub fn start() -> Self {
        Self {
            attempt: 0,
            started_at: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_aliases() {
        assert_eq!("alert".parse::<RecordType>().unwrap(), RecordType::Alert);
        assert_eq!("alerts".parse::<RecordType>().unwrap(), RecordType::Alert);
        assert_eq!("cases".parse::<RecordType>().unwrap(), RecordType::Case);
        assert_eq!("sar".parse::<RecordType>().unwrap(), RecordType::Sar);
    }

    #[test]
    fn test_record_type_case_insensitive() {
        assert_eq!("  SARS ".parse::<RecordType>().unwrap(), RecordType::Sar);
        assert_eq!("Case".parse::<RecordType>().unwrap(), RecordType::Case);
    }

    #[test]
    fn test_record_type_unknown_is_an_error() {
        let err = "entities".parse::<RecordType>().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!("".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_date_range_rejects_reversed_dates() {
        assert!(DateRange::parse("2024-02-01", "2024-01-31").is_err());
    }

    #[test]
    fn test_date_range_accepts_single_day() {
        let range = DateRange::parse("2024-02-29", "2024-02-29").unwrap();
        assert_eq!(range.start(), range.end());
    }

    #[test]
    fn test_date_range_rejects_bad_format() {
        assert!(DateRange::parse("2024/01/01", "2024-01-02").is_err());
        assert!(DateRange::parse("2024-13-01", "2024-12-31").is_err());
    }

    #[test]
    fn test_default_output_path() {
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        let path = RecordType::Sar.default_output_path(&range);
        assert_eq!(path, Path::new("data/exports/sars_20240101_20240131.zip"));
    }

    #[test]
    fn test_job_status_parse() {
        assert_eq!(JobStatus::parse("GENERATING"), Some(JobStatus::Generating));
        assert_eq!(
            JobStatus::parse("ready_for_download"),
            Some(JobStatus::ReadyForDownload)
        );
        assert_eq!(JobStatus::parse("FAILED"), Some(JobStatus::Failed));
        assert_eq!(JobStatus::parse("ARCHIVED"), None);
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Requested.is_terminal());
    }

    #[test]
    fn test_validate_rejects_nul_in_destination() {
        let range = DateRange::parse("2024-01-01", "2024-01-02").unwrap();
        let request = ExportRequest::new(
            RecordType::Case,
            range,
            ExportFlags::default(),
            "out/ca\0ses.zip",
        );
        assert!(request.validate().is_err());
    }
}

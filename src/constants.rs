// API paths, relative to the environment base URL
pub const ALERTS_EXPORT_PATH: &str = "alerts/bulk-export";
pub const CASES_EXPORT_PATH: &str = "cases/bulk-export";
pub const SARS_EXPORT_PATH: &str = "sars/bulk-export";
pub const FILE_EXPORTS_LIST_PATH: &str = "file-exports/list";
pub const FILE_EXPORTS_DOWNLOAD_PATH: &str = "file-exports/download";

// Authentication
pub const API_KEY_HEADER: &str = "u21-key";
pub const API_KEY_ENV_VAR: &str = "U21_API_KEY";

// Request body formatting
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Default output location when none is given
pub const DEFAULT_OUTPUT_DIR: &str = "data/exports";

// Record type aliases
pub const ALERT_ALIASES: &[&str] = &["alert", "alerts"];
pub const CASE_ALIASES: &[&str] = &["case", "cases"];
pub const SAR_ALIASES: &[&str] = &["sar", "sars"];

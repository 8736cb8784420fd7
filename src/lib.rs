//! u21-export library
//!
//! This crate provides the core functionality for the `u21-export` binary.
//! Implementation and tests live in their modules.
//!
//! ## Overview
//!
//! - [`api`] - Single-shot HTTP transport and the retrying request executor
//! - [`export`] - Export job driver, record-type adapters and download URL extraction
//! - [`config`] - Environments, retry/poll policies and TOML job files
//! - [`cli`] - Command-line interface
//! - [`models`] - Record types, date ranges, jobs and download handles
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use u21_export::config::ResolvedConfig;
//! use u21_export::errors::AppResult;
//! use u21_export::export::ExportDriver;
//! use u21_export::models::{DateRange, ExportFlags, ExportRequest, RecordType};
//!
//! # async fn example() -> AppResult<()> {
//! let request = ExportRequest::new(
//!     RecordType::Alert,
//!     DateRange::parse("2024-01-01", "2024-01-31")?,
//!     ExportFlags { is_summary: true },
//!     "out/alerts.zip",
//! );
//! let driver = ExportDriver::from_config(&ResolvedConfig::default(), "my-api-key")?;
//! let saved = driver.run(request).await?;
//! println!("saved to {}", saved.display());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod export;
pub mod models;
pub mod ui;
pub mod utils;

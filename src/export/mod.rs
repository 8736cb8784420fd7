//! Export job orchestration.
//!
//! [`ExportDriver`] walks a job through submit → poll → resolve → download. The
//! per-record-type request shapes live in [`RecordTypeAdapter`], and the download URL
//! is picked from the resolution response by the ordered [`URL_SOURCES`] strategies.

mod adapter;
mod download_url;
mod driver;

// Re-export public API
pub use adapter::{day_bounds, RecordTypeAdapter};
pub use download_url::{extract_download_url, UrlSource, URL_SOURCES};
pub use driver::ExportDriver;

//! HTTP plumbing for the export API.
//!
//! [`HttpTransport`] performs single requests and the streaming download;
//! [`RequestExecutor`] layers the retry and backoff policy on top of it.

mod executor;
mod transport;

// Re-export public API
pub use executor::{calculate_backoff, is_retryable, RequestExecutor, RETRYABLE_STATUSES};
pub use transport::{parse_retry_after, ApiResponse, HttpTransport, TransportSettings};

//! Common test utilities for integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use u21_export::api::{HttpTransport, RequestExecutor, TransportSettings};
use u21_export::config::{PollPolicy, RetryPolicy};
use u21_export::export::ExportDriver;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-key";

/// Retry policy with no waiting between attempts
#[allow(dead_code)]
pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay_secs: 0,
        max_delay_secs: 0,
    }
}

/// Poll policy measured in milliseconds
#[allow(dead_code)]
pub fn fast_poll(interval_ms: u64, timeout_ms: u64) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(interval_ms),
        timeout: Duration::from_millis(timeout_ms),
    }
}

/// Executor talking plain HTTP to a mock server
#[allow(dead_code)]
pub fn test_executor(retry: RetryPolicy) -> RequestExecutor {
    test_executor_with_timeout(retry, Duration::from_secs(5))
}

/// Executor talking plain HTTP with the given per-request timeout
#[allow(dead_code)]
pub fn test_executor_with_timeout(
    retry: RetryPolicy,
    request_timeout: Duration,
) -> RequestExecutor {
    let transport = HttpTransport::new(
        TEST_API_KEY,
        TransportSettings {
            request_timeout,
            allow_insecure_http: true,
        },
    )
    .unwrap();
    RequestExecutor::new(transport, retry)
}

/// API base URL served by `server`
#[allow(dead_code)]
pub fn base_url(server: &MockServer) -> String {
    format!("{}/v1", server.uri())
}

/// Driver pointed at `server` with fast retries and the given poll policy
#[allow(dead_code)]
pub fn test_driver(server: &MockServer, poll: PollPolicy) -> ExportDriver {
    ExportDriver::new(test_executor(fast_retry(3)), base_url(server), poll)
}

/// Responds with each template in turn, repeating the last one once exhausted
#[allow(dead_code)]
pub struct SequenceResponder {
    responses: Vec<ResponseTemplate>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl SequenceResponder {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty());
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.responses.len() - 1);
        self.responses[index].clone()
    }
}

/// Listing body reporting `status` for job `id`
#[allow(dead_code)]
pub fn listing(id: u64, status: &str) -> serde_json::Value {
    serde_json::json!({
        "file_exports": [
            { "id": id, "status": status, "created_at": "2024-01-01 00:00:00" }
        ],
        "response_count": 1
    })
}

/// Sample archive bytes served by the signed URL
#[allow(dead_code)]
pub const SAMPLE_ARCHIVE: &[u8] = b"PK\x03\x04 sample export archive contents";

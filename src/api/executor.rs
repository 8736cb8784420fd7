use crate::api::transport::{ApiResponse, HttpTransport};
use crate::config::RetryPolicy;
use crate::errors::{AppError, AppResult};
use crate::models::RetryContext;
use crate::utils::format_duration;
use rand::Rng;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Statuses worth another attempt: rate limiting and transient server failures.
pub const RETRYABLE_STATUSES: [u16; 3] = [429, 500, 503];

/// Returns `true` for the statuses the executor retries.
pub fn is_retryable(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status.as_u16())
}

/// Calculates the wait before retry number `attempt` (1-based).
///
/// A `Retry-After` value is used verbatim. Otherwise the formula is
/// `base * 2^(attempt-1) + jitter`, truncated to whole seconds. Both paths are clamped
/// to `max_delay_secs`.
pub fn calculate_backoff(
    policy: &RetryPolicy,
    attempt: u32,
    retry_after: Option<u64>,
    jitter_secs: f64,
) -> Duration {
    let secs = match retry_after {
        Some(secs) => secs,
        None => {
            let exponent = attempt.saturating_sub(1).min(32);
            let exponential = policy
                .base_delay_secs
                .saturating_mul(2_u64.saturating_pow(exponent));
            let jitter = jitter_secs.clamp(0.0, policy.base_delay_secs as f64);
            (exponential as f64 + jitter) as u64
        }
    };
    Duration::from_secs(secs.min(policy.max_delay_secs))
}

/// Draws a uniform jitter in `[0, base_delay_secs]`.
fn random_jitter(policy: &RetryPolicy) -> f64 {
    if policy.base_delay_secs == 0 {
        return 0.0;
    }
    rand::thread_rng().gen_range(0.0..=policy.base_delay_secs as f64)
}

/// Sends API requests through [`HttpTransport`], retrying transient failures.
///
/// Each call owns its own [`RetryContext`]; nothing is shared between calls.
pub struct RequestExecutor {
    transport: HttpTransport,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(transport: HttpTransport, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Executes one logical API call and returns its parsed body.
    ///
    /// # Errors
    ///
    /// - `ClientError` on the first non-retryable, non-2xx status
    /// - `RemoteExhausted` once `max_retries` retries of 429/500/503 are spent
    /// - `Timeout` / `NetworkError` when the transport itself fails
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> AppResult<Value> {
        let mut context = RetryContext::start();

        loop {
            context.attempt += 1;
            let response = self.transport.send(method.clone(), url, body).await?;

            if response.status.is_success() {
                if context.attempt > 1 {
                    debug!(
                        method = %method,
                        url = url,
                        attempts = context.attempt,
                        elapsed = %format_duration(context.started_at.elapsed()),
                        "Request succeeded after retry"
                    );
                }
                return Ok(response.json());
            }

            if !is_retryable(response.status) {
                return Err(client_error(&method, url, &response));
            }

            let retries_done = context.attempt - 1;
            if retries_done >= self.policy.max_retries {
                warn!(
                    method = %method,
                    url = url,
                    status = response.status.as_u16(),
                    attempts = context.attempt,
                    "Retry budget exhausted"
                );
                return Err(AppError::RemoteExhausted {
                    status: response.status.as_u16(),
                    method: method.to_string(),
                    url: url.to_string(),
                    attempts: context.attempt,
                });
            }

            let delay = calculate_backoff(
                &self.policy,
                context.attempt,
                response.retry_after,
                random_jitter(&self.policy),
            );
            warn!(
                method = %method,
                url = url,
                status = response.status.as_u16(),
                attempt = context.attempt,
                max_attempts = self.policy.max_retries + 1,
                delay_secs = delay.as_secs(),
                retry_after = ?response.retry_after,
                "Retrying request after transient error"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn client_error(method: &Method, url: &str, response: &ApiResponse) -> AppError {
    let message = response.body.trim();
    AppError::ClientError {
        status: response.status.as_u16(),
        method: method.to_string(),
        url: url.to_string(),
        message: if message.is_empty() {
            response
                .status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string()
        } else {
            message.to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            base_delay_secs: 2,
            max_delay_secs: 45,
        }
    }

    #[test]
    fn test_retryable_statuses() {
        for code in [429, 500, 503] {
            assert!(is_retryable(StatusCode::from_u16(code).unwrap()));
        }
        for code in [400, 401, 403, 404, 409, 422, 501, 502, 504] {
            assert!(!is_retryable(StatusCode::from_u16(code).unwrap()));
        }
    }

    #[test]
    fn test_backoff_is_exponential_without_jitter() {
        let p = policy();
        assert_eq!(calculate_backoff(&p, 1, None, 0.0), Duration::from_secs(2));
        assert_eq!(calculate_backoff(&p, 2, None, 0.0), Duration::from_secs(4));
        assert_eq!(calculate_backoff(&p, 3, None, 0.0), Duration::from_secs(8));
        assert_eq!(calculate_backoff(&p, 4, None, 0.0), Duration::from_secs(16));
    }

    #[test]
    fn test_backoff_jitter_is_truncated() {
        let p = policy();
        assert_eq!(calculate_backoff(&p, 1, None, 1.9), Duration::from_secs(3));
        // jitter never exceeds the base delay
        assert_eq!(calculate_backoff(&p, 1, None, 10.0), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_never_exceeds_cap() {
        let p = policy();
        for attempt in 1..=64 {
            for jitter in [0.0, 1.0, 2.0] {
                let delay = calculate_backoff(&p, attempt, None, jitter);
                assert!(delay <= Duration::from_secs(45));
            }
        }
        assert_eq!(calculate_backoff(&p, 6, None, 2.0), Duration::from_secs(45));
    }

    #[test]
    fn test_retry_after_is_honored_verbatim() {
        let p = policy();
        assert_eq!(calculate_backoff(&p, 1, Some(7), 2.0), Duration::from_secs(7));
        assert_eq!(calculate_backoff(&p, 5, Some(0), 2.0), Duration::from_secs(0));
    }

    #[test]
    fn test_retry_after_is_capped() {
        let p = policy();
        assert_eq!(
            calculate_backoff(&p, 1, Some(3600), 0.0),
            Duration::from_secs(45)
        );
    }

    #[test]
    fn test_random_jitter_stays_in_range() {
        let p = policy();
        for _ in 0..100 {
            let jitter = random_jitter(&p);
            assert!((0.0..=2.0).contains(&jitter));
        }
        let zero = RetryPolicy {
            base_delay_secs: 0,
            ..p
        };
        assert_eq!(random_jitter(&zero), 0.0);
    }
}

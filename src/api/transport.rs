use crate::constants::API_KEY_HEADER;
use crate::errors::{AppError, AppResult};
use crate::ui;
use crate::utils::{mb_from_bytes, round_two_decimals};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

/// Settings for the underlying HTTP client.
#[derive(Debug, Clone, Copy)]
pub struct TransportSettings {
    pub request_timeout: Duration,
    pub allow_insecure_http: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            allow_insecure_http: false,
        }
    }
}

/// Raw outcome of one HTTP exchange, before any retry decision.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Integer seconds from the `Retry-After` header, if present and numeric
    pub retry_after: Option<u64>,
    pub body: String,
}

impl ApiResponse {
    /// Parses the body as JSON.
    ///
    /// An empty body yields `Value::Null`; a body that is not JSON at all is kept as a
    /// bare string, which is how some endpoints return a plain URL.
    pub fn json(&self) -> Value {
        let trimmed = self.body.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
    }
}

/// Single-shot HTTP transport carrying the API credential.
///
/// Holds the key only for as long as the export call that built it.
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: HeaderValue,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Builds a transport enforcing TLS 1.2+ and, unless explicitly allowed, HTTPS only.
    ///
    /// `request_timeout` bounds each API call and every connection attempt. The download
    /// body has no total deadline.
    pub fn new(api_key: &str, settings: TransportSettings) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::InvalidInput("API key must not be empty".into()));
        }
        let mut api_key = HeaderValue::from_str(api_key.trim())
            .map_err(|_| AppError::InvalidInput("API key contains invalid characters".into()))?;
        api_key.set_sensitive(true);

        let client = reqwest::Client::builder()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .https_only(!settings.allow_insecure_http)
            .connect_timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            request_timeout: settings.request_timeout,
        })
    }

    /// Sends one authenticated JSON request. Never retries.
    ///
    /// Any HTTP status is returned as a response; only transport failures are errors.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> AppResult<ApiResponse> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .timeout(self.request_timeout)
            .header(API_KEY_HEADER, self.api_key.clone())
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(&method, url, e))?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&method, url, e))?;

        debug!(
            method = %method,
            url = url,
            status = status.as_u16(),
            "Received response"
        );

        Ok(ApiResponse {
            status,
            retry_after,
            body,
        })
    }

    /// Streams `url` into `file_path` through a temporary `tmp_path`.
    ///
    /// The signed URL is pre-authenticated, so no credential header is attached. The file
    /// only appears at `file_path` once the whole body has been written.
    /// Returns the number of bytes written.
    pub async fn download(&self, url: &Url, tmp_path: &Path, file_path: &Path) -> AppResult<u64> {
        let download_error = |message: String| AppError::DownloadError {
            path: file_path.display().to_string(),
            message,
        };

        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| download_error(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("HTTP {}", status.as_u16())));
        }

        let pb = match response.content_length() {
            Some(total) => ui::create_progress_bar(total)?,
            None => ui::create_spinner()?,
        };
        pb.set_message("Downloading export");

        let mut file = File::create(tmp_path).await.map_err(|e| {
            download_error(format!(
                "failed to create temp file {}: {e}",
                tmp_path.display()
            ))
        })?;

        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| download_error(format!("transfer interrupted: {e}")))?
        {
            file.write_all(&chunk).await.map_err(|e| {
                download_error(format!(
                    "failed to write to temp file {}: {e}",
                    tmp_path.display()
                ))
            })?;
            written += chunk.len() as u64;
            pb.inc(chunk.len() as u64);
        }

        file.flush()
            .await
            .map_err(|e| download_error(format!("failed to flush temp file: {e}")))?;
        // Ensure the file is closed before renaming
        drop(file);

        fs::rename(tmp_path, file_path).await.map_err(|e| {
            download_error(format!(
                "failed to rename temp file {} to {}: {e}",
                tmp_path.display(),
                file_path.display()
            ))
        })?;

        pb.finish_with_message("Download complete");
        info!(
            file_path = %file_path.display(),
            size_mb = round_two_decimals(mb_from_bytes(written)),
            "Export written to disk"
        );

        Ok(written)
    }
}

/// Reads an integer-seconds `Retry-After` header. HTTP-date values are ignored.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}

fn classify_transport_error(method: &Method, url: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout {
            method: method.to_string(),
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        AppError::NetworkError(format!("{method} {url}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> ApiResponse {
        ApiResponse {
            status: StatusCode::OK,
            retry_after: None,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_json_body_is_parsed() {
        let value = response(r#"{"id": 42}"#).json();
        assert_eq!(value["id"], 42);
    }

    #[test]
    fn test_plain_text_body_becomes_string() {
        let value = response("https://signed.example.com/file.zip\n").json();
        assert_eq!(
            value,
            Value::String("https://signed.example.com/file.zip".into())
        );
    }

    #[test]
    fn test_empty_body_is_null() {
        assert_eq!(response("   ").json(), Value::Null);
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(7));
    }

    #[test]
    fn test_parse_retry_after_ignores_dates_and_missing() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let result = HttpTransport::new("  ", TransportSettings::default());
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_api_key_with_newline_is_rejected() {
        let result = HttpTransport::new("abc\ndef", TransportSettings::default());
        assert!(result.is_err());
    }
}

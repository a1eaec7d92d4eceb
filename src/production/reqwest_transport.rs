//! Reqwest-based HTTP transport implementation

use std::error::Error as _;
use std::time::{Duration, Instant};
use reqwest::Client;

use crate::security::{CertificateDecision, CertificateErrorEvent, CertificatePolicy, PolicyViolation};
use crate::traits::{ApiError, ApiRequest, ApiResponse, HttpMethod, HttpTransport};

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(false)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        tracing::debug!("Initialized API transport with {}s timeout", timeout.as_secs());
        Ok(Self { client })
    }

    fn build_request(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
            HttpMethod::Patch => self.client.patch(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder
    }
}

/// Whether a send error came from TLS certificate validation.
fn is_certificate_error(error: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = source {
        if err.to_string().to_ascii_lowercase().contains("certificate") {
            return true;
        }
        source = err.source();
    }
    false
}

fn describe_error_chain(error: &reqwest::Error) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        parts.push(err.to_string());
        source = err.source();
    }
    parts.join(": ")
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "Dispatching API request");

        reqwest::Url::parse(&request.url)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;

        let start = Instant::now();

        let response = self
            .build_request(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!("API timeout: {}", request.url);
                    ApiError::Timeout
                } else if is_certificate_error(&e) {
                    let event = CertificateErrorEvent {
                        url: request.url.clone(),
                        error: describe_error_chain(&e),
                    };
                    match CertificatePolicy::decide(&event) {
                        CertificateDecision::Reject => {
                            PolicyViolation::CertificateRejected {
                                url: event.url.clone(),
                                error: event.error.clone(),
                            }
                            .log();
                            ApiError::CertificateRejected(event.error)
                        }
                    }
                } else {
                    tracing::warn!("Network error: {}", e);
                    ApiError::Network(e.to_string())
                }
            })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let status = response.status().as_u16();

        // Read response body (best effort, don't fail if body read fails)
        let body = match response.text().await {
            Ok(text) if !text.is_empty() => Some(text),
            _ => None,
        };

        tracing::debug!("API response: status={}, duration={}ms", status, duration_ms);

        Ok(ApiResponse {
            status,
            body,
            duration_ms,
        })
    }
}

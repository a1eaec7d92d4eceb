//! HTTP transport trait for backend API calls

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The backend answered 401; the stored token has been purged.
    #[error("Authentication expired")]
    AuthenticationExpired,
    #[error("HTTP error: {status}")]
    Http { status: u16, body: Option<String> },
    #[error("Timeout")]
    Timeout,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Certificate rejected: {0}")]
    CertificateRejected(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Secret bridge error: {0}")]
    Bridge(String),
}

impl ApiError {
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, ApiError::AuthenticationExpired)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthenticationExpired => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A fully resolved outbound request
#[derive(Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(HttpMethod::Post, url);
        request.body = Some(body);
        request
    }

    /// Set a header, replacing any previous value with the same (case-insensitive) name
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The bearer credential attached to this request, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.header("Authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Header values may carry the bearer token
        let header_names: Vec<&str> = self.headers.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<String>,
    pub duration_ms: u64,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body = self.body.as_deref().unwrap_or("null");
        serde_json::from_str(body).map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

/// Trait for dispatching HTTP requests to the backend
///
/// Production: reqwest HTTP client
/// Testing: Recorded responses
///
/// Any HTTP status is a successful dispatch; interpreting 401 and other
/// error statuses is the API client's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_json_content_type() {
        let request = ApiRequest::get("http://localhost:8000/health");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.bearer_token(), None);
    }

    #[test]
    fn test_with_bearer_replaces_existing_authorization() {
        let request = ApiRequest::get("http://localhost:8000/auth/me")
            .with_header("authorization", "Basic abc")
            .with_bearer("abc123");

        assert_eq!(request.bearer_token(), Some("abc123"));
        let auth_headers = request
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("authorization"))
            .count();
        assert_eq!(auth_headers, 1);
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let request = ApiRequest::get("http://localhost:8000/").with_bearer("super-secret");
        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("Authorization"));
    }

    #[test]
    fn test_response_json() {
        let response = ApiResponse {
            status: 200,
            body: Some(r#"{"status":"healthy"}"#.to_string()),
            duration_ms: 3,
        };
        assert!(response.is_success());
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["status"], "healthy");

        let broken = ApiResponse { status: 200, body: Some("{".to_string()), duration_ms: 1 };
        assert!(matches!(broken.json::<serde_json::Value>(), Err(ApiError::Serialization(_))));
    }

    #[test]
    fn test_error_status() {
        assert_eq!(ApiError::AuthenticationExpired.status(), Some(401));
        assert_eq!(ApiError::Http { status: 503, body: None }.status(), Some(503));
        assert_eq!(ApiError::Timeout.status(), None);
        assert!(ApiError::AuthenticationExpired.is_authentication_failure());
        assert!(!ApiError::Timeout.is_authentication_failure());
    }
}

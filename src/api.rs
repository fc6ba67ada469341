//! DramaBox catalog API client

use std::time::Duration;

use log::{debug, error};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::{AppConfig, ConfigError};

/// Failure of a single upstream call. Calls are never retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to fetch {endpoint} ({status})")]
    Http { status: u16, endpoint: String },
    #[error("Request timeout for {endpoint}")]
    Timeout { endpoint: String },
    #[error("Network error fetching {endpoint}: {cause}")]
    Network { endpoint: String, cause: String },
    #[error("Invalid JSON from {endpoint}: {cause}")]
    Decode { endpoint: String, cause: String },
    #[error("Cannot build request URL for {endpoint}: {source}")]
    Url {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

impl ApiError {
    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::Http { endpoint, .. }
            | ApiError::Timeout { endpoint }
            | ApiError::Network { endpoint, .. }
            | ApiError::Decode { endpoint, .. }
            | ApiError::Url { endpoint, .. } => endpoint,
        }
    }
}

/// Per-call caching hints, forwarded to the transport as request headers.
/// The client itself keeps no cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheHint {
    pub revalidate: Option<Duration>,
    pub tags: Vec<String>,
}

impl CacheHint {
    pub fn revalidate(secs: u64) -> Self {
        Self {
            revalidate: Some(Duration::from_secs(secs)),
            tags: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if let Some(max_age) = self.revalidate {
            headers.push(("Cache-Control", format!("max-age={}", max_age.as_secs())));
        }
        if !self.tags.is_empty() {
            headers.push(("Cache-Tag", self.tags.join(",")));
        }
        headers
    }
}

/// Anything that can answer a catalog call with a JSON document.
/// Implementations must be shareable across the threads of a page load.
pub trait CatalogSource: Send + Sync {
    fn call(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        hint: Option<&CacheHint>,
    ) -> Result<Value, ApiError>;
}

pub struct ApiClient {
    base_url: Url,
    agent: ureq::Agent,
    timeout: Duration,
    user_agent: String,
}

impl ApiClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self {
            base_url,
            agent: build_agent(Self::DEFAULT_TIMEOUT),
            timeout: Self::DEFAULT_TIMEOUT,
            user_agent: format!("DracinPlayer/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let base_url = config.base_url()?;
        Ok(Self::new(base_url.as_str())?
            .with_timeout(config.request_timeout())
            .with_user_agent(&config.user_agent))
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Hard deadline for the whole call: connect, response and body
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.agent = build_agent(timeout);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// base origin + endpoint + query parameters
    pub fn request_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), endpoint);
        let mut url = Url::parse(&joined).map_err(|source| ApiError::Url {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }

    fn fetch(&self, endpoint: &str, url: &Url, hint: Option<&CacheHint>) -> Result<Value, ApiError> {
        let mut request = self
            .agent
            .get(url.as_str())
            .header("Accept", "application/json")
            .header("User-Agent", self.user_agent.as_str());

        if let Some(hint) = hint {
            for (name, value) in hint.headers() {
                request = request.header(name, value.as_str());
            }
        }

        let mut response = request.call().map_err(|e| classify(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            error!(
                "API Error {}: {} for {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                endpoint
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| classify(endpoint, e))?;

        serde_json::from_str(&body).map_err(|e| {
            error!("Invalid JSON from {}: {}", endpoint, e);
            ApiError::Decode {
                endpoint: endpoint.to_string(),
                cause: e.to_string(),
            }
        })
    }
}

impl CatalogSource for ApiClient {
    fn call(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        hint: Option<&CacheHint>,
    ) -> Result<Value, ApiError> {
        let url = self.request_url(endpoint, params)?;
        debug!("GET {}", url);
        self.fetch(endpoint, &url, hint)
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .new_agent()
}

/// Map a transport failure onto the timeout / network split, logging it
fn classify(endpoint: &str, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Timeout(_) => {
            error!("Timeout fetching {}", endpoint);
            ApiError::Timeout {
                endpoint: endpoint.to_string(),
            }
        }
        ureq::Error::Io(ref io) if io.kind() == std::io::ErrorKind::TimedOut => {
            error!("Timeout fetching {}", endpoint);
            ApiError::Timeout {
                endpoint: endpoint.to_string(),
            }
        }
        ureq::Error::StatusCode(status) => {
            error!("API Error {} for {}", status, endpoint);
            ApiError::Http {
                status,
                endpoint: endpoint.to_string(),
            }
        }
        other => {
            error!("Network error fetching {}: {}", endpoint, other);
            ApiError::Network {
                endpoint: endpoint.to_string(),
                cause: other.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_response, serve_once, unused_base_url};
    use std::time::Instant;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base).unwrap()
    }

    #[test]
    fn test_request_url_joins_base_and_encodes_query() {
        let client = client("https://api.example.com/");
        let url = client
            .request_url("/dramabox/search", &[("query", "love & revenge")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/dramabox/search?query=love+%26+revenge"
        );

        let bare = client.request_url("/dramabox/vip", &[]).unwrap();
        assert_eq!(bare.as_str(), "https://api.example.com/dramabox/vip");
    }

    #[test]
    fn test_request_url_keeps_base_path() {
        let client = client("https://example.com/api");
        let url = client.request_url("/dramabox/detail", &[("bookId", "42")]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/dramabox/detail?bookId=42");
    }

    #[test]
    fn test_call_returns_json_and_sends_headers() {
        let (base, requests) = serve_once(http_response("200 OK", r#"{"ok": true}"#), Duration::ZERO);
        let hint = CacheHint::revalidate(3600).tag("detail-42");

        let value = client(&base)
            .call("/dramabox/detail", &[("bookId", "42")], Some(&hint))
            .unwrap();
        assert_eq!(value["ok"], true);

        let request = requests.recv().unwrap().to_lowercase();
        assert!(request.starts_with("get /dramabox/detail?bookid=42 http/1.1"));
        assert!(request.contains("accept: application/json"));
        assert!(request.contains("cache-control: max-age=3600"));
        assert!(request.contains("cache-tag: detail-42"));
    }

    #[test]
    fn test_non_success_status_is_http_error() {
        let (base, _requests) = serve_once(http_response("404 Not Found", "{}"), Duration::ZERO);

        let err = client(&base).call("/dramabox/latest", &[], None).unwrap_err();
        match err {
            ApiError::Http { status, endpoint } => {
                assert_eq!(status, 404);
                assert_eq!(endpoint, "/dramabox/latest");
            }
            other => panic!("expected Http, got {:?}", other),
        }
    }

    #[test]
    fn test_slow_response_times_out() {
        let (base, _requests) = serve_once(http_response("200 OK", "[]"), Duration::from_millis(1500));
        let client = client(&base).with_timeout(Duration::from_millis(200));

        let started = Instant::now();
        let err = client.call("/dramabox/trending", &[], None).unwrap_err();
        assert!(matches!(err, ApiError::Timeout { ref endpoint } if endpoint == "/dramabox/trending"));
        assert!(started.elapsed() < Duration::from_millis(1400));
    }

    #[test]
    fn test_default_timeout_is_fifteen_seconds() {
        assert_eq!(client("https://api.example.com").timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_refused_connection_is_network_error() {
        let err = client(&unused_base_url()).call("/dramabox/foryou", &[], None).unwrap_err();
        assert!(matches!(err, ApiError::Network { .. }), "got {:?}", err);
        assert_eq!(err.endpoint(), "/dramabox/foryou");
    }

    #[test]
    fn test_invalid_body_is_decode_error() {
        let (base, _requests) = serve_once(http_response("200 OK", "<html>oops</html>"), Duration::ZERO);
        let err = client(&base).call("/dramabox/vip", &[], None).unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn test_cache_hint_headers() {
        assert!(CacheHint::default().headers().is_empty());
        let hint = CacheHint::revalidate(60).tag("a").tag("b");
        assert_eq!(
            hint.headers(),
            vec![
                ("Cache-Control", "max-age=60".to_string()),
                ("Cache-Tag", "a,b".to_string())
            ]
        );
    }
}

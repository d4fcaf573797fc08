//! HTTP boundary: request description, observed outcome and transport
//!
//! The transport never turns an HTTP status into an error. A missing
//! response (connect failure, client-side timeout) is reported as status 0
//! so the retry layer can classify it like any other transient outcome.

use crate::error::{LoadError, LoadResult};
use crate::logging::log_debug;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Status reported when no HTTP response was obtained
pub const NO_RESPONSE: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Headers, cookies and timeout attached to a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    /// `None` lets the caller apply its policy default
    pub timeout: Option<Duration>,
}

impl RequestParams {
    /// Params carrying a bearer token
    pub fn bearer(token: &str) -> Self {
        let mut params = Self::default();
        params
            .headers
            .insert(AUTHORIZATION.as_str().to_string(), format!("Bearer {token}"));
        params
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One HTTP request as a test driver describes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<String>,
    pub params: RequestParams,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            params: RequestParams::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url).with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }
}

/// Result of one HTTP attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub status: u16,
    pub body: String,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub timing: Duration,
}

#[derive(Deserialize)]
struct NextField {
    #[serde(default)]
    next: Option<String>,
}

impl RequestOutcome {
    /// Outcome for an attempt that produced no response
    pub fn no_response(body: impl Into<String>, timing: Duration) -> Self {
        Self {
            status: NO_RESPONSE,
            body: body.into(),
            headers: BTreeMap::new(),
            timing,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Continuation link of a successful list response.
    ///
    /// `None` for non-2xx outcomes, bodies that are not JSON objects, and a
    /// missing or null `next` field.
    pub fn next_link(&self) -> Option<String> {
        if !self.is_success() {
            return None;
        }
        serde_json::from_str::<NextField>(&self.body)
            .ok()
            .and_then(|field| field.next)
    }
}

/// Sends a single request attempt
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one attempt.
    ///
    /// Returns `Ok` for every obtained response and for a missing response
    /// (status 0). `Err` is reserved for requests that cannot be built.
    async fn send(&self, request: &RequestSpec) -> LoadResult<RequestOutcome>;
}

/// Production transport over `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> LoadResult<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            LoadError::transport_failed("Failed to build HTTP client", Some(Box::new(e)))
        })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_headers(params: &RequestParams, url: &str) -> LoadResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &params.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| LoadError::invalid_target(url, format!("header '{name}': {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| LoadError::invalid_target(url, format!("header '{name}': {e}")))?;
            headers.insert(header_name, header_value);
        }

        if !params.cookies.is_empty() {
            let cookie_line = params
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            let value = HeaderValue::from_str(&cookie_line)
                .map_err(|e| LoadError::invalid_target(url, format!("cookie header: {e}")))?;
            headers.insert(COOKIE, value);
        }

        Ok(headers)
    }

    fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &RequestSpec) -> LoadResult<RequestOutcome> {
        let url = Url::parse(&request.url)
            .map_err(|e| LoadError::invalid_target(&request.url, e.to_string()))?;
        let headers = Self::build_headers(&request.params, &request.url)?;

        let mut builder = self
            .client
            .request(request.method.as_reqwest(), url)
            .headers(headers);
        if let Some(timeout) = request.params.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return Err(LoadError::invalid_target(&request.url, e.to_string()));
            }
            Err(e) => {
                log_debug!(
                    method = %request.method,
                    url = %request.url,
                    timeout = e.is_timeout(),
                    error = %e,
                    "No response obtained"
                );
                return Ok(RequestOutcome::no_response(e.to_string(), started.elapsed()));
            }
        };

        let status = response.status().as_u16();
        let headers = Self::collect_headers(response.headers());
        let body = match response.text().await {
            Ok(body) => body,
            // Body cut off mid-stream counts as no response
            Err(e) => return Ok(RequestOutcome::no_response(e.to_string(), started.elapsed())),
        };

        Ok(RequestOutcome {
            status,
            body,
            headers,
            timing: started.elapsed(),
        })
    }
}

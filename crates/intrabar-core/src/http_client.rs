use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const AUTHORIZATION: &str = "authorization";

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// GET request handed to an [`HttpClient`].
///
/// Header names are stored lowercase. The bearer token never shows up in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(name.into(), value.to_string());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header(AUTHORIZATION, format!("Bearer {token}"))
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl Debug for HttpRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if name == AUTHORIZATION {
                    "<redacted>"
                } else {
                    value.as_str()
                };
                (name.as_str(), shown)
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &headers)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.status, 200..=299)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Timeout,
    Connect,
    Other,
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Timeout, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Connect, message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn timed_out(&self) -> bool {
        matches!(self.kind, HttpErrorKind::Timeout)
    }
}

/// Async transport used by the history fetcher.
pub trait HttpClient: Send + Sync {
    fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// Offline transport: every request gets an empty candle list.
#[derive(Debug, Default)]
pub struct NoopHttpClient;

impl HttpClient for NoopHttpClient {
    fn execute(&self, _request: HttpRequest) -> HttpFuture<'_> {
        Box::pin(async { Ok(HttpResponse::ok(r#"{"candles":[],"empty":true}"#)) })
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("intrabar/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let builder = request.headers.iter().fold(
            self.client
                .get(&request.url)
                .query(&request.query)
                .timeout(Duration::from_millis(request.timeout_ms)),
            |builder, (name, value)| builder.header(name, value),
        );

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|error| {
            HttpError::new(
                HttpErrorKind::Other,
                format!("failed to read response body: {error}"),
            )
        })?;
        Ok(HttpResponse::with_status(status, body))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
        Box::pin(self.send(request))
    }
}

fn classify(error: reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::timeout(format!("request timeout: {error}"))
    } else if error.is_connect() {
        HttpError::connect(format!("connection failed: {error}"))
    } else {
        HttpError::new(HttpErrorKind::Other, format!("request failed: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_sent_but_not_printed() {
        let request = HttpRequest::get("https://provider.test/pricehistory").with_bearer("tok-123");

        assert_eq!(request.header("Authorization"), Some("Bearer tok-123"));
        assert!(!format!("{request:?}").contains("tok-123"));
    }

    #[test]
    fn query_values_are_stringified() {
        let request = HttpRequest::get("https://provider.test/pricehistory")
            .with_header("Accept", "application/json")
            .with_query("period", 10)
            .with_query("needPreviousClose", false);

        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.query_param("period"), Some("10"));
        assert_eq!(request.query_param("needPreviousClose"), Some("false"));
    }

    #[test]
    fn only_2xx_is_success() {
        assert!(HttpResponse::ok("").is_success());
        assert!(HttpResponse::with_status(204, "").is_success());
        assert!(!HttpResponse::with_status(302, "").is_success());
        assert!(!HttpResponse::with_status(401, "").is_success());
    }

    #[test]
    fn timeout_kind_is_distinguished() {
        assert!(HttpError::timeout("slow").timed_out());
        assert!(!HttpError::connect("refused").timed_out());
        assert_eq!(HttpError::connect("refused").to_string(), "refused");
    }

    #[tokio::test]
    async fn noop_client_returns_empty_history() {
        let response = NoopHttpClient
            .execute(HttpRequest::get("https://provider.test"))
            .await
            .expect("noop never fails");
        assert!(response.is_success());
        assert!(response.body.contains("candles"));
    }
}

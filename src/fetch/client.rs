use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use thiserror::Error;

/// Raw page as returned by the server, whatever the status.
#[derive(Clone, Debug, PartialEq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    /// The URL could not be turned into a request; retrying will not help.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("connection error: {0}")]
    Connect(String),
    #[error("read body: {0}")]
    Body(String),
    #[error("build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() || err.is_request() {
            FetchError::Connect(err.to_string())
        } else {
            FetchError::Body(err.to_string())
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &str, user_agent: &str) -> Result<PageResponse, FetchError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"));
        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str, user_agent: &str) -> Result<PageResponse, FetchError> {
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(FetchError::from_reqwest)?;
        Ok(PageResponse { status, body })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_status_and_body_with_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item"))
            .and(header("user-agent", "agent-a"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let resp = fetcher.get(&format!("{}/item", server.uri()), "agent-a").await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn error_status_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let resp = fetcher.get(&server.uri(), "agent-a").await.unwrap();
        assert_eq!(resp.status, 429);
    }

    #[tokio::test]
    async fn malformed_url_is_invalid_not_transient() {
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.get("not a url", "agent-a").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)), "got {err}");
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_millis(100)).unwrap();
        let err = fetcher.get(&server.uri(), "agent-a").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout), "got {err}");
    }
}

use std::fmt;
use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Proxy;

use crate::error::FetchError;

/// A GET request: target URL plus extra headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl HttpRequest {
    pub fn get(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status line and a streaming body.
pub struct HttpResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn new(status: u16, content_length: Option<u64>, body: Box<dyn Read + Send>) -> Self {
        Self {
            status,
            content_length,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Drains the body as (lossy) UTF-8.
    pub fn text(mut self, url: &str) -> Result<String, FetchError> {
        let mut buf = Vec::new();
        self.body
            .read_to_end(&mut buf)
            .map_err(|e| FetchError::Transport {
                url: url.to_owned(),
                source: Box::new(e),
            })?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Issues blocking GET requests. The seam between the fetch pipeline and the
/// network.
pub trait Transport: Send + Sync {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Client-level settings for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub proxy: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            proxy: None,
        }
    }
}

/// [`Transport`] backed by a blocking reqwest client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("relfetch/", env!("CARGO_PKG_VERSION")));
        if let Some(proxy_url) = &config.proxy {
            builder = builder.proxy(Proxy::all(proxy_url).map_err(FetchError::Client)?);
        }
        let client = builder.build().map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let resp = builder.send().map_err(|e| FetchError::Transport {
            url: request.url.clone(),
            source: Box::new(e),
        })?;

        Ok(HttpResponse::new(
            resp.status().as_u16(),
            resp.content_length(),
            Box::new(resp),
        ))
    }
}

use crate::document::Document;
use crate::error::{Result, VastError};
use crate::resolver::{self, RedirectBudget};
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::{Duration, Instant};

/// Default timeout applied to every HTTP request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Capability to load the text of a VAST document from a URI
///
/// Failures are surfaced as they are; callers never retry or reinterpret them.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<String>;
}

/// Options for [`fetch_document`]
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Extra request headers, sent with every request including wrapper targets
    pub headers: Vec<(String, String)>,
    /// Follow wrapper ads after the first document is loaded
    pub resolve_wrappers: bool,
    pub max_redirects: RedirectBudget,
}

/// Fetches documents over HTTP(S), or from disk for `file://` URIs
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

/// Builder for [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcherBuilder {
    headers: Vec<(String, String)>,
    timeout: Duration,
}

impl Default for HttpFetcherBuilder {
    fn default() -> Self {
        HttpFetcherBuilder {
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpFetcherBuilder {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.headers.extend(headers);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpFetcher> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                VastError::InvalidArgument(format!("invalid header name `{}`: {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                VastError::InvalidArgument(format!("invalid value for header `{}`: {}", name, e))
            })?;
            headers.append(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(VastError::transport)?;

        Ok(HttpFetcher { client })
    }
}

impl HttpFetcher {
    /// A fetcher with no extra headers and the default timeout
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::default()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<String> {
        if let Some(path) = uri.strip_prefix("file://") {
            log::debug!("Reading VAST from file: {}", path);
            return Ok(tokio::fs::read_to_string(path).await?);
        }

        // Short id to tie together the log lines of one request
        let req_id: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();

        let url = url::Url::parse(uri)?;
        log::debug!("[{}] Fetching VAST from {}", req_id, url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                log::warn!("[{}] Request failed after {:?}: {}", req_id, start_time.elapsed(), e);
                VastError::transport(e)
            })?;

        log::debug!("[{}] Received {} in {:?}", req_id, response.status(), start_time.elapsed());

        let text = response.text().await.map_err(VastError::transport)?;
        log::debug!("[{}] Request completed in {:?}", req_id, start_time.elapsed());

        Ok(text)
    }
}

/// Fetch a VAST document over HTTP, resolving its wrappers if asked to
pub async fn fetch_document(uri: &str, options: &FetchOptions) -> Result<Document> {
    let fetcher = HttpFetcher::builder()
        .headers(options.headers.iter().cloned())
        .build()?;

    fetch_document_with(&fetcher, uri, options).await
}

/// Like [`fetch_document`], loading every document through `fetcher`
pub async fn fetch_document_with<F>(fetcher: &F, uri: &str, options: &FetchOptions) -> Result<Document>
where
    F: Fetch + ?Sized,
{
    let xml = fetcher.fetch(uri).await?;
    let document = Document::from_xml(&xml)?;

    if options.resolve_wrappers {
        resolver::resolve(&document, fetcher, options.max_redirects).await
    } else {
        Ok(document)
    }
}

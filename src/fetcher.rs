use crate::{BrochureError, Page, PageTextExtractor};
use reqwest::{header::HeaderMap, Client};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Realistic desktop browser string; some sites refuse script user agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do with a response whose status is not 2xx.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Fail with [`BrochureError::HttpStatus`].
    #[default]
    Reject,
    /// Hand the body to the extractor anyway.
    Accept,
}

/// Downloads pages with a browser-like user agent.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    status_policy: StatusPolicy,
    extractor: PageTextExtractor,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        debug!("Fetcher initialized with default configuration");
        Self::new_with_config(FetcherConfig::default())
    }

    /// Creates a Fetcher with custom configuration.
    ///
    /// Falls back to a plain client if the builder rejects the configuration.
    pub fn new_with_config(config: FetcherConfig) -> Self {
        let mut client_builder = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout);

        if let Some(headers) = config.headers {
            client_builder = client_builder.default_headers(headers);
        }

        if let Some(redirect_policy) = config.redirect_policy {
            client_builder = client_builder.redirect(redirect_policy);
        }

        let client = client_builder.build().unwrap_or_else(|e| {
            error!(error = %e, "Failed to create HTTP client with custom config");
            Client::new()
        });

        Self {
            client,
            status_policy: config.status_policy,
            extractor: PageTextExtractor::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            status_policy: StatusPolicy::default(),
            extractor: PageTextExtractor::new(),
        }
    }

    /// GET `url` and return the body as text.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String, BrochureError> {
        debug!(url = %url, "Starting fetch request");

        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to send request");
            BrochureError::transport(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            match self.status_policy {
                StatusPolicy::Reject => {
                    warn!(url = %url, status = %status, "Rejecting non-success response");
                    return Err(BrochureError::HttpStatus {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                StatusPolicy::Accept => {
                    warn!(url = %url, status = %status, "Using body of non-success response");
                }
            }
        }

        let content = response.text().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to read response body");
            BrochureError::transport(url, e)
        })?;

        debug!(url = %url, content_length = content.len(), "Successfully fetched webpage");
        Ok(content)
    }

    /// Fetch and extract in one step.
    pub async fn fetch_page(&self, url: &str) -> Result<Page, BrochureError> {
        let html = self.fetch(url).await?;
        Ok(self.extractor.extract(&html, url))
    }
}

/// Fetcher configuration.
///
/// # Examples
/// ```
/// use site_brochure::{Fetcher, FetcherConfig, StatusPolicy};
/// use std::time::Duration;
///
/// let fetcher = Fetcher::new_with_config(FetcherConfig {
///     timeout: Duration::from_secs(10),
///     status_policy: StatusPolicy::Accept,
///     ..Default::default()
/// });
/// ```
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub headers: Option<HeaderMap>,
    pub redirect_policy: Option<reqwest::redirect::Policy>,
    pub status_policy: StatusPolicy,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_FETCH_TIMEOUT,
            headers: None,
            redirect_policy: None,
            status_policy: StatusPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>Home</title>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = Fetcher::new().fetch(&server.uri()).await.unwrap();
        assert_eq!(body, "<title>Home</title>");

        let requests = server.received_requests().await.unwrap();
        let user_agent = requests[0].headers.get("user-agent").unwrap();
        assert_eq!(user_agent.to_str().unwrap(), DEFAULT_USER_AGENT);
    }

    #[tokio::test]
    async fn test_error_status_rejected_by_default() {
        let server = MockServer::start().await;

        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<title>Not here</title>"))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        match Fetcher::new().fetch(&url).await {
            Err(BrochureError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_status_accepted_when_configured() {
        let server = MockServer::start().await;

        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<title>Not here</title>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new_with_config(FetcherConfig {
            status_policy: StatusPolicy::Accept,
            ..Default::default()
        });
        let page = fetcher
            .fetch_page(&format!("{}/missing", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.title, "Not here");
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        match Fetcher::new().fetch(&url).await {
            Err(BrochureError::Transport { url: failed, .. }) => assert_eq!(failed, url),
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }
}

//! HTML fetching: direct requests with browser user agents, or through a
//! ScrapingBee-style rendering proxy.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tikpulse_core::AppConfig;

use crate::error::FetchError;
use crate::rate_limit::retry_with_backoff;
use crate::user_agents::random_user_agent;

/// Bodies shorter than this are consent walls, redirects or error stubs.
pub const MIN_HTML_BYTES: usize = 1000;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Rendering-proxy settings. Only built when an API key is configured.
#[derive(Clone)]
pub struct ProxyConfig {
    pub api_key: String,
    pub base_url: String,
    pub country_code: String,
    pub premium: bool,
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("country_code", &self.country_code)
            .field("premium", &self.premium)
            .finish()
    }
}

/// How a page should be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Direct,
    Proxy,
    /// Direct first; the proxy is used only if the direct fetch fails.
    DirectThenProxy,
}

/// Which path actually produced the HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMethod {
    Direct,
    Proxy,
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    pub method: FetchMethod,
}

/// HTTP client for public TikTok pages.
///
/// Transient failures (429, network errors, 5xx) are retried with exponential
/// backoff up to `max_retries` additional attempts.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
    proxy: Option<ProxyConfig>,
}

impl PageFetcher {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
        proxy: Option<ProxyConfig>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
            proxy,
        })
    }

    /// Build from application config. The proxy is enabled only when a key
    /// is present.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let proxy = config.proxy_api_key.as_ref().map(|key| ProxyConfig {
            api_key: key.clone(),
            base_url: config.proxy_base_url.clone(),
            country_code: config.proxy_country_code.clone(),
            premium: true,
        });
        Self::new(
            config.scrape_timeout_secs,
            config.scrape_max_retries,
            config.scrape_backoff_base_secs,
            proxy,
        )
    }

    #[must_use]
    pub fn has_proxy(&self) -> bool {
        self.proxy.is_some()
    }

    /// GET `url` with a randomly chosen desktop browser user agent.
    ///
    /// # Errors
    ///
    /// - [`FetchError::RateLimited`] on 429 after all retries.
    /// - [`FetchError::NotFound`] on 404 (not retried).
    /// - [`FetchError::UnexpectedStatus`] on other non-2xx (5xx retried).
    /// - [`FetchError::InsufficientHtml`] when the body is under
    ///   [`MIN_HTML_BYTES`].
    /// - [`FetchError::Http`] on transport failure after all retries.
    pub async fn fetch_direct(&self, url: &str) -> Result<String, FetchError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let user_agent = random_user_agent();
            tracing::debug!(url, user_agent, "direct fetch");
            let response = self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, user_agent)
                .header(reqwest::header::ACCEPT, ACCEPT_HTML)
                .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
                .send()
                .await?;
            read_html(url, response).await
        })
        .await
    }

    /// GET `url` through the rendering proxy.
    ///
    /// # Errors
    ///
    /// [`FetchError::ProxyNotConfigured`] without an API key; otherwise the
    /// same errors as [`PageFetcher::fetch_direct`], reported against the
    /// target `url`.
    pub async fn fetch_via_proxy(&self, url: &str, render_js: bool) -> Result<String, FetchError> {
        let proxy = self.proxy.as_ref().ok_or(FetchError::ProxyNotConfigured)?;
        let endpoint = proxy_request_url(proxy, url, render_js)?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let endpoint = endpoint.clone();
            async move {
                tracing::debug!(url, render_js, "proxy fetch");
                let response = self
                    .client
                    .get(endpoint)
                    .send()
                    .await
                    .map_err(|e| FetchError::Http(e.without_url()))?;
                read_html(url, response).await.map_err(strip_proxy_url)
            }
        })
        .await
    }

    /// Fetch according to `mode`, reporting which path succeeded.
    ///
    /// # Errors
    ///
    /// For [`FetchMode::DirectThenProxy`], the direct error is returned when
    /// no proxy is configured, and the proxy error when both fail.
    pub async fn fetch(&self, url: &str, mode: FetchMode) -> Result<FetchedPage, FetchError> {
        match mode {
            FetchMode::Direct => Ok(FetchedPage {
                html: self.fetch_direct(url).await?,
                method: FetchMethod::Direct,
            }),
            FetchMode::Proxy => Ok(FetchedPage {
                html: self.fetch_via_proxy(url, false).await?,
                method: FetchMethod::Proxy,
            }),
            FetchMode::DirectThenProxy => match self.fetch_direct(url).await {
                Ok(html) => Ok(FetchedPage {
                    html,
                    method: FetchMethod::Direct,
                }),
                Err(direct_err) if self.has_proxy() => {
                    tracing::warn!(url, error = %direct_err, "direct fetch failed, trying proxy");
                    Ok(FetchedPage {
                        html: self.fetch_via_proxy(url, false).await?,
                        method: FetchMethod::Proxy,
                    })
                }
                Err(direct_err) => Err(direct_err),
            },
        }
    }
}

/// Build the proxy request URL with its query parameters.
fn proxy_request_url(
    proxy: &ProxyConfig,
    target: &str,
    render_js: bool,
) -> Result<reqwest::Url, FetchError> {
    let mut endpoint =
        reqwest::Url::parse(&proxy.base_url).map_err(|e| FetchError::InvalidUrl {
            url: proxy.base_url.clone(),
            reason: e.to_string(),
        })?;
    endpoint
        .query_pairs_mut()
        .append_pair("api_key", &proxy.api_key)
        .append_pair("url", target)
        .append_pair("render_js", bool_param(render_js))
        .append_pair("block_resources", "true")
        .append_pair("premium_proxy", bool_param(proxy.premium))
        .append_pair("country_code", &proxy.country_code);
    Ok(endpoint)
}

/// Transport errors carry the request URL, which for the proxy includes the
/// API key.
fn strip_proxy_url(error: FetchError) -> FetchError {
    match error {
        FetchError::Http(e) => FetchError::Http(e.without_url()),
        other => other,
    }
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

async fn read_html(url: &str, response: reqwest::Response) -> Result<String, FetchError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(FetchError::RateLimited {
            url: url.to_owned(),
            retry_after_secs,
        });
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound {
            url: url.to_owned(),
        });
    }
    if !status.is_success() {
        return Err(FetchError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    let html = response.text().await?;
    if html.len() < MIN_HTML_BYTES {
        return Err(FetchError::InsufficientHtml {
            url: url.to_owned(),
            len: html.len(),
        });
    }
    Ok(html)
}

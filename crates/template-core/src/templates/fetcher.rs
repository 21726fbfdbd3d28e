//! HTTP access to provider listing and raw-file endpoints
//!
//! One [`RemoteFetcher`] wraps a single `reqwest::Client` shared by every
//! listing and download of a run. Provider specifics (URLs, auth scheme,
//! payload shape) come from the [`ProviderAdapter`] of the source.

use crate::error::{Result, TemplateError};
use crate::providers::{ProviderAdapter, RemoteListingItem, TemplateSourceConfig};
use reqwest::header::AUTHORIZATION;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Per-request deadline
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent; GitHub rejects requests without one
pub const USER_AGENT: &str = "template-cli";

/// Upper bound on followed listing pages, guards against a provider looping
const MAX_PAGES: usize = 100;

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: REQUEST_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Fetches listings and files from source-hosting providers
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
}

impl RemoteFetcher {
    /// Build the shared client; an unusable setting (e.g. a malformed user agent) is an error
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()
            .map_err(TemplateError::Client)?;
        Ok(Self { client })
    }

    /// Build a GET request with the provider's auth header (omitted without a token)
    fn build_request(
        &self,
        adapter: &dyn ProviderAdapter,
        source: &TemplateSourceConfig,
        url: Url,
    ) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(token) = source.token() {
            request = request.header(AUTHORIZATION, adapter.auth_header(token));
        }
        request
    }

    /// Send a request and turn non-2xx answers into provider errors
    async fn send(
        &self,
        adapter: &dyn ProviderAdapter,
        source: &TemplateSourceConfig,
        url: &Url,
    ) -> Result<reqwest::Response> {
        let provider = adapter.kind();
        tracing::debug!(%provider, %url, "GET");

        let response = self
            .build_request(adapter, source, url.clone())
            .send()
            .await
            .map_err(|e| TemplateError::from_reqwest(provider, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TemplateError::from_reqwest(provider, e))?;
        let message = adapter
            .error_message(&body)
            .map(|m| format!("{} (HTTP {})", m, status))
            .unwrap_or_else(|| format!("HTTP {} from {}", status, url));
        Err(TemplateError::Provider { provider, message })
    }

    /// List one directory, following pagination until the listing is complete
    pub async fn list(
        &self,
        adapter: &dyn ProviderAdapter,
        source: &TemplateSourceConfig,
        url: &Url,
    ) -> Result<Vec<RemoteListingItem>> {
        let provider = adapter.kind();
        let mut items = Vec::new();
        let mut page_url = url.clone();

        for _ in 0..MAX_PAGES {
            let response = self.send(adapter, source, &page_url).await?;
            let next = adapter.next_page(&page_url, response.headers());
            let body = response
                .bytes()
                .await
                .map_err(|e| TemplateError::from_reqwest(provider, e))?;
            items.extend(adapter.parse_listing(source, url, &body)?);

            match next {
                Some(next) => page_url = next,
                None => return Ok(items),
            }
        }

        Err(TemplateError::Provider {
            provider,
            message: format!("listing {} exceeded {} pages", url, MAX_PAGES),
        })
    }

    /// Stream one file into `target`, chunk by chunk
    pub async fn download(
        &self,
        adapter: &dyn ProviderAdapter,
        source: &TemplateSourceConfig,
        url: &Url,
        target: &Path,
    ) -> Result<u64> {
        let provider = adapter.kind();
        let mut response = self.send(adapter, source, url).await?;

        let mut file = fs::File::create(target)
            .await
            .map_err(|e| TemplateError::fs(target, e))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TemplateError::from_reqwest(provider, e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| TemplateError::fs(target, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| TemplateError::fs(target, e))?;

        tracing::debug!(path = %target.display(), bytes = written, "wrote file");
        Ok(written)
    }
}

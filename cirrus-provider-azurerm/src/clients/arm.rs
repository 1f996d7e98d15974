//! ARM transport - Authenticated REST calls and long-running operation polling
//!
//! Every request carries a bearer token and an `api-version` query parameter.
//! Mutating calls (`*_then_poll`) wait for the operation to finish: the
//! `Azure-AsyncOperation` header is preferred, then `Location`. `Retry-After`
//! overrides the default poll interval.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::auth::TokenCredential;
use super::error::{ApiError, ErrorDetail};

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const LOCATION: &str = "location";

/// How long-running operations are polled
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Delay between polls when the service sends no `Retry-After`
    pub interval: Duration,
    /// Upper bound on `Retry-After`
    pub max_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_interval: Duration::from_secs(60),
        }
    }
}

/// Body of an `Azure-AsyncOperation` status resource
#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: String,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

/// A page of a list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(default)]
    next_link: Option<String>,
}

/// Authenticated client for the ARM REST API
pub struct ArmClient {
    http: reqwest::Client,
    endpoint: Url,
    credential: Arc<dyn TokenCredential>,
    poll: PollSettings,
}

impl ArmClient {
    pub fn new(http: reqwest::Client, endpoint: Url, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            http,
            endpoint,
            credential,
            poll: PollSettings::default(),
        }
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn url(&self, path: &str, api_version: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint.join(path.trim_start_matches('/'))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<Response, ApiError> {
        let token = self.credential.token().await?;
        log::debug!("{} {}", method, url);

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await?;
        log::debug!("API error: {}", status);
        Err(ApiError::from_response(status.as_u16(), &text))
    }

    /// GET a single resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<T, ApiError> {
        let url = self.url(path, api_version)?;
        let response = self.send(Method::GET, url, None).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// GET every page of a collection, following `nextLink`
    pub async fn list<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut next = Some(self.url(path, api_version)?);
        while let Some(url) = next.take() {
            let response = self.send(Method::GET, url, None).await?;
            let text = response.text().await?;
            let page: Page<T> = serde_json::from_str(&text)?;
            items.extend(page.value);
            next = page.next_link.map(|link| Url::parse(&link)).transpose()?;
        }
        Ok(items)
    }

    /// PUT a resource and wait for the operation to finish
    pub async fn put_then_poll<B: Serialize>(&self, path: &str, api_version: &str, body: &B) -> Result<(), ApiError> {
        let url = self.url(path, api_version)?;
        let response = self.send(Method::PUT, url, Some(serde_json::to_value(body)?)).await?;
        self.poll_until_done(response).await
    }

    /// PATCH a resource and wait for the operation to finish
    pub async fn patch_then_poll<B: Serialize>(&self, path: &str, api_version: &str, body: &B) -> Result<(), ApiError> {
        let url = self.url(path, api_version)?;
        let response = self.send(Method::PATCH, url, Some(serde_json::to_value(body)?)).await?;
        self.poll_until_done(response).await
    }

    /// POST an action without a body and wait for it to finish
    pub async fn post_then_poll(&self, path: &str, api_version: &str) -> Result<(), ApiError> {
        let url = self.url(path, api_version)?;
        let response = self.send(Method::POST, url, None).await?;
        self.poll_until_done(response).await
    }

    /// DELETE a resource and wait for the operation to finish
    pub async fn delete_then_poll(&self, path: &str, api_version: &str) -> Result<(), ApiError> {
        let url = self.url(path, api_version)?;
        let response = self.send(Method::DELETE, url, None).await?;
        self.poll_until_done(response).await
    }

    /// DELETE a resource and wait for it to disappear
    ///
    /// The initial request must succeed; a 404 while polling means the
    /// resource is already gone.
    pub async fn delete_until_gone(&self, path: &str, api_version: &str) -> Result<(), ApiError> {
        let url = self.url(path, api_version)?;
        let response = self.send(Method::DELETE, url, None).await?;
        match self.poll_until_done(response).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }

    async fn poll_until_done(&self, response: Response) -> Result<(), ApiError> {
        let headers = response.headers().clone();
        let status = response.status();

        if let Some(operation_url) = header_url(&headers, AZURE_ASYNC_OPERATION)? {
            return self.poll_async_operation(operation_url, self.retry_after(&headers)).await;
        }
        if status == StatusCode::ACCEPTED
            && let Some(location_url) = header_url(&headers, LOCATION)?
        {
            return self.poll_location(location_url, self.retry_after(&headers)).await;
        }
        Ok(())
    }

    async fn poll_async_operation(&self, url: Url, mut delay: Duration) -> Result<(), ApiError> {
        loop {
            tokio::time::sleep(delay).await;
            let response = self.send(Method::GET, url.clone(), None).await?;
            delay = self.retry_after(response.headers());
            let text = response.text().await?;
            let operation: OperationStatus = serde_json::from_str(&text)?;
            log::debug!("operation status: {}", operation.status);

            match operation.status.to_ascii_lowercase().as_str() {
                "succeeded" => return Ok(()),
                "failed" | "canceled" | "cancelled" => {
                    let detail = operation.error.unwrap_or(ErrorDetail {
                        code: None,
                        message: None,
                    });
                    return Err(ApiError::OperationFailed {
                        status: operation.status,
                        code: detail.code.unwrap_or_default(),
                        message: detail.message.unwrap_or_default(),
                    });
                }
                _ => {}
            }
        }
    }

    async fn poll_location(&self, url: Url, mut delay: Duration) -> Result<(), ApiError> {
        loop {
            tokio::time::sleep(delay).await;
            let response = self.send(Method::GET, url.clone(), None).await?;
            if response.status() != StatusCode::ACCEPTED {
                return Ok(());
            }
            delay = self.retry_after(response.headers());
        }
    }

    fn retry_after(&self, headers: &HeaderMap) -> Duration {
        headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs).min(self.poll.max_interval))
            .unwrap_or(self.poll.interval)
    }
}

fn header_url(headers: &HeaderMap, name: &str) -> Result<Option<Url>, ApiError> {
    match headers.get(name).and_then(|v| v.to_str().ok()) {
        Some(value) if !value.is_empty() => Ok(Some(Url::parse(value)?)),
        _ => Ok(None),
    }
}

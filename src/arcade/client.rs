use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::error::ArcadeError;
use super::types::{
    AuthorizationResponse, AuthorizeToolRequest, ExecuteToolRequest, ExecuteToolResponse,
    FormattedTool, FormattedToolPage, qualified_tool_name,
};
use crate::backends::strategy::RetryStrategy;

pub const DEFAULT_BASE_URL: &str = "https://api.arcade.dev";

/// Thin client over the Arcade tool-execution REST API.
#[derive(Clone)]
pub struct ArcadeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryStrategy,
}

impl ArcadeClient {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Result<Self, ArcadeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ArcadeError::Configuration(
                "Arcade API key not configured. Set ARCADE_API_KEY".to_string(),
            ));
        }

        let mut client_builder = reqwest::Client::builder()
            // Authorization status is long-polled for up to a minute.
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30));

        if let Ok(https_proxy) = std::env::var("HTTPS_PROXY")
            && let Ok(proxy) = reqwest::Proxy::https(&https_proxy)
        {
            client_builder = client_builder.proxy(proxy);
        }

        let client = client_builder
            .build()
            .map_err(|e| ArcadeError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            retry: RetryStrategy::new(3, "Arcade request"),
        })
    }

    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ArcadeError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ArcadeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(ArcadeError::from_status(status.as_u16(), retry_after, body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ArcadeError::Decode(e.to_string()))
    }

    /// Sends the request built by `build`, retrying transient failures.
    async fn send_with_retry<T, F>(&self, build: F) -> Result<T, ArcadeError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        self.retry.execute(|| self.send_once(build())).await
    }

    /// Lists up to `limit` tools of `toolkit`, following pagination.
    pub async fn list_tools(
        &self,
        toolkit: &str,
        limit: u32,
    ) -> Result<Vec<FormattedTool>, ArcadeError> {
        let mut tools: Vec<FormattedTool> = Vec::new();
        let url = self.url("/v1/formatted_tools");

        while (tools.len() as u32) < limit {
            let offset = tools.len() as u32;
            let page_size = limit - offset;
            tracing::debug!(toolkit, offset, page_size, "listing Arcade tools");

            let page: FormattedToolPage = self
                .send_with_retry(|| {
                    self.client.get(&url).query(&[
                        ("toolkit", toolkit.to_string()),
                        ("format", "openai".to_string()),
                        ("limit", page_size.to_string()),
                        ("offset", offset.to_string()),
                    ])
                })
                .await?;

            let received = page.items.len();
            tools.extend(page.items);

            let exhausted = received == 0
                || page
                    .total_count
                    .is_none_or(|total| tools.len() as u64 >= total);
            if exhausted {
                break;
            }
        }

        tools.truncate(limit as usize);
        Ok(tools)
    }

    pub async fn get_tool(&self, tool_name: &str) -> Result<FormattedTool, ArcadeError> {
        let url = self.url(&format!(
            "/v1/formatted_tools/{}",
            qualified_tool_name(tool_name)
        ));
        self.send_with_retry(|| self.client.get(&url).query(&[("format", "openai")]))
            .await
    }

    pub async fn authorize(
        &self,
        tool_name: &str,
        user_id: &str,
    ) -> Result<AuthorizationResponse, ArcadeError> {
        let url = self.url("/v1/tools/authorize");
        let qualified = qualified_tool_name(tool_name);
        tracing::debug!(tool = %qualified, user_id, "requesting tool authorization");
        self.send_with_retry(|| {
            self.client.post(&url).json(&AuthorizeToolRequest {
                tool_name: &qualified,
                user_id,
            })
        })
        .await
    }

    /// Authorization status; with `wait` the service holds the request open
    /// for up to that many seconds until the status changes.
    pub async fn auth_status(
        &self,
        authorization_id: &str,
        wait: Option<u64>,
    ) -> Result<AuthorizationResponse, ArcadeError> {
        let url = self.url("/v1/auth/status");
        self.send_with_retry(|| {
            let mut request = self.client.get(&url).query(&[("id", authorization_id)]);
            if let Some(seconds) = wait {
                request = request.query(&[("wait", seconds)]);
            }
            request
        })
        .await
    }

    /// Runs a tool once. Not retried: a remote action may not be idempotent.
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        input: &Value,
        user_id: &str,
    ) -> Result<ExecuteToolResponse, ArcadeError> {
        let qualified = qualified_tool_name(tool_name);
        tracing::debug!(tool = %qualified, "executing remote tool");
        let request = self.client.post(self.url("/v1/tools/execute")).json(
            &ExecuteToolRequest {
                tool_name: &qualified,
                input,
                user_id,
            },
        );
        self.send_once(request).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

//! Per-tool authorization against the tool service.
//!
//! Tools that act on behalf of a user need that user to grant access once.
//! When a grant is missing the service hands back a URL; the user opens it and
//! we long-poll the status until it settles.

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::arcade::{ArcadeClient, ArcadeError, AuthorizationResponse, AuthorizationStatus};
use crate::console::console;

/// Longest `wait` the status endpoint accepts.
const MAX_WAIT_SECS: u64 = 59;
const POLL_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("Authorization for {tool} failed")]
    Failed { tool: String },

    #[error("Timed out after {seconds}s waiting for authorization of {tool}")]
    TimedOut { tool: String, seconds: u64 },

    #[error("Authorization response for {tool} carried no id to poll")]
    MissingId { tool: String },

    #[error("Authorization request for {tool} failed: {source}")]
    Arcade {
        tool: String,
        #[source]
        source: ArcadeError,
    },
}

/// Makes sure `user_id` may run `tool_name`, waiting at most `timeout` for
/// the user to finish the browser flow.
pub async fn authorize_tool(
    client: &ArcadeClient,
    tool_name: &str,
    user_id: &str,
    timeout: Duration,
) -> Result<(), AuthorizationError> {
    let deadline = Instant::now() + timeout;
    let arcade_err = |source| AuthorizationError::Arcade {
        tool: tool_name.to_string(),
        source,
    };

    let response = client
        .authorize(tool_name, user_id)
        .await
        .map_err(arcade_err)?;

    if response.is_completed() {
        tracing::debug!(tool = tool_name, "already authorized");
        return Ok(());
    }
    check_failed(tool_name, &response)?;

    let authorization_id = response
        .id
        .clone()
        .ok_or_else(|| AuthorizationError::MissingId {
            tool: tool_name.to_string(),
        })?;

    match response.url.as_deref() {
        Some(url) => console().authorization_required(tool_name, url),
        None => tracing::warn!(tool = tool_name, "authorization pending without a URL"),
    }

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(AuthorizationError::TimedOut {
                tool: tool_name.to_string(),
                seconds: timeout.as_secs(),
            });
        }

        let wait = remaining.as_secs().clamp(1, MAX_WAIT_SECS);
        tracing::debug!(tool = tool_name, wait, "polling authorization status");
        let status = client
            .auth_status(&authorization_id, Some(wait))
            .await
            .map_err(arcade_err)?;

        if status.is_completed() {
            console().authorization_granted(tool_name);
            return Ok(());
        }
        check_failed(tool_name, &status)?;

        // Servers that ignore `wait` would otherwise be polled in a tight loop.
        tokio::time::sleep(POLL_BACKOFF.min(deadline.saturating_duration_since(Instant::now())))
            .await;
    }
}

/// Authorizes each tool in order, stopping at the first failure.
pub async fn authorize_all<I, S>(
    client: &ArcadeClient,
    tool_names: I,
    user_id: &str,
    timeout: Duration,
) -> Result<(), AuthorizationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for tool_name in tool_names {
        authorize_tool(client, tool_name.as_ref(), user_id, timeout).await?;
    }
    Ok(())
}

fn check_failed(tool_name: &str, response: &AuthorizationResponse) -> Result<(), AuthorizationError> {
    if response.status == AuthorizationStatus::Failed {
        return Err(AuthorizationError::Failed {
            tool: tool_name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> ArcadeClient {
        ArcadeClient::new("test-key", Some(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn completed_grant_needs_no_polling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/tools/authorize"))
            .and(body_partial_json(json!({
                "tool_name": "Confluence.ListSpaces",
                "user_id": "me@example.com"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "auth_1",
                "status": "completed"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/status"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server).await;
        authorize_tool(
            &client,
            "Confluence_ListSpaces",
            "me@example.com",
            Duration::from_secs(5),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn pending_grant_is_polled_until_completed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/tools/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "auth_2",
                "status": "pending",
                "url": "https://example.com/oauth"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/status"))
            .and(query_param("id", "auth_2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "auth_2",
                "status": "completed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        authorize_tool(
            &client,
            "Confluence_CreatePage",
            "me@example.com",
            Duration::from_secs(30),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn failed_grant_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/tools/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "auth_3",
                "status": "pending",
                "url": "https://example.com/oauth"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "auth_3",
                "status": "failed"
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let err = authorize_tool(&client, "Confluence_RenamePage", "u", Duration::from_secs(30))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthorizationError::Failed { ref tool } if tool == "Confluence_RenamePage"));
    }

    #[tokio::test]
    async fn zero_timeout_gives_up_without_polling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/tools/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "auth_4",
                "status": "pending",
                "url": "https://example.com/oauth"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/status"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let err = authorize_tool(&client, "Confluence_GetPage", "u", Duration::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthorizationError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn pending_without_id_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/tools/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "pending"
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let err = authorize_tool(&client, "Confluence_GetPage", "u", Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthorizationError::MissingId { .. }));
    }

    #[tokio::test]
    async fn authorize_all_stops_at_first_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/tools/authorize"))
            .and(body_partial_json(json!({"tool_name": "Confluence.WhoAmI"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "a",
                "status": "completed"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/tools/authorize"))
            .and(body_partial_json(json!({"tool_name": "Confluence.ListSpaces"})))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/tools/authorize"))
            .and(body_partial_json(json!({"tool_name": "Confluence.GetPage"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "c",
                "status": "completed"
            })))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let err = authorize_all(
            &client,
            ["Confluence_WhoAmI", "Confluence_ListSpaces", "Confluence_GetPage"],
            "u",
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AuthorizationError::Arcade {
                source: ArcadeError::Authentication { .. },
                ..
            }
        ));
    }
}

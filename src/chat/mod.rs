//! Client for the companion chat service
//!
//! Reply lookups never fail: every error becomes a short message Neo can say instead.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Timeout for a chat request
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a health check
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Reply used when the service answers without a `response` field
pub const MISSING_RESPONSE_REPLY: &str = "I got your message!";

/// Reply used when the service cannot be reached
pub const UNREACHABLE_REPLY: &str =
    "I can't connect to my knowledge server, but I'm here to chat with you!";

/// Longest error description included in a fallback reply
const MAX_ERROR_CHARS: usize = 50;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    child_name: &'a str,
}

/// Outcome of a health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    /// Whether the service answered 200
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => f.write_str("healthy"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// HTTP client for the chat service
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// Create a client for the service at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Base URL of the service
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the service for a reply to `message`
    pub async fn reply(&self, message: &str, child_name: &str) -> String {
        let url = format!("{}/chat/text", self.base_url);
        tracing::debug!(url = %url, child = child_name, "requesting reply");

        let result = self
            .client
            .post(&url)
            .timeout(CHAT_TIMEOUT)
            .json(&ChatRequest {
                message,
                child_name,
            })
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                tracing::warn!(error = %e, "chat service unreachable");
                return UNREACHABLE_REPLY.to_string();
            }
            Err(e) => return connection_problem(&e),
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = %status, "chat service error");
            return format!("Server error: {}", status.as_u16());
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("response")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| MISSING_RESPONSE_REPLY.to_string(), ToString::to_string),
            Err(e) => connection_problem(&e),
        }
    }

    /// Check whether the service is up
    pub async fn health(&self) -> HealthStatus {
        let url = format!("{}/health", self.base_url);

        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => HealthStatus::Healthy,
            Ok(response) => HealthStatus::Unhealthy(format!(
                "server error: {}",
                response.status().as_u16()
            )),
            Err(e) => HealthStatus::Unhealthy(format!("cannot connect: {e}")),
        }
    }
}

fn connection_problem(error: &reqwest::Error) -> String {
    tracing::warn!(error = %error, "chat request failed");
    let description: String = error.to_string().chars().take(MAX_ERROR_CHARS).collect();
    format!("Connection problem: {description}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(
            ChatClient::new("http://localhost:5000/").base_url(),
            "http://localhost:5000"
        );
    }

    #[test]
    fn test_health_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "healthy");
        assert_eq!(
            HealthStatus::Unhealthy("server error: 500".into()).to_string(),
            "unhealthy: server error: 500"
        );
        assert!(!HealthStatus::Unhealthy(String::new()).is_healthy());
    }
}

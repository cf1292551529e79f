//! Client for the authentication endpoint.
//!
//! Sends credentials together with the session's feature vector and parses
//! the scoring decision. The decision itself is made remotely.

use crate::config::TransportConfig;
use crate::core::snapshot::FeatureVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport error types.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport config error: {0}")]
    Config(String),

    #[error("Transport network error: {0}")]
    Network(String),

    #[error("Authentication server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Transport serialization error: {0}")]
    Serialization(String),
}

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    /// The feature vector, embedded unmodified
    pub behavior: &'a FeatureVector,
}

/// Scoring decision returned by the authentication endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Challenge,
    Deny,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Decision::Allow => "allow",
            Decision::Challenge => "challenge",
            Decision::Deny => "deny",
        };
        write!(f, "{name}")
    }
}

/// Login response body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub decision: Decision,
    pub session_id: String,
    pub risk_score: f64,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub is_bot: Option<bool>,
}

/// Error body shapes the endpoint uses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

/// Turn a failed response body into a human-readable message.
pub fn error_message(status: u16, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    match (parsed.detail, parsed.message) {
        (Some(serde_json::Value::String(detail)), _) => detail,
        (Some(detail), _) if !detail.is_null() => detail.to_string(),
        (_, Some(message)) => message,
        _ => format!("Request failed ({status})"),
    }
}

/// Login endpoint URL for a base URL.
pub fn login_url(base_url: &str) -> String {
    format!("{}/auth/login", base_url.trim_end_matches('/'))
}

/// Async client for the authentication endpoint.
pub struct AuthClient {
    config: TransportConfig,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        if config.base_url.trim().is_empty() {
            return Err(TransportError::Config("Base URL is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Submit credentials and behavior for scoring.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        behavior: &FeatureVector,
    ) -> Result<LoginResponse, TransportError> {
        let request = LoginRequest {
            username,
            password,
            behavior,
        };

        let url = login_url(&self.config.base_url);
        tracing::debug!(%url, "Submitting login");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Server {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            });
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        tracing::info!(
            decision = %login.decision,
            risk_score = login.risk_score,
            "Login scored"
        );
        Ok(login)
    }
}

/// Blocking client for use in synchronous contexts.
pub struct BlockingAuthClient {
    inner: AuthClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingAuthClient {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TransportError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: AuthClient::new(config)?,
            runtime,
        })
    }

    /// Submit credentials and behavior for scoring.
    pub fn login(
        &self,
        username: &str,
        password: &str,
        behavior: &FeatureVector,
    ) -> Result<LoginResponse, TransportError> {
        self.runtime
            .block_on(self.inner.login(username, password, behavior))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url() {
        assert_eq!(login_url("http://localhost/api"), "http://localhost/api/auth/login");
        assert_eq!(login_url("http://localhost/api/"), "http://localhost/api/auth/login");
    }

    #[test]
    fn test_request_embeds_behavior() {
        let behavior = FeatureVector::default();
        let request = LoginRequest {
            username: "alice",
            password: "hunter22",
            behavior: &behavior,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["username"], "alice");
        assert_eq!(json["behavior"], behavior.to_json());
    }

    #[test]
    fn test_response_parsing() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"decision":"challenge","session_id":"s1","risk_score":0.62,"model_used":"ocsvm"}"#,
        )
        .unwrap();

        assert_eq!(response.decision, Decision::Challenge);
        assert_eq!(response.is_bot, None);
        assert_eq!(response.model_used.as_deref(), Some("ocsvm"));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(401, r#"{"detail":"Invalid credentials"}"#), "Invalid credentials");
        assert_eq!(error_message(500, r#"{"message":"boom"}"#), "boom");
        assert_eq!(error_message(502, "<html>"), "Request failed (502)");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let config = TransportConfig {
            base_url: " ".to_string(),
            timeout_secs: 1,
        };
        assert!(matches!(AuthClient::new(config), Err(TransportError::Config(_))));
    }
}

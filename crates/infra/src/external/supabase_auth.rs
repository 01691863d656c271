//! Password sign-in and sign-out against the hosted auth service (GoTrue).

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthClientError {
    #[error("auth service is not configured")]
    NotConfigured,

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth service error ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

/// Tokens returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SupabaseAuthClient {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
}

impl SupabaseAuthClient {
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            client: reqwest::Client::new(),
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthClientError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let message = error_message(response.json::<Value>().await.ok());
            return Err(AuthClientError::InvalidCredentials(message));
        }
        if !status.is_success() {
            let message = error_message(response.json::<Value>().await.ok());
            return Err(AuthClientError::Api { status, message });
        }

        Ok(response.json::<AuthSession>().await?)
    }

    /// Revoke the session server-side. Callers clear their cookie regardless.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthClientError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response.json::<Value>().await.ok());
            return Err(AuthClientError::Api { status, message });
        }
        Ok(())
    }
}

/// GoTrue puts the human-readable reason under one of several keys.
fn error_message(body: Option<Value>) -> String {
    body.as_ref()
        .and_then(|b| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| b.get(*k).and_then(Value::as_str))
        })
        .unwrap_or("Invalid login credentials")
        .to_string()
}

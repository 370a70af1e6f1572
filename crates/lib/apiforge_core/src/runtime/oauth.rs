//! OAuth 2.0 refresh-token grant as a [`TokenSource`].

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::auth::TokenSource;
use crate::error::AuthError;

/// Token endpoint response (RFC 6749 §5.1).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Rotated refresh token, when the server issues one.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Exchanges a refresh token for access tokens at `token_url`.
pub struct RefreshTokenGrant {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: Option<String>,
    refresh_token: Mutex<String>,
}

impl RefreshTokenGrant {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: Option<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret,
            refresh_token: Mutex::new(refresh_token.into()),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Run the grant and return the full token response.
    pub async fn exchange(&self) -> Result<TokenResponse, AuthError> {
        let mut refresh_token = self.refresh_token.lock().await;

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let resp = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Refresh(format!("Token refresh failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Refresh(format!(
                "Token refresh HTTP {status}: {body}"
            )));
        }

        let token = resp
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::Refresh(format!("Token refresh parse error: {e}")))?;

        if let Some(rotated) = &token.refresh_token {
            debug!("refresh token rotated");
            *refresh_token = rotated.clone();
        }
        Ok(token)
    }
}

#[async_trait]
impl TokenSource for RefreshTokenGrant {
    async fn fetch_token(&self) -> Result<String, AuthError> {
        Ok(self.exchange().await?.access_token)
    }
}

// @zen-component: TOOL-AuthProvider
//
//! Authentication providers.
//!
//! The runtime asks a provider for headers before each request. When the API
//! answers 401/403 it calls [`AuthProvider::handle_auth_error`]; a `true`
//! answer means credentials changed and the request is worth one retry.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::AuthError;

/// Header list as `(name, value)` pairs.
pub type Headers = Vec<(String, String)>;

/// The rejected request, as seen by the provider.
#[derive(Debug, Clone)]
pub struct AuthFailure {
    pub status: u16,
    pub body: String,
    /// Headers the rejected request carried.
    pub sent_headers: Headers,
}

impl AuthFailure {
    pub fn sent_header(&self, name: &str) -> Option<&str> {
        self.sent_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Headers to attach to the next request.
    async fn auth_headers(&self) -> Result<Headers, AuthError>;

    /// React to a 401/403. Return `true` when the request should be retried
    /// with fresh headers.
    async fn handle_auth_error(&self, failure: &AuthFailure) -> Result<bool, AuthError>;
}

/// No credentials; never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl AuthProvider for NoAuth {
    async fn auth_headers(&self) -> Result<Headers, AuthError> {
        Ok(Vec::new())
    }

    async fn handle_auth_error(&self, _failure: &AuthFailure) -> Result<bool, AuthError> {
        Ok(false)
    }
}

/// Fixed headers (API keys, long-lived tokens); never retries.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    headers: Headers,
}

impl StaticAuth {
    pub fn new(headers: Headers) -> Self {
        Self { headers }
    }

    /// `Authorization: Bearer <token>`.
    pub fn bearer(token: impl AsRef<str>) -> Self {
        Self::new(vec![(
            "Authorization".to_string(),
            format!("Bearer {}", token.as_ref()),
        )])
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn auth_headers(&self) -> Result<Headers, AuthError> {
        Ok(self.headers.clone())
    }

    async fn handle_auth_error(&self, _failure: &AuthFailure) -> Result<bool, AuthError> {
        Ok(false)
    }
}

/// Source of fresh access tokens for [`RefreshingAuth`].
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<String, AuthError>;
}

#[derive(Debug, Default)]
struct TokenState {
    token: Option<String>,
    generation: u64,
}

/// Bearer-token provider that refreshes on auth failure.
///
/// Refreshes are single-flight: the state lock is held for the whole fetch,
/// and a caller whose failed request carried an already-replaced token
/// reuses the newer token instead of fetching again.
pub struct RefreshingAuth<R> {
    source: R,
    state: Mutex<TokenState>,
}

impl<R: TokenSource> RefreshingAuth<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Start with a known token; the source is only used on refresh.
    pub fn with_token(source: R, token: impl Into<String>) -> Self {
        Self {
            source,
            state: Mutex::new(TokenState {
                token: Some(token.into()),
                generation: 0,
            }),
        }
    }

    /// Number of completed refreshes.
    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    async fn refresh(&self, state: &mut TokenState) -> Result<String, AuthError> {
        let token = self.source.fetch_token().await?;
        state.token = Some(token.clone());
        state.generation += 1;
        info!(generation = state.generation, "access token refreshed");
        Ok(token)
    }
}

fn bearer_header(token: &str) -> (String, String) {
    ("Authorization".to_string(), format!("Bearer {token}"))
}

// @zen-impl: TOOL-AuthProvider single-flight refresh
#[async_trait]
impl<R: TokenSource> AuthProvider for RefreshingAuth<R> {
    async fn auth_headers(&self) -> Result<Headers, AuthError> {
        let mut state = self.state.lock().await;
        if let Some(token) = &state.token {
            return Ok(vec![bearer_header(token)]);
        }
        let token = self.refresh(&mut state).await?;
        Ok(vec![bearer_header(&token)])
    }

    async fn handle_auth_error(&self, failure: &AuthFailure) -> Result<bool, AuthError> {
        let mut state = self.state.lock().await;

        if let (Some(current), Some(sent)) = (&state.token, failure.sent_header("Authorization"))
            && sent != bearer_header(current).1
        {
            debug!(generation = state.generation, "token already refreshed by another caller");
            return Ok(true);
        }

        self.refresh(&mut state).await?;
        Ok(true)
    }
}

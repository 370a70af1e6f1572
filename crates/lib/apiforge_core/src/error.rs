//! Error types shared across the compiler and the invocation runtime.

use thiserror::Error;

/// Failure to acquire or parse an OpenAPI document. Fatal to startup.
#[derive(Debug, Error)]
pub enum SpecLoadError {
    #[error("Failed to read spec from {source_name}: {message}")]
    Read {
        source_name: String,
        message: String,
    },

    #[error("Failed to fetch spec from {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Failed to parse spec from {source_name} (tried JSON and YAML): {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("Unsupported OpenAPI version '{0}'. Only 3.x is supported")]
    Unsupported(String),

    #[error("No spec source configured")]
    NoSource,
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Fatal compilation error.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Tool name '{name}' produced by both {first} and {second}")]
    ToolNameCollision {
        name: String,
        first: String,
        second: String,
    },
}

/// Errors raised by an [`AuthProvider`](crate::runtime::auth::AuthProvider).
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Credential refresh failed: {0}")]
    Refresh(String),
}

/// Errors surfaced by [`ApiClient::invoke`](crate::runtime::ApiClient::invoke).
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Request failed with status {status}: {body}")]
    Request { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Could not obtain auth headers: {0}")]
    Auth(AuthError),

    #[error("Auth recovery failed: {0}")]
    AuthRecovery(AuthError),
}

impl InvokeError {
    /// HTTP status carried by the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            InvokeError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

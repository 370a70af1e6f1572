//! Runtime configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::compiler::{CollisionPolicy, CompileOptions};
use crate::error::ConfigError;
use crate::naming::{AbbreviationTable, CompressorOptions, NameCompressor};
use crate::openapi::{DocumentSource, OpenApiDoc};
use crate::registry::ToolFilter;
use crate::runtime::{AuthProvider, Headers, NoAuth, RefreshTokenGrant, RefreshingAuth};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth refresh-token grant settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub refresh_token: String,
}

/// Settings for loading, compiling and invoking one API.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Overrides the document's first `servers` entry.
    pub base_url: Option<String>,
    pub spec_source: Option<DocumentSource>,
    /// Headers sent with every request.
    pub headers: Headers,
    pub abbreviate: bool,
    pub filter: ToolFilter,
    pub collisions: CollisionPolicy,
    pub request_timeout: Duration,
    pub oauth: Option<OAuthConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            spec_source: None,
            headers: Vec::new(),
            abbreviate: true,
            filter: ToolFilter::default(),
            collisions: CollisionPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            oauth: None,
        }
    }
}

impl Config {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                  | Default                          |
    /// |---------------------------|----------------------------------|
    /// | `API_BASE_URL`            | first `servers` entry            |
    /// | `OPENAPI_SPEC_FROM_STDIN` | `false`                          |
    /// | `OPENAPI_SPEC_INLINE`     | unset                            |
    /// | `OPENAPI_SPEC_PATH`       | unset (file path or http(s) URL) |
    /// | `API_HEADERS`             | none (`name:value,name:value`)   |
    /// | `DISABLE_ABBREVIATION`    | `false`                          |
    /// | `INCLUDE_TOOLS`           | all (comma-separated ids/names)  |
    /// | `INCLUDE_TAGS`            | all                              |
    /// | `INCLUDE_RESOURCES`       | all                              |
    /// | `INCLUDE_OPERATIONS`      | all (HTTP verbs)                 |
    /// | `TOOL_NAME_COLLISIONS`    | `disambiguate` (or `reject`)     |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                             |
    /// | `OAUTH_TOKEN_URL`, `OAUTH_CLIENT_ID`, `OAUTH_CLIENT_SECRET`, `OAUTH_REFRESH_TOKEN` | unset |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let from_stdin = parse_bool("OPENAPI_SPEC_FROM_STDIN", get("OPENAPI_SPEC_FROM_STDIN"))?;
        let spec_source = if from_stdin {
            Some(DocumentSource::Stdin)
        } else if let Some(inline) = get("OPENAPI_SPEC_INLINE") {
            Some(DocumentSource::Inline(inline))
        } else {
            get("OPENAPI_SPEC_PATH").map(|p| source_from_location(&p))
        };

        let base_url = get("API_BASE_URL")
            .map(|url| validate_url("API_BASE_URL", &url))
            .transpose()?;

        let headers = get("API_HEADERS")
            .map(|h| parse_headers(&h))
            .transpose()?
            .unwrap_or_default();

        let collisions = match get("TOOL_NAME_COLLISIONS") {
            Some(v) => v.parse().map_err(|message| invalid("TOOL_NAME_COLLISIONS", message))?,
            None => defaults.collisions,
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| invalid("REQUEST_TIMEOUT_SECS", e.to_string()))?,
            None => defaults.request_timeout,
        };

        let oauth = match (get("OAUTH_TOKEN_URL"), get("OAUTH_REFRESH_TOKEN")) {
            (Some(token_url), Some(refresh_token)) => Some(OAuthConfig {
                token_url: validate_url("OAUTH_TOKEN_URL", &token_url)?,
                client_id: get("OAUTH_CLIENT_ID").unwrap_or_default(),
                client_secret: get("OAUTH_CLIENT_SECRET"),
                refresh_token,
            }),
            _ => None,
        };

        Ok(Self {
            base_url,
            spec_source,
            headers,
            abbreviate: !parse_bool("DISABLE_ABBREVIATION", get("DISABLE_ABBREVIATION"))?,
            filter: ToolFilter {
                tools: parse_list(get("INCLUDE_TOOLS")),
                tags: parse_list(get("INCLUDE_TAGS")),
                resources: parse_list(get("INCLUDE_RESOURCES")),
                operations: parse_list(get("INCLUDE_OPERATIONS")),
            },
            collisions,
            request_timeout,
            oauth,
        })
    }

    pub fn compile_options(&self) -> CompileOptions {
        let compressor = NameCompressor::new(
            Arc::new(AbbreviationTable::default()),
            CompressorOptions {
                abbreviate: self.abbreviate,
                ..CompressorOptions::default()
            },
        );
        CompileOptions {
            compressor,
            filter: self.filter.clone(),
            collisions: self.collisions,
        }
    }

    /// Configured base URL, else the document's first server.
    pub fn resolve_base_url(&self, doc: &OpenApiDoc) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| doc.first_server_url().map(str::to_string))
    }

    /// Refreshing OAuth provider when configured, else no auth. Static
    /// credentials travel in [`Config::headers`].
    pub fn auth_provider(&self) -> Arc<dyn AuthProvider> {
        match &self.oauth {
            Some(oauth) => Arc::new(RefreshingAuth::new(RefreshTokenGrant::new(
                oauth.token_url.clone(),
                oauth.client_id.clone(),
                oauth.client_secret.clone(),
                oauth.refresh_token.clone(),
            ))),
            None => Arc::new(NoAuth),
        }
    }
}

/// `http(s)://` locations are fetched; anything else is a file path.
pub fn source_from_location(location: &str) -> DocumentSource {
    if location.starts_with("http://") || location.starts_with("https://") {
        DocumentSource::Url(location.to_string())
    } else {
        DocumentSource::File(PathBuf::from(location))
    }
}

/// Parse `name:value,name:value`.
pub fn parse_headers(raw: &str) -> Result<Headers, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, value) = entry
                .split_once(':')
                .ok_or_else(|| invalid("API_HEADERS", format!("'{entry}' is not name:value")))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid("API_HEADERS", format!("'{entry}' has an empty name")));
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_list(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_bool(var: &str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(var, format!("'{other}' is not a boolean"))),
    }
}

fn validate_url(var: &str, raw: &str) -> Result<String, ConfigError> {
    url::Url::parse(raw.trim()).map_err(|e| invalid(var, e.to_string()))?;
    Ok(raw.trim().to_string())
}

fn invalid(var: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        message: message.into(),
    }
}

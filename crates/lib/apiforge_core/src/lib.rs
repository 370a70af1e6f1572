//! # apiforge_core
//!
//! Compiles OpenAPI 3.x documents into invocable tools and executes tool
//! calls as HTTP requests.

pub mod compiler;
pub mod config;
pub mod error;
pub mod naming;
pub mod openapi;
pub mod registry;
pub mod runtime;
pub mod schema;
pub mod tool_id;

pub use compiler::{CollisionPolicy, CompileOptions, CompiledTools, Diagnostic, compile};
pub use config::Config;
pub use error::{AuthError, CompileError, ConfigError, InvokeError, SpecLoadError};
pub use registry::{ToolDefinition, ToolFilter, ToolRegistry};
pub use runtime::ApiClient;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}

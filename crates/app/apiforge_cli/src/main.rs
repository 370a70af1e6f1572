// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::sync::Arc;

use apiforge_core::config::{parse_headers, source_from_location};
use apiforge_core::openapi::{DocumentSource, load_document};
use apiforge_core::runtime::ReqwestTransport;
use apiforge_core::{
    ApiClient, CollisionPolicy, Config, InvokeError, SpecLoadError, ToolDefinition, ToolRegistry,
    compile,
};
use clap::Parser;
use cli::{Cli, Commands, SourceArgs};
use serde_json::Value;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    logging::init()?;
    dotenvy::dotenv().ok();

    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), apiforge_core::version());
        }
        command => execute(&args.source, command).await?,
    }

    Ok(())
}

async fn execute(source: &SourceArgs, command: Commands) -> Result<()> {
    let config = resolve_config(source)?;
    let spec_source = config.spec_source.clone().ok_or(SpecLoadError::NoSource)?;
    let doc = load_document(&spec_source).await?;
    let compiled = compile(&doc, &config.compile_options())?;
    let registry = Arc::new(compiled.registry);

    match command {
        Commands::List { json } => list(&registry, json)?,
        Commands::Show { tool } => {
            let (tool_id, definition) = find_tool(&registry, &tool)?;
            println!("{}", serde_json::to_string_pretty(&describe(&tool_id, definition)?)?);
        }
        Commands::Call {
            tool,
            args,
            args_file,
        } => {
            let base_url = config.resolve_base_url(&doc).ok_or_else(|| {
                Error::Custom("No base URL: set API_BASE_URL or declare a server".into())
            })?;
            let transport = ReqwestTransport::new(Some(config.request_timeout))?;
            let client = ApiClient::new(base_url, Arc::clone(&registry), Arc::new(transport))
                .with_default_headers(config.headers.clone())
                .with_auth(config.auth_provider());

            let raw = match args_file {
                Some(path) => std::fs::read_to_string(path)?,
                None => args,
            };
            let arguments: Value = serde_json::from_str(&raw)?;

            let result = if tool.contains(apiforge_core::tool_id::METHOD_SEPARATOR) {
                client.invoke(&tool, &arguments).await?
            } else {
                client.invoke_by_name(&tool, &arguments).await?
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Version => {}
    }

    Ok(())
}

/// Environment configuration with command-line overrides applied.
fn resolve_config(source: &SourceArgs) -> Result<Config> {
    let mut config = Config::from_env()?;

    if source.stdin {
        config.spec_source = Some(DocumentSource::Stdin);
    } else if let Some(spec) = &source.spec {
        config.spec_source = Some(source_from_location(spec));
    }
    if let Some(base_url) = &source.base_url {
        config.base_url = Some(base_url.clone());
    }
    for header in &source.headers {
        config.headers.extend(parse_headers(header)?);
    }
    if source.no_abbreviate {
        config.abbreviate = false;
    }
    if source.reject_collisions {
        config.collisions = CollisionPolicy::Reject;
    }
    config.filter.tags.extend(source.tags.iter().cloned());
    config.filter.operations.extend(source.operations.iter().cloned());
    config.filter.resources.extend(source.resources.iter().cloned());

    Ok(config)
}

fn find_tool<'a>(registry: &'a ToolRegistry, tool: &str) -> Result<(String, &'a ToolDefinition)> {
    let found = if tool.contains(apiforge_core::tool_id::METHOD_SEPARATOR) {
        registry.get(tool).map(|definition| (tool.to_string(), definition))
    } else {
        registry
            .find_by_name(tool)
            .map(|(tool_id, definition)| (tool_id.to_string(), definition))
    };
    found.ok_or_else(|| InvokeError::UnknownTool(tool.to_string()).into())
}

/// Tool definition as JSON with its tool id.
fn describe(tool_id: &str, definition: &ToolDefinition) -> Result<Value> {
    let mut value = serde_json::to_value(definition)?;
    if let Value::Object(map) = &mut value {
        map.insert("toolId".to_string(), Value::String(tool_id.to_string()));
    }
    Ok(value)
}

fn list(registry: &ToolRegistry, json: bool) -> Result<()> {
    if json {
        let tools = registry
            .iter()
            .map(|(tool_id, definition)| describe(tool_id, definition))
            .collect::<Result<Vec<_>>>()?;
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    for (tool_id, definition) in registry.iter() {
        println!("{:<40} {}", definition.name, tool_id);
    }
    Ok(())
}

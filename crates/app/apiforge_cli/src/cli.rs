use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Expose OpenAPI operations as invocable tools.
#[derive(Parser, Debug)]
#[command(name = "apiforge", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Document and compilation settings. Flags override the environment
/// (`OPENAPI_SPEC_PATH`, `API_HEADERS`, `INCLUDE_TAGS`, ...).
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// OpenAPI document: file path or http(s) URL.
    #[arg(long, global = true)]
    pub spec: Option<String>,

    /// Read the OpenAPI document from stdin; wins over `--spec`.
    #[arg(long, global = true)]
    pub stdin: bool,

    /// Base URL of the API; defaults to the document's first server.
    #[arg(long, global = true, env = "API_BASE_URL")]
    pub base_url: Option<String>,

    /// Extra request header as `name:value`. Repeatable.
    #[arg(long = "header", short = 'H', global = true)]
    pub headers: Vec<String>,

    /// Keep operation names literal (no stop words or abbreviations).
    #[arg(long, global = true)]
    pub no_abbreviate: bool,

    /// Only include operations with this tag. Repeatable.
    #[arg(long = "tag", global = true)]
    pub tags: Vec<String>,

    /// Only include these HTTP verbs. Repeatable.
    #[arg(long = "operation", global = true)]
    pub operations: Vec<String>,

    /// Only include tools for this resource. Repeatable.
    #[arg(long = "resource", global = true)]
    pub resources: Vec<String>,

    /// Fail instead of renaming when two tools share a name.
    #[arg(long, global = true)]
    pub reject_collisions: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List compiled tools.
    List {
        /// Print full tool definitions as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print one tool's definition.
    Show {
        /// Tool name or tool id (`METHOD::path`).
        tool: String,
    },

    /// Invoke a tool and print the response.
    Call {
        /// Tool name or tool id (`METHOD::path`).
        tool: String,

        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,

        /// Read arguments from a JSON file instead.
        #[arg(long, conflicts_with = "args")]
        args_file: Option<PathBuf>,
    },

    /// Print version information.
    Version,
}

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("Json: {}", .0)]
    Json(#[from] serde_json::Error),

    #[error("{}", .0)]
    Config(#[from] apiforge_core::ConfigError),

    #[error("{}", .0)]
    SpecLoad(#[from] apiforge_core::SpecLoadError),

    #[error("{}", .0)]
    Compile(#[from] apiforge_core::CompileError),

    #[error("{}", .0)]
    Invoke(#[from] apiforge_core::InvokeError),

    #[error("{}", .0)]
    Transport(#[from] apiforge_core::runtime::TransportError),
}

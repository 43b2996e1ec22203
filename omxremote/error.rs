use flexi_logger::FlexiLoggerError;
use std::io;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::oneshot::error::RecvError;
use zbus::fdo;

#[derive(Error, Debug)]
pub enum App {
    #[error("Invalid content location: {0}")]
    InvalidLocation(String),

    #[error("Player is already running")]
    AlreadyActive,

    #[error("Invalid command: {0}")]
    UnknownCommand(String),

    #[error("Failed to start player process: {0}")]
    Spawn(io::Error),

    #[error("Player process exited with error: {0}")]
    ProcessExit(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logger initialization error: {0}")]
    Logger(#[from] FlexiLoggerError),

    #[error("ZBus error: {0}")]
    Zbus(#[from] zbus::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Channel send error: {0}")]
    Send(String),

    #[error("Player task is gone")]
    ChannelClosed(#[from] RecvError),
}

impl<T> From<SendError<T>> for App {
    fn from(error: SendError<T>) -> Self {
        App::Send(error.to_string())
    }
}

impl From<App> for fdo::Error {
    fn from(error: App) -> Self {
        match error {
            App::InvalidLocation(_)
            | App::UnknownCommand(_)
            | App::Json(_) => fdo::Error::InvalidArgs(error.to_string()),
            _ => fdo::Error::Failed(error.to_string()),
        }
    }
}

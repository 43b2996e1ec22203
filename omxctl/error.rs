use std::io::Error as IoError;
use thiserror::Error;
use zbus::Error as ZbusError;

#[derive(Error, Debug)]
pub enum App {
    #[error("I/O operation failed")]
    Io(#[from] IoError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Zbus error: {0}")]
    Zbus(#[from] ZbusError),
}

//! Daemon error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Server error: {0}")]
    Server(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] sensord_core::CoreError),
}

pub type Result<T> = std::result::Result<T, DaemonError>;

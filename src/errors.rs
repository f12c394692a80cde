// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevbatError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Suite file not found: {}", .0.display())]
    SuiteNotFound(PathBuf),

    #[error("Case '{case}' not implemented: no registered body for path '{path}'")]
    CaseNotImplemented { case: String, path: String },

    #[error("Device {serial} not found (visible devices: {visible:?})")]
    DeviceOffline {
        serial: String,
        visible: Vec<String>,
    },

    #[error("Suite failed to start: {0}")]
    SuiteFailToStart(String),

    #[error("ADB server error: {0}")]
    AdbServer(String),

    #[error("Local path does not exist: {}", .0.display())]
    LocalPathMissing(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DevbatError>;

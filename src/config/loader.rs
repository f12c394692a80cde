// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::{debug, error};

use crate::config::model::{RawSuiteFile, SuiteFile};
use crate::errors::{DevbatError, Result};

/// Load a suite file from a given path and return the raw `RawSuiteFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSuiteFile> {
    let path = path.as_ref();
    if !path.exists() {
        error!(path = %path.display(), "could not find suite file, does it really exist?");
        return Err(DevbatError::SuiteNotFound(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;
    let suite: RawSuiteFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), cases = suite.cases.len(), "parsed suite file");

    Ok(suite)
}

/// Load a suite file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` default functions).
/// - Checks names, case paths and retry counts.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SuiteFile> {
    let raw = load_from_path(&path)?;
    let suite = SuiteFile::try_from(raw)?;
    Ok(suite)
}

// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{RawSuiteFile, SuiteFile};
use crate::errors::{DevbatError, Result};
use crate::types::CaseKind;

impl TryFrom<RawSuiteFile> for SuiteFile {
    type Error = crate::errors::DevbatError;

    fn try_from(raw: RawSuiteFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_suite(&raw)?;
        Ok(SuiteFile::new_unchecked(raw))
    }
}

fn validate_raw_suite(suite: &RawSuiteFile) -> Result<()> {
    validate_identity(suite)?;
    validate_timing(suite)?;
    validate_cases(suite)?;
    Ok(())
}

fn validate_identity(suite: &RawSuiteFile) -> Result<()> {
    if suite.suite_name.trim().is_empty() {
        return Err(DevbatError::ConfigError(
            "suite_name must not be empty".to_string(),
        ));
    }
    if suite.test_device.name.trim().is_empty() {
        return Err(DevbatError::ConfigError(
            "[test_device].name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_timing(suite: &RawSuiteFile) -> Result<()> {
    if suite.timing.reboot_retry_count == 0 {
        return Err(DevbatError::ConfigError(
            "[timing].reboot_retry_count must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_cases(suite: &RawSuiteFile) -> Result<()> {
    let mut seen = HashSet::new();
    for case in suite.cases.iter() {
        if !seen.insert(case.name.as_str()) {
            return Err(DevbatError::ConfigError(format!(
                "case name '{}' is declared more than once",
                case.name
            )));
        }
        if case.kind == CaseKind::Auto && case.path.is_none() {
            return Err(DevbatError::ConfigError(format!(
                "auto case '{}' needs a `path`",
                case.name
            )));
        }
        if case.retry_count == Some(0) {
            return Err(DevbatError::ConfigError(format!(
                "case '{}' has retry_count = 0, must be >= 1",
                case.name
            )));
        }
    }
    Ok(())
}

// src/report.rs

//! Suite report artifact and LAVA result emission.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::engine::{CaseResult, SuiteCounts};
use crate::errors::{DevbatError, Result};
use crate::exec::{CommandRunner, Invocation};
use crate::types::ReportFormat;

/// Identity of the device a suite ran against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub serial: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

/// The serialized report document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub name: String,
    pub device: DeviceIdentity,
    pub result: SuiteCounts,
    pub cases: Vec<CaseResult>,
}

impl SuiteReport {
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| DevbatError::Report(e.to_string()))
            }
            ReportFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|e| DevbatError::Report(e.to_string()))
            }
        }
    }
}

/// `<YYYY-MM-DD-HH-MM-SS>_<suite>.<ext>`
pub fn report_file_name(at: &DateTime<Local>, suite: &str, format: ReportFormat) -> String {
    format!(
        "{}_{}.{}",
        at.format("%Y-%m-%d-%H-%M-%S"),
        suite,
        format.extension()
    )
}

/// Write `report` into `dir` (created if missing) with a timestamped name.
///
/// An unsupported `format` is not an error: the report is logged instead
/// and `Ok(None)` is returned.
pub fn write_report(report: &SuiteReport, dir: &Path, format: &str) -> Result<Option<PathBuf>> {
    let format = match ReportFormat::from_str(format) {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "unsupported report format, dumping report below");
            error!("{:?}", report);
            return Ok(None);
        }
    };

    let contents = report.render(format)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(&Local::now(), &report.name, format));
    fs::write(&path, contents)?;
    info!(path = %path.display(), "report written");
    Ok(Some(path))
}

/// `lava-test-case <name> --result <result>` for one case.
pub fn lava_invocation(case: &CaseResult) -> Invocation {
    Invocation::new("lava-test-case", "")
        .arg(case.name.as_str())
        .arg("--result")
        .arg(case.outcome.lava_result())
}

/// Report every case result to LAVA. Output is logged; failures are soft.
pub fn emit_lava_results(runner: &dyn CommandRunner, cases: &[CaseResult]) {
    for case in cases {
        let inv = lava_invocation(case);
        info!(case = %case.name, result = case.outcome.lava_result(), "generate case LAVA result");
        let out = runner.run(&inv);
        for line in out.lines.iter() {
            info!("{}", line);
        }
        if !out.success() {
            error!(case = %case.name, code = out.code, "lava-test-case failed");
        }
    }
    info!("LAVA results for all cases generated");
}

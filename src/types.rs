use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a test case is run.
///
/// - `Auto`: the registered body is executed against the device.
/// - `Manual`: never executed; the case always resolves to
///   [`Outcome::Empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
    #[default]
    Auto,
    Manual,
}

/// Terminal outcome of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    /// Skipped because the device was unreachable when the case was due.
    Block,
    #[default]
    Empty,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::Block => "block",
            Outcome::Empty => "empty",
        }
    }

    /// Result keyword understood by `lava-test-case --result`.
    pub fn lava_result(self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::Block => "skip",
            Outcome::Empty => "unknown",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialization format of the suite report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Toml,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Toml => "toml",
            ReportFormat::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "toml" => Ok(ReportFormat::Toml),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!(
                "unsupported report format: {other} (expected \"toml\" or \"json\")"
            )),
        }
    }
}

/// Status filter for `adb devices` listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Online,
    Offline,
    All,
}

impl DeviceStatus {
    /// Whether a status column from `adb devices` matches this filter.
    pub fn matches(self, status: &str) -> bool {
        match self {
            DeviceStatus::Online => status == "device",
            DeviceStatus::Offline => status == "offline",
            DeviceStatus::All => status == "device" || status == "offline",
        }
    }
}

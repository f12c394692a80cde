// src/config/model.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::CaseKind;

pub const DEFAULT_CASE_RETRY_COUNT: u32 = 2;
pub const DEFAULT_CASE_TIMEOUT_SECS: u64 = 60;

/// Suite definition as read from a TOML file, before validation.
///
/// ```toml
/// suite_name = "smoke"
///
/// [test_device]
/// name = "hikey960"
/// product = "hikey960"
///
/// [flash_file]
/// file = "http://ci.example.com/images/build.zip"
/// mode = "fastboot"
/// commands = ["flash boot boot.img", "reboot"]
///
/// [[case]]
/// name = "boot"
/// full_name = "Boot to UI"
/// path = "test/boot_to_ui.py"
/// retry_count = 1
/// ```
///
/// Everything except `suite_name` and `[test_device]` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSuiteFile {
    pub suite_name: String,

    /// Which device to run against.
    pub test_device: DeviceSelector,

    /// Firmware to install, handed to cases that flash.
    #[serde(default)]
    pub flash_file: Option<FlashSpec>,

    /// Extra helper modules exposed to case bodies, resolved by name.
    #[serde(default)]
    pub external_lib: Vec<ModuleRef>,

    #[serde(default)]
    pub timing: TimingSection,

    #[serde(default)]
    pub report: ReportSection,

    /// Ordered case definitions from `[[case]]`.
    #[serde(default, rename = "case")]
    pub cases: Vec<CaseConfig>,
}

/// Validated suite definition.
///
/// Only obtainable through `TryFrom<RawSuiteFile>` (see `validate.rs`), so
/// holders can rely on unique case names and resolvable case kinds.
#[derive(Debug, Clone)]
pub struct SuiteFile {
    pub suite_name: String,
    pub test_device: DeviceSelector,
    pub flash_file: Option<FlashSpec>,
    pub external_lib: Vec<ModuleRef>,
    pub timing: TimingSection,
    pub report: ReportSection,
    pub cases: Vec<CaseConfig>,
}

impl SuiteFile {
    pub(crate) fn new_unchecked(raw: RawSuiteFile) -> Self {
        Self {
            suite_name: raw.suite_name,
            test_device: raw.test_device,
            flash_file: raw.flash_file,
            external_lib: raw.external_lib,
            timing: raw.timing,
            report: raw.report,
            cases: raw.cases,
        }
    }
}

/// `[test_device]` section.
///
/// `serial` has priority over `product`; with neither set any online device
/// qualifies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceSelector {
    pub name: String,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
}

/// `[flash_file]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FlashSpec {
    /// URL or local path of the image (a directory or a `.zip`).
    #[serde(rename = "file")]
    pub image: String,

    /// Kept as a string so an unsupported mode is reported at flash time
    /// instead of rejecting the whole suite.
    #[serde(default = "default_flash_mode")]
    pub mode: String,

    #[serde(default)]
    pub auth: Option<Credentials>,

    /// Fastboot sub-commands, run in order from the unpacked image root.
    #[serde(default)]
    pub commands: Vec<String>,
}

fn default_flash_mode() -> String {
    "fastboot".to_string()
}

/// Username/password pair for image downloads.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `[[external_lib]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleRef {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// `[timing]` section, all values in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingSection {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_boot_timeout")]
    pub boot_timeout: u64,
    #[serde(default = "default_reboot_timeout")]
    pub reboot_timeout: u64,
    #[serde(default = "default_reboot_retry_count")]
    pub reboot_retry_count: u32,
    #[serde(default = "default_fastboot_entry_delay")]
    pub fastboot_entry_delay: u64,
    #[serde(default = "default_boot_settle_delay")]
    pub boot_settle_delay: u64,
}

fn default_connect_timeout() -> u64 {
    60
}

fn default_boot_timeout() -> u64 {
    120
}

fn default_reboot_timeout() -> u64 {
    30
}

fn default_reboot_retry_count() -> u32 {
    3
}

fn default_fastboot_entry_delay() -> u64 {
    10
}

fn default_boot_settle_delay() -> u64 {
    30
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            boot_timeout: default_boot_timeout(),
            reboot_timeout: default_reboot_timeout(),
            reboot_retry_count: default_reboot_retry_count(),
            fastboot_entry_delay: default_fastboot_entry_delay(),
            boot_settle_delay: default_boot_settle_delay(),
        }
    }
}

/// `[report]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSection {
    /// `"toml"` or `"json"`; anything else only logs the report.
    #[serde(default = "default_report_format")]
    pub format: String,

    #[serde(default = "default_report_dir")]
    pub dir: PathBuf,
}

fn default_report_format() -> String {
    "toml".to_string()
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            format: default_report_format(),
            dir: default_report_dir(),
        }
    }
}

/// `[[case]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseConfig {
    /// Unique key within the suite.
    pub name: String,

    /// Display name; defaults to `name`.
    #[serde(default)]
    pub full_name: Option<String>,

    /// Registry key of the case body. Required for auto cases.
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: CaseKind,

    #[serde(default)]
    pub retry_count: Option<u32>,

    /// Seconds. Advisory only: overruns are logged, not enforced.
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl CaseConfig {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.name)
    }

    pub fn effective_retry_count(&self) -> u32 {
        self.retry_count.unwrap_or(DEFAULT_CASE_RETRY_COUNT)
    }

    pub fn effective_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_CASE_TIMEOUT_SECS))
    }
}

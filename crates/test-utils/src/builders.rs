#![allow(dead_code)]

use std::sync::Arc;

use devbat::config::{
    CaseConfig, DeviceSelector, FlashSpec, ModuleRef, RawSuiteFile, ReportSection, SuiteFile,
    TimingSection,
};
use devbat::engine::{CaseContext, FnCase, TestCase};
use devbat::types::CaseKind;

/// Builder for `SuiteFile` to simplify test setup.
pub struct SuiteBuilder {
    suite: RawSuiteFile,
}

impl SuiteBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            suite: RawSuiteFile {
                suite_name: name.to_string(),
                test_device: DeviceSelector {
                    name: "fake-board".to_string(),
                    product: None,
                    serial: None,
                },
                flash_file: None,
                external_lib: Vec::new(),
                timing: TimingSection::default(),
                report: ReportSection::default(),
                cases: Vec::new(),
            },
        }
    }

    pub fn with_serial(mut self, serial: &str) -> Self {
        self.suite.test_device.serial = Some(serial.to_string());
        self
    }

    pub fn with_product(mut self, product: &str) -> Self {
        self.suite.test_device.product = Some(product.to_string());
        self
    }

    pub fn with_case(mut self, case: CaseConfig) -> Self {
        self.suite.cases.push(case);
        self
    }

    pub fn with_flash(mut self, image: &str, commands: &[&str]) -> Self {
        self.suite.flash_file = Some(FlashSpec {
            image: image.to_string(),
            mode: "fastboot".to_string(),
            auth: None,
            commands: commands.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn with_module(mut self, name: &str) -> Self {
        self.suite.external_lib.push(ModuleRef {
            name: name.to_string(),
            path: None,
        });
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.suite.timing.connect_timeout = secs;
        self
    }

    pub fn raw(self) -> RawSuiteFile {
        self.suite
    }

    pub fn build(self) -> SuiteFile {
        SuiteFile::try_from(self.suite).expect("Failed to build valid suite from builder")
    }
}

/// Builder for `CaseConfig`.
pub struct CaseBuilder {
    case: CaseConfig,
}

impl CaseBuilder {
    /// Auto case whose body is registered under `path`.
    pub fn auto(name: &str, path: &str) -> Self {
        Self {
            case: CaseConfig {
                name: name.to_string(),
                full_name: None,
                path: Some(path.to_string()),
                kind: CaseKind::Auto,
                retry_count: None,
                timeout: None,
            },
        }
    }

    pub fn manual(name: &str) -> Self {
        Self {
            case: CaseConfig {
                name: name.to_string(),
                full_name: None,
                path: None,
                kind: CaseKind::Manual,
                retry_count: None,
                timeout: None,
            },
        }
    }

    pub fn full_name(mut self, full_name: &str) -> Self {
        self.case.full_name = Some(full_name.to_string());
        self
    }

    pub fn retry_count(mut self, n: u32) -> Self {
        self.case.retry_count = Some(n);
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.case.timeout = Some(secs);
        self
    }

    pub fn build(self) -> CaseConfig {
        self.case
    }
}

/// Wrap a closure as a shareable case body.
pub fn case_body<F>(f: F) -> Arc<dyn TestCase>
where
    F: Fn(&mut CaseContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(FnCase(f))
}

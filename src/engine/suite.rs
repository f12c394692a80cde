// src/engine/suite.rs

//! Suite run loop: device acquisition, FIFO dispatch, aggregation.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::config::{DeviceSelector, SuiteFile};
use crate::device::{AdbBridge, DeviceLink, DeviceTimings};
use crate::engine::case::{CaseExecutor, TestCaseSpec};
use crate::engine::registry::{CaseRegistry, ExtraModules};
use crate::engine::{CaseResult, SuiteResult};
use crate::errors::{DevbatError, Result};
use crate::exec::Host;
use crate::report::{self, DeviceIdentity, SuiteReport};
use crate::types::CaseKind;

#[derive(Debug)]
pub struct SuiteEngine {
    suite: SuiteFile,
    queue: VecDeque<CaseExecutor>,
    modules: ExtraModules,
    device: Option<DeviceLink>,
    result: SuiteResult,
    host: Host,
    timings: DeviceTimings,
}

impl SuiteEngine {
    /// Build the case queue, resolving every auto case's body and every
    /// external module up front. A missing body is fatal.
    pub fn new(suite: SuiteFile, registry: &CaseRegistry, host: Host) -> Result<Self> {
        let modules = registry.resolve_modules(&suite.external_lib)?;

        let mut queue = VecDeque::with_capacity(suite.cases.len());
        for case in suite.cases.iter() {
            let spec = TestCaseSpec::from(case);
            let body = match (spec.kind, spec.path.as_deref()) {
                (CaseKind::Manual, _) => None,
                (CaseKind::Auto, Some(path)) => match registry.resolve(path) {
                    Some(body) => Some(body),
                    None => {
                        error!(case = %spec.full_name, %path, "automation case not implemented");
                        return Err(DevbatError::CaseNotImplemented {
                            case: spec.name,
                            path: path.to_string(),
                        });
                    }
                },
                (CaseKind::Auto, None) => {
                    return Err(DevbatError::CaseNotImplemented {
                        case: spec.name,
                        path: String::new(),
                    });
                }
            };
            queue.push_back(CaseExecutor::new(spec, body));
        }

        let timings = DeviceTimings::from(&suite.timing);
        let result = SuiteResult::new(queue.len());
        info!(
            suite = %suite.suite_name,
            device = %suite.test_device.name,
            cases = queue.len(),
            "test suite loaded"
        );

        Ok(Self {
            suite,
            queue,
            modules,
            device: None,
            result,
            host,
            timings,
        })
    }

    pub fn name(&self) -> &str {
        &self.suite.suite_name
    }

    pub fn result(&self) -> &SuiteResult {
        &self.result
    }

    pub fn device(&self) -> Option<&DeviceLink> {
        self.device.as_ref()
    }

    /// Cases still waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Use `device` instead of running discovery in [`SuiteEngine::run`].
    pub fn attach_device(&mut self, device: DeviceLink) {
        self.device = Some(device);
    }

    /// Find and connect the device described by `selector`.
    ///
    /// `serial` takes priority over `product`; with neither, any online
    /// device qualifies. The first match is used. `Ok(None)` if nothing
    /// matched; connection failures are errors.
    pub fn detect_device(&self, selector: &DeviceSelector) -> Result<Option<DeviceLink>> {
        let bridge = AdbBridge::new(&self.host);
        let devices =
            bridge.find_devices(selector.serial.as_deref(), selector.product.as_deref());

        let Some(first) = devices.first() else {
            error!(
                serial = ?selector.serial,
                product = ?selector.product,
                "did not find any matching device"
            );
            return Ok(None);
        };
        info!(count = devices.len(), serial = %first, "got devices, will use first one");

        let mut link = DeviceLink::new(Some(first.clone()), &selector.name, self.host.clone())
            .with_timings(self.timings.clone());
        link.connect(self.timings.connect_timeout)?;
        Ok(Some(link))
    }

    /// Run every queued case in declaration order.
    ///
    /// Fails with [`DevbatError::SuiteFailToStart`] if no device can be
    /// found; nothing runs in that case. Device trouble after that only
    /// affects individual cases.
    pub fn run(&mut self) -> Result<&SuiteResult> {
        info!(suite = %self.suite.suite_name, "start running test suite");
        if self.device.is_none() {
            self.device = self.detect_device(&self.suite.test_device)?;
        }
        let Some(mut device) = self.device.take() else {
            error!(device = %self.suite.test_device.name, "available device not found, stop running");
            return Err(DevbatError::SuiteFailToStart(format!(
                "no {} device found",
                self.suite.test_device.name
            )));
        };

        while let Some(case) = self.queue.pop_front() {
            info!(remaining = self.queue.len() + 1, "cases to be executed");
            let result = self.dispatch(&case, &mut device);
            self.handle_case_result(result);
        }
        self.device = Some(device);

        let count = &self.result.count;
        info!(total = count.total, "all cases of suite have been executed");
        info!("Total pass: {}", count.pass);
        info!("Total fail: {}", count.fail);
        info!("Total block: {}", count.block);
        info!("Total empty: {}", count.empty);
        Ok(&self.result)
    }

    fn dispatch(&self, case: &CaseExecutor, device: &mut DeviceLink) -> CaseResult {
        let spec = case.spec();
        info!(case = %spec.name, "start executing case");

        if spec.kind == CaseKind::Auto && !device.check_alive() {
            error!(serial = %device.serial_label(), case = %spec.name, "device not alive, skip current case");
            return CaseResult::blocked(spec, device.serial_label());
        }
        case.execute(device, self.suite.flash_file.as_ref(), &self.modules)
    }

    /// Merge one case result into the aggregate.
    pub fn handle_case_result(&mut self, result: CaseResult) {
        self.result.record(result);
    }

    pub fn report(&self) -> SuiteReport {
        let selector = &self.suite.test_device;
        let serial = self
            .device
            .as_ref()
            .map(|d| d.serial_label().to_string())
            .or_else(|| selector.serial.clone())
            .unwrap_or_else(|| "unknown".to_string());

        SuiteReport {
            name: self.suite.suite_name.clone(),
            device: DeviceIdentity {
                serial,
                kind: selector.name.clone(),
                product_name: selector.product.clone(),
            },
            result: self.result.count,
            cases: self.result.cases.clone(),
        }
    }

    /// Write the report into `dir`; see [`report::write_report`].
    pub fn generate_report(&self, dir: &Path, format: &str) -> Result<Option<PathBuf>> {
        report::write_report(&self.report(), dir, format)
    }

    pub fn generate_lava_output(&self) {
        report::emit_lava_results(self.host.runner.as_ref(), &self.result.cases);
    }
}

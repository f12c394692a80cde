// src/engine/case.rs

//! Single test case execution.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{CaseConfig, FlashSpec};
use crate::device::DeviceLink;
use crate::engine::CaseResult;
use crate::engine::registry::ExtraModules;
use crate::types::{CaseKind, Outcome};

/// Pause between two attempts of a failing case.
pub const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// A test body.
///
/// Bodies report through the context: `case_pass` / `case_fail` set the
/// outcome and append to logs and errors. Returning `Err` (or panicking)
/// marks the attempt failed with the error text appended.
pub trait TestCase: Send + Sync {
    fn run(&self, ctx: &mut CaseContext<'_>) -> anyhow::Result<()>;
}

/// Adapter turning a closure into a [`TestCase`].
pub struct FnCase<F>(pub F);

impl<F> TestCase for FnCase<F>
where
    F: Fn(&mut CaseContext<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self, ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
        (self.0)(ctx)
    }
}

/// Logger handle owned by one case; every line carries the case name.
#[derive(Debug, Clone)]
pub struct CaseLogger {
    case: String,
}

impl CaseLogger {
    pub fn new(case: impl Into<String>) -> Self {
        Self { case: case.into() }
    }

    pub fn debug(&self, msg: impl fmt::Display) {
        debug!(target: "devbat::case", case = %self.case, "{}", msg);
    }

    pub fn info(&self, msg: impl fmt::Display) {
        info!(target: "devbat::case", case = %self.case, "{}", msg);
    }

    pub fn warn(&self, msg: impl fmt::Display) {
        warn!(target: "devbat::case", case = %self.case, "{}", msg);
    }

    pub fn error(&self, msg: impl fmt::Display) {
        error!(target: "devbat::case", case = %self.case, "{}", msg);
    }
}

/// Everything a case body gets to work with during one attempt.
pub struct CaseContext<'a> {
    pub device: &'a mut DeviceLink,
    pub logger: &'a CaseLogger,
    /// Accumulator for this attempt; starts out `empty`.
    pub result: CaseResult,
    /// The suite's `[flash_file]`, if any.
    pub flash: Option<&'a FlashSpec>,
    pub modules: &'a ExtraModules,
}

impl CaseContext<'_> {
    pub fn case_pass(&mut self, msg: impl Into<String>) {
        self.case_pass_with_logs(msg, Vec::new());
    }

    /// Mark passed, keeping `logs` and then `msg` in the result logs.
    pub fn case_pass_with_logs(&mut self, msg: impl Into<String>, logs: Vec<String>) {
        let msg = msg.into();
        for line in logs.iter() {
            self.logger.info(line);
        }
        self.result.logs.extend(logs);
        self.logger.info(format_args!("Case pass > {msg}"));
        self.result.logs.push(msg);
        self.result.outcome = Outcome::Pass;
    }

    pub fn case_fail(&mut self, msg: impl Into<String>) {
        self.case_fail_with_logs(msg, Vec::new());
    }

    /// Mark failed, keeping `logs` in the result logs and `msg` in errors.
    pub fn case_fail_with_logs(&mut self, msg: impl Into<String>, logs: Vec<String>) {
        let msg = msg.into();
        for line in logs.iter() {
            self.logger.error(line);
        }
        self.result.logs.extend(logs);
        self.logger.error(format_args!("Case fail > {msg}"));
        self.result.errors.push(msg);
        self.result.outcome = Outcome::Fail;
    }

    /// Append a plain log line without touching the outcome.
    pub fn log(&mut self, line: impl Into<String>) {
        self.result.logs.push(line.into());
    }

    /// Look up an extra module by name and concrete type.
    pub fn module<T: Any>(&self, name: &str) -> Option<&T> {
        self.modules
            .get(name)
            .and_then(|m| m.as_any().downcast_ref::<T>())
    }
}

/// Immutable description of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseSpec {
    pub name: String,
    pub full_name: String,
    pub kind: CaseKind,
    /// Advisory: overruns are logged, never cut off.
    pub timeout: Duration,
    pub retry_count: u32,
    pub path: Option<String>,
}

impl From<&CaseConfig> for TestCaseSpec {
    fn from(cfg: &CaseConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            full_name: cfg.display_name().to_string(),
            kind: cfg.kind,
            timeout: cfg.effective_timeout(),
            retry_count: cfg.effective_retry_count(),
            path: cfg.path.clone(),
        }
    }
}

/// Runs one case to a terminal result.
pub struct CaseExecutor {
    spec: TestCaseSpec,
    body: Option<Arc<dyn TestCase>>,
    logger: CaseLogger,
}

impl fmt::Debug for CaseExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseExecutor")
            .field("spec", &self.spec)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

impl CaseExecutor {
    /// `body` may be `None` only for manual cases; an auto case without a
    /// body fails every run.
    pub fn new(spec: TestCaseSpec, body: Option<Arc<dyn TestCase>>) -> Self {
        let logger = CaseLogger::new(format!("TC_{}", spec.name));
        Self { spec, body, logger }
    }

    pub fn spec(&self) -> &TestCaseSpec {
        &self.spec
    }

    pub fn logger(&self) -> &CaseLogger {
        &self.logger
    }

    /// Run the case: manual cases resolve to `empty` immediately; auto cases
    /// run up to `retry_count` attempts and keep the last one.
    pub fn execute(
        &self,
        device: &mut DeviceLink,
        flash: Option<&FlashSpec>,
        modules: &ExtraModules,
    ) -> CaseResult {
        let body = match (self.spec.kind, self.body.as_ref()) {
            (CaseKind::Manual, _) => return self.manual_result(),
            (CaseKind::Auto, Some(body)) => Arc::clone(body),
            (CaseKind::Auto, None) => return self.missing_body_result(),
        };

        let attempts = self.spec.retry_count.max(1);
        let mut attempt = 1;
        info!(case = %self.spec.full_name, round = attempt, "start to run case");
        let mut result = self.execute_once(body.as_ref(), device, flash, modules);

        while result.outcome != Outcome::Pass && attempt < attempts {
            warn!(
                case = %self.spec.full_name,
                retries_left = attempts - attempt,
                "case failed, re-running"
            );
            device.sleep(RETRY_PAUSE);
            attempt += 1;
            info!(case = %self.spec.full_name, round = attempt, "start to run case");
            result = self.execute_once(body.as_ref(), device, flash, modules);
        }

        info!(case = %self.spec.full_name, result = %result.outcome, attempts = attempt, "case finished");
        result
    }

    fn execute_once(
        &self,
        body: &dyn TestCase,
        device: &mut DeviceLink,
        flash: Option<&FlashSpec>,
        modules: &ExtraModules,
    ) -> CaseResult {
        let clock = device.clock();
        let started = clock.now();

        let mut ctx = CaseContext {
            device,
            logger: &self.logger,
            result: CaseResult::new(&self.spec.name, &self.spec.full_name),
            flash,
            modules,
        };
        let run = panic::catch_unwind(AssertUnwindSafe(|| body.run(&mut ctx)));
        let mut result = ctx.result;

        match run {
            Ok(Ok(())) => {
                debug!(
                    case = %self.spec.full_name,
                    result = %result.outcome,
                    errors = result.errors.len(),
                    logs = result.logs.len(),
                    "case body returned"
                );
            }
            Ok(Err(err)) => {
                error!(case = %self.spec.full_name, error = %err, "error raised in case execution, saved into errors");
                result.outcome = Outcome::Fail;
                result.errors.push(format!("{err:#}"));
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                error!(case = %self.spec.full_name, panic = %msg, "case body panicked, saved into errors");
                result.outcome = Outcome::Fail;
                result.errors.push(format!("panicked: {msg}"));
            }
        }

        let elapsed = clock.elapsed_since(started);
        if elapsed > self.spec.timeout {
            warn!(
                case = %self.spec.full_name,
                elapsed_secs = elapsed.as_secs(),
                timeout_secs = self.spec.timeout.as_secs(),
                "case exceeded its advisory timeout"
            );
        }

        result.logs.push(format!(
            "Case {} finished with result {}.",
            self.spec.full_name, result.outcome
        ));
        result
    }

    fn manual_result(&self) -> CaseResult {
        info!(case = %self.spec.full_name, "manual case, set result to empty");
        CaseResult {
            logs: vec![format!(
                "Case {} is manual and will be skipped, result set to empty",
                self.spec.full_name
            )],
            ..CaseResult::new(&self.spec.name, &self.spec.full_name)
        }
    }

    fn missing_body_result(&self) -> CaseResult {
        error!(case = %self.spec.full_name, "automation case has no body");
        CaseResult {
            outcome: Outcome::Fail,
            errors: vec![format!("Case {} is not implemented", self.spec.full_name)],
            ..CaseResult::new(&self.spec.name, &self.spec.full_name)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

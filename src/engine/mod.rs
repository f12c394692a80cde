// src/engine/mod.rs

//! Suite execution engine.
//!
//! - [`case`] runs one test case to a terminal [`CaseResult`], applying the
//!   retry policy.
//! - [`registry`] maps case paths to [`case::TestCase`] implementations and
//!   holds extra modules exposed to case bodies.
//! - [`suite`] owns the case queue, device acquisition, dispatch and
//!   aggregation.

pub mod case;
pub mod registry;
pub mod suite;

use serde::{Deserialize, Serialize};

use crate::types::Outcome;

pub use case::{CaseContext, CaseExecutor, CaseLogger, FnCase, TestCase, TestCaseSpec};
pub use registry::{CaseRegistry, ExtraModule, ExtraModules};
pub use suite::SuiteEngine;

/// Result of one case (of its final attempt, once the suite has it).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    pub full_name: String,
    #[serde(rename = "result")]
    pub outcome: Outcome,
    pub logs: Vec<String>,
    pub errors: Vec<String>,
}

impl CaseResult {
    /// Fresh result: outcome `empty`, no logs, no errors.
    pub fn new(name: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    /// Result for a case skipped because the device was offline.
    pub fn blocked(spec: &TestCaseSpec, serial: &str) -> Self {
        Self {
            outcome: Outcome::Block,
            errors: vec![format!("Device {serial} offline.")],
            ..Self::new(&spec.name, &spec.full_name)
        }
    }
}

/// Aggregate counters of a suite run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuiteCounts {
    pub pass: usize,
    pub fail: usize,
    pub empty: usize,
    pub block: usize,
    /// Number of cases in the suite; fixed at construction.
    pub total: usize,
}

impl SuiteCounts {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Pass => self.pass += 1,
            Outcome::Fail => self.fail += 1,
            Outcome::Empty => self.empty += 1,
            Outcome::Block => self.block += 1,
        }
    }

    /// Cases that reached an outcome so far.
    pub fn completed(&self) -> usize {
        self.pass + self.fail + self.empty + self.block
    }
}

/// Counters plus every case result, in completion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuiteResult {
    pub count: SuiteCounts,
    pub cases: Vec<CaseResult>,
}

impl SuiteResult {
    pub fn new(total: usize) -> Self {
        Self {
            count: SuiteCounts::new(total),
            cases: Vec::with_capacity(total),
        }
    }

    pub fn record(&mut self, result: CaseResult) {
        self.count.record(result.outcome);
        self.cases.push(result);
    }
}

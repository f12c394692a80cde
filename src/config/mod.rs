// src/config/mod.rs

//! Suite file loading and validation for devbat.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a suite file from disk (`loader.rs`).
//! - Validate names, case paths and retry counts (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    CaseConfig, Credentials, DeviceSelector, FlashSpec, ModuleRef, RawSuiteFile, ReportSection,
    SuiteFile, TimingSection,
};

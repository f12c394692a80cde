// src/lib.rs

pub mod cases;
pub mod cli;
pub mod config;
pub mod device;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::SuiteFile;
use crate::config::loader::load_and_validate;
use crate::engine::{CaseRegistry, SuiteEngine};
use crate::exec::Host;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - suite loading and validation
/// - case body resolution against the built-in registry
/// - device discovery and the suite run
/// - report file and (optionally) LAVA result output
pub fn run(args: CliArgs) -> Result<()> {
    let suite_path = PathBuf::from(&args.test_suite);
    let suite = load_and_validate(&suite_path)?;

    if args.dry_run {
        print_dry_run(&suite);
        return Ok(());
    }

    let report_dir = args
        .report_dir
        .clone()
        .unwrap_or_else(|| suite.report.dir.clone());
    let report_format = args
        .report_format
        .clone()
        .unwrap_or_else(|| suite.report.format.clone());

    let registry = CaseRegistry::with_builtin_cases();
    let host = Host::system()?;
    let mut engine = SuiteEngine::new(suite, &registry, host)?;

    engine.run()?;

    if let Some(path) = engine.generate_report(&report_dir, &report_format)? {
        info!(path = %path.display(), "suite report saved");
    }
    if args.lava {
        engine.generate_lava_output();
    }
    Ok(())
}

/// Print the validated suite without touching any device.
fn print_dry_run(suite: &SuiteFile) {
    println!("devbat dry-run");
    println!("  suite_name = {}", suite.suite_name);
    println!("  test_device.name = {}", suite.test_device.name);
    if let Some(ref serial) = suite.test_device.serial {
        println!("  test_device.serial = {serial}");
    }
    if let Some(ref product) = suite.test_device.product {
        println!("  test_device.product = {product}");
    }
    if let Some(ref flash) = suite.flash_file {
        println!("  flash_file = {} ({})", flash.image, flash.mode);
        for command in flash.commands.iter() {
            println!("      {command}");
        }
    }
    for module in suite.external_lib.iter() {
        println!("  external_lib = {}", module.name);
    }
    println!();

    println!("cases ({}):", suite.cases.len());
    for case in suite.cases.iter() {
        println!("  - {} ({})", case.name, case.display_name());
        println!("      type: {:?}", case.kind);
        if let Some(ref path) = case.path {
            println!("      path: {path}");
        }
        println!("      retry_count: {}", case.effective_retry_count());
        println!("      timeout: {}s", case.effective_timeout().as_secs());
    }

    debug!("dry-run complete (no device access)");
}

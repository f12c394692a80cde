// tests/suite_engine.rs

use std::error::Error;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use devbat::device::DeviceLink;
use devbat::engine::{CaseRegistry, ExtraModule, SuiteEngine};
use devbat::errors::DevbatError;
use devbat::report::SuiteReport;
use devbat::types::Outcome;
use devbat_test_utils::builders::{CaseBuilder, SuiteBuilder};
use devbat_test_utils::{FakeAdb, FakeDevice, FakeHost, init_tracing};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

fn registry() -> CaseRegistry {
    let mut registry = CaseRegistry::new();
    registry
        .register_fn("always_pass", |ctx| {
            ctx.case_pass("fine");
            Ok(())
        })
        .register_fn("always_fail", |ctx| {
            ctx.case_fail("broken");
            Ok(())
        });
    registry
}

fn board() -> FakeHost {
    init_tracing();
    FakeHost::new(FakeAdb::new().with_device(FakeDevice::online("A1", "hikey960")))
}

#[test]
fn manual_pass_fail_scenario_counts() -> TestResult {
    let host = board();
    let suite = SuiteBuilder::new("scenario")
        .with_serial("A1")
        .with_case(CaseBuilder::manual("look").build())
        .with_case(CaseBuilder::auto("good", "test/always_pass.py").build())
        .with_case(CaseBuilder::auto("bad", "always_fail").retry_count(1).build())
        .build();
    let mut engine = SuiteEngine::new(suite, &registry(), host.host())?;
    assert_eq!(engine.pending(), 3);

    let result = engine.run()?;

    assert_eq!(result.count.pass, 1);
    assert_eq!(result.count.fail, 1);
    assert_eq!(result.count.empty, 1);
    assert_eq!(result.count.block, 0);
    assert_eq!(result.count.total, 3);
    let order: Vec<_> = result.cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(order, vec!["look", "good", "bad"]);
    assert_eq!(result.cases[2].errors, vec!["broken"]);
    assert_eq!(engine.pending(), 0);
    assert!(engine.device().is_some_and(|d| d.is_connected()));
    Ok(())
}

#[test]
fn device_lost_mid_suite_blocks_later_cases() -> TestResult {
    let host = board();
    let adb = host.adb.clone();
    let spy_calls = Arc::new(AtomicUsize::new(0));
    let spy = Arc::clone(&spy_calls);

    let mut registry = CaseRegistry::new();
    registry
        .register_fn("pull_cable", move |ctx| {
            ctx.case_pass("done, unplugging");
            adb.take_offline("A1");
            Ok(())
        })
        .register_fn("spy", move |ctx| {
            spy.fetch_add(1, Ordering::SeqCst);
            ctx.case_pass("should not run");
            Ok(())
        });

    let suite = SuiteBuilder::new("unplug")
        .with_serial("A1")
        .with_case(CaseBuilder::auto("first", "pull_cable").build())
        .with_case(CaseBuilder::auto("second", "spy").build())
        .build();
    let mut engine = SuiteEngine::new(suite, &registry, host.host())?;

    let result = engine.run()?;

    assert_eq!(result.count.pass, 1);
    assert_eq!(result.count.block, 1);
    assert_eq!(result.count.total, 2);
    assert_eq!(spy_calls.load(Ordering::SeqCst), 0);
    let blocked = &result.cases[1];
    assert_eq!(blocked.outcome, Outcome::Block);
    assert_eq!(blocked.errors, vec!["Device A1 offline."]);
    Ok(())
}

#[test]
fn manual_case_resolves_empty_even_when_device_is_gone() -> TestResult {
    let host = board();
    let suite = SuiteBuilder::new("manual")
        .with_serial("A1")
        .with_case(CaseBuilder::manual("look").build())
        .build();
    let mut engine = SuiteEngine::new(suite, &registry(), host.host())?;

    let mut device = DeviceLink::new(Some("A1".to_string()), "hikey960", host.host());
    device.connect(std::time::Duration::from_secs(1))?;
    engine.attach_device(device);
    host.adb.take_offline("A1");

    let result = engine.run()?;
    assert_eq!(result.count.empty, 1);
    assert_eq!(result.count.block, 0);
    Ok(())
}

#[test]
fn missing_device_fails_to_start_without_running_cases() -> TestResult {
    init_tracing();
    let host = FakeHost::new(FakeAdb::new());
    let spy_calls = Arc::new(AtomicUsize::new(0));
    let spy = Arc::clone(&spy_calls);
    let mut registry = CaseRegistry::new();
    registry.register_fn("spy", move |_ctx| {
        spy.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let suite = SuiteBuilder::new("nodevice")
        .with_product("hikey960")
        .with_case(CaseBuilder::auto("only", "spy").build())
        .build();
    let mut engine = SuiteEngine::new(suite, &registry, host.host())?;

    let err = engine.run().unwrap_err();

    assert!(matches!(err, DevbatError::SuiteFailToStart(_)));
    assert_eq!(spy_calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.result().count.completed(), 0);
    Ok(())
}

#[test]
fn device_is_picked_by_product() -> TestResult {
    init_tracing();
    let host = FakeHost::new(
        FakeAdb::new()
            .with_device(FakeDevice::online("A1", "db845c"))
            .with_device(FakeDevice::online("B2", "hikey960")),
    );
    let suite = SuiteBuilder::new("product").with_product("hikey").build();
    let engine = SuiteEngine::new(suite.clone(), &registry(), host.host())?;

    let device = engine
        .detect_device(&suite.test_device)?
        .expect("hikey board found");

    assert_eq!(device.serial(), Some("B2"));
    assert!(device.is_connected());
    Ok(())
}

#[test]
fn unknown_case_path_is_not_implemented() {
    let host = board();
    let suite = SuiteBuilder::new("missing")
        .with_case(CaseBuilder::auto("ghost", "test/ghost.py").build())
        .build();

    let err = SuiteEngine::new(suite, &registry(), host.host()).unwrap_err();

    match err {
        DevbatError::CaseNotImplemented { case, path } => {
            assert_eq!(case, "ghost");
            assert_eq!(path, "test/ghost.py");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[derive(Debug)]
struct Helper;

impl ExtraModule for Helper {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[test]
fn external_modules_resolve_by_name() -> TestResult {
    let host = board();
    let mut reg = registry();
    reg.register_module("helper", Helper);

    let ok = SuiteBuilder::new("modules").with_module("helper").build();
    SuiteEngine::new(ok, &reg, host.host())?;

    let bad = SuiteBuilder::new("modules").with_module("nope").build();
    let err = SuiteEngine::new(bad, &reg, host.host()).unwrap_err();
    assert!(matches!(err, DevbatError::ConfigError(msg) if msg.contains("nope")));
    Ok(())
}

fn finished_engine(host: &FakeHost) -> Result<SuiteEngine, Box<dyn Error>> {
    let suite = SuiteBuilder::new("nightly")
        .with_serial("A1")
        .with_product("hikey960")
        .with_case(CaseBuilder::auto("good", "always_pass").build())
        .with_case(CaseBuilder::auto("bad", "always_fail").retry_count(1).build())
        .with_case(CaseBuilder::manual("look").build())
        .build();
    let mut engine = SuiteEngine::new(suite, &registry(), host.host())?;
    engine.run()?;
    Ok(engine)
}

#[test]
fn toml_report_is_written_and_readable() -> TestResult {
    let host = board();
    let engine = finished_engine(&host)?;
    let dir = TempDir::new()?;
    let out_dir = dir.path().join("results");

    let path = engine
        .generate_report(&out_dir, "toml")?
        .expect("toml is supported");

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(name.ends_with("_nightly.toml"), "unexpected name {name}");
    let report: SuiteReport = toml::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(report.name, "nightly");
    assert_eq!(report.device.serial, "A1");
    assert_eq!(report.device.kind, "fake-board");
    assert_eq!(report.device.product_name.as_deref(), Some("hikey960"));
    assert_eq!(report.result.total, 3);
    assert_eq!(report.result.pass, 1);
    assert_eq!(report.cases.len(), 3);
    assert_eq!(report.cases[1].outcome, Outcome::Fail);
    Ok(())
}

#[test]
fn json_report_uses_result_key() -> TestResult {
    let host = board();
    let engine = finished_engine(&host)?;
    let dir = TempDir::new()?;

    let path = engine
        .generate_report(dir.path(), "json")?
        .expect("json is supported");

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(value["cases"][0]["result"], "pass");
    assert_eq!(value["result"]["fail"], 1);
    Ok(())
}

#[test]
fn unsupported_report_format_writes_nothing() -> TestResult {
    let host = board();
    let engine = finished_engine(&host)?;
    let dir = TempDir::new()?;

    assert_eq!(engine.generate_report(dir.path(), "yaml")?, None);
    assert_eq!(fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn lava_results_map_outcomes() -> TestResult {
    let host = board();
    let engine = finished_engine(&host)?;

    engine.generate_lava_output();

    let lava: Vec<_> = host
        .adb
        .invocations_matching("lava-test-case")
        .into_iter()
        .map(|inv| inv.args_line())
        .collect();
    assert_eq!(
        lava,
        vec![
            "good --result pass",
            "bad --result fail",
            "look --result unknown",
        ]
    );
    Ok(())
}

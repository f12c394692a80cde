// tests/discovery.rs

use devbat::device::AdbBridge;
use devbat::device::discovery::{adb_prefix, fastboot_prefix, parse_device_list};
use devbat::errors::DevbatError;
use devbat::exec::runner::split_output;
use devbat::types::DeviceStatus;
use devbat_test_utils::{FakeAdb, FakeDevice, FakeHost, init_tracing};

fn lines(text: &str) -> Vec<String> {
    split_output(text)
}

#[test]
fn parses_adb_devices_listing_by_status() {
    let out = lines("List of devices attached\nA1\tdevice\nB2\toffline\nC3\tunauthorized\n\n");

    assert_eq!(parse_device_list(&out, DeviceStatus::Online), vec!["A1"]);
    assert_eq!(parse_device_list(&out, DeviceStatus::Offline), vec!["B2"]);
    assert_eq!(parse_device_list(&out, DeviceStatus::All), vec!["A1", "B2"]);
}

#[test]
fn empty_listing_yields_no_devices() {
    let out = lines("List of devices attached\n");
    assert!(parse_device_list(&out, DeviceStatus::All).is_empty());
}

#[test]
fn split_output_strips_carriage_returns_and_one_trailing_line() {
    assert_eq!(split_output("a\r\nb\r\n"), vec!["a", "b"]);
    assert_eq!(split_output("a\n\n"), vec!["a", ""]);
    assert!(split_output("").is_empty());
}

#[test]
fn tool_prefixes_include_serial_when_known() {
    assert_eq!(adb_prefix(Some("X")), "adb -s X");
    assert_eq!(adb_prefix(None), "adb");
    assert_eq!(fastboot_prefix(Some("X")), "fastboot -s X");
}

fn bridge(adb: &FakeAdb) -> AdbBridge {
    AdbBridge::new(&FakeHost::new(adb.clone()).host())
}

#[test]
fn server_is_started_only_when_not_listening() {
    init_tracing();
    let adb = FakeAdb::new();
    let bridge = bridge(&adb);

    assert!(!bridge.server_alive());
    bridge.ensure_server().unwrap();
    assert!(bridge.server_alive());

    bridge.ensure_server().unwrap();
    assert_eq!(adb.count_matching("adb start-server"), 1);
}

#[test]
fn failed_server_start_is_an_adb_server_error() {
    init_tracing();
    let adb = FakeAdb::new().fail_on("start-server");

    let err = bridge(&adb).ensure_server().unwrap_err();

    assert!(matches!(err, DevbatError::AdbServer(_)), "got {err:?}");
    assert!(!adb.is_server_running());
}

#[test]
fn kill_server_stops_a_running_server() {
    init_tracing();
    let adb = FakeAdb::new().server_running(true);
    let bridge = bridge(&adb);

    bridge.kill_server().unwrap();

    assert!(!bridge.server_alive());
    assert_eq!(adb.count_matching("adb kill-server"), 1);
}

#[test]
fn failed_server_kill_is_an_adb_server_error() {
    init_tracing();
    let adb = FakeAdb::new().server_running(true).fail_on("kill-server");

    let err = bridge(&adb).kill_server().unwrap_err();

    assert!(matches!(err, DevbatError::AdbServer(_)), "got {err:?}");
    assert!(adb.is_server_running());
}

#[test]
fn serial_takes_priority_over_product() {
    init_tracing();
    let adb = FakeAdb::new()
        .with_device(FakeDevice::online("A1", "hikey960"))
        .with_device(FakeDevice::online("B2", "db845c"));

    let found = bridge(&adb).find_devices(Some("B2"), Some("hikey"));
    assert_eq!(found, vec!["B2"]);
    assert_eq!(adb.count_matching("getprop ro.product.name"), 0);
}

#[test]
fn unknown_serial_finds_nothing() {
    init_tracing();
    let adb = FakeAdb::new().with_device(FakeDevice::online("A1", "hikey960"));
    assert!(bridge(&adb).find_devices(Some("nope"), None).is_empty());
}

#[test]
fn product_matches_by_substring() {
    init_tracing();
    let adb = FakeAdb::new()
        .with_device(FakeDevice::online("A1", "hikey960"))
        .with_device(FakeDevice::online("B2", "db845c"))
        .with_device(FakeDevice::online("C3", "hikey970"));

    let found = bridge(&adb).find_devices(None, Some("hikey"));
    assert_eq!(found, vec!["A1", "C3"]);
}

#[test]
fn no_selector_returns_all_online_devices() {
    init_tracing();
    let adb = FakeAdb::new()
        .with_device(FakeDevice::online("A1", "p"))
        .with_device(FakeDevice::offline("B2", "p"))
        .with_device(FakeDevice::online("C3", "p"));

    assert_eq!(bridge(&adb).find_devices(None, None), vec!["A1", "C3"]);
}

#[test]
fn liveness_for_any_and_specific_serial() {
    init_tracing();
    let adb = FakeAdb::new().with_device(FakeDevice::online("A1", "p"));
    let bridge = bridge(&adb);

    assert!(bridge.is_online(None));
    assert!(bridge.is_online(Some("A1")));
    assert!(!bridge.is_online(Some("B2")));

    adb.take_offline("A1");
    assert!(!bridge.is_online(None));
}

#[test]
fn fastboot_devices_lists_first_column() {
    init_tracing();
    let adb = FakeAdb::new().with_device(FakeDevice {
        in_fastboot: true,
        online: false,
        ..FakeDevice::online("F1", "p")
    });
    assert_eq!(bridge(&adb).fastboot_devices(), vec!["F1"]);
}

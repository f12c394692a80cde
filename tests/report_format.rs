// tests/report_format.rs

use std::str::FromStr;

use chrono::{Local, TimeZone};
use devbat::engine::CaseResult;
use devbat::report::{lava_invocation, report_file_name};
use devbat::types::{DeviceStatus, Outcome, ReportFormat};

#[test]
fn report_format_parsing() {
    assert_eq!(ReportFormat::from_str("toml"), Ok(ReportFormat::Toml));
    assert_eq!(ReportFormat::from_str(" JSON "), Ok(ReportFormat::Json));
    assert!(ReportFormat::from_str("yaml").is_err());
}

#[test]
fn report_file_name_is_timestamped() {
    let at = Local
        .with_ymd_and_hms(2024, 3, 9, 7, 5, 1)
        .single()
        .expect("unambiguous local time");
    assert_eq!(
        report_file_name(&at, "smoke", ReportFormat::Json),
        "2024-03-09-07-05-01_smoke.json"
    );
}

#[test]
fn lava_keywords_per_outcome() {
    assert_eq!(Outcome::Pass.lava_result(), "pass");
    assert_eq!(Outcome::Fail.lava_result(), "fail");
    assert_eq!(Outcome::Block.lava_result(), "skip");
    assert_eq!(Outcome::Empty.lava_result(), "unknown");

    let case = CaseResult {
        outcome: Outcome::Block,
        ..CaseResult::new("wifi", "Wi-Fi scan")
    };
    assert_eq!(lava_invocation(&case).to_string(), "lava-test-case wifi --result skip");
}

#[test]
fn device_status_filter() {
    assert!(DeviceStatus::Online.matches("device"));
    assert!(!DeviceStatus::Online.matches("offline"));
    assert!(DeviceStatus::All.matches("offline"));
    assert!(!DeviceStatus::All.matches("unauthorized"));
}

// tests/builtin_cases.rs

use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use devbat::cases::VideoPlayback;
use devbat::engine::{CaseRegistry, CaseResult, SuiteEngine};
use devbat::types::Outcome;
use devbat_test_utils::builders::{CaseBuilder, SuiteBuilder};
use devbat_test_utils::{FakeAdb, FakeDevice, FakeHost, init_tracing};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

fn run_single(host: &FakeHost, builder: SuiteBuilder, path: &str) -> Result<CaseResult, Box<dyn Error>> {
    let suite = builder
        .with_serial("A1")
        .with_case(CaseBuilder::auto("tc", path).retry_count(1).build())
        .build();
    let registry = CaseRegistry::with_builtin_cases();
    let mut engine = SuiteEngine::new(suite, &registry, host.host())?;
    let result = engine.run()?;
    Ok(result.cases[0].clone())
}

fn run_video(host: &FakeHost, body: VideoPlayback) -> Result<CaseResult, Box<dyn Error>> {
    let suite = SuiteBuilder::new("video")
        .with_serial("A1")
        .with_case(CaseBuilder::auto("tc", "video_playback").retry_count(1).build())
        .build();
    let mut registry = CaseRegistry::new();
    registry.register("video_playback", body);
    let mut engine = SuiteEngine::new(suite, &registry, host.host())?;
    let result = engine.run()?;
    Ok(result.cases[0].clone())
}

/// Sample clip in `dir`, recording pulled back into `dir` with
/// `recorded_bytes` bytes (none if `None`).
fn video_body(dir: &Path, recorded_bytes: Option<usize>) -> Result<VideoPlayback, Box<dyn Error>> {
    let sample = dir.join("clip.mp4");
    fs::write(&sample, b"h263")?;
    if let Some(n) = recorded_bytes {
        fs::write(dir.join("video_record.mp4"), vec![0u8; n])?;
    }
    Ok(VideoPlayback {
        sample,
        local_dir: dir.to_path_buf(),
        min_size: 1024,
        ..VideoPlayback::default()
    })
}

fn board(adb: FakeAdb) -> FakeHost {
    init_tracing();
    FakeHost::new(adb.with_device(FakeDevice::online("A1", "hikey960")))
}

#[test]
fn builtin_registry_knows_every_sample_case() {
    let registry = CaseRegistry::with_builtin_cases();
    assert_eq!(
        registry.case_keys(),
        vec![
            "audio_playback_check",
            "boot_to_ui",
            "bt_test",
            "eth_test",
            "reboot_test",
            "video_playback",
        ]
    );
    assert!(registry.resolve("test/bt_test.py").is_some());
}

#[test]
fn audio_check_passes_with_sound_cards() -> TestResult {
    let host = board(FakeAdb::new().shell_response(
        "alsa_aplay -l",
        0,
        &[
            "**** List of PLAYBACK Hardware Devices ****",
            "card 0: hi3660 [hi3660], device 0: hifi",
        ],
    ));

    let result = run_single(&host, SuiteBuilder::new("audio"), "test/audio_playback_check.py")?;

    assert_eq!(result.outcome, Outcome::Pass);
    assert_eq!(result.logs[0], "card 0: hi3660 [hi3660], device 0: hifi");
    Ok(())
}

#[test]
fn audio_check_fails_without_sound_cards() -> TestResult {
    let host = board(FakeAdb::new().shell_response("alsa_aplay -l", 0, &[]));

    let result = run_single(&host, SuiteBuilder::new("audio"), "audio_playback_check")?;

    assert_eq!(result.outcome, Outcome::Fail);
    assert!(result.errors[0].contains("no soundcards found"));
    Ok(())
}

#[test]
fn audio_check_fails_when_listing_fails() -> TestResult {
    let host = board(FakeAdb::new().shell_response("alsa_aplay -l", 1, &["not found"]));

    let result = run_single(&host, SuiteBuilder::new("audio"), "audio_playback_check")?;

    assert_eq!(result.outcome, Outcome::Fail);
    assert_eq!(result.errors, vec!["List command failed."]);
    assert!(result.logs.contains(&"not found".to_string()));
    Ok(())
}

#[test]
fn bluetooth_toggle_enables_then_disables() -> TestResult {
    let host = board(FakeAdb::new().shell_response(
        "dumpsys bluetooth_manager",
        0,
        &["Bluetooth Status", "  enabled: true"],
    ));

    let result = run_single(&host, SuiteBuilder::new("bt"), "bt_test")?;

    assert_eq!(result.outcome, Outcome::Pass);
    assert_eq!(host.adb.count_matching("service call bluetooth_manager 6"), 1);
    assert_eq!(host.adb.count_matching("service call bluetooth_manager 8"), 1);
    Ok(())
}

#[test]
fn bluetooth_toggle_fails_when_not_enabled() -> TestResult {
    let host = board(FakeAdb::new().shell_response(
        "dumpsys bluetooth_manager",
        0,
        &["  enabled: false"],
    ));

    let result = run_single(&host, SuiteBuilder::new("bt"), "bt_test")?;

    assert_eq!(result.outcome, Outcome::Fail);
    assert_eq!(result.errors, vec!["Bluetooth is not Enabled."]);
    Ok(())
}

#[test]
fn ethernet_ping_checks_transmitted_packets() -> TestResult {
    let host = board(FakeAdb::new().shell_response(
        "ping -c 3 www.google.com",
        0,
        &["3 packets transmitted, 3 received, 0% packet loss"],
    ));
    let result = run_single(&host, SuiteBuilder::new("eth"), "eth_test")?;
    assert_eq!(result.outcome, Outcome::Pass);

    let silent = board(FakeAdb::new());
    let result = run_single(&silent, SuiteBuilder::new("eth"), "eth_test")?;
    assert_eq!(result.outcome, Outcome::Fail);
    Ok(())
}

#[test]
fn reboot_test_passes_when_device_returns() -> TestResult {
    let host = board(FakeAdb::new());

    let result = run_single(&host, SuiteBuilder::new("reboot"), "reboot_test")?;

    assert_eq!(result.outcome, Outcome::Pass);
    assert_eq!(host.adb.count_matching("adb -s A1 reboot"), 1);
    assert_eq!(host.adb.count_matching("input tap 400 1000"), 1);
    Ok(())
}

#[test]
fn reboot_test_fails_when_device_stays_away() -> TestResult {
    let host = board(FakeAdb::new().reboot_offline_polls(None));

    let result = run_single(&host, SuiteBuilder::new("reboot"), "reboot_test")?;

    assert_eq!(result.outcome, Outcome::Fail);
    assert!(result.errors[0].contains("A1"));
    Ok(())
}

#[test]
fn boot_to_ui_needs_a_flash_file() -> TestResult {
    let host = board(FakeAdb::new());

    let result = run_single(&host, SuiteBuilder::new("boot"), "test/boot_to_ui.py")?;

    assert_eq!(result.outcome, Outcome::Fail);
    assert_eq!(result.errors, vec!["No flash_file configured for this suite"]);
    Ok(())
}

#[test]
fn boot_to_ui_flashes_and_boots() -> TestResult {
    let host = board(FakeAdb::new());
    let image_dir = TempDir::new()?;
    let image = image_dir.path().to_str().expect("utf-8 temp path");

    let result = run_single(
        &host,
        SuiteBuilder::new("boot").with_flash(image, &["flash boot boot.img", "reboot"]),
        "boot_to_ui",
    )?;

    assert_eq!(result.outcome, Outcome::Pass);
    assert_eq!(host.adb.count_matching("fastboot -s A1 flash boot boot.img"), 1);
    assert!(result.logs.contains(&"Boot to UI finished.".to_string()));
    Ok(())
}

#[test]
fn video_playback_passes_with_large_recording() -> TestResult {
    let host = board(FakeAdb::new());
    let dir = TempDir::new()?;
    let body = video_body(dir.path(), Some(4096))?;
    let sample = body.sample.display().to_string();

    let result = run_video(&host, body)?;

    assert_eq!(result.outcome, Outcome::Pass);
    assert!(result.logs.contains(&"H263 video playback passed.".to_string()));
    assert_eq!(host.adb.count_matching(&format!("adb -s A1 push {sample} /sdcard/")), 1);
    assert_eq!(
        host.adb.count_matching(
            "am start -a android.intent.action.VIEW -d /sdcard/clip.mp4 -n com.android.gallery3d/.app.MovieActivity"
        ),
        1
    );
    assert_eq!(
        host.adb.count_matching("screenrecord --time-limit 10 /sdcard/video_record.mp4"),
        1
    );
    assert_eq!(host.adb.count_matching("pull /sdcard/video_record.mp4"), 1);
    let sleeps = host.clock.sleeps();
    assert!(sleeps.contains(&Duration::from_secs(5)));
    assert!(sleeps.contains(&Duration::from_secs(20)));
    Ok(())
}

#[test]
fn video_playback_fails_with_small_recording() -> TestResult {
    let host = board(FakeAdb::new());
    let dir = TempDir::new()?;

    let result = run_video(&host, video_body(dir.path(), Some(1024))?)?;

    assert_eq!(result.outcome, Outcome::Fail);
    assert_eq!(result.errors, vec!["Video record size smaller than required!"]);
    Ok(())
}

#[test]
fn video_playback_fails_without_sample() -> TestResult {
    let host = board(FakeAdb::new());
    let dir = TempDir::new()?;
    let body = VideoPlayback {
        sample: dir.path().join("missing.mp4"),
        local_dir: dir.path().to_path_buf(),
        ..VideoPlayback::default()
    };

    let result = run_video(&host, body)?;

    assert_eq!(result.outcome, Outcome::Fail);
    assert_eq!(result.errors, vec!["Failed to push video sample to device."]);
    assert_eq!(host.adb.count_matching("am start"), 0);
    Ok(())
}

#[test]
fn video_playback_stops_when_player_does_not_start() -> TestResult {
    let host = board(FakeAdb::new().fail_on("am start"));
    let dir = TempDir::new()?;

    let result = run_video(&host, video_body(dir.path(), Some(4096))?)?;

    assert_eq!(result.outcome, Outcome::Fail);
    assert_eq!(result.errors, vec!["Failed to play video."]);
    assert_eq!(host.adb.count_matching("screenrecord"), 0);
    Ok(())
}

#[test]
fn video_playback_stops_when_recording_fails() -> TestResult {
    let host = board(FakeAdb::new().fail_on("screenrecord"));
    let dir = TempDir::new()?;

    let result = run_video(&host, video_body(dir.path(), Some(4096))?)?;

    assert_eq!(result.outcome, Outcome::Fail);
    assert_eq!(result.errors, vec!["Failed to record video playback."]);
    assert_eq!(host.adb.count_matching("pull"), 0);
    Ok(())
}

#[test]
fn video_playback_fails_when_recording_never_arrives() -> TestResult {
    let host = board(FakeAdb::new());
    let dir = TempDir::new()?;

    let result = run_video(&host, video_body(dir.path(), None)?)?;

    assert_eq!(result.outcome, Outcome::Fail);
    assert!(result.errors[0].contains("reading recorded video"));
    Ok(())
}

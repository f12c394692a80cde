// src/device/mod.rs

//! Lifecycle of the single device under test.
//!
//! [`DeviceLink`] owns the connect / reboot / flash state machine for one
//! device and is the only place that mutates its liveness flag. All waiting
//! is blocking sleep-then-poll on the [`Host`] clock:
//!
//! ```text
//! Disconnected --connect ok--> Connected
//! Connected --reboot--> Rebooting --poll ok--> Connected
//!                                 --retries exhausted--> Disconnected (DeviceOffline)
//! Connected --flash fails before fastboot--> Connected (false)
//! Connected --flash--> Flashing --fastboot entry / command fails--> Disconnected (false)
//!                      Flashing --all commands ok--> Flashing (true, boot wait pending)
//!                      --boot wait: device answers--> Connected
//! ```
//!
//! - [`discovery`] lists and finds devices through the adb bridge.
//! - [`flash`] implements the fastboot flashing protocol.
//! - [`download`] fetches remote images.

pub mod discovery;
pub mod download;
pub mod flash;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::TimingSection;
use crate::errors::{DevbatError, Result};
use crate::exec::{Clock, CommandOutput, Host, Invocation};
use crate::types::DeviceStatus;

pub use discovery::AdbBridge;
pub use download::{Downloader, HttpDownloader};
pub use flash::SUPPORTED_FLASH_MODES;

/// Interval between liveness polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Pause after `adb root` while adbd restarts.
pub const ROOT_SETTLE: Duration = Duration::from_secs(2);
pub const DEFAULT_TESTDATA_DIR: &str = "/data/";
pub const BOOT_COMPLETED_PROPERTY: &str = "sys.boot_completed";
pub const VIEW_ACTION: &str = "android.intent.action.VIEW";
pub const MOVIE_ACTIVITY: &str = "com.android.gallery3d/.app.MovieActivity";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Rebooting,
    Flashing,
}

/// Timeouts and fixed delays used by the lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTimings {
    pub connect_timeout: Duration,
    pub boot_timeout: Duration,
    pub reboot_timeout: Duration,
    pub reboot_retry_count: u32,
    /// Wait after `reboot fastboot` before the single fastboot check.
    pub fastboot_entry_delay: Duration,
    /// Wait after boot completion before the first-boot screenshot.
    pub boot_settle_delay: Duration,
}

impl Default for DeviceTimings {
    fn default() -> Self {
        Self::from(&TimingSection::default())
    }
}

impl From<&TimingSection> for DeviceTimings {
    fn from(t: &TimingSection) -> Self {
        Self {
            connect_timeout: Duration::from_secs(t.connect_timeout),
            boot_timeout: Duration::from_secs(t.boot_timeout),
            reboot_timeout: Duration::from_secs(t.reboot_timeout),
            reboot_retry_count: t.reboot_retry_count,
            fastboot_entry_delay: Duration::from_secs(t.fastboot_entry_delay),
            boot_settle_delay: Duration::from_secs(t.boot_settle_delay),
        }
    }
}

/// Handle to one physical device.
#[derive(Debug)]
pub struct DeviceLink {
    serial: Option<String>,
    name: String,
    connected: bool,
    state: ConnectionState,
    host: Host,
    bridge: AdbBridge,
    timings: DeviceTimings,
    adb_prefix: String,
    fastboot_prefix: String,
}

impl DeviceLink {
    /// Create a disconnected link. `serial = None` addresses whichever
    /// single device the tools pick.
    pub fn new(serial: Option<String>, name: impl Into<String>, host: Host) -> Self {
        let adb_prefix = discovery::adb_prefix(serial.as_deref());
        let fastboot_prefix = discovery::fastboot_prefix(serial.as_deref());
        let bridge = AdbBridge::new(&host);
        Self {
            serial,
            name: name.into(),
            connected: false,
            state: ConnectionState::Disconnected,
            host,
            bridge,
            timings: DeviceTimings::default(),
            adb_prefix,
            fastboot_prefix,
        }
    }

    pub fn with_timings(mut self, timings: DeviceTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Serial for messages; `"any"` when unset.
    pub fn serial_label(&self) -> &str {
        self.serial.as_deref().unwrap_or("any")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn timings(&self) -> &DeviceTimings {
        &self.timings
    }

    /// Run `adb [-s SERIAL] <cmd>`.
    pub fn adb(&self, cmd: &str) -> CommandOutput {
        self.host.runner.run(&Invocation::new(&self.adb_prefix, cmd))
    }

    /// Run `adb [-s SERIAL] shell <cmd>`.
    pub fn shell(&self, cmd: &str) -> CommandOutput {
        let prefix = format!("{} shell", self.adb_prefix);
        self.host.runner.run(&Invocation::new(&prefix, cmd))
    }

    /// Run `fastboot [-s SERIAL] <cmd>`.
    pub fn fastboot(&self, cmd: &str) -> CommandOutput {
        self.host
            .runner
            .run(&Invocation::new(&self.fastboot_prefix, cmd))
    }

    /// Read a system property, `None` if the query failed or was empty.
    pub fn getprop(&self, name: &str) -> Option<String> {
        let out = self.shell(&format!("getprop {name}"));
        let value = out.joined().trim().to_string();
        (out.success() && !value.is_empty()).then_some(value)
    }

    /// Sleep on the host clock (so case bodies stay testable).
    pub fn sleep(&self, duration: Duration) {
        self.host.clock.sleep(duration);
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.host.clock)
    }

    /// Poll until the device answers or `timeout` elapses.
    ///
    /// On success the link is `Connected` and `adb root` is attempted
    /// (best-effort). On timeout returns [`DevbatError::DeviceOffline`], no
    /// earlier than `timeout` and no later than `timeout + POLL_INTERVAL`.
    pub fn connect(&mut self, timeout: Duration) -> Result<()> {
        self.bridge.ensure_server()?;
        self.state = ConnectionState::Connecting;

        let clock = Arc::clone(&self.host.clock);
        let start = clock.now();
        loop {
            if self.probe() {
                self.mark_connected();
                info!(serial = %self.serial_label(), "device connected");
                break;
            }
            if clock.elapsed_since(start) >= timeout {
                self.state = ConnectionState::Disconnected;
                return Err(self.offline_error());
            }
            debug!(serial = %self.serial_label(), "device offline, looping");
            clock.sleep(POLL_INTERVAL);
        }

        self.root();
        Ok(())
    }

    /// Single liveness probe. Never errors.
    pub fn check_alive(&mut self) -> bool {
        let alive = self.probe();
        self.connected = alive;
        if alive {
            self.state = ConnectionState::Connected;
        } else if self.state == ConnectionState::Connected {
            self.state = ConnectionState::Disconnected;
        }
        alive
    }

    /// Restart adbd as root. Best-effort: failures are only logged.
    pub fn root(&self) -> i32 {
        let out = self.adb("root");
        self.log_output("ADB Root", &out.lines);
        if !out.success() {
            warn!(serial = %self.serial_label(), code = out.code, "adb root failed, continuing");
        }
        self.host.clock.sleep(ROOT_SETTLE);
        out.code
    }

    /// Reboot and wait for the device to come back.
    ///
    /// Returns `Ok(false)` without doing anything if the device is not
    /// alive beforehand. Otherwise makes `retry_count` probes spaced
    /// `timeout / retry_count` apart; `Ok(true)` once one succeeds,
    /// [`DevbatError::DeviceOffline`] if none does.
    pub fn reboot(&mut self, timeout: Duration, retry_count: u32) -> Result<bool> {
        if !self.check_alive() {
            error!(serial = %self.serial_label(), "device offline, could not reboot");
            return Ok(false);
        }
        info!(
            serial = %self.serial_label(),
            timeout_secs = timeout.as_secs(),
            "rebooting device and waiting for it to wake up"
        );

        let out = self.adb("reboot");
        self.connected = false;
        self.state = ConnectionState::Rebooting;
        self.log_output("ADB Reboot", &out.lines);

        let attempts = retry_count.max(1);
        let interval = timeout / attempts;
        for attempt in 1..=attempts {
            self.host.clock.sleep(interval);
            if self.probe() {
                self.mark_connected();
                info!(serial = %self.serial_label(), attempt, "device connected after reboot");
                self.root();
                return Ok(true);
            }
            warn!(
                serial = %self.serial_label(),
                remaining = attempts - attempt,
                "device offline, looping"
            );
        }

        self.state = ConnectionState::Disconnected;
        Err(self.offline_error())
    }

    /// Wait for adb liveness, then for `sys.boot_completed`, both bounded by
    /// one `timeout` measured from a single start. Never errors.
    pub fn wait_for_boot_complete(&mut self, timeout: Duration) -> bool {
        let clock = Arc::clone(&self.host.clock);
        let start = clock.now();

        while !self.probe() {
            if clock.elapsed_since(start) >= timeout {
                error!(
                    serial = %self.serial_label(),
                    timeout_secs = timeout.as_secs(),
                    "device adb offline for whole boot timeout, abort"
                );
                self.connected = false;
                return false;
            }
            info!(serial = %self.serial_label(), "device keeps offline, waiting");
            clock.sleep(POLL_INTERVAL);
        }
        self.mark_connected();

        clock.sleep(POLL_INTERVAL);
        self.root();
        info!(serial = %self.serial_label(), "device adb online, wait for boot complete");

        loop {
            if self.check_boot_complete() {
                return true;
            }
            if clock.elapsed_since(start) >= timeout {
                error!(serial = %self.serial_label(), "device did not boot complete, abort");
                return false;
            }
            info!(serial = %self.serial_label(), "did not boot complete, waiting");
            clock.sleep(POLL_INTERVAL);
        }
    }

    /// `adb push`. Fails if `local` does not exist.
    pub fn push(&self, local: &Path, remote: &str) -> Result<i32> {
        self.ensure_local(local)?;
        let inv = Invocation::new(&self.adb_prefix, "push")
            .arg(local.display().to_string())
            .arg(remote);
        let out = self.host.runner.run(&inv);
        self.log_output("ADB Push", &out.lines);
        Ok(out.code)
    }

    /// `adb pull`. Fails if the local destination does not exist.
    pub fn pull(&self, remote: &str, local: &Path) -> Result<i32> {
        self.ensure_local(local)?;
        let inv = Invocation::new(&self.adb_prefix, "pull")
            .arg(remote)
            .arg(local.display().to_string());
        let out = self.host.runner.run(&inv);
        self.log_output("ADB Pull", &out.lines);
        Ok(out.code)
    }

    /// `screencap -p <dir>/<filename>` on the device.
    pub fn screencap(&self, filename: &str, dir: &str) -> Result<i32> {
        if !filename.ends_with(".png") {
            error!(filename, "invalid screenshot name: not ending with .png");
            return Err(DevbatError::InvalidArgument(format!(
                "screenshot name must end with .png: {filename}"
            )));
        }
        let target = device_path(dir, filename);
        info!(%target, "screencap");
        let out = self.shell(&format!("screencap -p {target}"));
        self.log_output("screencap", &out.lines);
        Ok(out.code)
    }

    /// Start the stock movie player on `path` through a VIEW intent.
    pub fn play_video(&self, path: &str) -> i32 {
        info!(%path, "playing video with intent");
        let out = self.shell(&format!(
            "am start -a {VIEW_ACTION} -d {path} -n {MOVIE_ACTIVITY} -t \"video/*\""
        ));
        self.log_output("am_start", &out.lines);
        out.code
    }

    /// `screenrecord --time-limit <secs> <dir>/<filename>` on the device.
    /// Blocks until the recording ends.
    pub fn record_screen(&self, filename: &str, dir: &str, time_limit: u32) -> i32 {
        let target = device_path(dir, filename);
        info!(%target, time_limit, "recording screen");
        let out = self.shell(&format!("screenrecord --time-limit {time_limit} {target}"));
        self.log_output("scrn_rcd", &out.lines);
        out.code
    }

    fn probe(&self) -> bool {
        self.bridge.is_online(self.serial.as_deref())
    }

    fn mark_connected(&mut self) {
        self.connected = true;
        self.state = ConnectionState::Connected;
    }

    fn check_boot_complete(&self) -> bool {
        let out = self.shell(&format!("getprop {BOOT_COMPLETED_PROPERTY}"));
        let done = out.joined().contains('1');
        info!(serial = %self.serial_label(), boot_completed = done, "checked boot completion");
        done
    }

    fn ensure_local(&self, local: &Path) -> Result<()> {
        if local.exists() {
            return Ok(());
        }
        error!(path = %local.display(), "local path does not exist");
        Err(DevbatError::LocalPathMissing(local.to_path_buf()))
    }

    /// Log the visible devices and build the offline error.
    fn offline_error(&self) -> DevbatError {
        let visible = self.bridge.list_devices(DeviceStatus::All);
        error!(serial = %self.serial_label(), "no device with this serial detected");
        error!("dump all connected devices");
        for d in visible.iter() {
            error!("device: {}", d);
        }
        DevbatError::DeviceOffline {
            serial: self.serial_label().to_string(),
            visible,
        }
    }

    fn log_output(&self, prefix: &str, lines: &[String]) {
        for line in lines {
            info!(serial = %self.serial_label(), "{:.8}>>{}", prefix, line);
        }
    }
}

/// Join a device-side directory and file name with a single `/`.
pub fn device_path(dir: &str, filename: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), filename)
}

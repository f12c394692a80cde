// src/device/flash.rs

//! Fastboot flashing protocol for [`DeviceLink`].
//!
//! Flashing failures are soft: every step reports `false` and logs why
//! rather than returning an error, so a failed flash becomes a failed case
//! instead of an aborted suite.
//!
//! The harness never changes its own working directory. Sub-commands run
//! with the unpacked image root as the *child's* working directory, so the
//! caller's directory is the same on every exit path.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::{ConnectionState, DEFAULT_TESTDATA_DIR, DeviceLink, device_path};
use crate::config::FlashSpec;
use crate::exec::Invocation;

pub const SUPPORTED_FLASH_MODES: &[&str] = &["fastboot"];
pub const BOOT_SCREEN: &str = "first_boot.png";

/// Whether an image reference should be downloaded first.
pub fn is_remote_image(image: &str) -> bool {
    image.starts_with("http://") || image.starts_with("https://")
}

impl DeviceLink {
    /// Flash the image described by `spec`. Returns whether every step
    /// succeeded; on `true` the device is rebooting and a boot wait is due.
    pub fn flash(&mut self, spec: &FlashSpec) -> bool {
        if !SUPPORTED_FLASH_MODES.contains(&spec.mode.as_str()) {
            error!(mode = %spec.mode, "flash mode not supported");
            return false;
        }

        let flashed = self.fastboot_flash(spec);
        if !flashed {
            error!(mode = %spec.mode, "flash failed");
            // Only a device already sent to fastboot has left adb.
            if !self.connected {
                self.state = ConnectionState::Disconnected;
            }
        }
        flashed
    }

    /// Flash, wait for boot completion, then grab a first-boot screenshot
    /// into `capture_dir`. The screenshot is best-effort.
    pub fn flash_and_boot(&mut self, spec: &FlashSpec, capture_dir: &Path) -> bool {
        if !self.flash(spec) {
            return false;
        }
        info!("flash passed, wait for device to boot");
        let boot_timeout = self.timings().boot_timeout;
        if !self.wait_for_boot_complete(boot_timeout) {
            return false;
        }

        let settle = self.timings().boot_settle_delay;
        info!(settle_secs = settle.as_secs(), "capture home screen after settle delay");
        self.sleep(settle);
        self.capture_boot_screen(capture_dir);
        true
    }

    fn fastboot_flash(&mut self, spec: &FlashSpec) -> bool {
        info!("use fastboot mode for flash");
        if spec.commands.is_empty() {
            error!("no flash commands given");
            return false;
        }

        let Some(local) = self.resolve_image(spec) else {
            return false;
        };
        let Some(work_dir) = self.unpack_image(local) else {
            return false;
        };

        info!("reboot device to fastboot mode");
        if !self.reboot_to_fastboot() {
            error!(serial = %self.serial_label(), "device did not enter fastboot mode");
            return false;
        }

        info!(work_dir = %work_dir.display(), "start flashing with fastboot");
        for command in spec.commands.iter() {
            info!(%command, "run flash command");
            let inv = Invocation::new(&self.fastboot_prefix, command).in_dir(&work_dir);
            let out = self.host.runner.run(&inv);
            self.log_output("fastboot", &out.lines);
            if !out.success() {
                error!(%command, code = out.code, "flash command failed, abort");
                return false;
            }
            info!(%command, "flash command succeeded");
        }

        info!("all flash commands ran successfully");
        true
    }

    /// Download remote images; local references are used as-is.
    fn resolve_image(&self, spec: &FlashSpec) -> Option<PathBuf> {
        if !is_remote_image(&spec.image) {
            return Some(PathBuf::from(&spec.image));
        }
        info!(url = %spec.image, "got image url, downloading to local");
        match self
            .host
            .downloader
            .download(&spec.image, spec.auth.as_ref())
        {
            Ok(path) => Some(path),
            Err(e) => {
                error!(url = %spec.image, error = %e, "image download failed");
                None
            }
        }
    }

    /// Unpack a `.zip` next to itself and return the directory; any other
    /// path is returned unchanged.
    fn unpack_image(&self, local: PathBuf) -> Option<PathBuf> {
        if local.extension().and_then(|e| e.to_str()) != Some("zip") {
            return Some(local);
        }

        let target = local.with_extension("");
        info!(archive = %local.display(), "local image is a zip file, unzip it first");
        let inv = Invocation::new("unzip", "-o -d")
            .arg(target.display().to_string())
            .arg(local.display().to_string());
        let out = self.host.runner.run(&inv);
        info!(code = out.code, "unzip returned");
        if !out.success() {
            error!(archive = %local.display(), "failed to unpack image");
            return None;
        }
        Some(target)
    }

    /// Ask the device to enter fastboot, wait the fixed entry delay, and
    /// check once.
    fn reboot_to_fastboot(&mut self) -> bool {
        let _ = self.adb("reboot fastboot");
        self.connected = false;
        self.state = ConnectionState::Flashing;

        self.sleep(self.timings().fastboot_entry_delay);
        let listed = self.bridge.fastboot_devices();
        let in_fastboot = match self.serial() {
            Some(serial) => listed.iter().any(|d| d == serial),
            None => !listed.is_empty(),
        };
        info!(serial = %self.serial_label(), in_fastboot, "fastboot mode check");
        in_fastboot
    }

    fn capture_boot_screen(&self, capture_dir: &Path) {
        match self.screencap(BOOT_SCREEN, DEFAULT_TESTDATA_DIR) {
            Ok(0) => {}
            Ok(code) => warn!(code, "screencap failed"),
            Err(e) => warn!(error = %e, "screencap failed"),
        }
        let remote = device_path(DEFAULT_TESTDATA_DIR, BOOT_SCREEN);
        match self.pull(&remote, capture_dir) {
            Ok(0) => info!(dir = %capture_dir.display(), "got device boot screen"),
            Ok(code) => warn!(code, "could not pull boot screen"),
            Err(e) => warn!(error = %e, "could not pull boot screen"),
        }
    }
}

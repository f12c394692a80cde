// src/device/discovery.rs

//! Device discovery over the `adb` host bridge.

use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::errors::{DevbatError, Result};
use crate::exec::{CommandRunner, Host, Invocation, PortCheck};
use crate::types::DeviceStatus;

pub const ADB_HOST_PORT: u16 = 5037;
pub const PRODUCT_PROPERTY: &str = "ro.product.name";

static DEVICE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<serial>\S+)\s+(?P<status>\S+)").expect("device line regex is valid")
});

/// `adb [-s SERIAL]`
pub fn adb_prefix(serial: Option<&str>) -> String {
    match serial {
        Some(s) => format!("adb -s {s}"),
        None => "adb".to_string(),
    }
}

/// `fastboot [-s SERIAL]`
pub fn fastboot_prefix(serial: Option<&str>) -> String {
    match serial {
        Some(s) => format!("fastboot -s {s}"),
        None => "fastboot".to_string(),
    }
}

/// Parse the body of `adb devices` (header line included) into serials
/// whose status matches `status`.
pub fn parse_device_list(lines: &[String], status: DeviceStatus) -> Vec<String> {
    lines
        .iter()
        .skip(1)
        .filter_map(|line| DEVICE_LINE.captures(line))
        .filter(|caps| status.matches(&caps["status"]))
        .map(|caps| caps["serial"].to_string())
        .collect()
}

/// Queries against the bridge server that are not tied to one device.
#[derive(Debug, Clone)]
pub struct AdbBridge {
    runner: Arc<dyn CommandRunner>,
    ports: Arc<dyn PortCheck>,
}

impl AdbBridge {
    pub fn new(host: &Host) -> Self {
        Self {
            runner: Arc::clone(&host.runner),
            ports: Arc::clone(&host.ports),
        }
    }

    /// Whether something is listening on the local adb server port.
    pub fn server_alive(&self) -> bool {
        let addr = SocketAddr::from(([127, 0, 0, 1], ADB_HOST_PORT));
        let alive = self.ports.is_listening(addr);
        if !alive {
            debug!("adb server not started");
        }
        alive
    }

    /// Start the adb server unless it is already running.
    pub fn ensure_server(&self) -> Result<()> {
        if self.server_alive() {
            debug!("adb server already started");
            return Ok(());
        }
        let out = self.runner.run(&Invocation::new("adb", "start-server"));
        if out.success() {
            info!("adb server started");
            Ok(())
        } else {
            error!("failed to start adb server, please check output below");
            for line in out.lines.iter() {
                error!("ADBServer>>{}", line);
            }
            Err(DevbatError::AdbServer(format!(
                "adb start-server exited with {}",
                out.code
            )))
        }
    }

    /// Stop the adb server. Devices drop off until it is started again.
    pub fn kill_server(&self) -> Result<()> {
        warn!("killing adb server");
        let out = self.runner.run(&Invocation::new("adb", "kill-server"));
        if out.success() {
            info!("adb server killed");
            return Ok(());
        }
        error!("failed to kill adb server");
        for line in out.lines.iter() {
            error!("ADBServer>>{}", line);
        }
        Err(DevbatError::AdbServer(format!(
            "adb kill-server exited with {}",
            out.code
        )))
    }

    /// Serials of all devices `adb devices` reports with the given status.
    pub fn list_devices(&self, status: DeviceStatus) -> Vec<String> {
        let out = self.runner.run(&Invocation::new("adb", "devices"));
        let serials = parse_device_list(&out.lines, status);
        debug!(?serials, ?status, "listed devices");
        serials
    }

    /// Find online devices by serial or product.
    ///
    /// A serial takes priority over a product. With neither, every online
    /// device qualifies. Product matching probes each device's
    /// `ro.product.name` and tests substring containment.
    pub fn find_devices(&self, serial: Option<&str>, product: Option<&str>) -> Vec<String> {
        let all_devices = self.list_devices(DeviceStatus::Online);

        if let Some(serial) = serial {
            if all_devices.iter().any(|d| d == serial) {
                debug!(serial, "device found");
                return vec![serial.to_string()];
            }
            warn!(serial, "did not find device with serial, is the device online?");
            return Vec::new();
        }

        if let Some(product) = product {
            return all_devices
                .into_iter()
                .filter(|device| {
                    let found = self.product_of(device).contains(product);
                    if found {
                        debug!(serial = %device, product, "device found");
                    }
                    found
                })
                .collect();
        }

        warn!("serial and product both not set, returning all online devices");
        all_devices
    }

    /// Whether the given device (or, with `None`, any device) is online.
    pub fn is_online(&self, serial: Option<&str>) -> bool {
        let online = self.list_devices(DeviceStatus::Online);
        let found = match serial {
            Some(s) => online.iter().any(|d| d == s),
            None => !online.is_empty(),
        };
        if found {
            debug!(serial = serial.unwrap_or("any"), "device online");
        } else {
            warn!(serial = serial.unwrap_or("any"), "device offline");
        }
        found
    }

    /// Serials listed by `fastboot devices`.
    pub fn fastboot_devices(&self) -> Vec<String> {
        let out = self.runner.run(&Invocation::new("fastboot", "devices"));
        out.lines
            .iter()
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }

    fn product_of(&self, serial: &str) -> String {
        let cmd = format!("shell getprop {PRODUCT_PROPERTY}");
        let out = self
            .runner
            .run(&Invocation::new(&adb_prefix(Some(serial)), &cmd));
        out.joined()
    }
}

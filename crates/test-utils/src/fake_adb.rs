use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use devbat::exec::{CommandOutput, CommandRunner, Invocation, PortCheck};

/// One simulated device.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub serial: String,
    pub product: String,
    pub online: bool,
    pub in_fastboot: bool,
    pub boot_completed: bool,
    /// When offline: number of `adb devices` listings still to go before
    /// the device shows up again. `None` keeps it offline for good.
    pub online_after_polls: Option<u32>,
}

impl FakeDevice {
    /// Online, booted device.
    pub fn online(serial: &str, product: &str) -> Self {
        Self {
            serial: serial.to_string(),
            product: product.to_string(),
            online: true,
            in_fastboot: false,
            boot_completed: true,
            online_after_polls: None,
        }
    }

    /// Device that never shows up.
    pub fn offline(serial: &str, product: &str) -> Self {
        Self {
            online: false,
            ..Self::online(serial, product)
        }
    }

    /// Device that shows up after `polls` device listings.
    pub fn appearing_after(serial: &str, product: &str, polls: u32) -> Self {
        Self {
            online: false,
            online_after_polls: Some(polls),
            ..Self::online(serial, product)
        }
    }
}

#[derive(Debug)]
struct FakeAdbState {
    devices: Vec<FakeDevice>,
    invocations: Vec<Invocation>,
    /// Invocations whose text contains one of these exit with code 1.
    failing: Vec<String>,
    shell_responses: HashMap<String, CommandOutput>,
    /// Listings a device stays away after `adb reboot`; `None` = forever.
    reboot_offline_polls: Option<u32>,
    /// Whether `adb reboot fastboot` actually lands in fastboot.
    enters_fastboot: bool,
    /// Listings a device stays away after `fastboot reboot`.
    fastboot_boot_polls: Option<u32>,
    unzip_code: i32,
    root_code: i32,
    /// Whether the adb server is listening on its host port.
    server_running: bool,
}

impl Default for FakeAdbState {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            invocations: Vec::new(),
            failing: Vec::new(),
            shell_responses: HashMap::new(),
            reboot_offline_polls: Some(1),
            enters_fastboot: true,
            fastboot_boot_polls: Some(1),
            unzip_code: 0,
            root_code: 0,
            server_running: false,
        }
    }
}

/// Scriptable stand-in for the `adb`, `fastboot`, `unzip` and
/// `lava-test-case` host tools.
///
/// Clones share state, so a test keeps one handle for scripting and
/// inspection while another lives inside the `Host`.
#[derive(Debug, Clone, Default)]
pub struct FakeAdb {
    inner: Arc<Mutex<FakeAdbState>>,
}

impl FakeAdb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, device: FakeDevice) -> Self {
        self.inner.lock().unwrap().devices.push(device);
        self
    }

    /// Any invocation whose command line contains `pattern` fails.
    pub fn fail_on(self, pattern: &str) -> Self {
        self.inner.lock().unwrap().failing.push(pattern.to_string());
        self
    }

    /// Canned output for `adb shell <command>` (exact match).
    pub fn shell_response(self, command: &str, code: i32, lines: &[&str]) -> Self {
        let out = CommandOutput::new(code, lines.iter().map(|l| l.to_string()).collect());
        self.inner
            .lock()
            .unwrap()
            .shell_responses
            .insert(command.to_string(), out);
        self
    }

    pub fn reboot_offline_polls(self, polls: Option<u32>) -> Self {
        self.inner.lock().unwrap().reboot_offline_polls = polls;
        self
    }

    pub fn enters_fastboot(self, enters: bool) -> Self {
        self.inner.lock().unwrap().enters_fastboot = enters;
        self
    }

    pub fn fastboot_boot_polls(self, polls: Option<u32>) -> Self {
        self.inner.lock().unwrap().fastboot_boot_polls = polls;
        self
    }

    pub fn unzip_code(self, code: i32) -> Self {
        self.inner.lock().unwrap().unzip_code = code;
        self
    }

    pub fn root_code(self, code: i32) -> Self {
        self.inner.lock().unwrap().root_code = code;
        self
    }

    /// Start with the adb server already listening.
    pub fn server_running(self, running: bool) -> Self {
        self.inner.lock().unwrap().server_running = running;
        self
    }

    pub fn is_server_running(&self) -> bool {
        self.inner.lock().unwrap().server_running
    }

    pub fn set_boot_completed(&self, serial: &str, completed: bool) {
        self.update(serial, |d| d.boot_completed = completed);
    }

    /// Drop the device off the bus for good.
    pub fn take_offline(&self, serial: &str) {
        self.update(serial, |d| {
            d.online = false;
            d.online_after_polls = None;
        });
    }

    pub fn bring_online(&self, serial: &str) {
        self.update(serial, |d| {
            d.online = true;
            d.in_fastboot = false;
        });
    }

    pub fn device(&self, serial: &str) -> Option<FakeDevice> {
        self.inner
            .lock()
            .unwrap()
            .devices
            .iter()
            .find(|d| d.serial == serial)
            .cloned()
    }

    /// Every invocation seen so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.inner.lock().unwrap().invocations.clone()
    }

    /// Invocations whose command line contains `pattern`.
    pub fn invocations_matching(&self, pattern: &str) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|inv| inv.to_string().contains(pattern))
            .collect()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        self.invocations_matching(pattern).len()
    }

    fn update(&self, serial: &str, f: impl FnOnce(&mut FakeDevice)) {
        let mut state = self.inner.lock().unwrap();
        if let Some(device) = state.devices.iter_mut().find(|d| d.serial == serial) {
            f(device);
        }
    }
}

impl CommandRunner for FakeAdb {
    fn run(&self, invocation: &Invocation) -> CommandOutput {
        let mut state = self.inner.lock().unwrap();
        state.invocations.push(invocation.clone());

        let line = invocation.to_string();
        if state.failing.iter().any(|p| line.contains(p.as_str())) {
            return CommandOutput::new(1, vec![format!("FAILED: {line}")]);
        }

        match invocation.program.as_str() {
            "adb" => state.adb(&invocation.args),
            "fastboot" => state.fastboot(&invocation.args),
            "unzip" => CommandOutput::new(state.unzip_code, Vec::new()),
            "lava-test-case" => CommandOutput::new(0, vec![format!("<LAVA {}>", invocation.args_line())]),
            other => CommandOutput::new(127, vec![format!("{other}: command not found")]),
        }
    }
}

impl PortCheck for FakeAdb {
    fn is_listening(&self, _addr: SocketAddr) -> bool {
        self.inner.lock().unwrap().server_running
    }
}

/// Split `-s SERIAL` off the front of an argument list.
fn target(args: &[String]) -> (Option<&str>, &[String]) {
    match args {
        [flag, serial, rest @ ..] if flag == "-s" => (Some(serial.as_str()), rest),
        _ => (None, args),
    }
}

impl FakeAdbState {
    fn device_mut(&mut self, serial: Option<&str>) -> Option<&mut FakeDevice> {
        match serial {
            Some(s) => self.devices.iter_mut().find(|d| d.serial == s),
            None => self.devices.first_mut(),
        }
    }

    fn list_devices(&mut self) -> CommandOutput {
        let mut lines = vec!["List of devices attached".to_string()];
        for device in self.devices.iter_mut() {
            if !device.online && !device.in_fastboot {
                match device.online_after_polls {
                    Some(0) => {
                        device.online = true;
                        device.online_after_polls = None;
                    }
                    Some(n) => device.online_after_polls = Some(n - 1),
                    None => {}
                }
            }
            if device.online {
                lines.push(format!("{}\tdevice", device.serial));
            }
        }
        CommandOutput::new(0, lines)
    }

    fn adb(&mut self, args: &[String]) -> CommandOutput {
        let (serial, rest) = target(args);
        let Some(command) = rest.first().map(String::as_str) else {
            return CommandOutput::new(1, vec!["adb: usage".to_string()]);
        };

        match command {
            "start-server" => {
                self.server_running = true;
                return CommandOutput::new(0, Vec::new());
            }
            "kill-server" => {
                self.server_running = false;
                return CommandOutput::new(0, Vec::new());
            }
            "devices" => return self.list_devices(),
            _ => {}
        }

        let root_code = self.root_code;
        let reboot_polls = self.reboot_offline_polls;
        let enters_fastboot = self.enters_fastboot;
        let responses = self.shell_responses.clone();

        let Some(device) = self.device_mut(serial).filter(|d| d.online) else {
            let who = serial.unwrap_or("any");
            return CommandOutput::new(1, vec![format!("error: device '{who}' not found")]);
        };

        match (command, rest.get(1).map(String::as_str)) {
            ("root", _) => CommandOutput::new(root_code, vec!["restarting adbd as root".to_string()]),
            ("reboot", Some("fastboot")) => {
                device.online = false;
                device.in_fastboot = enters_fastboot;
                device.online_after_polls = None;
                CommandOutput::new(0, Vec::new())
            }
            ("reboot", _) => {
                device.online = false;
                device.online_after_polls = reboot_polls;
                CommandOutput::new(0, Vec::new())
            }
            ("shell", _) => {
                let cmd = rest[1..].join(" ");
                if let Some(out) = responses.get(&cmd) {
                    return out.clone();
                }
                match cmd.as_str() {
                    "getprop ro.product.name" => CommandOutput::new(0, vec![device.product.clone()]),
                    "getprop sys.boot_completed" => {
                        let v = if device.boot_completed { "1" } else { "0" };
                        CommandOutput::new(0, vec![v.to_string()])
                    }
                    _ => CommandOutput::new(0, Vec::new()),
                }
            }
            ("push", _) | ("pull", _) => {
                CommandOutput::new(0, vec!["1 file transferred".to_string()])
            }
            _ => CommandOutput::new(0, Vec::new()),
        }
    }

    fn fastboot(&mut self, args: &[String]) -> CommandOutput {
        let (serial, rest) = target(args);
        if rest.first().map(String::as_str) == Some("devices") {
            let lines = self
                .devices
                .iter()
                .filter(|d| d.in_fastboot)
                .map(|d| format!("{}\tfastboot", d.serial))
                .collect();
            return CommandOutput::new(0, lines);
        }

        let boot_polls = self.fastboot_boot_polls;
        let Some(device) = self.device_mut(serial).filter(|d| d.in_fastboot) else {
            return CommandOutput::new(1, vec!["< waiting for any device >".to_string()]);
        };

        if rest.first().map(String::as_str) == Some("reboot") {
            device.in_fastboot = false;
            device.online = false;
            device.online_after_polls = boot_polls;
        }
        CommandOutput::new(0, vec![format!("OKAY {}", rest.join(" "))])
    }
}

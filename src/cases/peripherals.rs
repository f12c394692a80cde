// src/cases/peripherals.rs

//! Audio, bluetooth and ethernet checks driven through `adb shell`.

use std::time::Duration;

use crate::engine::{CaseContext, TestCase};

/// List ALSA sound cards; pass if at least one is reported.
#[derive(Debug, Clone, Default)]
pub struct AudioPlaybackCheck;

impl TestCase for AudioPlaybackCheck {
    fn run(&self, ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
        ctx.logger.info("Start TC audio_playback_check.");
        ctx.logger.info("Try to list ALSA devices.");
        let out = ctx.device.shell("alsa_aplay -l");
        if !out.success() {
            ctx.case_fail_with_logs("List command failed.", out.lines);
            return Ok(());
        }
        if out.lines.is_empty() {
            ctx.case_fail("aplay: device_list:268: no soundcards found...");
            return Ok(());
        }

        // first line is the listing header
        let cards: Vec<String> = out.lines.into_iter().skip(1).collect();
        for line in cards.iter() {
            ctx.logger.debug(format_args!("ALSA_list>>{line}"));
        }
        ctx.case_pass_with_logs("ALSA_list detected sound cards.", cards);
        Ok(())
    }
}

/// Enable bluetooth, check the manager reports it enabled, disable again.
#[derive(Debug, Clone)]
pub struct BluetoothToggle {
    /// Wait after each toggle.
    pub settle: Duration,
}

impl Default for BluetoothToggle {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(5),
        }
    }
}

impl TestCase for BluetoothToggle {
    fn run(&self, ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
        ctx.logger.info("Test case: Test Bluetooth");
        if !ctx.device.check_alive() {
            ctx.case_fail("Device offline before bluetooth test");
            return Ok(());
        }
        ctx.log("Device online.");

        ctx.logger.info("Checking Bluetooth...");
        ctx.device.shell("service call bluetooth_manager 6");
        ctx.device.sleep(self.settle);
        let state = ctx.device.shell("dumpsys bluetooth_manager");
        if state.lines.iter().any(|l| l.contains("enabled: true")) {
            ctx.case_pass("Bluetooth Enabled.");
        } else {
            ctx.case_fail("Bluetooth is not Enabled.");
        }

        ctx.device.sleep(self.settle);
        ctx.device.shell("service call bluetooth_manager 8");
        Ok(())
    }
}

/// Ping a public host and expect all three packets to go out.
#[derive(Debug, Clone)]
pub struct EthernetPing {
    pub host: String,
}

impl Default for EthernetPing {
    fn default() -> Self {
        Self {
            host: "www.google.com".to_string(),
        }
    }
}

impl TestCase for EthernetPing {
    fn run(&self, ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
        ctx.logger.info("Test case: Test ethernet ping");
        if !ctx.device.check_alive() {
            ctx.case_fail("Device offline before ethernet ping test");
            return Ok(());
        }
        ctx.log("Device online.");

        ctx.logger.info("Checking Ethernet...");
        let out = ctx.device.shell(&format!("ping -c 3 {}", self.host));
        if out
            .lines
            .iter()
            .any(|l| l.contains("3 packets transmitted"))
        {
            ctx.case_pass("Ethernet transmitted Packets.");
        } else {
            ctx.case_fail("Ethernet DID NOT Transmitted Packets.");
        }
        Ok(())
    }
}

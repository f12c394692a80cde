// src/cases/system.rs

use std::time::Duration;

use crate::engine::{CaseContext, TestCase};

/// Reboot through adb and expect the device back online.
#[derive(Debug, Clone)]
pub struct RebootTest {
    pub timeout: Duration,
    pub retry_count: u32,
}

impl Default for RebootTest {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            retry_count: 2,
        }
    }
}

impl TestCase for RebootTest {
    fn run(&self, ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
        ctx.logger.info("Test case: adb reboot.");
        if !ctx.device.check_alive() {
            ctx.case_fail("Device offline before reboot");
            return Ok(());
        }
        ctx.log("Device online.");

        ctx.logger.info("Rebooting...");
        ctx.device.reboot(self.timeout, self.retry_count)?;
        if ctx.device.check_alive() {
            // dismiss the user picker shown on first boot
            ctx.device.shell("input tap 400 1000");
            ctx.case_pass("Reboot success.");
        } else {
            ctx.case_fail("Reboot failed, device offline.");
        }
        Ok(())
    }
}

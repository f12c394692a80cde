// src/cases/boot.rs

use std::path::PathBuf;

use crate::engine::{CaseContext, TestCase};

/// Flash the suite image and wait for the device to boot to UI.
#[derive(Debug, Clone)]
pub struct BootToUi {
    /// Where the first-boot screenshot is pulled to.
    pub capture_dir: PathBuf,
}

impl Default for BootToUi {
    fn default() -> Self {
        Self {
            capture_dir: PathBuf::from("."),
        }
    }
}

impl TestCase for BootToUi {
    fn run(&self, ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
        ctx.logger.info("Start sample test case boot to UI.");
        if !ctx.device.check_alive() {
            ctx.case_fail("Device not alive");
            return Ok(());
        }
        ctx.log("Device alive at first.");

        let Some(spec) = ctx.flash else {
            ctx.case_fail("No flash_file configured for this suite");
            return Ok(());
        };
        ctx.logger.info(format_args!("Flash mode: {} selected", spec.mode));
        if let Some(auth) = spec.auth.as_ref() {
            ctx.logger
                .info(format_args!("Got auth, username: {}", auth.username));
        }

        ctx.logger.info("Start flash...");
        if ctx.device.flash_and_boot(spec, &self.capture_dir) {
            ctx.case_pass("Boot to UI finished.");
        } else {
            ctx.case_fail("Device did not boot to UI");
        }
        Ok(())
    }
}

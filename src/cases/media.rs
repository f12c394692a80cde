// src/cases/media.rs

//! Video playback check: play a sample, record the screen, judge the
//! recording by size.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::device::device_path;
use crate::engine::{CaseContext, TestCase};

pub const VIDEO_SAMPLE: &str =
    "tools/video_case/3GPv4_H263_L1.0_BP_QCIF_15fps_AAC_ST_16KHz_reference.mp4";

/// Push an H263 sample, play it through the movie intent, record the
/// screen while it plays and pull the recording back.
///
/// Decoding the recording is not attempted; a file larger than
/// `min_size` bytes counts as playback.
#[derive(Debug, Clone)]
pub struct VideoPlayback {
    pub sample: PathBuf,
    pub device_dir: String,
    pub record_name: String,
    /// `screenrecord --time-limit`, in seconds.
    pub time_limit: u32,
    pub min_size: u64,
    /// Where the recording is pulled to.
    pub local_dir: PathBuf,
    /// Between starting playback and starting the recording.
    pub play_delay: Duration,
    /// Before pulling the recording.
    pub record_settle: Duration,
}

impl Default for VideoPlayback {
    fn default() -> Self {
        Self {
            sample: PathBuf::from(VIDEO_SAMPLE),
            device_dir: "/sdcard/".to_string(),
            record_name: "video_record.mp4".to_string(),
            time_limit: 10,
            min_size: 800_000,
            local_dir: PathBuf::from("."),
            play_delay: Duration::from_secs(5),
            record_settle: Duration::from_secs(20),
        }
    }
}

impl TestCase for VideoPlayback {
    fn run(&self, ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
        ctx.logger.info("Start TC H263 video playback.");
        ctx.logger.info("Push video sample to device.");
        match ctx.device.push(&self.sample, &self.device_dir) {
            Ok(0) => {}
            Ok(code) => {
                ctx.logger.error(format_args!("adb push exited with {code}"));
                ctx.case_fail("Failed to push video sample to device.");
                return Ok(());
            }
            Err(e) => {
                ctx.logger.error(&e);
                ctx.case_fail("Failed to push video sample to device.");
                return Ok(());
            }
        }

        let file_name = self
            .sample
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let on_device = device_path(&self.device_dir, &file_name);
        if ctx.device.play_video(&on_device) != 0 {
            ctx.case_fail("Failed to play video.");
            return Ok(());
        }
        ctx.logger.info("Video play started.");

        ctx.device.sleep(self.play_delay);
        ctx.logger.info(format_args!(
            "Start to record video after {} seconds sleep.",
            self.play_delay.as_secs()
        ));
        let code = ctx
            .device
            .record_screen(&self.record_name, &self.device_dir, self.time_limit);
        if code != 0 {
            ctx.case_fail("Failed to record video playback.");
            return Ok(());
        }
        ctx.logger.info("Record finished.");

        ctx.device.sleep(self.record_settle);
        let remote = device_path(&self.device_dir, &self.record_name);
        ctx.device.pull(&remote, &self.local_dir)?;

        let local = self.local_dir.join(&self.record_name);
        let size = fs::metadata(&local)
            .with_context(|| format!("reading recorded video {}", local.display()))?
            .len();
        ctx.logger.info(format_args!("Record video size is {size}"));
        if size > self.min_size {
            ctx.case_pass("H263 video playback passed.");
        } else {
            ctx.case_fail("Video record size smaller than required!");
        }
        Ok(())
    }
}

// src/cases/mod.rs

//! Built-in test case bodies.
//!
//! Each body is registered under the file stem a suite would name it by,
//! so `path = "test/reboot_test.py"` and `path = "reboot_test"` both
//! resolve to [`system::RebootTest`].

pub mod boot;
pub mod media;
pub mod peripherals;
pub mod system;

use crate::engine::CaseRegistry;

pub use boot::BootToUi;
pub use media::VideoPlayback;
pub use peripherals::{AudioPlaybackCheck, BluetoothToggle, EthernetPing};
pub use system::RebootTest;

/// Register every built-in body into `registry`.
pub fn register_builtin(registry: &mut CaseRegistry) {
    registry
        .register("boot_to_ui", BootToUi::default())
        .register("reboot_test", RebootTest::default())
        .register("audio_playback_check", AudioPlaybackCheck)
        .register("bt_test", BluetoothToggle::default())
        .register("eth_test", EthernetPing::default())
        .register("video_playback", VideoPlayback::default());
}

// src/exec/mod.rs

//! Host execution layer.
//!
//! Everything the harness does to the outside world goes through the
//! pieces bundled in [`Host`]:
//! - [`runner`] runs the device tools and captures their output.
//! - [`clock`] provides time for the sleep-then-poll loops.
//! - [`port`] checks whether the adb server is up.
//! - the image [`Downloader`] fetches remote firmware.
//!
//! Tests swap all of them for fakes.

pub mod clock;
pub mod port;
pub mod runner;

use std::sync::Arc;

pub use clock::{Clock, SystemClock};
pub use port::{PortCheck, TcpPortCheck};
pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};

use crate::device::download::{Downloader, HttpDownloader};
use crate::errors::Result;

/// Shared handles to the host-side collaborators.
#[derive(Debug, Clone)]
pub struct Host {
    pub runner: Arc<dyn CommandRunner>,
    pub clock: Arc<dyn Clock>,
    pub downloader: Arc<dyn Downloader>,
    pub ports: Arc<dyn PortCheck>,
}

impl Host {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        clock: Arc<dyn Clock>,
        downloader: Arc<dyn Downloader>,
        ports: Arc<dyn PortCheck>,
    ) -> Self {
        Self {
            runner,
            clock,
            downloader,
            ports,
        }
    }

    /// Real processes, wall-clock time, HTTP downloads and TCP port checks.
    pub fn system() -> Result<Self> {
        Ok(Self::new(
            Arc::new(SystemRunner),
            Arc::new(SystemClock),
            Arc::new(HttpDownloader::new()?),
            Arc::new(TcpPortCheck::default()),
        ))
    }
}

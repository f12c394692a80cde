use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use devbat::config::Credentials;
use devbat::device::Downloader;
use devbat::errors::{DevbatError, Result};
use devbat::exec::Host;

use crate::fake_adb::FakeAdb;
use crate::fake_clock::FakeClock;

/// Downloader that hands back a fixed local path (or fails) and records
/// every URL it was asked for.
#[derive(Debug, Clone)]
pub struct FakeDownloader {
    result: Option<PathBuf>,
    requests: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl FakeDownloader {
    /// Every download "succeeds" and yields `path`.
    pub fn returning(path: impl Into<PathBuf>) -> Self {
        Self {
            result: Some(path.into()),
            requests: Arc::default(),
        }
    }

    /// Every download fails.
    pub fn failing() -> Self {
        Self {
            result: None,
            requests: Arc::default(),
        }
    }

    /// `(url, username)` of each request.
    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &str, auth: Option<&Credentials>) -> Result<PathBuf> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), auth.map(|c| c.username.clone())));
        self.result
            .clone()
            .ok_or_else(|| DevbatError::Download(format!("fake download of {url} failed")))
    }
}

/// Fake adb/fastboot, virtual clock and fake downloader bundled together.
/// The fake adb also answers for the adb server port.
///
/// The handles stay with the test for scripting and inspection while
/// [`FakeHost::host`] hands shared clones to the code under test.
#[derive(Debug, Clone)]
pub struct FakeHost {
    pub adb: FakeAdb,
    pub clock: FakeClock,
    pub downloader: FakeDownloader,
}

impl FakeHost {
    pub fn new(adb: FakeAdb) -> Self {
        Self {
            adb,
            clock: FakeClock::new(),
            downloader: FakeDownloader::failing(),
        }
    }

    pub fn with_downloader(mut self, downloader: FakeDownloader) -> Self {
        self.downloader = downloader;
        self
    }

    pub fn host(&self) -> Host {
        Host::new(
            Arc::new(self.adb.clone()),
            Arc::new(self.clock.clone()),
            Arc::new(self.downloader.clone()),
            Arc::new(self.adb.clone()),
        )
    }
}

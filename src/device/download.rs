// src/device/download.rs

//! Remote image download for flashing.

use std::fmt::Debug;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use tracing::{error, info};

use crate::config::Credentials;
use crate::errors::{DevbatError, Result};

/// Fetches a remote image to local storage.
pub trait Downloader: Send + Sync + Debug {
    /// Download `url` and return the local path of the saved file.
    fn download(&self, url: &str, auth: Option<&Credentials>) -> Result<PathBuf>;
}

/// Last path segment of a URL, used as the local file name.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Stream `body` into a new file at `local`. A partial file is removed
/// when the copy fails.
pub fn save_body(mut body: impl Read, local: &Path) -> Result<u64> {
    let mut file = File::create(local)?;
    match io::copy(&mut body, &mut file) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            drop(file);
            let _ = fs::remove_file(local);
            error!(path = %local.display(), error = %e, "download interrupted, removed partial file");
            Err(DevbatError::Download(e.to_string()))
        }
    }
}

/// Blocking HTTP(S) downloader. Files land in the current directory.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| DevbatError::Download(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, auth: Option<&Credentials>) -> Result<PathBuf> {
        let Some(file_name) = file_name_from_url(url) else {
            return Err(DevbatError::Download(format!(
                "cannot derive a file name from url {url}"
            )));
        };
        if !file_name.ends_with(".zip") {
            // Not fatal: some servers hand out images under odd names.
            error!(%url, "looks like this is not an image url, please check");
        } else {
            info!(%url, "downloading image");
        }

        let mut request = self.client.get(url);
        if let Some(creds) = auth {
            info!(user = %creds.username, "login session with user and password");
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let started = Instant::now();
        let response = request
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| DevbatError::Download(e.to_string()))?;

        let local = PathBuf::from(file_name);
        let bytes = save_body(response, &local)?;

        info!(
            path = %local.display(),
            bytes,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "download finished"
        );
        Ok(local)
    }
}

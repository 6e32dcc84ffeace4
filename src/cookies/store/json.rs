//! JSON-backed cookie store.
//!
//! `JsonCookieStore` keeps the records produced by
//! [`DefaultCookieJar::serialize_cookies_to_str`] in a single file.
//!
//! ### I/O characteristics
//! - Every `persist` rewrites the whole file. The text is produced first (under
//!   the jar lock), then written to a sibling temporary file and renamed over
//!   the target, so readers never see a half-written file.
//! - A missing or blank file is an empty store.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::debug;

use crate::cookies::cookie_jar::DefaultCookieJar;
use crate::cookies::store::CookieStore;

/// A JSON-file cookie store.
#[derive(Debug, Clone)]
pub struct JsonCookieStore {
    /// Path to the JSON file where cookies are stored.
    path: PathBuf,
}

impl JsonCookieStore {
    /// Creates a store for `path`. The file is created on the first persist.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CookieStore for JsonCookieStore {
    fn load_into(&self, jar: &DefaultCookieJar) -> Result<()> {
        if !self.path.exists() {
            debug!("no cookie file at {}", self.path.display());
            return Ok(());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read cookie file {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(());
        }

        jar.deserialize_cookies_from_str(&contents, jar.config().session_cookie_alive)
            .with_context(|| format!("failed to restore cookies from {}", self.path.display()))?;
        Ok(())
    }

    fn persist(&self, jar: &DefaultCookieJar) -> Result<()> {
        let contents = jar.serialize_cookies_to_str()?;
        let tmp = self.tmp_path();
        fs::write(&tmp, contents)
            .with_context(|| format!("failed to write cookie file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace cookie file {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove cookie file {}", self.path.display())),
        }
    }
}

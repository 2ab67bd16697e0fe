use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::PrismError;

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const PARTIAL_SUFFIXES: [&str; 3] = [".crdownload", ".tmp", ".part"];

/// Remembers what was already in the download directory so the next new
/// file can be picked out once the browser finishes writing it.
#[derive(Debug)]
pub struct DownloadWatcher {
    dir: PathBuf,
    existing: HashSet<OsString>,
}

impl DownloadWatcher {
    pub fn snapshot(dir: impl Into<PathBuf>) -> Result<Self, PrismError> {
        let dir = dir.into();
        let existing = list_files(&dir)?.into_iter().collect();
        Ok(Self { dir, existing })
    }

    /// A finished file that wasn't there at snapshot time, if any.
    pub fn find_new_file(&self) -> Result<Option<PathBuf>, PrismError> {
        Ok(list_files(&self.dir)?
            .into_iter()
            .filter(|name| !self.existing.contains(name))
            .filter(|name| !is_partial(name))
            .map(|name| self.dir.join(name))
            .min())
    }

    /// Polls until a new finished file shows up or `timeout` passes.
    pub async fn wait(&self, timeout: Duration) -> Result<PathBuf, PrismError> {
        let start = Instant::now();

        loop {
            if let Some(path) = self.find_new_file()? {
                info!("Download detected: {:?}", path);
                return Ok(path);
            }

            if start.elapsed() > timeout {
                return Err(PrismError::Timeout(format!(
                    "no download appeared in {:?} within {}s",
                    self.dir,
                    timeout.as_secs()
                )));
            }

            debug!("Waiting for download in {:?}...", self.dir);
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

fn is_partial(name: &OsString) -> bool {
    let name = name.to_string_lossy();
    PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn list_files(dir: &Path) -> Result<Vec<OsString>, PrismError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name());
        }
    }
    Ok(names)
}

/// Prefixes the file name with `prefix`, e.g. `bend_PRISM_ppt.csv`.
pub fn rename_with_prefix(path: &Path, prefix: &str) -> Result<PathBuf, PrismError> {
    let filename = path
        .file_name()
        .ok_or_else(|| PrismError::Download(format!("no file name in {:?}", path)))?
        .to_string_lossy();

    let new_path = path.with_file_name(format!("{}_{}", prefix, filename));
    if new_path.exists() {
        return Err(PrismError::Download(format!(
            "{:?} already exists, not overwriting it with {:?}",
            new_path, path
        )));
    }
    std::fs::rename(path, &new_path)?;
    info!("Renamed download: {:?} -> {:?}", path, new_path);

    Ok(new_path)
}

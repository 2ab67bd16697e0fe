use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Session settings.
///
/// `download_dir` and `driver_wait` are the two knobs most callers care
/// about; the rest control how Chromium is started.
#[derive(Debug, Clone)]
pub struct PrismConfig {
    /// Where the browser drops downloaded files.
    pub download_dir: PathBuf,
    /// How long to wait for each form element to appear.
    pub driver_wait: Duration,
    /// How long to wait for a download to finish after clicking the button.
    pub download_timeout: Duration,
    pub headless: bool,
    /// Chrome/Chromium binary. `None` lets chromiumoxide look it up.
    pub chrome_executable: Option<PathBuf>,
    /// Log a base64 screenshot when an element can't be found.
    pub debug: bool,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            download_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            driver_wait: Duration::from_secs(5),
            download_timeout: Duration::from_secs(30),
            headless: true,
            chrome_executable: None,
            debug: false,
        }
    }
}

impl PrismConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `PRISM_DOWNLOAD_DIR`, `PRISM_DRIVER_WAIT` (seconds),
    /// `PRISM_HEADLESS` and `CHROME_PATH` / `CHROMIUM_PATH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup("PRISM_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }

        if let Some(wait) = lookup("PRISM_DRIVER_WAIT") {
            match wait.parse::<u64>() {
                Ok(secs) => config.driver_wait = Duration::from_secs(secs),
                Err(e) => warn!("Ignoring PRISM_DRIVER_WAIT={}: {}", wait, e),
            }
        }

        if let Some(headless) = lookup("PRISM_HEADLESS") {
            config.headless = !matches!(headless.to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }

        config.chrome_executable = lookup("CHROME_PATH")
            .or_else(|| lookup("CHROMIUM_PATH"))
            .map(PathBuf::from);

        config
    }

    pub fn with_download_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.download_dir = path.into();
        self
    }

    pub fn with_driver_wait(mut self, wait: Duration) -> Self {
        self.driver_wait = wait;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

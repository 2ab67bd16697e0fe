//! chromiumoxide-backed [`FormDriver`].

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PrismConfig;
use crate::error::PrismError;
use crate::traits::FormDriver;

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How far along an element has to be before the driver touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    /// In the DOM. Enough for `<select>`s set through script, which the
    /// explorer may keep hidden behind a styled widget.
    Present,
    /// In the DOM, laid out and not disabled.
    Interactable,
}

pub struct ChromeDriver {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    user_data_dir: Option<PathBuf>,
    driver_wait: Duration,
    debug: bool,
}

impl ChromeDriver {
    /// Starts Chromium and points its downloads at `config.download_dir`.
    pub async fn launch(config: &PrismConfig) -> Result<Self, PrismError> {
        info!("Launching browser...");

        std::fs::create_dir_all(&config.download_dir)?;
        let download_dir = config
            .download_dir
            .canonicalize()
            .unwrap_or_else(|_| config.download_dir.clone());

        let user_data_dir = profile_dir();
        let browser_config = browser_config(config, &user_data_dir)?;

        let (browser, mut handler) = match Browser::launch(browser_config).await {
            Ok(launched) => launched,
            Err(e) => {
                remove_profile_dir(&user_data_dir);
                return Err(PrismError::BrowserInit(e.to_string()));
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PrismError::BrowserInit(e.to_string()))?;

        allow_downloads(&page, &download_dir).await?;

        info!("Browser ready, downloads go to {:?}", download_dir);
        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler: Some(handler),
            user_data_dir: Some(user_data_dir),
            driver_wait: config.driver_wait,
            debug: config.debug,
        })
    }

    fn page(&self) -> Result<&Page, PrismError> {
        self.page
            .as_ref()
            .ok_or_else(|| PrismError::BrowserInit("browser is not running".into()))
    }

    /// Polls until the element reaches `readiness` or `driver_wait` passes.
    async fn wait_for_element(
        &self,
        id: &str,
        readiness: Readiness,
    ) -> Result<Element, PrismError> {
        let page = self.page()?;
        let script = readiness_script(id, readiness);
        let start = Instant::now();

        loop {
            let ready = page
                .evaluate(script.as_str())
                .await
                .map(|v| v.into_value::<bool>().unwrap_or(false))
                .unwrap_or(false);

            if ready {
                return page
                    .find_element(format!("#{}", id))
                    .await
                    .map_err(|e| PrismError::ElementNotFound(format!("#{}: {}", id, e)));
            }

            if start.elapsed() > self.driver_wait {
                self.log_screenshot().await;
                return Err(PrismError::Timeout(format!(
                    "#{} not ready ({:?}) after {}s",
                    id,
                    readiness,
                    self.driver_wait.as_secs()
                )));
            }

            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    async fn log_screenshot(&self) {
        if !self.debug {
            return;
        }
        let Ok(page) = self.page() else { return };
        if let Ok(screenshot) = page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
            debug!("Screenshot: data:image/png;base64,{}", encoded);
        }
    }
}

/// A fresh Chromium profile path under the temp dir, unique per launch.
fn profile_dir() -> PathBuf {
    let unique_id = format!(
        "{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    );
    std::env::temp_dir().join(format!("prism-pull-{}", unique_id))
}

fn remove_profile_dir(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => debug!("Removed browser profile {:?}", dir),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove browser profile {:?}: {}", dir, e),
    }
}

fn browser_config(
    config: &PrismConfig,
    user_data_dir: &Path,
) -> Result<BrowserConfig, PrismError> {
    let mut builder = BrowserConfig::builder()
        .window_size(1280, 800)
        .user_data_dir(user_data_dir)
        .request_timeout(Duration::from_secs(60))
        .no_sandbox()
        .arg("--disable-dev-shm-usage")
        .arg("--disable-gpu");

    if let Some(chrome) = &config.chrome_executable {
        builder = builder.chrome_executable(chrome);
    }

    if !config.headless {
        builder = builder.with_head();
    }

    if config.debug {
        builder = builder.arg("--enable-logging=stderr").arg("--v=1");
    }

    builder.build().map_err(PrismError::BrowserInit)
}

async fn allow_downloads(page: &Page, download_dir: &Path) -> Result<(), PrismError> {
    let params = SetDownloadBehaviorParams::builder()
        .behavior(SetDownloadBehaviorBehavior::Allow)
        .download_path(download_dir.to_string_lossy().to_string())
        .events_enabled(true)
        .build()
        .map_err(|e| PrismError::BrowserInit(format!("download behavior: {}", e)))?;

    page.execute(params)
        .await
        .map_err(|e| PrismError::BrowserInit(format!("download behavior: {}", e)))?;
    Ok(())
}

/// Quotes `s` as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn readiness_script(id: &str, readiness: Readiness) -> String {
    let check = match readiness {
        Readiness::Present => "return true;",
        Readiness::Interactable => {
            "var rect = el.getBoundingClientRect();
                return !el.disabled && (rect.width > 0 || rect.height > 0);"
        }
    };
    format!(
        r#"
            (function() {{
                var el = document.getElementById({});
                if (!el) return false;
                {}
            }})()
            "#,
        js_string(id),
        check
    )
}

fn select_script(id: &str, value: &str) -> String {
    format!(
        r#"
        (function() {{
            var el = document.getElementById({id});
            if (!el) return "missing";
            var found = Array.prototype.some.call(el.options, function(o) {{ return o.value === {value}; }});
            if (!found) return "no-option";
            el.value = {value};
            el.dispatchEvent(new Event("change", {{ bubbles: true }}));
            return "ok";
        }})()
        "#,
        id = js_string(id),
        value = js_string(value)
    )
}

#[async_trait]
impl FormDriver for ChromeDriver {
    async fn open(&mut self, url: &str) -> Result<(), PrismError> {
        let page = self.page()?;
        info!("Opening {}", url);

        page.goto(url)
            .await
            .map_err(|e| PrismError::Navigation(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| PrismError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn click(&mut self, id: &str) -> Result<(), PrismError> {
        debug!("click #{}", id);
        self.wait_for_element(id, Readiness::Interactable)
            .await?
            .click()
            .await
            .map_err(|e| PrismError::Navigation(format!("click #{}: {}", id, e)))?;
        Ok(())
    }

    async fn fill(&mut self, id: &str, value: &str) -> Result<(), PrismError> {
        debug!("fill #{} = {}", id, value);
        let element = self.wait_for_element(id, Readiness::Interactable).await?;

        let clear = format!("document.getElementById({}).value = ''", js_string(id));
        self.page()?
            .evaluate(clear.as_str())
            .await
            .map_err(|e| PrismError::JavaScript(e.to_string()))?;

        element
            .click()
            .await
            .map_err(|e| PrismError::Navigation(format!("focus #{}: {}", id, e)))?
            .type_str(value)
            .await
            .map_err(|e| PrismError::Navigation(format!("type into #{}: {}", id, e)))?;
        Ok(())
    }

    async fn select(&mut self, id: &str, value: &str) -> Result<(), PrismError> {
        debug!("select #{} = {}", id, value);
        self.wait_for_element(id, Readiness::Present).await?;

        let script = select_script(id, value);
        let outcome: String = self
            .page()?
            .evaluate(script.as_str())
            .await
            .map_err(|e| PrismError::JavaScript(e.to_string()))?
            .into_value()
            .map_err(|e| PrismError::JavaScript(e.to_string()))?;

        match outcome.as_str() {
            "ok" => Ok(()),
            "no-option" => Err(PrismError::ElementNotFound(format!(
                "option '{}' in #{}",
                value, id
            ))),
            _ => Err(PrismError::ElementNotFound(format!("#{}", id))),
        }
    }

    async fn close(&mut self) -> Result<(), PrismError> {
        info!("Closing browser...");

        self.page = None;
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser did not close cleanly: {}", e);
            }
            let _ = browser.wait().await;
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        if let Some(dir) = self.user_data_dir.take() {
            remove_profile_dir(&dir);
        }

        info!("Browser closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("loc_lat"), "\"loc_lat\"");
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_select_script_quotes_arguments() {
        let script = select_script("tper_yearly_start_year", "2020");
        assert!(script.contains("document.getElementById(\"tper_yearly_start_year\")"));
        assert!(script.contains("o.value === \"2020\""));
    }

    #[test]
    fn test_browser_config_builds() {
        let dir = tempfile::tempdir().unwrap();
        let config = PrismConfig::new()
            .with_download_dir(dir.path())
            .with_headless(false)
            .with_chrome_executable("/usr/bin/chromium");
        assert!(browser_config(&config, &dir.path().join("profile")).is_ok());
    }

    #[test]
    fn test_readiness_scripts() {
        let present = readiness_script("tper_monthly_start_month", Readiness::Present);
        assert!(present.contains("document.getElementById(\"tper_monthly_start_month\")"));
        assert!(!present.contains("getBoundingClientRect"));
        assert!(!present.contains("disabled"));

        let interactable = readiness_script("submit_button", Readiness::Interactable);
        assert!(interactable.contains("getBoundingClientRect"));
        assert!(interactable.contains("!el.disabled"));
    }

    #[test]
    fn test_profile_dirs_are_unique() {
        let first = profile_dir();
        std::thread::sleep(Duration::from_millis(1));
        assert_ne!(first, profile_dir());
        assert!(first.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_remove_profile_dir() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("prism-pull-test");
        std::fs::create_dir_all(profile.join("Default")).unwrap();
        std::fs::write(profile.join("Default").join("Preferences"), "{}").unwrap();

        remove_profile_dir(&profile);
        assert!(!profile.exists());

        // already gone
        remove_profile_dir(&profile);
    }
}

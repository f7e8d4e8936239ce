//! Chromium implementation of the page automation port, driven over CDP.
//!
//! Every [`ChromiumSessionFactory::open`] launches a separate browser process
//! with its own throwaway profile directory, so no cookies or storage leak
//! between queries.

use crate::config::BrowserSettings;
use crate::domain::ports::{Locator, PageAutomation, SessionFactory};
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

fn cdp_error(action: &str, error: impl std::fmt::Display) -> MonitorError {
    MonitorError::automation(action, error)
}

pub struct ChromiumSessionFactory {
    settings: BrowserSettings,
}

impl ChromiumSessionFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn profile_dir() -> PathBuf {
        let n = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("flight-monitor-{}-{}", std::process::id(), n))
    }

    fn browser_config(&self, profile_dir: &Path) -> Result<BrowserConfig> {
        let settings = &self.settings;
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .launch_timeout(Duration::from_millis(settings.launch_timeout_ms))
            .user_data_dir(profile_dir)
            .arg("--lang=pt-BR");

        if !settings.headless {
            builder = builder.with_head();
        }
        if settings.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(|e| cdp_error("configure browser", e))
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageAutomation>> {
        let profile_dir = Self::profile_dir();
        let config = self.browser_config(&profile_dir)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| cdp_error("launch browser", e))?;

        // CDP 事件需要持續被消化，瀏覽器才會回應指令
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_error) = shutdown(&mut browser, &handler, &profile_dir).await {
                    tracing::debug!("Browser cleanup after failed page open: {}", close_error);
                }
                return Err(cdp_error("open page", e));
            }
        };

        tracing::debug!("Browser session opened ({})", profile_dir.display());
        Ok(Box::new(ChromiumSession {
            browser: Mutex::new(browser),
            page,
            handler,
            profile_dir,
        }))
    }
}

pub struct ChromiumSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl ChromiumSession {
    /// 依 CSS 選擇器找出元素，再套用文字過濾 (不含 `nth`)
    async fn matching(&self, locator: &Locator) -> Result<Vec<Element>> {
        let elements = located(self.page.find_elements(locator.selector.as_str()).await, locator)?;

        let Some(text) = &locator.text else {
            return Ok(elements);
        };

        let mut matching = Vec::new();
        for element in elements {
            let inner = element.inner_text().await.ok().flatten().unwrap_or_default();
            if inner.contains(text.as_str()) {
                matching.push(element);
            }
        }
        Ok(matching)
    }

    async fn resolve(&self, locator: &Locator, action: &str) -> Result<Element> {
        self.matching(locator)
            .await?
            .into_iter()
            .nth(locator.nth)
            .ok_or_else(|| cdp_error(action, format!("no element matches {}", locator)))
    }

    async fn poll_until<F, Fut>(&self, what: String, timeout: Duration, mut check: F) -> Result<()>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = bool> + Send,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if check().await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(MonitorError::Timeout {
                    what,
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// 沒有符合的元素時 CDP 回傳空集合；其他錯誤 (瀏覽器斷線、選擇器無效) 原樣往上傳
fn located<T>(
    found: std::result::Result<Vec<T>, impl std::fmt::Display>,
    locator: &Locator,
) -> Result<Vec<T>> {
    found.map_err(|e| cdp_error("locate", format!("{}: {}", locator, e)))
}

/// 關閉瀏覽器、停止事件處理並刪除暫存 profile
async fn shutdown(
    browser: &mut Browser,
    handler: &JoinHandle<()>,
    profile_dir: &Path,
) -> Result<()> {
    let closed = browser.close().await;
    if closed.is_ok() {
        let _ = browser.wait().await;
    }
    handler.abort();
    discard_profile(profile_dir).await;

    closed.map(|_| ()).map_err(|e| cdp_error("close browser", e))
}

async fn discard_profile(profile_dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(profile_dir).await {
        tracing::debug!("Could not remove profile {}: {}", profile_dir.display(), e);
    }
}

fn invocation(script: &str, args: &Value) -> String {
    let args = match args {
        Value::Array(_) => args.clone(),
        Value::Null => Value::Array(Vec::new()),
        other => Value::Array(vec![other.clone()]),
    };
    format!("({})(...{})", script, args)
}

#[async_trait]
impl PageAutomation for ChromiumSession {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(result) => result.map(|_| ()).map_err(|e| cdp_error("navigate", e)),
            Err(_) => Err(MonitorError::Timeout {
                what: format!("navigation to {}", url),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        Ok(self.matching(locator).await?.len())
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let element = self.resolve(locator, "click").await?;
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| cdp_error("click", format!("{}: {}", locator, e)))
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        let element = self.resolve(locator, "fill").await?;
        element
            .call_js_fn("function() { this.focus(); this.value = ''; }", false)
            .await
            .map_err(|e| cdp_error("fill", format!("{}: {}", locator, e)))?;
        element
            .type_str(text)
            .await
            .map(|_| ())
            .map_err(|e| cdp_error("fill", format!("{}: {}", locator, e)))
    }

    async fn hover(&self, locator: &Locator) -> Result<()> {
        let element = self.resolve(locator, "hover").await?;
        element
            .hover()
            .await
            .map(|_| ())
            .map_err(|e| cdp_error("hover", format!("{}: {}", locator, e)))
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()> {
        let element = self.resolve(locator, "scroll").await?;
        element
            .scroll_into_view()
            .await
            .map(|_| ())
            .map_err(|e| cdp_error("scroll", format!("{}: {}", locator, e)))
    }

    async fn evaluate(&self, script: &str, args: Value) -> Result<Value> {
        let result = self
            .page
            .evaluate(invocation(script, &args))
            .await
            .map_err(|e| cdp_error("evaluate script", e))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn wait_for_selector(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.poll_until(locator.to_string(), timeout, || async move {
            self.count(locator).await.map(|n| n > locator.nth).unwrap_or(false)
        })
        .await
    }

    async fn wait_for_predicate(&self, predicate: &str, args: Value, timeout: Duration) -> Result<()> {
        let expression = format!("!!{}", invocation(predicate, &args));
        let expression = expression.as_str();
        self.poll_until("page condition".to_string(), timeout, || async move {
            // 頁面切換中執行失敗視為條件尚未成立
            match self.page.evaluate(expression).await {
                Ok(result) => result.into_value::<bool>().unwrap_or(false),
                Err(e) => {
                    tracing::trace!("Predicate evaluation failed: {}", e);
                    false
                }
            }
        })
        .await
    }

    async fn wait_fixed(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(|e| cdp_error("read url", e))?
            .ok_or_else(|| cdp_error("read url", "page has no url"))
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        shutdown(&mut browser, &self.handler, &self.profile_dir).await
    }
}

use crate::domain::model::MonitoringRun;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 頁面元素的定位描述：CSS 選擇器、可選的文字過濾、以及第幾個符合的元素
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub nth: usize,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            text: None,
            nth: 0,
        }
    }

    /// 只保留文字內容包含 `text` 的元素
    pub fn has_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.nth = index;
        self
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.selector)?;
        if let Some(text) = &self.text {
            write!(f, ":has-text(\"{}\")", text)?;
        }
        if self.nth > 0 {
            write!(f, " >> nth={}", self.nth)?;
        }
        Ok(())
    }
}

/// 瀏覽器頁面操作的抽象。每個呼叫都會等到動作完成或自身逾時才返回。
///
/// `evaluate` 的 `script` 是一個 JavaScript 函式表達式，`args` 為 JSON 陣列，
/// 會展開成函式參數。
#[async_trait]
pub trait PageAutomation: Send + Sync {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// 符合 locator 的元素數量 (忽略 `nth`)
    async fn count(&self, locator: &Locator) -> Result<usize>;

    async fn click(&self, locator: &Locator) -> Result<()>;
    async fn fill(&self, locator: &Locator, text: &str) -> Result<()>;
    async fn hover(&self, locator: &Locator) -> Result<()>;
    async fn scroll_into_view(&self, locator: &Locator) -> Result<()>;

    async fn evaluate(&self, script: &str, args: serde_json::Value) -> Result<serde_json::Value>;

    async fn wait_for_selector(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// 等到 `predicate(...args)` 回傳 true
    async fn wait_for_predicate(
        &self,
        predicate: &str,
        args: serde_json::Value,
        timeout: Duration,
    ) -> Result<()>;

    async fn wait_fixed(&self, duration: Duration);

    async fn current_url(&self) -> Result<String>;

    /// 關閉整個 session (頁面與瀏覽器)
    async fn close(&self) -> Result<()>;
}

/// 每次查詢開啟一個全新、獨立的自動化 session
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageAutomation>>;
}

/// 報告輸出 (聊天訊息、HTML 檔案、Gist ...)
#[async_trait]
pub trait Reporter: Send + Sync {
    fn name(&self) -> &str;
    async fn publish(&self, run: &MonitoringRun) -> Result<()>;
}

/// 報告檔案的輸出目的地
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

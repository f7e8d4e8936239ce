//! Scripted in-memory page used by the pipeline unit tests.

use crate::config::{CalendarSelectors, ExtractionConfig};
use crate::core::scripts;
use crate::domain::ports::{Locator, PageAutomation, SessionFactory};
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) fn script_name(script: &str) -> &'static str {
    match script {
        s if s == scripts::DISPATCH_CHANGE_EVENTS => "dispatch_change",
        s if s == scripts::SYNC_DATE_INPUT => "sync_date",
        s if s == scripts::CALENDAR_HEADER => "calendar_header",
        s if s == scripts::SUBMIT_FORM => "submit_form",
        s if s == scripts::RESULTS_READY => "results_ready",
        s if s == scripts::FIELD_VALUE_CONTAINS => "field_value",
        s if s == scripts::SCROLL_TO_BOTTOM => "scroll_bottom",
        s if s == scripts::COLLECT_CARDS => "collect_cards",
        _ => "unknown",
    }
}

#[derive(Default)]
struct Shared {
    actions: Mutex<Vec<String>>,
    month: Mutex<(i32, u32)>,
    counts: Mutex<VecDeque<usize>>,
    last_count: Mutex<usize>,
    closed: AtomicBool,
}

/// 模擬頁面：日曆可以翻月、結果數量依腳本變化、卡片資料固定
#[derive(Clone)]
pub(crate) struct FakePage {
    calendar: CalendarSelectors,
    card_selector: String,
    header: Option<Value>,
    cards: Value,
    fail_on: Option<String>,
    results_never_appear: bool,
    url: String,
    shared: Arc<Shared>,
}

impl FakePage {
    pub fn new() -> Self {
        let shared = Shared::default();
        *shared.month.lock().unwrap() = (2026, 1);
        Self {
            calendar: CalendarSelectors::default(),
            card_selector: ExtractionConfig::default().card_selector,
            header: None,
            cards: json!([]),
            fail_on: None,
            results_never_appear: false,
            url: "https://www.vaidepromo.com.br/passagens-aereas/busca?o=GRU".to_string(),
            shared: Arc::new(shared),
        }
    }

    pub fn showing(self, year: i32, month: u32) -> Self {
        *self.shared.month.lock().unwrap() = (year, month);
        self
    }

    /// 讓日曆標題回傳固定內容 (例如無法辨識的月份)
    pub fn with_header(mut self, header: Value) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_counts(self, counts: &[usize]) -> Self {
        *self.shared.counts.lock().unwrap() = counts.iter().copied().collect();
        self
    }

    pub fn with_cards(mut self, cards: Value) -> Self {
        self.cards = cards;
        self
    }

    /// 任何以 `prefix` 開頭的動作都會失敗
    pub fn failing_on(mut self, prefix: &str) -> Self {
        self.fail_on = Some(prefix.to_string());
        self
    }

    pub fn results_never_appear(mut self) -> Self {
        self.results_never_appear = true;
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.shared.actions.lock().unwrap().clone()
    }

    pub fn count_of(&self, prefix: &str) -> usize {
        self.actions().iter().filter(|a| a.starts_with(prefix)).count()
    }

    pub fn displayed_month(&self) -> (i32, u32) {
        *self.shared.month.lock().unwrap()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    fn record(&self, action: String) -> Result<()> {
        let fails = self
            .fail_on
            .as_deref()
            .is_some_and(|prefix| action.starts_with(prefix));
        self.shared.actions.lock().unwrap().push(action.clone());
        if fails {
            return Err(MonitorError::automation(action, "scripted failure"));
        }
        Ok(())
    }

    fn day_in_view(&self, locator: &Locator) -> Option<bool> {
        let (prefix, suffix) = self.calendar.day_button.split_once("{date}")?;
        let raw = locator
            .selector
            .strip_prefix(prefix)?
            .strip_suffix(suffix)?;
        let date = NaiveDate::parse_from_str(raw, &self.calendar.day_format).ok()?;
        Some((date.year(), date.month()) == self.displayed_month())
    }

    fn next_card_count(&self) -> usize {
        let mut last = self.shared.last_count.lock().unwrap();
        if let Some(next) = self.shared.counts.lock().unwrap().pop_front() {
            *last = next;
        }
        *last
    }
}

#[async_trait]
impl PageAutomation for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.record(format!("goto:{}", url))
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        self.record(format!("count:{}", locator))?;
        if locator.selector == self.card_selector {
            return Ok(self.next_card_count());
        }
        Ok(match self.day_in_view(locator) {
            Some(true) => 1,
            Some(false) => 0,
            None => 1,
        })
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        self.record(format!("click:{}", locator))?;
        if locator.selector == self.calendar.next_button {
            let mut month = self.shared.month.lock().unwrap();
            *month = if month.1 == 12 {
                (month.0 + 1, 1)
            } else {
                (month.0, month.1 + 1)
            };
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        self.record(format!("fill:{}={}", locator, text))
    }

    async fn hover(&self, locator: &Locator) -> Result<()> {
        self.record(format!("hover:{}", locator))
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()> {
        self.record(format!("scroll:{}", locator))
    }

    async fn evaluate(&self, script: &str, _args: Value) -> Result<Value> {
        let name = script_name(script);
        self.record(format!("eval:{}", name))?;
        Ok(match name {
            "calendar_header" => match &self.header {
                Some(header) => header.clone(),
                None => {
                    let (year, month) = self.displayed_month();
                    json!({
                        "month": self.calendar.month_names[month as usize - 1],
                        "year": year.to_string(),
                    })
                }
            },
            "collect_cards" => self.cards.clone(),
            "scroll_bottom" => json!(4200),
            _ => json!(true),
        })
    }

    async fn wait_for_selector(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.record(format!("wait_selector:{}", locator))?;
        if self.day_in_view(locator) == Some(false) {
            return Err(MonitorError::Timeout {
                what: locator.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn wait_for_predicate(
        &self,
        predicate: &str,
        _args: Value,
        timeout: Duration,
    ) -> Result<()> {
        let name = script_name(predicate);
        self.record(format!("wait_predicate:{}", name))?;
        if name == "results_ready" && self.results_never_appear {
            tokio::time::sleep(timeout).await;
            return Err(MonitorError::Timeout {
                what: name.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn wait_fixed(&self, duration: Duration) {
        self.shared
            .actions
            .lock()
            .unwrap()
            .push(format!("wait:{}", duration.as_millis()));
        tokio::time::sleep(duration).await;
    }

    async fn current_url(&self) -> Result<String> {
        self.record("url".to_string())?;
        Ok(self.url.clone())
    }

    async fn close(&self) -> Result<()> {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.record("close".to_string())
    }
}

/// 依序交出預先準備好的頁面；用完後開啟失敗
pub(crate) struct FakeFactory {
    pages: Mutex<VecDeque<FakePage>>,
}

impl FakeFactory {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
        }
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open(&self) -> Result<Box<dyn PageAutomation>> {
        let page = self.pages.lock().unwrap().pop_front();
        match page {
            Some(page) => Ok(Box::new(page)),
            None => Err(MonitorError::automation("launch browser", "no session available")),
        }
    }
}

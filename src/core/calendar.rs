use crate::config::{CalendarSelectors, InteractionPolicy, TimingConfig};
use crate::core::interaction::human_click;
use crate::core::scripts;
use crate::domain::model::query_date;
use crate::domain::ports::{Locator, PageAutomation};
use crate::utils::error::{MonitorError, Result};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::json;

/// 日曆上的月份 (年, 月)，依時間先後排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// 依網站語系的月份名稱表查出月份 (1-12)，不分大小寫
pub fn month_from_name(month_names: &[String], raw: &str) -> Option<u32> {
    let raw = raw.trim().to_lowercase();
    month_names
        .iter()
        .position(|name| name.to_lowercase() == raw)
        .map(|idx| idx as u32 + 1)
}

#[derive(Debug, Deserialize)]
struct CalendarHeader {
    month: Option<String>,
    year: Option<String>,
}

/// 在分頁式的月曆上翻到目標日期並選取它
pub struct CalendarNavigator<'a> {
    selectors: &'a CalendarSelectors,
    timing: &'a TimingConfig,
    interaction: &'a InteractionPolicy,
}

impl<'a> CalendarNavigator<'a> {
    pub fn new(
        selectors: &'a CalendarSelectors,
        timing: &'a TimingConfig,
        interaction: &'a InteractionPolicy,
    ) -> Self {
        Self {
            selectors,
            timing,
            interaction,
        }
    }

    /// 選取 `target`，回傳點擊「下個月」的次數。
    ///
    /// 只能往後翻：日曆初始畫面已經晚於目標月份時直接回傳
    /// [`MonitorError::DateNotFound`]。翻超過 `calendar_max_months` 次仍未到達
    /// 目標月份同樣視為找不到日期。
    ///
    /// 注意：過去月份不會先一路點「下個月」翻到上限才失敗 (run-to-bound)，
    /// 而是在第一次讀到標題時就失敗，且不點擊任何按鈕。錯誤型別與翻到上限時相同。
    pub async fn select_date(&self, page: &dyn PageAutomation, target: NaiveDate) -> Result<u32> {
        let max_months = self.timing.calendar_max_months;
        let target_month = YearMonth::of(target);
        let next = Locator::css(&self.selectors.next_button);

        page.wait_for_selector(
            &Locator::css(&self.selectors.month_title),
            self.timing.selector_timeout(),
        )
        .await?;

        let mut advances = 0;
        loop {
            let shown = self.displayed_month(page).await?;
            if shown == target_month {
                break;
            }
            if shown > target_month {
                return Err(self.not_found(
                    target,
                    format!(
                        "calendar opens at {}, after the target month; past dates are not supported",
                        shown
                    ),
                ));
            }
            if advances >= max_months {
                return Err(self.not_found(
                    target,
                    format!("still showing {} after advancing {} months", shown, max_months),
                ));
            }

            page.click(&next).await?;
            advances += 1;
            page.wait_fixed(self.timing.calendar_step_delay()).await;
        }

        tracing::debug!("Calendar reached {} after {} advances", target_month, advances);

        let day = self.day_locator(target);
        page.wait_for_selector(&day, self.timing.selector_timeout()).await?;
        human_click(page, &day, self.interaction).await?;

        // 直接點擊 DOM 不一定會更新前端框架的狀態，手動同步輸入框
        let display = target.format(query_date::DISPLAY_FORMAT).to_string();
        let synced = page
            .evaluate(
                scripts::SYNC_DATE_INPUT,
                json!([self.selectors.bound_input, display]),
            )
            .await?;
        if synced != json!(true) {
            tracing::warn!(
                "Date input {} not found; relying on the click alone",
                self.selectors.bound_input
            );
        }

        Ok(advances)
    }

    pub fn day_locator(&self, target: NaiveDate) -> Locator {
        let formatted = target.format(&self.selectors.day_format).to_string();
        Locator::css(self.selectors.day_button.replace("{date}", &formatted))
    }

    async fn displayed_month(&self, page: &dyn PageAutomation) -> Result<YearMonth> {
        let raw = page
            .evaluate(
                scripts::CALENDAR_HEADER,
                json!([self.selectors.month_name, self.selectors.year]),
            )
            .await?;
        let header: CalendarHeader = serde_json::from_value(raw)
            .map_err(|e| MonitorError::automation("read calendar header", e))?;

        let month_text = header.month.unwrap_or_default();
        let month = month_from_name(&self.selectors.month_names, &month_text).ok_or_else(|| {
            MonitorError::automation(
                "read calendar header",
                format!("unknown month name '{}'", month_text),
            )
        })?;

        let year_text = header.year.unwrap_or_default();
        let year = year_text.trim().parse::<i32>().map_err(|_| {
            MonitorError::automation(
                "read calendar header",
                format!("unreadable year '{}'", year_text),
            )
        })?;

        Ok(YearMonth { year, month })
    }

    fn not_found(&self, target: NaiveDate, reason: String) -> MonitorError {
        MonitorError::DateNotFound {
            target: target.format(query_date::DISPLAY_FORMAT).to_string(),
            reason,
        }
    }
}

//! Rendering of a [`MonitoringRun`](crate::domain::model::MonitoringRun) into
//! chat text and a standalone HTML page.

pub mod html;
pub mod summary;

pub use html::render_html_report;
pub use summary::render_chat_summary;

use crate::config::ReportConfig;
use crate::utils::error::Result;
use chrono::{DateTime, FixedOffset, Utc};

/// 以報告設定的時區表示的目前時間
pub fn local_now(settings: &ReportConfig) -> Result<DateTime<FixedOffset>> {
    Ok(Utc::now().with_timezone(&settings.offset()?))
}

/// Telegram 的 HTML parse mode 與報告頁面共用的跳脫
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

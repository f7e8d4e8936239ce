#[cfg(feature = "cli")]
pub mod cli;
pub mod monitor_config;

pub use monitor_config::{
    resolved, BrowserSettings, CalendarSelectors, ExtractionConfig, FinalPriceRule, GistConfig,
    HtmlReportConfig, InteractionPolicy, MonitorConfig, ReportConfig, SiteConfig, SubmitMode,
    TelegramConfig, TimingConfig,
};

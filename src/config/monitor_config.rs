use crate::domain::model::Query;
use crate::domain::ports::Locator;
use crate::utils::error::{MonitorError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(alias = "CONSULTAS")]
    pub queries: Vec<Query>,
    #[serde(default = "default_delay_secs", alias = "DELAY_ENTRE_CONSULTAS")]
    pub delay_between_queries_secs: u64,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub interaction: InteractionPolicy,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub report: ReportConfig,
}

/// 目標網站的網址與所有選擇器
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub url: String,
    pub one_way_toggle: Locator,
    pub origin_field: String,
    pub destination_field: String,
    pub autocomplete_option: String,
    /// 選擇候選項後，等待欄位值包含機場代碼
    pub confirm_location_value: bool,
    pub date_field: Locator,
    pub calendar: CalendarSelectors,
    pub submit: SubmitMode,
    /// 結果頁網址包含此片段即視為已送出
    pub results_url_fragment: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "https://www.vaidepromo.com.br/passagens-aereas/".to_string(),
            one_way_toggle: Locator::css("button").has_text("Só ida ou volta"),
            origin_field: r#"[data-cy="departure"]"#.to_string(),
            destination_field: r#"[data-cy="arrival"]"#.to_string(),
            autocomplete_option: r#"[role="option"]"#.to_string(),
            confirm_location_value: false,
            date_field: Locator::css(r#"[data-cy="departure-date"] input"#),
            calendar: CalendarSelectors::default(),
            submit: SubmitMode::default(),
            results_url_fragment: "search".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSelectors {
    pub month_title: String,
    pub month_name: String,
    pub year: String,
    pub next_button: String,
    /// `{date}` 會被替換成 `day_format` 格式的目標日期
    pub day_button: String,
    pub day_format: String,
    /// 與日期綁定的文字輸入框，點擊後需要手動觸發事件
    pub bound_input: String,
    /// 一月到十二月的名稱，依網站語系
    pub month_names: Vec<String>,
}

impl Default for CalendarSelectors {
    fn default() -> Self {
        Self {
            month_title: "div[class*='monthTitle']".to_string(),
            month_name: "div[class*='monthTitle'] strong".to_string(),
            year: "div[class*='monthTitle'] span".to_string(),
            next_button: r#"button[data-cy="data-range-picker-next"]"#.to_string(),
            day_button: r#"button[data-cy="{date}"]"#.to_string(),
            day_format: "%d-%m-%Y".to_string(),
            bound_input: r#"[data-cy="departure-date"] input"#.to_string(),
            month_names: [
                "Janeiro",
                "Fevereiro",
                "Março",
                "Abril",
                "Maio",
                "Junho",
                "Julho",
                "Agosto",
                "Setembro",
                "Outubro",
                "Novembro",
                "Dezembro",
            ]
            .iter()
            .map(|m| m.to_string())
            .collect(),
        }
    }
}

/// 搜尋表單的送出方式，依網站版本不同
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SubmitMode {
    /// 直接對表單派發 submit 事件
    FormEvent { form_selector: String },
    /// 點擊搜尋按鈕
    ButtonClick { button: Locator },
}

impl Default for SubmitMode {
    fn default() -> Self {
        Self::FormEvent {
            form_selector: "form".to_string(),
        }
    }
}

/// 所有逾時、暫停與上限 (毫秒)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub navigation_timeout_ms: u64,
    pub selector_timeout_ms: u64,
    pub autocomplete_timeout_ms: u64,
    pub calendar_max_months: u32,
    pub calendar_step_delay_ms: u64,
    pub results_timeout_ms: u64,
    pub post_submit_wait_ms: u64,
    pub scroll_passes: u32,
    pub scroll_pause_ms: u64,
    pub stabilization_timeout_ms: u64,
    pub stabilization_interval_ms: u64,
    pub stable_reads: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 60_000,
            selector_timeout_ms: 5_000,
            autocomplete_timeout_ms: 5_000,
            calendar_max_months: 24,
            calendar_step_delay_ms: 600,
            results_timeout_ms: 60_000,
            post_submit_wait_ms: 0,
            scroll_passes: 4,
            scroll_pause_ms: 1_000,
            stabilization_timeout_ms: 30_000,
            stabilization_interval_ms: 1_000,
            stable_reads: 3,
        }
    }
}

impl TimingConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    pub fn autocomplete_timeout(&self) -> Duration {
        Duration::from_millis(self.autocomplete_timeout_ms)
    }

    pub fn calendar_step_delay(&self) -> Duration {
        Duration::from_millis(self.calendar_step_delay_ms)
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_millis(self.results_timeout_ms)
    }

    pub fn post_submit_wait(&self) -> Duration {
        Duration::from_millis(self.post_submit_wait_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn stabilization_timeout(&self) -> Duration {
        Duration::from_millis(self.stabilization_timeout_ms)
    }

    pub fn stabilization_interval(&self) -> Duration {
        Duration::from_millis(self.stabilization_interval_ms)
    }
}

/// 模擬人類點擊的節奏：捲動、懸停、暫停、點擊、暫停
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionPolicy {
    pub enabled: bool,
    pub hover_pause_ms: u64,
    pub post_click_pause_ms: u64,
}

impl Default for InteractionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            hover_pause_ms: 150,
            post_click_pause_ms: 300,
        }
    }
}

impl InteractionPolicy {
    pub fn hover_pause(&self) -> Duration {
        Duration::from_millis(self.hover_pause_ms)
    }

    pub fn post_click_pause(&self) -> Duration {
        Duration::from_millis(self.post_click_pause_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub card_selector: String,
    pub price_selector: String,
    pub currency_marker: String,
    pub final_price: FinalPriceRule,
    pub airline_image_selector: String,
    pub airline_code_selector: String,
    pub unidentified_airline: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            card_selector: r#"div[class*="_content_"]"#.to_string(),
            price_selector: "strong".to_string(),
            currency_marker: "R$".to_string(),
            final_price: FinalPriceRule::default(),
            airline_image_selector: "img[alt]".to_string(),
            airline_code_selector: r#"span[class*="iata"]"#.to_string(),
            unidentified_airline: "Companhia não identificada".to_string(),
        }
    }
}

/// 一張卡片上有多個價格時，如何決定「實際收費」的價格
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FinalPriceRule {
    /// 取數值最大者 (總價通常是最後、最大的數字)
    #[default]
    Max,
    /// 取位於 `selector` 內的價格；找不到時退回 `Max`
    Marked { selector: String },
    /// 取第 `index` 個價格文字 (從 0 起算)；超出範圍時取最後一個
    Position { index: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub executable: Option<String>,
    pub no_sandbox: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub launch_timeout_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            no_sandbox: true,
            window_width: 1366,
            window_height: 900,
            launch_timeout_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    pub link_label: String,
    /// 報告顯示時間所用的 UTC 偏移 (小時)
    pub utc_offset_hours: i32,
    /// 聊天摘要中每個查詢列出的航班數
    pub top_offers: usize,
    pub html: Option<HtmlReportConfig>,
    pub telegram: Option<TelegramConfig>,
    pub gist: Option<GistConfig>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "VaiPromo Monitor".to_string(),
            link_label: "Ver no VaiPromo".to_string(),
            utc_offset_hours: -3,
            top_offers: 3,
            html: None,
            telegram: None,
            gist: None,
        }
    }
}

impl ReportConfig {
    pub fn offset(&self) -> Result<chrono::FixedOffset> {
        chrono::FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            MonitorError::InvalidConfigValueError {
                field: "report.utc_offset_hours".to_string(),
                value: self.utc_offset_hours.to_string(),
                reason: "Offset out of range".to_string(),
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlReportConfig {
    #[serde(default = "default_html_dir")]
    pub output_dir: String,
    #[serde(default = "default_html_filename")]
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// 已知的訊息 ID：優先編輯該訊息，而不是發送新訊息
    pub message_id: Option<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GistConfig {
    #[serde(default = "default_github_api")]
    pub api_base: String,
    pub token: Option<String>,
    pub gist_id: Option<String>,
    #[serde(default = "default_html_filename")]
    pub filename: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_delay_secs() -> u64 {
    5
}

fn default_html_dir() -> String {
    "docs".to_string()
}

fn default_html_filename() -> String {
    "relatorio.html".to_string()
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

/// 未設定的環境變數會保留 `${VAR}` 原樣；視為沒有提供
pub fn resolved(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !(v.starts_with("${") && v.ends_with('}')))
}

impl MonitorConfig {
    /// 從檔案載入配置；`.json` 使用 JSON，其餘視為 TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_toml_str(&content)?,
        };

        tracing::info!("Configuration loaded: {} queries", config.queries.len());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MonitorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        serde_json::from_str(&processed_content).map_err(|e| {
            MonitorError::ConfigValidationError {
                field: "json_parsing".to_string(),
                message: format!("JSON parsing error: {}", e),
            }
        })
    }

    /// 替換環境變數 (例如 ${TELEGRAM_BOT_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| MonitorError::config(format!("env substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn delay_between_queries(&self) -> Duration {
        Duration::from_secs(self.delay_between_queries_secs)
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.queries.is_empty() {
            return Err(MonitorError::MissingConfigError {
                field: "queries".to_string(),
            });
        }

        for (i, query) in self.queries.iter().enumerate() {
            validation::validate_airport_code(&format!("queries[{}].origin", i), &query.origin)?;
            validation::validate_airport_code(
                &format!("queries[{}].destination", i),
                &query.destination,
            )?;
        }

        validation::validate_range(
            "delay_between_queries_secs",
            self.delay_between_queries_secs,
            0,
            3600,
        )?;

        validation::validate_url("site.url", &self.site.url)?;
        validation::validate_non_empty_string("site.origin_field", &self.site.origin_field)?;
        validation::validate_non_empty_string(
            "site.destination_field",
            &self.site.destination_field,
        )?;

        let calendar = &self.site.calendar;
        if calendar.month_names.len() != 12 {
            return Err(MonitorError::InvalidConfigValueError {
                field: "site.calendar.month_names".to_string(),
                value: calendar.month_names.len().to_string(),
                reason: "Exactly 12 month names are required".to_string(),
            });
        }
        if !calendar.day_button.contains("{date}") {
            return Err(MonitorError::InvalidConfigValueError {
                field: "site.calendar.day_button".to_string(),
                value: calendar.day_button.clone(),
                reason: "Selector must contain the {date} placeholder".to_string(),
            });
        }

        validation::validate_range(
            "timing.calendar_max_months",
            self.timing.calendar_max_months,
            1,
            120,
        )?;
        validation::validate_positive_number(
            "timing.stable_reads",
            self.timing.stable_reads as usize,
            1,
        )?;
        validation::validate_range(
            "timing.stabilization_interval_ms",
            self.timing.stabilization_interval_ms,
            1,
            60_000,
        )?;
        validation::validate_range("timing.scroll_passes", self.timing.scroll_passes, 0, 50)?;

        validation::validate_non_empty_string(
            "extraction.card_selector",
            &self.extraction.card_selector,
        )?;
        validation::validate_non_empty_string(
            "extraction.currency_marker",
            &self.extraction.currency_marker,
        )?;
        if let FinalPriceRule::Marked { selector } = &self.extraction.final_price {
            validation::validate_non_empty_string("extraction.final_price.selector", selector)?;
        }

        validation::validate_range("report.utc_offset_hours", self.report.utc_offset_hours, -12, 14)?;
        if let Some(telegram) = &self.report.telegram {
            validation::validate_url("report.telegram.api_base", &telegram.api_base)?;
        }
        if let Some(gist) = &self.report.gist {
            validation::validate_url("report.gist.api_base", &gist.api_base)?;
        }

        Ok(())
    }
}

impl Validate for MonitorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

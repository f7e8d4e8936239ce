use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Date {target} not found in calendar: {reason}")]
    DateNotFound { target: String, reason: String },

    #[error("Browser automation failed during {action}: {message}")]
    Automation { action: String, message: String },

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Flight extraction failed: {message}")]
    Extraction { message: String },

    #[error("Notification delivery failed via {channel}: {message}")]
    Notification { channel: String, message: String },
}

pub type Result<T> = std::result::Result<T, MonitorError>;

/// 錯誤嚴重程度，決定 CLI 的結束碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Automation,
    Extraction,
    Delivery,
    System,
}

impl MonitorError {
    pub fn automation(action: impl Into<String>, message: impl ToString) -> Self {
        Self::Automation {
            action: action.into(),
            message: message.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::DateNotFound { .. } | Self::Automation { .. } | Self::Timeout { .. } => {
                ErrorCategory::Automation
            }
            Self::Extraction { .. } | Self::SerializationError(_) => ErrorCategory::Extraction,
            Self::HttpError(_) | Self::Notification { .. } => ErrorCategory::Delivery,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Automation => ErrorSeverity::High,
            ErrorCategory::Delivery => ErrorSeverity::Medium,
            ErrorCategory::Extraction => ErrorSeverity::Low,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 只有配置錯誤可以中止整個執行
    pub fn aborts_run(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingConfigError { field } => {
                format!("The configuration is missing '{}'", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("The configuration value '{}' is invalid: {}", field, reason)
            }
            Self::DateNotFound { target, .. } => {
                format!("Could not reach {} in the site's calendar", target)
            }
            Self::Timeout { what, .. } => format!("The site did not respond in time ({})", what),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the configuration file: query dates use dd/mm/yyyy and airport codes have 3 letters"
            }
            ErrorCategory::Automation => {
                "The site may be slow or its markup changed; retry later or review the [site] selectors"
            }
            ErrorCategory::Extraction => "Review the [extraction] selectors against the live page",
            ErrorCategory::Delivery => "Check the notification tokens and network connectivity",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

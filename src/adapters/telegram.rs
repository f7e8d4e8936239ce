use crate::config::{resolved, ReportConfig, TelegramConfig};
use crate::domain::model::MonitoringRun;
use crate::domain::ports::Reporter;
use crate::report::{local_now, render_chat_summary};
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

/// 透過 Telegram Bot API 發送摘要。
///
/// 設定了 `message_id` 時先嘗試編輯那則訊息，失敗才發新訊息，
/// 讓頻道中只保留一則持續更新的摘要。
pub struct TelegramReporter {
    client: Client,
    config: TelegramConfig,
    settings: ReportConfig,
}

impl TelegramReporter {
    pub fn new(config: TelegramConfig, settings: ReportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            settings,
        })
    }

    fn endpoint(&self, token: &str, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            token,
            method
        )
    }

    /// HTTP 錯誤狀態也會帶回 JSON 內容，由 `ok` 欄位判斷成功與否
    async fn call(&self, token: &str, method: &str, payload: &Value) -> Result<ApiResponse> {
        let response = self
            .client
            .post(self.endpoint(token, method))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Telegram {} response status: {}", method, status);

        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or(ApiResponse {
            ok: false,
            description: Some(format!("HTTP {}: {}", status, body)),
            result: None,
        }))
    }

    /// 回傳實際送出的方式 (`editMessageText` 或 `sendMessage`)
    pub async fn deliver(&self, text: &str) -> Result<&'static str> {
        let (Some(token), Some(chat_id)) = (
            resolved(&self.config.bot_token),
            resolved(&self.config.chat_id),
        ) else {
            tracing::warn!("⚠️ Telegram not configured (bot_token/chat_id missing), skipping");
            return Ok("skipped");
        };

        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        if let Some(message_id) = resolved(&self.config.message_id) {
            let mut edit = payload.clone();
            edit["message_id"] = match message_id.parse::<i64>() {
                Ok(id) => json!(id),
                Err(_) => json!(message_id),
            };

            let response = self.call(token, "editMessageText", &edit).await?;
            if response.ok {
                tracing::info!("✏️ Telegram message {} updated", message_id);
                return Ok("editMessageText");
            }
            tracing::warn!(
                "⚠️ Could not edit message {} ({}), sending a new one",
                message_id,
                response.description.as_deref().unwrap_or("unknown reason")
            );
        }

        let response = self.call(token, "sendMessage", &payload).await?;
        if !response.ok {
            return Err(MonitorError::Notification {
                channel: "telegram".to_string(),
                message: response
                    .description
                    .unwrap_or_else(|| "sendMessage returned ok=false".to_string()),
            });
        }

        let new_id = response
            .result
            .as_ref()
            .and_then(|r| r.get("message_id"))
            .cloned()
            .unwrap_or(Value::Null);
        tracing::info!("✅ New Telegram message sent ({})", new_id);
        tracing::info!("💡 Store message id {} to keep editing the same message", new_id);
        Ok("sendMessage")
    }
}

#[async_trait]
impl Reporter for TelegramReporter {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn publish(&self, run: &MonitoringRun) -> Result<()> {
        let text = render_chat_summary(run, &self.settings, local_now(&self.settings)?);
        self.deliver(&text).await.map(|_| ())
    }
}

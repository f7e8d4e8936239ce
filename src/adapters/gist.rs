use crate::config::{resolved, GistConfig, ReportConfig};
use crate::domain::model::MonitoringRun;
use crate::domain::ports::Reporter;
use crate::report::{local_now, render_html_report};
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const USER_AGENT: &str = concat!("flight-monitor/", env!("CARGO_PKG_VERSION"));

/// 以 GitHub Gist 發布 HTML 報告 (覆寫 gist 中的單一檔案)
pub struct GistReporter {
    client: Client,
    config: GistConfig,
    settings: ReportConfig,
}

impl GistReporter {
    pub fn new(config: GistConfig, settings: ReportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            config,
            settings,
        })
    }

    /// 回傳 false 表示缺少憑證而略過
    pub async fn upload(&self, html: &str) -> Result<bool> {
        let (Some(token), Some(gist_id)) = (
            resolved(&self.config.token),
            resolved(&self.config.gist_id),
        ) else {
            tracing::warn!("⚠️ Gist not configured (token/gist_id missing), skipping");
            return Ok(false);
        };

        let url = format!(
            "{}/gists/{}",
            self.config.api_base.trim_end_matches('/'),
            gist_id
        );
        let mut files = serde_json::Map::new();
        files.insert(self.config.filename.clone(), json!({ "content": html }));
        let body = json!({ "files": files });

        let response = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        tracing::debug!("Gist API response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(MonitorError::Notification {
                channel: "gist".to_string(),
                message: format!("GitHub API returned {}: {}", status, detail),
            });
        }

        tracing::info!("✅ Gist {} updated ({})", gist_id, self.config.filename);
        Ok(true)
    }
}

#[async_trait]
impl Reporter for GistReporter {
    fn name(&self) -> &str {
        "gist"
    }

    async fn publish(&self, run: &MonitoringRun) -> Result<()> {
        let html = render_html_report(run, &self.settings, local_now(&self.settings)?);
        self.upload(&html).await.map(|_| ())
    }
}

use crate::adapters::storage::LocalStorage;
use crate::config::{HtmlReportConfig, ReportConfig};
use crate::domain::model::MonitoringRun;
use crate::domain::ports::{Reporter, Storage};
use crate::report::{local_now, render_html_report};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 把 HTML 報告寫入 [`Storage`]
pub struct HtmlFileReporter<S: Storage> {
    storage: S,
    filename: String,
    settings: ReportConfig,
}

impl<S: Storage> HtmlFileReporter<S> {
    pub fn new(storage: S, filename: impl Into<String>, settings: ReportConfig) -> Self {
        Self {
            storage,
            filename: filename.into(),
            settings,
        }
    }
}

impl HtmlFileReporter<LocalStorage> {
    pub fn from_config(html: &HtmlReportConfig, settings: &ReportConfig) -> Self {
        Self::new(
            LocalStorage::new(&html.output_dir),
            html.filename.clone(),
            settings.clone(),
        )
    }
}

#[async_trait]
impl<S: Storage> Reporter for HtmlFileReporter<S> {
    fn name(&self) -> &str {
        "html"
    }

    async fn publish(&self, run: &MonitoringRun) -> Result<()> {
        let html = render_html_report(run, &self.settings, local_now(&self.settings)?);
        self.storage
            .write_file(&self.filename, html.as_bytes())
            .await?;
        tracing::info!("📄 HTML report saved: {}", self.filename);
        Ok(())
    }
}

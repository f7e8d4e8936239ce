use crate::core::query_runner::QueryRunner;
use crate::domain::model::{MonitoringRun, Query};
use crate::domain::ports::{Reporter, SessionFactory};
use std::time::Duration;

/// 依設定順序逐一執行查詢，並把彙整結果交給各個報告輸出
pub struct MonitorOrchestrator<F: SessionFactory> {
    runner: QueryRunner<F>,
    delay: Duration,
    reporters: Vec<Box<dyn Reporter>>,
}

impl<F: SessionFactory> MonitorOrchestrator<F> {
    pub fn new(runner: QueryRunner<F>, delay: Duration) -> Self {
        Self {
            runner,
            delay,
            reporters: Vec::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn reporter_names(&self) -> Vec<&str> {
        self.reporters.iter().map(|r| r.name()).collect()
    }

    /// 結果數量與順序和 `queries` 相同；單一查詢失敗不會中斷後續查詢
    pub async fn run(&self, queries: &[Query]) -> MonitoringRun {
        tracing::info!("🚀 Starting flight monitor: {} queries", queries.len());

        let mut run = MonitoringRun::default();
        for (i, query) in queries.iter().enumerate() {
            tracing::info!("Query {}/{}: {}", i + 1, queries.len(), query);
            run.results.push(self.runner.run(query).await);

            // 查詢之間暫停，避免觸發網站的反爬蟲機制
            if i + 1 < queries.len() && !self.delay.is_zero() {
                tracing::info!("Waiting {:?}...", self.delay);
                tokio::time::sleep(self.delay).await;
            }
        }

        tracing::info!(
            "📊 {} queries, {} succeeded, {} flights",
            run.results.len(),
            run.success_count(),
            run.total_offers()
        );
        run
    }

    /// 依序呼叫所有報告輸出，回傳失敗的數量
    pub async fn publish(&self, run: &MonitoringRun) -> usize {
        let mut failures = 0;
        for reporter in &self.reporters {
            match reporter.publish(run).await {
                Ok(()) => tracing::info!("✅ Report delivered via {}", reporter.name()),
                Err(e) => {
                    failures += 1;
                    tracing::error!("❌ Report delivery via {} failed: {}", reporter.name(), e);
                }
            }
        }
        failures
    }

    pub async fn run_and_publish(&self, queries: &[Query]) -> MonitoringRun {
        let run = self.run(queries).await;
        self.publish(&run).await;
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::core::test_support::{FakeFactory, FakePage};
    use crate::utils::error::{MonitorError, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const CONFIG: &str = r#"
delay_between_queries_secs = 3

[[queries]]
origin = "GRU"
destination = "REC"
date = "15/03/2026"

[[queries]]
origin = "CGH"
destination = "SDU"
date = "20/03/2026"

[[queries]]
origin = "BSB"
destination = "SSA"
date = "25/03/2026"
"#;

    fn page() -> FakePage {
        FakePage::new()
            .showing(2026, 3)
            .with_counts(&[1, 1, 1, 1])
            .with_cards(json!([{"prices": [{"text": "R$ 300,00"}], "airline_alt": "AZUL"}]))
    }

    struct RecordingReporter {
        name: String,
        fail: bool,
        seen: Arc<Mutex<Vec<usize>>>,
    }

    #[async_trait]
    impl Reporter for RecordingReporter {
        fn name(&self) -> &str {
            &self.name
        }

        async fn publish(&self, run: &MonitoringRun) -> Result<()> {
            self.seen.lock().unwrap().push(run.results.len());
            if self.fail {
                return Err(MonitorError::Notification {
                    channel: self.name.clone(),
                    message: "HTTP 500".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_configuration_order() {
        let config = MonitorConfig::from_toml_str(CONFIG).unwrap();
        let queries = config.queries.clone();
        let failing = page().failing_on("goto:");
        let factory = FakeFactory::new(vec![page(), failing, page()]);
        let delay = config.delay_between_queries();
        let monitor = MonitorOrchestrator::new(QueryRunner::new(factory, config), delay);

        let started = tokio::time::Instant::now();
        let run = monitor.run(&queries).await;

        assert_eq!(run.results.len(), 3);
        for (result, query) in run.results.iter().zip(&queries) {
            assert_eq!(&result.query, query);
        }
        assert!(run.results[0].is_success());
        assert!(run.results[1].error.is_some());
        assert!(run.results[1].offers.is_empty());
        assert!(run.results[2].is_success());
        assert_eq!(run.success_count(), 2);
        assert_eq!(run.total_offers(), 2);
        // 兩次查詢間隔各 3 秒
        assert!(started.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_reporter_does_not_stop_others() {
        let config = MonitorConfig::from_toml_str(CONFIG).unwrap();
        let queries = config.queries[..1].to_vec();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let monitor = MonitorOrchestrator::new(
            QueryRunner::new(FakeFactory::new(vec![page()]), config),
            Duration::ZERO,
        )
        .with_reporter(Box::new(RecordingReporter {
            name: "telegram".to_string(),
            fail: true,
            seen: seen.clone(),
        }))
        .with_reporter(Box::new(RecordingReporter {
            name: "html".to_string(),
            fail: false,
            seen: seen.clone(),
        }));

        let run = monitor.run(&queries).await;
        let failures = monitor.publish(&run).await;

        assert_eq!(failures, 1);
        assert_eq!(*seen.lock().unwrap(), vec![1, 1]);
        assert_eq!(monitor.reporter_names(), vec!["telegram", "html"]);
    }
}

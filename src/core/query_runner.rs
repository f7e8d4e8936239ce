use crate::config::{MonitorConfig, SubmitMode};
use crate::core::calendar::CalendarNavigator;
use crate::core::extractor::FlightExtractor;
use crate::core::interaction::dispatch_change_events;
use crate::core::scripts;
use crate::core::stabilization::ResultStabilizationDetector;
use crate::domain::model::{FlightOffer, Query, QueryResult};
use crate::domain::ports::{Locator, PageAutomation, SessionFactory};
use crate::utils::error::{MonitorError, Result};
use serde_json::json;

/// 單次查詢在關閉 session 前取得的資料
struct QueryOutcome {
    offers: Vec<FlightOffer>,
    result_url: Option<String>,
}

/// 執行一筆查詢：填表、選日期、送出、等待結果、擷取報價。
/// 不論成功或失敗都會關閉 session，且永遠回傳 [`QueryResult`]。
pub struct QueryRunner<F: SessionFactory> {
    factory: F,
    config: MonitorConfig,
}

impl<F: SessionFactory> QueryRunner<F> {
    pub fn new(factory: F, config: MonitorConfig) -> Self {
        Self { factory, config }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub async fn run(&self, query: &Query) -> QueryResult {
        let mut result = QueryResult::new(query.clone());

        let outcome = match self.factory.open().await {
            Ok(session) => {
                let outcome = self.drive(session.as_ref(), query).await;
                if let Err(e) = session.close().await {
                    tracing::warn!("Failed to close browser session: {}", e);
                }
                outcome
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(outcome) => {
                tracing::info!("Found {} flights for {}", outcome.offers.len(), query);
                result.offers = outcome.offers;
                result.result_url = outcome.result_url;
            }
            Err(e) => {
                tracing::error!("❌ Query {} failed: {}", query, e);
                result.error = Some(e.to_string());
            }
        }

        result
    }

    async fn drive(&self, page: &dyn PageAutomation, query: &Query) -> Result<QueryOutcome> {
        let site = &self.config.site;
        let timing = &self.config.timing;
        let extraction = &self.config.extraction;

        page.goto(&site.url, timing.navigation_timeout()).await?;

        page.wait_for_selector(&site.one_way_toggle, timing.selector_timeout())
            .await?;
        page.click(&site.one_way_toggle).await?;

        self.fill_location(page, &site.origin_field, &query.origin).await?;
        self.fill_location(page, &site.destination_field, &query.destination)
            .await?;

        page.click(&site.date_field).await?;
        CalendarNavigator::new(&site.calendar, timing, &self.config.interaction)
            .select_date(page, query.date)
            .await?;

        self.submit(page).await?;

        page.wait_for_predicate(
            scripts::RESULTS_READY,
            json!([site.results_url_fragment, extraction.card_selector]),
            timing.results_timeout(),
        )
        .await
        .map_err(|e| match e {
            MonitorError::Timeout { timeout_ms, .. } => MonitorError::Timeout {
                what: "search results to appear".to_string(),
                timeout_ms,
            },
            other => other,
        })?;

        if timing.post_submit_wait_ms > 0 {
            page.wait_fixed(timing.post_submit_wait()).await;
        }

        // 捲到底觸發延遲載入
        for _ in 0..timing.scroll_passes {
            page.evaluate(scripts::SCROLL_TO_BOTTOM, json!([])).await?;
            page.wait_fixed(timing.scroll_pause()).await;
        }

        let cards = Locator::css(&extraction.card_selector);
        ResultStabilizationDetector::from_timing(timing)
            .wait(page, &cards)
            .await?;

        let offers = FlightExtractor::new(extraction).extract(page).await;

        let result_url = match page.current_url().await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Could not read the result page address: {}", e);
                None
            }
        };

        Ok(QueryOutcome { offers, result_url })
    }

    /// 輸入機場代碼並從自動完成清單選取
    async fn fill_location(
        &self,
        page: &dyn PageAutomation,
        selector: &str,
        code: &str,
    ) -> Result<()> {
        let site = &self.config.site;
        let timing = &self.config.timing;
        let field = Locator::css(selector);

        page.click(&field).await?;
        page.fill(&field, code).await?;

        let option = Locator::css(&site.autocomplete_option).has_text(code);
        page.wait_for_selector(&option, timing.autocomplete_timeout()).await?;
        page.click(&option).await?;
        dispatch_change_events(page, selector).await?;

        if site.confirm_location_value {
            page.wait_for_predicate(
                scripts::FIELD_VALUE_CONTAINS,
                json!([selector, code]),
                timing.autocomplete_timeout(),
            )
            .await?;
        }
        Ok(())
    }

    async fn submit(&self, page: &dyn PageAutomation) -> Result<()> {
        match &self.config.site.submit {
            SubmitMode::FormEvent { form_selector } => {
                let submitted = page
                    .evaluate(scripts::SUBMIT_FORM, json!([form_selector]))
                    .await?;
                if submitted != json!(true) {
                    return Err(MonitorError::automation(
                        "submit search",
                        format!("form '{}' not found", form_selector),
                    ));
                }
                Ok(())
            }
            SubmitMode::ButtonClick { button } => page.click(button).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{FakeFactory, FakePage};
    use chrono::NaiveDate;

    fn query() -> Query {
        Query {
            origin: "GRU".to_string(),
            destination: "REC".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            description: None,
        }
    }

    fn config() -> MonitorConfig {
        MonitorConfig::from_toml_str(
            r#"
[[queries]]
origin = "GRU"
destination = "REC"
date = "15/03/2026"
"#,
        )
        .unwrap()
    }

    fn offers_page() -> FakePage {
        FakePage::new()
            .showing(2026, 1)
            .with_counts(&[2, 2, 2, 2])
            .with_cards(json!([
                {"prices": [{"text": "R$ 500,00"}], "airline_alt": "GOL"},
                {"prices": [{"text": "R$ 450,00"}], "airline_alt": "TAM"}
            ]))
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_query() {
        let page = offers_page();
        let runner = QueryRunner::new(FakeFactory::new(vec![page.clone()]), config());

        let result = runner.run(&query()).await;

        assert!(result.error.is_none());
        assert_eq!(result.offers.len(), 2);
        assert_eq!(result.offers[0].airline, "TAM");
        assert_eq!(
            result.result_url.as_deref(),
            Some("https://www.vaidepromo.com.br/passagens-aereas/busca?o=GRU")
        );
        assert!(page.is_closed());

        let actions = page.actions();
        assert_eq!(actions[0], "goto:https://www.vaidepromo.com.br/passagens-aereas/");
        assert!(actions.contains(&"fill:[data-cy=\"departure\"]=GRU".to_string()));
        assert!(actions.contains(&"click:[role=\"option\"]:has-text(\"REC\")".to_string()));
        assert_eq!(page.count_of("eval:scroll_bottom"), 4);
        assert_eq!(page.count_of("eval:dispatch_change"), 2);
        assert_eq!(page.count_of("eval:submit_form"), 1);
        assert_eq!(actions.last().unwrap(), "close");
    }

    #[tokio::test(start_paused = true)]
    async fn test_button_submit_variant() {
        let page = offers_page();
        let mut config = config();
        config.site.submit = SubmitMode::ButtonClick {
            button: Locator::css("button").has_text("Encontrar voos"),
        };
        let runner = QueryRunner::new(FakeFactory::new(vec![page.clone()]), config);

        let result = runner.run(&query()).await;

        assert!(result.is_success());
        assert_eq!(page.count_of("eval:submit_form"), 0);
        assert_eq!(page.count_of("click:button:has-text(\"Encontrar voos\")"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_captured_and_session_closed() {
        let page = offers_page().failing_on("fill:[data-cy=\"arrival\"]");
        let runner = QueryRunner::new(FakeFactory::new(vec![page.clone()]), config());

        let result = runner.run(&query()).await;

        assert!(result.offers.is_empty());
        assert!(result.error.unwrap().contains("arrival"));
        assert!(page.is_closed());
        assert_eq!(page.count_of("eval:collect_cards"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_timeout_is_reported() {
        let page = offers_page().results_never_appear();
        let runner = QueryRunner::new(FakeFactory::new(vec![page.clone()]), config());

        let result = runner.run(&query()).await;

        assert_eq!(
            result.error.as_deref(),
            Some("Timed out after 60000ms waiting for search results to appear")
        );
        assert!(page.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_date_out_of_range_fails_query() {
        let page = offers_page().showing(2023, 1);
        let runner = QueryRunner::new(FakeFactory::new(vec![page.clone()]), config());

        let result = runner.run(&query()).await;

        assert!(result.error.unwrap().contains("not found in calendar"));
        assert_eq!(page.count_of("eval:submit_form"), 0);
        assert!(page.is_closed());
    }

    #[tokio::test]
    async fn test_launch_failure_is_captured() {
        let runner = QueryRunner::new(FakeFactory::new(vec![]), config());

        let result = runner.run(&query()).await;

        assert!(result.error.unwrap().contains("launch browser"));
    }
}

use crate::config::InteractionPolicy;
use crate::core::scripts;
use crate::domain::ports::{Locator, PageAutomation};
use crate::utils::error::Result;
use serde_json::json;

/// 像人一樣點擊：捲動到可見、懸停、暫停、點擊、暫停。
/// 部分網站會忽略或限制瞬間完成的點擊。
pub async fn human_click(
    page: &dyn PageAutomation,
    locator: &Locator,
    policy: &InteractionPolicy,
) -> Result<()> {
    if !policy.enabled {
        return page.click(locator).await;
    }

    page.scroll_into_view(locator).await?;
    page.hover(locator).await?;
    page.wait_fixed(policy.hover_pause()).await;
    page.click(locator).await?;
    page.wait_fixed(policy.post_click_pause()).await;
    Ok(())
}

/// 對欄位派發 input/change/blur，讓綁定監聽器的前端狀態同步
pub async fn dispatch_change_events(page: &dyn PageAutomation, selector: &str) -> Result<()> {
    let found = page
        .evaluate(scripts::DISPATCH_CHANGE_EVENTS, json!([selector]))
        .await?;
    if found != json!(true) {
        tracing::debug!("No element matched {} when dispatching change events", selector);
    }
    Ok(())
}

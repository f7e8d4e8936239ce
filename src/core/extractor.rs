use crate::config::{ExtractionConfig, FinalPriceRule};
use crate::core::scripts;
use crate::domain::model::FlightOffer;
use crate::domain::ports::PageAutomation;
use crate::utils::error::{MonitorError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::str::FromStr;

/// 頁面上單一價格元素的原始文字
#[derive(Debug, Clone, Deserialize)]
pub struct RawPrice {
    pub text: String,
    /// 位於「最終價格」標記元素內
    #[serde(default)]
    pub marked: bool,
}

/// 一張航班卡片的原始資料
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCard {
    #[serde(default)]
    pub prices: Vec<RawPrice>,
    pub airline_alt: Option<String>,
    pub airline_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct PriceCandidate {
    display: String,
    value: Decimal,
    marked: bool,
}

/// 解析巴西格式的價格文字："R$ 1.234,56" → 1234.56。
///
/// 只保留數字與逗號，最後一個逗號視為小數點，其餘逗號 (以及所有句點)
/// 視為千分位。沒有任何數字時回傳 `None`。
pub fn parse_price(text: &str) -> Option<Decimal> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();

    let (integer, fraction) = match kept.rfind(',') {
        Some(idx) => (kept[..idx].replace(',', ""), kept[idx + 1..].to_string()),
        None => (kept, String::new()),
    };

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let integer = if integer.is_empty() { "0" } else { &integer };
    let normalized = if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    };

    Decimal::from_str(&normalized).ok()
}

/// 顯示用文字：不換行空白轉為一般空白
pub fn normalize_display(text: &str) -> String {
    text.replace('\u{a0}', " ").trim().to_string()
}

fn select_final_price<'a>(
    candidates: &'a [PriceCandidate],
    rule: &FinalPriceRule,
) -> Option<&'a PriceCandidate> {
    // 相同數值時取後出現者
    let max = || candidates.iter().max_by(|a, b| a.value.cmp(&b.value));

    match rule {
        FinalPriceRule::Max => max(),
        FinalPriceRule::Marked { .. } => candidates.iter().find(|c| c.marked).or_else(max),
        FinalPriceRule::Position { index } => {
            candidates.get(*index).or_else(|| candidates.last())
        }
    }
}

/// 去除重複的 (航空公司, 價格)，只保留第一次出現的；再依價格穩定排序
pub fn dedup_and_rank(offers: Vec<FlightOffer>) -> Vec<FlightOffer> {
    let mut seen = HashSet::new();
    let mut unique: Vec<FlightOffer> = offers
        .into_iter()
        .filter(|offer| seen.insert((offer.airline.clone(), offer.price_value.normalize())))
        .collect();

    unique.sort_by(|a, b| a.price_value.cmp(&b.price_value));
    unique
}

/// 從結果頁讀出航班卡片，轉成已去重、依價格排序的報價
pub struct FlightExtractor<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> FlightExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// 讀取失敗不會往外傳：記錄錯誤後回傳空清單
    pub async fn extract(&self, page: &dyn PageAutomation) -> Vec<FlightOffer> {
        match self.collect_cards(page).await {
            Ok(cards) => {
                let total = cards.len();
                let offers = self.offers_from_cards(cards);
                tracing::debug!("Extracted {} offers from {} cards", offers.len(), total);
                offers
            }
            Err(e) => {
                tracing::error!("Failed to extract flights: {}", e);
                Vec::new()
            }
        }
    }

    pub fn offers_from_cards(&self, cards: Vec<RawCard>) -> Vec<FlightOffer> {
        let offers = cards
            .iter()
            .filter_map(|card| self.offer_from_card(card))
            .collect();
        dedup_and_rank(offers)
    }

    /// 卡片上沒有可解析的價格時回傳 `None` (不當作零元)
    pub fn offer_from_card(&self, card: &RawCard) -> Option<FlightOffer> {
        let candidates: Vec<PriceCandidate> = card
            .prices
            .iter()
            .filter(|p| p.text.contains(&self.config.currency_marker))
            .filter_map(|p| {
                parse_price(&p.text).map(|value| PriceCandidate {
                    display: normalize_display(&p.text),
                    value,
                    marked: p.marked,
                })
            })
            .collect();

        let chosen = select_final_price(&candidates, &self.config.final_price)?;

        Some(FlightOffer {
            airline: self.resolve_airline(card),
            price_display: chosen.display.clone(),
            price_value: chosen.value,
        })
    }

    fn resolve_airline(&self, card: &RawCard) -> String {
        [&card.airline_alt, &card.airline_code]
            .into_iter()
            .flatten()
            .map(|label| label.trim())
            .find(|label| !label.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.config.unidentified_airline.clone())
    }

    async fn collect_cards(&self, page: &dyn PageAutomation) -> Result<Vec<RawCard>> {
        let marked_selector = match &self.config.final_price {
            FinalPriceRule::Marked { selector } => Some(selector.as_str()),
            _ => None,
        };

        let raw = page
            .evaluate(
                scripts::COLLECT_CARDS,
                json!([
                    self.config.card_selector,
                    self.config.price_selector,
                    marked_selector,
                    self.config.airline_image_selector,
                    self.config.airline_code_selector,
                ]),
            )
            .await?;

        serde_json::from_value(raw).map_err(|e| MonitorError::Extraction {
            message: format!("unexpected card data: {}", e),
        })
    }
}

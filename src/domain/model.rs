use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 一筆設定好的航班搜尋 (出發地 / 目的地 / 日期)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    #[serde(alias = "origem")]
    pub origin: String,
    #[serde(alias = "destino")]
    pub destination: String,
    #[serde(alias = "data", with = "query_date")]
    pub date: NaiveDate,
    #[serde(default, alias = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Query {
    /// 網站輸入框與報告使用的日期格式
    pub fn display_date(&self) -> String {
        self.date.format(query_date::DISPLAY_FORMAT).to_string()
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} → {} - {}",
            self.origin,
            self.destination,
            self.display_date()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub airline: String,
    /// 網站上顯示的價格文字，例如 "R$ 1.234,56"
    pub price_display: String,
    pub price_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: Query,
    pub timestamp: DateTime<Utc>,
    /// 依價格遞增排序、已去重
    pub offers: Vec<FlightOffer>,
    pub result_url: Option<String>,
    pub error: Option<String>,
}

impl QueryResult {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            timestamp: Utc::now(),
            offers: Vec::new(),
            result_url: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn cheapest(&self) -> Option<&FlightOffer> {
        self.offers.first()
    }
}

/// 一次執行的所有結果，順序與設定檔中的查詢順序相同
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringRun {
    pub results: Vec<QueryResult>,
}

impl MonitoringRun {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn total_offers(&self) -> usize {
        self.results.iter().map(|r| r.offers.len()).sum()
    }
}

/// 日期以 dd/mm/yyyy 表示，同時接受 ISO yyyy-mm-dd
pub mod query_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";
    const ISO_FORMAT: &str = "%Y-%m-%d";

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, DISPLAY_FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(raw, ISO_FORMAT))
            .ok()
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(DISPLAY_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid date '{}', expected dd/mm/yyyy or yyyy-mm-dd",
                raw
            ))
        })
    }
}

use crate::config::ReportConfig;
use crate::domain::model::MonitoringRun;
use crate::report::escape_html;
use chrono::{DateTime, FixedOffset};

/// 聊天訊息摘要 (Telegram HTML parse mode)。
/// 失敗的查詢會明確列出錯誤，不會被省略。
pub fn render_chat_summary(
    run: &MonitoringRun,
    settings: &ReportConfig,
    now: DateTime<FixedOffset>,
) -> String {
    let mut lines = vec![
        format!("✈️ <b>{}</b>", escape_html(&settings.title)),
        format!(
            "🕐 <i>Atualizado em {}</i>",
            now.format("%d/%m/%Y às %H:%M")
        ),
    ];

    for result in &run.results {
        let query = &result.query;
        lines.push(format!(
            "\n<b>{} → {} ({})</b>",
            escape_html(&query.origin),
            escape_html(&query.destination),
            query.display_date()
        ));

        if let Some(error) = &result.error {
            lines.push(format!("❌ {}", escape_html(error)));
            continue;
        }

        if result.offers.is_empty() {
            lines.push("Nenhum voo encontrado".to_string());
        }

        for (i, offer) in result.offers.iter().take(settings.top_offers).enumerate() {
            let airline = escape_html(&offer.airline);
            let price = escape_html(&offer.price_display);
            if i == 0 {
                lines.push(format!("💰 <b>{}</b> – {}", airline, price));
            } else {
                lines.push(format!("#{} {} – {}", i + 1, airline, price));
            }
        }

        if let Some(url) = &result.result_url {
            lines.push(format!(
                "🔗 <a href=\"{}\">{}</a>",
                escape_html(url),
                escape_html(&settings.link_label)
            ));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FlightOffer, Query, QueryResult};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn query(origin: &str, destination: &str) -> Query {
        Query {
            origin: origin.to_string(),
            destination: destination.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            description: None,
        }
    }

    fn offer(airline: &str, display: &str, value: i64) -> FlightOffer {
        FlightOffer {
            airline: airline.to_string(),
            price_display: display.to_string(),
            price_value: Decimal::new(value, 0),
        }
    }

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(-3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 2, 1, 9, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_summary_lists_top_offers_and_errors() {
        let mut ok = QueryResult::new(query("GRU", "REC"));
        ok.offers = vec![
            offer("TAM", "R$ 450,00", 450),
            offer("GOL", "R$ 500,00", 500),
            offer("AZUL", "R$ 510,00", 510),
            offer("Avianca & Co", "R$ 900,00", 900),
        ];
        ok.result_url = Some("https://example.com/busca?a=1&b=2".to_string());

        let mut failed = QueryResult::new(query("CGH", "SDU"));
        failed.error = Some("Timed out after 60000ms waiting for <results>".to_string());

        let empty = QueryResult::new(query("BSB", "SSA"));

        let run = MonitoringRun {
            results: vec![ok, failed, empty],
        };
        let text = render_chat_summary(&run, &ReportConfig::default(), now());

        assert!(text.starts_with("✈️ <b>VaiPromo Monitor</b>\n🕐 <i>Atualizado em 01/02/2026 às 09:05</i>"));
        assert!(text.contains("<b>GRU → REC (15/03/2026)</b>"));
        assert!(text.contains("💰 <b>TAM</b> – R$ 450,00"));
        assert!(text.contains("#3 AZUL – R$ 510,00"));
        assert!(!text.contains("Avianca"));
        assert!(text.contains("href=\"https://example.com/busca?a=1&amp;b=2\""));
        assert!(text.contains("❌ Timed out after 60000ms waiting for &lt;results&gt;"));
        assert!(text.contains("<b>BSB → SSA (15/03/2026)</b>\nNenhum voo encontrado"));
    }
}

use crate::config::ReportConfig;
use crate::domain::model::{MonitoringRun, QueryResult};
use crate::report::escape_html;
use chrono::{DateTime, FixedOffset};
use std::fmt::Write;

const STYLE: &str = r#"    body { font-family: Arial, sans-serif; margin: 20px; }
    h1 { color: #333; }
    .query { border: 1px solid #ddd; margin: 20px 0; padding: 15px; }
    .flight { background: #f5f5f5; margin: 10px 0; padding: 10px; }
    .error { background: #ffebee; color: #c62828; }
    .best { background: #e8f5e8; border-left: 4px solid #4caf50; }
"#;

/// 產生完整的 HTML 報告頁面，包含所有查詢 (含失敗的) 與全部報價
pub fn render_html_report(
    run: &MonitoringRun,
    settings: &ReportConfig,
    now: DateTime<FixedOffset>,
) -> String {
    let title = escape_html(&settings.title);
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n    <meta charset=\"UTF-8\">\n");
    let _ = writeln!(html, "    <title>{}</title>", title);
    let _ = write!(html, "    <style>\n{}    </style>\n</head>\n<body>\n", STYLE);
    let _ = writeln!(html, "    <h1>{} - Resultados</h1>", title);
    let _ = writeln!(
        html,
        "    <p>Relatório gerado em: {}</p>",
        now.format("%d/%m/%Y %H:%M:%S")
    );
    let _ = writeln!(html, "    <p>Total de consultas: {}</p>", run.results.len());
    let _ = writeln!(html, "    <p>Total de voos: {}</p>", run.total_offers());

    for result in &run.results {
        render_query(&mut html, result, settings);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_query(html: &mut String, result: &QueryResult, settings: &ReportConfig) {
    let query = &result.query;
    html.push_str("    <div class=\"query\">\n");
    let _ = writeln!(
        html,
        "    <h2>{} → {} - {}</h2>",
        escape_html(&query.origin),
        escape_html(&query.destination),
        query.display_date()
    );
    if let Some(description) = query.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(html, "    <p><em>{}</em></p>", escape_html(description));
    }

    if let Some(error) = &result.error {
        let _ = writeln!(
            html,
            "    <div class=\"flight error\">❌ Erro: {}</div>",
            escape_html(error)
        );
        html.push_str("    </div>\n");
        return;
    }

    if result.offers.is_empty() {
        html.push_str("    <div class=\"flight\">Nenhum voo encontrado</div>\n");
    }

    // 報價已依價格排序，第一筆即最便宜
    for (i, offer) in result.offers.iter().enumerate() {
        let (class, badge) = if i == 0 {
            ("flight best", "🏆 ")
        } else {
            ("flight", "")
        };
        let _ = writeln!(
            html,
            "    <div class=\"{}\">{}{}: {}</div>",
            class,
            badge,
            escape_html(&offer.airline),
            escape_html(&offer.price_display)
        );
    }

    if let Some(url) = &result.result_url {
        let _ = writeln!(
            html,
            "    <p><a href=\"{}\" target=\"_blank\">🔗 {}</a></p>",
            escape_html(url),
            escape_html(&settings.link_label)
        );
    }
    html.push_str("    </div>\n");
}

use anyhow::Context;
use clap::Parser;
use flight_monitor::config::{cli::CliArgs, HtmlReportConfig, MonitorConfig};
use flight_monitor::utils::error::{ErrorSeverity, MonitorError};
use flight_monitor::utils::{logger, validation::Validate};
use flight_monitor::{
    ChromiumSessionFactory, GistReporter, HtmlFileReporter, MonitorOrchestrator, QueryRunner,
    TelegramReporter,
};
use std::path::Path;

fn load_config(path: &str) -> flight_monitor::Result<MonitorConfig> {
    let config = MonitorConfig::from_file(path)?;
    config.validate()?;
    Ok(config)
}

/// `--html-output docs/index.html` → 目錄 `docs`、檔名 `index.html`
fn html_override(path: &str) -> HtmlReportConfig {
    let path = Path::new(path);
    let output_dir = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "relatorio.html".to_string());
    HtmlReportConfig {
        output_dir,
        filename,
    }
}

/// 設定載入失敗時的結束碼。配置錯誤依嚴重度對應，
/// 其他載入失敗 (例如 JSON 解析) 同樣無法開始監控，一律回傳 1
fn exit_code(error: &MonitorError) -> i32 {
    if !error.aborts_run() {
        return 1;
    }
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn print_plan(config: &MonitorConfig, notify: bool) {
    println!("✈️  {} queries against {}", config.queries.len(), config.site.url);
    for (i, query) in config.queries.iter().enumerate() {
        match &query.description {
            Some(description) => println!("  {}. {} ({})", i + 1, query, description),
            None => println!("  {}. {}", i + 1, query),
        }
    }
    println!(
        "⏱️  {}s between queries",
        config.delay_between_queries_secs
    );
    if let Some(html) = &config.report.html {
        println!("📄 HTML report: {}/{}", html.output_dir, html.filename);
    }
    if notify && config.report.telegram.is_some() {
        println!("📨 Telegram summary enabled");
    }
    if notify && config.report.gist.is_some() {
        println!("📨 Gist upload enabled");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting flight-monitor");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let mut config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(
                "❌ Configuration failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(&e));
        }
    };

    if let Some(path) = &args.html_output {
        config.report.html = Some(html_override(path));
    }

    let notify = !args.no_notify;
    if args.dry_run {
        print_plan(&config, notify);
        return Ok(());
    }

    let report = config.report.clone();
    let queries = config.queries.clone();
    let delay = config.delay_between_queries();
    let factory = ChromiumSessionFactory::new(config.browser.clone());
    let mut monitor = MonitorOrchestrator::new(QueryRunner::new(factory, config), delay);

    if let Some(html) = &report.html {
        monitor = monitor.with_reporter(Box::new(HtmlFileReporter::from_config(html, &report)));
    }
    if notify {
        if let Some(telegram) = &report.telegram {
            let reporter = TelegramReporter::new(telegram.clone(), report.clone())
                .context("failed to build the Telegram client")?;
            monitor = monitor.with_reporter(Box::new(reporter));
        }
        if let Some(gist) = &report.gist {
            let reporter = GistReporter::new(gist.clone(), report.clone())
                .context("failed to build the GitHub client")?;
            monitor = monitor.with_reporter(Box::new(reporter));
        }
    } else {
        tracing::info!("🔕 Notifications disabled (--no-notify)");
    }
    tracing::debug!("Reporters: {:?}", monitor.reporter_names());

    let run = monitor.run_and_publish(&queries).await;

    tracing::info!("🎉 Run finished");
    println!(
        "✅ {} queries, {} succeeded, {} flights",
        run.results.len(),
        run.success_count(),
        run.total_offers()
    );

    Ok(())
}

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod report;
pub mod utils;

#[cfg(feature = "browser")]
pub use adapters::ChromiumSessionFactory;
pub use adapters::{GistReporter, HtmlFileReporter, LocalStorage, TelegramReporter};
pub use config::MonitorConfig;
pub use core::{monitor::MonitorOrchestrator, query_runner::QueryRunner};
pub use domain::model::{FlightOffer, MonitoringRun, Query, QueryResult};
pub use domain::ports::{Locator, PageAutomation, Reporter, SessionFactory, Storage};
pub use utils::error::{MonitorError, Result};

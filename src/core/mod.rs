pub mod calendar;
pub mod extractor;
pub mod interaction;
pub mod monitor;
pub mod query_runner;
pub mod scripts;
pub mod stabilization;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{FlightOffer, MonitoringRun, Query, QueryResult};
pub use crate::domain::ports::{Locator, PageAutomation, Reporter, SessionFactory, Storage};
pub use crate::utils::error::Result;

// Adapters layer: concrete implementations of the domain ports (browser, storage, report delivery).

#[cfg(feature = "browser")]
pub mod browser;
pub mod gist;
pub mod html_file;
pub mod storage;
pub mod telegram;

#[cfg(feature = "browser")]
pub use browser::{ChromiumSession, ChromiumSessionFactory};
pub use gist::GistReporter;
pub use html_file::HtmlFileReporter;
pub use storage::LocalStorage;
pub use telegram::TelegramReporter;

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod scraper;
pub mod storage;
pub mod tui;

pub use config::Config;
pub use error::{Result, ScrapingError};
pub use parser::{Cell, CommentRecord, Dataset, Platform};
pub use scraper::{ScrapeOutcome, ScrapeRequest, Scraper};
pub use storage::{export_dataset, import_dataset, ExportFormat, FileExporter};
pub use tui::run::run_viewer;

//! Extracts the daily IBOV composition table from the B3 portal with a
//! headless browser and writes it as Parquet, locally or to GCS.

pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod response;
pub mod schema;
pub mod scrape;
pub mod store;

pub use config::{BrowserOptions, ScrapeConfig, SettleDelays, SinkTarget};
pub use error::RunError;
pub use schema::{Dataset, ExtractedDate, NormalizedRow};

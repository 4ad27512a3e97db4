pub mod apis;
pub mod chart;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod tasks;
pub mod types;
pub mod views;

pub use error::{Result, ScraperError};
pub use pipeline::Pipeline;
pub use types::{CatalogApi, ProductDataset, ProductRecord, RawItem};

//! Constants shared by the pipeline, the upstream client and the server.

/// Name given to products whose raw item has no usable name.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown";

// JSON paths inside one catalog item
pub const NAME_PATH: &[&str] = &["product", "name"];
pub const CURRENT_PRICE_PATH: &[&str] = &["product", "salesPrice", "current", "wholeNumber"];
pub const PREVIOUS_PRICE_PATH: &[&str] = &["product", "salesPrice", "previous", "wholeNumber"];

/// Tukey fence multiplier applied to the interquartile range.
pub const DEFAULT_FENCE_MULTIPLIER: f64 = 1.5;

/// Size of the "top changes" view and of the chart.
pub const TOP_CHANGES_LIMIT: usize = 10;
/// Upper bound accepted for `?limit=` on the top changes endpoint.
pub const MAX_TOP_CHANGES_LIMIT: usize = 100;

// Upstream search API defaults
pub const DEFAULT_UPSTREAM_URL: &str =
    "https://sik.search.blue.cdtapps.com/us/en/search?c=listaf&v=20240110";
pub const DEFAULT_CATEGORY: &str = "16239";
pub const DEFAULT_WINDOW_OFFSET: u32 = 12;
pub const DEFAULT_WINDOW_SIZE: u32 = 100;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

pub const CATALOG_API: &str = "catalog_search";

// Storage and server defaults
pub const DEFAULT_DB_PATH: &str = "data/products.db";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const LOG_DIR: &str = "logs";

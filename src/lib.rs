//! GetAround insights: rental delay analysis and rental price prediction.
//!
//! The library holds everything the two front-ends share: dataset loading and
//! caching, the previous-rental delay join, range filtering with its metrics,
//! histogram specs, the price model gateway and the HTTP API.

pub mod analysis;
pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod predict;
pub mod server;

pub use config::AppConfig;
pub use data::cache::DatasetCache;
pub use data::delay::compute_delay_impact;
pub use data::filter::{apply_range_filter, FilterMetrics, RangeFilter, ValueRange};
pub use data::loader::DataSource;
pub use data::model::{CellValue, Row, Table};
pub use error::InsightsError;
pub use predict::{PredictionGateway, PricingFeatures};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

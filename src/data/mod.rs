/// Data layer: core types, loading, caching, the delay join and filtering.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet  (URL or path)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch + parse → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  one load per DataSource, kept for the process lifetime
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  delay    │  join each rental to its predecessor's checkout delay
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  numeric range → kept / excluded / not-applicable + metrics
///   └──────────┘
/// ```

pub mod cache;
pub mod delay;
pub mod filter;
pub mod loader;
pub mod model;

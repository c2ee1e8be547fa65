/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (empty on failure)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<DeviceRecord>, brand index, fingerprint
///   └──────────┘
///        │
///        ├──▶ filter  side panel selections, questions-page query
///        ├──▶ stats   value counts, yearly counts, price summary
///        └──▶ schema  which optional columns get which chart
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod stats;

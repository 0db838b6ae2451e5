/// Data layer: sources, loading, sanitizing, filtering, aggregation.
///
/// Architecture:
/// ```text
///   MySQL table        S3 object (.csv / .parquet / .json)
///        │                    │
///        ▼                    ▼
///   ┌───────────────────────────────┐
///   │ source    BookSource readers   │  raw rows → BookDataset
///   └───────────────────────────────┘
///        │
///        ▼
///   ┌───────────────────────────────┐
///   │ fallback  first non-empty wins │  + DatasetCache, provenance
///   └───────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐    ┌──────────┐    ┌──────────┐
///   │ sanitize  │ →  │  filter   │ →  │  stats    │
///   └──────────┘    └──────────┘    └──────────┘
///    price cleanup   FilterSpec       Summary
/// ```

pub mod cache;
pub mod fallback;
pub mod filter;
pub mod loader;
pub mod model;
pub mod sanitize;
pub mod source;
pub mod stats;

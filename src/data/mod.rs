/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  uploaded .csv bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + normalize → RecordTable      (memoized by cache)
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ RecordTable  │  columns with kinds, Vec<Record>
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  selection predicates + dedup → RecordTable (memoized)
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │ summary   │   │  export   │  KPIs / frequencies / histogram, CSV out
///   └──────────┘   └──────────┘
/// ```

pub mod cache;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;

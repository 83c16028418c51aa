/// Data layer: core types, loading, and querying.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  title row skipped, headers mapped via HeaderMap → CutoffTable
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ CutoffTable  │  Vec<CutoffRecord>, distinct filter values
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  rank window + optional filters → sorted rows
///   └──────────┘
/// ```

pub mod filter;
pub mod headers;
pub mod loader;
pub mod model;

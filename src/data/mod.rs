/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  flag column / program selection → row indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model   │  Table rows → Exposure / Tile
///   └──────────┘
/// ```
pub mod filter;
pub mod loader;
pub mod model;

pub use model::{Exposure, Tile};

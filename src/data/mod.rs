/// Data layer: file loading, per-panel models, and session caches.
///
/// Architecture:
/// ```text
///  .geojson / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  layout   │  stem → existing file (.geojson/.json, .csv/.parquet)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → FeatureLayer (WGS84, via crs) / RawTable
///   └──────────┘
///        │            (memoized per path in cache::LayerCache)
///        ▼
///   ┌───────────────────────────────────────────┐
///   │ filter + frames │ series │ stats │ prediction │  panel models
///   └───────────────────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ sources   │  config entry → expected files → model or PanelError
///   └──────────┘
/// ```

pub mod cache;
pub mod crs;
pub mod filter;
pub mod frames;
pub mod layout;
pub mod loader;
pub mod model;
pub mod prediction;
pub mod series;
pub mod sources;
pub mod stats;

//! Data layer: series type, discovery and loading.
//!
//! Architecture:
//! ```text
//!   data dir
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ discover  │  filter by extension → sorted paths
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  .parquet / .csv / .json → Series
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Series   │  name, sorted index, values (NaN = missing)
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;

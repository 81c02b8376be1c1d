/// Data layer: table types, loading, projection, timestamp formatting, writing.
///
/// Architecture:
/// ```text
///      input/<name>.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (types inferred per column)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  ColumnSelection → projected Table
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ timestamp  │  Timestamp column → HH:MM[:SS[.ffffff]] text
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  Table → output/<name>.csv (atomic rename)
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
pub mod timestamp;
pub mod writer;

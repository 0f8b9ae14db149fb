/// Data layer: table model, loading, filtering and export.
///
/// Architecture:
/// ```text
///   file.csv
///      │
///      ▼
///  ┌──────────┐   worker thread, progress events,
///  │  loader  │   cancel flag, 50 000 row cap
///  └──────────┘
///      │
///      ▼
///  ┌──────────┐
///  │ CsvTable │   headers + rows of raw strings
///  └──────────┘
///      │
///      ▼
///  ┌──────────┐
///  │  filter  │   per-column text / comparison / range → filtered CsvTable
///  └──────────┘
///      │
///      ▼
///  ┌──────────┐
///  │  export  │   filtered CsvTable → quoted CSV
///  └──────────┘
/// ```
///
/// `reference` reads the emitter label file used by the colour registry.

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod reference;

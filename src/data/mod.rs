/// Data layer: core types, loading, splitting and discretization.
///
/// Architecture:
/// ```text
///   cmc.data (headerless CSV)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (10 named columns)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  split    │  seeded shuffle → Split { train, test }
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ discretize  │  equal-width bins fit on train, applied to both
///   └────────────┘
/// ```

pub mod discretize;
pub mod loader;
pub mod model;
pub mod split;
pub mod synthetic;

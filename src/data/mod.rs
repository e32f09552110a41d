/// Data layer: core types, loading, domains, filtering, cross-references.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (columnar, row position = identity)
///   └──────────┘
///        │            fields: FieldCatalog (column → FieldKind)
///        ├───────────────┬─────────────────┐
///        ▼               ▼                 ▼
///   ┌──────────┐   ┌──────────┐      ┌──────────┐
///   │  domain   │   │  filter   │      │   xref    │  protein row → drug rows
///   └──────────┘   └──────────┘      └──────────┘
///                        │ row positions    │
///                        ▼                  ▼
///                  ┌──────────┐
///                  │  project  │  rows × fields → columnar result
///                  └──────────┘
/// ```

pub mod domain;
pub mod fields;
pub mod filter;
pub mod loader;
pub mod model;
pub mod project;
pub mod text;
pub mod xref;

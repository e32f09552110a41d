//! Filter-and-join engine over a UniProt protein table and a DrugBank drug table.
//!
//! Tables are loaded once ([`data::loader`]), then queried through
//! [`Explorer`]: domain extraction, multi-column filtering, protein → drug
//! cross-references and columnar projection.

pub mod config;
pub mod data;
pub mod error;
pub mod explorer;

pub use config::EngineConfig;
pub use data::filter::{Criteria, Criterion};
pub use data::model::{CellValue, Table, TableId};
pub use error::{EngineError, LoadError, UnknownFieldError};
pub use explorer::Explorer;

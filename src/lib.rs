//! Bicycle and part catalog import.
//!
//! Raw batch entries (free-text brands, multi-language category labels, "brand model"
//! component strings) are normalized and matched against the catalog, then created,
//! updated or skipped one at a time.

pub mod batch;
pub mod cli;
pub mod database_ops;
pub mod errors;
pub mod models;
pub mod normalization;
pub mod orchestrator;
pub mod telemetry;

pub mod util {
    pub mod env;
}

pub use batch::RawBatch;
pub use database_ops::loaders::LoadOptions;
pub use database_ops::report::{LoadAction, LoadResult};
pub use errors::{CatalogError, CatalogResult};
pub use orchestrator::{BatchOrchestrator, ImportMode};

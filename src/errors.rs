//! Error taxonomy for the import pipeline.
//!
//! Only [`CatalogError::Validation`] ever crosses the batch boundary; every other
//! variant is caught per entry and attached to the batch report.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Batch is not valid JSON or fails structural validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A raw category label matched no canonical code.
    #[error("unmapped {kind} category: {label:?}")]
    Mapping { kind: &'static str, label: String },

    /// A component value could not be split into brand and model.
    #[error("cannot parse component value {0:?}")]
    Parse(String),

    /// Default parts were listed for a bike that is not in the catalog.
    #[error("bike product not found: {0}")]
    BikeNotFound(String),

    /// The store rejected a lookup or write.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl CatalogError {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Validation(_) => "validation",
            CatalogError::Mapping { .. } => "mapping",
            CatalogError::Parse(_) => "parse",
            CatalogError::BikeNotFound(_) => "bike_not_found",
            CatalogError::Persistence(_) => "persistence",
        }
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Validation(err.to_string())
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use tracing::{info, instrument};

use crate::batch::{batch_from_value, read_batch_file, RawBatch};
use crate::database_ops::loaders::bikes::load_bikes;
use crate::database_ops::loaders::default_parts::load_default_parts;
use crate::database_ops::loaders::parts::load_parts;
use crate::database_ops::loaders::{LoadContext, LoadOptions};
use crate::database_ops::report::LoadResult;
use crate::database_ops::store::CatalogStore;
use crate::errors::{CatalogError, CatalogResult};
use crate::normalization::NormalizationRules;

/// Which loaders a run drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Bikes,
    Parts,
    /// Bikes, then their default-part links over the same entries.
    Full,
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Bikes => "bikes",
            ImportMode::Parts => "parts",
            ImportMode::Full => "full",
        }
    }

    /// Batch section this mode cannot run without.
    fn required_section(&self) -> &'static str {
        match self {
            ImportMode::Bikes | ImportMode::Full => "bikes",
            ImportMode::Parts => "parts",
        }
    }

    fn check_batch(&self, batch: &RawBatch) -> CatalogResult<()> {
        let present = match self.required_section() {
            "parts" => batch.parts.is_some(),
            _ => batch.bikes.is_some(),
        };
        if present {
            Ok(())
        } else {
            Err(CatalogError::Validation(format!(
                "{} import needs a \"{}\" array",
                self.as_str(),
                self.required_section()
            )))
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bikes" => Ok(ImportMode::Bikes),
            "parts" => Ok(ImportMode::Parts),
            "full" => Ok(ImportMode::Full),
            other => Err(format!("unknown import mode {other:?}")),
        }
    }
}

/// Validates a batch, then drives the loaders for one mode entry by entry.
///
/// Only a validation failure is returned as `Err`; everything that goes wrong past that
/// point is recorded in the returned [`LoadResult`].
pub struct BatchOrchestrator<'a> {
    store: &'a dyn CatalogStore,
    rules: NormalizationRules,
    options: LoadOptions,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(store: &'a dyn CatalogStore, options: LoadOptions) -> Self {
        Self {
            store,
            rules: NormalizationRules::with_defaults(),
            options,
        }
    }

    pub fn with_rules(mut self, rules: NormalizationRules) -> Self {
        self.rules = rules;
        self
    }

    pub async fn run_file(&self, mode: ImportMode, path: &Path) -> CatalogResult<LoadResult> {
        let batch = read_batch_file(path)?;
        self.run_batch(mode, &batch).await
    }

    pub async fn run_value(&self, mode: ImportMode, value: Value) -> CatalogResult<LoadResult> {
        let batch = batch_from_value(value)?;
        self.run_batch(mode, &batch).await
    }

    #[instrument(skip(self, batch), fields(dry_run = self.options.dry_run, upsert = self.options.upsert))]
    pub async fn run_batch(&self, mode: ImportMode, batch: &RawBatch) -> CatalogResult<LoadResult> {
        mode.check_batch(batch)?;

        let mut ctx = LoadContext::new(self.store, &self.rules, self.options);
        let mut result = LoadResult::default();
        match mode {
            ImportMode::Bikes => result.merge(load_bikes(&mut ctx, batch.bikes()).await),
            ImportMode::Parts => result.merge(load_parts(&mut ctx, batch.parts()).await),
            ImportMode::Full => {
                if !batch.parts().is_empty() {
                    result.merge(load_parts(&mut ctx, batch.parts()).await);
                }
                result.merge(load_bikes(&mut ctx, batch.bikes()).await);
                result.merge(load_default_parts(&mut ctx, batch.bikes()).await);
            }
        }
        info!(
            %mode,
            created = result.created,
            updated = result.updated,
            skipped = result.skipped,
            errors = result.errors.len(),
            "batch finished"
        );
        Ok(result)
    }
}

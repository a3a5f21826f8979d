//! Match-or-create loaders for bikes, parts and default-part links.
//!
//! Every loader handles one entry at a time: normalize, look up by identity key,
//! then create, update or skip. Failures are caught per entry and land in the
//! [`LoadResult`](super::report::LoadResult); nothing here aborts a batch.

pub mod bikes;
pub mod default_parts;
pub mod parts;

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use super::report::LoadAction;
use super::store::CatalogStore;
use crate::errors::CatalogResult;
use crate::models::{
    BikeKey, BikeProduct, BikeProductPatch, NewBikeProduct, NewPartProduct, PartCategory, PartKey,
    PartProduct, PartProductPatch,
};
use crate::normalization::NormalizationRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Decide everything, write nothing.
    pub dry_run: bool,
    /// Existing records get their mutable fields refreshed instead of being skipped.
    pub upsert: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            upsert: true,
        }
    }
}

/// What a dry run would have written so far.
///
/// Later entries (and later loaders in the same run) consult this before the store so
/// duplicate keys resolve in input order exactly as a committed run would. Records
/// that only exist here carry negative placeholder ids.
#[derive(Debug, Default)]
pub struct DryRunLedger {
    bikes: HashMap<BikeKey, BikeProduct>,
    parts: HashMap<PartKey, PartProduct>,
    links: HashSet<(i64, PartCategory)>,
    last_placeholder: i64,
}

impl DryRunLedger {
    fn placeholder_id(&mut self) -> i64 {
        self.last_placeholder -= 1;
        self.last_placeholder
    }

    pub fn is_empty(&self) -> bool {
        self.bikes.is_empty() && self.parts.is_empty() && self.links.is_empty()
    }
}

pub fn is_placeholder(id: i64) -> bool {
    id < 0
}

/// Shared state for one orchestrated run.
pub struct LoadContext<'a> {
    pub store: &'a dyn CatalogStore,
    pub rules: &'a NormalizationRules,
    pub options: LoadOptions,
    pub ledger: DryRunLedger,
}

impl<'a> LoadContext<'a> {
    pub fn new(
        store: &'a dyn CatalogStore,
        rules: &'a NormalizationRules,
        options: LoadOptions,
    ) -> Self {
        Self {
            store,
            rules,
            options,
            ledger: DryRunLedger::default(),
        }
    }

    pub async fn find_bike(&self, key: &BikeKey) -> CatalogResult<Option<BikeProduct>> {
        if self.options.dry_run {
            if let Some(shadow) = self.ledger.bikes.get(key) {
                return Ok(Some(shadow.clone()));
            }
        }
        self.store.find_bike_product(key).await
    }

    pub async fn find_part(&self, key: &PartKey) -> CatalogResult<Option<PartProduct>> {
        if self.options.dry_run {
            if let Some(shadow) = self.ledger.parts.get(key) {
                return Ok(Some(shadow.clone()));
            }
        }
        self.store.find_part_product(key).await
    }

    pub async fn link_exists(&self, bike_id: i64, category: PartCategory) -> CatalogResult<bool> {
        if self.options.dry_run && self.ledger.links.contains(&(bike_id, category)) {
            return Ok(true);
        }
        if is_placeholder(bike_id) {
            return Ok(false);
        }
        Ok(self
            .store
            .find_default_part_link(bike_id, category)
            .await?
            .is_some())
    }

    pub fn note_dry_run_links(
        &mut self,
        bike_id: i64,
        categories: impl IntoIterator<Item = PartCategory>,
    ) {
        for category in categories {
            self.ledger.links.insert((bike_id, category));
        }
    }

    pub async fn match_or_create_bike(
        &mut self,
        incoming: NewBikeProduct,
    ) -> CatalogResult<(LoadAction, BikeProduct)> {
        let key = incoming.key();
        let Some(existing) = self.find_bike(&key).await? else {
            if self.options.dry_run {
                let now = Utc::now();
                let shadow = BikeProduct {
                    id: self.ledger.placeholder_id(),
                    category: incoming.category,
                    brand: incoming.brand,
                    model: incoming.model,
                    year: incoming.year,
                    description: incoming.description,
                    specifications: incoming.specifications,
                    image_url: incoming.image_url,
                    created_at: now,
                    updated_at: now,
                };
                self.ledger.bikes.insert(key, shadow.clone());
                return Ok((LoadAction::Created, shadow));
            }
            let created = self.store.create_bike_product(&incoming).await?;
            return Ok((LoadAction::Created, created));
        };

        if !self.options.upsert {
            return Ok((LoadAction::Skipped, existing));
        }
        let patch = BikeProductPatch::between(&existing, &incoming);
        if patch.is_empty() {
            return Ok((LoadAction::Skipped, existing));
        }
        if self.options.dry_run {
            let mut shadow = existing;
            patch.apply(&mut shadow);
            self.ledger.bikes.insert(key, shadow.clone());
            return Ok((LoadAction::Updated, shadow));
        }
        let updated = self.store.update_bike_product(existing.id, &patch).await?;
        Ok((LoadAction::Updated, updated))
    }

    pub async fn match_or_create_part(
        &mut self,
        incoming: NewPartProduct,
    ) -> CatalogResult<(LoadAction, PartProduct)> {
        let key = incoming.key();
        let Some(existing) = self.find_part(&key).await? else {
            if self.options.dry_run {
                let now = Utc::now();
                let shadow = PartProduct {
                    id: self.ledger.placeholder_id(),
                    category: incoming.category,
                    brand: incoming.brand,
                    model: incoming.model,
                    description: incoming.description,
                    specifications: incoming.specifications,
                    image_url: incoming.image_url,
                    price: incoming.price,
                    created_at: now,
                    updated_at: now,
                };
                self.ledger.parts.insert(key, shadow.clone());
                return Ok((LoadAction::Created, shadow));
            }
            let created = self.store.create_part_product(&incoming).await?;
            return Ok((LoadAction::Created, created));
        };

        if !self.options.upsert {
            return Ok((LoadAction::Skipped, existing));
        }
        let patch = PartProductPatch::between(&existing, &incoming);
        if patch.is_empty() {
            return Ok((LoadAction::Skipped, existing));
        }
        if self.options.dry_run {
            let mut shadow = existing;
            patch.apply(&mut shadow);
            self.ledger.parts.insert(key, shadow.clone());
            return Ok((LoadAction::Updated, shadow));
        }
        let updated = self.store.update_part_product(existing.id, &patch).await?;
        Ok((LoadAction::Updated, updated))
    }
}

/// Raw input as JSON for error reports.
pub(crate) fn raw_json<T: Serialize>(entry: &T) -> Value {
    serde_json::to_value(entry).unwrap_or(Value::Null)
}

pub(crate) fn clean_model(raw: &str) -> String {
    raw.trim().to_string()
}

pub(crate) fn clean_blob(value: &Option<Value>) -> Option<Value> {
    value.as_ref().filter(|v| !v.is_null()).cloned()
}

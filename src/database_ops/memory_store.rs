use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use super::store::CatalogStore;
use crate::errors::{CatalogError, CatalogResult};
use crate::models::{
    BikeKey, BikeProduct, BikeProductPatch, DefaultPartLink, NewBikeProduct, NewDefaultPartLink,
    NewPartProduct, PartCategory, PartKey, PartProduct, PartProductPatch,
};

#[derive(Debug, Default, Serialize)]
struct MemoryState {
    next_id: i64,
    bikes: Vec<BikeProduct>,
    parts: Vec<PartProduct>,
    links: Vec<DefaultPartLink>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store backed by process memory, used for offline previews and tests.
///
/// Enforces the same uniqueness rules as the Postgres schema. Writes touching a model
/// registered with [`fail_writes_for_model`](Self::fail_writes_for_model) are rejected,
/// which lets callers exercise per-entry persistence failures.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    state: Mutex<MemoryState>,
    failing_models: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_for_model(&self, model: &str) {
        self.failing_models
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(model.trim().to_lowercase());
    }

    /// Number of trait calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Serialized copy of everything stored, for before/after comparisons.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&*self.lock()).unwrap_or_default()
    }

    pub fn bikes(&self) -> Vec<BikeProduct> {
        self.lock().bikes.clone()
    }

    pub fn parts(&self) -> Vec<PartProduct> {
        self.lock().parts.clone()
    }

    pub fn links(&self) -> Vec<DefaultPartLink> {
        self.lock().links.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_writable(&self, model: &str) -> CatalogResult<()> {
        let failing = self
            .failing_models
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if failing.iter().any(|m| *m == model.trim().to_lowercase()) {
            return Err(CatalogError::Persistence(format!(
                "write rejected for model {model:?}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn find_bike_product(&self, key: &BikeKey) -> CatalogResult<Option<BikeProduct>> {
        self.touch();
        Ok(self.lock().bikes.iter().find(|b| key.matches(b)).cloned())
    }

    async fn create_bike_product(&self, record: &NewBikeProduct) -> CatalogResult<BikeProduct> {
        self.touch();
        self.check_writable(&record.model)?;
        let mut state = self.lock();
        let key = record.key();
        if state.bikes.iter().any(|b| key.matches(b)) {
            return Err(CatalogError::Persistence(format!(
                "duplicate bike product {} {}",
                record.brand, record.model
            )));
        }
        let now = Utc::now();
        let created = BikeProduct {
            id: state.allocate_id(),
            category: record.category,
            brand: record.brand.clone(),
            model: record.model.clone(),
            year: record.year,
            description: record.description.clone(),
            specifications: record.specifications.clone(),
            image_url: record.image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        state.bikes.push(created.clone());
        Ok(created)
    }

    async fn update_bike_product(
        &self,
        id: i64,
        patch: &BikeProductPatch,
    ) -> CatalogResult<BikeProduct> {
        self.touch();
        let mut state = self.lock();
        let record = state
            .bikes
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| CatalogError::Persistence(format!("bike product {id} not found")))?;
        self.check_writable(&record.model)?;
        patch.apply(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn find_part_product(&self, key: &PartKey) -> CatalogResult<Option<PartProduct>> {
        self.touch();
        Ok(self.lock().parts.iter().find(|p| key.matches(p)).cloned())
    }

    async fn create_part_product(&self, record: &NewPartProduct) -> CatalogResult<PartProduct> {
        self.touch();
        self.check_writable(&record.model)?;
        let mut state = self.lock();
        let key = record.key();
        if state.parts.iter().any(|p| key.matches(p)) {
            return Err(CatalogError::Persistence(format!(
                "duplicate part product {} {}",
                record.brand, record.model
            )));
        }
        let now = Utc::now();
        let created = PartProduct {
            id: state.allocate_id(),
            category: record.category,
            brand: record.brand.clone(),
            model: record.model.clone(),
            description: record.description.clone(),
            specifications: record.specifications.clone(),
            image_url: record.image_url.clone(),
            price: record.price.clone(),
            created_at: now,
            updated_at: now,
        };
        state.parts.push(created.clone());
        Ok(created)
    }

    async fn update_part_product(
        &self,
        id: i64,
        patch: &PartProductPatch,
    ) -> CatalogResult<PartProduct> {
        self.touch();
        let mut state = self.lock();
        let record = state
            .parts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CatalogError::Persistence(format!("part product {id} not found")))?;
        self.check_writable(&record.model)?;
        patch.apply(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn find_default_part_link(
        &self,
        bike_product_id: i64,
        category: PartCategory,
    ) -> CatalogResult<Option<DefaultPartLink>> {
        self.touch();
        Ok(self
            .lock()
            .links
            .iter()
            .find(|l| l.bike_product_id == bike_product_id && l.part_category == category)
            .cloned())
    }

    async fn create_default_part_links(
        &self,
        links: &[NewDefaultPartLink],
    ) -> CatalogResult<Vec<DefaultPartLink>> {
        self.touch();
        let mut state = self.lock();
        for (i, link) in links.iter().enumerate() {
            let clash = state.links.iter().any(|l| {
                l.bike_product_id == link.bike_product_id && l.part_category == link.part_category
            }) || links[..i].iter().any(|l| {
                l.bike_product_id == link.bike_product_id && l.part_category == link.part_category
            });
            if clash {
                return Err(CatalogError::Persistence(format!(
                    "duplicate default part link for bike {} / {}",
                    link.bike_product_id, link.part_category
                )));
            }
        }
        let mut created = Vec::with_capacity(links.len());
        for link in links {
            let row = DefaultPartLink {
                id: state.allocate_id(),
                bike_product_id: link.bike_product_id,
                part_category: link.part_category,
                part_product_id: link.part_product_id,
                expected_distance_km: link.expected_distance_km,
            };
            state.links.push(row.clone());
            created.push(row);
        }
        Ok(created)
    }
}

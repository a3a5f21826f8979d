use async_trait::async_trait;

use crate::errors::CatalogResult;
use crate::models::{
    BikeKey, BikeProduct, BikeProductPatch, DefaultPartLink, NewBikeProduct, NewDefaultPartLink,
    NewPartProduct, PartCategory, PartKey, PartProduct, PartProductPatch,
};

/// Persistence operations consumed by the loaders.
///
/// Lookups compare brand and model case-insensitively. Every call is awaited before
/// the next one is issued; implementations do not need to tolerate interleaving.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_bike_product(&self, key: &BikeKey) -> CatalogResult<Option<BikeProduct>>;

    async fn create_bike_product(&self, record: &NewBikeProduct) -> CatalogResult<BikeProduct>;

    async fn update_bike_product(
        &self,
        id: i64,
        patch: &BikeProductPatch,
    ) -> CatalogResult<BikeProduct>;

    async fn find_part_product(&self, key: &PartKey) -> CatalogResult<Option<PartProduct>>;

    async fn create_part_product(&self, record: &NewPartProduct) -> CatalogResult<PartProduct>;

    async fn update_part_product(
        &self,
        id: i64,
        patch: &PartProductPatch,
    ) -> CatalogResult<PartProduct>;

    async fn find_default_part_link(
        &self,
        bike_product_id: i64,
        category: PartCategory,
    ) -> CatalogResult<Option<DefaultPartLink>>;

    /// Bulk insert; all or nothing.
    async fn create_default_part_links(
        &self,
        links: &[NewDefaultPartLink],
    ) -> CatalogResult<Vec<DefaultPartLink>>;
}

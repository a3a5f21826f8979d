use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::{debug, instrument};

use super::db::Db;
use super::store::CatalogStore;
use crate::errors::{CatalogError, CatalogResult};
use crate::models::{
    BikeKey, BikeProduct, BikeProductPatch, DefaultPartLink, NewBikeProduct, NewDefaultPartLink,
    NewPartProduct, PartCategory, PartKey, PartProduct, PartProductPatch, Price,
};

const BIKE_COLUMNS: &str = "id, category, brand, model, year, description, specifications, \
     image_url, created_at, updated_at";
const PART_COLUMNS: &str = "id, category, brand, model, description, specifications, image_url, \
     price_amount, price_currency, created_at, updated_at";
const LINK_COLUMNS: &str = "id, bike_product_id, part_category, part_product_id, expected_distance_km";

/// [`CatalogStore`] over the Postgres tables created by `migrations/0001_catalog.sql`.
#[derive(Clone)]
pub struct PgCatalogStore {
    db: Db,
}

impl PgCatalogStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn decode_code<T: std::str::FromStr<Err = String>>(raw: &str) -> CatalogResult<T> {
    raw.parse::<T>().map_err(CatalogError::Persistence)
}

fn bike_from_row(row: &PgRow) -> CatalogResult<BikeProduct> {
    let category: String = row.try_get("category")?;
    Ok(BikeProduct {
        id: row.try_get("id")?,
        category: decode_code(&category)?,
        brand: row.try_get("brand")?,
        model: row.try_get("model")?,
        year: row.try_get("year")?,
        description: row.try_get("description")?,
        specifications: row.try_get("specifications")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn part_from_row(row: &PgRow) -> CatalogResult<PartProduct> {
    let category: String = row.try_get("category")?;
    let amount: Option<BigDecimal> = row.try_get("price_amount")?;
    let currency: Option<String> = row.try_get("price_currency")?;
    let price = amount.map(|amount| {
        Price {
            amount,
            currency: currency.unwrap_or_default(),
        }
        .normalized()
    });
    Ok(PartProduct {
        id: row.try_get("id")?,
        category: decode_code(&category)?,
        brand: row.try_get("brand")?,
        model: row.try_get("model")?,
        description: row.try_get("description")?,
        specifications: row.try_get("specifications")?,
        image_url: row.try_get("image_url")?,
        price,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn link_from_row(row: &PgRow) -> CatalogResult<DefaultPartLink> {
    let category: String = row.try_get("part_category")?;
    let km: i32 = row.try_get("expected_distance_km")?;
    Ok(DefaultPartLink {
        id: row.try_get("id")?,
        bike_product_id: row.try_get("bike_product_id")?,
        part_category: decode_code(&category)?,
        part_product_id: row.try_get("part_product_id")?,
        expected_distance_km: u32::try_from(km)
            .map_err(|_| CatalogError::Persistence(format!("negative distance {km}")))?,
    })
}

fn distance_param(km: u32) -> CatalogResult<i32> {
    i32::try_from(km).map_err(|_| CatalogError::Persistence(format!("distance {km} out of range")))
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    #[instrument(skip(self))]
    async fn find_bike_product(&self, key: &BikeKey) -> CatalogResult<Option<BikeProduct>> {
        let sql = format!(
            "SELECT {BIKE_COLUMNS} FROM bike_products \
             WHERE category=$1 AND lower(brand)=lower($2) AND lower(model)=lower($3) \
             AND year IS NOT DISTINCT FROM $4 LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .persistent(false)
            .bind(key.category.as_str())
            .bind(&key.brand)
            .bind(&key.model)
            .bind(key.year)
            .fetch_optional(&self.db.pool)
            .await?;
        row.as_ref().map(bike_from_row).transpose()
    }

    #[instrument(skip(self, record), fields(brand = %record.brand, model = %record.model))]
    async fn create_bike_product(&self, record: &NewBikeProduct) -> CatalogResult<BikeProduct> {
        let sql = format!(
            "INSERT INTO bike_products \
             (category, brand, model, year, description, specifications, image_url) \
             VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING {BIKE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .persistent(false)
            .bind(record.category.as_str())
            .bind(&record.brand)
            .bind(&record.model)
            .bind(record.year)
            .bind(&record.description)
            .bind(&record.specifications)
            .bind(&record.image_url)
            .fetch_one(&self.db.pool)
            .await?;
        let created = bike_from_row(&row)?;
        debug!(id = created.id, "bike product created");
        Ok(created)
    }

    #[instrument(skip(self, patch))]
    async fn update_bike_product(
        &self,
        id: i64,
        patch: &BikeProductPatch,
    ) -> CatalogResult<BikeProduct> {
        let sql = format!(
            "UPDATE bike_products SET \
                description=COALESCE($2, description), \
                specifications=COALESCE($3, specifications), \
                image_url=COALESCE($4, image_url), \
                updated_at=now() \
             WHERE id=$1 RETURNING {BIKE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .persistent(false)
            .bind(id)
            .bind(&patch.description)
            .bind(&patch.specifications)
            .bind(&patch.image_url)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| CatalogError::Persistence(format!("bike product {id} not found")))?;
        bike_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn find_part_product(&self, key: &PartKey) -> CatalogResult<Option<PartProduct>> {
        let sql = format!(
            "SELECT {PART_COLUMNS} FROM part_products \
             WHERE category=$1 AND lower(brand)=lower($2) AND lower(model)=lower($3) LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .persistent(false)
            .bind(key.category.as_str())
            .bind(&key.brand)
            .bind(&key.model)
            .fetch_optional(&self.db.pool)
            .await?;
        row.as_ref().map(part_from_row).transpose()
    }

    #[instrument(skip(self, record), fields(brand = %record.brand, model = %record.model))]
    async fn create_part_product(&self, record: &NewPartProduct) -> CatalogResult<PartProduct> {
        let sql = format!(
            "INSERT INTO part_products \
             (category, brand, model, description, specifications, image_url, price_amount, price_currency) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8) RETURNING {PART_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .persistent(false)
            .bind(record.category.as_str())
            .bind(&record.brand)
            .bind(&record.model)
            .bind(&record.description)
            .bind(&record.specifications)
            .bind(&record.image_url)
            .bind(record.price.as_ref().map(|p| p.amount.clone()))
            .bind(record.price.as_ref().map(|p| p.currency.clone()))
            .fetch_one(&self.db.pool)
            .await?;
        let created = part_from_row(&row)?;
        debug!(id = created.id, "part product created");
        Ok(created)
    }

    #[instrument(skip(self, patch))]
    async fn update_part_product(
        &self,
        id: i64,
        patch: &PartProductPatch,
    ) -> CatalogResult<PartProduct> {
        let sql = format!(
            "UPDATE part_products SET \
                description=COALESCE($2, description), \
                specifications=COALESCE($3, specifications), \
                image_url=COALESCE($4, image_url), \
                price_amount=COALESCE($5, price_amount), \
                price_currency=COALESCE($6, price_currency), \
                updated_at=now() \
             WHERE id=$1 RETURNING {PART_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .persistent(false)
            .bind(id)
            .bind(&patch.description)
            .bind(&patch.specifications)
            .bind(&patch.image_url)
            .bind(patch.price.as_ref().map(|p| p.amount.clone()))
            .bind(patch.price.as_ref().map(|p| p.currency.clone()))
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| CatalogError::Persistence(format!("part product {id} not found")))?;
        part_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn find_default_part_link(
        &self,
        bike_product_id: i64,
        category: PartCategory,
    ) -> CatalogResult<Option<DefaultPartLink>> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM default_part_links \
             WHERE bike_product_id=$1 AND part_category=$2"
        );
        let row = sqlx::query(&sql)
            .persistent(false)
            .bind(bike_product_id)
            .bind(category.as_str())
            .fetch_optional(&self.db.pool)
            .await?;
        row.as_ref().map(link_from_row).transpose()
    }

    #[instrument(skip(self, links), fields(count = links.len()))]
    async fn create_default_part_links(
        &self,
        links: &[NewDefaultPartLink],
    ) -> CatalogResult<Vec<DefaultPartLink>> {
        if links.is_empty() {
            return Ok(Vec::new());
        }
        let mut params = Vec::with_capacity(links.len());
        for link in links {
            params.push((link, distance_param(link.expected_distance_km)?));
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO default_part_links \
             (bike_product_id, part_category, part_product_id, expected_distance_km) ",
        );
        qb.push_values(params, |mut b, (link, km)| {
            b.push_bind(link.bike_product_id)
                .push_bind(link.part_category.as_str())
                .push_bind(link.part_product_id)
                .push_bind(km);
        });
        qb.push(format!(" RETURNING {LINK_COLUMNS}"));

        let rows = qb
            .build()
            .persistent(false)
            .fetch_all(&self.db.pool)
            .await?;
        rows.iter().map(link_from_row).collect()
    }
}

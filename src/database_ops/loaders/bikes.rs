use tracing::{debug, info, instrument, warn};

use super::{clean_blob, clean_model, raw_json, LoadContext};
use crate::database_ops::report::{LoadAction, LoadResult, LoadStage};
use crate::errors::{CatalogError, CatalogResult};
use crate::models::{non_blank, BikeProduct, NewBikeProduct, RawBikeEntry};
use crate::normalization::NormalizationRules;

/// Canonical bike record for a raw entry; fails when the category is unmapped.
pub fn normalize_bike(
    rules: &NormalizationRules,
    entry: &RawBikeEntry,
) -> CatalogResult<NewBikeProduct> {
    let category = rules.bike_categories.try_map(&entry.raw_category)?;
    let brand = rules.brands.normalize(&entry.brand);
    let model = clean_model(&entry.model);
    if brand.is_empty() || model.is_empty() {
        return Err(CatalogError::Parse(format!(
            "bike entry needs brand and model, got {:?} / {:?}",
            entry.brand, entry.model
        )));
    }
    Ok(NewBikeProduct {
        category,
        brand,
        model,
        year: entry.year,
        description: non_blank(&entry.description),
        specifications: clean_blob(&entry.specifications),
        image_url: non_blank(&entry.image_url),
    })
}

pub fn bike_label(entry: &RawBikeEntry) -> String {
    match entry.year {
        Some(year) => format!("{} {} ({year})", entry.brand.trim(), entry.model.trim()),
        None => format!("{} {}", entry.brand.trim(), entry.model.trim()),
    }
}

pub async fn load_bike_entry(
    ctx: &mut LoadContext<'_>,
    entry: &RawBikeEntry,
) -> CatalogResult<(LoadAction, BikeProduct)> {
    let incoming = normalize_bike(ctx.rules, entry)?;
    ctx.match_or_create_bike(incoming).await
}

#[instrument(skip_all, fields(entries = entries.len(), dry_run = ctx.options.dry_run, upsert = ctx.options.upsert))]
pub async fn load_bikes(ctx: &mut LoadContext<'_>, entries: &[RawBikeEntry]) -> LoadResult {
    let mut result = LoadResult::default();
    for (index, entry) in entries.iter().enumerate() {
        let label = bike_label(entry);
        match load_bike_entry(ctx, entry).await {
            Ok((action, record)) => {
                debug!(index, id = record.id, category = %record.category, %action, "{label}");
                result.record(LoadStage::Bikes, index, label, action);
            }
            Err(err) => {
                warn!(index, error = %err, "bike entry failed: {label}");
                result.record_error(LoadStage::Bikes, index, None, raw_json(entry), &err);
            }
        }
    }
    info!(
        created = result.created,
        updated = result.updated,
        skipped = result.skipped,
        errors = result.errors.len(),
        "bike products loaded"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::loaders::LoadOptions;
    use crate::database_ops::memory_store::InMemoryCatalogStore;
    use crate::models::BikeCategory;
    use serde_json::json;

    fn bike(brand: &str, model: &str, category: &str) -> RawBikeEntry {
        serde_json::from_value(json!({
            "brand": brand,
            "model": model,
            "category": category,
            "year": 2024,
        }))
        .expect("raw bike")
    }

    #[test]
    fn normalizes_brand_category_and_model() {
        let rules = NormalizationRules::with_defaults();
        let mut entry = bike("specialised", "  Tarmac SL8 ", "Rennrad");
        entry.description = Some("  ".into());
        let new = normalize_bike(&rules, &entry).expect("normalized");
        assert_eq!(new.category, BikeCategory::Road);
        assert_eq!(new.brand, "Specialized");
        assert_eq!(new.model, "Tarmac SL8");
        assert_eq!(new.description, None);
    }

    #[tokio::test]
    async fn create_then_skip_then_update() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();

        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let first = load_bikes(&mut ctx, &[bike("Trek", "Domane", "road")]).await;
        assert_eq!(first.created, 1);

        // same data, different spelling: nothing to change
        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let again = load_bikes(&mut ctx, &[bike("TREK", "domane", "Rennrad")]).await;
        assert_eq!((again.created, again.updated, again.skipped), (0, 0, 1));

        let mut changed = bike("Trek", "Domane", "road");
        changed.image_url = Some("https://img.example/domane.jpg".into());
        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let updated = load_bikes(&mut ctx, &[changed.clone()]).await;
        assert_eq!(updated.updated, 1);
        assert_eq!(
            store.bikes()[0].image_url.as_deref(),
            Some("https://img.example/domane.jpg")
        );

        let mut ctx = LoadContext::new(
            &store,
            &rules,
            LoadOptions {
                dry_run: false,
                upsert: false,
            },
        );
        changed.image_url = Some("https://img.example/other.jpg".into());
        let no_upsert = load_bikes(&mut ctx, &[changed]).await;
        assert_eq!(no_upsert.skipped, 1);
        assert_eq!(
            store.bikes()[0].image_url.as_deref(),
            Some("https://img.example/domane.jpg")
        );
    }

    #[tokio::test]
    async fn unmapped_category_is_recorded_against_the_entry() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let entries = [bike("Trek", "Domane", "road"), bike("Trek", "Thing", "zzqx")];
        let result = load_bikes(&mut ctx, &entries).await;
        assert_eq!(result.created, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].index, 1);
        assert_eq!(result.errors[0].kind, "mapping");
        assert_eq!(result.errors[0].entry["model"], "Thing");
    }

    #[tokio::test]
    async fn dry_run_resolves_duplicates_in_input_order() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        let mut ctx = LoadContext::new(
            &store,
            &rules,
            LoadOptions {
                dry_run: true,
                upsert: true,
            },
        );
        let mut second = bike("trek", "DOMANE", "road bike");
        second.description = Some("endurance road".into());
        let entries = [bike("Trek", "Domane", "road"), second.clone(), second];
        let result = load_bikes(&mut ctx, &entries).await;
        assert_eq!((result.created, result.updated, result.skipped), (1, 1, 1));
        assert!(store.bikes().is_empty());
    }
}

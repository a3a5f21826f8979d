use tracing::{debug, info, instrument, warn};

use super::{clean_blob, clean_model, raw_json, LoadContext};
use crate::database_ops::report::{LoadAction, LoadResult, LoadStage};
use crate::errors::{CatalogError, CatalogResult};
use crate::models::{non_blank, NewPartProduct, PartProduct, RawPartEntry};
use crate::normalization::NormalizationRules;

pub fn normalize_part(
    rules: &NormalizationRules,
    entry: &RawPartEntry,
) -> CatalogResult<NewPartProduct> {
    let category = rules.part_categories.try_map(&entry.raw_category)?;
    let brand = rules.brands.normalize(&entry.brand);
    let model = clean_model(&entry.model);
    if brand.is_empty() || model.is_empty() {
        return Err(CatalogError::Parse(format!(
            "part entry needs brand and model, got {:?} / {:?}",
            entry.brand, entry.model
        )));
    }
    Ok(NewPartProduct {
        category,
        brand,
        model,
        description: non_blank(&entry.description),
        specifications: clean_blob(&entry.specifications),
        image_url: non_blank(&entry.image_url),
        price: entry.price.as_ref().map(|p| p.normalized()),
    })
}

pub fn part_label(entry: &RawPartEntry) -> String {
    format!("{} {}", entry.brand.trim(), entry.model.trim())
}

pub async fn load_part_entry(
    ctx: &mut LoadContext<'_>,
    entry: &RawPartEntry,
) -> CatalogResult<(LoadAction, PartProduct)> {
    let incoming = normalize_part(ctx.rules, entry)?;
    ctx.match_or_create_part(incoming).await
}

#[instrument(skip_all, fields(entries = entries.len(), dry_run = ctx.options.dry_run, upsert = ctx.options.upsert))]
pub async fn load_parts(ctx: &mut LoadContext<'_>, entries: &[RawPartEntry]) -> LoadResult {
    let mut result = LoadResult::default();
    for (index, entry) in entries.iter().enumerate() {
        let label = part_label(entry);
        match load_part_entry(ctx, entry).await {
            Ok((action, record)) => {
                debug!(index, id = record.id, category = %record.category, %action, "{label}");
                result.record(LoadStage::Parts, index, label, action);
            }
            Err(err) => {
                warn!(index, error = %err, "part entry failed: {label}");
                result.record_error(LoadStage::Parts, index, None, raw_json(entry), &err);
            }
        }
    }
    info!(
        created = result.created,
        updated = result.updated,
        skipped = result.skipped,
        errors = result.errors.len(),
        "part products loaded"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::loaders::LoadOptions;
    use crate::database_ops::memory_store::InMemoryCatalogStore;
    use crate::database_ops::store::CatalogStore;
    use crate::models::PartCategory;
    use serde_json::json;

    fn part(brand: &str, model: &str, category: &str) -> RawPartEntry {
        serde_json::from_value(json!({
            "brand": brand,
            "model": model,
            "category": category,
        }))
        .expect("raw part")
    }

    #[test]
    fn price_currency_is_upper_cased() {
        let rules = NormalizationRules::with_defaults();
        let entry: RawPartEntry = serde_json::from_value(json!({
            "brand": "shimano",
            "model": "CN-M8100",
            "category": "Kette",
            "price": {"amount": "39.90", "currency": "eur"},
        }))
        .expect("raw part");
        let new = normalize_part(&rules, &entry).expect("normalized");
        assert_eq!(new.category, PartCategory::Chain);
        assert_eq!(new.brand, "Shimano");
        assert_eq!(new.price.expect("price").currency, "EUR");
    }

    #[tokio::test]
    async fn unmapped_entry_does_not_stop_the_batch() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        store
            .create_part_product(&NewPartProduct::bare(
                PartCategory::Tire,
                "Schwalbe",
                "G-One Allround",
            ))
            .await
            .expect("seed");

        let mut described = part("schwalbe", "G-One Allround", "Reifen");
        described.description = Some("gravel tyre".into());
        let entries = [
            part("Shimano", "CN-M8100", "chain"),
            part("SRAM", "XG-1275", "cassette"),
            part("Acme", "Gizmo", "qqqq"),
            described,
            part("Shimano", "cn-m8100", "Kette"),
        ];

        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let result = load_parts(&mut ctx, &entries).await;

        assert_eq!((result.created, result.updated, result.skipped), (2, 1, 1));
        assert_eq!(result.processed(), 4);
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.index, 2);
        assert_eq!(error.kind, "mapping");
        assert_eq!(error.entry, serde_json::to_value(&entries[2]).expect("json"));
        assert_eq!(store.parts().len(), 3);
    }

    #[tokio::test]
    async fn persistence_failure_is_per_entry() {
        let store = InMemoryCatalogStore::new();
        store.fail_writes_for_model("XG-1275");
        let rules = NormalizationRules::with_defaults();
        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let entries = [
            part("SRAM", "XG-1275", "cassette"),
            part("Shimano", "CN-M8100", "chain"),
        ];
        let result = load_parts(&mut ctx, &entries).await;
        assert_eq!(result.created, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, "persistence");
        assert_eq!(result.errors[0].index, 0);
    }

    #[tokio::test]
    async fn dry_run_leaves_the_store_untouched() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        load_parts(&mut ctx, &[part("Shimano", "CN-M8100", "chain")]).await;
        let before = store.snapshot();

        let mut ctx = LoadContext::new(
            &store,
            &rules,
            LoadOptions {
                dry_run: true,
                upsert: true,
            },
        );
        let mut updated = part("Shimano", "CN-M8100", "chain");
        updated.image_url = Some("https://img.example/chain.png".into());
        let result = load_parts(&mut ctx, &[updated, part("SRAM", "XG-1275", "cassette")]).await;
        assert_eq!((result.created, result.updated), (1, 1));
        assert!(!ctx.ledger.is_empty());
        assert_eq!(store.snapshot(), before);
    }
}

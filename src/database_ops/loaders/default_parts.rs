//! Links each bike to the parts it ships with.
//!
//! The bike must already be in the catalog. Components are resolved one by one
//! (category, then brand/model, then the part record itself); the links for one
//! bike are written together once every component has been looked at.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use super::bikes::{bike_label, normalize_bike};
use super::{clean_model, raw_json, LoadContext};
use crate::database_ops::report::{LoadAction, LoadResult, LoadStage};
use crate::errors::{CatalogError, CatalogResult};
use crate::models::{
    BikeProduct, NewDefaultPartLink, NewPartProduct, PartCategory, RawBikeEntry,
    RawComponentEntry,
};

struct PendingLink {
    component: usize,
    label: String,
    link: NewDefaultPartLink,
}

/// Part category of a component, from its category label only; the name is display text.
pub fn component_category(
    ctx: &LoadContext<'_>,
    component: &RawComponentEntry,
) -> CatalogResult<PartCategory> {
    ctx.rules.part_categories.try_map(&component.category)
}

/// Resolves one component into a link to create, or `None` when the bike already has one.
async fn plan_component(
    ctx: &mut LoadContext<'_>,
    bike: &BikeProduct,
    category: PartCategory,
    component: &RawComponentEntry,
) -> CatalogResult<Option<NewDefaultPartLink>> {
    let parsed = ctx.rules.components.try_parse(&component.value)?;
    let brand = ctx.rules.brands.normalize(&parsed.brand);
    let model = clean_model(&parsed.model);

    let (action, part) = ctx
        .match_or_create_part(NewPartProduct::bare(category, &brand, &model))
        .await?;
    debug!(part_id = part.id, %action, %category, "{brand} {model}");

    if ctx.link_exists(bike.id, category).await? {
        return Ok(None);
    }
    let expected_distance_km =
        ctx.rules
            .distances
            .resolve(category, Some(bike.category), component.expected_distance);
    Ok(Some(NewDefaultPartLink {
        bike_product_id: bike.id,
        part_category: category,
        part_product_id: part.id,
        expected_distance_km,
    }))
}

async fn load_bike_components(
    ctx: &mut LoadContext<'_>,
    index: usize,
    entry: &RawBikeEntry,
    result: &mut LoadResult,
) {
    let label = bike_label(entry);
    let bike = match normalize_bike(ctx.rules, entry) {
        Ok(incoming) => ctx.find_bike(&incoming.key()).await,
        Err(err) => Err(err),
    };
    let bike = match bike {
        Ok(Some(bike)) => bike,
        Ok(None) => {
            let err = CatalogError::BikeNotFound(label.clone());
            warn!(index, "skipping {} components: {err}", entry.components.len());
            result.record_error(LoadStage::DefaultParts, index, None, raw_json(entry), &err);
            return;
        }
        Err(err) => {
            warn!(index, error = %err, "cannot resolve bike for default parts: {label}");
            result.record_error(LoadStage::DefaultParts, index, None, raw_json(entry), &err);
            return;
        }
    };

    let mut pending: Vec<PendingLink> = Vec::new();
    let mut claimed: HashSet<PartCategory> = HashSet::new();
    for (ci, component) in entry.components.iter().enumerate() {
        let component_label = format!("{label} / {}", component.name.trim());
        let planned = match component_category(ctx, component) {
            Ok(category) if claimed.contains(&category) => Ok(None),
            Ok(category) => plan_component(ctx, &bike, category, component).await,
            Err(err) => Err(err),
        };
        match planned {
            Ok(Some(link)) => {
                claimed.insert(link.part_category);
                pending.push(PendingLink {
                    component: ci,
                    label: component_label,
                    link,
                });
            }
            Ok(None) => {
                result.record(
                    LoadStage::DefaultParts,
                    index,
                    component_label,
                    LoadAction::Skipped,
                );
            }
            Err(err) => {
                warn!(index, component = ci, error = %err, "component failed: {component_label}");
                result.record_error(
                    LoadStage::DefaultParts,
                    index,
                    Some(ci),
                    raw_json(component),
                    &err,
                );
            }
        }
    }

    if pending.is_empty() {
        return;
    }
    if ctx.options.dry_run {
        ctx.note_dry_run_links(bike.id, pending.iter().map(|p| p.link.part_category));
        for p in pending {
            result.record(LoadStage::DefaultParts, index, p.label, LoadAction::Created);
        }
        return;
    }

    let links: Vec<NewDefaultPartLink> = pending.iter().map(|p| p.link.clone()).collect();
    match ctx.store.create_default_part_links(&links).await {
        Ok(created) => {
            debug!(bike_id = bike.id, links = created.len(), "default part links created");
            for p in pending {
                result.record(LoadStage::DefaultParts, index, p.label, LoadAction::Created);
            }
        }
        Err(err) => {
            warn!(index, error = %err, "default part links rejected: {label}");
            for p in pending {
                let component = &entry.components[p.component];
                result.record_error(
                    LoadStage::DefaultParts,
                    index,
                    Some(p.component),
                    raw_json(component),
                    &err,
                );
            }
        }
    }
}

/// Entries without components are ignored; they have nothing to link.
#[instrument(skip_all, fields(entries = entries.len(), dry_run = ctx.options.dry_run))]
pub async fn load_default_parts(ctx: &mut LoadContext<'_>, entries: &[RawBikeEntry]) -> LoadResult {
    let mut result = LoadResult::default();
    for (index, entry) in entries.iter().enumerate() {
        if entry.components.is_empty() {
            continue;
        }
        load_bike_components(ctx, index, entry, &mut result).await;
    }
    info!(
        created = result.created,
        skipped = result.skipped,
        errors = result.errors.len(),
        "default part links loaded"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::loaders::bikes::load_bikes;
    use crate::database_ops::loaders::LoadOptions;
    use crate::database_ops::memory_store::InMemoryCatalogStore;
    use crate::normalization::NormalizationRules;
    use serde_json::json;

    fn road_bike(components: serde_json::Value) -> RawBikeEntry {
        serde_json::from_value(json!({
            "brand": "Canyon",
            "model": "Endurace CF 7",
            "category": "Rennrad",
            "year": 2024,
            "components": components,
        }))
        .expect("raw bike")
    }

    async fn seeded(store: &InMemoryCatalogStore, rules: &NormalizationRules, entry: &RawBikeEntry) {
        let mut ctx = LoadContext::new(store, rules, LoadOptions::default());
        let result = load_bikes(&mut ctx, std::slice::from_ref(entry)).await;
        assert_eq!(result.created, 1);
    }

    fn distance_of(store: &InMemoryCatalogStore, category: PartCategory) -> Option<u32> {
        store
            .links()
            .iter()
            .find(|l| l.part_category == category)
            .map(|l| l.expected_distance_km)
    }

    #[tokio::test]
    async fn resolves_distances_and_creates_parts() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        let entry = road_bike(json!([
            {"name": "Kette", "category": "Kette", "value": "Shimano CN-M8100"},
            {"name": "Kassette", "category": "cassette", "value": "shimano CS-R8100", "expectedDistance": 1500},
        ]));
        seeded(&store, &rules, &entry).await;

        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let result = load_default_parts(&mut ctx, &[entry]).await;

        assert_eq!(result.created, 2);
        assert!(!result.has_errors());
        assert_eq!(distance_of(&store, PartCategory::Chain), Some(2_500));
        assert_eq!(distance_of(&store, PartCategory::Cassette), Some(1_500));
        let parts = store.parts();
        assert_eq!(parts.len(), 2);
        assert!(parts
            .iter()
            .any(|p| p.brand == "Shimano" && p.model == "CS-R8100"));
    }

    #[tokio::test]
    async fn existing_links_are_never_overwritten() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        let first = road_bike(json!([
            {"name": "Chain", "category": "chain", "value": "Shimano CN-M8100"},
        ]));
        seeded(&store, &rules, &first).await;
        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        load_default_parts(&mut ctx, &[first]).await;

        let second = road_bike(json!([
            {"name": "Chain", "category": "chain", "value": "KMC X11SL", "expectedDistance": 900},
        ]));
        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let result = load_default_parts(&mut ctx, &[second]).await;

        assert_eq!((result.created, result.skipped), (0, 1));
        assert_eq!(store.links().len(), 1);
        assert_eq!(distance_of(&store, PartCategory::Chain), Some(2_500));
    }

    #[tokio::test]
    async fn bad_component_does_not_block_its_siblings() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        let entry = road_bike(json!([
            {"name": "Sattel", "category": "Sattel", "value": "   "},
            {"name": "Reifen", "category": "Reifen", "value": "Continental GP5000"},
            {"name": "Mystery", "category": "qqqq", "value": "Acme Thing"},
        ]));
        seeded(&store, &rules, &entry).await;

        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let result = load_default_parts(&mut ctx, &[entry]).await;

        assert_eq!(result.created, 1);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].kind, "parse");
        assert_eq!(result.errors[0].component, Some(0));
        assert_eq!(result.errors[1].kind, "mapping");
        assert_eq!(result.errors[1].component, Some(2));
        assert_eq!(result.errors[1].entry["value"], "Acme Thing");
        assert_eq!(store.links().len(), 1);
    }

    #[tokio::test]
    async fn component_name_never_stands_in_for_its_category() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        let entry = road_bike(json!([
            {"name": "Chain", "category": "qqqq", "value": "Shimano CN-M8100"},
        ]));
        seeded(&store, &rules, &entry).await;

        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let result = load_default_parts(&mut ctx, &[entry]).await;

        assert_eq!(result.processed(), 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, "mapping");
        assert_eq!(result.errors[0].component, Some(0));
        assert!(result.errors[0].message.contains("qqqq"));
        assert!(store.parts().is_empty());
        assert!(store.links().is_empty());
    }

    #[tokio::test]
    async fn missing_bike_skips_the_whole_entry() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        let entry = road_bike(json!([
            {"name": "Chain", "category": "chain", "value": "Shimano CN-M8100"},
            {"name": "Tire", "category": "tire", "value": "Continental GP5000"},
        ]));
        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let result = load_default_parts(&mut ctx, &[entry]).await;

        assert_eq!(result.processed(), 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, "bike_not_found");
        assert!(store.parts().is_empty());
        assert!(store.links().is_empty());
    }

    #[tokio::test]
    async fn repeated_category_in_one_entry_links_once() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        let entry = road_bike(json!([
            {"name": "Front tire", "category": "tire", "value": "Continental GP5000"},
            {"name": "Rear tire", "category": "tire", "value": "Continental GP5000 S TR"},
        ]));
        seeded(&store, &rules, &entry).await;

        let mut ctx = LoadContext::new(&store, &rules, LoadOptions::default());
        let result = load_default_parts(&mut ctx, &[entry]).await;

        assert_eq!((result.created, result.skipped), (1, 1));
        assert_eq!(store.links().len(), 1);
    }

    #[tokio::test]
    async fn dry_run_counts_links_without_writing() {
        let store = InMemoryCatalogStore::new();
        let rules = NormalizationRules::with_defaults();
        let entry = road_bike(json!([
            {"name": "Chain", "category": "chain", "value": "Shimano CN-M8100"},
        ]));
        seeded(&store, &rules, &entry).await;
        let before = store.snapshot();

        let options = LoadOptions {
            dry_run: true,
            upsert: true,
        };
        let mut ctx = LoadContext::new(&store, &rules, options);
        let first = load_default_parts(&mut ctx, std::slice::from_ref(&entry)).await;
        let again = load_default_parts(&mut ctx, &[entry]).await;

        assert_eq!(first.created, 1);
        assert_eq!((again.created, again.skipped), (0, 1));
        assert_eq!(store.snapshot(), before);
    }
}

//! Free-text normalization: category labels, vendor names, component values and
//! expected service distances.

pub mod brand;
pub mod category;
pub mod component;
pub mod distance;

use crate::models::{BikeCategory, PartCategory};

pub use brand::BrandNormalizer;
pub use category::{bike_category_mapper, part_category_mapper, CategoryMapper};
pub use component::{ComponentValueParser, ParsedComponent};
pub use distance::{ExpectedDistanceResolver, DEFAULT_EXPECTED_DISTANCE_KM};

/// Every lookup table the loaders need, built once per run and passed down.
#[derive(Debug, Clone)]
pub struct NormalizationRules {
    pub bike_categories: CategoryMapper<BikeCategory>,
    pub part_categories: CategoryMapper<PartCategory>,
    pub brands: BrandNormalizer,
    pub components: ComponentValueParser,
    pub distances: ExpectedDistanceResolver,
}

impl NormalizationRules {
    pub fn with_defaults() -> Self {
        Self {
            bike_categories: bike_category_mapper(),
            part_categories: part_category_mapper(),
            brands: BrandNormalizer::with_defaults(),
            components: ComponentValueParser::with_defaults(),
            distances: ExpectedDistanceResolver::with_defaults(),
        }
    }
}

impl Default for NormalizationRules {
    fn default() -> Self {
        Self::with_defaults()
    }
}

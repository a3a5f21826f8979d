//! Raw batch entries, canonical catalog records and the closed sets of category codes.

use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decimal places a stored price amount keeps.
pub const PRICE_SCALE: i64 = 2;

/// Currency assumed when a raw price omits one.
pub const DEFAULT_CURRENCY: &str = "EUR";

macro_rules! canonical_codes {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $code)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| format!("unknown {} code {wanted:?}", stringify!($name)))
            }
        }
    };
}

canonical_codes! {
    /// Canonical bicycle categories.
    BikeCategory {
        Road => "ROAD",
        Gravel => "GRAVEL",
        Mountain => "MTB",
        Trekking => "TREKKING",
        City => "CITY",
        EBike => "E_BIKE",
        Cargo => "CARGO",
        Folding => "FOLDING",
        Bmx => "BMX",
        Kids => "KIDS",
        Other => "OTHER",
    }
}

canonical_codes! {
    /// Canonical part categories.
    PartCategory {
        Chain => "CHAIN",
        Cassette => "CASSETTE",
        Chainring => "CHAINRING",
        Crankset => "CRANKSET",
        BottomBracket => "BOTTOM_BRACKET",
        FrontDerailleur => "FRONT_DERAILLEUR",
        RearDerailleur => "REAR_DERAILLEUR",
        Shifter => "SHIFTER",
        BrakePads => "BRAKE_PADS",
        BrakeRotor => "BRAKE_ROTOR",
        Brake => "BRAKE",
        Tire => "TIRE",
        Tube => "TUBE",
        Wheel => "WHEEL",
        Hub => "HUB",
        Fork => "FORK",
        Shock => "SHOCK",
        Saddle => "SADDLE",
        Seatpost => "SEATPOST",
        Handlebar => "HANDLEBAR",
        Stem => "STEM",
        Grips => "GRIPS",
        Pedals => "PEDALS",
        Cables => "CABLES",
        Battery => "BATTERY",
        Motor => "MOTOR",
        Controller => "CONTROLLER",
        Display => "DISPLAY",
        Other => "OTHER",
    }
}

// --------- Raw batch entries ---------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBikeEntry {
    pub brand: String,
    pub model: String,
    #[serde(rename = "category", alias = "rawCategory")]
    pub raw_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub components: Vec<RawComponentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPartEntry {
    pub brand: String,
    pub model: String,
    #[serde(rename = "category", alias = "rawCategory")]
    pub raw_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComponentEntry {
    pub name: String,
    pub category: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_distance: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: BigDecimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl Price {
    /// Currency codes are stored upper-cased; blank falls back to [`DEFAULT_CURRENCY`].
    /// Amounts are rounded half-up to [`PRICE_SCALE`] places, the precision the catalog stores.
    pub fn normalized(&self) -> Price {
        let currency = self.currency.trim().to_ascii_uppercase();
        Price {
            amount: self.amount.with_scale_round(PRICE_SCALE, RoundingMode::HalfUp),
            currency: if currency.is_empty() {
                default_currency()
            } else {
                currency
            },
        }
    }
}

// --------- Canonical records ---------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeProduct {
    pub id: i64,
    pub category: BikeCategory,
    pub brand: String,
    pub model: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub specifications: Option<Value>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBikeProduct {
    pub category: BikeCategory,
    pub brand: String,
    pub model: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub specifications: Option<Value>,
    pub image_url: Option<String>,
}

impl NewBikeProduct {
    pub fn key(&self) -> BikeKey {
        BikeKey::new(self.category, &self.brand, &self.model, self.year)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BikeProductPatch {
    pub description: Option<String>,
    pub specifications: Option<Value>,
    pub image_url: Option<String>,
}

impl BikeProductPatch {
    /// Incoming non-empty fields that differ from the stored record.
    pub fn between(existing: &BikeProduct, incoming: &NewBikeProduct) -> Self {
        Self {
            description: changed_text(&existing.description, &incoming.description),
            specifications: changed_blob(&existing.specifications, &incoming.specifications),
            image_url: changed_text(&existing.image_url, &incoming.image_url),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.specifications.is_none() && self.image_url.is_none()
    }

    pub fn apply(&self, record: &mut BikeProduct) {
        if let Some(v) = &self.description {
            record.description = Some(v.clone());
        }
        if let Some(v) = &self.specifications {
            record.specifications = Some(v.clone());
        }
        if let Some(v) = &self.image_url {
            record.image_url = Some(v.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartProduct {
    pub id: i64,
    pub category: PartCategory,
    pub brand: String,
    pub model: String,
    pub description: Option<String>,
    pub specifications: Option<Value>,
    pub image_url: Option<String>,
    pub price: Option<Price>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPartProduct {
    pub category: PartCategory,
    pub brand: String,
    pub model: String,
    pub description: Option<String>,
    pub specifications: Option<Value>,
    pub image_url: Option<String>,
    pub price: Option<Price>,
}

impl NewPartProduct {
    /// Bare record for a part only known from a bike's component list.
    pub fn bare(category: PartCategory, brand: &str, model: &str) -> Self {
        Self {
            category,
            brand: brand.to_string(),
            model: model.to_string(),
            description: None,
            specifications: None,
            image_url: None,
            price: None,
        }
    }

    pub fn key(&self) -> PartKey {
        PartKey::new(self.category, &self.brand, &self.model)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartProductPatch {
    pub description: Option<String>,
    pub specifications: Option<Value>,
    pub image_url: Option<String>,
    pub price: Option<Price>,
}

impl PartProductPatch {
    pub fn between(existing: &PartProduct, incoming: &NewPartProduct) -> Self {
        let price = match &incoming.price {
            Some(p) if existing.price.as_ref() != Some(p) => Some(p.clone()),
            _ => None,
        };
        Self {
            description: changed_text(&existing.description, &incoming.description),
            specifications: changed_blob(&existing.specifications, &incoming.specifications),
            image_url: changed_text(&existing.image_url, &incoming.image_url),
            price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.specifications.is_none()
            && self.image_url.is_none()
            && self.price.is_none()
    }

    pub fn apply(&self, record: &mut PartProduct) {
        if let Some(v) = &self.description {
            record.description = Some(v.clone());
        }
        if let Some(v) = &self.specifications {
            record.specifications = Some(v.clone());
        }
        if let Some(v) = &self.image_url {
            record.image_url = Some(v.clone());
        }
        if let Some(v) = &self.price {
            record.price = Some(v.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultPartLink {
    pub id: i64,
    pub bike_product_id: i64,
    pub part_category: PartCategory,
    pub part_product_id: i64,
    pub expected_distance_km: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDefaultPartLink {
    pub bike_product_id: i64,
    pub part_category: PartCategory,
    pub part_product_id: i64,
    pub expected_distance_km: u32,
}

// --------- Dedup keys ---------

/// Lookup key for bikes; brand and model are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BikeKey {
    pub category: BikeCategory,
    pub brand: String,
    pub model: String,
    pub year: Option<i32>,
}

impl BikeKey {
    pub fn new(category: BikeCategory, brand: &str, model: &str, year: Option<i32>) -> Self {
        Self {
            category,
            brand: fold(brand),
            model: fold(model),
            year,
        }
    }

    pub fn matches(&self, record: &BikeProduct) -> bool {
        record.category == self.category
            && record.year == self.year
            && fold(&record.brand) == self.brand
            && fold(&record.model) == self.model
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartKey {
    pub category: PartCategory,
    pub brand: String,
    pub model: String,
}

impl PartKey {
    pub fn new(category: PartCategory, brand: &str, model: &str) -> Self {
        Self {
            category,
            brand: fold(brand),
            model: fold(model),
        }
    }

    pub fn matches(&self, record: &PartProduct) -> bool {
        record.category == self.category
            && fold(&record.brand) == self.brand
            && fold(&record.model) == self.model
    }
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Trimmed text, `None` when blank.
pub fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn blob_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn changed_text(existing: &Option<String>, incoming: &Option<String>) -> Option<String> {
    let incoming = non_blank(incoming)?;
    if existing.as_deref() == Some(incoming.as_str()) {
        None
    } else {
        Some(incoming)
    }
}

fn changed_blob(existing: &Option<Value>, incoming: &Option<Value>) -> Option<Value> {
    let incoming = incoming.as_ref().filter(|v| !blob_is_empty(v))?;
    if existing.as_ref() == Some(incoming) {
        None
    } else {
        Some(incoming.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn codes_parse_case_insensitively() {
        assert_eq!("road".parse::<BikeCategory>(), Ok(BikeCategory::Road));
        assert_eq!("E_BIKE".parse::<BikeCategory>(), Ok(BikeCategory::EBike));
        assert_eq!(
            " rear_derailleur ".parse::<PartCategory>(),
            Ok(PartCategory::RearDerailleur)
        );
        assert!("unicycle".parse::<BikeCategory>().is_err());
    }

    #[test]
    fn raw_bike_accepts_both_category_spellings() {
        let a: RawBikeEntry = serde_json::from_value(json!({
            "brand": "Trek", "model": "Domane", "category": "Rennrad"
        }))
        .expect("category key");
        let b: RawBikeEntry = serde_json::from_value(json!({
            "brand": "Trek", "model": "Domane", "rawCategory": "Rennrad"
        }))
        .expect("rawCategory key");
        assert_eq!(a, b);
        assert!(a.components.is_empty());
    }

    #[test]
    fn patch_keeps_existing_values_for_blank_input() {
        let existing = PartProduct {
            id: 1,
            category: PartCategory::Chain,
            brand: "Shimano".into(),
            model: "CN-M8100".into(),
            description: Some("12-speed chain".into()),
            specifications: Some(json!({"speeds": 12})),
            image_url: None,
            price: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut incoming = NewPartProduct::bare(PartCategory::Chain, "Shimano", "CN-M8100");
        incoming.description = Some("   ".into());
        incoming.specifications = Some(json!({}));
        assert!(PartProductPatch::between(&existing, &incoming).is_empty());

        incoming.image_url = Some("https://img.example/chain.png".into());
        let patch = PartProductPatch::between(&existing, &incoming);
        assert_eq!(patch.image_url.as_deref(), Some("https://img.example/chain.png"));
        assert!(patch.description.is_none());
    }

    #[test]
    fn stored_price_matches_rounded_input() {
        let raw = Price {
            amount: "39.999".parse().expect("amount"),
            currency: " eur".into(),
        };
        let normalized = raw.normalized();
        assert_eq!(normalized.amount.to_string(), "40.00");
        assert_eq!(normalized.currency, "EUR");

        let existing = PartProduct {
            id: 7,
            category: PartCategory::Cassette,
            brand: "SRAM".into(),
            model: "XG-1275".into(),
            description: None,
            specifications: None,
            image_url: None,
            price: Some(Price {
                amount: "40.00".parse().expect("amount"),
                currency: "EUR".into(),
            }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut incoming = NewPartProduct::bare(PartCategory::Cassette, "SRAM", "XG-1275");
        incoming.price = Some(normalized);
        assert!(PartProductPatch::between(&existing, &incoming).is_empty());
    }

    #[test]
    fn keys_fold_case_and_whitespace() {
        assert_eq!(
            BikeKey::new(BikeCategory::Road, "Trek", " Domane SL 6", Some(2024)),
            BikeKey::new(BikeCategory::Road, "TREK", "domane sl 6 ", Some(2024))
        );
        assert_ne!(
            BikeKey::new(BikeCategory::Road, "Trek", "Domane", Some(2024)),
            BikeKey::new(BikeCategory::Road, "Trek", "Domane", None)
        );
    }
}

use std::collections::HashMap;

use super::category::normalize_label;

/// Vendor spelling variants and merged sub-brands, keyed by lookup form.
pub const BRAND_ALIASES: &[(&str, &str)] = &[
    ("shimano", "Shimano"),
    ("shimano steps", "Shimano"),
    ("sram", "SRAM"),
    ("s.r.a.m.", "SRAM"),
    ("truvativ", "SRAM"),
    ("avid", "SRAM"),
    ("rockshox", "RockShox"),
    ("rock shox", "RockShox"),
    ("rock-shox", "RockShox"),
    ("fox", "Fox"),
    ("fox racing shox", "Fox"),
    ("fox factory", "Fox"),
    ("dt swiss", "DT Swiss"),
    ("dtswiss", "DT Swiss"),
    ("dt-swiss", "DT Swiss"),
    ("campagnolo", "Campagnolo"),
    ("campa", "Campagnolo"),
    ("continental", "Continental"),
    ("conti", "Continental"),
    ("schwalbe", "Schwalbe"),
    ("specialized", "Specialized"),
    ("specialised", "Specialized"),
    ("bosch", "Bosch"),
    ("bosch ebike", "Bosch"),
    ("bosch ebike systems", "Bosch"),
    ("bosch e-bike systems", "Bosch"),
    ("race face", "Race Face"),
    ("raceface", "Race Face"),
    ("e*thirteen", "e*thirteen"),
    ("e thirteen", "e*thirteen"),
    ("ethirteen", "e*thirteen"),
    ("e13", "e*thirteen"),
    ("sr suntour", "SR Suntour"),
    ("suntour", "SR Suntour"),
    ("fsa", "FSA"),
    ("full speed ahead", "FSA"),
    ("kmc", "KMC"),
    ("wtb", "WTB"),
    ("bbb", "BBB"),
    ("bmc", "BMC"),
    ("ktm", "KTM"),
    ("gt", "GT"),
    ("gt bicycles", "GT"),
    ("trp", "TRP"),
    ("3t", "3T"),
    ("vanmoof", "VanMoof"),
    ("van moof", "VanMoof"),
    ("fizik", "Fizik"),
    ("fi'zi:k", "Fizik"),
    ("selle italia", "Selle Italia"),
    ("selle royal", "Selle Royal"),
    ("crankbrothers", "Crankbrothers"),
    ("crank brothers", "Crankbrothers"),
    ("bontrager", "Bontrager"),
    ("trek bontrager", "Bontrager"),
    ("liv", "Liv"),
    ("giant liv", "Liv"),
];

/// Canonicalizes vendor names.
///
/// Every canonical spelling is also registered as its own alias, so normalizing an
/// already-canonical brand returns it unchanged.
#[derive(Debug, Clone, Default)]
pub struct BrandNormalizer {
    aliases: HashMap<String, String>,
}

impl BrandNormalizer {
    pub fn with_defaults() -> Self {
        BRAND_ALIASES
            .iter()
            .fold(Self::default(), |n, (alias, canonical)| {
                n.register(alias, *canonical)
            })
    }

    pub fn register(mut self, alias: impl AsRef<str>, canonical: impl Into<String>) -> Self {
        let canonical = canonical.into().split_whitespace().collect::<Vec<_>>().join(" ");
        let key = normalize_label(alias.as_ref());
        if key.is_empty() || canonical.is_empty() {
            return self;
        }
        self.aliases
            .insert(normalize_label(&canonical), canonical.clone());
        self.aliases.insert(key, canonical);
        self
    }

    pub fn normalize(&self, raw: &str) -> String {
        let key = normalize_label(raw);
        if key.is_empty() {
            return String::new();
        }
        if let Some(canonical) = self.aliases.get(&key) {
            return canonical.clone();
        }
        let titled = title_case(raw);
        // case folding is not always reversible ('ſ' -> 'S' -> 's')
        match self.aliases.get(&normalize_label(&titled)) {
            Some(canonical) => canonical.clone(),
            None => titled,
        }
    }
}

/// Capitalizes each whitespace-separated word and lower-cases the rest of it.
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    let Some(first) = chars.next() else {
        return lower;
    };
    let upper: String = first.to_uppercase().collect();
    // multi-char expansions (e.g. 'ß' -> "SS") would not survive a second pass
    if upper.chars().count() != 1 {
        return lower;
    }
    format!("{upper}{}", chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_spelling_variants() {
        let brands = BrandNormalizer::with_defaults();
        assert_eq!(brands.normalize("  sram "), "SRAM");
        assert_eq!(brands.normalize("Rock Shox"), "RockShox");
        assert_eq!(brands.normalize("DT-SWISS"), "DT Swiss");
        assert_eq!(brands.normalize("Truvativ"), "SRAM");
        assert_eq!(brands.normalize("bosch  ebike systems"), "Bosch");
    }

    #[test]
    fn unknown_brands_are_title_cased() {
        let brands = BrandNormalizer::with_defaults();
        assert_eq!(brands.normalize("acme   cycles"), "Acme Cycles");
        assert_eq!(brands.normalize("ORBEA"), "Orbea");
        assert_eq!(brands.normalize(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let brands = BrandNormalizer::with_defaults();
        let samples = [
            "sram",
            "SRAM",
            "e13",
            "E*THIRTEEN",
            "fi'zi:k",
            "  canyon  ",
            "MCLAREN bikes",
            "straße",
            "ßtraße",
            "über bike",
            "van moof",
            "3t",
            "élan",
            "",
            "x",
        ];
        for raw in samples {
            let once = brands.normalize(raw);
            assert_eq!(brands.normalize(&once), once, "input {raw:?}");
        }
        for (alias, _) in BRAND_ALIASES {
            let once = brands.normalize(alias);
            assert_eq!(brands.normalize(&once), once, "alias {alias:?}");
        }
    }

    #[test]
    fn canonical_spelling_maps_to_itself() {
        let brands = BrandNormalizer::default().register("bmc switzerland", "BMC");
        assert_eq!(brands.normalize("BMC"), "BMC");
        assert_eq!(brands.normalize("bmc switzerland"), "BMC");
        assert_eq!(brands.normalize("bmc"), "BMC");
    }
}

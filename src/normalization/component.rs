use crate::errors::{CatalogError, CatalogResult};

/// Brand names recognised as the leading part of a component value.
/// Order matters: the first prefix that matches wins.
pub const KNOWN_COMPONENT_BRANDS: &[&str] = &[
    "Shimano",
    "SRAM",
    "Campagnolo",
    "RockShox",
    "Fox",
    "DT Swiss",
    "SR Suntour",
    "Selle Italia",
    "Selle Royal",
    "Race Face",
    "e*thirteen",
    "Crankbrothers",
    "Mavic",
    "Zipp",
    "Roval",
    "Reynolds",
    "Bontrager",
    "Schwalbe",
    "Continental",
    "Maxxis",
    "Michelin",
    "Pirelli",
    "Vittoria",
    "Panaracer",
    "WTB",
    "Magura",
    "Tektro",
    "TRP",
    "Hope",
    "Hayes",
    "FSA",
    "KMC",
    "Praxis",
    "Rotor",
    "Easton",
    "Ritchey",
    "Thomson",
    "Syncros",
    "Ergon",
    "Fizik",
    "Brooks",
    "Bosch",
    "Brose",
    "Yamaha",
    "Fazua",
    "Bafang",
    "Look",
    "Time",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedComponent {
    pub brand: String,
    pub model: String,
}

/// Splits a free-text "brand + model" component value.
///
/// A known brand prefix (case-insensitive, ending on a word boundary) is split off
/// first; otherwise the first whitespace token is taken as the brand.
#[derive(Debug, Clone)]
pub struct ComponentValueParser {
    known_brands: Vec<String>,
}

impl Default for ComponentValueParser {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ComponentValueParser {
    pub fn with_defaults() -> Self {
        Self::new(KNOWN_COMPONENT_BRANDS.iter().copied())
    }

    pub fn new<I, S>(brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_brands: brands
                .into_iter()
                .map(Into::into)
                .filter(|b| !b.trim().is_empty())
                .collect(),
        }
    }

    pub fn parse(&self, text: &str) -> Option<ParsedComponent> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        for brand in &self.known_brands {
            if let Some(rest) = strip_prefix_ignore_case(text, brand) {
                let model = rest.trim();
                return Some(ParsedComponent {
                    brand: brand.clone(),
                    model: if model.is_empty() {
                        text.to_string()
                    } else {
                        model.to_string()
                    },
                });
            }
        }

        let mut tokens = text.split_whitespace();
        let first = tokens.next()?;
        let rest = tokens.collect::<Vec<_>>().join(" ");
        Some(ParsedComponent {
            brand: first.to_string(),
            model: if rest.is_empty() {
                first.to_string()
            } else {
                rest
            },
        })
    }

    /// [`parse`](Self::parse) with blank input reported as a parse error.
    pub fn try_parse(&self, text: &str) -> CatalogResult<ParsedComponent> {
        self.parse(text)
            .ok_or_else(|| CatalogError::Parse(text.to_string()))
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.to_lowercase() != prefix.to_lowercase() {
        return None;
    }
    let rest = &text[prefix.len()..];
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() => None,
        _ => Some(rest),
    }
}

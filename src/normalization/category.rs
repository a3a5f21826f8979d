use indexmap::IndexMap;

use crate::errors::{CatalogError, CatalogResult};
use crate::models::{BikeCategory, PartCategory};

/// Maps free-text category labels onto a closed set of canonical codes.
///
/// Lookup order:
/// - exact match on the normalized label (trimmed, lowercase, single spaces)
/// - substring fallback: the label contains an alias or an alias contains the label;
///   the longest alias wins, ties go to the alias registered first
#[derive(Debug, Clone)]
pub struct CategoryMapper<C> {
    kind: &'static str,
    aliases: IndexMap<String, C>,
    fallback: C,
}

impl<C: Copy> CategoryMapper<C> {
    pub fn new(kind: &'static str, fallback: C) -> Self {
        Self {
            kind,
            aliases: IndexMap::new(),
            fallback,
        }
    }

    /// Register or override one alias.
    pub fn register(mut self, alias: impl AsRef<str>, code: C) -> Self {
        let key = normalize_label(alias.as_ref());
        if !key.is_empty() {
            self.aliases.insert(key, code);
        }
        self
    }

    pub fn register_all(self, code: C, aliases: &[&str]) -> Self {
        aliases
            .iter()
            .fold(self, |mapper, alias| mapper.register(alias, code))
    }

    pub fn map(&self, raw: &str) -> Option<C> {
        let label = normalize_label(raw);
        if label.is_empty() {
            return None;
        }
        if let Some(code) = self.aliases.get(&label) {
            return Some(*code);
        }

        let mut best: Option<(usize, C)> = None;
        for (alias, code) in &self.aliases {
            let len = alias.chars().count();
            if !(label.contains(alias.as_str()) || alias.contains(label.as_str())) {
                continue;
            }
            if best.map_or(true, |(best_len, _)| len > best_len) {
                best = Some((len, *code));
            }
        }
        best.map(|(_, code)| code)
    }

    pub fn map_or_default(&self, raw: &str) -> C {
        self.map(raw).unwrap_or(self.fallback)
    }

    /// Like [`map`](Self::map) but reports an unresolved label as a mapping error.
    pub fn try_map(&self, raw: &str) -> CatalogResult<C> {
        self.map(raw).ok_or_else(|| CatalogError::Mapping {
            kind: self.kind,
            label: raw.trim().to_string(),
        })
    }
}

pub fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub const BIKE_CATEGORY_ALIASES: &[(BikeCategory, &[&str])] = &[
    // e-bike first so "e-mtb" outranks the plain mountain aliases on ties
    (
        BikeCategory::EBike,
        &[
            "e-bike", "ebike", "e bike", "e-mtb", "emtb", "pedelec", "s-pedelec", "electric",
            "electric bike", "elektro", "elektrofahrrad", "e-fiets", "vae",
            "vélo électrique", "velo electrique", "bici elettrica", "bicicleta eléctrica",
        ],
    ),
    (
        BikeCategory::Road,
        &[
            "road", "road bike", "racing bike", "racer", "rennrad", "straßenrad", "vélo de route",
            "velo de route", "racefiets", "bici da corsa", "bicicleta de carretera", "aero",
            "endurance",
        ],
    ),
    (
        BikeCategory::Gravel,
        &[
            "gravel", "gravel bike", "gravelbike", "gravelrad", "cyclocross", "cyclo-cross",
            "cross", "crossrad", "allroad", "gravier",
        ],
    ),
    (
        BikeCategory::Mountain,
        &[
            "mtb", "mountain bike", "mountainbike", "mountain", "vtt", "hardtail",
            "full suspension", "fully", "enduro", "trail", "downhill", "cross country",
            "mountainbike fully",
        ],
    ),
    (
        BikeCategory::Trekking,
        &[
            "trekking", "trekkingrad", "touring", "tourer", "randonneur", "reiserad", "hybrid",
            "vtc", "vélo tout chemin", "tocht", "tochtfiets",
        ],
    ),
    (
        BikeCategory::City,
        &[
            "city", "city bike", "citybike", "stadtrad", "cityrad", "urban", "commuter",
            "hollandrad", "stadsfiets", "vélo de ville", "velo de ville", "dutch bike",
            "bici da città",
        ],
    ),
    (
        BikeCategory::Cargo,
        &[
            "cargo", "cargo bike", "lastenrad", "lastenfahrrad", "bakfiets", "longtail",
            "vélo cargo", "transportfiets",
        ],
    ),
    (
        BikeCategory::Folding,
        &[
            "folding", "folding bike", "folder", "faltrad", "klapprad", "vouwfiets",
            "vélo pliant", "pliant", "bici pieghevole",
        ],
    ),
    (
        BikeCategory::Bmx,
        &["bmx", "dirt jump", "dirtjump", "dirt bike", "freestyle"],
    ),
    (
        BikeCategory::Kids,
        &[
            "kids", "kids bike", "children", "child", "youth", "kinderrad", "kinderfahrrad",
            "jugendrad", "balance bike", "laufrad", "kinderfiets", "vélo enfant", "enfant",
        ],
    ),
];

pub const PART_CATEGORY_ALIASES: &[(PartCategory, &[&str])] = &[
    (
        PartCategory::Chain,
        &["chain", "kette", "chaîne", "chaine", "ketting", "catena", "cadena"],
    ),
    (
        PartCategory::Cassette,
        &[
            "cassette", "kassette", "ritzelpaket", "ritzel", "freewheel", "sprocket", "cog",
            "cassetta", "casete", "cassette arrière",
        ],
    ),
    (
        PartCategory::Chainring,
        &["chainring", "chain ring", "kettenblatt", "plateau", "kettingblad", "corona"],
    ),
    (
        PartCategory::Crankset,
        &[
            "crankset", "crank", "cranks", "kurbel", "kurbelgarnitur", "pédalier", "pedalier",
            "crankstel", "guarnitura", "bielas",
        ],
    ),
    (
        PartCategory::BottomBracket,
        &["bottom bracket", "bb", "innenlager", "boîtier de pédalier", "trapas", "movimento centrale"],
    ),
    (
        PartCategory::FrontDerailleur,
        &[
            "front derailleur", "front mech", "umwerfer", "dérailleur avant", "derailleur avant",
            "voorderailleur", "deragliatore anteriore", "desviador delantero",
        ],
    ),
    (
        PartCategory::RearDerailleur,
        &[
            "rear derailleur", "derailleur", "rear mech", "schaltwerk", "dérailleur arrière",
            "derailleur arriere", "dérailleur", "achterderailleur", "deragliatore posteriore",
            "cambio", "desviador trasero",
        ],
    ),
    (
        PartCategory::Shifter,
        &[
            "shifter", "shifters", "shift lever", "schalthebel", "trigger", "manette",
            "manettes", "shifthendel", "comandi", "brifter", "sti lever", "ergopower",
        ],
    ),
    (
        PartCategory::BrakePads,
        &[
            "brake pads", "brake pad", "pads", "bremsbeläge", "bremsbelag", "bremsbelaege",
            "bremsklötze", "plaquettes", "plaquettes de frein", "remblokken", "pastiglie",
            "pastillas",
        ],
    ),
    (
        PartCategory::BrakeRotor,
        &[
            "brake rotor", "rotor", "rotors", "disc rotor", "bremsscheibe", "disque",
            "disque de frein", "remschijf", "disco freno",
        ],
    ),
    (
        PartCategory::Brake,
        &[
            "brake", "brakes", "disc brake", "rim brake", "caliper", "bremse", "bremsen", "frein",
            "freins", "remmen", "freno", "freni", "frenos",
        ],
    ),
    (
        PartCategory::Tire,
        &[
            "tire", "tires", "tyre", "tyres", "tubeless", "reifen", "mantel", "pneu", "pneus",
            "buitenband", "copertone", "neumático", "cubierta",
        ],
    ),
    (
        PartCategory::Tube,
        &[
            "tube", "inner tube", "schlauch", "chambre à air", "chambre a air", "binnenband",
            "camera d'aria", "cámara",
        ],
    ),
    (
        PartCategory::Wheel,
        &[
            "wheel", "wheels", "wheelset", "laufradsatz", "laufrad", "roue", "roues", "wiel",
            "wielset", "ruota", "ruote", "rueda",
        ],
    ),
    (
        PartCategory::Hub,
        &["hub", "hubs", "nabe", "moyeu", "naaf", "mozzo", "buje"],
    ),
    (
        PartCategory::Fork,
        &[
            "fork", "suspension fork", "gabel", "federgabel", "fourche", "voorvork", "forcella",
            "horquilla",
        ],
    ),
    (
        PartCategory::Shock,
        &[
            "shock", "rear shock", "dämpfer", "daempfer", "amortisseur", "schokbreker",
            "ammortizzatore", "amortiguador",
        ],
    ),
    (
        PartCategory::Saddle,
        &["saddle", "seat", "sattel", "selle", "zadel", "sella", "sillín", "sillin"],
    ),
    (
        PartCategory::Seatpost,
        &[
            "seatpost", "seat post", "dropper", "dropper post", "sattelstütze", "sattelstuetze",
            "tige de selle", "zadelpen", "reggisella", "tija",
        ],
    ),
    (
        PartCategory::Handlebar,
        &[
            "handlebar", "handlebars", "bar", "bars", "lenker", "cintre", "guidon", "stuur",
            "manubrio", "manillar",
        ],
    ),
    (
        PartCategory::Stem,
        &["stem", "vorbau", "potence", "stuurpen", "attacco", "potencia"],
    ),
    (
        PartCategory::Grips,
        &[
            "grips", "grip", "griffe", "poignées", "poignees", "handvatten", "bar tape",
            "handlebar tape", "lenkerband", "manopole",
        ],
    ),
    (
        PartCategory::Pedals,
        &["pedals", "pedal", "pedale", "pédales", "pedales", "pedalen", "pedali"],
    ),
    (
        PartCategory::Cables,
        &[
            "cable", "cables", "housing", "kabel", "schaltzug", "bremszug", "züge", "câble",
            "gaine", "kabels",
        ],
    ),
    (
        PartCategory::Battery,
        &["battery", "akku", "batterie", "accu", "batteria", "batería", "bateria"],
    ),
    (
        PartCategory::Motor,
        &[
            "motor", "drive unit", "antrieb", "mittelmotor", "hub motor", "nabenmotor", "moteur",
            "motore",
        ],
    ),
    (
        PartCategory::Controller,
        &[
            "controller", "remote", "steuergerät", "steuergeraet", "bedieneinheit", "contrôleur",
            "controleur", "centralina",
        ],
    ),
    (
        PartCategory::Display,
        &["display", "bordcomputer", "head unit", "écran", "ecran", "cycle computer"],
    ),
];

pub fn bike_category_mapper() -> CategoryMapper<BikeCategory> {
    BIKE_CATEGORY_ALIASES.iter().fold(
        CategoryMapper::new("bike", BikeCategory::Other),
        |mapper, (code, aliases)| mapper.register_all(*code, aliases),
    )
}

pub fn part_category_mapper() -> CategoryMapper<PartCategory> {
    PART_CATEGORY_ALIASES.iter().fold(
        CategoryMapper::new("part", PartCategory::Other),
        |mapper, (code, aliases)| mapper.register_all(*code, aliases),
    )
}

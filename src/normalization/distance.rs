use std::collections::HashMap;

use crate::models::{BikeCategory, PartCategory};

/// Used when no table knows the part category at all.
pub const DEFAULT_EXPECTED_DISTANCE_KM: u32 = 10_000;

const BIKE_SPECIFIC_KM: &[(BikeCategory, &[(PartCategory, u32)])] = &[
    (
        BikeCategory::Road,
        &[
            (PartCategory::Chain, 2_500),
            (PartCategory::Cassette, 8_000),
            (PartCategory::Chainring, 15_000),
            (PartCategory::Tire, 4_000),
            (PartCategory::BrakePads, 3_000),
        ],
    ),
    (
        BikeCategory::Gravel,
        &[
            (PartCategory::Chain, 2_000),
            (PartCategory::Cassette, 6_000),
            (PartCategory::Tire, 3_000),
            (PartCategory::BrakePads, 2_000),
        ],
    ),
    (
        BikeCategory::Mountain,
        &[
            (PartCategory::Chain, 1_500),
            (PartCategory::Cassette, 4_000),
            (PartCategory::Chainring, 8_000),
            (PartCategory::Tire, 2_000),
            (PartCategory::BrakePads, 1_000),
            (PartCategory::BrakeRotor, 5_000),
            (PartCategory::Fork, 3_000),
            (PartCategory::Shock, 3_000),
        ],
    ),
    (
        BikeCategory::EBike,
        &[
            (PartCategory::Chain, 1_500),
            (PartCategory::Cassette, 3_000),
            (PartCategory::Chainring, 6_000),
            (PartCategory::Tire, 2_500),
            (PartCategory::BrakePads, 1_500),
            (PartCategory::BrakeRotor, 6_000),
        ],
    ),
    (
        BikeCategory::Trekking,
        &[
            (PartCategory::Chain, 3_000),
            (PartCategory::Cassette, 8_000),
            (PartCategory::Tire, 5_000),
            (PartCategory::BrakePads, 2_500),
        ],
    ),
    (
        BikeCategory::City,
        &[
            (PartCategory::Chain, 3_000),
            (PartCategory::Tire, 5_000),
            (PartCategory::BrakePads, 3_000),
        ],
    ),
    (
        BikeCategory::Cargo,
        &[
            (PartCategory::Chain, 2_000),
            (PartCategory::Tire, 3_000),
            (PartCategory::BrakePads, 1_500),
            (PartCategory::BrakeRotor, 5_000),
        ],
    ),
];

const ASSIST_KM: &[(PartCategory, u32)] = &[
    (PartCategory::Battery, 30_000),
    (PartCategory::Motor, 20_000),
    (PartCategory::Controller, 50_000),
    (PartCategory::Display, 50_000),
];

const GLOBAL_KM: &[(PartCategory, u32)] = &[
    (PartCategory::Chain, 3_000),
    (PartCategory::Cassette, 9_000),
    (PartCategory::Chainring, 20_000),
    (PartCategory::Crankset, 30_000),
    (PartCategory::BottomBracket, 15_000),
    (PartCategory::FrontDerailleur, 30_000),
    (PartCategory::RearDerailleur, 25_000),
    (PartCategory::Shifter, 30_000),
    (PartCategory::BrakePads, 2_500),
    (PartCategory::BrakeRotor, 10_000),
    (PartCategory::Brake, 20_000),
    (PartCategory::Tire, 4_000),
    (PartCategory::Tube, 5_000),
    (PartCategory::Wheel, 30_000),
    (PartCategory::Hub, 15_000),
    (PartCategory::Fork, 5_000),
    (PartCategory::Shock, 5_000),
    (PartCategory::Saddle, 20_000),
    (PartCategory::Seatpost, 20_000),
    (PartCategory::Handlebar, 30_000),
    (PartCategory::Stem, 30_000),
    (PartCategory::Grips, 8_000),
    (PartCategory::Pedals, 15_000),
    (PartCategory::Cables, 6_000),
];

/// Service-life tables consulted by [`ExpectedDistanceResolver::resolve`].
///
/// Precedence, highest first:
/// 1. explicit override from the raw entry
/// 2. bike-category specific entry
/// 3. assist components (battery, motor, controller, display)
/// 4. global per-category entry
/// 5. [`DEFAULT_EXPECTED_DISTANCE_KM`]
#[derive(Debug, Clone)]
pub struct ExpectedDistanceResolver {
    by_bike: HashMap<BikeCategory, HashMap<PartCategory, u32>>,
    assist: HashMap<PartCategory, u32>,
    global: HashMap<PartCategory, u32>,
    hard_default: u32,
}

impl Default for ExpectedDistanceResolver {
    fn default() -> Self {
        Self {
            by_bike: HashMap::new(),
            assist: HashMap::new(),
            global: HashMap::new(),
            hard_default: DEFAULT_EXPECTED_DISTANCE_KM,
        }
    }
}

impl ExpectedDistanceResolver {
    pub fn with_defaults() -> Self {
        let mut resolver = Self::default();
        for (bike, entries) in BIKE_SPECIFIC_KM {
            for (part, km) in *entries {
                resolver = resolver.bike_specific(*bike, *part, *km);
            }
        }
        for (part, km) in ASSIST_KM {
            resolver = resolver.assist(*part, *km);
        }
        for (part, km) in GLOBAL_KM {
            resolver = resolver.global(*part, *km);
        }
        resolver
    }

    pub fn bike_specific(mut self, bike: BikeCategory, part: PartCategory, km: u32) -> Self {
        self.by_bike.entry(bike).or_default().insert(part, km);
        self
    }

    pub fn assist(mut self, part: PartCategory, km: u32) -> Self {
        self.assist.insert(part, km);
        self
    }

    pub fn global(mut self, part: PartCategory, km: u32) -> Self {
        self.global.insert(part, km);
        self
    }

    pub fn hard_default(mut self, km: u32) -> Self {
        self.hard_default = km;
        self
    }

    pub fn resolve(
        &self,
        part: PartCategory,
        bike: Option<BikeCategory>,
        explicit_override: Option<u32>,
    ) -> u32 {
        if let Some(km) = explicit_override {
            return km;
        }
        bike.and_then(|b| self.by_bike.get(&b))
            .and_then(|table| table.get(&part))
            .or_else(|| self.assist.get(&part))
            .or_else(|| self.global.get(&part))
            .copied()
            .unwrap_or(self.hard_default)
    }
}

//! Intensity mapping from fractions of threshold power.
//!
//! Converts a fraction of the rider's reference power into either a 5-zone
//! heart-rate target or a buffered watt range.
//!
//! Two heart-rate strategies exist and they disagree for some fractions
//! (0.80 is zone 4 in the table but zone 3 in the bands), so callers pick one
//! explicitly through [`ZoneStrategy`].

use serde::{Deserialize, Serialize};

use crate::storage::config::ConversionConfig;

/// Heart-rate zone, always in 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeartRateZone(u8);

impl HeartRateZone {
    pub const MIN: HeartRateZone = HeartRateZone(1);
    pub const MAX: HeartRateZone = HeartRateZone(5);

    /// Create a zone, returning `None` outside 1..=5.
    pub fn new(zone: u8) -> Option<Self> {
        (1..=5).contains(&zone).then_some(HeartRateZone(zone))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HeartRateZone {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        HeartRateZone::new(value).ok_or_else(|| format!("heart-rate zone {} is not in 1..=5", value))
    }
}

impl From<HeartRateZone> for u8 {
    fn from(zone: HeartRateZone) -> Self {
        zone.0
    }
}

impl std::fmt::Display for HeartRateZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Z{}", self.0)
    }
}

/// How a power fraction is turned into a heart-rate zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStrategy {
    /// Closest checkpoint in [`POWER_TO_HR_ZONE`]; ties go to the smaller
    /// checkpoint.
    #[default]
    NearestTable,
    /// Fixed bands: <=0.55 Z1, <=0.70 Z2, <=0.85 Z3, <=0.95 Z4, else Z5.
    ThresholdBanded,
}

impl std::fmt::Display for ZoneStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneStrategy::NearestTable => write!(f, "nearest-table"),
            ZoneStrategy::ThresholdBanded => write!(f, "threshold-banded"),
        }
    }
}

/// Power checkpoints (percent of threshold) and their heart-rate zone.
pub const POWER_TO_HR_ZONE: [(u32, u8); 14] = [
    (50, 1),  // Recovery
    (60, 2),  // Aerobic base
    (65, 2),
    (70, 3),  // Aerobic
    (75, 3),
    (80, 4),  // Threshold
    (85, 4),
    (90, 4),
    (95, 4),
    (100, 5), // VO2max
    (105, 5),
    (110, 5),
    (115, 5), // Neuromuscular
    (120, 5),
];

/// Distance difference below which two checkpoints count as equally close.
const TIE_EPSILON: f64 = 1e-9;

/// Upper band limits (inclusive) for [`ZoneStrategy::ThresholdBanded`].
const ZONE_BANDS: [(f64, u8); 4] = [(0.55, 1), (0.70, 2), (0.85, 3), (0.95, 4)];

/// Map a fraction of threshold power to a heart-rate zone.
pub fn fraction_to_heart_rate_zone(fraction: f64, strategy: ZoneStrategy) -> HeartRateZone {
    let zone = match strategy {
        ZoneStrategy::NearestTable => nearest_table_zone(fraction),
        ZoneStrategy::ThresholdBanded => ZONE_BANDS
            .iter()
            .find(|(limit, _)| fraction <= *limit)
            .map(|(_, zone)| *zone)
            .unwrap_or(5),
    };
    HeartRateZone(zone)
}

fn nearest_table_zone(fraction: f64) -> u8 {
    let mut best = POWER_TO_HR_ZONE[0];
    let mut best_distance = f64::INFINITY;
    for &(percent, zone) in POWER_TO_HR_ZONE.iter() {
        let distance = (fraction - percent as f64 / 100.0).abs();
        // Distances within TIE_EPSILON are ties; the smaller checkpoint keeps them.
        if distance < best_distance - TIE_EPSILON {
            best = (percent, zone);
            best_distance = distance;
        }
    }
    best.1
}

/// A buffered power target in whole watts.
///
/// Bounds are signed: a buffer above 100% drives `low` negative, which the
/// encoder rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WattRange {
    pub low: i32,
    pub high: i32,
}

impl WattRange {
    /// True when both bounds round to the same watt value.
    pub fn is_single(&self) -> bool {
        self.low == self.high
    }
}

/// Convert a single fraction into a buffered watt range.
pub fn fraction_to_power_range(fraction: f64, config: &ConversionConfig) -> WattRange {
    power_range_between(fraction, fraction, config)
}

/// Buffered watt range spanning two fractions.
///
/// The lower fraction is buffered downwards and the higher one upwards, so a
/// ramp given high-to-low (as cooldowns are) still yields `low <= high`.
pub fn power_range_between(
    low_fraction: f64,
    high_fraction: f64,
    config: &ConversionConfig,
) -> WattRange {
    let (lo, hi) = if low_fraction <= high_fraction {
        (low_fraction, high_fraction)
    } else {
        (high_fraction, low_fraction)
    };
    let buffer = config.power_buffer_fraction;

    WattRange {
        low: (lo * config.reference_power * (1.0 - buffer)).round() as i32,
        high: (hi * config.reference_power * (1.0 + buffer)).round() as i32,
    }
}

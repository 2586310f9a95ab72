//! Intensity mapping between power fractions, heart-rate zones and watts.

pub mod zones;

pub use zones::{
    fraction_to_heart_rate_zone, fraction_to_power_range, power_range_between, HeartRateZone,
    WattRange, ZoneStrategy,
};

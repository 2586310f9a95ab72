//! Workout document types and parse errors.
//!
//! A [`WorkoutDocument`] is the raw, unexpanded view of a `.zwo` file: metadata
//! plus the ordered interval blocks exactly as the source describes them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sport declared by a workout's `sportType` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Run,
    Bike,
    Swim,
    /// Anything unrecognised, including a missing `sportType`
    #[default]
    Other,
}

impl Sport {
    /// Map a `sportType` value. Matching is case-insensitive; `cycling` is an
    /// alias for `bike`.
    pub fn from_sport_type(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "run" => Sport::Run,
            "bike" | "cycling" => Sport::Bike,
            "swim" => Sport::Swim,
            _ => Sport::Other,
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sport::Run => write!(f, "Run"),
            Sport::Bike => write!(f, "Bike"),
            Sport::Swim => write!(f, "Swim"),
            Sport::Other => write!(f, "Other"),
        }
    }
}

/// Kind of source block, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Warmup,
    Cooldown,
    SteadyState,
    Repeat,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::Warmup => write!(f, "Warmup"),
            BlockKind::Cooldown => write!(f, "Cooldown"),
            BlockKind::SteadyState => write!(f, "SteadyState"),
            BlockKind::Repeat => write!(f, "IntervalsT"),
        }
    }
}

/// A warmup or cooldown ramp between two fractions of threshold power.
///
/// `power_low` is the starting fraction and `power_high` the ending one, as in
/// the source file. Cooldowns usually have `power_low > power_high`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampBlock {
    pub duration_seconds: u32,
    pub power_low: f64,
    pub power_high: f64,
}

impl RampBlock {
    /// Midpoint of the ramp, used for heart-rate targeting.
    pub fn average_power(&self) -> f64 {
        (self.power_low + self.power_high) / 2.0
    }
}

/// Constant effort at a single fraction of threshold power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteadyBlock {
    pub duration_seconds: u32,
    pub power: f64,
}

/// Repeated on/off intervals (`IntervalsT`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatBlock {
    /// Number of work intervals (always at least 1)
    pub repeat: u32,
    pub on_duration_seconds: u32,
    pub off_duration_seconds: u32,
    pub on_power: f64,
    pub off_power: f64,
}

/// One block inside a workout's `<workout>` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalBlock {
    Warmup(RampBlock),
    Cooldown(RampBlock),
    SteadyState(SteadyBlock),
    Repeat(RepeatBlock),
}

impl IntervalBlock {
    pub fn kind(&self) -> BlockKind {
        match self {
            IntervalBlock::Warmup(_) => BlockKind::Warmup,
            IntervalBlock::Cooldown(_) => BlockKind::Cooldown,
            IntervalBlock::SteadyState(_) => BlockKind::SteadyState,
            IntervalBlock::Repeat(_) => BlockKind::Repeat,
        }
    }

    /// Nominal duration of the block in seconds, including every repeat.
    pub fn duration_seconds(&self) -> u64 {
        match self {
            IntervalBlock::Warmup(b) | IntervalBlock::Cooldown(b) => b.duration_seconds as u64,
            IntervalBlock::SteadyState(b) => b.duration_seconds as u64,
            IntervalBlock::Repeat(b) => {
                let repeat = b.repeat as u64;
                (repeat * b.on_duration_seconds as u64)
                    .saturating_add(repeat.saturating_sub(1) * b.off_duration_seconds as u64)
            }
        }
    }

    /// Number of device steps the block expands into.
    pub fn step_count(&self) -> u64 {
        match self {
            IntervalBlock::Repeat(b) => (b.repeat as u64 * 2).saturating_sub(1),
            _ => 1,
        }
    }
}

/// A parsed `.zwo` workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDocument {
    /// Workout name ("Unnamed Workout" when missing)
    pub name: String,
    /// Free-text description (empty when missing)
    pub description: String,
    /// Workout creator, if declared
    pub author: Option<String>,
    pub sport: Sport,
    /// Values of `<tag name="..."/>` entries
    pub tags: Vec<String>,
    /// Blocks in source order
    pub blocks: Vec<IntervalBlock>,
}

impl WorkoutDocument {
    /// Total nominal duration in seconds. Open-ended steps still count with
    /// their source duration.
    pub fn total_duration_seconds(&self) -> u64 {
        self.blocks
            .iter()
            .map(IntervalBlock::duration_seconds)
            .fold(0, u64::saturating_add)
    }

    /// Number of device steps the blocks expand into, saturating at `u64::MAX`.
    pub fn step_count(&self) -> u64 {
        self.blocks
            .iter()
            .map(IntervalBlock::step_count)
            .fold(0, u64::saturating_add)
    }
}

/// Errors during workout file parsing.
#[derive(Debug, Error)]
pub enum WorkoutParseError {
    /// Source is not well-formed XML
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// Attribute value could not be parsed or is out of range
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// IO error reading file
    #[error("IO error: {0}")]
    IoError(String),
}

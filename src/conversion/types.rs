//! Expanded step model and conversion errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::types::ExportError;
use crate::metrics::zones::HeartRateZone;
use crate::storage::config::ConfigError;
use crate::workouts::types::{BlockKind, WorkoutParseError};

/// What a step is for on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    Warmup,
    Cooldown,
    Active,
    Rest,
}

impl std::fmt::Display for StepRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepRole::Warmup => write!(f, "Warmup"),
            StepRole::Cooldown => write!(f, "Cooldown"),
            StepRole::Active => write!(f, "Active"),
            StepRole::Rest => write!(f, "Rest"),
        }
    }
}

/// How a step ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationMode {
    /// Ends after this many seconds
    Timed(u32),
    /// Ends when the athlete presses LAP
    Open,
}

impl std::fmt::Display for DurationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationMode::Timed(seconds) => write!(f, "{}s", seconds),
            DurationMode::Open => write!(f, "open"),
        }
    }
}

/// Step target in device-agnostic terms. Watts are whole, already buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    HeartRateZone(HeartRateZone),
    PowerSingle(i32),
    PowerRange { low: i32, high: i32 },
}

impl std::fmt::Display for TargetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetMode::HeartRateZone(zone) => write!(f, "HR Zone {}", zone.get()),
            TargetMode::PowerSingle(watts) => write!(f, "{} W", watts),
            TargetMode::PowerRange { low, high } => write!(f, "{}-{} W", low, high),
        }
    }
}

/// One expanded workout step. Its position in the step list is its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescriptor {
    /// Display name shown on the device
    pub name: String,
    pub role: StepRole,
    pub duration: DurationMode,
    pub target: TargetMode,
    /// Block the step was expanded from
    pub block: BlockKind,
}

/// Noteworthy decisions taken while expanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionEvent {
    /// A warmup's own power fractions were replaced by the configured one.
    WarmupPowerForced {
        block_index: usize,
        original_low: f64,
        original_high: f64,
        forced: f64,
    },
}

/// Result of expanding a workout's blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expansion {
    pub steps: Vec<StepDescriptor>,
    pub events: Vec<ExpansionEvent>,
}

/// Why a step could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingFault {
    #[error("power target of {watts} W is negative")]
    NegativePower { watts: i32 },

    #[error("power target of {watts} W is outside the encodable range")]
    PowerOutOfRange { watts: i32 },

    #[error("duration of {seconds}s does not fit in milliseconds")]
    DurationOverflow { seconds: u32 },

    #[error("{count} steps exceed the maximum message index")]
    TooManySteps { count: usize },
}

/// A step that cannot be represented in the destination format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot encode step {step_index} ({block} block): {fault}")]
pub struct EncodingError {
    pub step_index: usize,
    pub block: BlockKind,
    pub fault: EncodingFault,
}

/// Errors for a whole document conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Failed to parse workout: {0}")]
    Parse(#[from] WorkoutParseError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Failed to export workout: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Device-ready workout records and export errors.
//!
//! Enum discriminants are the FIT profile values written to the file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// FIT `sport` values used for workouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum FitSport {
    Generic = 0,
    Running = 1,
    Cycling = 2,
    Swimming = 5,
}

/// FIT `wkt_step_duration` values we emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DurationType {
    /// Duration value in milliseconds
    Time = 0,
    /// Advances on LAP press
    Open = 5,
}

/// FIT `wkt_step_target` values we emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TargetType {
    HeartRate = 1,
    Power = 4,
}

/// FIT `intensity` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Intensity {
    Active = 0,
    Rest = 1,
    Warmup = 2,
    Cooldown = 3,
}

/// One `workout_step` message, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedStep {
    /// Emission position, 0-based
    pub message_index: u16,
    pub name: String,
    pub duration_type: DurationType,
    /// Milliseconds for timed steps, absent for open steps
    pub duration_value: Option<u32>,
    pub target_type: TargetType,
    /// Zone number, encoded power, or 0 when the custom range applies
    pub target_value: u32,
    pub custom_target_low: Option<u32>,
    pub custom_target_high: Option<u32>,
    pub intensity: Intensity,
}

/// A `workout` message plus its steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedWorkout {
    pub name: String,
    pub sport: FitSport,
    pub num_valid_steps: u16,
    pub steps: Vec<EncodedStep>,
}

/// Errors during workout export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Output exists and overwriting is disabled
    #[error("File already exists: {0}")]
    FileExists(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

//! Target encoding into FIT workout records.
//!
//! FIT reads a power `custom_target_value` of 0-1000 as a percentage of FTP
//! (tenths of a percent) and anything above 1000 as absolute watts + 1000.

use crate::conversion::types::{
    DurationMode, EncodingError, EncodingFault, StepDescriptor, StepRole, TargetMode,
};
use crate::export::types::{
    DurationType, EncodedStep, EncodedWorkout, FitSport, Intensity, TargetType,
};
use crate::storage::config::{ConversionConfig, PowerEncoding};
use crate::workouts::types::{BlockKind, Sport, WorkoutDocument};

/// Offset FIT adds to absolute watt targets.
pub const ABSOLUTE_POWER_OFFSET: u32 = 1000;

/// Largest threshold-relative value (100% of reference power).
pub const MAX_RELATIVE_POWER: u32 = 1000;

/// Highest step count a u16 message index can address (0xFFFF is invalid).
const MAX_STEPS: usize = u16::MAX as usize;

impl From<Sport> for FitSport {
    fn from(sport: Sport) -> Self {
        match sport {
            Sport::Run => FitSport::Running,
            Sport::Bike => FitSport::Cycling,
            Sport::Swim => FitSport::Swimming,
            Sport::Other => FitSport::Generic,
        }
    }
}

impl From<StepRole> for Intensity {
    fn from(role: StepRole) -> Self {
        match role {
            StepRole::Warmup => Intensity::Warmup,
            StepRole::Cooldown => Intensity::Cooldown,
            StepRole::Active => Intensity::Active,
            StepRole::Rest => Intensity::Rest,
        }
    }
}

/// Encode a watt value per the configured power encoding.
///
/// Negative watts fit neither encoding. Threshold-relative values above
/// [`MAX_RELATIVE_POWER`] would be read as absolute watts and are rejected.
pub fn encode_power(watts: i32, config: &ConversionConfig) -> Result<u32, EncodingFault> {
    let unsigned = u32::try_from(watts).map_err(|_| EncodingFault::NegativePower { watts })?;
    match config.power_encoding {
        PowerEncoding::Absolute => unsigned
            .checked_add(ABSOLUTE_POWER_OFFSET)
            .ok_or(EncodingFault::PowerOutOfRange { watts }),
        PowerEncoding::ThresholdRelative => {
            let scaled = (unsigned as f64 / config.reference_power * 100.0 * 10.0).round();
            if scaled > MAX_RELATIVE_POWER as f64 {
                return Err(EncodingFault::PowerOutOfRange { watts });
            }
            Ok(scaled as u32)
        }
    }
}

/// Encode one step at position `step_index`.
pub fn encode_step(
    step: &StepDescriptor,
    step_index: usize,
    config: &ConversionConfig,
) -> Result<EncodedStep, EncodingError> {
    let fail = |fault| EncodingError {
        step_index,
        block: step.block,
        fault,
    };

    let message_index = u16::try_from(step_index)
        .ok()
        .filter(|index| (*index as usize) < MAX_STEPS)
        .ok_or_else(|| {
            fail(EncodingFault::TooManySteps {
                count: step_index + 1,
            })
        })?;

    let (duration_type, duration_value) = match step.duration {
        DurationMode::Timed(seconds) => {
            let millis = seconds
                .checked_mul(1000)
                .ok_or_else(|| fail(EncodingFault::DurationOverflow { seconds }))?;
            (DurationType::Time, Some(millis))
        }
        DurationMode::Open => (DurationType::Open, None),
    };

    let power = |watts: i32| encode_power(watts, config).map_err(fail);

    let (target_type, target_value, custom_target_low, custom_target_high) = match step.target {
        TargetMode::HeartRateZone(zone) => (TargetType::HeartRate, zone.get() as u32, None, None),
        TargetMode::PowerSingle(watts) => (TargetType::Power, power(watts)?, None, None),
        TargetMode::PowerRange { low, high } => {
            // 0 tells the device to read the custom range instead
            (TargetType::Power, 0, Some(power(low)?), Some(power(high)?))
        }
    };

    Ok(EncodedStep {
        message_index,
        name: step.name.clone(),
        duration_type,
        duration_value,
        target_type,
        target_value,
        custom_target_low,
        custom_target_high,
        intensity: step.role.into(),
    })
}

/// Reject documents whose blocks expand into more steps than a message index
/// can address, before any step is built.
pub fn check_step_count(document: &WorkoutDocument) -> Result<(), EncodingError> {
    let mut count: u64 = 0;
    for block in &document.blocks {
        count = count.saturating_add(block.step_count());
        if count > MAX_STEPS as u64 {
            return Err(EncodingError {
                step_index: MAX_STEPS,
                block: block.kind(),
                fault: EncodingFault::TooManySteps {
                    count: usize::try_from(document.step_count()).unwrap_or(usize::MAX),
                },
            });
        }
    }
    Ok(())
}

/// Encode a full workout. Message indices follow the order of `steps`.
pub fn encode_workout(
    document: &WorkoutDocument,
    steps: &[StepDescriptor],
    config: &ConversionConfig,
) -> Result<EncodedWorkout, EncodingError> {
    if steps.len() > MAX_STEPS {
        let block = steps
            .get(MAX_STEPS)
            .map(|step| step.block)
            .unwrap_or(BlockKind::Repeat);
        return Err(EncodingError {
            step_index: MAX_STEPS,
            block,
            fault: EncodingFault::TooManySteps { count: steps.len() },
        });
    }

    let encoded = steps
        .iter()
        .enumerate()
        .map(|(index, step)| encode_step(step, index, config))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EncodedWorkout {
        name: document.name.clone(),
        sport: document.sport.into(),
        num_valid_steps: encoded.len() as u16,
        steps: encoded,
    })
}

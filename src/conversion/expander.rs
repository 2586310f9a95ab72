//! Block expansion into a flat, ordered step list.

use crate::conversion::types::{
    DurationMode, Expansion, ExpansionEvent, StepDescriptor, StepRole, TargetMode,
};
use crate::metrics::zones::{
    fraction_to_heart_rate_zone, fraction_to_power_range, power_range_between, WattRange,
};
use crate::storage::config::ConversionConfig;
use crate::workouts::types::{
    BlockKind, IntervalBlock, RampBlock, RepeatBlock, Sport, SteadyBlock,
};

const WARMUP_NAME: &str = "Warm up";
const WARMUP_OPEN_NAME: &str = "Warm up (Press LAP when ready)";
const COOLDOWN_NAME: &str = "Cool down";
const COOLDOWN_OPEN_NAME: &str = "Cool down (Press LAP when done)";
const STEADY_STATE_NAME: &str = "Steady State";

/// Expand blocks into device steps, preserving source order.
pub fn expand(blocks: &[IntervalBlock], sport: Sport, config: &ConversionConfig) -> Expansion {
    let targeting = Targeting::new(sport, config);
    let mut expansion = Expansion::default();

    for (block_index, block) in blocks.iter().enumerate() {
        match block {
            IntervalBlock::Warmup(ramp) => {
                let ramp = match config.forced_warmup_fraction {
                    Some(forced) => {
                        tracing::info!(
                            block_index,
                            original_low = ramp.power_low,
                            original_high = ramp.power_high,
                            forced,
                            "Overriding warmup power"
                        );
                        expansion.events.push(ExpansionEvent::WarmupPowerForced {
                            block_index,
                            original_low: ramp.power_low,
                            original_high: ramp.power_high,
                            forced,
                        });
                        RampBlock {
                            power_low: forced,
                            power_high: forced,
                            ..ramp.clone()
                        }
                    }
                    None => ramp.clone(),
                };
                let (name, duration) = if config.warmup_open_ended {
                    (WARMUP_OPEN_NAME, DurationMode::Open)
                } else {
                    (WARMUP_NAME, DurationMode::Timed(ramp.duration_seconds))
                };
                expansion.steps.push(StepDescriptor {
                    name: name.to_string(),
                    role: StepRole::Warmup,
                    duration,
                    target: targeting.ramp(&ramp),
                    block: BlockKind::Warmup,
                });
            }
            IntervalBlock::Cooldown(ramp) => {
                let (name, duration) = if config.cooldown_open_ended {
                    (COOLDOWN_OPEN_NAME, DurationMode::Open)
                } else {
                    (COOLDOWN_NAME, DurationMode::Timed(ramp.duration_seconds))
                };
                expansion.steps.push(StepDescriptor {
                    name: name.to_string(),
                    role: StepRole::Cooldown,
                    duration,
                    target: targeting.ramp(ramp),
                    block: BlockKind::Cooldown,
                });
            }
            IntervalBlock::SteadyState(steady) => {
                expansion.steps.push(steady_step(steady, &targeting));
            }
            IntervalBlock::Repeat(repeat) => {
                expand_repeat(repeat, &targeting, &mut expansion.steps);
            }
        }
    }

    for (index, step) in expansion.steps.iter().enumerate() {
        tracing::debug!(
            index,
            name = %step.name,
            duration = %step.duration,
            target = %step.target,
            "Expanded step"
        );
    }

    expansion
}

fn steady_step(steady: &SteadyBlock, targeting: &Targeting<'_>) -> StepDescriptor {
    StepDescriptor {
        name: STEADY_STATE_NAME.to_string(),
        role: StepRole::Active,
        duration: DurationMode::Timed(steady.duration_seconds),
        target: targeting.single(steady.power),
        block: BlockKind::SteadyState,
    }
}

/// Work/recovery pairs with the final recovery dropped: N work steps and
/// N - 1 recovery steps.
fn expand_repeat(repeat: &RepeatBlock, targeting: &Targeting<'_>, steps: &mut Vec<StepDescriptor>) {
    let work_target = targeting.single(repeat.on_power);
    let recovery_target = targeting.single(repeat.off_power);

    for n in 1..=repeat.repeat {
        steps.push(StepDescriptor {
            name: format!("Interval {} - Work", n),
            role: StepRole::Active,
            duration: DurationMode::Timed(repeat.on_duration_seconds),
            target: work_target,
            block: BlockKind::Repeat,
        });

        if n < repeat.repeat {
            steps.push(StepDescriptor {
                name: format!("Interval {} - Recovery", n),
                role: StepRole::Rest,
                duration: DurationMode::Timed(repeat.off_duration_seconds),
                target: recovery_target,
                block: BlockKind::Repeat,
            });
        }
    }
}

/// Target selection for one workout: power or heart rate, decided once.
struct Targeting<'a> {
    config: &'a ConversionConfig,
    use_power: bool,
}

impl<'a> Targeting<'a> {
    fn new(sport: Sport, config: &'a ConversionConfig) -> Self {
        Self {
            config,
            use_power: config.use_cycling_power && sport == Sport::Bike,
        }
    }

    fn ramp(&self, ramp: &RampBlock) -> TargetMode {
        if self.use_power {
            power_target(power_range_between(
                ramp.power_low,
                ramp.power_high,
                self.config,
            ))
        } else {
            TargetMode::HeartRateZone(fraction_to_heart_rate_zone(
                ramp.average_power(),
                self.config.zone_strategy,
            ))
        }
    }

    fn single(&self, fraction: f64) -> TargetMode {
        if self.use_power {
            power_target(fraction_to_power_range(fraction, self.config))
        } else {
            TargetMode::HeartRateZone(fraction_to_heart_rate_zone(
                fraction,
                self.config.zone_strategy,
            ))
        }
    }
}

fn power_target(range: WattRange) -> TargetMode {
    if range.is_single() {
        TargetMode::PowerSingle(range.low)
    } else {
        TargetMode::PowerRange {
            low: range.low,
            high: range.high,
        }
    }
}

//! Single-document conversion: parse, expand, encode.

use std::path::Path;

use crate::conversion::encoder::{check_step_count, encode_workout};
use crate::conversion::expander::expand;
use crate::conversion::types::{ConversionError, Expansion, StepDescriptor};
use crate::export::types::EncodedWorkout;
use crate::storage::config::ConversionConfig;
use crate::workouts::parser_zwo::{parse_zwo, parse_zwo_file};
use crate::workouts::types::WorkoutDocument;

/// Everything produced by converting one document.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: WorkoutDocument,
    pub expansion: Expansion,
    pub workout: EncodedWorkout,
}

impl Conversion {
    pub fn steps(&self) -> &[StepDescriptor] {
        &self.expansion.steps
    }
}

/// Convert ZWO source text.
pub fn convert_str(source: &str, config: &ConversionConfig) -> Result<Conversion, ConversionError> {
    config.validate()?;
    let document = parse_zwo(source)?;
    convert_document(document, config)
}

/// Convert a ZWO file on disk.
pub fn convert_file(path: &Path, config: &ConversionConfig) -> Result<Conversion, ConversionError> {
    config.validate()?;
    let document = parse_zwo_file(path)?;
    convert_document(document, config)
}

/// Expand and encode an already parsed document.
pub fn convert_document(
    document: WorkoutDocument,
    config: &ConversionConfig,
) -> Result<Conversion, ConversionError> {
    check_step_count(&document)?;
    let expansion = expand(&document.blocks, document.sport, config);
    let workout = encode_workout(&document, &expansion.steps, config)?;

    tracing::info!(
        workout = %document.name,
        sport = %document.sport,
        steps = workout.steps.len(),
        duration_s = document.total_duration_seconds(),
        "Converted workout"
    );

    Ok(Conversion {
        document,
        expansion,
        workout,
    })
}

/// One-line description of a step, numbered from 1.
pub fn step_summary(index: usize, step: &StepDescriptor) -> String {
    format!(
        "Step {}: {} - {} - {}",
        index + 1,
        step.name,
        step.duration,
        step.target
    )
}

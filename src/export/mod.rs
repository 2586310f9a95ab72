//! FIT workout export.

pub mod exporter_fit;
pub mod types;

pub use exporter_fit::{
    export_workout_fit, export_workout_fit_to_file, generate_fit_filename,
    sanitize_workout_name, write_fit_file,
};
pub use types::{
    DurationType, EncodedStep, EncodedWorkout, ExportError, FitSport, Intensity, TargetType,
};

//! Workout translation: block expansion, target encoding and batch runs.

pub mod batch;
pub mod encoder;
pub mod expander;
pub mod pipeline;
pub mod types;

pub use batch::{convert_folder, find_zwo_files, BatchOptions, BatchSummary};
pub use encoder::{check_step_count, encode_power, encode_step, encode_workout};
pub use expander::expand;
pub use pipeline::{convert_document, convert_file, convert_str, step_summary, Conversion};
pub use types::{
    ConversionError, DurationMode, EncodingError, EncodingFault, Expansion, ExpansionEvent,
    StepDescriptor, StepRole, TargetMode,
};

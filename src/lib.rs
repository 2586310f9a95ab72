//! zwofit - Zwift workout to FIT converter
//!
//! Turns `.zwo` interval workouts into Garmin FIT workout files. Repeat blocks
//! are expanded into individual steps and every step gets a heart-rate zone or
//! buffered power target derived from the rider's threshold power.

pub mod conversion;
pub mod export;
pub mod metrics;
pub mod storage;
pub mod workouts;

// Re-export commonly used types
pub use conversion::{convert_file, convert_folder, convert_str, Conversion, ConversionError};
pub use storage::config::{AppConfig, ConversionConfig, PowerEncoding};
pub use workouts::parser_zwo::parse_zwo;
pub use workouts::types::WorkoutDocument;

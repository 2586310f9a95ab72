//! Workout documents and the `.zwo` parser.

pub mod parser_zwo;
pub mod types;

pub use parser_zwo::{parse_zwo, parse_zwo_file};
pub use types::{
    BlockKind, IntervalBlock, RampBlock, RepeatBlock, Sport, SteadyBlock, WorkoutDocument,
    WorkoutParseError,
};

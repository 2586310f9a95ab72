//! Unit tests for the .zwo parser.

use zwofit::workouts::parser_zwo::{parse_zwo, parse_zwo_file};
use zwofit::workouts::types::{
    IntervalBlock, RampBlock, RepeatBlock, Sport, SteadyBlock, WorkoutParseError,
};

/// Sample ZWO workout XML for testing.
const SAMPLE_ZWO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workout_file>
    <author>Test Author</author>
    <name>Test Workout</name>
    <description>A simple test workout</description>
    <sportType>bike</sportType>
    <tags>
        <tag name="Intervals"/>
        <tag name="FTP"/>
    </tags>
    <workout>
        <Warmup Duration="300" PowerLow="0.4" PowerHigh="0.7"/>
        <SteadyState Duration="600" Power="0.75" Cadence="90"/>
        <IntervalsT Repeat="4" OnDuration="30" OffDuration="30" OnPower="1.2" OffPower="0.5"/>
        <FreeRide Duration="600"/>
        <Cooldown Duration="300" PowerLow="0.5" PowerHigh="0.3"/>
    </workout>
</workout_file>"#;

#[test]
fn test_parse_zwo_metadata() {
    let workout = parse_zwo(SAMPLE_ZWO).expect("Should parse ZWO workout");

    assert_eq!(workout.name, "Test Workout");
    assert_eq!(workout.author.as_deref(), Some("Test Author"));
    assert_eq!(workout.description, "A simple test workout");
    assert_eq!(workout.sport, Sport::Bike);
    assert_eq!(workout.tags, vec!["Intervals".to_string(), "FTP".to_string()]);
}

#[test]
fn test_parse_zwo_blocks_in_order() {
    let workout = parse_zwo(SAMPLE_ZWO).expect("Should parse ZWO workout");

    // FreeRide is not supported and is skipped
    assert_eq!(workout.blocks.len(), 4);
    assert_eq!(
        workout.blocks[0],
        IntervalBlock::Warmup(RampBlock {
            duration_seconds: 300,
            power_low: 0.4,
            power_high: 0.7,
        })
    );
    assert_eq!(
        workout.blocks[1],
        IntervalBlock::SteadyState(SteadyBlock {
            duration_seconds: 600,
            power: 0.75,
        })
    );
    assert_eq!(
        workout.blocks[2],
        IntervalBlock::Repeat(RepeatBlock {
            repeat: 4,
            on_duration_seconds: 30,
            off_duration_seconds: 30,
            on_power: 1.2,
            off_power: 0.5,
        })
    );
    assert_eq!(
        workout.blocks[3],
        IntervalBlock::Cooldown(RampBlock {
            duration_seconds: 300,
            power_low: 0.5,
            power_high: 0.3,
        })
    );
}

#[test]
fn test_missing_metadata_uses_defaults() {
    let workout = parse_zwo("<workout_file><workout/></workout_file>").unwrap();

    assert_eq!(workout.name, "Unnamed Workout");
    assert_eq!(workout.description, "");
    assert_eq!(workout.author, None);
    assert_eq!(workout.sport, Sport::Other);
    assert!(workout.blocks.is_empty());
}

#[test]
fn test_sport_type_is_lowercased() {
    let workout =
        parse_zwo("<workout_file><sportType>RUN</sportType><workout/></workout_file>").unwrap();
    assert_eq!(workout.sport, Sport::Run);
}

#[test]
fn test_missing_attributes_use_block_defaults() {
    let zwo = r#"<workout_file>
    <workout>
        <Warmup/>
        <Cooldown/>
        <SteadyState/>
        <IntervalsT/>
    </workout>
</workout_file>"#;

    let workout = parse_zwo(zwo).unwrap();
    assert_eq!(
        workout.blocks,
        vec![
            IntervalBlock::Warmup(RampBlock {
                duration_seconds: 600,
                power_low: 0.60,
                power_high: 0.70,
            }),
            IntervalBlock::Cooldown(RampBlock {
                duration_seconds: 600,
                power_low: 0.60,
                power_high: 0.65,
            }),
            IntervalBlock::SteadyState(SteadyBlock {
                duration_seconds: 1200,
                power: 0.75,
            }),
            IntervalBlock::Repeat(RepeatBlock {
                repeat: 1,
                on_duration_seconds: 300,
                off_duration_seconds: 120,
                on_power: 0.85,
                off_power: 0.65,
            }),
        ]
    );
}

#[test]
fn test_blocks_outside_workout_are_ignored() {
    let zwo = r#"<workout_file>
    <SteadyState Duration="60" Power="0.5"/>
    <workout><SteadyState Duration="120" Power="0.6"/></workout>
</workout_file>"#;

    let workout = parse_zwo(zwo).unwrap();
    assert_eq!(workout.blocks.len(), 1);
    assert_eq!(workout.blocks[0].duration_seconds(), 120);
}

#[test]
fn test_escaped_text_in_name() {
    let workout =
        parse_zwo("<workout_file><name>Over &amp; Under</name><workout/></workout_file>").unwrap();
    assert_eq!(workout.name, "Over & Under");
}

#[test]
fn test_malformed_xml_is_rejected() {
    let result = parse_zwo("<workout_file><name>Broken</workout_file>");
    assert!(matches!(result, Err(WorkoutParseError::InvalidXml(_))));
}

#[test]
fn test_unclosed_root_is_rejected() {
    let result = parse_zwo("<workout_file><workout>");
    assert!(matches!(result, Err(WorkoutParseError::InvalidXml(_))));
}

#[test]
fn test_non_numeric_attribute_is_rejected() {
    let result = parse_zwo(
        r#"<workout_file><workout><SteadyState Duration="long" Power="0.7"/></workout></workout_file>"#,
    );
    match result {
        Err(WorkoutParseError::InvalidValue { field, value }) => {
            assert_eq!(field, "Duration");
            assert_eq!(value, "long");
        }
        other => panic!("Expected InvalidValue, got {:?}", other),
    }
}

#[test]
fn test_non_positive_power_is_rejected() {
    let result = parse_zwo(
        r#"<workout_file><workout><SteadyState Duration="60" Power="0"/></workout></workout_file>"#,
    );
    assert!(matches!(result, Err(WorkoutParseError::InvalidValue { .. })));
}

#[test]
fn test_parse_missing_file() {
    let result = parse_zwo_file(std::path::Path::new("/nonexistent/workout.zwo"));
    assert!(matches!(result, Err(WorkoutParseError::IoError(_))));
}

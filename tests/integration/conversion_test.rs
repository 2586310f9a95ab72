//! Integration tests for the single-document conversion flow.
//!
//! Covers ZWO text through expansion and encoding to FIT bytes, decoded again
//! with an independent FIT reader.

use chrono::{TimeZone, Utc};
use fitparser::profile::MesgNum;
use fitparser::Value;
use proptest::prelude::*;
use tempfile::tempdir;
use zwofit::conversion::types::{DurationMode, EncodingFault, StepRole, TargetMode};
use zwofit::conversion::{convert_file, convert_str, step_summary, ConversionError};
use zwofit::export::exporter_fit::export_workout_fit;
use zwofit::export::types::{DurationType, FitSport, Intensity, TargetType};
use zwofit::metrics::HeartRateZone;
use zwofit::storage::{ConversionConfig, PowerEncoding};

const TEMPO_RUN: &str = r#"<workout_file>
    <author>Coach</author>
    <name>Tempo Run</name>
    <description>Warmup then tempo</description>
    <sportType>run</sportType>
    <workout>
        <Warmup Duration="600" PowerLow="0.60" PowerHigh="0.70"/>
        <SteadyState Duration="1200" Power="0.85"/>
        <Cooldown Duration="300" PowerLow="0.65" PowerHigh="0.50"/>
    </workout>
</workout_file>"#;

const BIKE_INTERVALS: &str = r#"<workout_file>
    <name>Bike Intervals</name>
    <sportType>bike</sportType>
    <workout>
        <IntervalsT Repeat="3" OnDuration="300" OffDuration="120" OnPower="0.85" OffPower="0.65"/>
    </workout>
</workout_file>"#;

fn bike_power_config() -> ConversionConfig {
    ConversionConfig {
        reference_power: 240.0,
        use_cycling_power: true,
        power_buffer_fraction: 0.0,
        ..Default::default()
    }
}

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

#[test]
fn test_heart_rate_warmup_scenario() {
    let conversion = convert_str(TEMPO_RUN, &ConversionConfig::default()).unwrap();

    assert_eq!(conversion.document.name, "Tempo Run");
    assert_eq!(conversion.document.author.as_deref(), Some("Coach"));
    assert_eq!(conversion.workout.sport, FitSport::Running);

    let warmup = &conversion.steps()[0];
    assert_eq!(warmup.role, StepRole::Warmup);
    assert_eq!(warmup.duration, DurationMode::Timed(600));
    assert_eq!(
        warmup.target,
        TargetMode::HeartRateZone(HeartRateZone::new(2).unwrap())
    );

    let encoded = &conversion.workout.steps[0];
    assert_eq!(encoded.intensity, Intensity::Warmup);
    assert_eq!(encoded.duration_type, DurationType::Time);
    assert_eq!(encoded.duration_value, Some(600_000));
    assert_eq!(encoded.target_type, TargetType::HeartRate);
    assert_eq!(encoded.target_value, 2);
    assert_eq!(encoded.custom_target_low, None);
}

#[test]
fn test_bike_intervals_power_scenario() {
    let conversion = convert_str(BIKE_INTERVALS, &bike_power_config()).unwrap();
    let workout = &conversion.workout;

    assert_eq!(workout.sport, FitSport::Cycling);
    assert_eq!(workout.num_valid_steps, 5);

    let targets: Vec<u32> = workout.steps.iter().map(|s| s.target_value).collect();
    assert_eq!(targets, vec![1204, 1156, 1204, 1156, 1204]);

    let intensities: Vec<Intensity> = workout.steps.iter().map(|s| s.intensity).collect();
    assert_eq!(
        intensities,
        vec![
            Intensity::Active,
            Intensity::Rest,
            Intensity::Active,
            Intensity::Rest,
            Intensity::Active,
        ]
    );
    assert_eq!(workout.steps[4].name, "Interval 3 - Work");
}

#[test]
fn test_threshold_relative_intervals() {
    let config = ConversionConfig {
        power_encoding: PowerEncoding::ThresholdRelative,
        ..bike_power_config()
    };
    let conversion = convert_str(BIKE_INTERVALS, &config).unwrap();

    // 204 W / 240 W = 85.0%, 156 W / 240 W = 65.0%
    assert_eq!(conversion.workout.steps[0].target_value, 850);
    assert_eq!(conversion.workout.steps[1].target_value, 650);
}

#[test]
fn test_open_ended_warmup_and_cooldown() {
    let config = ConversionConfig {
        warmup_open_ended: true,
        cooldown_open_ended: true,
        ..Default::default()
    };
    let conversion = convert_str(TEMPO_RUN, &config).unwrap();
    let steps = &conversion.workout.steps;

    assert_eq!(steps[0].name, "Warm up (Press LAP when ready)");
    assert_eq!(steps[0].duration_type, DurationType::Open);
    assert_eq!(steps[0].duration_value, None);
    assert_eq!(steps[2].name, "Cool down (Press LAP when done)");
    assert_eq!(steps[2].duration_type, DurationType::Open);
    assert_eq!(steps[1].duration_value, Some(1_200_000));
}

#[test]
fn test_forced_warmup_is_recorded() {
    let config = ConversionConfig {
        forced_warmup_fraction: Some(0.5),
        ..Default::default()
    };
    let conversion = convert_str(TEMPO_RUN, &config).unwrap();

    assert_eq!(conversion.expansion.events.len(), 1);
    assert_eq!(
        conversion.steps()[0].target,
        TargetMode::HeartRateZone(HeartRateZone::new(1).unwrap())
    );
}

#[test]
fn test_step_summaries() {
    let conversion = convert_str(TEMPO_RUN, &ConversionConfig::default()).unwrap();
    let lines: Vec<String> = conversion
        .steps()
        .iter()
        .enumerate()
        .map(|(i, step)| step_summary(i, step))
        .collect();

    assert_eq!(lines[0], "Step 1: Warm up - 600s - HR Zone 2");
    assert_eq!(lines[1], "Step 2: Steady State - 1200s - HR Zone 4");
}

#[test]
fn test_parse_failure_is_reported() {
    let err = convert_str("<workout_file><name>", &ConversionConfig::default()).unwrap_err();
    assert!(matches!(err, ConversionError::Parse(_)));
}

#[test]
fn test_huge_repeat_is_rejected_before_expansion() {
    let source = r#"<workout_file><sportType>bike</sportType><workout>
        <Warmup Duration="300"/>
        <IntervalsT Repeat="4000000000" OnDuration="30" OffDuration="30"/>
    </workout></workout_file>"#;

    let err = convert_str(source, &bike_power_config()).unwrap_err();
    match err {
        ConversionError::Encoding(err) => {
            assert_eq!(
                err.fault,
                EncodingFault::TooManySteps {
                    count: 8_000_000_000usize
                }
            );
            assert_eq!(err.step_index, u16::MAX as usize);
        }
        other => panic!("Expected an encoding error, got {:?}", other),
    }
}

#[test]
fn test_largest_addressable_repeat_converts() {
    // 32768 repeats expand into 65535 steps, the last valid message index
    let source = r#"<workout_file><workout>
        <IntervalsT Repeat="32768" OnDuration="30" OffDuration="30"/>
    </workout></workout_file>"#;

    let conversion = convert_str(source, &ConversionConfig::default()).unwrap();
    assert_eq!(conversion.workout.num_valid_steps, u16::MAX);
}

#[test]
fn test_convert_file_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tempo.zwo");
    std::fs::write(&path, TEMPO_RUN).unwrap();

    let conversion = convert_file(&path, &ConversionConfig::default()).unwrap();
    assert_eq!(conversion.workout.num_valid_steps, 3);
    assert_eq!(conversion.document.total_duration_seconds(), 2100);
}

#[test]
fn test_fit_output_is_deterministic() {
    let first = convert_str(BIKE_INTERVALS, &bike_power_config()).unwrap();
    let second = convert_str(BIKE_INTERVALS, &bike_power_config()).unwrap();

    assert_eq!(first.workout, second.workout);
    assert_eq!(
        export_workout_fit(&first.workout, fixed_time()).unwrap(),
        export_workout_fit(&second.workout, fixed_time()).unwrap()
    );
}

#[test]
fn test_fit_output_decodes() {
    let conversion = convert_str(BIKE_INTERVALS, &bike_power_config()).unwrap();
    let bytes = export_workout_fit(&conversion.workout, fixed_time()).unwrap();

    let records = fitparser::from_bytes(&bytes).unwrap();
    let count = |kind: MesgNum| records.iter().filter(|r| r.kind() == kind).count();

    assert_eq!(count(MesgNum::FileId), 1);
    assert_eq!(count(MesgNum::Workout), 1);
    assert_eq!(count(MesgNum::WorkoutStep), 5);

    let workout = records
        .iter()
        .find(|r| r.kind() == MesgNum::Workout)
        .unwrap();
    let num_valid_steps = workout
        .fields()
        .iter()
        .find(|f| f.name() == "num_valid_steps")
        .unwrap();
    assert!(matches!(num_valid_steps.value(), Value::UInt16(5)));
}

#[test]
fn test_empty_workout_decodes() {
    let conversion = convert_str(
        "<workout_file><name>Nothing</name><workout/></workout_file>",
        &ConversionConfig::default(),
    )
    .unwrap();
    let bytes = export_workout_fit(&conversion.workout, fixed_time()).unwrap();

    let records = fitparser::from_bytes(&bytes).unwrap();
    assert_eq!(
        records
            .iter()
            .filter(|r| r.kind() == MesgNum::WorkoutStep)
            .count(),
        0
    );
    assert_eq!(
        records
            .iter()
            .filter(|r| r.kind() == MesgNum::Workout)
            .count(),
        1
    );
}

proptest! {
    #[test]
    fn prop_repeat_count_sets_step_count(repeat in 1u32..30) {
        let source = format!(
            r#"<workout_file><sportType>bike</sportType><workout>
                <IntervalsT Repeat="{}" OnDuration="60" OffDuration="30" OnPower="1.1" OffPower="0.5"/>
            </workout></workout_file>"#,
            repeat
        );
        let conversion = convert_str(&source, &bike_power_config()).unwrap();
        let steps = &conversion.workout.steps;

        prop_assert_eq!(steps.len() as u32, 2 * repeat - 1);
        prop_assert_eq!(conversion.workout.num_valid_steps as usize, steps.len());
        for (i, step) in steps.iter().enumerate() {
            prop_assert_eq!(step.message_index as usize, i);
            let expected = if i % 2 == 0 { Intensity::Active } else { Intensity::Rest };
            prop_assert_eq!(step.intensity, expected);
        }
    }
}

//! Zwift workout (.zwo) file parser.
//!
//! ZWO files are XML documents with a root element (usually `workout_file`)
//! holding metadata elements and a `workout` container of interval blocks.
//! Only `Warmup`, `Cooldown`, `SteadyState` and `IntervalsT` blocks are
//! understood; other block tags are skipped so newer files still load.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::workouts::types::{
    IntervalBlock, RampBlock, RepeatBlock, Sport, SteadyBlock, WorkoutDocument,
    WorkoutParseError,
};

const DEFAULT_NAME: &str = "Unnamed Workout";
const DEFAULT_SPORT_TYPE: &str = "other";

/// Root-level elements whose text we keep.
#[derive(Debug, Clone, Copy)]
enum MetaField {
    Name,
    Description,
    Author,
    SportType,
}

/// Parse a ZWO workout from XML content.
pub fn parse_zwo(content: &str) -> Result<WorkoutDocument, WorkoutParseError> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut author: Option<String> = None;
    let mut sport_type: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut blocks: Vec<IntervalBlock> = Vec::new();

    // Depth of the innermost open element; the root sits at depth 1.
    let mut depth: usize = 0;
    let mut seen_root = false;
    let mut in_workout = false;
    let mut meta_field: Option<MetaField> = None;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                seen_root = true;
                let tag = e.local_name();

                if depth == 2 {
                    match tag.as_ref() {
                        b"name" => meta_field = Some(MetaField::Name),
                        b"description" => meta_field = Some(MetaField::Description),
                        b"author" => meta_field = Some(MetaField::Author),
                        b"sportType" => meta_field = Some(MetaField::SportType),
                        b"workout" => in_workout = true,
                        _ => {}
                    }
                    text.clear();
                } else if in_workout && depth == 3 {
                    // Blocks may carry children such as <textevent>; those
                    // sit deeper and are ignored.
                    if let Some(block) = parse_block(tag.as_ref(), e)? {
                        blocks.push(block);
                    }
                } else if !in_workout && tag.as_ref() == b"tag" {
                    collect_tag(e, &mut tags)?;
                }
            }
            Ok(Event::Empty(ref e)) => {
                let tag = e.local_name();
                if depth == 0 {
                    // Self-closing root: a document with nothing in it.
                    seen_root = true;
                } else if in_workout && depth == 2 {
                    if let Some(block) = parse_block(tag.as_ref(), e)? {
                        blocks.push(block);
                    }
                } else if !in_workout && tag.as_ref() == b"tag" {
                    collect_tag(e, &mut tags)?;
                }
            }
            Ok(Event::Text(e)) => {
                if meta_field.is_some() {
                    let value = e.unescape().map_err(|e| {
                        WorkoutParseError::InvalidXml(format!("Failed to unescape text: {}", e))
                    })?;
                    text.push_str(&value);
                }
            }
            Ok(Event::CData(e)) => {
                if meta_field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    if let Some(field) = meta_field.take() {
                        let value = std::mem::take(&mut text);
                        match field {
                            MetaField::Name => name = Some(value),
                            MetaField::Description => description = Some(value),
                            MetaField::Author => author = Some(value),
                            MetaField::SportType => sport_type = Some(value),
                        }
                    }
                    in_workout = false;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(WorkoutParseError::InvalidXml(format!(
                    "XML parsing error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(WorkoutParseError::InvalidXml(
            "Document has no root element".to_string(),
        ));
    }
    if depth != 0 {
        return Err(WorkoutParseError::InvalidXml(format!(
            "Unexpected end of document with {} unclosed element(s)",
            depth
        )));
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());
    let sport_type = sport_type
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SPORT_TYPE.to_string());

    tracing::debug!(
        name = %name,
        sport = %sport_type,
        blocks = blocks.len(),
        "Parsed ZWO workout"
    );

    Ok(WorkoutDocument {
        name,
        description: description.unwrap_or_default(),
        author: author.filter(|a| !a.is_empty()),
        sport: Sport::from_sport_type(&sport_type),
        tags,
        blocks,
    })
}

/// Parse a single interval block. Returns `None` for tags we don't handle.
fn parse_block(
    element_name: &[u8],
    event: &BytesStart<'_>,
) -> Result<Option<IntervalBlock>, WorkoutParseError> {
    let block = match element_name {
        b"Warmup" => {
            let attrs = read_attributes(event)?;
            IntervalBlock::Warmup(RampBlock {
                duration_seconds: seconds_attr(&attrs, "Duration", 600)?,
                power_low: power_attr(&attrs, "PowerLow", 0.60)?,
                power_high: power_attr(&attrs, "PowerHigh", 0.70)?,
            })
        }
        b"Cooldown" => {
            let attrs = read_attributes(event)?;
            IntervalBlock::Cooldown(RampBlock {
                duration_seconds: seconds_attr(&attrs, "Duration", 600)?,
                power_low: power_attr(&attrs, "PowerLow", 0.60)?,
                power_high: power_attr(&attrs, "PowerHigh", 0.65)?,
            })
        }
        b"SteadyState" => {
            let attrs = read_attributes(event)?;
            IntervalBlock::SteadyState(SteadyBlock {
                duration_seconds: seconds_attr(&attrs, "Duration", 1200)?,
                power: power_attr(&attrs, "Power", 0.75)?,
            })
        }
        b"IntervalsT" => {
            let attrs = read_attributes(event)?;
            IntervalBlock::Repeat(RepeatBlock {
                repeat: repeat_attr(&attrs, "Repeat", 1)?,
                on_duration_seconds: seconds_attr(&attrs, "OnDuration", 300)?,
                off_duration_seconds: seconds_attr(&attrs, "OffDuration", 120)?,
                on_power: power_attr(&attrs, "OnPower", 0.85)?,
                off_power: power_attr(&attrs, "OffPower", 0.65)?,
            })
        }
        other => {
            tracing::debug!(
                tag = %String::from_utf8_lossy(other),
                "Skipping unsupported workout block"
            );
            return Ok(None);
        }
    };

    Ok(Some(block))
}

fn collect_tag(event: &BytesStart<'_>, tags: &mut Vec<String>) -> Result<(), WorkoutParseError> {
    if let Some(tag) = read_attributes(event)?.remove("name") {
        tags.push(tag);
    }
    Ok(())
}

fn read_attributes(event: &BytesStart<'_>) -> Result<HashMap<String, String>, WorkoutParseError> {
    let mut attrs = HashMap::new();
    for attr in event.attributes() {
        let attr = attr
            .map_err(|e| WorkoutParseError::InvalidXml(format!("Malformed attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| WorkoutParseError::InvalidXml(format!("Failed to unescape value: {}", e)))?;
        attrs.insert(key, value.to_string());
    }
    Ok(attrs)
}

fn invalid_value(field: &str, value: &str) -> WorkoutParseError {
    WorkoutParseError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Duration in whole seconds. Decimal values are rounded.
fn seconds_attr(
    attrs: &HashMap<String, String>,
    field: &str,
    default: u32,
) -> Result<u32, WorkoutParseError> {
    let Some(raw) = attrs.get(field) else {
        return Ok(default);
    };
    let value: f64 = raw.trim().parse().map_err(|_| invalid_value(field, raw))?;
    if !value.is_finite() || value < 0.0 || value.round() > u32::MAX as f64 {
        return Err(invalid_value(field, raw));
    }
    Ok(value.round() as u32)
}

/// Power as a fraction of threshold; must be positive.
fn power_attr(
    attrs: &HashMap<String, String>,
    field: &str,
    default: f64,
) -> Result<f64, WorkoutParseError> {
    let Some(raw) = attrs.get(field) else {
        return Ok(default);
    };
    let value: f64 = raw.trim().parse().map_err(|_| invalid_value(field, raw))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid_value(field, raw));
    }
    Ok(value)
}

fn repeat_attr(
    attrs: &HashMap<String, String>,
    field: &str,
    default: u32,
) -> Result<u32, WorkoutParseError> {
    let Some(raw) = attrs.get(field) else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(invalid_value(field, raw)),
        Ok(n) => Ok(n),
    }
}

/// Parse a ZWO file from disk.
pub fn parse_zwo_file(path: &std::path::Path) -> Result<WorkoutDocument, WorkoutParseError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| WorkoutParseError::IoError(format!("{}: {}", path.display(), e)))?;

    parse_zwo(&content)
}

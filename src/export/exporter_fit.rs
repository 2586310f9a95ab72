//! FIT workout file export.
//!
//! Writes the FIT (Flexible and Interoperable Data Transfer) binary format for
//! structured workouts, as read by Garmin devices:
//! - File header and CRC
//! - File ID and file creator messages
//! - One workout message followed by its workout step messages

use std::io::{Cursor, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::export::types::{EncodedStep, EncodedWorkout, ExportError};

/// FIT epoch offset: FIT timestamps are seconds since 1989-12-31 00:00:00 UTC
const FIT_EPOCH_OFFSET: i64 = 631065600;

/// FIT file header size (14 bytes for header + protocol version)
const FIT_HEADER_SIZE: u8 = 14;

/// FIT protocol version
const FIT_PROTOCOL_VERSION: u8 = 0x20; // 2.0

/// FIT profile version (21.00)
const FIT_PROFILE_VERSION: u16 = 2100;

/// Fixed size of string fields, including the terminating NUL
const STRING_FIELD_SIZE: u8 = 50;

/// Serial number written to the file ID message
const SERIAL_NUMBER: u32 = 0x12345678;

/// Workout capability flag: TCX-compatible
const CAPABILITY_TCX: u32 = 32;

/// FIT message types
mod message_type {
    pub const FILE_ID: u16 = 0;
    pub const WORKOUT: u16 = 26;
    pub const WORKOUT_STEP: u16 = 27;
    pub const FILE_CREATOR: u16 = 49;
}

/// FIT base types
mod base_type {
    pub const ENUM: u8 = 0x00;
    pub const UINT8: u8 = 0x02;
    pub const STRING: u8 = 0x07;
    pub const UINT16: u8 = 0x84;
    pub const UINT32: u8 = 0x86;
    pub const UINT32Z: u8 = 0x8C;
}

/// Invalid-value markers for absent fields
const INVALID_UINT32: u32 = 0xFFFF_FFFF;

/// FIT `file` type for workouts
const FILE_TYPE_WORKOUT: u8 = 5;

/// FIT manufacturer: Garmin
const MANUFACTURER_GARMIN: u16 = 1;

/// FIT file writer
struct FitWriter {
    buffer: Cursor<Vec<u8>>,
    data_size: u32,
}

impl FitWriter {
    fn new() -> Self {
        Self {
            buffer: Cursor::new(Vec::new()),
            data_size: 0,
        }
    }

    /// Write the FIT file header
    fn write_header(&mut self) -> Result<(), ExportError> {
        self.buffer.write_all(&[FIT_HEADER_SIZE])?;
        self.buffer.write_all(&[FIT_PROTOCOL_VERSION])?;
        self.buffer.write_all(&FIT_PROFILE_VERSION.to_le_bytes())?;

        // Data size and header CRC are filled in by finalize
        self.buffer.write_all(&0u32.to_le_bytes())?;

        // Data type signature ".FIT"
        self.buffer.write_all(b".FIT")?;

        self.buffer.write_all(&0u16.to_le_bytes())?;

        Ok(())
    }

    /// Write a definition message
    fn write_definition(
        &mut self,
        local_mesg_num: u8,
        global_mesg_num: u16,
        fields: &[(u8, u8, u8)], // (field_def_num, size, base_type)
    ) -> Result<(), ExportError> {
        // Record header: definition message (bit 6 set), local message num in bits 0-3
        let header = 0x40 | (local_mesg_num & 0x0F);
        self.write_byte(header)?;

        // Reserved byte
        self.write_byte(0)?;

        // Architecture: 0 = little endian
        self.write_byte(0)?;

        self.write_u16(global_mesg_num)?;
        self.write_byte(fields.len() as u8)?;

        for (field_num, size, base_type) in fields {
            self.write_byte(*field_num)?;
            self.write_byte(*size)?;
            self.write_byte(*base_type)?;
        }

        Ok(())
    }

    /// Write a data message header
    fn write_data_header(&mut self, local_mesg_num: u8) -> Result<(), ExportError> {
        self.write_byte(local_mesg_num & 0x0F)
    }

    fn write_byte(&mut self, value: u8) -> Result<(), ExportError> {
        self.write_bytes(&[value])
    }

    fn write_u16(&mut self, value: u16) -> Result<(), ExportError> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_u32(&mut self, value: u32) -> Result<(), ExportError> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ExportError> {
        self.buffer.write_all(bytes)?;
        self.data_size += bytes.len() as u32;
        Ok(())
    }

    /// Write a NUL-padded string field of `size` bytes, truncating on a
    /// character boundary when needed.
    fn write_string(&mut self, value: &str, size: u8) -> Result<(), ExportError> {
        let max_len = size as usize - 1;
        let mut end = value.len().min(max_len);
        while !value.is_char_boundary(end) {
            end -= 1;
        }

        let mut field = vec![0u8; size as usize];
        field[..end].copy_from_slice(&value.as_bytes()[..end]);
        self.write_bytes(&field)
    }

    /// Convert DateTime to FIT timestamp
    fn datetime_to_fit_timestamp(dt: DateTime<Utc>) -> u32 {
        (dt.timestamp() - FIT_EPOCH_OFFSET).clamp(0, u32::MAX as i64) as u32
    }

    /// Finalize the file (update data size and append CRC)
    fn finalize(self) -> Vec<u8> {
        let data_size = self.data_size;
        let mut data = self.buffer.into_inner();

        data[4..8].copy_from_slice(&data_size.to_le_bytes());
        let header_crc = calculate_crc(&data[0..12]);
        data[12..14].copy_from_slice(&header_crc.to_le_bytes());

        let file_crc = calculate_crc(&data[..]);
        data.extend_from_slice(&file_crc.to_le_bytes());

        data
    }
}

/// Calculate CRC-16 for FIT file
fn calculate_crc(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    let crc_table: [u16; 16] = [
        0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
        0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
    ];

    for byte in data {
        let tmp = crc_table[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc = crc ^ tmp ^ crc_table[(*byte & 0xF) as usize];

        let tmp = crc_table[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc = crc ^ tmp ^ crc_table[((*byte >> 4) & 0xF) as usize];
    }

    crc
}

/// Serialize an encoded workout into FIT bytes.
///
/// `created_at` goes into the file ID; pass a fixed value for reproducible
/// output.
pub fn export_workout_fit(
    workout: &EncodedWorkout,
    created_at: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = FitWriter::new();

    writer.write_header()?;
    write_file_id(&mut writer, created_at)?;
    write_file_creator(&mut writer)?;
    write_workout(&mut writer, workout)?;
    write_steps(&mut writer, &workout.steps)?;

    Ok(writer.finalize())
}

/// Write File ID message
fn write_file_id(writer: &mut FitWriter, created_at: DateTime<Utc>) -> Result<(), ExportError> {
    let fields = [
        (0, 1, base_type::ENUM),    // type
        (1, 2, base_type::UINT16),  // manufacturer
        (2, 2, base_type::UINT16),  // product
        (3, 4, base_type::UINT32Z), // serial_number
        (4, 4, base_type::UINT32),  // time_created
    ];
    writer.write_definition(0, message_type::FILE_ID, &fields)?;

    writer.write_data_header(0)?;
    writer.write_byte(FILE_TYPE_WORKOUT)?;
    writer.write_u16(MANUFACTURER_GARMIN)?;
    writer.write_u16(0)?;
    writer.write_u32(SERIAL_NUMBER)?;
    writer.write_u32(FitWriter::datetime_to_fit_timestamp(created_at))?;

    Ok(())
}

/// Write File Creator message
fn write_file_creator(writer: &mut FitWriter) -> Result<(), ExportError> {
    let fields = [
        (0, 2, base_type::UINT16), // software_version
        (1, 1, base_type::UINT8),  // hardware_version
    ];
    writer.write_definition(1, message_type::FILE_CREATOR, &fields)?;

    writer.write_data_header(1)?;
    writer.write_u16(100)?; // software_version = 1.00
    writer.write_byte(0)?;

    Ok(())
}

/// Write Workout message
fn write_workout(writer: &mut FitWriter, workout: &EncodedWorkout) -> Result<(), ExportError> {
    let fields = [
        (4, 1, base_type::ENUM),                   // sport
        (5, 4, base_type::UINT32Z),                // capabilities
        (6, 2, base_type::UINT16),                 // num_valid_steps
        (8, STRING_FIELD_SIZE, base_type::STRING), // wkt_name
        (11, 1, base_type::ENUM),                  // sub_sport
    ];
    writer.write_definition(2, message_type::WORKOUT, &fields)?;

    writer.write_data_header(2)?;
    writer.write_byte(workout.sport as u8)?;
    writer.write_u32(CAPABILITY_TCX)?;
    writer.write_u16(workout.num_valid_steps)?;
    writer.write_string(&workout.name, STRING_FIELD_SIZE)?;
    writer.write_byte(0)?; // sub_sport = generic

    Ok(())
}

/// Write Workout Step messages in emission order
fn write_steps(writer: &mut FitWriter, steps: &[EncodedStep]) -> Result<(), ExportError> {
    let fields = [
        (254, 2, base_type::UINT16),               // message_index
        (0, STRING_FIELD_SIZE, base_type::STRING), // wkt_step_name
        (1, 1, base_type::ENUM),                   // duration_type
        (2, 4, base_type::UINT32),                 // duration_value
        (3, 1, base_type::ENUM),                   // target_type
        (4, 4, base_type::UINT32),                 // target_value
        (5, 4, base_type::UINT32),                 // custom_target_value_low
        (6, 4, base_type::UINT32),                 // custom_target_value_high
        (7, 1, base_type::ENUM),                   // intensity
    ];
    writer.write_definition(3, message_type::WORKOUT_STEP, &fields)?;

    for step in steps {
        writer.write_data_header(3)?;
        writer.write_u16(step.message_index)?;
        writer.write_string(&step.name, STRING_FIELD_SIZE)?;
        writer.write_byte(step.duration_type as u8)?;
        writer.write_u32(step.duration_value.unwrap_or(INVALID_UINT32))?;
        writer.write_byte(step.target_type as u8)?;
        writer.write_u32(step.target_value)?;
        writer.write_u32(step.custom_target_low.unwrap_or(INVALID_UINT32))?;
        writer.write_u32(step.custom_target_high.unwrap_or(INVALID_UINT32))?;
        writer.write_byte(step.intensity as u8)?;
    }

    Ok(())
}

/// Write FIT bytes to `path`. Existing files are only replaced when
/// `overwrite` is set.
pub fn write_fit_file(content: &[u8], path: &Path, overwrite: bool) -> Result<(), ExportError> {
    if !overwrite && path.exists() {
        return Err(ExportError::FileExists(path.display().to_string()));
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Export a workout to FIT and write it to a file.
pub fn export_workout_fit_to_file(
    workout: &EncodedWorkout,
    created_at: DateTime<Utc>,
    path: &Path,
    overwrite: bool,
) -> Result<(), ExportError> {
    let content = export_workout_fit(workout, created_at)?;
    write_fit_file(&content, path, overwrite)
}

/// Reduce a workout name to a filesystem-safe stem.
///
/// Keeps alphanumerics, spaces, `-` and `_`, trims trailing whitespace and
/// turns spaces into underscores.
pub fn sanitize_workout_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().replace(' ', "_")
}

/// Output file name for a workout, falling back to `fallback_stem` when the
/// sanitized name is empty.
pub fn generate_fit_filename(workout_name: &str, fallback_stem: &str) -> String {
    let stem = sanitize_workout_name(workout_name);
    let stem = if stem.is_empty() {
        sanitize_workout_name(fallback_stem)
    } else {
        stem
    };
    let stem = if stem.is_empty() {
        "workout".to_string()
    } else {
        stem
    };
    format!("{}.fit", stem)
}

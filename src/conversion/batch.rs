//! Folder conversion.
//!
//! Documents are converted to FIT bytes in parallel with rayon; files are then
//! named and written one at a time so name collisions resolve the same way on
//! every run. A failing document never stops the batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::conversion::pipeline::convert_file;
use crate::conversion::types::ConversionError;
use crate::export::exporter_fit::{export_workout_fit, generate_fit_filename, write_fit_file};
use crate::storage::config::ConversionConfig;

/// Extension of source files picked up by [`find_zwo_files`].
pub const ZWO_EXTENSION: &str = "zwo";

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Worker threads (rayon default when `None`)
    pub jobs: Option<usize>,
    /// Replace existing output files
    pub overwrite: bool,
    /// Creation time stamped into every file
    pub created_at: DateTime<Utc>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: None,
            overwrite: true,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Source files found
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// (source, written file) pairs, in source order
    pub outputs: Vec<(PathBuf, PathBuf)>,
    /// (source, error message) pairs, in source order
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn is_fully_successful(&self) -> bool {
        self.failed == 0
    }

    /// Get human-readable summary
    pub fn to_string_pretty(&self, output_dir: &Path) -> String {
        format!(
            "Conversion Summary\n  \
             Total files processed: {}\n  \
             Successful conversions: {}\n  \
             Failed conversions: {}\n  \
             Output directory: {}",
            self.total,
            self.succeeded,
            self.failed,
            output_dir.display()
        )
    }
}

/// List `.zwo` files directly inside `dir`, sorted by path.
pub fn find_zwo_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_zwo = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(ZWO_EXTENSION))
            .unwrap_or(false);
        if is_zwo && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// A converted document waiting to be written.
struct Rendered {
    workout_name: String,
    bytes: Vec<u8>,
}

/// Convert every `.zwo` file in `input_dir` into `output_dir`.
///
/// Errors are returned only for problems affecting the whole batch (bad
/// configuration, unreadable input directory, output directory that cannot
/// be created).
pub fn convert_folder(
    input_dir: &Path,
    output_dir: &Path,
    config: &ConversionConfig,
    options: &BatchOptions,
) -> Result<BatchSummary, ConversionError> {
    config.validate()?;

    std::fs::create_dir_all(output_dir)?;
    let files = find_zwo_files(input_dir)?;

    if files.is_empty() {
        info!(dir = %input_dir.display(), "No .zwo files found");
        return Ok(BatchSummary::default());
    }
    info!(count = files.len(), "Found ZWO files to convert");

    let render = |path: &PathBuf| -> Result<Rendered, ConversionError> {
        let conversion = convert_file(path, config)?;
        let bytes = export_workout_fit(&conversion.workout, options.created_at)?;
        Ok(Rendered {
            workout_name: conversion.document.name,
            bytes,
        })
    };

    let rendered: Vec<Result<Rendered, ConversionError>> = match options.jobs {
        Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| files.par_iter().map(render).collect()),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using the global pool");
                files.par_iter().map(render).collect()
            }
        },
        None => files.par_iter().map(render).collect(),
    };

    let mut summary = BatchSummary {
        total: files.len(),
        ..Default::default()
    };
    let mut used_names: HashSet<String> = HashSet::new();

    for (source, result) in files.iter().zip(rendered) {
        let written = result.and_then(|rendered| {
            let fallback = source
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();
            let file_name = unique_file_name(
                &generate_fit_filename(&rendered.workout_name, &fallback),
                &mut used_names,
            );
            let target = output_dir.join(file_name);
            write_fit_file(&rendered.bytes, &target, options.overwrite)?;
            Ok(target)
        });

        match written {
            Ok(target) => {
                info!(
                    source = %source.display(),
                    output = %target.display(),
                    "FIT file created"
                );
                summary.succeeded += 1;
                summary.outputs.push((source.clone(), target));
            }
            Err(e) => {
                warn!(source = %source.display(), error = %e, "Failed to convert");
                summary.failed += 1;
                summary.failures.push((source.clone(), e.to_string()));
            }
        }
    }

    Ok(summary)
}

/// Append `_2`, `_3`, ... to the stem until the name is unused in this batch.
fn unique_file_name(file_name: &str, used: &mut HashSet<String>) -> String {
    let (stem, ext) = file_name.rsplit_once('.').unwrap_or((file_name, ""));
    let mut candidate = file_name.to_string();
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        candidate = if ext.is_empty() {
            format!("{}_{}", stem, n)
        } else {
            format!("{}_{}.{}", stem, n, ext)
        };
        n += 1;
    }
    candidate
}

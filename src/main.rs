//! zwofit - Zwift workout to FIT converter
//!
//! Command-line entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use zwofit::conversion::{convert_file, convert_folder, step_summary, BatchOptions, Conversion};
use zwofit::export::{export_workout_fit_to_file, generate_fit_filename};
use zwofit::metrics::ZoneStrategy;
use zwofit::storage::config::{get_config_path, load_config, load_config_or_default, save_config};
use zwofit::storage::{ConversionConfig, PowerEncoding};

/// Convert Zwift .zwo interval workouts into Garmin FIT workout files.
#[derive(Parser)]
#[command(name = "zwofit")]
#[command(version)]
#[command(about = "Convert Zwift .zwo workouts to Garmin FIT workouts", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single .zwo file
    Convert {
        /// Input .zwo file
        file: PathBuf,

        /// Output directory (defaults to the configured one)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConversionArgs,
    },

    /// Convert every .zwo file in a folder
    Batch {
        /// Folder containing .zwo files
        input: PathBuf,

        /// Folder where .fit files are written
        output: PathBuf,

        /// Number of worker threads
        #[arg(short, long)]
        jobs: Option<usize>,

        #[command(flatten)]
        overrides: ConversionArgs,
    },

    /// Print the expanded steps of a .zwo file without writing anything
    Show {
        /// Input .zwo file
        file: PathBuf,

        #[command(flatten)]
        overrides: ConversionArgs,
    },

    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,

        #[command(flatten)]
        overrides: ConversionArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EncodingArg {
    Absolute,
    ThresholdRelative,
}

#[derive(Clone, Copy, ValueEnum)]
enum ZoneStrategyArg {
    NearestTable,
    ThresholdBanded,
}

/// Conversion settings that override the config file.
#[derive(Args)]
struct ConversionArgs {
    /// Reference (FTP) power in watts
    #[arg(long, value_name = "WATTS")]
    ftp: Option<f64>,

    /// Use power targets for cycling workouts
    #[arg(long)]
    power: bool,

    /// Power tolerance as a fraction (0.05 = +/-5%)
    #[arg(long, value_name = "FRACTION")]
    buffer: Option<f64>,

    /// How power targets are encoded
    #[arg(long, value_enum)]
    encoding: Option<EncodingArg>,

    /// How power fractions map to heart-rate zones
    #[arg(long, value_enum)]
    zone_strategy: Option<ZoneStrategyArg>,

    /// Warmup ends on LAP press
    #[arg(long)]
    open_warmup: bool,

    /// Cooldown ends on LAP press
    #[arg(long)]
    open_cooldown: bool,

    /// Replace warmup power with this fraction of FTP
    #[arg(long, value_name = "FRACTION")]
    force_warmup: Option<f64>,
}

impl ConversionArgs {
    fn apply(&self, config: &mut ConversionConfig) {
        if let Some(ftp) = self.ftp {
            config.reference_power = ftp;
        }
        if self.power {
            config.use_cycling_power = true;
        }
        if let Some(buffer) = self.buffer {
            config.power_buffer_fraction = buffer;
        }
        if let Some(encoding) = self.encoding {
            config.power_encoding = match encoding {
                EncodingArg::Absolute => PowerEncoding::Absolute,
                EncodingArg::ThresholdRelative => PowerEncoding::ThresholdRelative,
            };
        }
        if let Some(strategy) = self.zone_strategy {
            config.zone_strategy = match strategy {
                ZoneStrategyArg::NearestTable => ZoneStrategy::NearestTable,
                ZoneStrategyArg::ThresholdBanded => ZoneStrategy::ThresholdBanded,
            };
        }
        if self.open_warmup {
            config.warmup_open_ended = true;
        }
        if self.open_cooldown {
            config.cooldown_open_ended = true;
        }
        if let Some(fraction) = self.force_warmup {
            config.forced_warmup_fraction = Some(fraction);
        }
    }
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_steps(conversion: &Conversion) {
    println!("Workout: {}", conversion.document.name);
    println!("Sport: {}", conversion.document.sport);
    println!("Total steps: {}", conversion.steps().len());
    for (index, step) in conversion.steps().iter().enumerate() {
        println!("  {}", step_summary(index, step));
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::debug!("Starting zwofit v{}", env!("CARGO_PKG_VERSION"));

    // `config --init` may name a file that does not exist yet
    let mut app_config = match (&cli.command, cli.config.as_deref()) {
        (Commands::Config { init: true, .. }, Some(path)) => load_config_or_default(path),
        _ => load_config(cli.config.as_deref()),
    }
    .context("Failed to load config")?;

    match cli.command {
        Commands::Convert {
            file,
            output,
            overrides,
        } => {
            overrides.apply(&mut app_config.conversion);
            app_config.conversion.validate()?;

            let conversion = convert_file(&file, &app_config.conversion)
                .with_context(|| format!("Error converting {}", file.display()))?;

            let output_dir = output.unwrap_or_else(|| app_config.output.directory.clone());
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            let path = output_dir.join(generate_fit_filename(
                &conversion.document.name,
                &file_stem(&file),
            ));

            export_workout_fit_to_file(
                &conversion.workout,
                Utc::now(),
                &path,
                app_config.output.overwrite,
            )?;

            println!("FIT file created: {}", path.display());
            print_steps(&conversion);
        }
        Commands::Batch {
            input,
            output,
            jobs,
            overrides,
        } => {
            overrides.apply(&mut app_config.conversion);
            app_config.conversion.validate()?;

            let options = BatchOptions {
                jobs,
                overwrite: app_config.output.overwrite,
                created_at: Utc::now(),
            };
            let summary = convert_folder(&input, &output, &app_config.conversion, &options)
                .with_context(|| format!("Batch conversion of {} failed", input.display()))?;

            if summary.total == 0 {
                println!("No .zwo files found in {}", input.display());
                return Ok(());
            }

            for (source, target) in &summary.outputs {
                println!("  {} -> {}", source.display(), target.display());
            }
            for (source, error) in &summary.failures {
                eprintln!("Failed to convert {}: {}", source.display(), error);
            }
            println!("{}", summary.to_string_pretty(&output));

            if !summary.is_fully_successful() {
                std::process::exit(1);
            }
        }
        Commands::Show { file, overrides } => {
            overrides.apply(&mut app_config.conversion);
            app_config.conversion.validate()?;

            let conversion = convert_file(&file, &app_config.conversion)
                .with_context(|| format!("Error converting {}", file.display()))?;
            print_steps(&conversion);
        }
        Commands::Config { init, overrides } => {
            overrides.apply(&mut app_config.conversion);
            app_config.conversion.validate()?;

            if init {
                let path = cli.config.clone().unwrap_or_else(get_config_path);
                save_config(&app_config, &path)?;
                println!("Config written to {}", path.display());
            } else {
                print!(
                    "{}",
                    toml::to_string_pretty(&app_config).context("Failed to render config")?
                );
            }
        }
    }

    Ok(())
}

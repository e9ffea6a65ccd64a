//! Roll/pitch from an exported IMU table.
//!
//! Usage:
//!   tiltcell <table.csv> [OPTIONS] [key=value ...]
//!
//! Options:
//!   --raw-offset          Counts still carry the +32768 firmware offset
//!   --filter              Band-limit channels before fusion
//!   --spectrum <COLUMN>   Print the magnitude spectrum of COLUMN instead
//!   -h, --help            Show this message
//!
//! `key=value` pairs override the estimator configuration (sampling_rate,
//! filter_type, filter_order, highpass_cutoff, lowpass_cutoff, fusion_weight).

mod config {
    pub mod sys_config;
}
mod logger;
mod table;

use config::sys_config::{
    ACCEL_COLUMNS, ACCEL_FULL_SCALE, GYRO_COLUMNS, GYRO_FULL_SCALE, INITIAL_ATTITUDE,
};
use std::io::{BufWriter, Write};
use std::{env, fs, process};
use table::Table;
use tiltcell::drivers::imu::lsm6dsm::{SensorScale, UnitConverter};
use tiltcell::filtering::filter_bank::DigitalFilterBank;
use tiltcell::pipeline::{self, Conditioning, RawChannels};
use tiltcell::{AttitudeError, AttitudeEstimatorConfig};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table has no header row")]
    EmptyTable,

    #[error("row {row} has {found} fields, header has {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("row {row}: `{text}` is not a number")]
    BadNumber { row: usize, text: String },

    #[error("column `{0}` not found")]
    MissingColumn(String),

    #[error("column `{column}` row {row} is not a whole sensor count")]
    NotACount { column: String, row: usize },

    #[error(transparent)]
    Attitude(#[from] AttitudeError),
}

struct Args {
    path: String,
    zero_corrected: bool,
    conditioning: Conditioning,
    spectrum_column: Option<String>,
    overrides: Vec<(String, String)>,
}

fn parse_args(raw: &[String]) -> Result<Args, CliError> {
    let mut path = None;
    let mut args = Args {
        path: String::new(),
        zero_corrected: true,
        conditioning: Conditioning::None,
        spectrum_column: None,
        overrides: Vec::new(),
    };

    let mut i = 0;
    while i < raw.len() {
        match raw[i].as_str() {
            "--raw-offset" => args.zero_corrected = false,
            "--filter" => args.conditioning = Conditioning::Filtered,
            "--spectrum" => {
                i += 1;
                let column = raw
                    .get(i)
                    .ok_or_else(|| CliError::Usage("--spectrum needs a column name".into()))?;
                args.spectrum_column = Some(column.clone());
            }
            "-h" | "--help" => return Err(CliError::Usage(usage())),
            other => match other.split_once('=') {
                Some((key, value)) => args.overrides.push((key.to_string(), value.to_string())),
                None if path.is_none() && !other.starts_with('-') => path = Some(other.to_string()),
                None => return Err(CliError::Usage(format!("unexpected argument `{}`", other))),
            },
        }
        i += 1;
    }

    args.path = path.ok_or_else(|| CliError::Usage(usage()))?;
    Ok(args)
}

fn usage() -> String {
    "usage: tiltcell <table.csv> [--raw-offset] [--filter] [--spectrum <COLUMN>] [key=value ...]"
        .to_string()
}

fn run(args: Args) -> Result<(), CliError> {
    let update = AttitudeEstimatorConfig::default().update(
        args.overrides
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    )?;
    // unknown options were already logged as warnings by `update`
    let config = update.config;
    eprintln!("{}", config);

    let table = Table::parse(&fs::read_to_string(&args.path)?)?;
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if let Some(column) = &args.spectrum_column {
        let signal = table.column(column)?;
        let spectrum = DigitalFilterBank::new().spectrum(signal, config.sampling_rate())?;
        if let Some((freq, mag)) = spectrum.peak() {
            log::info!("{} peaks at {} Hz (magnitude {})", column, freq, mag);
        }
        writeln!(out, "frequency_hz,magnitude")?;
        for (f, m) in spectrum.frequency.iter().zip(&spectrum.magnitude) {
            writeln!(out, "{},{}", f, m)?;
        }
        out.flush()?;
        return Ok(());
    }

    let ax = table.counts(ACCEL_COLUMNS[0])?;
    let ay = table.counts(ACCEL_COLUMNS[1])?;
    let az = table.counts(ACCEL_COLUMNS[2])?;
    let p = table.counts(GYRO_COLUMNS[0])?;
    let q = table.counts(GYRO_COLUMNS[1])?;
    let r = table.counts(GYRO_COLUMNS[2])?;
    let raw = RawChannels {
        accel: (&ax, &ay, &az),
        gyro: (&p, &q, &r),
    };

    let converter = UnitConverter::new(SensorScale::new(ACCEL_FULL_SCALE, GYRO_FULL_SCALE));
    let series = pipeline::estimate_attitude(
        &raw,
        &config,
        &converter,
        args.zero_corrected,
        args.conditioning,
        INITIAL_ATTITUDE,
    )?;
    log::info!("estimated {} samples from {}", series.len(), args.path);

    writeln!(out, "roll_deg,pitch_deg")?;
    for (roll, pitch) in &series {
        writeln!(out, "{},{}", roll, pitch)?;
    }
    out.flush()?;
    Ok(())
}

fn main() {
    logger::init();

    let raw: Vec<String> = env::args().skip(1).collect();
    let result = parse_args(&raw).and_then(run);
    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(match e {
            CliError::Usage(_) => 2,
            _ => 1,
        });
    }
}

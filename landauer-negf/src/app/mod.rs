// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! This module governs the command line application, which sweeps the transmission of a
//! strip device over the configured energy grid

mod calculations;
mod configuration;
mod error;
mod telemetry;

pub use calculations::{transmission_spectrum, write_spectrum, TransmissionPoint};
pub use configuration::Configuration;
pub use error::AppError;

use crate::{device::Device, transmission::TransportDirection};
use clap::{ArgEnum, Parser};
use std::{fmt, fs::File, io::BufWriter, path::PathBuf};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct App {
    /// The `.toml` device description
    file_path: PathBuf,
    #[clap(arg_enum, short, long, default_value = "info")]
    log_level: LogLevel,
    #[clap(arg_enum, short, long, default_value = "left-to-right")]
    direction: Direction,
    /// Write the spectrum to this file rather than to stdout
    #[clap(short, long)]
    output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ArgEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", level)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ArgEnum)]
enum Direction {
    LeftToRight,
    RightToLeft,
}

impl From<Direction> for TransportDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::LeftToRight => TransportDirection::LeftToRight,
            Direction::RightToLeft => TransportDirection::RightToLeft,
        }
    }
}

/// Entry point of the binary
pub fn run() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = App::parse();

    let (subscriber, _guard) = telemetry::get_subscriber(cli.log_level);
    telemetry::init_subscriber(subscriber)?;

    let config = Configuration::build()?;
    tracing::debug!("Running with {:?}", config);
    let device = Device::build(&cli.file_path)?;

    let spectrum = transmission_spectrum(&config, &device, cli.direction.into())?;

    match cli.output {
        Some(path) => {
            let file = File::create(&path).map_err(AppError::from)?;
            write_spectrum(BufWriter::new(file), &spectrum)?;
            tracing::info!("Spectrum written to {}", path.display());
        }
        None => write_spectrum(std::io::stdout().lock(), &spectrum)?,
    }
    Ok(())
}

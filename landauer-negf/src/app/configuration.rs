// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::AppError;
use crate::{
    batch::SolverSettings, self_energy::ChainSettings, spectral::SpectralSettings,
    transmission::TransportSettings, utilities::InversionSettings,
};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize)]
/// Numerical settings for a run, layered from `.config/default.toml` and an optional
/// `.config/{RUN_MODE}.toml`
pub struct Configuration {
    /// Inversion settings for every Green's function
    #[serde(default)]
    pub greens: InversionSettings,
    /// Decimation budget for the leads
    #[serde(default)]
    pub chain: ChainSettings,
    /// Transport policy
    #[serde(default)]
    pub transport: TransportSettings,
    /// The energy grid
    pub spectral: SpectralSettings,
}

impl Configuration {
    /// Reads the layered configuration from the directory named by `CONFIG_DIR`, or from
    /// `.config` in the working directory
    pub fn build() -> Result<Self, AppError> {
        let directory = env::var("CONFIG_DIR").unwrap_or_else(|_| ".config".into());
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // The default settings for the simulation which we use in the general case
            .add_source(File::with_name(&format!("{}/default", directory)))
            // The override settings which may be set by the user, optional
            .add_source(File::with_name(&format!("{}/{}", directory, run_mode)).required(false))
            .build()?;

        Ok(s.try_deserialize()?)
    }

    /// Parses a configuration from an in-memory `toml` string
    pub fn from_toml(contents: &str) -> Result<Self, AppError> {
        let s = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;
        Ok(s.try_deserialize()?)
    }

    /// The settings handed to each solver
    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            inversion: self.greens,
            chain: self.chain,
            transport: self.transport,
        }
    }
}

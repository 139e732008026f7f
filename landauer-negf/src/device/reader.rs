// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use color_eyre::eyre::{eyre, WrapErr};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::{ops::Deref, path::Path};

#[derive(Clone, Debug, Deserialize, PartialEq)]
/// A strip of `width` transverse sites between two semi-infinite leads
pub struct Device {
    /// Number of transverse sites in every slice
    pub width: usize,
    /// Nearest neighbour hopping energy, along and across the strip
    pub hopping: f64,
    /// On-site potential of the left and right lead
    #[serde(default)]
    pub lead_potentials: [f64; 2],
    /// Layers of the device, ordered from the left lead to the right lead
    pub layers: Vec<Layer>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
/// A run of identical slices at a fixed on-site potential
pub struct Layer {
    /// On-site potential of every site in the layer
    pub potential: f64,
    /// Number of slices, each of which is one diagonal block
    pub slices: usize,
}

impl Deref for Device {
    type Target = Vec<Layer>;

    fn deref(&self) -> &Self::Target {
        &self.layers
    }
}

impl Device {
    /// Reads and validates a device file
    pub fn build(path: &Path) -> color_eyre::Result<Self> {
        let s = Config::builder()
            .add_source(File::from(path))
            .build()
            .wrap_err_with(|| format!("Failed to read the device file {}", path.display()))?;
        let device: Self = s
            .try_deserialize()
            .map_err(|e| eyre!("Failed to deserialize device: {:?}", e))?;
        device.validate()?;
        Ok(device)
    }

    /// Parses a device from an in-memory `toml` string
    pub fn from_toml(contents: &str) -> color_eyre::Result<Self> {
        let s = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;
        let device: Self = s
            .try_deserialize()
            .map_err(|e| eyre!("Failed to deserialize device: {:?}", e))?;
        device.validate()?;
        Ok(device)
    }

    /// The total number of slices across every layer
    pub fn number_of_slices(&self) -> usize {
        self.layers.iter().map(|layer| layer.slices).sum()
    }

    /// The on-site potential of every slice, left to right
    pub fn slice_potentials(&self) -> impl Iterator<Item = f64> + '_ {
        self.layers
            .iter()
            .flat_map(|layer| std::iter::repeat(layer.potential).take(layer.slices))
    }

    fn validate(&self) -> color_eyre::Result<()> {
        if self.width == 0 {
            return Err(eyre!("The strip width must be at least one site"));
        }
        if !self.hopping.is_finite() || self.hopping == 0. {
            return Err(eyre!("The hopping energy must be finite and non-zero"));
        }
        if self.layers.is_empty() {
            return Err(eyre!("A device needs at least one layer"));
        }
        if let Some(index) = self.layers.iter().position(|layer| layer.slices == 0) {
            return Err(eyre!("Layer {} has no slices", index));
        }
        Ok(())
    }
}

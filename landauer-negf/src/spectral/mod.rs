// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The discrete energy space swept by a transmission spectrum

mod energy;

pub use energy::{EnergySpace, EnergySpaceBuilder};

use serde::Deserialize;

/// Energy grid parameters as read from the configuration
#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
pub struct SpectralSettings {
    /// First energy of the grid
    pub minimum_energy: f64,
    /// Last energy of the grid
    pub maximum_energy: f64,
    /// Number of grid points
    pub number_of_energy_points: usize,
    /// Imaginary part added to every energy
    pub broadening: f64,
}

impl SpectralSettings {
    /// The energy grid these settings describe
    pub fn energy_space(&self) -> Result<EnergySpace, crate::error::StructuralError> {
        EnergySpaceBuilder::new()
            .with_number_of_points(self.number_of_energy_points)
            .with_energy_range(self.minimum_energy..self.maximum_energy)
            .with_broadening(self.broadening)
            .build()
    }
}

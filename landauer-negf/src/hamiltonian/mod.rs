// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Hamiltonian module
//!
//! Builds the nearest-neighbour tight-binding Hamiltonian of a [`Device`] strip. Every
//! slice of `width` sites is one diagonal block, and neighbouring slices couple through
//! `-t` on each site, so the device Hamiltonian is block tridiagonal by construction.
//!
//! The engines consume inverse Green's functions `(E + iη)I - H`, which
//! [`StripHamiltonian::transport_problem`] assembles for the device and both leads:
//!
//! ```ignore
//! let hamiltonian = HamiltonianBuilder::new().with_device(&device).build();
//! let problem = hamiltonian.transport_problem(energy, broadening)?;
//! ```

use crate::{
    device::Device,
    error::StructuralError,
    greens_functions::BlockPartition,
    self_energy::LeadSide,
    transmission::Lead,
    utilities::retarded_inverse,
};
use nalgebra::DMatrix;
use num_complex::Complex;

/// Builder for a [`StripHamiltonian`]
pub struct HamiltonianBuilder<RefDevice> {
    device: RefDevice,
}

impl Default for HamiltonianBuilder<()> {
    fn default() -> Self {
        Self { device: () }
    }
}

impl HamiltonianBuilder<()> {
    /// An empty builder
    pub fn new() -> Self {
        Self::default()
    }
}

impl<RefDevice> HamiltonianBuilder<RefDevice> {
    /// Attach the device description
    pub fn with_device(self, device: &Device) -> HamiltonianBuilder<&Device> {
        HamiltonianBuilder { device }
    }
}

impl HamiltonianBuilder<&Device> {
    /// Builds the strip Hamiltonian
    #[tracing::instrument(name = "Hamiltonian Builder", level = "info", skip(self))]
    pub fn build(self) -> StripHamiltonian {
        let device = self.device;
        let slice_potentials = device.slice_potentials().collect::<Vec<_>>();
        tracing::info!(
            "{} slices of width {}, total dimension {}",
            slice_potentials.len(),
            device.width,
            slice_potentials.len() * device.width
        );
        StripHamiltonian {
            width: device.width,
            hopping: device.hopping,
            slice_potentials,
            lead_potentials: device.lead_potentials,
        }
    }
}

#[derive(Clone, Debug)]
/// The Hamiltonian of a tight-binding strip and its two leads
pub struct StripHamiltonian {
    width: usize,
    hopping: f64,
    slice_potentials: Vec<f64>,
    lead_potentials: [f64; 2],
}

/// The inverse Green's functions of a strip at one energy
#[derive(Clone, Debug)]
pub struct TransportProblem {
    /// The device, block tridiagonal over `partition`
    pub device: DMatrix<Complex<f64>>,
    /// One block per slice
    pub partition: BlockPartition,
    /// Unit cells of the left and right leads
    pub lead_cells: [DMatrix<Complex<f64>>; 2],
    /// Coupling between neighbouring slices, shared by the leads and the device contacts
    pub coupling: DMatrix<Complex<f64>>,
}

impl TransportProblem {
    /// The left and right leads, borrowing from the problem
    pub fn leads(&self) -> (Lead<'_>, Lead<'_>) {
        let lead = |cell| Lead {
            onsite: cell,
            coupling: &self.coupling,
            device_coupling: &self.coupling,
        };
        (lead(&self.lead_cells[0]), lead(&self.lead_cells[1]))
    }
}

impl StripHamiltonian {
    /// Number of transverse sites per slice
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of slices in the device
    pub fn number_of_slices(&self) -> usize {
        self.slice_potentials.len()
    }

    /// One diagonal block per slice
    pub fn partition(&self) -> Result<BlockPartition, StructuralError> {
        BlockPartition::uniform(self.width, self.number_of_slices())
    }

    /// A single slice at on-site `potential`, a transverse chain of `width` sites
    pub fn slice(&self, potential: f64) -> DMatrix<Complex<f64>> {
        DMatrix::from_fn(self.width, self.width, |row, column| {
            if row == column {
                Complex::from(potential)
            } else if row.abs_diff(column) == 1 {
                Complex::from(-self.hopping)
            } else {
                Complex::from(0.)
            }
        })
    }

    /// The coupling from one slice to the next
    pub fn inter_slice(&self) -> DMatrix<Complex<f64>> {
        DMatrix::from_diagonal_element(self.width, self.width, Complex::from(-self.hopping))
    }

    /// The device Hamiltonian over every slice
    pub fn device(&self) -> DMatrix<Complex<f64>> {
        let dimension = self.width * self.number_of_slices();
        let mut hamiltonian = DMatrix::zeros(dimension, dimension);
        let inter_slice = self.inter_slice();
        for (index, potential) in self.slice_potentials.iter().enumerate() {
            let offset = index * self.width;
            hamiltonian
                .slice_mut((offset, offset), (self.width, self.width))
                .copy_from(&self.slice(*potential));
            if index + 1 < self.number_of_slices() {
                let next = offset + self.width;
                hamiltonian
                    .slice_mut((offset, next), (self.width, self.width))
                    .copy_from(&inter_slice);
                hamiltonian
                    .slice_mut((next, offset), (self.width, self.width))
                    .copy_from(&inter_slice.adjoint());
            }
        }
        hamiltonian
    }

    /// The unit cell of the lead on `side`
    pub fn lead_cell(&self, side: LeadSide) -> DMatrix<Complex<f64>> {
        match side {
            LeadSide::Left => self.slice(self.lead_potentials[0]),
            LeadSide::Right => self.slice(self.lead_potentials[1]),
        }
    }

    /// The inverse Green's function of the device at `energy + i broadening`
    pub fn device_inverse(&self, energy: f64, broadening: f64) -> DMatrix<Complex<f64>> {
        retarded_inverse(&self.device(), energy, broadening)
    }

    /// The inverse Green's functions of the left and right lead cells
    pub fn lead_inverses(&self, energy: f64, broadening: f64) -> [DMatrix<Complex<f64>>; 2] {
        [LeadSide::Left, LeadSide::Right]
            .map(|side| retarded_inverse(&self.lead_cell(side), energy, broadening))
    }

    /// The inter-slice block of the inverse Green's function, `-H_{i, i+1}`
    pub fn contact_coupling(&self) -> DMatrix<Complex<f64>> {
        -self.inter_slice()
    }

    /// The inverse Green's functions of device and leads at `energy + i broadening`
    pub fn transport_problem(
        &self,
        energy: f64,
        broadening: f64,
    ) -> Result<TransportProblem, StructuralError> {
        Ok(TransportProblem {
            device: self.device_inverse(energy, broadening),
            partition: self.partition()?,
            lead_cells: self.lead_inverses(energy, broadening),
            coupling: self.contact_coupling(),
        })
    }
}

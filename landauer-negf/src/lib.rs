// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Landauer-NEGF is a coherent electron transport solver written in Rust
//!
//! # Overview
//! Landauer-NEGF calculates the Green's functions of block tridiagonal systems in the
//! non-equilibrium Green's function formalism ([Lake 1997](https://doi.org/10.1063/1.365394)),
//! and from them the Landauer transmission of a device between two semi-infinite leads.
//!
//! Three engines do the numerical work:
//! - [`greens_functions::GreensSolver`] computes the full inverse of a block tridiagonal
//!   matrix, or a corner block or corner block column of it, by recursive Schur complements
//!   over the blocks of a [`greens_functions::BlockPartition`].
//! - [`self_energy::ChainSolver`] finds the surface Green's function of a semi-infinite
//!   periodic chain by decimation.
//! - [`transmission::TwoLeadTransportSolver`] folds the lead self energies onto the device
//!   and evaluates the Caroli trace `Tr(Γ_far G Γ_near G†)`.
//!
//! Every engine takes inverse Green's function matrices `(E + iη)I - H`, memoises its
//! results, and reports failures as one of the three [`ErrorCategory`] values. The
//! [`batch`] module runs any of them over many independent matrices in parallel.
//!
//! # Usage
//! Landauer-NEGF also ships a binary which sweeps the transmission of a tight-binding strip
//! over an energy grid. To run the software first define a structure in a `.toml` file:
//!
//! ```toml
//! width = 4
//! hopping = 1.0
//! lead_potentials = [0.0, 0.0]
//!
//! [[layers]]
//! potential = 0.0
//! slices = 5
//!
//! [[layers]]
//! potential = 0.8
//! slices = 3
//! ```
//!
//! where additional layers can be appended with subsequent `layers` fields. Numerical
//! settings and the energy grid are read from `.config/default.toml`.

#![warn(missing_docs)]
#![allow(clippy::type_complexity)]

/// The command line application, its configuration and tracing
pub mod app;

/// Parallel solves over independent matrices
pub mod batch;

/// Logging and progress side channels
pub mod context;

/// Device description
pub mod device;

/// Range-restricted Hermitian eigensystems
pub mod eigensystem;

/// Error handling
mod error;

/// Greens function methods
pub mod greens_functions;

/// Tight-binding strip Hamiltonian
pub mod hamiltonian;

/// Self energies of semi-infinite leads
pub mod self_energy;

/// Discrete energy spaces
pub mod spectral;

/// Two-lead Landauer transmission
pub mod transmission;

/// Dense matrix helpers
pub mod utilities;

pub use error::{
    ErrorCategory, InversionSite, NonConvergenceError, SingularMatrixError, StructuralError,
};

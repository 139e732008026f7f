// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Self Energy
//!
//! Surface Green's functions of semi-infinite periodic leads, found by decimation, and the
//! self energies they fold onto the device blocks they couple to.

mod chain;
mod lead;

pub use chain::{ChainSettings, ChainSolver, ChainType, Convergence, SurfaceGreensFunction};
pub use lead::{lead_self_energy, LeadSide};

use crate::error::{ErrorCategory, NonConvergenceError, SingularMatrixError, StructuralError};
use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq)]
/// Errors raised while computing lead surface Green's functions and self energies
pub enum SelfEnergyError {
    /// The chain blocks are misshapen
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// An inversion during decimation failed
    #[error(transparent)]
    Singular(#[from] SingularMatrixError),
    /// The decimation ran out of iterations
    #[error(transparent)]
    NonConvergence(#[from] NonConvergenceError),
}

impl SelfEnergyError {
    /// Which of the failure categories occurred
    pub fn category(&self) -> ErrorCategory {
        match self {
            SelfEnergyError::Structural(_) => ErrorCategory::Structural,
            SelfEnergyError::Singular(_) => ErrorCategory::SingularMatrix,
            SelfEnergyError::NonConvergence(_) => ErrorCategory::NonConvergence,
        }
    }
}

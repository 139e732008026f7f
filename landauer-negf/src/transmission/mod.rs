// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Transmission
//!
//! Landauer transmission through a block-tridiagonal device between two semi-infinite leads.
//! The lead surface Green's functions are folded onto the device corner blocks as self
//! energies, a single recursive sweep yields the corner of the device Green's function, and
//! the transmission follows from the Caroli trace `T = Re Tr(Γ_far G Γ_near G†)`.

mod two_lead;

pub use two_lead::{
    Lead, TransportDirection, TransportSettings, TransportSolution, TwoLeadTransportSolver,
    TwoLeadTransportSolverBuilder,
};

use crate::{
    error::{ErrorCategory, NonConvergenceError, StructuralError},
    greens_functions::GreensFunctionError,
    self_energy::{LeadSide, SelfEnergyError},
};
use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq)]
/// Errors raised while computing a transmission coefficient
pub enum TransmissionError {
    /// The device, leads or couplings do not fit together
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// The dressed device could not be swept
    #[error(transparent)]
    GreensFunction(#[from] GreensFunctionError),
    /// A lead self energy could not be computed
    #[error("{side:?} lead: {source}")]
    Lead {
        /// The failing lead
        side: LeadSide,
        /// Why it failed
        #[source]
        source: SelfEnergyError,
    },
    /// A lead decimation ran out of iterations and unconverged leads are not allowed
    #[error("{side:?} lead surface Green's function did not converge")]
    #[diagnostic(help("raise chain.maximum_iterations, or set transport.allow_unconverged_leads"))]
    UnconvergedLead {
        /// The failing lead
        side: LeadSide,
        /// The decimation report
        #[source]
        source: NonConvergenceError,
    },
}

impl TransmissionError {
    /// Which of the failure categories occurred
    pub fn category(&self) -> ErrorCategory {
        match self {
            TransmissionError::Structural(_) => ErrorCategory::Structural,
            TransmissionError::GreensFunction(error) => error.category(),
            TransmissionError::Lead { source, .. } => source.category(),
            TransmissionError::UnconvergedLead { .. } => ErrorCategory::NonConvergence,
        }
    }
}

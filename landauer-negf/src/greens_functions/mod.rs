// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Greens Functions
//!
//! Retarded Green's functions of block-tridiagonal matrices. The matrix handed to a
//! [`GreensSolver`] is the inverse Green's function, `(E + iη) I - H - Σ`, and the solver
//! returns either its full inverse or the corner blocks and block columns that the
//! recursive algorithms reach without a dense inversion.

mod partition;
pub(crate) mod recursive;
mod solver;
mod view;

pub use partition::BlockPartition;
pub use solver::GreensSolver;
pub use view::BlockView;

use crate::error::{ErrorCategory, SingularMatrixError, StructuralError};
use miette::Diagnostic;

/// The portion of the inverse a [`GreensSolver`] computes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GreensMode {
    /// The dense inverse of the partitioned region
    FullMatrix,
    /// The top-left block of the inverse
    FirstBlock,
    /// The bottom-right block of the inverse
    LastBlock,
    /// Every block in the first block column of the inverse
    FirstBlockColumn,
    /// Every block in the last block column of the inverse
    LastBlockColumn,
}

#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq)]
/// Errors raised while computing a Green's function
pub enum GreensFunctionError {
    /// The matrix or partition cannot be swept
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// A block inversion failed
    #[error(transparent)]
    Singular(#[from] SingularMatrixError),
}

impl GreensFunctionError {
    /// Which of the failure categories occurred
    pub fn category(&self) -> ErrorCategory {
        match self {
            GreensFunctionError::Structural(_) => ErrorCategory::Structural,
            GreensFunctionError::Singular(_) => ErrorCategory::SingularMatrix,
        }
    }
}

// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Error
//!
//! Failure categories shared by every engine in the crate. Each module wraps these in
//! its own error enum, and every such enum reports which of the three categories
//! occurred through [`ErrorCategory`].

use miette::Diagnostic;
use std::fmt;

/// The three ways a single solve can fail
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The inputs are inconsistent with the requested operation
    Structural,
    /// A block or full inversion met a singular or ill-conditioned matrix
    SingularMatrix,
    /// A semi-infinite chain exhausted its iteration budget
    NonConvergence,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Structural => write!(f, "structural"),
            ErrorCategory::SingularMatrix => write!(f, "singular-matrix"),
            ErrorCategory::NonConvergence => write!(f, "non-convergence"),
        }
    }
}

#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
/// Configuration-time errors, raised before any numerical work
pub enum StructuralError {
    /// The block sizes do not fit in the matrix
    #[error("block sizes sum to {sum}, exceeding the matrix dimension {dimension}")]
    #[diagnostic(code(landauer_negf::partition::oversized))]
    PartitionExceedsDimension {
        /// Sum of the requested block sizes
        sum: usize,
        /// Dimension of the partitioned matrix
        dimension: usize,
    },
    /// No block sizes were given
    #[error("a partition needs at least one block")]
    #[diagnostic(code(landauer_negf::partition::empty))]
    EmptyPartition,
    /// A block of zero size was requested
    #[error("block {index} has zero size")]
    #[diagnostic(code(landauer_negf::partition::zero_sized))]
    ZeroSizedBlock {
        /// Position of the empty block
        index: usize,
    },
    /// A block index outside `[-count, count)`
    #[error("block index {index} is out of range for {count} blocks")]
    #[diagnostic(code(landauer_negf::partition::index))]
    BlockIndexOutOfRange {
        /// The requested index
        index: isize,
        /// Number of blocks in the partition
        count: usize,
    },
    /// A square matrix was required
    #[error("expected a square matrix, found {rows}x{columns}")]
    NonSquare {
        /// Rows of the offending matrix
        rows: usize,
        /// Columns of the offending matrix
        columns: usize,
    },
    /// A hermitian matrix was required
    #[error("expected a hermitian matrix")]
    NotHermitian,
    /// A matrix does not have the shape its role demands
    #[error("{context}: expected shape {expected:?}, found {found:?}")]
    DimensionMismatch {
        /// The role of the matrix
        context: &'static str,
        /// The shape the role demands
        expected: (usize, usize),
        /// The shape supplied
        found: (usize, usize),
    },
    /// Any other request the engines cannot serve
    #[error("{0}")]
    MalformedRequest(String),
}

/// Where an inversion failed
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InversionSite {
    /// The full matrix, outside of any recursive sweep
    Full,
    /// A diagonal block of a recursive sweep, by zero-based block index
    Block(usize),
    /// The bulk energy of a chain decimation, by iteration
    Decimation(usize),
    /// The final surface inversion of a chain decimation
    Surface,
}

impl fmt::Display for InversionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InversionSite::Full => write!(f, "the full matrix"),
            InversionSite::Block(index) => write!(f, "block {}", index),
            InversionSite::Decimation(iteration) => {
                write!(f, "decimation iteration {}", iteration)
            }
            InversionSite::Surface => write!(f, "the chain surface"),
        }
    }
}

#[derive(thiserror::Error, Debug, Diagnostic, Clone, Copy, PartialEq, Eq)]
#[error("matrix is singular at {site}")]
#[diagnostic(
    code(landauer_negf::singular),
    help("add a finite broadening to the energy, or check the block for a zero row")
)]
/// An inversion met a singular, or numerically ill-conditioned, matrix
pub struct SingularMatrixError {
    /// The location of the failed inversion
    pub site: InversionSite,
}

impl SingularMatrixError {
    /// The block index of the failure, when it happened inside a recursive sweep
    pub fn block(&self) -> Option<usize> {
        match self.site {
            InversionSite::Block(index) => Some(index),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Diagnostic, Clone, Copy, PartialEq)]
#[error(
    "chain decimation did not converge in {iterations} iterations (residual coupling {residual:e})"
)]
#[diagnostic(code(landauer_negf::non_convergence))]
/// A semi-infinite chain ran out of iterations before its couplings became negligible
pub struct NonConvergenceError {
    /// Iterations performed
    pub iterations: usize,
    /// Largest coupling element remaining when the loop stopped
    pub residual: f64,
}

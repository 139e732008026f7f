// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Surface Green's functions of semi-infinite periodic chains.
//!
//! A chain is a unit cell with inverse Green's function `H0`, repeated without end and coupled
//! to its neighbour by `V` (cell to next cell) and `V†` (next cell back). The surface
//! Green's function is found by decimation: each iteration eliminates every other cell,
//! doubling the length of chain the renormalised couplings `alpha` and `beta` span,
//!
//! epsilon_{n+1}   = epsilon_{n} - beta g alpha - alpha g beta
//! surface_{n+1}   = surface_{n} - alpha g beta
//! alpha_{n+1}     = alpha g alpha,   beta_{n+1} = beta g beta,   g = epsilon_{n}^{-1}
//!
//! until both couplings are negligible. The surface Green's function is then the inverse
//! of the renormalised surface energy. Convergence is judged on the couplings alone.

use super::SelfEnergyError;
use crate::{
    context::SolverContext,
    error::{InversionSite, NonConvergenceError, SingularMatrixError, StructuralError},
    greens_functions::{BlockPartition, BlockView},
    utilities::{checked_inverse, max_modulus, InversionSettings},
};
use nalgebra::DMatrix;
use num_complex::Complex;
use serde::Deserialize;
use std::{
    borrow::Cow,
    collections::{hash_map::Entry, HashMap},
};

/// Which end of the chain is the surface
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChainType {
    /// The chain extends to the left and its surface is the rightmost cell
    LeftSemiInfinite,
    /// The chain extends to the right and its surface is the leftmost cell
    RightSemiInfinite,
}

/// Iteration budget for the decimation
#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChainSettings {
    /// Hard cap on decimation iterations
    pub maximum_iterations: usize,
    /// Couplings with every element modulus below this are negligible
    pub tolerance: f64,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            maximum_iterations: 1000,
            tolerance: 1e-10,
        }
    }
}

/// How a decimation terminated
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Convergence {
    /// Both couplings fell below the tolerance
    Converged {
        /// Iterations performed
        iterations: usize,
    },
    /// The iteration cap was reached first
    Exhausted {
        /// Iterations performed
        iterations: usize,
        /// Largest coupling element remaining
        residual: f64,
    },
}

impl Convergence {
    /// Whether the couplings became negligible
    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }

    /// Iterations performed
    pub fn iterations(&self) -> usize {
        match self {
            Convergence::Converged { iterations } | Convergence::Exhausted { iterations, .. } => {
                *iterations
            }
        }
    }

    /// Converts an exhausted decimation into an error
    pub fn ensure_converged(&self) -> Result<(), NonConvergenceError> {
        match *self {
            Convergence::Converged { .. } => Ok(()),
            Convergence::Exhausted {
                iterations,
                residual,
            } => Err(NonConvergenceError {
                iterations,
                residual,
            }),
        }
    }
}

/// The result of a decimation
#[derive(Clone, Debug)]
pub struct SurfaceGreensFunction {
    /// The surface Green's function, the inverse of `surface_energy`
    pub matrix: DMatrix<Complex<f64>>,
    /// The renormalised inverse Green's function of the surface cell
    pub surface_energy: DMatrix<Complex<f64>>,
    /// How the decimation terminated
    pub convergence: Convergence,
}

/// Decimation solver for a semi-infinite periodic chain.
///
/// Results are memoised per [`ChainType`]. A non-converged decimation still yields its
/// best-effort surface Green's function, flagged through [`Convergence::Exhausted`].
pub struct ChainSolver<'a> {
    onsite: Cow<'a, DMatrix<Complex<f64>>>,
    coupling: Cow<'a, DMatrix<Complex<f64>>>,
    settings: ChainSettings,
    inversion: InversionSettings,
    context: SolverContext<'a>,
    cache: HashMap<ChainType, SurfaceGreensFunction>,
    evaluations: usize,
}

impl<'a> ChainSolver<'a> {
    /// A chain with unit cell `onsite` and cell to next cell coupling `coupling`
    pub fn new(
        onsite: &'a DMatrix<Complex<f64>>,
        coupling: &'a DMatrix<Complex<f64>>,
    ) -> Result<Self, SelfEnergyError> {
        Self::from_cows(Cow::Borrowed(onsite), Cow::Borrowed(coupling))
    }

    /// A chain read from a partitioned matrix.
    ///
    /// Accepts one block row `[H0 V]`, one block column `[H0; V†]`, or a two by two block
    /// matrix whose first row is `[H0 V]`.
    pub fn from_partitioned(
        matrix: &DMatrix<Complex<f64>>,
        partition: &BlockPartition,
    ) -> Result<ChainSolver<'static>, SelfEnergyError> {
        let view = BlockView::new(matrix, partition)?;
        let onsite = view.block(0, 0)?.into_owned();
        let coupling = match (view.number_of_blocks(), view.number_of_column_blocks()) {
            (1, 2) | (2, 2) => view.block(0, 1)?.into_owned(),
            (2, 1) => view.block(1, 0)?.adjoint(),
            (rows, columns) => {
                return Err(StructuralError::MalformedRequest(format!(
                    "a chain needs a 1x2, 2x1 or 2x2 block partition, found {}x{}",
                    rows, columns
                ))
                .into())
            }
        };
        ChainSolver::from_cows(Cow::Owned(onsite), Cow::Owned(coupling))
    }

    fn from_cows(
        onsite: Cow<'a, DMatrix<Complex<f64>>>,
        coupling: Cow<'a, DMatrix<Complex<f64>>>,
    ) -> Result<Self, SelfEnergyError> {
        let (rows, columns) = onsite.shape();
        if rows != columns {
            return Err(StructuralError::NonSquare { rows, columns }.into());
        }
        if coupling.shape() != onsite.shape() {
            return Err(StructuralError::DimensionMismatch {
                context: "chain coupling",
                expected: onsite.shape(),
                found: coupling.shape(),
            }
            .into());
        }
        Ok(Self {
            onsite,
            coupling,
            settings: ChainSettings::default(),
            inversion: InversionSettings::default(),
            context: SolverContext::default(),
            cache: HashMap::new(),
            evaluations: 0,
        })
    }

    /// Replace the iteration budget
    pub fn with_settings(mut self, settings: ChainSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the singularity criterion
    pub fn with_inversion_settings(mut self, inversion: InversionSettings) -> Self {
        self.inversion = inversion;
        self
    }

    /// Attach the logging and progress context
    pub fn with_context(mut self, context: SolverContext<'a>) -> Self {
        self.context = context;
        self
    }

    /// The unit cell dimension
    pub fn dimension(&self) -> usize {
        self.onsite.nrows()
    }

    /// The surface Green's function for `chain_type`, computed on first request
    pub fn compute(
        &mut self,
        chain_type: ChainType,
    ) -> Result<&SurfaceGreensFunction, SelfEnergyError> {
        let surface = match self.cache.entry(chain_type) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let surface = decimate(
                    &self.onsite,
                    &self.coupling,
                    chain_type,
                    &self.settings,
                    &self.inversion,
                )?;
                self.evaluations += 1;
                if self.context.logging_enabled() {
                    match surface.convergence {
                        Convergence::Converged { iterations } => tracing::debug!(
                            "{:?} chain converged after {} iterations",
                            chain_type,
                            iterations
                        ),
                        Convergence::Exhausted {
                            iterations,
                            residual,
                        } => tracing::warn!(
                            "{:?} chain did not converge in {} iterations, residual coupling {:e}",
                            chain_type,
                            iterations,
                            residual
                        ),
                    }
                }
                entry.insert(surface)
            }
        };
        Ok(surface)
    }

    /// The self energy the chain folds onto a block through `coupling`.
    ///
    /// For a left chain `coupling` runs from the block to the surface cell and the self
    /// energy is `V g V†`. For a right chain it runs from the surface cell to the block,
    /// giving `V† g V`.
    pub fn self_energy(
        &mut self,
        chain_type: ChainType,
        coupling: &DMatrix<Complex<f64>>,
    ) -> Result<(DMatrix<Complex<f64>>, Convergence), SelfEnergyError> {
        let dimension = self.dimension();
        let surface = self.compute(chain_type)?;
        let self_energy = match chain_type {
            ChainType::LeftSemiInfinite => {
                if coupling.ncols() != dimension {
                    return Err(StructuralError::DimensionMismatch {
                        context: "left lead coupling",
                        expected: (coupling.nrows(), dimension),
                        found: coupling.shape(),
                    }
                    .into());
                }
                coupling * &surface.matrix * coupling.adjoint()
            }
            ChainType::RightSemiInfinite => {
                if coupling.nrows() != dimension {
                    return Err(StructuralError::DimensionMismatch {
                        context: "right lead coupling",
                        expected: (dimension, coupling.ncols()),
                        found: coupling.shape(),
                    }
                    .into());
                }
                coupling.adjoint() * &surface.matrix * coupling
            }
        };
        Ok((self_energy, surface.convergence))
    }

    /// The number of decimations actually run
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

fn decimate(
    onsite: &DMatrix<Complex<f64>>,
    coupling: &DMatrix<Complex<f64>>,
    chain_type: ChainType,
    settings: &ChainSettings,
    inversion: &InversionSettings,
) -> Result<SurfaceGreensFunction, SingularMatrixError> {
    let (mut alpha, mut beta) = match chain_type {
        ChainType::LeftSemiInfinite => (coupling.adjoint(), coupling.clone()),
        ChainType::RightSemiInfinite => (coupling.clone(), coupling.adjoint()),
    };
    let mut epsilon = onsite.clone();
    let mut surface = onsite.clone();
    let mut g = checked_inverse(epsilon.clone(), inversion, InversionSite::Decimation(0))?;

    let mut iterations = 0;
    let convergence = loop {
        let residual = max_modulus(&alpha).max(max_modulus(&beta));
        if residual < settings.tolerance {
            break Convergence::Converged { iterations };
        }
        if iterations >= settings.maximum_iterations {
            break Convergence::Exhausted {
                iterations,
                residual,
            };
        }

        let forward = &alpha * &g * &beta;
        let backward = &beta * &g * &alpha;
        epsilon -= &forward;
        epsilon -= &backward;
        surface -= &forward;
        alpha = &alpha * &g * &alpha;
        beta = &beta * &g * &beta;

        iterations += 1;
        g = checked_inverse(
            epsilon.clone(),
            inversion,
            InversionSite::Decimation(iterations),
        )?;
    };

    surface -= &alpha * &g * &beta;
    let matrix = checked_inverse(surface.clone(), inversion, InversionSite::Surface)?;
    Ok(SurfaceGreensFunction {
        matrix,
        surface_energy: surface,
        convergence,
    })
}

// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::{recursive, BlockPartition, BlockView, GreensFunctionError, GreensMode};
use crate::{
    context::SolverContext,
    error::{InversionSite, StructuralError},
    utilities::{checked_inverse, InversionSettings},
};
use nalgebra::DMatrix;
use num_complex::Complex;
use std::collections::{hash_map::Entry, HashMap};

#[derive(Clone, Debug)]
struct Solution {
    matrix: DMatrix<Complex<f64>>,
    reduced_sigma: Option<DMatrix<Complex<f64>>>,
}

/// Computes the inverse, or blocks of the inverse, of a block-tridiagonal matrix.
///
/// Results are memoised per [`GreensMode`]: asking for the same mode twice returns the
/// stored result without sweeping again. The matrix and partition are borrowed for the
/// lifetime of the solver, so the inputs cannot change underneath the cache.
pub struct GreensSolver<'a> {
    view: BlockView<'a>,
    settings: InversionSettings,
    context: SolverContext<'a>,
    cache: HashMap<GreensMode, Solution>,
    last_mode: Option<GreensMode>,
    evaluations: usize,
}

impl<'a> GreensSolver<'a> {
    /// A solver over every block of `partition`
    pub fn new(
        matrix: &'a DMatrix<Complex<f64>>,
        partition: &'a BlockPartition,
    ) -> Result<Self, GreensFunctionError> {
        Self::from_view(BlockView::new(matrix, partition)?)
    }

    /// A solver over the blocks of an existing view
    pub fn from_view(view: BlockView<'a>) -> Result<Self, GreensFunctionError> {
        if !view.is_block_square() {
            return Err(StructuralError::MalformedRequest(
                "recursive Green's functions need square diagonal blocks".into(),
            )
            .into());
        }
        Ok(Self {
            view,
            settings: InversionSettings::default(),
            context: SolverContext::default(),
            cache: HashMap::new(),
            last_mode: None,
            evaluations: 0,
        })
    }

    /// Replace the singularity criterion used for every inversion
    pub fn with_settings(mut self, settings: InversionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Attach the logging and progress context
    pub fn with_context(mut self, context: SolverContext<'a>) -> Self {
        self.context = context;
        self
    }

    /// Computes `mode`, or returns the stored result of an earlier call.
    ///
    /// Column and corner modes on a single-block partition degrade to `FullMatrix`.
    pub fn compute(
        &mut self,
        mode: GreensMode,
    ) -> Result<&DMatrix<Complex<f64>>, GreensFunctionError> {
        let solution = match self.cache.entry(mode) {
            Entry::Occupied(entry) => {
                if self.context.logging_enabled() {
                    tracing::trace!("Reusing the cached {:?} Green's function", mode);
                }
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                let solution = evaluate(&self.view, mode, &self.settings, &self.context)?;
                self.evaluations += 1;
                entry.insert(solution)
            }
        };
        self.last_mode = Some(mode);
        Ok(&solution.matrix)
    }

    /// The self energy folded onto the corner block by the most recent sweep.
    ///
    /// `None` before any sweep has run, and after `FullMatrix` requests which do not sweep.
    pub fn reduced_sigma(&self) -> Option<&DMatrix<Complex<f64>>> {
        self.last_mode
            .and_then(|mode| self.cache.get(&mode))
            .and_then(|solution| solution.reduced_sigma.as_ref())
    }

    /// The number of times a result was actually computed rather than read from the cache
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// The view the solver operates on
    pub fn view(&self) -> &BlockView<'a> {
        &self.view
    }
}

fn evaluate(
    view: &BlockView<'_>,
    mode: GreensMode,
    settings: &InversionSettings,
    context: &SolverContext<'_>,
) -> Result<Solution, GreensFunctionError> {
    let number_of_blocks = view.number_of_blocks();
    let mode = if number_of_blocks == 1 && mode != GreensMode::FullMatrix {
        if context.logging_enabled() {
            tracing::debug!("{:?} requested on a single block, inverting in full", mode);
        }
        GreensMode::FullMatrix
    } else {
        mode
    };
    if context.logging_enabled() {
        tracing::debug!(
            "Computing the {:?} Green's function over {} blocks ({} rows)",
            mode,
            number_of_blocks,
            view.rows()
        );
    }

    let solution = match mode {
        GreensMode::FullMatrix => Solution {
            matrix: checked_inverse(
                view.as_slice().into_owned(),
                settings,
                InversionSite::Full,
            )?,
            reduced_sigma: None,
        },
        GreensMode::LastBlock => {
            let sweep = recursive::left_connected_sweep(view, settings, false)?;
            Solution {
                matrix: sweep.corner,
                reduced_sigma: Some(sweep.reduced_sigma),
            }
        }
        GreensMode::FirstBlock => {
            let sweep = recursive::right_connected_sweep(view, settings, false)?;
            Solution {
                matrix: sweep.corner,
                reduced_sigma: Some(sweep.reduced_sigma),
            }
        }
        GreensMode::LastBlockColumn => {
            let sweep = recursive::left_connected_sweep(view, settings, true)?;
            Solution {
                matrix: recursive::last_block_column(view, &sweep),
                reduced_sigma: Some(sweep.reduced_sigma),
            }
        }
        GreensMode::FirstBlockColumn => {
            let sweep = recursive::right_connected_sweep(view, settings, true)?;
            Solution {
                matrix: recursive::first_block_column(view, &sweep),
                reduced_sigma: Some(sweep.reduced_sigma),
            }
        }
    };
    Ok(solution)
}

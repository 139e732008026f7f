// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Batch
//!
//! Runs one engine over many independent matrices, one `rayon` task per instance. Results
//! come back in instance order and each instance succeeds or fails on its own: a singular
//! matrix at one momentum point never aborts the rest of the batch.

mod progress;
mod source;

pub use source::{MatrixGenerator, MatrixList, MatrixSource, SingleMatrix};

use crate::{
    context::SolverContext,
    eigensystem::{EigenAction, EigenError, EigenRange, EigenSolution, HermitianSolver},
    greens_functions::{BlockPartition, GreensFunctionError, GreensMode, GreensSolver},
    self_energy::{ChainSettings, ChainSolver, ChainType, SelfEnergyError, SurfaceGreensFunction},
    transmission::{
        Lead, TransmissionError, TransportDirection, TransportSettings, TransportSolution,
        TwoLeadTransportSolverBuilder,
    },
    utilities::InversionSettings,
};
use nalgebra::DMatrix;
use num_complex::Complex;
use progress::ProgressTracker;
use rayon::prelude::*;
use serde::Deserialize;

/// Numerical settings shared by every instance of a batch
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SolverSettings {
    /// Singularity criterion for every inversion
    #[serde(default)]
    pub inversion: InversionSettings,
    /// Decimation budget for lead chains
    #[serde(default)]
    pub chain: ChainSettings,
    /// Policy for two-lead transport
    #[serde(default)]
    pub transport: TransportSettings,
}

/// Applies `solve` to every matrix of `source` in parallel.
///
/// `solve` receives the instance index with its matrix. The context's progress sink sees
/// `0.0` before any work, the running fraction after each instance and `1.0` at the end.
pub fn solve_batch<S, T, E, F>(source: &S, context: SolverContext<'_>, solve: F) -> Vec<Result<T, E>>
where
    S: MatrixSource + ?Sized,
    T: Send,
    E: std::error::Error + Send,
    F: Fn(usize, &DMatrix<Complex<f64>>) -> Result<T, E> + Sync,
{
    let count = source.count();
    let tracker = ProgressTracker::new(count);
    context.report(0.);
    if context.logging_enabled() {
        tracing::info!("Solving a batch of {} instances", count);
    }

    let results = (0..count)
        .into_par_iter()
        .map(|index| {
            let span = tracing::info_span!("instance", index);
            let _entered = span.enter();
            let matrix = source.at(index);
            let result = solve(index, &matrix);
            if let Err(error) = &result {
                if context.logging_enabled() {
                    tracing::warn!("Instance {} failed: {}", index, error);
                }
            }
            tracker.complete_one();
            tracker.report_with(|fraction| context.report(fraction));
            result
        })
        .collect();

    context.report(1.);
    results
}

/// The Green's function `mode` of every matrix, all sharing `partition`
pub fn greens_batch<S: MatrixSource + ?Sized>(
    source: &S,
    partition: &BlockPartition,
    mode: GreensMode,
    settings: &SolverSettings,
    context: SolverContext<'_>,
) -> Vec<Result<DMatrix<Complex<f64>>, GreensFunctionError>> {
    let instance = context.without_progress();
    solve_batch(source, context, |_, matrix| {
        GreensSolver::new(matrix, partition)?
            .with_settings(settings.inversion)
            .with_context(instance)
            .compute(mode)
            .map(Clone::clone)
    })
}

/// The surface Green's function of every chain, each given as a partitioned `[h, v]`
/// matrix as accepted by [`ChainSolver::from_partitioned`]
pub fn chain_batch<S: MatrixSource + ?Sized>(
    source: &S,
    partition: &BlockPartition,
    chain_type: ChainType,
    settings: &SolverSettings,
    context: SolverContext<'_>,
) -> Vec<Result<SurfaceGreensFunction, SelfEnergyError>> {
    let instance = context.without_progress();
    solve_batch(source, context, |_, matrix| {
        ChainSolver::from_partitioned(matrix, partition)?
            .with_settings(settings.chain)
            .with_inversion_settings(settings.inversion)
            .with_context(instance)
            .compute(chain_type)
            .map(Clone::clone)
    })
}

/// The transport solution of every device between a shared pair of leads
pub fn transport_batch<S: MatrixSource + ?Sized>(
    source: &S,
    partition: &BlockPartition,
    left: Lead<'_>,
    right: Lead<'_>,
    direction: TransportDirection,
    settings: &SolverSettings,
    context: SolverContext<'_>,
) -> Vec<Result<TransportSolution, TransmissionError>> {
    let instance = context.without_progress();
    solve_batch(source, context, |_, matrix| {
        TwoLeadTransportSolverBuilder::new()
            .with_device(matrix, partition)
            .with_left_lead(left)
            .with_right_lead(right)
            .with_chain_settings(settings.chain)
            .with_inversion_settings(settings.inversion)
            .with_transport_settings(settings.transport)
            .build()?
            .with_context(instance)
            .compute(direction)
            .map(Clone::clone)
    })
}

/// The spectrum of every Hermitian matrix restricted to `range`
pub fn eigen_batch<S: MatrixSource + ?Sized>(
    source: &S,
    action: EigenAction,
    range: EigenRange,
    context: SolverContext<'_>,
) -> Vec<Result<EigenSolution, EigenError>> {
    let instance = context.without_progress();
    solve_batch(source, context, |_, matrix| {
        HermitianSolver::new(matrix)?
            .with_context(instance)
            .compute(action, range)
            .map(Clone::clone)
    })
}

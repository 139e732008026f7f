// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::{ChainSettings, ChainSolver, ChainType, Convergence, SelfEnergyError};
use crate::{
    context::SolverContext,
    error::StructuralError,
    greens_functions::{BlockPartition, BlockView},
};
use nalgebra::DMatrix;
use num_complex::Complex;

/// The side of the device a lead attaches to
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LeadSide {
    /// Blocks ordered `[cell, cell, device]`
    Left,
    /// Blocks ordered `[device, cell, cell]`
    Right,
}

/// Computes the self energy a periodic lead folds onto the neighbouring device block.
///
/// The matrix is partitioned into three blocks: two identical lead cells and the device
/// block they couple to. The lead cell adjacent to the device is the chain surface, and the
/// returned self energy is `t_{d s} g_s t_{s d}`.
pub fn lead_self_energy(
    matrix: &DMatrix<Complex<f64>>,
    partition: &BlockPartition,
    side: LeadSide,
    settings: ChainSettings,
    context: SolverContext<'_>,
) -> Result<(DMatrix<Complex<f64>>, Convergence), SelfEnergyError> {
    let view = BlockView::new(matrix, partition)?;
    if view.number_of_blocks() != 3 || !view.is_block_square() {
        return Err(StructuralError::MalformedRequest(format!(
            "a lead needs a square three block partition, found {:?}",
            partition.sizes()
        ))
        .into());
    }

    let (deep, surface, device, chain_type) = match side {
        LeadSide::Left => (0, 1, 2, ChainType::LeftSemiInfinite),
        LeadSide::Right => (2, 1, 0, ChainType::RightSemiInfinite),
    };
    if partition.size_of(deep) != partition.size_of(surface) {
        return Err(StructuralError::MalformedRequest(
            "the two lead cells must have the same size".into(),
        )
        .into());
    }

    let onsite = view.block_at(surface, surface).into_owned();
    // Cell to next cell, read left to right along the chain
    let coupling = match side {
        LeadSide::Left => view.block_at(deep, surface).into_owned(),
        LeadSide::Right => view.block_at(surface, deep).into_owned(),
    };
    let mut chain = ChainSolver::new(&onsite, &coupling)?
        .with_settings(settings)
        .with_context(context);
    let surface_greens_function = chain.compute(chain_type)?;

    let incoming = view.block_at(device, surface);
    let outgoing = view.block_at(surface, device);
    let self_energy = &incoming * &surface_greens_function.matrix * &outgoing;
    Ok((self_energy, surface_greens_function.convergence))
}

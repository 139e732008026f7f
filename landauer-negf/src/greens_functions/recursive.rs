// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! This module provides recursive methods to calculate blocks of the inverse of a block-tridiagonal matrix.
//!
//! Rather than fully inverting the matrix, an operation which scales as O(N^3) in the full dimension, it is often
//! preferable to calculate only the blocks necessary for the observables in which we are interested. A sweep
//! along the block chain needs one inversion per block, of block size. This sub-module provides:
//! - The bottom-right corner block, from a sweep beginning at the top-left -> `left_connected_sweep`
//! - The top-left corner block, from a sweep beginning at the bottom-right -> `right_connected_sweep`
//! - The full last or first block column, by back-substitution through the connected blocks of a sweep
//!
//! Only the diagonal and first off-diagonal blocks are read. Other blocks are assumed to vanish.

use super::BlockView;
use crate::{
    error::{InversionSite, SingularMatrixError},
    utilities::{checked_inverse, InversionSettings},
};
use itertools::Itertools;
use nalgebra::DMatrix;
use num_complex::Complex;

/// The outcome of a single recursive sweep
#[derive(Clone, Debug)]
pub(crate) struct Sweep {
    /// The corner block of the inverse at which the sweep terminated
    pub(crate) corner: DMatrix<Complex<f64>>,
    /// The self energy folded onto the corner block by every other block
    pub(crate) reduced_sigma: DMatrix<Complex<f64>>,
    /// Connected Green's functions, indexed by block, when the sweep was asked to retain them
    pub(crate) connected: Vec<DMatrix<Complex<f64>>>,
}

/// Sweeps from block 0 to block N-1, yielding the bottom-right corner of the inverse.
///
/// This process is initialised with a vanishing self energy and proceeds by solving
/// g_{ii}^{L} = (D_{i} - σ_{i})^{-1},   σ_{i+1} = t_{i+1, i} g_{ii}^{L} t_{i, i+1}
/// at each block, where D_{i} are the diagonal blocks and t_{i, j} the off-diagonal couplings.
/// The corner is then G_{N-1 N-1} = (D_{N-1} - σ_{N-1})^{-1}.
pub(crate) fn left_connected_sweep(
    view: &BlockView<'_>,
    settings: &InversionSettings,
    retain_connected: bool,
) -> Result<Sweep, SingularMatrixError> {
    let order = (0..view.number_of_blocks()).collect::<Vec<_>>();
    sweep(view, &order, settings, retain_connected)
}

/// Sweeps from block N-1 to block 0, yielding the top-left corner of the inverse.
///
/// This is the mirror of `left_connected_sweep`:
/// g_{ii}^{R} = (D_{i} - σ_{i})^{-1},   σ_{i-1} = t_{i-1, i} g_{ii}^{R} t_{i, i-1}
/// terminating in G_{00} = (D_{0} - σ_{0})^{-1}.
pub(crate) fn right_connected_sweep(
    view: &BlockView<'_>,
    settings: &InversionSettings,
    retain_connected: bool,
) -> Result<Sweep, SingularMatrixError> {
    let order = (0..view.number_of_blocks()).rev().collect::<Vec<_>>();
    let mut sweep = sweep(view, &order, settings, retain_connected)?;
    sweep.connected.reverse();
    Ok(sweep)
}

fn sweep(
    view: &BlockView<'_>,
    order: &[usize],
    settings: &InversionSettings,
    retain_connected: bool,
) -> Result<Sweep, SingularMatrixError> {
    let first = order[0];
    let mut sigma = DMatrix::zeros(view.size_of(first), view.size_of(first));
    let mut connected = Vec::with_capacity(if retain_connected { order.len() } else { 0 });

    for (&current, &next) in order.iter().tuple_windows() {
        let diagonal = view.block_at(current, current).into_owned() - &sigma;
        let g = checked_inverse(diagonal, settings, InversionSite::Block(current))?;
        let incoming = view.block_at(next, current);
        let outgoing = view.block_at(current, next);
        sigma = &incoming * &g * &outgoing;
        if retain_connected {
            connected.push(g);
        }
    }

    let last = order[order.len() - 1];
    let diagonal = view.block_at(last, last).into_owned() - &sigma;
    let corner = checked_inverse(diagonal, settings, InversionSite::Block(last))?;
    if retain_connected {
        connected.push(corner.clone());
    }

    Ok(Sweep {
        corner,
        reduced_sigma: sigma,
        connected,
    })
}

/// Builds out the last block column of the inverse from a retained left-connected sweep
///
/// The blocks of the column are related through
/// G_{i N-1} = - g_{ii}^{L} t_{i i+1} G_{i+1 N-1}
/// which is seeded by the corner block G_{N-1 N-1}.
pub(crate) fn last_block_column(
    view: &BlockView<'_>,
    sweep: &Sweep,
) -> DMatrix<Complex<f64>> {
    let number_of_blocks = view.number_of_blocks();
    let width = sweep.corner.ncols();
    let mut column = DMatrix::zeros(view.rows(), width);

    let mut previous = sweep.corner.clone();
    column
        .slice_mut((view.offset_of(number_of_blocks - 1), 0), previous.shape())
        .copy_from(&previous);
    for index in (0..number_of_blocks - 1).rev() {
        let hopping = view.block_at(index, index + 1);
        let element = -(&sweep.connected[index] * &hopping * &previous);
        column
            .slice_mut((view.offset_of(index), 0), element.shape())
            .copy_from(&element);
        previous = element;
    }
    column
}

/// Builds out the first block column of the inverse from a retained right-connected sweep
///
/// G_{i 0} = - g_{ii}^{R} t_{i i-1} G_{i-1 0}, seeded by the corner block G_{00}.
pub(crate) fn first_block_column(
    view: &BlockView<'_>,
    sweep: &Sweep,
) -> DMatrix<Complex<f64>> {
    let width = sweep.corner.ncols();
    let mut column = DMatrix::zeros(view.rows(), width);

    let mut previous = sweep.corner.clone();
    column
        .slice_mut((0, 0), previous.shape())
        .copy_from(&previous);
    for index in 1..view.number_of_blocks() {
        let hopping = view.block_at(index, index - 1);
        let element = -(&sweep.connected[index] * &hopping * &previous);
        column
            .slice_mut((view.offset_of(index), 0), element.shape())
            .copy_from(&element);
        previous = element;
    }
    column
}

#[cfg(test)]
mod test {
    use super::{first_block_column, last_block_column, left_connected_sweep, right_connected_sweep};
    use crate::greens_functions::{BlockPartition, BlockView};
    use crate::utilities::{max_modulus, InversionSettings};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn left_connected_corner_coincides_with_dense_inverse() {
        let mut rng = StdRng::seed_from_u64(7);
        let sizes = [2, 3, 1, 4];
        let matrix = utilities::shifted(&utilities::random_block_tridiagonal(&sizes, &mut rng), 1.);
        let partition = BlockPartition::new(&sizes, 10).unwrap();
        let view = BlockView::new(&matrix, &partition).unwrap();

        let sweep = left_connected_sweep(&view, &InversionSettings::default(), false).unwrap();
        let inverse = matrix.clone().try_inverse().unwrap();
        let expected = inverse.slice((6, 6), (4, 4));

        for (inv_val, my_val) in expected.iter().zip(sweep.corner.iter()) {
            approx::assert_relative_eq!(inv_val.re, my_val.re, epsilon = 1e-10);
            approx::assert_relative_eq!(inv_val.im, my_val.im, epsilon = 1e-10);
        }
        assert!(sweep.connected.is_empty());
        assert_eq!(sweep.reduced_sigma.shape(), (4, 4));
    }

    #[test]
    fn right_connected_corner_coincides_with_dense_inverse() {
        let mut rng = StdRng::seed_from_u64(11);
        let sizes = [3, 2, 2, 3];
        let matrix = utilities::shifted(&utilities::random_block_tridiagonal(&sizes, &mut rng), 1.);
        let partition = BlockPartition::new(&sizes, 10).unwrap();
        let view = BlockView::new(&matrix, &partition).unwrap();

        let sweep = right_connected_sweep(&view, &InversionSettings::default(), true).unwrap();
        let inverse = matrix.clone().try_inverse().unwrap();
        let expected = inverse.slice((0, 0), (3, 3));

        for (inv_val, my_val) in expected.iter().zip(sweep.corner.iter()) {
            approx::assert_relative_eq!(inv_val.re, my_val.re, epsilon = 1e-10);
            approx::assert_relative_eq!(inv_val.im, my_val.im, epsilon = 1e-10);
        }
        assert_eq!(sweep.connected.len(), 4);
        assert_eq!(sweep.connected[0], sweep.corner);
    }

    #[test]
    fn block_columns_coincide_with_dense_inverse() {
        let mut rng = StdRng::seed_from_u64(3);
        let sizes = [2, 2, 3, 1, 2];
        let matrix = utilities::shifted(&utilities::random_block_tridiagonal(&sizes, &mut rng), 0.5);
        let partition = BlockPartition::new(&sizes, 10).unwrap();
        let view = BlockView::new(&matrix, &partition).unwrap();
        let settings = InversionSettings::default();
        let inverse = matrix.clone().try_inverse().unwrap();

        let sweep = left_connected_sweep(&view, &settings, true).unwrap();
        let last = last_block_column(&view, &sweep);
        for (inv_val, my_val) in inverse.slice((0, 8), (10, 2)).iter().zip(last.iter()) {
            approx::assert_relative_eq!(inv_val.re, my_val.re, epsilon = 1e-10);
            approx::assert_relative_eq!(inv_val.im, my_val.im, epsilon = 1e-10);
        }

        let sweep = right_connected_sweep(&view, &settings, true).unwrap();
        let first = first_block_column(&view, &sweep);
        for (inv_val, my_val) in inverse.slice((0, 0), (10, 2)).iter().zip(first.iter()) {
            approx::assert_relative_eq!(inv_val.re, my_val.re, epsilon = 1e-10);
            approx::assert_relative_eq!(inv_val.im, my_val.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn singular_blocks_report_their_index() {
        let sizes = [2, 2];
        let mut matrix = nalgebra::DMatrix::<f64>::identity(4, 4).map(num_complex::Complex::from);
        matrix[(0, 0)] = num_complex::Complex::from(0.);
        matrix[(1, 1)] = num_complex::Complex::from(0.);
        let partition = BlockPartition::new(&sizes, 4).unwrap();
        let view = BlockView::new(&matrix, &partition).unwrap();

        let error = left_connected_sweep(&view, &InversionSettings::default(), false).unwrap_err();
        assert_eq!(error.block(), Some(0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn sweeps_reproduce_the_dense_inverse(
            sizes in prop::collection::vec(1_usize..5, 1..7),
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let matrix = utilities::shifted(&utilities::random_block_tridiagonal(&sizes, &mut rng), 1.);
            let dimension = matrix.nrows();
            let partition = BlockPartition::new(&sizes, dimension).unwrap();
            let view = BlockView::new(&matrix, &partition).unwrap();
            let settings = InversionSettings::default();
            let inverse = matrix.clone().try_inverse().unwrap();
            let (first, last) = (sizes[0], sizes[sizes.len() - 1]);

            let sweep = left_connected_sweep(&view, &settings, true).unwrap();
            let corner = inverse.slice((dimension - last, dimension - last), (last, last)).into_owned();
            prop_assert!(max_modulus(&(&corner - &sweep.corner)) < 1e-9);
            let column = inverse.columns(dimension - last, last).into_owned();
            prop_assert!(max_modulus(&(&column - last_block_column(&view, &sweep))) < 1e-9);

            let sweep = right_connected_sweep(&view, &settings, true).unwrap();
            let corner = inverse.slice((0, 0), (first, first)).into_owned();
            prop_assert!(max_modulus(&(&corner - &sweep.corner)) < 1e-9);
            let column = inverse.columns(0, first).into_owned();
            prop_assert!(max_modulus(&(&column - first_block_column(&view, &sweep))) < 1e-9);
        }
    }
}

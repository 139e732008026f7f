// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Random test matrices shared by the unit tests, integration tests and benches.

use nalgebra::DMatrix;
use num_complex::Complex;
use rand::Rng;

fn random_complex<R: Rng>(rng: &mut R) -> Complex<f64> {
    Complex::new(rng.gen_range(-1_f64..1_f64), rng.gen_range(-1_f64..1_f64))
}

/// A random complex matrix with elements in the unit square
pub fn random_matrix<R: Rng>(rows: usize, columns: usize, rng: &mut R) -> DMatrix<Complex<f64>> {
    DMatrix::from_fn(rows, columns, |_, _| random_complex(rng))
}

/// A random hermitian matrix `A + A†`
pub fn random_hermitian<R: Rng>(dimension: usize, rng: &mut R) -> DMatrix<Complex<f64>> {
    let matrix = random_matrix(dimension, dimension, rng);
    &matrix + matrix.adjoint()
}

/// A random hermitian matrix which vanishes outside the block tridiagonal defined by `sizes`
pub fn random_block_tridiagonal<R: Rng>(sizes: &[usize], rng: &mut R) -> DMatrix<Complex<f64>> {
    let dimension = sizes.iter().sum();
    let mut matrix = DMatrix::zeros(dimension, dimension);
    let mut offset = 0;
    for (index, &size) in sizes.iter().enumerate() {
        let diagonal = random_hermitian(size, rng);
        matrix
            .slice_mut((offset, offset), (size, size))
            .copy_from(&diagonal);
        if let Some(&next) = sizes.get(index + 1) {
            let coupling = random_matrix(size, next, rng);
            matrix
                .slice_mut((offset, offset + size), (size, next))
                .copy_from(&coupling);
            matrix
                .slice_mut((offset + size, offset), (next, size))
                .copy_from(&coupling.adjoint());
        }
        offset += size;
    }
    matrix
}

/// Adds `i * broadening` to the diagonal, moving every eigenvalue off the real axis
pub fn shifted(matrix: &DMatrix<Complex<f64>>, broadening: f64) -> DMatrix<Complex<f64>> {
    let (rows, columns) = matrix.shape();
    matrix + DMatrix::from_diagonal_element(rows, columns, Complex::new(0_f64, broadening))
}

/// A random block tridiagonal test matrix of `number_of_blocks` blocks, each of `block_size`
pub fn construct_test_matrix(block_size: usize, number_of_blocks: usize) -> DMatrix<Complex<f64>> {
    let mut rng = rand::thread_rng();
    shifted(
        &random_block_tridiagonal(&vec![block_size; number_of_blocks], &mut rng),
        1_f64,
    )
}

#[cfg(test)]
mod test {
    use super::{random_block_tridiagonal, random_hermitian};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn random_hermitian_matrices_are_hermitian() {
        let mut rng = StdRng::seed_from_u64(0);
        let matrix = random_hermitian(5, &mut rng);
        assert_eq!(matrix, matrix.adjoint());
    }

    #[test]
    fn block_tridiagonal_matrices_vanish_beyond_the_first_off_diagonal() {
        let mut rng = StdRng::seed_from_u64(0);
        let matrix = random_block_tridiagonal(&[2, 2, 2], &mut rng);
        assert_eq!(matrix, matrix.adjoint());
        assert!(matrix.slice((0, 4), (2, 2)).iter().all(|x| x.norm() == 0.));
        assert!(matrix.slice((4, 0), (2, 2)).iter().all(|x| x.norm() == 0.));
    }
}

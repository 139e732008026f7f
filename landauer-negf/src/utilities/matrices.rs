// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::{InversionSite, SingularMatrixError};
use nalgebra::DMatrix;
use num_complex::Complex;
use serde::Deserialize;

/// Controls when an inversion is treated as singular
#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct InversionSettings {
    /// Smallest admissible ratio between the smallest and largest LU pivot moduli
    pub singularity_tolerance: f64,
}

impl Default for InversionSettings {
    fn default() -> Self {
        Self {
            singularity_tolerance: 1e-14,
        }
    }
}

/// Tests for hermiticity of a matrix
pub fn is_hermitian(matrix: &DMatrix<Complex<f64>>) -> bool {
    if !matrix.is_square() {
        return false;
    }
    let scale = max_modulus(matrix).max(1_f64);
    let adjoint = matrix.adjoint();
    matrix
        .iter()
        .zip(adjoint.iter())
        .all(|(element, adjoint_element)| {
            (element - adjoint_element).norm() / scale < std::f64::EPSILON * 100_f64
        })
}

/// Tests for anti-hermiticity of a matrix
pub fn is_anti_hermitian(matrix: &DMatrix<Complex<f64>>) -> bool {
    if !matrix.is_square() {
        return false;
    }
    let scale = max_modulus(matrix).max(1_f64);
    let adjoint = matrix.adjoint();
    matrix
        .iter()
        .zip(adjoint.iter())
        .all(|(element, adjoint_element)| {
            (element + adjoint_element).norm() / scale < std::f64::EPSILON * 10000_f64
        })
}

/// The largest element modulus, or zero for an empty matrix
pub fn max_modulus(matrix: &DMatrix<Complex<f64>>) -> f64 {
    matrix
        .iter()
        .map(|element| element.norm())
        .fold(0_f64, f64::max)
}

/// Broadening of a self energy, `Γ = i(Σ - Σ†)`
pub fn broadening(self_energy: &DMatrix<Complex<f64>>) -> DMatrix<Complex<f64>> {
    (self_energy - self_energy.adjoint()) * Complex::i()
}

/// Assembles the inverse retarded Green's function `(E + iη) I - H`
pub fn retarded_inverse(
    hamiltonian: &DMatrix<Complex<f64>>,
    energy: f64,
    broadening: f64,
) -> DMatrix<Complex<f64>> {
    let (rows, columns) = hamiltonian.shape();
    DMatrix::from_diagonal_element(rows, columns, Complex::new(energy, broadening)) - hamiltonian
}

/// Inverts `matrix` through an LU factorisation.
///
/// The inversion fails when the smallest pivot modulus falls below
/// `settings.singularity_tolerance` times the largest, or when the result contains
/// non-finite elements. `site` is attached to the error so callers can report which
/// block of a sweep failed.
pub(crate) fn checked_inverse(
    matrix: DMatrix<Complex<f64>>,
    settings: &InversionSettings,
    site: InversionSite,
) -> Result<DMatrix<Complex<f64>>, SingularMatrixError> {
    if matrix.is_empty() {
        return Ok(matrix);
    }
    let singular = SingularMatrixError { site };
    if !matrix.is_square() {
        return Err(singular);
    }

    let lu = matrix.lu();
    let pivots = lu.u().diagonal();
    let (smallest, largest) = pivots.iter().map(|pivot| pivot.norm()).fold(
        (f64::INFINITY, 0_f64),
        |(smallest, largest), modulus| (smallest.min(modulus), largest.max(modulus)),
    );
    if !largest.is_finite() || largest == 0_f64 || smallest <= settings.singularity_tolerance * largest
    {
        return Err(singular);
    }

    let inverse = lu.try_inverse().ok_or(singular)?;
    if inverse
        .iter()
        .any(|element| !element.re.is_finite() || !element.im.is_finite())
    {
        return Err(singular);
    }
    Ok(inverse)
}

#[cfg(test)]
mod test {
    use super::{
        broadening, checked_inverse, is_anti_hermitian, is_hermitian, retarded_inverse,
        InversionSettings,
    };
    use crate::error::InversionSite;
    use nalgebra::{dmatrix, DMatrix};
    use num_complex::Complex;

    #[test]
    fn real_non_hermitian_matrix_returns_false() {
        let matrix = dmatrix![1., 2., 3.; 4., 5., 6.; 7., 8., 9.];
        let matrix = matrix.map(Complex::from);
        assert!(!is_hermitian(&matrix));
    }

    #[test]
    fn real_hermitian_matrix_returns_true() {
        let matrix = dmatrix![1., 2., 3.; 2., 5., 6.; 3., 6., 9.];
        let matrix = matrix.map(Complex::from);
        assert!(is_hermitian(&matrix));
    }

    #[test]
    fn complex_hermitian_matrices_return_true() {
        let matrix = dmatrix![
            Complex::new(1., 0.), Complex::new(1., -2.), Complex::new(0., 0.);
            Complex::new(1., 2.), Complex::new(0., 0.), Complex::new(0., -1.);
            Complex::new(0., 0.), Complex::new(0., 1.), Complex::new(1., 0.)
        ];
        assert!(is_hermitian(&matrix));
    }

    #[test]
    fn anti_hermitian_matrix_returns_true() {
        let matrix = dmatrix![
            Complex::new(0., -1.), Complex::new(2., 1.);
            Complex::new(-2., 1.), Complex::new(0., 0.)
        ];
        assert!(is_anti_hermitian(&matrix));
        assert!(!is_hermitian(&matrix));
    }

    #[test]
    fn broadening_of_a_retarded_self_energy_is_hermitian_and_positive() {
        let sigma = dmatrix![
            Complex::new(0.3, -0.5), Complex::new(0.1, 0.2);
            Complex::new(0.1, 0.2), Complex::new(-0.2, -0.7)
        ];
        let gamma = broadening(&sigma);
        assert!(is_hermitian(&gamma));
        approx::assert_relative_eq!(gamma[(0, 0)].re, 1.0);
        approx::assert_relative_eq!(gamma[(1, 1)].re, 1.4);
    }

    #[test]
    fn retarded_inverse_shifts_the_diagonal() {
        let hamiltonian = DMatrix::from_element(2, 2, Complex::from(1_f64));
        let inverse = retarded_inverse(&hamiltonian, 3., 0.1);
        assert_eq!(inverse[(0, 0)], Complex::new(2., 0.1));
        assert_eq!(inverse[(0, 1)], Complex::new(-1., 0.));
    }

    #[test]
    fn singular_matrices_are_rejected_with_their_site() {
        let matrix = dmatrix![1., 2.; 2., 4.].map(Complex::from);
        let error = checked_inverse(matrix, &InversionSettings::default(), InversionSite::Block(3))
            .unwrap_err();
        assert_eq!(error.block(), Some(3));
    }

    #[test]
    fn regular_matrices_are_inverted() {
        let matrix = dmatrix![2., 1.; 1., 3.].map(Complex::from);
        let inverse = checked_inverse(
            matrix.clone(),
            &InversionSettings::default(),
            InversionSite::Full,
        )
        .unwrap();
        let identity = &matrix * &inverse;
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1. } else { 0. };
                approx::assert_relative_eq!(identity[(i, j)].re, expected, epsilon = 1e-12);
                approx::assert_relative_eq!(identity[(i, j)].im, 0., epsilon = 1e-12);
            }
        }
    }
}

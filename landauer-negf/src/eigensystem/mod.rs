// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Eigensystem
//!
//! Range-restricted spectra of Hermitian matrices. The decomposition itself is nalgebra's
//! [`SymmetricEigen`], this module only orders its output and selects the requested part.

mod range;

pub use range::EigenRange;

use crate::{
    context::SolverContext,
    error::{ErrorCategory, StructuralError},
    utilities::is_hermitian,
};
use miette::Diagnostic;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use num_complex::Complex;

/// Sweeps allowed per unit of matrix dimension before the decomposition is abandoned
const SWEEPS_PER_DIMENSION: usize = 1000;

#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq)]
/// Errors raised by the Hermitian eigensolver
pub enum EigenError {
    /// The matrix or range is unsuitable
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// The eigensolver ran out of sweeps
    #[error("the eigen-decomposition did not converge in {iterations} iterations")]
    #[diagnostic(code(landauer_negf::eigen::non_convergence))]
    Unconverged {
        /// The sweep budget that was exhausted
        iterations: usize,
    },
}

impl EigenError {
    /// Which of the failure categories occurred
    pub fn category(&self) -> ErrorCategory {
        match self {
            EigenError::Structural(_) => ErrorCategory::Structural,
            EigenError::Unconverged { .. } => ErrorCategory::NonConvergence,
        }
    }
}

/// Whether eigenvectors are wanted alongside the eigenvalues
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EigenAction {
    /// Eigenvalues alone
    EigenvaluesOnly,
    /// Eigenvalues and the matching normalised eigenvectors
    EigenvaluesAndVectors,
}

#[derive(Clone, Debug)]
/// The selected part of a spectrum, in ascending order
pub struct EigenSolution {
    /// Eigenvalues, ascending
    pub eigenvalues: DVector<f64>,
    /// Eigenvectors stored column by column in the order of `eigenvalues`
    pub eigenvectors: Option<DMatrix<Complex<f64>>>,
}

/// Memoising eigensolver for a single Hermitian matrix
pub struct HermitianSolver<'a> {
    matrix: &'a DMatrix<Complex<f64>>,
    context: SolverContext<'a>,
    cache: Option<(EigenAction, EigenRange, EigenSolution)>,
    evaluations: usize,
}

impl<'a> HermitianSolver<'a> {
    /// A solver for `matrix`, which must be square and Hermitian
    pub fn new(matrix: &'a DMatrix<Complex<f64>>) -> Result<Self, EigenError> {
        let (rows, columns) = matrix.shape();
        if rows != columns {
            return Err(StructuralError::NonSquare { rows, columns }.into());
        }
        if !is_hermitian(matrix) {
            return Err(StructuralError::NotHermitian.into());
        }
        Ok(Self {
            matrix,
            context: SolverContext::default(),
            cache: None,
            evaluations: 0,
        })
    }

    /// Attach the logging and progress context
    pub fn with_context(mut self, context: SolverContext<'a>) -> Self {
        self.context = context;
        self
    }

    /// The part of the spectrum selected by `range`.
    ///
    /// A stored solution is reused when the range matches and it already holds what
    /// `action` asks for, otherwise the decomposition is repeated.
    pub fn compute(
        &mut self,
        action: EigenAction,
        range: EigenRange,
    ) -> Result<&EigenSolution, EigenError> {
        let reusable = matches!(
            &self.cache,
            Some((cached, cached_range, _)) if *cached_range == range
                && (*cached == action || *cached == EigenAction::EigenvaluesAndVectors)
        );
        if !reusable {
            let solution = decompose(self.matrix, action, range)?;
            self.evaluations += 1;
            if self.context.logging_enabled() {
                tracing::debug!(
                    "Computed {} eigenvalues of a {}x{} matrix",
                    solution.eigenvalues.len(),
                    self.matrix.nrows(),
                    self.matrix.ncols()
                );
            }
            self.cache = Some((action, range, solution));
        }
        match &self.cache {
            Some((_, _, solution)) => Ok(solution),
            None => Err(StructuralError::MalformedRequest("no spectrum was stored".into()).into()),
        }
    }

    /// Ascending eigenvalues in `range`
    pub fn eigenvalues(&mut self, range: EigenRange) -> Result<&DVector<f64>, EigenError> {
        self.compute(EigenAction::EigenvaluesOnly, range)
            .map(|solution| &solution.eigenvalues)
    }

    /// Eigenvectors in `range`, one per column
    pub fn eigenvectors(
        &mut self,
        range: EigenRange,
    ) -> Result<&DMatrix<Complex<f64>>, EigenError> {
        let solution = self.compute(EigenAction::EigenvaluesAndVectors, range)?;
        solution.eigenvectors.as_ref().ok_or_else(|| {
            StructuralError::MalformedRequest("eigenvectors were not computed".into()).into()
        })
    }

    /// The number of decompositions actually run
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

/// Ascending eigenvalues of `matrix` in `range`, without memoisation
pub fn eigenvalues(
    matrix: &DMatrix<Complex<f64>>,
    range: EigenRange,
) -> Result<DVector<f64>, EigenError> {
    HermitianSolver::new(matrix)?
        .with_context(SolverContext::silent())
        .compute(EigenAction::EigenvaluesOnly, range)
        .map(|solution| solution.eigenvalues.clone())
}

fn decompose(
    matrix: &DMatrix<Complex<f64>>,
    action: EigenAction,
    range: EigenRange,
) -> Result<EigenSolution, EigenError> {
    let dimension = matrix.nrows();
    let span = range.indices(dimension)?;
    let iterations = SWEEPS_PER_DIMENSION * dimension.max(1);
    let decomposition = SymmetricEigen::try_new(matrix.clone(), f64::EPSILON, iterations)
        .ok_or(EigenError::Unconverged { iterations })?;

    let mut order = (0..dimension).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        decomposition.eigenvalues[a].total_cmp(&decomposition.eigenvalues[b])
    });

    let selected = match (span, range) {
        (Some((begin, end)), _) => order[begin..=end].to_vec(),
        (None, EigenRange::ValueRange { lower, upper }) => order
            .into_iter()
            .filter(|&index| {
                let value = decomposition.eigenvalues[index];
                value > lower && value <= upper
            })
            .collect(),
        (None, _) => order,
    };

    let eigenvalues = DVector::from_iterator(
        selected.len(),
        selected.iter().map(|&index| decomposition.eigenvalues[index]),
    );
    let eigenvectors = match action {
        EigenAction::EigenvaluesOnly => None,
        EigenAction::EigenvaluesAndVectors => Some(DMatrix::from_fn(
            dimension,
            selected.len(),
            |row, column| decomposition.eigenvectors[(row, selected[column])],
        )),
    };
    Ok(EigenSolution {
        eigenvalues,
        eigenvectors,
    })
}

#[cfg(test)]
mod test {
    use super::{eigenvalues, EigenAction, EigenRange, HermitianSolver};
    use crate::ErrorCategory;
    use nalgebra::{DMatrix, DVector};
    use num_complex::Complex;
    use rand::{rngs::StdRng, SeedableRng};

    fn diagonal(values: &[f64]) -> DMatrix<Complex<f64>> {
        DMatrix::from_diagonal(&DVector::from_iterator(
            values.len(),
            values.iter().map(|&value| Complex::from(value)),
        ))
    }

    #[test]
    fn eigenvalues_are_returned_in_ascending_order() {
        let matrix = diagonal(&[3., -1., 2., 0.5]);
        let values = eigenvalues(&matrix, EigenRange::full()).unwrap();
        approx::assert_relative_eq!(values, DVector::from_vec(vec![-1., 0.5, 2., 3.]));
    }

    #[test]
    fn index_and_value_ranges_select_the_expected_part_of_the_spectrum() {
        let matrix = diagonal(&[5., 1., 4., 2., 3.]);
        let lowest = eigenvalues(&matrix, EigenRange::lowest(2)).unwrap();
        approx::assert_relative_eq!(lowest, DVector::from_vec(vec![1., 2.]));
        let highest = eigenvalues(&matrix, EigenRange::highest(2)).unwrap();
        approx::assert_relative_eq!(highest, DVector::from_vec(vec![4., 5.]));
        let middle = eigenvalues(&matrix, EigenRange::middle(1)).unwrap();
        approx::assert_relative_eq!(middle, DVector::from_vec(vec![3.]));
        // The lower bound is exclusive, the upper inclusive
        let window = eigenvalues(&matrix, EigenRange::values(2., 4.)).unwrap();
        approx::assert_relative_eq!(window, DVector::from_vec(vec![3., 4.]));
    }

    #[test]
    fn eigenvectors_satisfy_the_eigenvalue_equation() {
        let mut rng = StdRng::seed_from_u64(5);
        let matrix = utilities::random_hermitian(6, &mut rng);
        let mut solver = HermitianSolver::new(&matrix).unwrap();
        let solution = solver
            .compute(EigenAction::EigenvaluesAndVectors, EigenRange::span(1, 3))
            .unwrap()
            .clone();
        let vectors = solution.eigenvectors.unwrap();
        assert_eq!(vectors.ncols(), 3);
        for (column, value) in solution.eigenvalues.iter().enumerate() {
            let vector = vectors.column(column).into_owned();
            let residual = &matrix * &vector - vector * Complex::from(*value);
            assert!(residual.iter().all(|element| element.norm() < 1e-9));
        }
    }

    #[test]
    fn repeated_requests_reuse_the_stored_spectrum() {
        let mut rng = StdRng::seed_from_u64(9);
        let matrix = utilities::random_hermitian(4, &mut rng);
        let mut solver = HermitianSolver::new(&matrix).unwrap();
        solver
            .compute(EigenAction::EigenvaluesAndVectors, EigenRange::full())
            .unwrap();
        solver.eigenvalues(EigenRange::full()).unwrap();
        assert_eq!(solver.evaluations(), 1);
        solver.eigenvalues(EigenRange::lowest(2)).unwrap();
        assert_eq!(solver.evaluations(), 2);
        solver.eigenvectors(EigenRange::lowest(2)).unwrap();
        assert_eq!(solver.evaluations(), 3);
    }

    #[test]
    fn non_hermitian_matrices_are_rejected() {
        let mut matrix = diagonal(&[1., 2.]);
        matrix[(0, 1)] = Complex::new(0., 1.);
        let error = HermitianSolver::new(&matrix).err().unwrap();
        assert_eq!(error.category(), ErrorCategory::Structural);
    }
}

// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::StructuralError;
use nalgebra::DMatrix;
use num_complex::Complex;
use std::borrow::Cow;

/// An indexed collection of independent problem matrices
pub trait MatrixSource: Sync {
    /// The number of matrices available
    fn count(&self) -> usize;
    /// The matrix at `index`, for `index < self.count()`
    fn at(&self, index: usize) -> Cow<'_, DMatrix<Complex<f64>>>;
}

/// A source holding exactly one matrix
#[derive(Copy, Clone, Debug)]
pub struct SingleMatrix<'a>(pub &'a DMatrix<Complex<f64>>);

impl MatrixSource for SingleMatrix<'_> {
    fn count(&self) -> usize {
        1
    }

    fn at(&self, _index: usize) -> Cow<'_, DMatrix<Complex<f64>>> {
        Cow::Borrowed(self.0)
    }
}

/// A source over a stored array or vector of matrices
#[derive(Copy, Clone, Debug)]
pub struct MatrixList<'a> {
    matrices: &'a [DMatrix<Complex<f64>>],
    count: usize,
}

impl<'a> MatrixList<'a> {
    /// Every matrix in `matrices`
    pub fn new(matrices: &'a [DMatrix<Complex<f64>>]) -> Self {
        Self {
            matrices,
            count: matrices.len(),
        }
    }

    /// The leading `count` matrices of `matrices`
    pub fn with_count(
        matrices: &'a [DMatrix<Complex<f64>>],
        count: usize,
    ) -> Result<Self, StructuralError> {
        if count > matrices.len() {
            return Err(StructuralError::MalformedRequest(format!(
                "requested {} matrices from a list of {}",
                count,
                matrices.len()
            )));
        }
        Ok(Self { matrices, count })
    }
}

impl MatrixSource for MatrixList<'_> {
    fn count(&self) -> usize {
        self.count
    }

    fn at(&self, index: usize) -> Cow<'_, DMatrix<Complex<f64>>> {
        Cow::Borrowed(&self.matrices[index])
    }
}

/// A source producing each matrix on demand from its index
pub struct MatrixGenerator<F> {
    count: usize,
    generator: F,
}

impl<F> MatrixGenerator<F>
where
    F: Fn(usize) -> DMatrix<Complex<f64>> + Sync,
{
    /// `count` matrices, the `i`th being `generator(i)`
    pub fn new(count: usize, generator: F) -> Self {
        Self { count, generator }
    }
}

impl<F> MatrixSource for MatrixGenerator<F>
where
    F: Fn(usize) -> DMatrix<Complex<f64>> + Sync,
{
    fn count(&self) -> usize {
        self.count
    }

    fn at(&self, index: usize) -> Cow<'_, DMatrix<Complex<f64>>> {
        Cow::Owned((self.generator)(index))
    }
}

#[cfg(test)]
mod test {
    use super::{MatrixGenerator, MatrixList, MatrixSource, SingleMatrix};
    use nalgebra::DMatrix;
    use num_complex::Complex;

    #[test]
    fn every_adapter_reports_its_count_and_indexes_in_order() {
        let matrices = (0..3)
            .map(|index| DMatrix::from_element(1, 1, Complex::from(index as f64)))
            .collect::<Vec<_>>();

        let single = SingleMatrix(&matrices[2]);
        assert_eq!(single.count(), 1);
        assert_eq!(single.at(0)[(0, 0)], Complex::from(2.));

        let list = MatrixList::new(&matrices);
        assert_eq!(list.count(), 3);
        assert_eq!(list.at(1)[(0, 0)], Complex::from(1.));

        let generated =
            MatrixGenerator::new(4, |index| DMatrix::from_element(1, 1, Complex::from(index as f64)));
        assert_eq!(generated.count(), 4);
        assert_eq!(generated.at(3)[(0, 0)], Complex::from(3.));
    }

    #[test]
    fn explicit_counts_cannot_exceed_the_list() {
        let matrices = vec![DMatrix::<Complex<f64>>::zeros(1, 1); 2];
        assert_eq!(MatrixList::with_count(&matrices, 1).unwrap().count(), 1);
        assert!(MatrixList::with_count(&matrices, 3).is_err());
    }
}

// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::StructuralError;
use std::cmp::Ordering;

/// The part of a Hermitian spectrum to compute.
///
/// Index spans are zero based and inclusive at both ends. Negative indices count from the
/// top of the spectrum, so `-1` is the largest eigenvalue. Middle spans are offsets about
/// the centre index `size / 2`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EigenRange {
    /// Every eigenvalue
    Full,
    /// Eigenvalues `begin..=end` in ascending order
    IndexSpan {
        /// First index, negative counts from the end
        begin: isize,
        /// Last index, negative counts from the end
        end: isize,
    },
    /// Eigenvalues `size / 2 + begin ..= size / 2 + end`
    MiddleSpan {
        /// Offset of the first index from the centre
        begin: isize,
        /// Offset of the last index from the centre
        end: isize,
    },
    /// Eigenvalues in the half open interval `(lower, upper]`
    ValueRange {
        /// Exclusive lower bound
        lower: f64,
        /// Inclusive upper bound
        upper: f64,
    },
}

impl Default for EigenRange {
    fn default() -> Self {
        EigenRange::Full
    }
}

impl EigenRange {
    /// The whole spectrum
    pub fn full() -> Self {
        EigenRange::Full
    }

    /// An explicit inclusive index span
    pub fn span(begin: isize, end: isize) -> Self {
        EigenRange::IndexSpan { begin, end }
    }

    /// The `count` lowest eigenvalues
    pub fn lowest(count: usize) -> Self {
        EigenRange::IndexSpan {
            begin: 0,
            end: count as isize - 1,
        }
    }

    /// The `count` highest eigenvalues
    pub fn highest(count: usize) -> Self {
        EigenRange::IndexSpan {
            begin: -(count as isize),
            end: -1,
        }
    }

    /// `count` eigenvalues centred on the middle of the spectrum
    pub fn middle(count: usize) -> Self {
        let count = count as isize;
        EigenRange::MiddleSpan {
            begin: -(count - 1) / 2,
            end: count / 2,
        }
    }

    /// An explicit span of offsets about the centre of the spectrum
    pub fn middle_span(begin: isize, end: isize) -> Self {
        EigenRange::MiddleSpan { begin, end }
    }

    /// Eigenvalues in `(lower, upper]`
    pub fn values(lower: f64, upper: f64) -> Self {
        EigenRange::ValueRange { lower, upper }
    }

    /// Resolves middle spans and negative indices against a matrix of dimension `size`.
    ///
    /// The result is `Full`, `ValueRange`, or an `IndexSpan` whose indices are both
    /// non-negative. The span is not checked against `size`, see [`EigenRange::indices`].
    pub fn fit_to_size(self, size: usize) -> Self {
        match self.wrapped_span(size) {
            Some((begin, end)) => EigenRange::IndexSpan { begin, end },
            None => self,
        }
    }

    fn wrapped_span(self, size: usize) -> Option<(isize, isize)> {
        let size = size as isize;
        let (begin, end) = match self {
            EigenRange::Full | EigenRange::ValueRange { .. } => return None,
            EigenRange::MiddleSpan { begin, end } => (begin + size / 2, end + size / 2),
            EigenRange::IndexSpan { begin, end } => (begin, end),
        };
        let wrap = |index: isize| {
            if index < 0 && size > 0 {
                index.rem_euclid(size)
            } else {
                index
            }
        };
        Some((wrap(begin), wrap(end)))
    }

    /// The concrete inclusive index span for a matrix of dimension `size`, or `None` for a
    /// value range which can only be resolved against the eigenvalues themselves.
    pub fn indices(self, size: usize) -> Result<Option<(usize, usize)>, StructuralError> {
        match self {
            EigenRange::Full if size == 0 => Err(StructuralError::MalformedRequest(
                "an empty matrix has no spectrum".into(),
            )),
            EigenRange::Full => Ok(Some((0, size - 1))),
            EigenRange::ValueRange { lower, upper } => {
                if lower.partial_cmp(&upper) != Some(Ordering::Less) {
                    return Err(StructuralError::MalformedRequest(format!(
                        "eigenvalue window ({}, {}] is empty",
                        lower, upper
                    )));
                }
                Ok(None)
            }
            EigenRange::IndexSpan { .. } | EigenRange::MiddleSpan { .. } => {
                let (begin, end) = self.wrapped_span(size).unwrap_or((0, -1));
                if begin < 0 || end < begin || end as usize >= size {
                    return Err(StructuralError::MalformedRequest(format!(
                        "eigenvalue span {}..={} does not fit a spectrum of {} values",
                        begin, end, size
                    )));
                }
                Ok(Some((begin as usize, end as usize)))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::EigenRange;

    #[test]
    fn lowest_and_highest_resolve_to_the_spectrum_ends() {
        assert_eq!(EigenRange::lowest(3).indices(10).unwrap(), Some((0, 2)));
        assert_eq!(EigenRange::highest(3).fit_to_size(10), EigenRange::span(7, 9));
        assert_eq!(EigenRange::highest(3).indices(10).unwrap(), Some((7, 9)));
    }

    #[test]
    fn middle_spans_are_centred_on_half_the_size() {
        assert_eq!(EigenRange::middle(3), EigenRange::middle_span(-1, 1));
        assert_eq!(EigenRange::middle(3).indices(10).unwrap(), Some((4, 6)));
        assert_eq!(EigenRange::middle(4), EigenRange::middle_span(-1, 2));
        assert_eq!(EigenRange::middle(4).indices(10).unwrap(), Some((4, 7)));
        assert_eq!(EigenRange::middle(1).indices(5).unwrap(), Some((2, 2)));
    }

    #[test]
    fn full_and_value_ranges_are_unchanged_by_fitting() {
        assert_eq!(EigenRange::full().fit_to_size(4), EigenRange::Full);
        let window = EigenRange::values(-1., 1.);
        assert_eq!(window.fit_to_size(4), window);
        assert_eq!(window.indices(4).unwrap(), None);
    }

    #[test]
    fn spans_outside_the_spectrum_are_rejected() {
        assert!(EigenRange::lowest(5).indices(4).is_err());
        assert!(EigenRange::span(3, 1).indices(4).is_err());
        assert!(EigenRange::values(1., -1.).indices(4).is_err());
        assert!(EigenRange::full().indices(0).is_err());
    }
}

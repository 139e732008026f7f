// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::StructuralError;
use std::ops::Range;

/// Builder for an [`EnergySpace`]
pub struct EnergySpaceBuilder<EnergyRange> {
    number_of_points: usize,
    energy_range: EnergyRange,
    broadening: f64,
}

impl EnergySpaceBuilder<()> {
    /// A builder with no range and no points
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            number_of_points: 0,
            energy_range: (),
            broadening: 0.,
        }
    }
}

impl<EnergyRange> EnergySpaceBuilder<EnergyRange> {
    /// The number of grid points, including both end points
    pub fn with_number_of_points(self, number_of_points: usize) -> Self {
        Self {
            number_of_points,
            ..self
        }
    }

    /// The imaginary part added to every energy
    pub fn with_broadening(self, broadening: f64) -> Self {
        Self { broadening, ..self }
    }

    /// The closed energy interval spanned by the grid
    pub fn with_energy_range(self, energy_range: Range<f64>) -> EnergySpaceBuilder<Range<f64>> {
        EnergySpaceBuilder {
            number_of_points: self.number_of_points,
            energy_range,
            broadening: self.broadening,
        }
    }
}

impl EnergySpaceBuilder<Range<f64>> {
    /// A uniform grid from `start` to `end` inclusive
    pub fn build(self) -> Result<EnergySpace, StructuralError> {
        let Range { start, end } = self.energy_range;
        if !(start.is_finite() && end.is_finite()) || end < start {
            return Err(StructuralError::MalformedRequest(format!(
                "the energy range {}..{} is not ordered",
                start, end
            )));
        }
        if self.number_of_points == 0 || (self.number_of_points == 1 && end > start) {
            return Err(StructuralError::MalformedRequest(format!(
                "{} points cannot span the energy range {}..{}",
                self.number_of_points, start, end
            )));
        }
        if self.broadening < 0. {
            return Err(StructuralError::MalformedRequest(
                "the energy broadening must be non-negative".into(),
            ));
        }
        let step = if self.number_of_points > 1 {
            (end - start) / (self.number_of_points - 1) as f64
        } else {
            0.
        };
        let points = (0..self.number_of_points)
            .map(|index| start + step * index as f64)
            .collect();
        Ok(EnergySpace {
            points,
            broadening: self.broadening,
        })
    }
}

/// A uniform real energy grid with a shared broadening
#[derive(Clone, Debug, PartialEq)]
pub struct EnergySpace {
    points: Vec<f64>,
    broadening: f64,
}

impl EnergySpace {
    /// The number of grid points
    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    /// The energy at `index`
    pub fn energy_at(&self, index: usize) -> f64 {
        self.points[index]
    }

    /// The grid points, ascending
    pub fn points(&self) -> impl Iterator<Item = &f64> + '_ {
        self.points.iter()
    }

    /// The imaginary part added to every energy
    pub fn broadening(&self) -> f64 {
        self.broadening
    }
}

#[cfg(test)]
mod test {
    use super::EnergySpaceBuilder;

    #[test]
    fn the_grid_includes_both_end_points() {
        let space = EnergySpaceBuilder::new()
            .with_number_of_points(5)
            .with_energy_range(-1.0..1.0)
            .with_broadening(1e-6)
            .build()
            .unwrap();
        assert_eq!(space.number_of_points(), 5);
        for (point, expected) in space.points().zip([-1., -0.5, 0., 0.5, 1.]) {
            approx::assert_relative_eq!(*point, expected);
        }
        assert_eq!(space.broadening(), 1e-6);
    }

    #[test]
    fn a_single_point_needs_a_degenerate_range() {
        let single = EnergySpaceBuilder::new()
            .with_number_of_points(1)
            .with_energy_range(0.3..0.3)
            .build()
            .unwrap();
        assert_eq!(single.energy_at(0), 0.3);
        assert!(EnergySpaceBuilder::new()
            .with_number_of_points(1)
            .with_energy_range(0.0..1.0)
            .build()
            .is_err());
    }

    #[test]
    fn reversed_ranges_are_rejected() {
        assert!(EnergySpaceBuilder::new()
            .with_number_of_points(3)
            .with_energy_range(1.0..-1.0)
            .build()
            .is_err());
    }
}

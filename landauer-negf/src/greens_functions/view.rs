// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::BlockPartition;
use crate::error::StructuralError;
use nalgebra::{DMatrix, DMatrixSlice};
use num_complex::Complex;

/// A borrowed window onto a block-partitioned matrix.
///
/// The view addresses a rectangle of blocks, `row_blocks` by `column_blocks` starting from
/// block `(row_start, column_start)`. Block indices passed to the view are relative to the
/// window and may be negative. The backing matrix and partition are only borrowed, so the
/// view can never outlive them.
#[derive(Clone, Copy, Debug)]
pub struct BlockView<'a> {
    matrix: &'a DMatrix<Complex<f64>>,
    partition: &'a BlockPartition,
    row_start: usize,
    column_start: usize,
    row_blocks: usize,
    column_blocks: usize,
}

impl<'a> BlockView<'a> {
    /// A view over every block of `partition`
    pub fn new(
        matrix: &'a DMatrix<Complex<f64>>,
        partition: &'a BlockPartition,
    ) -> Result<Self, StructuralError> {
        let (rows, columns) = matrix.shape();
        if partition.dimension() > rows {
            return Err(StructuralError::PartitionExceedsDimension {
                sum: partition.dimension(),
                dimension: rows,
            });
        }
        if partition.column_dimension() > columns {
            return Err(StructuralError::PartitionExceedsDimension {
                sum: partition.column_dimension(),
                dimension: columns,
            });
        }
        Ok(Self {
            matrix,
            partition,
            row_start: 0,
            column_start: 0,
            row_blocks: partition.number_of_blocks(),
            column_blocks: partition.number_of_column_blocks(),
        })
    }

    /// A window of `row_blocks` by `column_blocks` blocks, starting at `(row, column)`
    /// relative to this view
    pub fn sub_view(
        &self,
        row: isize,
        column: isize,
        row_blocks: usize,
        column_blocks: usize,
    ) -> Result<BlockView<'a>, StructuralError> {
        let row = super::partition::resolve_against(row, self.row_blocks)?;
        let column = super::partition::resolve_against(column, self.column_blocks)?;
        if row_blocks == 0 || column_blocks == 0 {
            return Err(StructuralError::EmptyPartition);
        }
        if row + row_blocks > self.row_blocks || column + column_blocks > self.column_blocks {
            return Err(StructuralError::MalformedRequest(format!(
                "a {}x{} window at block ({}, {}) does not fit in a {}x{} view",
                row_blocks, column_blocks, row, column, self.row_blocks, self.column_blocks
            )));
        }
        Ok(BlockView {
            row_start: self.row_start + row,
            column_start: self.column_start + column,
            row_blocks,
            column_blocks,
            ..*self
        })
    }

    /// Block `(row, column)` of the view, accepting negative indices
    pub fn block(&self, row: isize, column: isize) -> Result<DMatrixSlice<'a, Complex<f64>>, StructuralError> {
        let row = super::partition::resolve_against(row, self.row_blocks)?;
        let column = super::partition::resolve_against(column, self.column_blocks)?;
        Ok(self.block_at(row, column))
    }

    pub(crate) fn block_at(&self, row: usize, column: usize) -> DMatrixSlice<'a, Complex<f64>> {
        let row = self.row_start + row;
        let column = self.column_start + column;
        let matrix: &'a DMatrix<Complex<f64>> = self.matrix;
        matrix.slice(
            (
                self.partition.offset_of(row),
                self.partition.column_offset_of(column),
            ),
            (
                self.partition.size_of(row),
                self.partition.column_size_of(column),
            ),
        )
    }

    /// The number of block rows in the view
    pub fn number_of_blocks(&self) -> usize {
        self.row_blocks
    }

    /// The number of block columns in the view
    pub fn number_of_column_blocks(&self) -> usize {
        self.column_blocks
    }

    /// Rows in block `index`, relative to the view
    pub(crate) fn size_of(&self, index: usize) -> usize {
        self.partition.size_of(self.row_start + index)
    }

    /// The first row of block `index`, relative to the first row of the view
    pub(crate) fn offset_of(&self, index: usize) -> usize {
        self.partition.offset_of(self.row_start + index) - self.partition.offset_of(self.row_start)
    }

    /// Rows spanned by the view
    pub fn rows(&self) -> usize {
        self.offset_of(self.row_blocks - 1) + self.size_of(self.row_blocks - 1)
    }

    /// Columns spanned by the view
    pub fn columns(&self) -> usize {
        let last = self.column_start + self.column_blocks - 1;
        self.partition.column_offset_of(last) + self.partition.column_size_of(last)
            - self.partition.column_offset_of(self.column_start)
    }

    /// Whether the view is square with matching row and column blocks, as the recursive
    /// sweeps require
    pub fn is_block_square(&self) -> bool {
        self.row_blocks == self.column_blocks
            && (0..self.row_blocks).all(|index| {
                self.partition.size_of(self.row_start + index)
                    == self.partition.column_size_of(self.column_start + index)
            })
    }

    /// The region spanned by the view as a contiguous slice
    pub fn as_slice(&self) -> DMatrixSlice<'a, Complex<f64>> {
        let matrix: &'a DMatrix<Complex<f64>> = self.matrix;
        matrix.slice(
            (
                self.partition.offset_of(self.row_start),
                self.partition.column_offset_of(self.column_start),
            ),
            (self.rows(), self.columns()),
        )
    }
}

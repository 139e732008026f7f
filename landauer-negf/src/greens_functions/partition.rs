// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Block partitions of a matrix.
//!
//! A [`BlockPartition`] slices the leading rows and columns of a matrix into contiguous
//! blocks. Blocks are addressed by a signed index, where negative values count back from
//! the last block so `-1` is always the bottom-right corner. A partition never changes
//! after construction: re-partitioning a matrix means building a new one.

use crate::error::StructuralError;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Row and column block sizes, with their prefix-sum offsets
pub struct BlockPartition {
    row_sizes: Vec<usize>,
    column_sizes: Vec<usize>,
    row_offsets: Vec<usize>,
    column_offsets: Vec<usize>,
}

impl BlockPartition {
    /// A square partition with identical row and column blocks.
    ///
    /// Fails if `sizes` is empty, contains a zero, or sums to more than `dimension`.
    pub fn new(sizes: &[usize], dimension: usize) -> Result<Self, StructuralError> {
        Self::rectangular(sizes, sizes, (dimension, dimension))
    }

    /// A partition with independent row and column blocks, for a matrix of the given shape
    pub fn rectangular(
        row_sizes: &[usize],
        column_sizes: &[usize],
        shape: (usize, usize),
    ) -> Result<Self, StructuralError> {
        validate(row_sizes, shape.0)?;
        validate(column_sizes, shape.1)?;
        Ok(Self {
            row_sizes: row_sizes.to_vec(),
            column_sizes: column_sizes.to_vec(),
            row_offsets: prefix_sum(row_sizes),
            column_offsets: prefix_sum(column_sizes),
        })
    }

    /// A partition with a single block spanning the whole matrix
    pub fn single(dimension: usize) -> Self {
        Self {
            row_sizes: vec![dimension],
            column_sizes: vec![dimension],
            row_offsets: vec![0, dimension],
            column_offsets: vec![0, dimension],
        }
    }

    /// `number_of_blocks` square blocks, each of `block_size`
    pub fn uniform(block_size: usize, number_of_blocks: usize) -> Result<Self, StructuralError> {
        let sizes = vec![block_size; number_of_blocks];
        Self::new(&sizes, block_size * number_of_blocks)
    }

    /// Accepts `sizes` if they fit in `dimension`, otherwise falls back to a single block
    /// spanning the matrix.
    ///
    /// This is the lenient entry point for callers that receive block sizes from user input.
    pub fn fit(sizes: &[usize], dimension: usize) -> Self {
        match Self::new(sizes, dimension) {
            Ok(partition) => partition,
            Err(error) => {
                tracing::warn!(
                    "Block sizes {:?} rejected ({}), using a single {}x{} block",
                    sizes,
                    error,
                    dimension,
                    dimension
                );
                Self::single(dimension)
            }
        }
    }

    /// The number of row blocks
    pub fn number_of_blocks(&self) -> usize {
        self.row_sizes.len()
    }

    /// The number of column blocks
    pub fn number_of_column_blocks(&self) -> usize {
        self.column_sizes.len()
    }

    /// Whether the row and column blocks coincide
    pub fn is_square(&self) -> bool {
        self.row_sizes == self.column_sizes
    }

    /// Resolves a signed row block index into a zero-based one
    pub fn resolve(&self, index: isize) -> Result<usize, StructuralError> {
        resolve_against(index, self.row_sizes.len())
    }

    /// Resolves a signed column block index into a zero-based one
    pub fn resolve_column(&self, index: isize) -> Result<usize, StructuralError> {
        resolve_against(index, self.column_sizes.len())
    }

    /// The first row of block `index`
    pub fn offset(&self, index: isize) -> Result<usize, StructuralError> {
        Ok(self.row_offsets[self.resolve(index)?])
    }

    /// The number of rows in block `index`
    pub fn size(&self, index: isize) -> Result<usize, StructuralError> {
        Ok(self.row_sizes[self.resolve(index)?])
    }

    /// The first column of block `index`
    pub fn column_offset(&self, index: isize) -> Result<usize, StructuralError> {
        Ok(self.column_offsets[self.resolve_column(index)?])
    }

    /// The number of columns in block `index`
    pub fn column_size(&self, index: isize) -> Result<usize, StructuralError> {
        Ok(self.column_sizes[self.resolve_column(index)?])
    }

    /// Row block sizes
    pub fn sizes(&self) -> &[usize] {
        &self.row_sizes
    }

    /// Column block sizes
    pub fn column_sizes(&self) -> &[usize] {
        &self.column_sizes
    }

    /// Rows covered by the partition
    pub fn dimension(&self) -> usize {
        self.row_offsets[self.row_sizes.len()]
    }

    /// Columns covered by the partition
    pub fn column_dimension(&self) -> usize {
        self.column_offsets[self.column_sizes.len()]
    }

    // Unchecked accessors for indices that were resolved already
    pub(crate) fn offset_of(&self, index: usize) -> usize {
        self.row_offsets[index]
    }

    pub(crate) fn size_of(&self, index: usize) -> usize {
        self.row_sizes[index]
    }

    pub(crate) fn column_offset_of(&self, index: usize) -> usize {
        self.column_offsets[index]
    }

    pub(crate) fn column_size_of(&self, index: usize) -> usize {
        self.column_sizes[index]
    }
}

fn validate(sizes: &[usize], dimension: usize) -> Result<(), StructuralError> {
    if sizes.is_empty() {
        return Err(StructuralError::EmptyPartition);
    }
    if let Some(index) = sizes.iter().position(|&size| size == 0) {
        return Err(StructuralError::ZeroSizedBlock { index });
    }
    let sum: usize = sizes.iter().sum();
    if sum > dimension {
        return Err(StructuralError::PartitionExceedsDimension { sum, dimension });
    }
    Ok(())
}

fn prefix_sum(sizes: &[usize]) -> Vec<usize> {
    std::iter::once(0)
        .chain(sizes.iter().scan(0, |total, &size| {
            *total += size;
            Some(*total)
        }))
        .collect()
}

pub(crate) fn resolve_against(index: isize, count: usize) -> Result<usize, StructuralError> {
    let out_of_range = StructuralError::BlockIndexOutOfRange { index, count };
    let signed_count = isize::try_from(count).map_err(|_| out_of_range.clone())?;
    let resolved = if index < 0 { signed_count + index } else { index };
    if (0..signed_count).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err(out_of_range)
    }
}

#[cfg(test)]
mod test {
    use super::BlockPartition;
    use crate::error::StructuralError;
    use proptest::prelude::*;

    #[test]
    fn negative_indices_count_from_the_end() {
        let partition = BlockPartition::new(&[2, 3, 4], 9).unwrap();
        assert_eq!(partition.resolve(-1).unwrap(), 2);
        assert_eq!(partition.resolve(-3).unwrap(), 0);
        assert_eq!(partition.offset(-1).unwrap(), 5);
        assert_eq!(partition.size(-2).unwrap(), 3);
    }

    #[test]
    fn indices_outside_the_partition_are_rejected() {
        let partition = BlockPartition::new(&[2, 3, 4], 9).unwrap();
        assert_eq!(
            partition.resolve(3),
            Err(StructuralError::BlockIndexOutOfRange { index: 3, count: 3 })
        );
        assert!(partition.resolve(-4).is_err());
    }

    #[test]
    fn oversized_partitions_are_rejected() {
        assert_eq!(
            BlockPartition::new(&[4, 4, 4], 10),
            Err(StructuralError::PartitionExceedsDimension {
                sum: 12,
                dimension: 10
            })
        );
        assert_eq!(
            BlockPartition::new(&[], 10),
            Err(StructuralError::EmptyPartition)
        );
        assert_eq!(
            BlockPartition::new(&[2, 0, 2], 10),
            Err(StructuralError::ZeroSizedBlock { index: 1 })
        );
    }

    #[test]
    fn fitting_an_oversized_partition_falls_back_to_one_block() {
        let partition = BlockPartition::fit(&[4, 4, 4], 10);
        assert_eq!(partition.number_of_blocks(), 1);
        assert_eq!(partition.size(0).unwrap(), 10);
    }

    #[test]
    fn undersized_partitions_cover_the_leading_submatrix() {
        let partition = BlockPartition::new(&[2, 2, 2, 2], 10).unwrap();
        assert_eq!(partition.dimension(), 8);
        assert_eq!(partition.offset(-1).unwrap(), 6);
    }

    proptest! {
        #[test]
        fn offsets_are_prefix_sums_of_sizes(sizes in prop::collection::vec(1_usize..6, 1..12)) {
            let dimension: usize = sizes.iter().sum();
            let partition = BlockPartition::new(&sizes, dimension).unwrap();
            let mut running = 0;
            for (index, size) in sizes.iter().enumerate() {
                prop_assert_eq!(partition.offset(index as isize).unwrap(), running);
                prop_assert_eq!(partition.size(index as isize).unwrap(), *size);
                running += size;
            }
            prop_assert_eq!(partition.dimension(), dimension);
        }

        #[test]
        fn negative_and_positive_indices_agree(
            sizes in prop::collection::vec(1_usize..6, 1..12),
            index in 0_usize..12,
        ) {
            let count = sizes.len();
            prop_assume!(index < count);
            let partition = BlockPartition::new(&sizes, sizes.iter().sum()).unwrap();
            let negative = index as isize - count as isize;
            prop_assert_eq!(partition.resolve(negative).unwrap(), index);
        }
    }
}

// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use landauer_negf::context::SolverContext;
use landauer_negf::greens_functions::{BlockPartition, GreensMode, GreensSolver};
use utilities::construct_test_matrix;

const BLOCK_SIZE: usize = 4;

pub fn bench_last_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("last_block");

    for number_of_blocks in [8, 16, 32, 64, 128].into_iter() {
        let matrix = construct_test_matrix(BLOCK_SIZE, number_of_blocks);
        let partition = BlockPartition::uniform(BLOCK_SIZE, number_of_blocks).unwrap();

        group.bench_with_input(
            BenchmarkId::new("recursive", number_of_blocks),
            &number_of_blocks,
            |b, _| {
                b.iter(|| {
                    let mut solver = GreensSolver::new(black_box(&matrix), &partition)
                        .unwrap()
                        .with_context(SolverContext::silent());
                    solver.compute(GreensMode::LastBlock).unwrap().clone()
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("dense", number_of_blocks),
            &number_of_blocks,
            |b, _| b.iter(|| black_box(&matrix).clone().try_inverse().unwrap()),
        );
    }
}

pub fn bench_last_block_column(c: &mut Criterion) {
    let mut group = c.benchmark_group("last_block_column");

    for number_of_blocks in [8, 16, 32, 64].into_iter() {
        let matrix = construct_test_matrix(BLOCK_SIZE, number_of_blocks);
        let partition = BlockPartition::uniform(BLOCK_SIZE, number_of_blocks).unwrap();

        group.bench_with_input(
            BenchmarkId::new("recursive", number_of_blocks),
            &number_of_blocks,
            |b, _| {
                b.iter(|| {
                    let mut solver = GreensSolver::new(black_box(&matrix), &partition)
                        .unwrap()
                        .with_context(SolverContext::silent());
                    solver.compute(GreensMode::LastBlockColumn).unwrap().clone()
                })
            },
        );
    }
}

criterion_group!(benches, bench_last_block, bench_last_block_column);
criterion_main!(benches);

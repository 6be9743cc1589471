//! Coverage Operation Benchmarks
//!
//! Benchmarks for sampling, both chain passes and merging readings.
//!
//! Run with: `cargo bench --bench sample_ops`

#![allow(clippy::unwrap_used)]

use bucket::axis_utils::{self, MsbOptions};
use bucket::{
    Bucket, BucketResult, Chain, Children, CoverConfig, CoverTop, CoverageContext, Covergroup,
    Coverpoint, MergeReading, PointDefinition, PointReader, PointSetup, PuppetReading,
    RunCounters,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

#[derive(Clone, Copy)]
struct Transaction {
    opcode: u8,
    size: i64,
    write: bool,
}

struct Opcodes {
    count: u8,
}

impl PointDefinition<Transaction> for Opcodes {
    fn setup(&mut self, setup: &mut PointSetup, _: &CoverageContext) -> BucketResult<()> {
        setup.add_axis("opcode", (0..self.count).collect::<Vec<u8>>(), "Opcode")?;
        setup.add_axis("size", axis_utils::msb(12, MsbOptions::default())?, "Transfer size")?;
        setup.add_axis("dir", axis_utils::read_write(), "Direction")
    }

    fn sample(&mut self, bucket: &mut Bucket<'_>, txn: &Transaction) -> BucketResult<()> {
        bucket
            .set("opcode", txn.opcode % self.count)?
            .set("size", txn.size)?
            .set("dir", txn.write)?;
        bucket.hit()
    }
}

/// `points` sibling coverpoints of `opcodes` opcodes each, under one group
fn model(points: usize, opcodes: u8) -> CoverTop<Transaction> {
    let setup = move |children: &mut Children<Transaction>,
                      ctx: &CoverageContext|
          -> BucketResult<()> {
        for i in 0..points {
            children.add_coverpoint(Coverpoint::new(
                format!("ops_{i:03}"),
                "",
                Opcodes { count: opcodes },
                ctx,
            )?)?;
        }
        Ok(())
    };
    let root = Covergroup::new("bus", "", setup, &CoverageContext::new()).unwrap();
    CoverTop::new(root, CoverConfig::default())
}

fn traffic(n: usize) -> Vec<Transaction> {
    (0..n)
        .map(|i| Transaction {
            opcode: (i * 7 % 251) as u8,
            size: ((i * 131) % 4095) as i64,
            write: i % 3 == 0,
        })
        .collect()
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");

    for count in [100, 1000, 10_000] {
        let trace = traffic(count);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{count}_traces")),
            &trace,
            |bench, trace| {
                let mut top = model(4, 16);
                bench.iter(|| {
                    for txn in trace {
                        top.sample(black_box(txn)).unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");

    for points in [1, 8, 32] {
        let mut top = model(points, 32);
        for txn in traffic(1000) {
            top.sample(&txn).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("definition", points), &top, |bench, top| {
            bench.iter(|| black_box(Chain::definition(black_box(top)).def_sha()));
        });
        group.bench_with_input(BenchmarkId::new("run", points), &top, |bench, top| {
            bench.iter(|| {
                let chain: Chain<'_, RunCounters, Transaction> = Chain::run(black_box(top));
                black_box(chain.end.hits)
            });
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    let readings: Vec<PuppetReading> = (0..16)
        .map(|seed| {
            let mut top = model(8, 32);
            for txn in traffic(500 + seed * 10) {
                top.sample(&txn).unwrap();
            }
            PointReader::new("bench").read(&top)
        })
        .collect();

    for count in [2, 4, 16] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{count}_readings")),
            &count,
            |bench, &n| {
                bench.iter(|| {
                    let others: Vec<&dyn bucket::Reading> = readings[1..n]
                        .iter()
                        .map(|r| r as &dyn bucket::Reading)
                        .collect();
                    let merged = MergeReading::new(&readings[0], &others).unwrap();
                    black_box(merged.bucket_hits().len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_sampling, bench_chain, bench_merge);
criterion_main!(benches);

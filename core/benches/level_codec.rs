use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fluo_core::{GeneratorConfig, LevelGenerator, RandomLevelGenerator, decode, encode};

const SIDES: [u8; 3] = [5, 8, 16];

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_codec");
    for side in SIDES {
        let config = GeneratorConfig::new(side, side, 8);
        let level = RandomLevelGenerator::new(u64::from(side)).generate(config);
        let token = encode(&level);

        group.bench_with_input(BenchmarkId::new("encode", side), &level, |b, level| {
            b.iter(|| encode(black_box(level)))
        });
        group.bench_with_input(BenchmarkId::new("decode", side), &token, |b, token| {
            b.iter(|| decode(black_box(token)))
        });
    }
    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for side in SIDES {
        let config = GeneratorConfig::new(side, side, 8);
        group.bench_function(BenchmarkId::from_parameter(side), |b| {
            let mut seed = 0u64;
            b.iter(|| {
                seed = seed.wrapping_add(1);
                RandomLevelGenerator::new(seed).generate(black_box(config))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_codec, bench_generate);
criterion_main!(benches);

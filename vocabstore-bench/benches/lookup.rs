//! The BPE merge loop looks up the rank of candidate byte spans far more often than anything else,
//! and most of those spans are not tokens.  These benchmarks measure hits and misses in both
//! directions, plus the one-time cost of parsing a rank file, at a few vocabulary sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vocabstore::Vocabulary;
use vocabstore_bench::{synthetic_rank_file, synthetic_token};

const SIZES: &[usize] = &[1_000, 50_000, 200_000];

pub fn construction_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parse rank file");
    group.sample_size(10);

    for &size in SIZES {
        let text = synthetic_rank_file(size);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| Vocabulary::from_reader(text.as_bytes()).unwrap())
        });
    }
}

pub fn lookup_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lookup");

    for &size in SIZES {
        let vocab = Vocabulary::from_reader(synthetic_rank_file(size).as_bytes()).unwrap();

        // Spread the probes across the whole vocabulary so short and long tokens both show up
        let ranks = (0..size).step_by((size / 1_000).max(1)).collect::<Vec<_>>();
        let hits = ranks.iter().map(|rank| synthetic_token(*rank)).collect::<Vec<_>>();
        let misses = hits
            .iter()
            .map(|token| {
                let mut token = token.clone();
                token.push(0xfe);
                token.push(0xfe);
                token
            })
            .collect::<Vec<_>>();

        group.throughput(Throughput::Elements(hits.len() as u64));

        group.bench_with_input(BenchmarkId::new("try_get_rank hit", size), &hits, |b, hits| {
            b.iter(|| {
                for token in hits {
                    black_box(vocab.try_get_rank(token));
                }
            })
        });
        group.bench_with_input(
            BenchmarkId::new("try_get_rank miss", size),
            &misses,
            |b, misses| {
                b.iter(|| {
                    for token in misses {
                        black_box(vocab.try_get_rank(token));
                    }
                })
            },
        );
        group.bench_with_input(BenchmarkId::new("token_bytes", size), &ranks, |b, ranks| {
            b.iter(|| {
                for rank in ranks {
                    black_box(vocab.token_bytes(*rank));
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("get_token", size), &ranks, |b, ranks| {
            b.iter(|| {
                for rank in ranks {
                    black_box(vocab.get_token(*rank).unwrap());
                }
            })
        });
    }
}

criterion_group!(benches, construction_benchmark, lookup_benchmark);
criterion_main!(benches);

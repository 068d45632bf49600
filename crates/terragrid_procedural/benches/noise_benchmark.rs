//! Benchmark for noise sampling and terrain classification.
//!
//! TARGET: a 100x100 height map well under a millisecond
//!
//! Run with: cargo bench --package terragrid_procedural --bench noise_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use terragrid_procedural::noise::{NoiseOrigin, NoiseSeed, NoiseSource, PerlinNoise};
use terragrid_procedural::terrain::{TerrainClassifier, TerrainLayers};
use terragrid_procedural::{Dimensions, GridCoord, TerrainConfig, WeightTable};

fn classifier(dims: Dimensions, config: &TerrainConfig) -> TerrainClassifier<PerlinNoise> {
    TerrainClassifier::new(
        PerlinNoise::new(NoiseSeed::new(42)),
        dims,
        NoiseOrigin::new(0.3, 0.6, 0.9),
        TerrainLayers::from(config),
        WeightTable::new([4.0, 2.0, 2.0, 1.0]).expect("valid weights"),
    )
    .expect("valid classifier")
}

/// One height sample per column, the way the height layer walks a world.
fn benchmark_height_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("height_map");

    for span in [25usize, 50, 100] {
        let dims = Dimensions::new(span, 25, span);
        let terrain = classifier(dims, &TerrainConfig::default());
        group.throughput(Throughput::Elements((span * span) as u64));

        group.bench_with_input(BenchmarkId::from_parameter(span), &dims, |b, dims| {
            b.iter(|| {
                let mut peak = 0.0f64;
                for x in 0..dims.width {
                    for z in 0..dims.depth {
                        if let Some(h) = terrain.column_height(x, z) {
                            peak = peak.max(h);
                        }
                    }
                }
                black_box(peak)
            });
        });
    }

    group.finish();
}

/// Raw sampler throughput on surface and vertical biome channels.
fn benchmark_biome_channels(c: &mut Criterion) {
    let noise = PerlinNoise::new(NoiseSeed::new(7));
    let mut group = c.benchmark_group("biome_channels");
    group.throughput(Throughput::Elements(100 * 25));

    group.bench_function("surface_plus_vertical", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for x in 0..100u32 {
                let bx = f64::from(x) * 0.04 + 0.3;
                for y in 0..25u32 {
                    let by = f64::from(y) * 0.16 + 0.6;
                    acc += noise.sample(bx, 0.9) + noise.sample(bx, black_box(by));
                }
            }
            black_box(acc)
        });
    });

    group.finish();
}

fn benchmark_cell_classification(c: &mut Criterion) {
    let dims = Dimensions::new(100, 25, 100);
    let config = TerrainConfig {
        snow_layer: true,
        vertical_biomes: true,
        ..TerrainConfig::default()
    };
    let terrain = classifier(dims, &config);

    c.bench_function("classify_cell_all_layers", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = i.wrapping_add(7919);
            let coord = GridCoord::new(i % dims.width, (i / 7) % dims.height, (i / 3) % dims.depth);
            black_box(terrain.classify(black_box(coord)))
        });
    });
}

criterion_group!(
    benches,
    benchmark_height_map,
    benchmark_biome_channels,
    benchmark_cell_classification
);
criterion_main!(benches);

//! Performance benchmarks for boundary detection

use boundary_dsp::{
    detect_boundaries_with_config, CancellationToken, ClusterStrategy, DetectorConfig, ParamSet,
    Side,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// 30 s at 16 kHz: low noise floor with a 2 kHz tone every other second
fn synthetic_utterances() -> Vec<i16> {
    let sample_rate = 16000usize;
    let mut state: u64 = 7;
    (0..sample_rate * 30)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let noise = ((state >> 33) as f64 / (1u64 << 31) as f64) * 2.0 - 1.0;
            let mut v = 50.0 * noise;
            if (i / sample_rate) % 2 == 1 {
                v += 20000.0
                    * (2.0 * std::f64::consts::PI * 2000.0 * i as f64 / sample_rate as f64).sin();
            }
            v.round() as i16
        })
        .collect()
}

fn bench_detect_boundaries(c: &mut Criterion) {
    let samples = synthetic_utterances();
    let params = ParamSet::default();
    let token = CancellationToken::new();

    for (name, strategy) in [
        ("detect_onsets_30s_kdtree", ClusterStrategy::KdTree),
        ("detect_onsets_30s_dense", ClusterStrategy::Dense),
    ] {
        let config = DetectorConfig {
            cluster_strategy: strategy,
            ..DetectorConfig::default()
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                let _ = detect_boundaries_with_config(
                    black_box(&samples),
                    black_box(16000),
                    &params,
                    Side::Onset,
                    &config,
                    &token,
                );
            });
        });
    }
}

criterion_group!(benches, bench_detect_boundaries);
criterion_main!(benches);

// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use npseg_detect::{DetectorConfig, NpMosum, SeriesView, ThresholdRule};

fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

fn shifted_series(n: usize) -> Vec<f64> {
    let mut state = 0xfeed_f00d_dead_beef_u64;
    (0..n)
        .map(|idx| {
            let noise = (lcg_next(&mut state) >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            let shift = if idx < n / 2 { 0.0 } else { 2.0 };
            noise + shift
        })
        .collect()
}

fn benchmark_detect_single(c: &mut Criterion) {
    let values = shifted_series(2_000);
    let view = SeriesView::univariate(&values).expect("benchmark view should be valid");
    let detector = NpMosum::new(DetectorConfig {
        threshold: ThresholdRule::manual(0.5),
        ..DetectorConfig::default()
    })
    .expect("detector should build");

    let mut group = c.benchmark_group("detect_single");
    for g in [25usize, 50, 100] {
        group.bench_function(format!("manual_n2000_g{g}"), |b| {
            b.iter(|| {
                detector
                    .detect_single(black_box(&view), black_box(g), 0)
                    .expect("detection should succeed")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_detect_single);
criterion_main!(benches);

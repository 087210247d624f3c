// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::LaggedSeries;

/// Cap on rows entering the pairwise-distance summary. Above it, rows are
/// subsampled on a deterministic stride so resolution stays RNG-free.
const MAX_SUMMARY_ROWS: usize = 500;

fn euclidean_distance(left: &[f64], right: &[f64]) -> f64 {
    let mut dist_sq = 0.0;
    for (a, b) in left.iter().zip(right.iter()) {
        let delta = a - b;
        dist_sq += delta * delta;
    }
    dist_sq.sqrt()
}

fn summary_rows(m: usize) -> Vec<usize> {
    if m <= MAX_SUMMARY_ROWS {
        return (0..m).collect();
    }
    let stride = m.div_ceil(MAX_SUMMARY_ROWS);
    (0..m).step_by(stride).collect()
}

/// Median (or mean) of pairwise Euclidean distances between embedded rows.
///
/// The median of an even count is the lower-middle order statistic, so the
/// summary is exactly reproducible. Returns 0.0 when no off-diagonal pair
/// exists or every pair coincides.
pub fn pairwise_distance_summary(lagged: &LaggedSeries, use_mean: bool) -> f64 {
    let rows = summary_rows(lagged.len());
    if rows.len() < 2 {
        return 0.0;
    }

    let mut distances = Vec::with_capacity(rows.len() * (rows.len() - 1) / 2);
    for (i, &left) in rows.iter().enumerate() {
        for &right in &rows[i + 1..] {
            distances.push(euclidean_distance(lagged.row(left), lagged.row(right)));
        }
    }

    if use_mean {
        distances.iter().sum::<f64>() / distances.len() as f64
    } else {
        distances.sort_unstable_by(f64::total_cmp);
        distances[(distances.len() - 1) / 2]
    }
}

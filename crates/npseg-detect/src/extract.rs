// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use npseg_core::{CandidatePoint, Criterion, CriterionConfig, StatisticSeries};

/// Maximal contiguous runs where the statistic exceeds the threshold,
/// as half-open index ranges into `values`.
fn exceeding_regions(values: &[f64], threshold: f64) -> Vec<(usize, usize)> {
    let mut regions = vec![];
    let mut start = None;
    for (idx, &value) in values.iter().enumerate() {
        match (value > threshold, start) {
            (true, None) => start = Some(idx),
            (false, Some(begin)) => {
                regions.push((begin, idx));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        regions.push((begin, values.len()));
    }
    regions
}

/// Leftmost argmax of a region.
fn region_argmax(values: &[f64], region: (usize, usize)) -> usize {
    let mut best = region.0;
    for idx in region.0 + 1..region.1 {
        if values[idx] > values[best] {
            best = idx;
        }
    }
    best
}

/// Local-maximum check with an exclusion radius: strictly larger than
/// everything to the left, at least as large as everything to the right.
/// The asymmetry keeps only the leftmost of a tied plateau.
fn is_local_max(values: &[f64], idx: usize, radius: usize) -> bool {
    let lo = idx.saturating_sub(radius);
    let hi = (idx + radius).min(values.len() - 1);
    for j in lo..idx {
        if values[j] >= values[idx] {
            return false;
        }
    }
    for j in idx + 1..=hi {
        if values[j] > values[idx] {
            return false;
        }
    }
    true
}

fn epsilon_width(epsilon: f64, g: usize) -> usize {
    ((epsilon * g as f64).ceil() as usize).max(1)
}

fn eta_radius(eta: f64, g: usize) -> usize {
    (eta * g as f64).floor() as usize
}

/// Applies the configured exceedance criterion to a statistic sequence.
///
/// The scan is strictly left-to-right with deterministic tie-breaking, so
/// identical inputs always produce the identical ordered point set.
pub(crate) fn extract(
    statistic: &StatisticSeries,
    threshold: f64,
    criterion: &CriterionConfig,
    g: usize,
    lag: usize,
) -> Vec<CandidatePoint> {
    let values = &statistic.values;
    let regions = exceeding_regions(values, threshold);
    let mut points = vec![];

    let declare = |idx: usize| CandidatePoint {
        location: statistic.location(idx),
        lag,
        score: values[idx],
        bandwidth: g,
    };

    match criterion.criterion {
        Criterion::Epsilon => {
            let min_width = epsilon_width(criterion.epsilon, g);
            for region in regions {
                if region.1 - region.0 >= min_width {
                    points.push(declare(region_argmax(values, region)));
                }
            }
        }
        Criterion::Eta => {
            let radius = eta_radius(criterion.eta, g);
            for region in regions {
                for idx in region.0..region.1 {
                    if is_local_max(values, idx, radius) {
                        points.push(declare(idx));
                    }
                }
            }
        }
        Criterion::EtaAndEpsilon => {
            let min_width = epsilon_width(criterion.epsilon, g);
            let radius = eta_radius(criterion.eta, g);
            for region in regions {
                if region.1 - region.0 < min_width {
                    continue;
                }
                for idx in region.0..region.1 {
                    if is_local_max(values, idx, radius) {
                        points.push(declare(idx));
                    }
                }
            }
        }
    }

    points
}

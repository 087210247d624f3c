// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::single_lag::{NpMosum, validate_bandwidth, validate_lag};
use npseg_core::{
    CandidatePoint, Cluster, Diagnostics, Error, MergeStrategy, MultiLagResult, SeriesView,
    ThresholdRule,
};
use std::borrow::Cow;
use std::time::Instant;

fn order_by_location(points: &mut [CandidatePoint]) {
    points.sort_by(|left, right| {
        left.location
            .cmp(&right.location)
            .then_with(|| left.lag.cmp(&right.lag))
    });
}

/// Highest score wins; ties go to the earliest location, then smallest lag.
fn pick_representative(first: CandidatePoint, rest: &[CandidatePoint]) -> CandidatePoint {
    rest.iter().fold(first, |best, &candidate| {
        match candidate
            .score
            .total_cmp(&best.score)
            .then_with(|| best.location.cmp(&candidate.location))
            .then_with(|| best.lag.cmp(&candidate.lag))
        {
            std::cmp::Ordering::Greater => candidate,
            _ => best,
        }
    })
}

fn close_cluster(members: Vec<CandidatePoint>, clusters: &mut Vec<Cluster>) {
    let Some(&first) = members.first() else {
        return;
    };
    clusters.push(Cluster {
        representative: pick_representative(first, &members[1..]),
        members,
    });
}

/// Left-to-right scan: a candidate extends the current cluster while it is
/// within `radius` of the cluster's rightmost location.
fn cluster_sequential(mut points: Vec<CandidatePoint>, radius: f64) -> Vec<Cluster> {
    order_by_location(&mut points);
    let mut clusters: Vec<Cluster> = vec![];
    let mut current: Vec<CandidatePoint> = vec![];

    for point in points {
        let split = current
            .last()
            .is_some_and(|last| (point.location - last.location) as f64 > radius);
        if split {
            close_cluster(std::mem::take(&mut current), &mut clusters);
        }
        current.push(point);
    }
    close_cluster(current, &mut clusters);

    clusters
}

/// Greedy seeding in descending score order; every non-seed joins its
/// nearest seed, earlier-accepted seeds winning distance ties.
fn cluster_bottom_up(points: Vec<CandidatePoint>, radius: f64) -> Vec<Cluster> {
    if points.is_empty() {
        return vec![];
    }

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&left, &right| {
        points[right]
            .score
            .total_cmp(&points[left].score)
            .then_with(|| points[left].location.cmp(&points[right].location))
            .then_with(|| points[left].lag.cmp(&points[right].lag))
    });

    let mut seeds: Vec<usize> = vec![];
    for &idx in &order {
        let separated = seeds.iter().all(|&seed| {
            points[idx].location.abs_diff(points[seed].location) as f64 > radius
        });
        if separated {
            seeds.push(idx);
        }
    }

    let mut members: Vec<Vec<CandidatePoint>> = vec![vec![]; seeds.len()];
    for point in &points {
        let mut best_seed = 0;
        let mut best_distance = usize::MAX;
        for (seed_rank, &seed) in seeds.iter().enumerate() {
            let distance = point.location.abs_diff(points[seed].location);
            if distance < best_distance {
                best_distance = distance;
                best_seed = seed_rank;
            }
        }
        members[best_seed].push(*point);
    }

    let mut clusters: Vec<Cluster> = seeds
        .iter()
        .zip(members)
        .map(|(&seed, mut cluster_members)| {
            order_by_location(&mut cluster_members);
            Cluster {
                representative: points[seed],
                members: cluster_members,
            }
        })
        .collect();
    clusters.sort_by(|left, right| {
        left.representative
            .location
            .cmp(&right.representative.location)
            .then_with(|| left.representative.lag.cmp(&right.representative.lag))
    });
    clusters
}

impl NpMosum {
    /// Detects change points across a lag set at one bandwidth and merges
    /// the per-lag candidates into location-ordered clusters.
    ///
    /// Manual thresholds accept one value (broadcast to every lag) or
    /// exactly one value per lag.
    pub fn detect_multilag(
        &self,
        x: &SeriesView<'_>,
        bandwidth: usize,
        lags: &[usize],
    ) -> Result<MultiLagResult, Error> {
        self.config().validate()?;
        validate_lag_set(lags, x.n())?;
        for &lag in lags {
            validate_bandwidth(bandwidth, x.n(), lag)?;
        }

        let manual = resolve_manual_per_lag(&self.config().threshold, lags.len())?;
        self.run_multilag(x, bandwidth, lags, manual)
    }

    /// Multi-lag core; the lag set and bandwidth are pre-validated and the
    /// manual thresholds, when present, are already one per lag.
    pub(crate) fn run_multilag(
        &self,
        x: &SeriesView<'_>,
        bandwidth: usize,
        lags: &[usize],
        manual: Option<Vec<f64>>,
    ) -> Result<MultiLagResult, Error> {
        let started_at = Instant::now();

        let mut per_lag = Vec::with_capacity(lags.len());
        for (idx, &lag) in lags.iter().enumerate() {
            let manual_value = manual.as_ref().map(|values| values[idx]);
            per_lag.push(self.run_unit(x, bandwidth, lag, manual_value)?);
        }

        let pooled: Vec<CandidatePoint> = per_lag
            .iter()
            .flat_map(|result| result.points.iter().copied())
            .collect();
        let pooled_count = pooled.len();

        let radius = self.config().merge.eta_merge * bandwidth as f64;
        let clusters = match self.config().merge.strategy {
            MergeStrategy::Sequential => cluster_sequential(pooled, radius),
            MergeStrategy::BottomUp => cluster_bottom_up(pooled, radius),
        };

        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        let diagnostics = Diagnostics {
            n: x.n(),
            p: x.p(),
            runtime_ms: Some(runtime_ms),
            notes: vec![
                format!("bandwidth={bandwidth}, lags={lags:?}"),
                format!(
                    "merge: strategy={}, eta_merge={}, pooled={pooled_count}, clusters={}",
                    self.config().merge.strategy.name(),
                    self.config().merge.eta_merge,
                    clusters.len()
                ),
            ],
            warnings: vec![],
            algorithm: Cow::Borrowed("np-mosum-multilag"),
            seed: per_lag.first().and_then(|result| result.diagnostics.seed),
            thread_count: per_lag
                .first()
                .and_then(|result| result.diagnostics.thread_count),
            ..Diagnostics::default()
        };

        Ok(MultiLagResult {
            bandwidth,
            lags: lags.to_vec(),
            clusters,
            per_lag,
            diagnostics,
        })
    }
}

pub(crate) fn validate_lag_set(lags: &[usize], n: usize) -> Result<(), Error> {
    if lags.is_empty() {
        return Err(Error::invalid_parameter("lag set must not be empty"));
    }
    let mut sorted = lags.to_vec();
    sorted.sort_unstable();
    if let Some(window) = sorted.windows(2).find(|window| window[0] == window[1]) {
        return Err(Error::invalid_lag(format!(
            "duplicate lag {} in lag set",
            window[0]
        )));
    }
    for &lag in lags {
        validate_lag(lag, n)?;
    }
    Ok(())
}

pub(crate) fn resolve_manual_per_lag(
    threshold: &ThresholdRule,
    lag_count: usize,
) -> Result<Option<Vec<f64>>, Error> {
    match threshold {
        ThresholdRule::Bootstrap(_) => Ok(None),
        ThresholdRule::Manual(values) => {
            if values.len() == 1 {
                Ok(Some(vec![values[0]; lag_count]))
            } else if values.len() == lag_count {
                Ok(Some(values.clone()))
            } else {
                Err(Error::dimension_mismatch(format!(
                    "manual threshold count mismatch: got {}, expected 1 or {lag_count} for {lag_count} lags",
                    values.len()
                )))
            }
        }
    }
}

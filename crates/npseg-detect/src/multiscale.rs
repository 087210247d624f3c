// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::multilag::validate_lag_set;
use crate::single_lag::{NpMosum, validate_bandwidth};
use npseg_core::{
    CandidatePoint, Diagnostics, Error, MultiscaleResult, SeriesView, ThresholdRule,
};
use std::borrow::Cow;
use std::time::Instant;

/// Single greedy pass over pooled representatives in production order:
/// a point survives iff it is at least `eta_bottom_up` times its own
/// bandwidth away from everything accepted before it. Arrival order, not
/// score, breaks ties across scales.
fn merge_across_scales(pooled: &[CandidatePoint], eta_bottom_up: f64) -> Vec<CandidatePoint> {
    let mut accepted: Vec<CandidatePoint> = vec![];
    for point in pooled {
        let spacing = eta_bottom_up * point.bandwidth as f64;
        let separated = accepted
            .iter()
            .all(|kept| point.location.abs_diff(kept.location) as f64 >= spacing);
        if separated {
            accepted.push(*point);
        }
    }
    accepted.sort_by(|left, right| {
        left.location
            .cmp(&right.location)
            .then_with(|| left.bandwidth.cmp(&right.bandwidth))
            .then_with(|| left.lag.cmp(&right.lag))
    });
    accepted
}

fn validate_bandwidth_set(bandwidths: &[usize]) -> Result<(), Error> {
    if bandwidths.is_empty() {
        return Err(Error::invalid_parameter("bandwidth set must not be empty"));
    }
    let mut sorted = bandwidths.to_vec();
    sorted.sort_unstable();
    if let Some(window) = sorted.windows(2).find(|window| window[0] == window[1]) {
        return Err(Error::invalid_parameter(format!(
            "duplicate bandwidth {} in bandwidth set",
            window[0]
        )));
    }
    Ok(())
}

/// Manual thresholds for a multiscale run, resolved per bandwidth into one
/// value per lag.
fn resolve_manual_per_scale(
    threshold: &ThresholdRule,
    bandwidth_count: usize,
    lag_count: usize,
) -> Result<Option<Vec<Vec<f64>>>, Error> {
    let ThresholdRule::Manual(values) = threshold else {
        return Ok(None);
    };

    let per_scale = if values.len() == 1 {
        vec![vec![values[0]; lag_count]; bandwidth_count]
    } else if values.len() == bandwidth_count {
        values
            .iter()
            .map(|&value| vec![value; lag_count])
            .collect()
    } else if values.len() == bandwidth_count * lag_count {
        values
            .chunks(lag_count)
            .map(<[f64]>::to_vec)
            .collect()
    } else {
        return Err(Error::dimension_mismatch(format!(
            "manual threshold count mismatch: got {}, expected 1, {bandwidth_count} (per bandwidth), or {} (bandwidth-major per lag)",
            values.len(),
            bandwidth_count * lag_count
        )));
    };
    Ok(Some(per_scale))
}

impl NpMosum {
    /// Detects change points over a bandwidth set, merging the per
    /// bandwidth multi-lag results with a single bottom-up pass scaled by
    /// each candidate's own bandwidth.
    ///
    /// Manual thresholds accept one value, one value per bandwidth, or
    /// `bandwidths * lags` values in bandwidth-major order.
    pub fn detect_multiscale(
        &self,
        x: &SeriesView<'_>,
        bandwidths: &[usize],
        lags: &[usize],
    ) -> Result<MultiscaleResult, Error> {
        self.config().validate()?;
        validate_bandwidth_set(bandwidths)?;
        validate_lag_set(lags, x.n())?;
        for &bandwidth in bandwidths {
            for &lag in lags {
                validate_bandwidth(bandwidth, x.n(), lag)?;
            }
        }
        let manual = resolve_manual_per_scale(&self.config().threshold, bandwidths.len(), lags.len())?;

        let started_at = Instant::now();
        let mut per_bandwidth = Vec::with_capacity(bandwidths.len());
        for (idx, &bandwidth) in bandwidths.iter().enumerate() {
            let manual_per_lag = manual.as_ref().map(|per_scale| per_scale[idx].clone());
            per_bandwidth.push(self.run_multilag(x, bandwidth, lags, manual_per_lag)?);
        }

        // Bandwidth-major pool in production order; within one bandwidth
        // the clusters are already in merged (location) order.
        let pooled: Vec<CandidatePoint> = per_bandwidth
            .iter()
            .flat_map(|result| result.clusters.iter().map(|cluster| cluster.representative))
            .collect();
        let points = merge_across_scales(&pooled, self.config().eta_bottom_up);

        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        let diagnostics = Diagnostics {
            n: x.n(),
            p: x.p(),
            runtime_ms: Some(runtime_ms),
            notes: vec![
                format!("bandwidths={bandwidths:?}, lags={lags:?}"),
                format!(
                    "multiscale: eta_bottom_up={}, pooled={}, accepted={}",
                    self.config().eta_bottom_up,
                    pooled.len(),
                    points.len()
                ),
            ],
            warnings: vec![],
            algorithm: Cow::Borrowed("np-mosum-multiscale"),
            seed: per_bandwidth
                .first()
                .and_then(|result| result.diagnostics.seed),
            thread_count: per_bandwidth
                .first()
                .and_then(|result| result.diagnostics.thread_count),
            ..Diagnostics::default()
        };

        Ok(MultiscaleResult {
            bandwidths: bandwidths.to_vec(),
            lags: lags.to_vec(),
            points,
            per_bandwidth,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{merge_across_scales, resolve_manual_per_scale, validate_bandwidth_set};
    use crate::single_lag::NpMosum;
    use npseg_core::{
        CandidatePoint, DetectorConfig, Error, SeriesView, StableRng, ThresholdRule,
    };

    fn point(location: usize, bandwidth: usize, score: f64) -> CandidatePoint {
        CandidatePoint {
            location,
            lag: 0,
            score,
            bandwidth,
        }
    }

    #[test]
    fn merge_accepts_in_arrival_order_not_score_order() {
        // The low-score early arrival blocks the high-score later one.
        let pooled = vec![point(100, 20, 1.0), point(105, 20, 9.0)];
        let merged = merge_across_scales(&pooled, 0.8);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].location, 100);
        assert_eq!(merged[0].score, 1.0);
    }

    #[test]
    fn merge_scales_the_spacing_by_the_candidate_bandwidth() {
        // Spacing uses the arriving candidate's own bandwidth: the G=10
        // point only needs 8 of separation, the G=50 point needs 40.
        let pooled = vec![
            point(100, 50, 2.0),
            point(110, 10, 1.0),
            point(130, 50, 3.0),
        ];
        let merged = merge_across_scales(&pooled, 0.8);
        let locations: Vec<usize> = merged.iter().map(|p| p.location).collect();
        assert_eq!(locations, vec![100, 110]);
    }

    #[test]
    fn merge_output_is_sorted_by_location() {
        let pooled = vec![point(300, 20, 1.0), point(100, 30, 2.0)];
        let merged = merge_across_scales(&pooled, 0.8);
        let locations: Vec<usize> = merged.iter().map(|p| p.location).collect();
        assert_eq!(locations, vec![100, 300]);
    }

    #[test]
    fn merge_is_idempotent_on_its_own_output() {
        let pooled = vec![
            point(100, 20, 2.0),
            point(112, 20, 1.5),
            point(240, 40, 3.0),
            point(250, 20, 0.5),
            point(400, 40, 1.0),
        ];
        let merged = merge_across_scales(&pooled, 0.8);
        let again = merge_across_scales(&merged, 0.8);
        assert_eq!(again, merged);
    }

    #[test]
    fn bandwidth_set_validation_rejects_empty_and_duplicates() {
        assert!(matches!(
            validate_bandwidth_set(&[]).expect_err("empty set must fail"),
            Error::InvalidParameter(_)
        ));
        assert!(matches!(
            validate_bandwidth_set(&[10, 20, 10]).expect_err("duplicates must fail"),
            Error::InvalidParameter(_)
        ));
        validate_bandwidth_set(&[10, 20, 40]).expect("distinct set should pass");
    }

    #[test]
    fn manual_threshold_resolution_covers_all_accepted_shapes() {
        let scalar = ThresholdRule::manual(0.4);
        assert_eq!(
            resolve_manual_per_scale(&scalar, 2, 3).expect("scalar broadcasts"),
            Some(vec![vec![0.4; 3], vec![0.4; 3]])
        );

        let per_bandwidth = ThresholdRule::Manual(vec![0.1, 0.2]);
        assert_eq!(
            resolve_manual_per_scale(&per_bandwidth, 2, 3).expect("per-bandwidth broadcasts"),
            Some(vec![vec![0.1; 3], vec![0.2; 3]])
        );

        let full = ThresholdRule::Manual(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert_eq!(
            resolve_manual_per_scale(&full, 2, 3).expect("bandwidth-major passes"),
            Some(vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]])
        );

        let wrong = ThresholdRule::Manual(vec![0.1, 0.2, 0.3, 0.4]);
        assert!(matches!(
            resolve_manual_per_scale(&wrong, 2, 3).expect_err("length 4 must fail"),
            Error::DimensionMismatch(_)
        ));
    }

    #[test]
    fn multiscale_run_detects_a_shift_at_every_scale() {
        let mut rng = StableRng::new(43);
        let n = 200;
        let values: Vec<f64> = (0..n)
            .map(|idx| {
                let base = 0.3 * rng.next_gaussian();
                if idx < 100 { base } else { base + 3.0 }
            })
            .collect();
        let view = SeriesView::univariate(&values).expect("view should be valid");
        let detector = NpMosum::new(DetectorConfig {
            threshold: ThresholdRule::manual(0.5),
            ..DetectorConfig::default()
        })
        .expect("detector should build");

        let result = detector
            .detect_multiscale(&view, &[20, 35], &[0, 1])
            .expect("multiscale should succeed");
        assert_eq!(result.per_bandwidth.len(), 2);
        assert_eq!(
            result.points.len(),
            1,
            "one true shift must survive the cross-scale merge"
        );
        assert!(result.points[0].location.abs_diff(100) <= 35);
        for window in result.points.windows(2) {
            assert!(window[0].location < window[1].location);
        }
    }

    #[test]
    fn any_invalid_bandwidth_in_the_set_fails_before_running() {
        let values = vec![0.0; 100];
        let view = SeriesView::univariate(&values).expect("view should be valid");
        let detector = NpMosum::new(DetectorConfig {
            threshold: ThresholdRule::manual(0.5),
            ..DetectorConfig::default()
        })
        .expect("detector should build");
        let err = detector
            .detect_multiscale(&view, &[10, 50], &[0])
            .expect_err("G=50 must fail for n=100");
        assert!(matches!(err, Error::InvalidBandwidth(_)));
    }

    #[test]
    fn empty_sets_are_invalid_parameters() {
        let values = vec![0.0; 100];
        let view = SeriesView::univariate(&values).expect("view should be valid");
        let detector = NpMosum::new(DetectorConfig {
            threshold: ThresholdRule::manual(0.5),
            ..DetectorConfig::default()
        })
        .expect("detector should build");
        assert!(matches!(
            detector
                .detect_multiscale(&view, &[], &[0])
                .expect_err("empty bandwidths must fail"),
            Error::InvalidParameter(_)
        ));
        assert!(matches!(
            detector
                .detect_multiscale(&view, &[10], &[])
                .expect_err("empty lags must fail"),
            Error::InvalidParameter(_)
        ));
    }
}

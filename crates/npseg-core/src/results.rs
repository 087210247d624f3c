// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::Diagnostics;
use crate::config::DetectorConfig;

/// Detector statistic sequence for one (bandwidth, lag) unit.
///
/// `values[i]` is the statistic at original-series index `offset + i`,
/// the first index of the right comparison window.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatisticSeries {
    pub offset: usize,
    pub values: Vec<f64>,
}

impl StatisticSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Original-series index of position `i`.
    pub fn location(&self, i: usize) -> usize {
        self.offset + i
    }

    /// `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &value)| (self.offset + i, value))
    }

    /// Maximum statistic value, if any.
    pub fn max_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

/// One declared candidate change point.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidatePoint {
    /// Index in the original series.
    pub location: usize,
    /// Lag of the embedding that produced the candidate.
    pub lag: usize,
    /// Statistic value at the location at extraction time.
    pub score: f64,
    /// Bandwidth that produced the candidate.
    pub bandwidth: usize,
}

/// A merged cluster of mutually close candidates with one representative.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub representative: CandidatePoint,
    /// Every input candidate assigned to this cluster, representative
    /// included, ordered by location then lag.
    pub members: Vec<CandidatePoint>,
}

/// Result of a single (bandwidth, lag) detection.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SingleLagResult {
    pub bandwidth: usize,
    pub lag: usize,
    /// Threshold actually applied (manual or bootstrap-calibrated).
    pub threshold: f64,
    pub points: Vec<CandidatePoint>,
    pub statistic: StatisticSeries,
    /// Configuration the run resolved to, echoed for reproducibility.
    pub config: DetectorConfig,
    pub diagnostics: Diagnostics,
}

/// Result of a multi-lag detection at one bandwidth.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MultiLagResult {
    pub bandwidth: usize,
    pub lags: Vec<usize>,
    /// Clusters ordered by representative location.
    pub clusters: Vec<Cluster>,
    /// Per-lag detection results in the order of `lags`.
    pub per_lag: Vec<SingleLagResult>,
    pub diagnostics: Diagnostics,
}

impl MultiLagResult {
    /// Representative change points ordered by location.
    pub fn change_points(&self) -> Vec<CandidatePoint> {
        self.clusters
            .iter()
            .map(|cluster| cluster.representative)
            .collect()
    }
}

/// Result of a multiscale detection over a bandwidth set.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MultiscaleResult {
    pub bandwidths: Vec<usize>,
    pub lags: Vec<usize>,
    /// Final merged change points ordered by location.
    pub points: Vec<CandidatePoint>,
    /// Per-bandwidth multi-lag results in the order of `bandwidths`.
    pub per_bandwidth: Vec<MultiLagResult>,
    pub diagnostics: Diagnostics,
}

#[cfg(test)]
mod tests {
    use super::{CandidatePoint, Cluster, MultiLagResult, StatisticSeries};
    use crate::Diagnostics;

    fn point(location: usize, score: f64) -> CandidatePoint {
        CandidatePoint {
            location,
            lag: 0,
            score,
            bandwidth: 20,
        }
    }

    #[test]
    fn statistic_series_indexing_and_iteration() {
        let series = StatisticSeries {
            offset: 10,
            values: vec![0.5, 2.0, 1.5],
        };
        assert_eq!(series.len(), 3);
        assert!(!series.is_empty());
        assert_eq!(series.location(0), 10);
        assert_eq!(series.location(2), 12);
        let pairs: Vec<(usize, f64)> = series.iter().collect();
        assert_eq!(pairs, vec![(10, 0.5), (11, 2.0), (12, 1.5)]);
        assert_eq!(series.max_value(), Some(2.0));
    }

    #[test]
    fn empty_statistic_series_has_no_max() {
        let series = StatisticSeries::default();
        assert!(series.is_empty());
        assert_eq!(series.max_value(), None);
    }

    #[test]
    fn multilag_change_points_are_cluster_representatives() {
        let result = MultiLagResult {
            bandwidth: 20,
            lags: vec![0, 1],
            clusters: vec![
                Cluster {
                    representative: point(100, 3.0),
                    members: vec![point(98, 1.0), point(100, 3.0)],
                },
                Cluster {
                    representative: point(300, 2.0),
                    members: vec![point(300, 2.0)],
                },
            ],
            per_lag: vec![],
            diagnostics: Diagnostics::default(),
        };
        let points = result.change_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].location, 100);
        assert_eq!(points[1].location, 300);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn candidate_point_serde_roundtrip() {
        let candidate = point(42, 1.75);
        let encoded = serde_json::to_string(&candidate).expect("candidate should serialize");
        let decoded: CandidatePoint =
            serde_json::from_str(&encoded).expect("candidate should deserialize");
        assert_eq!(decoded, candidate);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Nonparametric MOSUM change-point detection over joint characteristic
//! functions: the detector statistic, the dependent multiplier bootstrap,
//! exceedance extraction, and the multi-lag / multiscale mergers.

mod bootstrap;
mod extract;
mod mosum;
mod multilag;
mod multiscale;
mod single_lag;

pub use single_lag::NpMosum;

// Re-exported so callers can drive the detector from one crate.
pub use npseg_core::{
    BootstrapConfig, BootstrapMethod, CandidatePoint, Cluster, Criterion, CriterionConfig,
    DetectorConfig, Diagnostics, Error, KernelConfig, KernelFamily, MergeConfig, MergeStrategy,
    MultiLagResult, MultiscaleResult, SeriesView, SingleLagResult, StatisticSeries, ThresholdRule,
};

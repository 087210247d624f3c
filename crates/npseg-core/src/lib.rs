// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Shared types for nonparametric MOSUM change-point detection: the error
//! taxonomy, the validated series view, configuration, result records,
//! diagnostics, and the deterministic random stream.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod results;
pub mod rng;
pub mod series;

pub use config::{
    BootstrapConfig, BootstrapMethod, Criterion, CriterionConfig, DetectorConfig, KernelConfig,
    KernelFamily, MergeConfig, MergeStrategy, ThresholdRule,
};
pub use diagnostics::Diagnostics;
pub use error::Error;
pub use results::{
    CandidatePoint, Cluster, MultiLagResult, MultiscaleResult, SingleLagResult, StatisticSeries,
};
pub use rng::StableRng;
pub use series::SeriesView;

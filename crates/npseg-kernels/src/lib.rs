// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Kernel families and lag embeddings: the similarity functions that turn
//! window comparison into an empirical characteristic-function distance,
//! plus the data-driven scale heuristic.

pub mod embed;
pub mod evaluator;
pub mod scale;

pub use embed::LaggedSeries;
pub use evaluator::KernelEvaluator;
pub use scale::pairwise_distance_summary;

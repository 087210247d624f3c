// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::mosum::{KernelBand, max_weighted_statistic};
use npseg_core::{BootstrapConfig, BootstrapMethod, Error, StableRng};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Outcome of one bootstrap calibration.
#[derive(Clone, Debug)]
pub(crate) struct Calibration {
    pub threshold: f64,
    /// Replicate maxima in replicate order.
    pub maxima: Vec<f64>,
    /// Resolved dependence length of the multiplier process.
    pub dep_length: usize,
    pub used_parallel: bool,
}

fn resolve_dep_length(config: &BootstrapConfig, m: usize) -> usize {
    let dep = config
        .dep
        .unwrap_or_else(|| 1.5 * (m as f64).powf(1.0 / 3.0));
    (dep.ceil() as usize).clamp(1, m)
}

/// Dependent multipliers for one replicate: a moving average of iid
/// standard normals over a window of `dep_length`, normalized to unit
/// variance. The stream is fully determined by `(seed, replicate)`.
fn multipliers(seed: u64, replicate: usize, m: usize, dep_length: usize) -> Vec<f64> {
    let mut rng = StableRng::stream(seed, replicate as u64);
    let raw: Vec<f64> = (0..m + dep_length - 1)
        .map(|_| rng.next_gaussian())
        .collect();

    let norm = (dep_length as f64).sqrt();
    let mut window_sum: f64 = raw[..dep_length].iter().sum();
    let mut out = Vec::with_capacity(m);
    out.push(window_sum / norm);
    for t in 1..m {
        window_sum += raw[t + dep_length - 1] - raw[t - 1];
        out.push(window_sum / norm);
    }
    out
}

/// Empirical quantile of sorted values with linear interpolation between
/// order statistics.
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = p * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Calibrates the rejection threshold as the `(1 - alpha)` quantile of the
/// replicate maxima of the multiplier-reweighted statistic.
///
/// Replicates are independent pure computations over the immutable band;
/// with the `rayon` feature they run as a fixed fan-out whose result slots
/// are indexed by replicate number, and the first failing replicate aborts
/// the whole calibration either way.
pub(crate) fn calibrate(
    band: &KernelBand,
    g: usize,
    config: &BootstrapConfig,
) -> Result<Calibration, Error> {
    config.validate()?;

    let m = band.len();
    let centered = matches!(config.method, BootstrapMethod::MeanSubtract);
    if centered && !band.has_centering() {
        return Err(Error::numerical(
            "mean-subtract calibration requires a centered kernel band",
        ));
    }

    let dep_length = resolve_dep_length(config, m);
    let seed = config.seed;

    let replicate_max = |replicate: usize| -> Result<f64, Error> {
        let weights = multipliers(seed, replicate, m, dep_length);
        let max = max_weighted_statistic(band, g, &weights, centered)?;
        if !max.is_finite() {
            return Err(Error::numerical(format!(
                "non-finite bootstrap maximum in replicate {replicate}"
            )));
        }
        Ok(max)
    };

    #[cfg(feature = "rayon")]
    let (maxima, used_parallel) = {
        let maxima = (0..config.reps)
            .into_par_iter()
            .map(replicate_max)
            .collect::<Result<Vec<f64>, Error>>()?;
        (maxima, true)
    };

    #[cfg(not(feature = "rayon"))]
    let (maxima, used_parallel) = {
        let mut maxima = Vec::with_capacity(config.reps);
        for replicate in 0..config.reps {
            maxima.push(replicate_max(replicate)?);
        }
        (maxima, false)
    };

    let mut sorted = maxima.clone();
    sorted.sort_unstable_by(f64::total_cmp);
    let threshold = quantile_sorted(&sorted, 1.0 - config.alpha).max(0.0);

    Ok(Calibration {
        threshold,
        maxima,
        dep_length,
        used_parallel,
    })
}

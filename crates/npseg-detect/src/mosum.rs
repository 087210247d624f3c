// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use npseg_core::{Error, StatisticSeries};
use npseg_kernels::{KernelEvaluator, LaggedSeries};

/// Banded cache of kernel values over a lagged embedding.
///
/// The window pair at any center only touches index pairs `(s, t)` with
/// `|s - t| < 2G`, so a band of width `2G` replaces the full `m x m` Gram
/// matrix. With centering enabled the cache also holds full row means and
/// the grand mean, which the bootstrap uses to recenter kernel terms.
#[derive(Clone, Debug)]
pub(crate) struct KernelBand {
    m: usize,
    band: usize,
    values: Vec<f64>,
    centering: Option<Centering>,
}

#[derive(Clone, Debug)]
struct Centering {
    row_means: Vec<f64>,
    grand_mean: f64,
}

impl KernelBand {
    /// Fills the band for bandwidth `g`. Callers must have validated
    /// `1 <= g` and `2g < m` already.
    pub(crate) fn compute(
        kernel: &KernelEvaluator,
        lagged: &LaggedSeries,
        g: usize,
        with_centering: bool,
    ) -> Result<Self, Error> {
        let m = lagged.len();
        let band = 2 * g;
        let mut values = vec![0.0; m * band];

        for s in 0..m {
            let upper = (s + band).min(m);
            for t in s..upper {
                let value = kernel.eval(lagged.row(s), lagged.row(t));
                if !value.is_finite() {
                    return Err(Error::numerical(format!(
                        "non-finite kernel value at ({s}, {t})"
                    )));
                }
                values[s * band + (t - s)] = value;
            }
        }

        let centering = if with_centering {
            Some(Self::compute_centering(kernel, lagged)?)
        } else {
            None
        };

        Ok(Self {
            m,
            band,
            values,
            centering,
        })
    }

    fn compute_centering(
        kernel: &KernelEvaluator,
        lagged: &LaggedSeries,
    ) -> Result<Centering, Error> {
        let m = lagged.len();
        let mut row_sums = vec![0.0; m];

        for s in 0..m {
            row_sums[s] += kernel.eval(lagged.row(s), lagged.row(s));
            for t in s + 1..m {
                let value = kernel.eval(lagged.row(s), lagged.row(t));
                if !value.is_finite() {
                    return Err(Error::numerical(format!(
                        "non-finite kernel value at ({s}, {t})"
                    )));
                }
                row_sums[s] += value;
                row_sums[t] += value;
            }
        }

        // Each row sum covers the full row of the implicit Gram matrix, so
        // their total is the full double sum.
        let grand_mean = row_sums.iter().sum::<f64>() / (m * m) as f64;
        let row_means = row_sums
            .iter()
            .map(|sum| sum / m as f64)
            .collect::<Vec<f64>>();

        Ok(Centering {
            row_means,
            grand_mean,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.m
    }

    pub(crate) fn has_centering(&self) -> bool {
        self.centering.is_some()
    }

    /// Raw kernel value; `|s - t|` must be below the band width.
    #[inline]
    fn raw(&self, s: usize, t: usize) -> f64 {
        let (lo, hi) = if s <= t { (s, t) } else { (t, s) };
        self.values[lo * self.band + (hi - lo)]
    }

    /// Kernel value, doubly centered when requested. Callers asking for
    /// centering must have built the band with it; [`Self::has_centering`]
    /// is the guard.
    #[inline]
    pub(crate) fn value(&self, s: usize, t: usize, centered: bool) -> f64 {
        let raw = self.raw(s, t);
        match (&self.centering, centered) {
            (Some(centering), true) => {
                raw - centering.row_means[s] - centering.row_means[t] + centering.grand_mean
            }
            _ => raw,
        }
    }
}

/// Rolling window-pair sums for the MOSUM scan.
///
/// Maintains the three weighted double sums (left-left, right-right,
/// left-right) over the band and advances them in `O(G)` per center, so a
/// full scan costs `O(m G)` instead of `O(m G^2)`.
struct WindowSums<'a> {
    band: &'a KernelBand,
    g: usize,
    weights: &'a [f64],
    centered: bool,
    ll: f64,
    rr: f64,
    lr: f64,
}

impl<'a> WindowSums<'a> {
    fn init(band: &'a KernelBand, g: usize, weights: &'a [f64], centered: bool) -> Self {
        let mut ll = 0.0;
        let mut rr = 0.0;
        let mut lr = 0.0;
        for s in 0..g {
            for t in 0..g {
                ll += weights[s] * weights[t] * band.value(s, t, centered);
                rr += weights[g + s] * weights[g + t] * band.value(g + s, g + t, centered);
                lr += weights[s] * weights[g + t] * band.value(s, g + t, centered);
            }
        }
        Self {
            band,
            g,
            weights,
            centered,
            ll,
            rr,
            lr,
        }
    }

    /// Signed discrepancy at the current center.
    fn discrepancy(&self) -> f64 {
        let g_sq = (self.g * self.g) as f64;
        (self.ll + self.rr - 2.0 * self.lr) / g_sq
    }

    /// Advances from center `k - 1` to center `k`.
    fn advance(&mut self, k: usize) {
        let g = self.g;
        let w = self.weights;
        let leaving_left = k - 1 - g;
        let crossing = k - 1;
        let entering_right = k - 1 + g;

        // Drop the oldest left index. Left becomes [k-g, k-1).
        let mut sum = 0.0;
        for t in k - g..crossing {
            sum += w[t] * self.band.value(leaving_left, t, self.centered);
        }
        self.ll -= w[leaving_left]
            * (2.0 * sum
                + w[leaving_left] * self.band.value(leaving_left, leaving_left, self.centered));
        let mut cross = 0.0;
        for t in crossing..entering_right {
            cross += w[t] * self.band.value(leaving_left, t, self.centered);
        }
        self.lr -= w[leaving_left] * cross;

        // Move the crossing index out of the right window. Right becomes
        // [k, k-1+g).
        let mut sum = 0.0;
        for t in k..entering_right {
            sum += w[t] * self.band.value(crossing, t, self.centered);
        }
        self.rr -=
            w[crossing] * (2.0 * sum + w[crossing] * self.band.value(crossing, crossing, self.centered));
        let mut cross = 0.0;
        for s in k - g..crossing {
            cross += w[s] * self.band.value(s, crossing, self.centered);
        }
        self.lr -= w[crossing] * cross;

        // The crossing index joins the left window. Left becomes [k-g, k).
        let mut sum = 0.0;
        for t in k - g..crossing {
            sum += w[t] * self.band.value(crossing, t, self.centered);
        }
        self.ll +=
            w[crossing] * (2.0 * sum + w[crossing] * self.band.value(crossing, crossing, self.centered));
        let mut cross = 0.0;
        for t in k..entering_right {
            cross += w[t] * self.band.value(crossing, t, self.centered);
        }
        self.lr += w[crossing] * cross;

        // The newest index joins the right window. Right becomes [k, k+g).
        let mut sum = 0.0;
        for t in k..entering_right {
            sum += w[t] * self.band.value(t, entering_right, self.centered);
        }
        self.rr += w[entering_right]
            * (2.0 * sum
                + w[entering_right]
                    * self.band.value(entering_right, entering_right, self.centered));
        let mut cross = 0.0;
        for s in k - g..k {
            cross += w[s] * self.band.value(s, entering_right, self.centered);
        }
        self.lr += w[entering_right] * cross;
    }
}

/// Scans every valid center `k` in `[G, m - G)` and reports
/// `sqrt(G) * max(0, discrepancy)` to the visitor.
pub(crate) fn scan_statistic<F>(
    band: &KernelBand,
    g: usize,
    weights: &[f64],
    centered: bool,
    mut visit: F,
) -> Result<(), Error>
where
    F: FnMut(usize, f64),
{
    let m = band.len();
    debug_assert!(g >= 1 && 2 * g < m);
    debug_assert_eq!(weights.len(), m);

    let scale = (g as f64).sqrt();
    let mut sums = WindowSums::init(band, g, weights, centered);

    for k in g..m - g {
        if k > g {
            sums.advance(k);
        }
        let value = scale * sums.discrepancy().max(0.0);
        if !value.is_finite() {
            return Err(Error::numerical(format!(
                "non-finite detector statistic at center {k}"
            )));
        }
        visit(k, value);
    }

    Ok(())
}

/// Full detector statistic sequence for one (bandwidth, lag) unit, indexed
/// in original-series coordinates.
pub(crate) fn statistic_series(band: &KernelBand, g: usize) -> Result<StatisticSeries, Error> {
    let weights = vec![1.0; band.len()];
    let mut values = Vec::with_capacity(band.len() - 2 * g);
    scan_statistic(band, g, &weights, false, |_, value| values.push(value))?;
    Ok(StatisticSeries { offset: g, values })
}

/// Maximum weighted statistic over all centers; the bootstrap's per
/// replicate reduction.
pub(crate) fn max_weighted_statistic(
    band: &KernelBand,
    g: usize,
    weights: &[f64],
    centered: bool,
) -> Result<f64, Error> {
    let mut max = 0.0f64;
    scan_statistic(band, g, weights, centered, |_, value| {
        max = max.max(value);
    })?;
    Ok(max)
}

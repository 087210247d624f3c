// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::bootstrap::calibrate;
use crate::extract::extract;
use crate::mosum::{KernelBand, statistic_series};
use npseg_core::{
    BootstrapMethod, DetectorConfig, Diagnostics, Error, SeriesView, SingleLagResult,
    ThresholdRule,
};
use npseg_kernels::{KernelEvaluator, LaggedSeries};
use std::borrow::Cow;
use std::time::Instant;

/// Nonparametric MOSUM change-point detector over joint characteristic
/// functions.
///
/// One detector instance holds the full configuration; the three entry
/// points cover one (bandwidth, lag) unit, a lag set at one bandwidth, and
/// a bandwidth set.
#[derive(Clone, Debug)]
pub struct NpMosum {
    config: DetectorConfig,
}

impl NpMosum {
    pub fn new(config: DetectorConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detects change points for a single (bandwidth, lag) unit.
    pub fn detect_single(
        &self,
        x: &SeriesView<'_>,
        bandwidth: usize,
        lag: usize,
    ) -> Result<SingleLagResult, Error> {
        self.config.validate()?;
        validate_lag(lag, x.n())?;
        validate_bandwidth(bandwidth, x.n(), lag)?;

        let manual = match &self.config.threshold {
            ThresholdRule::Bootstrap(_) => None,
            ThresholdRule::Manual(values) => {
                if values.len() != 1 {
                    return Err(Error::dimension_mismatch(format!(
                        "manual threshold count mismatch: got {}, expected 1 for a single-lag run",
                        values.len()
                    )));
                }
                Some(values[0])
            }
        };

        self.run_unit(x, bandwidth, lag, manual)
    }

    /// Core of one (bandwidth, lag) detection; inputs are pre-validated.
    pub(crate) fn run_unit(
        &self,
        x: &SeriesView<'_>,
        bandwidth: usize,
        lag: usize,
        manual: Option<f64>,
    ) -> Result<SingleLagResult, Error> {
        let started_at = Instant::now();
        let mut notes = vec![format!("bandwidth={bandwidth}, lag={lag}")];
        let mut warnings = vec![];

        let lagged = LaggedSeries::embed(x, lag)?;
        let (kernel, mut kernel_notes) = KernelEvaluator::resolve(&self.config.kernel, &lagged)?;
        notes.push(format!(
            "kernel={}, scale={}",
            kernel.family().name(),
            kernel.scale()
        ));
        notes.append(&mut kernel_notes);

        let needs_centering = manual.is_none()
            && matches!(
                &self.config.threshold,
                ThresholdRule::Bootstrap(boot) if matches!(boot.method, BootstrapMethod::MeanSubtract)
            );
        let band = KernelBand::compute(&kernel, &lagged, bandwidth, needs_centering)?;
        let statistic = statistic_series(&band, bandwidth)?;
        notes.push(format!("stat.len={}", statistic.len()));

        let mut seed = None;
        let mut thread_count = None;
        let threshold = match manual {
            Some(value) => {
                notes.push(format!("threshold.manual={value}"));
                value
            }
            None => {
                let ThresholdRule::Bootstrap(boot) = &self.config.threshold else {
                    return Err(Error::configuration(
                        "threshold rule must be bootstrap when no manual value is supplied",
                    ));
                };
                let calibration = calibrate(&band, bandwidth, boot)?;
                seed = Some(boot.seed);
                notes.push(format!(
                    "bootstrap: reps={}, alpha={}, dep_length={}, method={:?}, used_parallel={}",
                    boot.reps,
                    boot.alpha,
                    calibration.dep_length,
                    boot.method,
                    calibration.used_parallel
                ));
                if calibration.used_parallel {
                    thread_count = current_thread_count();
                }
                notes.push(format!("threshold.bootstrap={}", calibration.threshold));
                calibration.threshold
            }
        };

        let points = extract(&statistic, threshold, &self.config.criterion, bandwidth, lag);
        notes.push(format!("points={}", points.len()));
        if statistic.max_value() == Some(0.0) {
            warnings.push("detector statistic is identically zero".to_string());
        }

        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        let diagnostics = Diagnostics {
            n: x.n(),
            p: x.p(),
            runtime_ms: Some(runtime_ms),
            notes,
            warnings,
            algorithm: Cow::Borrowed("np-mosum"),
            seed,
            thread_count,
            ..Diagnostics::default()
        };

        Ok(SingleLagResult {
            bandwidth,
            lag,
            threshold,
            points,
            statistic,
            config: self.config.clone(),
            diagnostics,
        })
    }
}

#[cfg(feature = "rayon")]
fn current_thread_count() -> Option<usize> {
    Some(rayon::current_num_threads())
}

#[cfg(not(feature = "rayon"))]
fn current_thread_count() -> Option<usize> {
    None
}

pub(crate) fn validate_lag(lag: usize, n: usize) -> Result<(), Error> {
    if lag >= n {
        return Err(Error::invalid_lag(format!(
            "lag must be < series length; got lag={lag}, n={n}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_bandwidth(bandwidth: usize, n: usize, lag: usize) -> Result<(), Error> {
    if bandwidth == 0 {
        return Err(Error::invalid_bandwidth("bandwidth G must be >= 1; got 0"));
    }
    let effective = n - lag;
    if 2 * bandwidth >= effective {
        return Err(Error::invalid_bandwidth(format!(
            "bandwidth G={bandwidth} too large: 2G must be < n - lag = {effective}"
        )));
    }
    Ok(())
}

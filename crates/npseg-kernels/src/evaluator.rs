// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{LaggedSeries, pairwise_distance_summary};
use npseg_core::{Error, KernelConfig, KernelFamily};

/// Kernel evaluator with a fully resolved scale.
///
/// Resolution happens once per (bandwidth, lag) unit; evaluation is pure
/// and symmetric in its two arguments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelEvaluator {
    family: KernelFamily,
    scale: f64,
}

impl KernelEvaluator {
    /// Resolves the kernel against the lagged embedding it will compare.
    ///
    /// With `data_driven` set, the scale of the quad.exp, gauss, and
    /// laplace families is derived from the median (or mean) of pairwise
    /// row distances; euclidean keeps its exponent and sine its frequency
    /// either way. Returned notes record what was resolved.
    pub fn resolve(
        config: &KernelConfig,
        lagged: &LaggedSeries,
    ) -> Result<(Self, Vec<String>), Error> {
        config.validate()?;

        let mut notes = vec![];
        let scale = if config.data_driven {
            match config.family {
                KernelFamily::QuadExp | KernelFamily::Gauss | KernelFamily::Laplace => {
                    let summary = pairwise_distance_summary(lagged, config.use_mean);
                    let label = if config.use_mean { "mean" } else { "median" };
                    if summary.is_finite() && summary > 0.0 {
                        let resolved = match config.family {
                            KernelFamily::Laplace => 1.0 / summary,
                            _ => 1.0 / (2.0 * summary * summary),
                        };
                        notes.push(format!(
                            "kernel.scale_auto={resolved} ({label} pairwise distance {summary})"
                        ));
                        resolved
                    } else {
                        notes.push(format!(
                            "kernel.scale_fallback=1 (degenerate {label} pairwise distance)"
                        ));
                        1.0
                    }
                }
                KernelFamily::Euclidean | KernelFamily::Sine => {
                    notes.push(format!(
                        "kernel.scale_data_driven_ignored (family={})",
                        config.family.name()
                    ));
                    config.scale
                }
            }
        } else {
            config.scale
        };

        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::numerical(format!(
                "resolved kernel scale must be finite and > 0; got {scale}"
            )));
        }

        Ok((
            Self {
                family: config.family,
                scale,
            },
            notes,
        ))
    }

    /// Evaluator with an explicit scale, bypassing resolution.
    pub fn with_scale(family: KernelFamily, scale: f64) -> Result<Self, Error> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::invalid_parameter(format!(
                "kernel scale must be finite and > 0; got {scale}"
            )));
        }
        Ok(Self { family, scale })
    }

    pub fn family(&self) -> KernelFamily {
        self.family
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Kernel value `h(x, y)`; symmetric, side-effect free.
    pub fn eval(&self, x: &[f64], y: &[f64]) -> f64 {
        let a = self.scale;
        match self.family {
            KernelFamily::QuadExp => {
                let mut product = 1.0;
                for (xc, yc) in x.iter().zip(y.iter()) {
                    let d2 = (xc - yc) * (xc - yc);
                    let denom = 1.0 + 2.0 * a * d2;
                    product *= (-a * d2 / denom).exp() / denom.sqrt();
                }
                product
            }
            KernelFamily::Gauss => {
                let mut dist_sq = 0.0;
                for (xc, yc) in x.iter().zip(y.iter()) {
                    let delta = xc - yc;
                    dist_sq += delta * delta;
                }
                (-a * dist_sq).exp()
            }
            KernelFamily::Euclidean => {
                let mut dist_sq = 0.0;
                for (xc, yc) in x.iter().zip(y.iter()) {
                    let delta = xc - yc;
                    dist_sq += delta * delta;
                }
                -dist_sq.sqrt().powf(a)
            }
            KernelFamily::Laplace => {
                let mut product = 1.0;
                for (xc, yc) in x.iter().zip(y.iter()) {
                    let delta = xc - yc;
                    product /= 1.0 + a * a * delta * delta;
                }
                product
            }
            KernelFamily::Sine => {
                let mut product = 1.0;
                for (xc, yc) in x.iter().zip(y.iter()) {
                    let arg = a * (xc - yc);
                    if arg != 0.0 {
                        product *= arg.sin() / arg;
                    }
                }
                product
            }
        }
    }
}

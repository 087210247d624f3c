// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::Error;

/// Kernel family used to compare empirical joint characteristic functions.
///
/// Product-form families apply a per-coordinate factor and multiply across
/// coordinates; norm-form families act on the Euclidean norm of the full
/// difference vector.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KernelFamily {
    /// Quadratic-exponential characteristic-function kernel (product form).
    #[default]
    QuadExp,
    /// Gaussian kernel on the difference norm.
    Gauss,
    /// Negative distance power kernel (energy-distance style).
    Euclidean,
    /// Cauchy-type factor kernel from the Laplace weighting measure
    /// (product form).
    Laplace,
    /// Sinc factor kernel (product form).
    Sine,
}

impl KernelFamily {
    /// Decodes a family from its conventional string name.
    ///
    /// This is the boundary used by callers that carry configuration as
    /// text; an unknown name is a configuration error.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "quad.exp" | "quad-exp" | "quad_exp" => Ok(Self::QuadExp),
            "gauss" => Ok(Self::Gauss),
            "euclidean" => Ok(Self::Euclidean),
            "laplace" => Ok(Self::Laplace),
            "sine" => Ok(Self::Sine),
            other => Err(Error::configuration(format!(
                "unknown kernel family {other:?}; expected one of quad.exp, gauss, euclidean, laplace, sine"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::QuadExp => "quad.exp",
            Self::Gauss => "gauss",
            Self::Euclidean => "euclidean",
            Self::Laplace => "laplace",
            Self::Sine => "sine",
        }
    }
}

/// Kernel configuration: family, scale, and how the scale is resolved.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct KernelConfig {
    pub family: KernelFamily,
    /// Scale parameter `a`; for `Euclidean` this is the distance exponent.
    pub scale: f64,
    /// Resolve the scale from pairwise distances of the lagged embedding
    /// instead of using `scale` directly.
    pub data_driven: bool,
    /// Use the mean of pairwise distances instead of the median.
    pub use_mean: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            family: KernelFamily::QuadExp,
            scale: 1.0,
            data_driven: true,
            use_mean: false,
        }
    }
}

impl KernelConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::invalid_parameter(format!(
                "kernel scale must be finite and > 0; got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Construction rule for bootstrap replicates.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BootstrapMethod {
    /// Recenter kernel terms by their empirical means before reweighting.
    /// Better power, slightly anti-conservative size.
    #[default]
    MeanSubtract,
    /// Reweight raw kernel terms. Better size control.
    NoMeanSubtract,
}

/// Multiplier-bootstrap calibration settings.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct BootstrapConfig {
    /// Target false-positive rate of the calibrated threshold.
    pub alpha: f64,
    /// Number of bootstrap replicates.
    pub reps: usize,
    /// Dependence length of the multiplier process. `None` resolves to
    /// `1.5 * m^(1/3)` against the effective sample size `m`.
    pub dep: Option<f64>,
    pub method: BootstrapMethod,
    /// Base seed for the multiplier streams.
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            reps: 200,
            dep: None,
            method: BootstrapMethod::MeanSubtract,
            seed: 0,
        }
    }
}

impl BootstrapConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(Error::invalid_parameter(format!(
                "bootstrap alpha must lie in [0, 1]; got {}",
                self.alpha
            )));
        }
        if self.reps == 0 {
            return Err(Error::invalid_parameter(
                "bootstrap reps must be >= 1; got 0",
            ));
        }
        if let Some(dep) = self.dep
            && (!dep.is_finite() || dep <= 0.0)
        {
            return Err(Error::invalid_parameter(format!(
                "bootstrap dependence length must be finite and > 0; got {dep}"
            )));
        }
        Ok(())
    }
}

/// How the rejection threshold is obtained.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum ThresholdRule {
    /// Calibrate via the dependent multiplier bootstrap.
    Bootstrap(BootstrapConfig),
    /// Caller-supplied threshold values. A single value broadcasts; the
    /// accepted lengths for multi-lag and multiscale runs are documented
    /// on the respective entry points.
    Manual(Vec<f64>),
}

impl Default for ThresholdRule {
    fn default() -> Self {
        Self::Bootstrap(BootstrapConfig::default())
    }
}

impl ThresholdRule {
    /// Single manual threshold, broadcast to every (bandwidth, lag) unit.
    pub fn manual(value: f64) -> Self {
        Self::Manual(vec![value])
    }

    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Self::Bootstrap(config) => config.validate(),
            Self::Manual(values) => {
                if values.is_empty() {
                    return Err(Error::invalid_parameter(
                        "manual threshold list must not be empty",
                    ));
                }
                for (idx, value) in values.iter().enumerate() {
                    if !value.is_finite() || *value < 0.0 {
                        return Err(Error::invalid_parameter(format!(
                            "manual threshold must be finite and >= 0; got {value} at index {idx}"
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Exceedance criterion turning statistic runs into declared points.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Criterion {
    /// Exceedance region must be at least `epsilon * G` wide; declare the
    /// region argmax.
    Epsilon,
    /// Local maximum with an `eta * G` exclusion radius.
    Eta,
    /// Both rules at once; epsilon guards against single-point spikes.
    #[default]
    EtaAndEpsilon,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CriterionConfig {
    pub criterion: Criterion,
    pub eta: f64,
    pub epsilon: f64,
}

impl Default for CriterionConfig {
    fn default() -> Self {
        Self {
            criterion: Criterion::EtaAndEpsilon,
            eta: 0.4,
            epsilon: 0.02,
        }
    }
}

impl CriterionConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.eta.is_finite() || self.eta < 0.0 {
            return Err(Error::invalid_parameter(format!(
                "criterion eta must be finite and >= 0; got {}",
                self.eta
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(Error::invalid_parameter(format!(
                "criterion epsilon must be finite and >= 0; got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Clustering strategy for candidates found at multiple lags.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Left-to-right scan over locations.
    #[default]
    Sequential,
    /// Greedy seeding in descending score order.
    BottomUp,
}

impl MergeStrategy {
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "sequential" => Ok(Self::Sequential),
            "bottom-up" | "bottom.up" | "bottom_up" => Ok(Self::BottomUp),
            other => Err(Error::configuration(format!(
                "unknown merge strategy {other:?}; expected sequential or bottom-up"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::BottomUp => "bottom-up",
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MergeConfig {
    pub strategy: MergeStrategy,
    /// Clustering radius in units of the bandwidth.
    pub eta_merge: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            strategy: MergeStrategy::Sequential,
            eta_merge: 1.0,
        }
    }
}

impl MergeConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.eta_merge.is_finite() || self.eta_merge < 0.0 {
            return Err(Error::invalid_parameter(format!(
                "eta_merge must be finite and >= 0; got {}",
                self.eta_merge
            )));
        }
        Ok(())
    }
}

/// Full detector configuration shared by every entry point.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    pub kernel: KernelConfig,
    pub threshold: ThresholdRule,
    pub criterion: CriterionConfig,
    pub merge: MergeConfig,
    /// Cross-bandwidth acceptance radius, in units of each candidate's own
    /// bandwidth (multiscale runs only).
    pub eta_bottom_up: f64,
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), Error> {
        self.kernel.validate()?;
        self.threshold.validate()?;
        self.criterion.validate()?;
        self.merge.validate()?;
        if !self.eta_bottom_up.is_finite() || self.eta_bottom_up < 0.0 {
            return Err(Error::invalid_parameter(format!(
                "eta_bottom_up must be finite and >= 0; got {}",
                self.eta_bottom_up
            )));
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            kernel: KernelConfig::default(),
            threshold: ThresholdRule::default(),
            criterion: CriterionConfig::default(),
            merge: MergeConfig::default(),
            eta_bottom_up: 0.8,
        }
    }
}

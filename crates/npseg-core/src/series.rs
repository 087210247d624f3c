// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::Error;

/// Zero-copy view over a dense row-major series of `n` observations of
/// dimension `p`.
///
/// The view is the immutable input to every detector entry point; nothing
/// in the pipeline ever writes through it.
#[derive(Clone, Copy, Debug)]
pub struct SeriesView<'a> {
    values: &'a [f64],
    n: usize,
    p: usize,
}

impl<'a> SeriesView<'a> {
    /// Constructs a validated view over `n x p` row-major values.
    pub fn new(values: &'a [f64], n: usize, p: usize) -> Result<Self, Error> {
        if n == 0 {
            return Err(Error::invalid_parameter("series length n must be >= 1"));
        }
        if p == 0 {
            return Err(Error::invalid_parameter("series dimension p must be >= 1"));
        }

        let expected_len = n.checked_mul(p).ok_or_else(|| {
            Error::dimension_mismatch(format!("n*p overflow while validating shape: n={n}, p={p}"))
        })?;
        if values.len() != expected_len {
            return Err(Error::dimension_mismatch(format!(
                "value length mismatch: got {}, expected {expected_len} (n={n}, p={p})",
                values.len()
            )));
        }

        if let Some(idx) = values.iter().position(|value| !value.is_finite()) {
            return Err(Error::invalid_parameter(format!(
                "series contains a non-finite value at flat index {idx}"
            )));
        }

        Ok(Self { values, n, p })
    }

    /// Convenience constructor for a univariate series (`p = 1`).
    pub fn univariate(values: &'a [f64]) -> Result<Self, Error> {
        Self::new(values, values.len(), 1)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn p(&self) -> usize {
        self.p
    }

    /// Observation `t` as a `p`-length slice.
    pub fn row(&self, t: usize) -> &'a [f64] {
        &self.values[t * self.p..(t + 1) * self.p]
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }
}

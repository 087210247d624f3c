// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use npseg_core::{Error, SeriesView};

/// Owned lagged embedding of a series: row `t` is `[x_t ; x_{t+lag}]`.
///
/// Built once per (bandwidth, lag) unit and read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct LaggedSeries {
    rows: Vec<f64>,
    m: usize,
    width: usize,
}

impl LaggedSeries {
    /// Embeds `series` at the given lag. `lag = 0` pairs each observation
    /// with itself.
    pub fn embed(series: &SeriesView<'_>, lag: usize) -> Result<Self, Error> {
        let n = series.n();
        if lag >= n {
            return Err(Error::invalid_lag(format!(
                "lag must be < series length; got lag={lag}, n={n}"
            )));
        }

        let p = series.p();
        let m = n - lag;
        let width = 2 * p;
        let mut rows = Vec::with_capacity(m * width);
        for t in 0..m {
            rows.extend_from_slice(series.row(t));
            rows.extend_from_slice(series.row(t + lag));
        }

        Ok(Self { rows, m, width })
    }

    /// Number of embedded rows (`n - lag`).
    pub fn len(&self) -> usize {
        self.m
    }

    pub fn is_empty(&self) -> bool {
        self.m == 0
    }

    /// Embedding dimension (`2p`).
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, t: usize) -> &[f64] {
        &self.rows[t * self.width..(t + 1) * self.width]
    }
}

#[cfg(test)]
mod tests {
    use super::LaggedSeries;
    use npseg_core::{Error, SeriesView};

    #[test]
    fn lag_zero_duplicates_each_observation() {
        let values = [1.0, 2.0, 3.0];
        let view = SeriesView::univariate(&values).expect("view should be valid");
        let lagged = LaggedSeries::embed(&view, 0).expect("embed should succeed");
        assert_eq!(lagged.len(), 3);
        assert_eq!(lagged.width(), 2);
        assert_eq!(lagged.row(0), &[1.0, 1.0]);
        assert_eq!(lagged.row(2), &[3.0, 3.0]);
    }

    #[test]
    fn positive_lag_concatenates_shifted_rows() {
        let values = [1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0];
        let view = SeriesView::new(&values, 4, 2).expect("view should be valid");
        let lagged = LaggedSeries::embed(&view, 1).expect("embed should succeed");
        assert_eq!(lagged.len(), 3);
        assert_eq!(lagged.width(), 4);
        assert_eq!(lagged.row(0), &[1.0, 10.0, 2.0, 20.0]);
        assert_eq!(lagged.row(2), &[3.0, 30.0, 4.0, 40.0]);
    }

    #[test]
    fn lag_at_or_beyond_length_is_invalid() {
        let values = [1.0, 2.0, 3.0];
        let view = SeriesView::univariate(&values).expect("view should be valid");
        let err = LaggedSeries::embed(&view, 3).expect_err("lag=n must fail");
        assert!(matches!(err, Error::InvalidLag(_)));
        let err = LaggedSeries::embed(&view, 7).expect_err("lag>n must fail");
        assert!(err.to_string().contains("lag"));
    }
}

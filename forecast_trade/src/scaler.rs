//! Per-column min-max scaling

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

/// Maps each column linearly onto [0, 1] using bounds captured at fit time
///
/// A constant column gets a unit range, so it scales to 0.0 and inverts back
/// to the constant.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: Array1<f64>,
    range: Array1<f64>,
}

impl MinMaxScaler {
    /// Capture per-column bounds
    pub fn fit(data: ArrayView2<'_, f64>) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(ForecastError::InvalidParameter(
                "cannot fit a scaler on an empty matrix".to_string(),
            ));
        }

        let min = data.fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
        let max = data.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));
        if min.iter().chain(max.iter()).any(|v| !v.is_finite()) {
            return Err(ForecastError::Numeric("scaler bounds are not finite".to_string()));
        }

        let range = Zip::from(&max)
            .and(&min)
            .map_collect(|&hi, &lo| if hi > lo { hi - lo } else { 1.0 });

        Ok(Self { min, range })
    }

    /// Fit on a single column, such as the regression target
    pub fn fit_column(values: ArrayView1<'_, f64>) -> Result<Self> {
        Self::fit(values.insert_axis(Axis(1)))
    }

    pub fn n_columns(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> ArrayView1<'_, f64> {
        self.min.view()
    }

    /// `max - min` per column (1.0 for constant columns)
    pub fn range(&self) -> ArrayView1<'_, f64> {
        self.range.view()
    }

    /// `(x - min) / (max - min)` per column
    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(data.ncols())?;
        let mut out = data.to_owned();
        for mut row in out.rows_mut() {
            Zip::from(&mut row)
                .and(&self.min)
                .and(&self.range)
                .for_each(|x, &lo, &r| *x = (*x - lo) / r);
        }
        Ok(out)
    }

    /// `x * (max - min) + min` per column
    pub fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(data.ncols())?;
        let mut out = data.to_owned();
        for mut row in out.rows_mut() {
            Zip::from(&mut row)
                .and(&self.min)
                .and(&self.range)
                .for_each(|x, &lo, &r| *x = *x * r + lo);
        }
        Ok(out)
    }

    /// Scale values of a single-column scaler
    pub fn transform_column(&self, values: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(1)?;
        Ok(values.mapv(|x| (x - self.min[0]) / self.range[0]))
    }

    /// Undo [`transform_column`](Self::transform_column)
    pub fn inverse_column(&self, values: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(1)?;
        Ok(values.mapv(|x| x * self.range[0] + self.min[0]))
    }

    fn check_width(&self, ncols: usize) -> Result<()> {
        if ncols != self.n_columns() {
            return Err(ForecastError::InvalidParameter(format!(
                "scaler was fitted on {} columns, got {}",
                self.n_columns(),
                ncols
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_bounds_map_exactly() {
        let data = array![[10.0, -3.0], [20.0, 7.0], [15.0, 2.0]];
        let scaler = MinMaxScaler::fit(data.view()).unwrap();
        let scaled = scaler.transform(data.view()).unwrap();

        assert_eq!(scaled[[0, 0]], 0.0);
        assert_eq!(scaled[[1, 0]], 1.0);
        assert_eq!(scaled[[0, 1]], 0.0);
        assert_eq!(scaled[[1, 1]], 1.0);
        assert_abs_diff_eq!(scaled[[2, 0]], 0.5);
    }

    #[test]
    fn test_round_trip() {
        let data = Array2::from_shape_fn((50, 3), |(r, c)| (r as f64 * 1.37 + c as f64).sin() * 100.0);
        let scaler = MinMaxScaler::fit(data.view()).unwrap();
        let restored = scaler
            .inverse_transform(scaler.transform(data.view()).unwrap().view())
            .unwrap();

        for (a, b) in data.iter().zip(restored.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_constant_column() {
        let data = array![[5.0, 1.0], [5.0, 2.0]];
        let scaler = MinMaxScaler::fit(data.view()).unwrap();
        let scaled = scaler.transform(data.view()).unwrap();

        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 0.0]);
        let restored = scaler.inverse_transform(scaled.view()).unwrap();
        assert_eq!(restored.column(0).to_vec(), vec![5.0, 5.0]);
    }

    #[test]
    fn test_single_column_scaler() {
        let close = array![100.0, 110.0, 90.0];
        let scaler = MinMaxScaler::fit_column(close.view()).unwrap();
        let scaled = scaler.transform_column(close.view()).unwrap();

        assert_eq!(scaled.to_vec(), vec![0.5, 1.0, 0.0]);
        let restored = scaler.inverse_column(scaled.view()).unwrap();
        assert_abs_diff_eq!(restored[0], 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_errors() {
        assert!(MinMaxScaler::fit(Array2::<f64>::zeros((0, 3)).view()).is_err());

        let scaler = MinMaxScaler::fit(array![[1.0, 2.0]].view()).unwrap();
        assert!(matches!(
            scaler.transform(array![[1.0, 2.0, 3.0]].view()),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(scaler.transform_column(array![1.0].view()).is_err());
    }
}

//! Supervised window construction
//!
//! For a scaled matrix of `n` rows, every start index `i` with
//! `seq_len <= i <= n - pred_days` yields one example: rows `[i - seq_len, i)`
//! as input and target values `[i, i + pred_days)` as the label. Windows stay
//! in chronological order.

use crate::error::{ForecastError, Result};
use candle_core::{Device, Tensor};
use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, Axis};
use tracing::debug;

/// Number of windows a series of `rows` yields
pub fn window_count(rows: usize, seq_len: usize, pred_days: usize) -> usize {
    (rows + 1).saturating_sub(seq_len + pred_days)
}

/// Slices scaled features into `(input, target)` pairs
#[derive(Debug, Clone, Copy)]
pub struct SequenceWindower {
    seq_len: usize,
    pred_days: usize,
}

impl SequenceWindower {
    pub fn new(seq_len: usize, pred_days: usize) -> Result<Self> {
        if seq_len == 0 || pred_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "window and horizon lengths must be greater than zero".to_string(),
            ));
        }
        Ok(Self { seq_len, pred_days })
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn pred_days(&self) -> usize {
        self.pred_days
    }

    /// Build every window; an input too short for one window gives an empty set
    pub fn windows(&self, features: ArrayView2<'_, f64>, target: ArrayView1<'_, f64>) -> Result<WindowSet> {
        let rows = features.nrows();
        if target.len() != rows {
            return Err(ForecastError::InvalidParameter(format!(
                "feature rows ({rows}) and target length ({}) differ",
                target.len()
            )));
        }

        let count = window_count(rows, self.seq_len, self.pred_days);
        let n_features = features.ncols();

        let inputs = Array3::from_shape_fn((count, self.seq_len, n_features), |(w, t, f)| {
            features[[w + t, f]] as f32
        });
        let targets = Array2::from_shape_fn((count, self.pred_days), |(w, h)| {
            target[w + self.seq_len + h] as f32
        });

        debug!(rows, windows = count, "built sequence windows");
        Ok(WindowSet { inputs, targets })
    }
}

/// Inputs shaped `(windows, seq_len, features)` and targets `(windows, pred_days)`
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSet {
    inputs: Array3<f32>,
    targets: Array2<f32>,
}

impl WindowSet {
    pub fn len(&self) -> usize {
        self.inputs.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inputs(&self) -> &Array3<f32> {
        &self.inputs
    }

    pub fn targets(&self) -> &Array2<f32> {
        &self.targets
    }

    /// Chronological split: the first `floor(len * fraction)` windows train
    pub fn split(&self, fraction: f64) -> (WindowSet, WindowSet) {
        let cut = ((self.len() as f64) * fraction).floor() as usize;
        let cut = cut.min(self.len());
        let head = WindowSet {
            inputs: self.inputs.slice(s![..cut, .., ..]).to_owned(),
            targets: self.targets.slice(s![..cut, ..]).to_owned(),
        };
        let tail = WindowSet {
            inputs: self.inputs.slice(s![cut.., .., ..]).to_owned(),
            targets: self.targets.slice(s![cut.., ..]).to_owned(),
        };
        (head, tail)
    }

    pub fn inputs_tensor(&self, device: &Device) -> Result<Tensor> {
        let shape = self.inputs.dim();
        let data: Vec<f32> = self.inputs.iter().copied().collect();
        Ok(Tensor::from_vec(data, shape, device)?)
    }

    pub fn targets_tensor(&self, device: &Device) -> Result<Tensor> {
        let shape = self.targets.dim();
        let data: Vec<f32> = self.targets.iter().copied().collect();
        Ok(Tensor::from_vec(data, shape, device)?)
    }
}

/// A single `(1, rows, features)` batch from the given rows
pub fn batch_of_one(rows: ArrayView2<'_, f64>, device: &Device) -> Result<Tensor> {
    let (n, f) = rows.dim();
    let data: Vec<f32> = rows.iter().map(|&v| v as f32).collect();
    Ok(Tensor::from_vec(data, (1, n, f), device)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use rstest::rstest;

    fn series(rows: usize) -> (Array2<f64>, Array1<f64>) {
        let features = Array2::from_shape_fn((rows, 2), |(r, c)| (r * 10 + c) as f64);
        let target = Array1::from_shape_fn(rows, |r| r as f64);
        (features, target)
    }

    #[rstest]
    #[case(134, 60, 14, 61)]
    #[case(74, 60, 14, 1)]
    #[case(73, 60, 14, 0)]
    #[case(0, 60, 14, 0)]
    #[case(10, 3, 2, 6)]
    fn test_window_count(#[case] rows: usize, #[case] seq: usize, #[case] pred: usize, #[case] expected: usize) {
        assert_eq!(window_count(rows, seq, pred), expected);

        let (features, target) = series(rows);
        let set = SequenceWindower::new(seq, pred)
            .unwrap()
            .windows(features.view(), target.view())
            .unwrap();
        assert_eq!(set.len(), expected);
    }

    #[test]
    fn test_window_alignment() {
        let (features, target) = series(10);
        let set = SequenceWindower::new(3, 2)
            .unwrap()
            .windows(features.view(), target.view())
            .unwrap();

        // second window: inputs rows 1..4, targets 4..6
        assert_eq!(set.inputs()[[1, 0, 0]], 10.0);
        assert_eq!(set.inputs()[[1, 2, 1]], 31.0);
        assert_eq!(set.targets().row(1).to_vec(), vec![4.0, 5.0]);

        let last = set.len() - 1;
        assert_eq!(set.targets().row(last).to_vec(), vec![8.0, 9.0]);
    }

    #[test]
    fn test_split_is_chronological() {
        let (features, target) = series(134);
        let set = SequenceWindower::new(60, 14)
            .unwrap()
            .windows(features.view(), target.view())
            .unwrap();
        let (train, eval) = set.split(0.85);

        assert_eq!(train.len(), 51);
        assert_eq!(eval.len(), 10);
        assert_eq!(train.targets()[[0, 0]], 60.0);
        assert_eq!(eval.targets()[[0, 0]], 111.0);
    }

    #[test]
    fn test_tensors_keep_layout() {
        let (features, target) = series(10);
        let set = SequenceWindower::new(3, 2)
            .unwrap()
            .windows(features.view(), target.view())
            .unwrap();
        let inputs = set.inputs_tensor(&Device::Cpu).unwrap();
        assert_eq!(inputs.dims(), &[6, 3, 2]);

        let v = inputs.to_vec3::<f32>().unwrap();
        assert_eq!(v[1][2][1], 31.0);
        assert_eq!(set.targets_tensor(&Device::Cpu).unwrap().dims(), &[6, 2]);

        let one = batch_of_one(features.slice(s![7.., ..]), &Device::Cpu).unwrap();
        assert_eq!(one.dims(), &[1, 3, 2]);
    }

    #[test]
    fn test_mismatched_target() {
        let (features, _) = series(10);
        let short = Array1::<f64>::zeros(9);
        assert!(SequenceWindower::new(3, 2)
            .unwrap()
            .windows(features.view(), short.view())
            .is_err());
    }
}

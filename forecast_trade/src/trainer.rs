//! Fixed-budget training loop
//!
//! Every epoch sets the cosine-annealed learning rate, runs one optimizer
//! step per batch (the whole training split by default), clips gradients by
//! global L2 norm and applies AdamW. There is no early stopping: the
//! evaluation split is scored once at the end and only reported.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use crate::models::{parameter_count, ForecastModel};
use crate::observer::{EpochProgress, PipelineObserver};
use crate::windows::WindowSet;
use candle_core::backprop::GradStore;
use candle_core::{Device, Tensor, Var};
use candle_nn::{AdamW, ModuleT, Optimizer, ParamsAdamW, VarMap};
use serde::Serialize;
use std::f64::consts::PI;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Mean Huber loss: quadratic for residuals within `delta`, linear beyond
pub fn huber_loss(pred: &Tensor, target: &Tensor, delta: f64) -> candle_core::Result<Tensor> {
    let abs = (pred - target)?.abs()?;
    let limit = Tensor::full(delta, abs.shape(), abs.device())?.to_dtype(abs.dtype())?;
    let clipped = abs.minimum(&limit)?;
    // clipped * (|r| - clipped / 2) equals r^2 / 2 inside delta, delta * (|r| - delta / 2) outside
    let linear_part = (&abs - (&clipped * 0.5)?)?;
    (&clipped * linear_part)?.mean_all()
}

/// Learning rate for 0-based `epoch` under cosine annealing to zero
pub fn cosine_lr(base_lr: f64, epoch: usize, epochs: usize) -> f64 {
    if epochs == 0 {
        return base_lr;
    }
    base_lr * 0.5 * (1.0 + (PI * epoch as f64 / epochs as f64).cos())
}

/// Rescale all gradients so their joint L2 norm is at most `max_norm`
///
/// Returns the norm measured before clipping.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: f64) -> Result<f64> {
    let mut sum_sq = 0f64;
    for var in vars {
        if let Some(grad) = grads.get(var.as_tensor()) {
            sum_sq += grad.sqr()?.sum_all()?.to_dtype(candle_core::DType::F64)?.to_scalar::<f64>()?;
        }
    }
    let norm = sum_sq.sqrt();

    if norm > max_norm {
        let scale = max_norm / (norm + 1e-6);
        for var in vars {
            let scaled = match grads.get(var.as_tensor()) {
                Some(grad) => (grad * scale)?,
                None => continue,
            };
            grads.insert(var.as_tensor(), scaled);
        }
    }

    Ok(norm)
}

/// What a training run did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub epochs: usize,
    pub epoch_losses: Vec<f64>,
    pub learning_rates: Vec<f64>,
    pub final_loss: f64,
    /// Loss on the held-out windows, when there are any
    pub eval_loss: Option<f64>,
    pub train_windows: usize,
    pub eval_windows: usize,
    pub parameters: usize,
    pub elapsed: Duration,
}

/// Optimisation settings taken from [`ForecastConfig`]
#[derive(Debug, Clone)]
pub struct Trainer {
    epochs: usize,
    learning_rate: f64,
    weight_decay: f64,
    huber_delta: f64,
    grad_clip: f64,
    batch_size: Option<usize>,
    log_every: usize,
}

impl Trainer {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            epochs: config.epochs,
            learning_rate: config.learning_rate,
            weight_decay: config.weight_decay,
            huber_delta: config.huber_delta,
            grad_clip: config.grad_clip,
            batch_size: config.batch_size,
            log_every: config.log_every.max(1),
        }
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Train `model` in place on `train`, then score `eval`
    pub fn fit(
        &self,
        model: &ForecastModel,
        varmap: &VarMap,
        train: &WindowSet,
        eval: &WindowSet,
        device: &Device,
        observer: &dyn PipelineObserver,
    ) -> Result<TrainingReport> {
        if train.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "training split contains no windows".to_string(),
            ));
        }

        let started = Instant::now();
        let inputs = train.inputs_tensor(device)?;
        let targets = train.targets_tensor(device)?;
        let n = train.len();
        let batch = self.batch_size.unwrap_or(n).min(n);

        let vars = varmap.all_vars();
        let parameters = parameter_count(varmap);
        let mut optimizer = AdamW::new(
            vars.clone(),
            ParamsAdamW {
                lr: self.learning_rate,
                weight_decay: self.weight_decay,
                ..Default::default()
            },
        )?;

        info!(
            epochs = self.epochs,
            train_windows = n,
            eval_windows = eval.len(),
            batch,
            parameters,
            "starting training"
        );

        let mut epoch_losses = Vec::with_capacity(self.epochs);
        let mut learning_rates = Vec::with_capacity(self.epochs);

        for epoch in 0..self.epochs {
            let lr = cosine_lr(self.learning_rate, epoch, self.epochs);
            optimizer.set_learning_rate(lr);

            let mut weighted_loss = 0f64;
            let mut start = 0;
            while start < n {
                let len = batch.min(n - start);
                let xs = inputs.narrow(0, start, len)?;
                let ys = targets.narrow(0, start, len)?;

                let loss = huber_loss(&model.forward_t(&xs, true)?, &ys, self.huber_delta)?;
                let value = f64::from(loss.to_scalar::<f32>()?);
                if !value.is_finite() {
                    return Err(ForecastError::Numeric(format!(
                        "training loss became {value} in epoch {}",
                        epoch + 1
                    )));
                }

                let mut grads = loss.backward()?;
                let norm = clip_grad_norm(&mut grads, &vars, self.grad_clip)?;
                optimizer.step(&grads)?;

                debug!(epoch = epoch + 1, start, len, loss = value, grad_norm = norm, "batch step");
                weighted_loss += value * len as f64;
                start += len;
            }

            let epoch_loss = weighted_loss / n as f64;
            epoch_losses.push(epoch_loss);
            learning_rates.push(lr);

            let progress = EpochProgress {
                epoch: epoch + 1,
                epochs: self.epochs,
                loss: epoch_loss,
                learning_rate: lr,
            };
            observer.epoch_completed(&progress);
            if progress.epoch % self.log_every == 0 {
                info!(epoch = progress.epoch, epochs = self.epochs, loss = epoch_loss, lr, "epoch complete");
            }
        }

        let eval_loss = if eval.is_empty() {
            None
        } else {
            let preds = model.forward_t(&eval.inputs_tensor(device)?, false)?;
            let loss = huber_loss(&preds, &eval.targets_tensor(device)?, self.huber_delta)?;
            Some(f64::from(loss.to_scalar::<f32>()?))
        };

        let report = TrainingReport {
            epochs: self.epochs,
            final_loss: epoch_losses.last().copied().unwrap_or(f64::NAN),
            epoch_losses,
            learning_rates,
            eval_loss,
            train_windows: n,
            eval_windows: eval.len(),
            parameters,
            elapsed: started.elapsed(),
        };
        info!(
            final_loss = report.final_loss,
            eval_loss = ?report.eval_loss,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "training finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{build_model, ModelShape};
    use crate::observer::NoopObserver;
    use crate::windows::SequenceWindower;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2};
    use std::sync::Mutex;

    fn scalar(values: &[f32]) -> Tensor {
        Tensor::new(values, &Device::Cpu).unwrap()
    }

    #[test]
    fn test_huber_loss_regions() {
        let pred = scalar(&[0.5, 3.0, -2.0]);
        let target = scalar(&[0.0, 0.0, 0.0]);
        let loss = huber_loss(&pred, &target, 1.0).unwrap().to_scalar::<f32>().unwrap();

        // 0.5 * 0.25, 1 * (3 - 0.5), 1 * (2 - 0.5)
        let expected = (0.125 + 2.5 + 1.5) / 3.0;
        assert_relative_eq!(loss, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_schedule() {
        assert_relative_eq!(cosine_lr(1e-3, 0, 40), 1e-3);
        assert_relative_eq!(cosine_lr(1e-3, 20, 40), 5e-4, epsilon = 1e-12);
        assert!(cosine_lr(1e-3, 39, 40) < 1e-5);
        assert_relative_eq!(cosine_lr(1e-3, 40, 40), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clip_grad_norm() {
        let a = Var::new(&[3f32, 0.0], &Device::Cpu).unwrap();
        let b = Var::new(&[0f32, 4.0], &Device::Cpu).unwrap();
        // d/dx sum(x * c) = c
        let loss = ((a.as_tensor() * scalar(&[3.0, 0.0])).unwrap().sum_all().unwrap()
            + (b.as_tensor() * scalar(&[0.0, 4.0])).unwrap().sum_all().unwrap())
        .unwrap();
        let mut grads = loss.backward().unwrap();
        let vars = vec![a.clone(), b.clone()];

        let norm = clip_grad_norm(&mut grads, &vars, 1.0).unwrap();
        assert_relative_eq!(norm, 5.0, epsilon = 1e-6);

        let ga = grads.get(a.as_tensor()).unwrap().to_vec1::<f32>().unwrap();
        let gb = grads.get(b.as_tensor()).unwrap().to_vec1::<f32>().unwrap();
        assert_relative_eq!(ga[0], 0.6, epsilon = 1e-5);
        assert_relative_eq!(gb[1], 0.8, epsilon = 1e-5);

        // already inside the limit: untouched
        let norm = clip_grad_norm(&mut grads, &vars, 10.0).unwrap();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-4);
    }

    #[derive(Default)]
    struct Epochs(Mutex<Vec<EpochProgress>>);

    impl PipelineObserver for Epochs {
        fn epoch_completed(&self, progress: &EpochProgress) {
            self.0.lock().unwrap().push(*progress);
        }
    }

    fn small_run(batch_size: Option<usize>) -> (TrainingReport, Vec<EpochProgress>) {
        let config = ForecastConfig {
            seq_len: 8,
            pred_days: 3,
            d_model: 8,
            n_heads: 2,
            n_layers: 1,
            epochs: 6,
            learning_rate: 1e-2,
            batch_size,
            log_every: 2,
            ..Default::default()
        };
        let rows = 40;
        let features = Array2::from_shape_fn((rows, 2), |(r, c)| ((r + c) as f64 * 0.3).sin() * 0.5 + 0.5);
        let target = Array1::from_shape_fn(rows, |r| (r as f64 * 0.3).sin() * 0.5 + 0.5);
        let windows = SequenceWindower::new(8, 3)
            .unwrap()
            .windows(features.view(), target.view())
            .unwrap();
        let (train, eval) = windows.split(config.train_fraction);

        let (varmap, model) = build_model(ModelShape::from_config(&config, 2), &Device::Cpu).unwrap();
        let observer = Epochs::default();
        let report = Trainer::new(&config)
            .fit(&model, &varmap, &train, &eval, &Device::Cpu, &observer)
            .unwrap();
        let seen = observer.0.into_inner().unwrap();
        (report, seen)
    }

    #[test]
    fn test_fit_runs_every_epoch() {
        let (report, seen) = small_run(None);

        assert_eq!(report.epochs, 6);
        assert_eq!(report.epoch_losses.len(), 6);
        assert_eq!(report.learning_rates.len(), 6);
        assert_relative_eq!(report.learning_rates[0], 1e-2);
        assert!(report.learning_rates.windows(2).all(|w| w[1] < w[0]));
        assert_eq!(report.train_windows + report.eval_windows, 40 - 8 - 3 + 1);
        assert!(report.final_loss.is_finite());
        assert!(report.eval_loss.is_some_and(f64::is_finite));
        assert!(report.parameters > 0);

        assert_eq!(seen.len(), 6);
        assert_eq!(seen.last().unwrap().epoch, 6);
    }

    #[test]
    fn test_fit_with_mini_batches() {
        let (report, _) = small_run(Some(7));
        assert_eq!(report.epoch_losses.len(), 6);
        assert!(report.epoch_losses.iter().all(|l| l.is_finite()));
    }

    #[test]
    fn test_empty_training_split() {
        let config = ForecastConfig {
            d_model: 8,
            n_heads: 2,
            ..Default::default()
        };
        let features = Array2::<f64>::zeros((5, 2));
        let target = Array1::<f64>::zeros(5);
        let empty = SequenceWindower::new(60, 14)
            .unwrap()
            .windows(features.view(), target.view())
            .unwrap();
        let (varmap, model) = build_model(ModelShape::from_config(&config, 2), &Device::Cpu).unwrap();

        let err = Trainer::new(&config)
            .fit(&model, &varmap, &empty, &empty, &Device::Cpu, &NoopObserver)
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }
}

//! Attention-based direct multi-horizon regressor

use super::encoder::{Encoder, PositionalEncoding};
use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use candle_core::Tensor;
use candle_nn::{linear, Dropout, Linear, Module, ModuleT, VarBuilder};

/// Shape hyper-parameters of a [`ForecastModel`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelShape {
    pub n_features: usize,
    pub seq_len: usize,
    pub pred_days: usize,
    pub d_model: usize,
    pub n_heads: usize,
    pub n_layers: usize,
    pub ff_dim: usize,
    pub dropout: f32,
}

impl ModelShape {
    pub fn from_config(config: &ForecastConfig, n_features: usize) -> Self {
        Self {
            n_features,
            seq_len: config.seq_len,
            pred_days: config.pred_days,
            d_model: config.d_model,
            n_heads: config.n_heads,
            n_layers: config.n_layers,
            ff_dim: config.ff_dim(),
            dropout: config.dropout as f32,
        }
    }

    fn check(&self) -> Result<()> {
        if self.n_heads == 0 || self.d_model % self.n_heads != 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "d_model ({}) must be divisible by n_heads ({})",
                self.d_model, self.n_heads
            )));
        }
        if self.d_model < 2 || self.d_model % 2 != 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "d_model ({}) must be even",
                self.d_model
            )));
        }
        if self.n_features == 0 || self.seq_len == 0 || self.pred_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "features, window and horizon must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Maps `(batch, seq_len, n_features)` windows to `(batch, pred_days)` forecasts
///
/// Each timestep is projected into `d_model`, summed with the positional
/// table, passed through the encoder stack, and the last timestep's embedding
/// is decoded by a two-layer head.
#[derive(Debug, Clone)]
pub struct ForecastModel {
    input_proj: Linear,
    positional: PositionalEncoding,
    encoder: Encoder,
    head_hidden: Linear,
    head_dropout: Dropout,
    head_out: Linear,
    shape: ModelShape,
}

impl ForecastModel {
    pub fn new(shape: ModelShape, vb: VarBuilder) -> Result<Self> {
        shape.check()?;

        let half = shape.d_model / 2;
        Ok(Self {
            input_proj: linear(shape.n_features, shape.d_model, vb.pp("input_proj"))?,
            positional: PositionalEncoding::new(shape.seq_len, shape.d_model, shape.dropout, vb.device())?,
            encoder: Encoder::new(
                shape.n_layers,
                shape.d_model,
                shape.n_heads,
                shape.ff_dim,
                shape.dropout,
                vb.pp("encoder"),
            )?,
            head_hidden: linear(shape.d_model, half, vb.pp("head.0"))?,
            head_dropout: Dropout::new(shape.dropout),
            head_out: linear(half, shape.pred_days, vb.pp("head.3"))?,
            shape,
        })
    }

    pub fn shape(&self) -> &ModelShape {
        &self.shape
    }

    /// Inference pass with dropout disabled
    pub fn predict(&self, xs: &Tensor) -> Result<Tensor> {
        Ok(self.forward_t(xs, false)?)
    }
}

impl ModuleT for ForecastModel {
    fn forward_t(&self, xs: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        let seq_len = xs.dim(1)?;

        let xs = self.input_proj.forward(xs)?;
        let xs = self.positional.forward_t(&xs, train)?;
        let xs = self.encoder.forward_t(&xs, train)?;

        let last = xs.narrow(1, seq_len - 1, 1)?.squeeze(1)?;
        let hidden = self.head_hidden.forward(&last)?.relu()?;
        let hidden = self.head_dropout.forward_t(&hidden, train)?;
        self.head_out.forward(&hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;
    use rstest::rstest;

    fn small_shape() -> ModelShape {
        ModelShape {
            n_features: 14,
            seq_len: 12,
            pred_days: 5,
            d_model: 16,
            n_heads: 4,
            n_layers: 2,
            ff_dim: 64,
            dropout: 0.1,
        }
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    fn test_output_is_pred_days_wide(#[case] batch: usize) {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = ForecastModel::new(small_shape(), vb).unwrap();

        let x = Tensor::rand(0f32, 1.0, (batch, 12, 14), &Device::Cpu).unwrap();
        assert_eq!(model.predict(&x).unwrap().dims(), &[batch, 5]);
        assert_eq!(model.forward_t(&x, true).unwrap().dims(), &[batch, 5]);
    }

    #[test]
    fn test_inference_is_deterministic() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = ForecastModel::new(small_shape(), vb).unwrap();

        let x = Tensor::rand(0f32, 1.0, (2, 12, 14), &Device::Cpu).unwrap();
        let a = model.predict(&x).unwrap().to_vec2::<f32>().unwrap();
        let b = model.predict(&x).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_default_config_shape() {
        let config = ForecastConfig::default();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = ForecastModel::new(ModelShape::from_config(&config, 14), vb).unwrap();

        let x = Tensor::zeros((1, 60, 14), DType::F32, &Device::Cpu).unwrap();
        assert_eq!(model.predict(&x).unwrap().dims(), &[1, 14]);
    }

    #[test]
    fn test_indivisible_heads_rejected() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let shape = ModelShape {
            n_heads: 3,
            ..small_shape()
        };
        assert!(matches!(
            ForecastModel::new(shape, vb),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}

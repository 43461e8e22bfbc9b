//! Positional encoding and post-norm transformer encoder blocks

use super::attention::MultiHeadSelfAttention;
use candle_core::{Device, Result, Tensor};
use candle_nn::{layer_norm, linear, Dropout, LayerNorm, Linear, Module, ModuleT, VarBuilder};

/// Fixed sinusoidal table added to the embeddings, followed by dropout
///
/// Row `p`, columns `2k` and `2k + 1` hold `sin(p * w_k)` and `cos(p * w_k)`
/// with `w_k = 10000^(-2k / d_model)`.
#[derive(Debug, Clone)]
pub struct PositionalEncoding {
    table: Tensor,
    dropout: Dropout,
}

impl PositionalEncoding {
    pub fn new(max_len: usize, d_model: usize, dropout: f32, device: &Device) -> Result<Self> {
        let mut values = vec![0f32; max_len * d_model];
        for pos in 0..max_len {
            for k in 0..d_model / 2 {
                let omega = 10000f64.powf(-2.0 * k as f64 / d_model as f64);
                let angle = pos as f64 * omega;
                values[pos * d_model + 2 * k] = angle.sin() as f32;
                values[pos * d_model + 2 * k + 1] = angle.cos() as f32;
            }
        }

        Ok(Self {
            table: Tensor::from_vec(values, (max_len, d_model), device)?,
            dropout: Dropout::new(dropout),
        })
    }

    /// The raw `(max_len, d_model)` table
    pub fn table(&self) -> &Tensor {
        &self.table
    }
}

impl ModuleT for PositionalEncoding {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let seq_len = xs.dim(1)?;
        let pe = self.table.narrow(0, 0, seq_len)?.to_dtype(xs.dtype())?;
        let xs = xs.broadcast_add(&pe)?;
        self.dropout.forward_t(&xs, train)
    }
}

/// Self-attention and feed-forward sublayers, each followed by residual add
/// and layer norm
#[derive(Debug, Clone)]
pub struct EncoderLayer {
    attention: MultiHeadSelfAttention,
    norm1: LayerNorm,
    ff_in: Linear,
    ff_out: Linear,
    norm2: LayerNorm,
    dropout: Dropout,
}

impl EncoderLayer {
    pub fn new(d_model: usize, n_heads: usize, ff_dim: usize, dropout: f32, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            attention: MultiHeadSelfAttention::new(d_model, n_heads, dropout, vb.pp("self_attn"))?,
            norm1: layer_norm(d_model, 1e-5, vb.pp("norm1"))?,
            ff_in: linear(d_model, ff_dim, vb.pp("linear1"))?,
            ff_out: linear(ff_dim, d_model, vb.pp("linear2"))?,
            norm2: layer_norm(d_model, 1e-5, vb.pp("norm2"))?,
            dropout: Dropout::new(dropout),
        })
    }
}

impl ModuleT for EncoderLayer {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let attended = self.attention.forward(xs, train)?;
        let xs = self
            .norm1
            .forward(&(xs + self.dropout.forward_t(&attended, train)?)?)?;

        let hidden = self.ff_in.forward(&xs)?.relu()?;
        let hidden = self.dropout.forward_t(&hidden, train)?;
        let ff = self.ff_out.forward(&hidden)?;

        self.norm2
            .forward(&(&xs + self.dropout.forward_t(&ff, train)?)?)
    }
}

/// A stack of [`EncoderLayer`]s
#[derive(Debug, Clone)]
pub struct Encoder {
    layers: Vec<EncoderLayer>,
}

impl Encoder {
    pub fn new(
        n_layers: usize,
        d_model: usize,
        n_heads: usize,
        ff_dim: usize,
        dropout: f32,
        vb: VarBuilder,
    ) -> Result<Self> {
        let layers = (0..n_layers)
            .map(|i| EncoderLayer::new(d_model, n_heads, ff_dim, dropout, vb.pp(format!("layers.{i}"))))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layers })
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl ModuleT for Encoder {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let mut xs = xs.clone();
        for layer in &self.layers {
            xs = layer.forward_t(&xs, train)?;
        }
        Ok(xs)
    }
}

//! Multi-head self-attention over a full (unmasked) window

use candle_core::{Result, Tensor, D};
use candle_nn::{linear, Linear, Module, VarBuilder};

/// Scaled dot-product attention with dropout on the attention weights
pub fn scaled_dot_product_attention(
    query: &Tensor,
    key: &Tensor,
    value: &Tensor,
    dropout: f32,
    train: bool,
) -> Result<Tensor> {
    let scale = 1.0 / (query.dim(D::Minus1)? as f64).sqrt();

    let scores = (query.matmul(&key.t()?)? * scale)?;
    let weights = candle_nn::ops::softmax(&scores, D::Minus1)?;
    let weights = if train && dropout > 0.0 {
        candle_nn::ops::dropout(&weights, dropout)?
    } else {
        weights
    };

    weights.matmul(value)
}

/// Self-attention with `n_heads` heads sharing a `d_model` embedding
#[derive(Debug, Clone)]
pub struct MultiHeadSelfAttention {
    query_proj: Linear,
    key_proj: Linear,
    value_proj: Linear,
    output_proj: Linear,
    n_heads: usize,
    head_dim: usize,
    dropout: f32,
}

impl MultiHeadSelfAttention {
    /// `d_model` must be divisible by `n_heads`; callers check this first.
    pub fn new(d_model: usize, n_heads: usize, dropout: f32, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            query_proj: linear(d_model, d_model, vb.pp("query"))?,
            key_proj: linear(d_model, d_model, vb.pp("key"))?,
            value_proj: linear(d_model, d_model, vb.pp("value"))?,
            output_proj: linear(d_model, d_model, vb.pp("output"))?,
            n_heads,
            head_dim: d_model / n_heads,
            dropout,
        })
    }

    /// `[batch, seq, d_model]` in, same shape out
    pub fn forward(&self, x: &Tensor, train: bool) -> Result<Tensor> {
        let (batch, seq_len, d_model) = x.dims3()?;

        let split_heads = |t: Tensor| -> Result<Tensor> {
            t.reshape((batch, seq_len, self.n_heads, self.head_dim))?
                .transpose(1, 2)?
                .contiguous()
        };
        let q = split_heads(self.query_proj.forward(x)?)?;
        let k = split_heads(self.key_proj.forward(x)?)?;
        let v = split_heads(self.value_proj.forward(x)?)?;

        let context = scaled_dot_product_attention(&q, &k, &v, self.dropout, train)?;
        let context = context
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch, seq_len, d_model))?;

        self.output_proj.forward(&context)
    }
}

//! Sequence model built on candle

pub mod attention;
pub mod encoder;
pub mod transformer;

pub use transformer::{ForecastModel, ModelShape};

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};

use crate::error::Result;

/// A freshly initialised model together with the variables it trains
pub fn build_model(shape: ModelShape, device: &Device) -> Result<(VarMap, ForecastModel)> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    let model = ForecastModel::new(shape, vb)?;
    Ok((varmap, model))
}

/// Total number of trainable scalars
pub fn parameter_count(varmap: &VarMap) -> usize {
    varmap.all_vars().iter().map(|v| v.elem_count()).sum()
}

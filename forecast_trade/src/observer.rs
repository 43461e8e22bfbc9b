//! Hooks for watching a forecast run

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Stages of one forecast request, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Fetch,
    Features,
    Scale,
    Window,
    Train,
    Infer,
    Format,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 7] = [
        PipelineStage::Fetch,
        PipelineStage::Features,
        PipelineStage::Scale,
        PipelineStage::Window,
        PipelineStage::Train,
        PipelineStage::Infer,
        PipelineStage::Format,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Fetch => "fetch",
            PipelineStage::Features => "features",
            PipelineStage::Scale => "scale",
            PipelineStage::Window => "window",
            PipelineStage::Train => "train",
            PipelineStage::Infer => "infer",
            PipelineStage::Format => "format",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State after one training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochProgress {
    /// 1-based epoch number
    pub epoch: usize,
    pub epochs: usize,
    pub loss: f64,
    /// Learning rate used for this epoch
    pub learning_rate: f64,
}

/// Receives progress events. Both methods default to doing nothing.
pub trait PipelineObserver: Send + Sync {
    fn stage_completed(&self, _stage: PipelineStage, _elapsed: Duration) {}

    fn epoch_completed(&self, _progress: &EpochProgress) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

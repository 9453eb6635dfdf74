//! Frame-analysis use-case plumbing: the analyzer callback and the single
//! dedicated worker thread that runs it.
//!
//! No analysis algorithm lives here. [`FrameCounter`] only observes frames.

mod executor;
#[cfg(test)]
mod tests;

pub use executor::{AnalysisSink, AnalysisStats, AnalyzerExecutor, SubmitOutcome};

use crate::frame::FrameData;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// What the frame producer does when the analyzer cannot keep up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressureStrategy {
    /// Stall the producer until the analyzer takes the frame
    BlockProducer,
    /// Replace the queued frame with the newest one
    KeepOnlyLatest,
}

/// Analyzer callback, invoked on the executor thread only
pub trait Analyzer: Send + 'static {
    fn analyze(&mut self, frame: &FrameData);
}

impl<F> Analyzer for F
where
    F: FnMut(&FrameData) + Send + 'static,
{
    fn analyze(&mut self, frame: &FrameData) {
        self(frame)
    }
}

/// Pass-through analyzer that counts frames
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    count: Arc<AtomicU64>,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Analyzer for FrameCounter {
    fn analyze(&mut self, frame: &FrameData) {
        let seen = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(
            "Analyzed frame {} ({}x{}, {} bytes, total {})",
            frame.id,
            frame.width,
            frame.height,
            frame.data.len(),
            seen
        );
    }
}

use super::{Analyzer, BackpressureStrategy};
use crate::error::{Result, SnapcamError};
use crate::frame::FrameData;
use crossbeam::channel::{self, Receiver, Sender, TryRecvError, TrySendError};
use crossbeam::select;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Counters shared by the executor and every sink
#[derive(Debug, Default)]
pub struct AnalysisStats {
    pub frames_submitted: AtomicU64,
    pub frames_analyzed: AtomicU64,
    pub frames_dropped: AtomicU64,
}

impl AnalysisStats {
    pub fn submitted(&self) -> u64 {
        self.frames_submitted.load(Ordering::Relaxed)
    }

    pub fn analyzed(&self) -> u64 {
        self.frames_analyzed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }
}

/// Result of handing one frame to the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Queued,
    /// Queued after evicting an older frame, or discarded outright
    Dropped,
    /// The executor has shut down
    Closed,
}

/// Producer side of the analysis queue
#[derive(Clone)]
pub struct AnalysisSink {
    strategy: BackpressureStrategy,
    frames: Sender<FrameData>,
    evict: Receiver<FrameData>,
    shutdown: Receiver<()>,
    stats: Arc<AnalysisStats>,
}

impl AnalysisSink {
    pub fn strategy(&self) -> BackpressureStrategy {
        self.strategy
    }

    /// Submit a frame. With `BlockProducer` this blocks the calling thread
    /// until the analyzer has room or the executor shuts down.
    pub fn submit(&self, frame: FrameData) -> SubmitOutcome {
        if matches!(self.shutdown.try_recv(), Err(TryRecvError::Disconnected)) {
            return SubmitOutcome::Closed;
        }
        self.stats.frames_submitted.fetch_add(1, Ordering::Relaxed);

        match self.strategy {
            BackpressureStrategy::BlockProducer => {
                select! {
                    send(self.frames, frame) -> res => match res {
                        Ok(()) => SubmitOutcome::Queued,
                        Err(_) => SubmitOutcome::Closed,
                    },
                    recv(self.shutdown) -> _ => SubmitOutcome::Closed,
                }
            }
            BackpressureStrategy::KeepOnlyLatest => match self.frames.try_send(frame) {
                Ok(()) => SubmitOutcome::Queued,
                Err(TrySendError::Full(frame)) => {
                    if self.evict.try_recv().is_ok() {
                        self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                    }
                    match self.frames.try_send(frame) {
                        Ok(()) => SubmitOutcome::Dropped,
                        Err(TrySendError::Full(_)) => {
                            self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                            SubmitOutcome::Dropped
                        }
                        Err(TrySendError::Disconnected(_)) => SubmitOutcome::Closed,
                    }
                }
                Err(TrySendError::Disconnected(_)) => SubmitOutcome::Closed,
            },
        }
    }
}

/// Dedicated single worker thread running the analyzer callback
pub struct AnalyzerExecutor {
    sink: AnalysisSink,
    shutdown_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<AnalysisStats>,
}

impl AnalyzerExecutor {
    /// Spawn the worker thread
    pub fn spawn<A: Analyzer>(strategy: BackpressureStrategy, analyzer: A) -> Result<Self> {
        let (frames_tx, frames_rx) = channel::bounded::<FrameData>(1);
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);
        let stats = Arc::new(AnalysisStats::default());

        let worker_frames = frames_rx.clone();
        let worker_shutdown = shutdown_rx.clone();
        let worker_stats = Arc::clone(&stats);
        let mut analyzer = analyzer;

        let worker = std::thread::Builder::new()
            .name("snapcam-analyzer".to_string())
            .spawn(move || {
                debug!("Analyzer executor started");
                loop {
                    select! {
                        recv(worker_frames) -> frame => match frame {
                            Ok(frame) => {
                                analyzer.analyze(&frame);
                                worker_stats.frames_analyzed.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(_) => break,
                        },
                        recv(worker_shutdown) -> _ => break,
                    }
                }
                debug!("Analyzer executor stopped");
            })
            .map_err(|e| {
                SnapcamError::component(
                    "analysis".to_string(),
                    format!("Failed to spawn analyzer thread: {}", e),
                )
            })?;

        info!("Analyzer executor running with {:?}", strategy);

        Ok(Self {
            sink: AnalysisSink {
                strategy,
                frames: frames_tx,
                evict: frames_rx,
                shutdown: shutdown_rx,
                stats: Arc::clone(&stats),
            },
            shutdown_tx: Some(shutdown_tx),
            worker: Some(worker),
            stats,
        })
    }

    pub fn sink(&self) -> AnalysisSink {
        self.sink.clone()
    }

    pub fn stats(&self) -> Arc<AnalysisStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    /// Stop the worker and wake any blocked producers. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shutdown_tx.take().is_none() {
            return;
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Analyzer thread panicked");
            }
        }
        info!(
            "Analyzer executor shut down ({} analyzed, {} dropped)",
            self.stats.analyzed(),
            self.stats.dropped()
        );
    }
}

impl Drop for AnalyzerExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

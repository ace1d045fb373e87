use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::foundation::core::FrameIndex;

/// Shared liveness flag and progress counter consumed by every stage.
///
/// Pass it around as `Arc<PipelineController>`; all methods take `&self` and are safe to call
/// from any thread.
#[derive(Debug)]
pub struct PipelineController {
    alive: AtomicBool,
    // Highest reported index + 1; 0 means nothing reported yet.
    progress: AtomicU64,
    parent: Option<Arc<PipelineController>>,
}

impl Default for PipelineController {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineController {
    /// A live controller with no progress reported.
    pub fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            progress: AtomicU64::new(0),
            parent: None,
        }
    }

    /// A controller that dies with `parent` but can also be killed on its own.
    ///
    /// Progress is tracked separately from the parent.
    pub fn child(parent: &Arc<PipelineController>) -> Self {
        Self {
            parent: Some(Arc::clone(parent)),
            ..Self::new()
        }
    }

    /// `false` once [`PipelineController::kill`] was called on this controller or a parent.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) && self.parent.as_ref().is_none_or(|p| p.is_alive())
    }

    /// Clear the liveness flag. Every stage stops within one poll interval.
    pub fn kill(&self) {
        if self.alive.swap(false, Ordering::AcqRel) {
            if self.parent.is_some() {
                tracing::debug!("child controller killed");
            } else {
                tracing::info!("pipeline controller killed");
            }
        }
    }

    /// Record that `idx` has been produced. Progress never moves backwards.
    pub fn update_frame_count(&self, idx: FrameIndex) {
        self.progress.fetch_max(idx.0 + 1, Ordering::AcqRel);
    }

    /// Highest index reported so far.
    pub fn last_reported(&self) -> Option<FrameIndex> {
        match self.progress.load(Ordering::Acquire) {
            0 => None,
            n => Some(FrameIndex(n - 1)),
        }
    }
}

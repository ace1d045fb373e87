use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{DeltaError, DeltaResult};
use crate::frame::buffer::Frame;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Consumer of finished frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order. `end` is
/// called exactly once after `begin`, including when the producing stage stops early.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> DeltaResult<()>;
    /// Push one frame. The sink may keep it until it is consumed asynchronously.
    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> DeltaResult<()>;
    /// Flush pending frames and release resources.
    fn end(&mut self) -> DeltaResult<()>;
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn begin(&mut self, cfg: SinkConfig) -> DeltaResult<()> {
        (**self).begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> DeltaResult<()> {
        (**self).push_frame(idx, frame)
    }

    fn end(&mut self) -> DeltaResult<()> {
        (**self).end()
    }
}

/// Shared ordering/size checks for sinks.
#[derive(Debug, Default, Clone)]
pub(crate) struct SinkGuard {
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl SinkGuard {
    pub(crate) fn begin(&mut self, cfg: SinkConfig) -> DeltaResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(DeltaError::validation("sink width/height must be non-zero"));
        }
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    pub(crate) fn check(&mut self, idx: FrameIndex, frame: &Frame) -> DeltaResult<SinkConfig> {
        let cfg = self
            .cfg
            .ok_or_else(|| DeltaError::stage("sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(DeltaError::stage(format!(
                "sink received out-of-order frame index {} after {}",
                idx.0, last.0
            )));
        }
        if frame.dimensions() != (cfg.width, cfg.height) {
            return Err(DeltaError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }
        self.last_idx = Some(idx);
        Ok(cfg)
    }

    pub(crate) fn finish(&mut self) -> Option<SinkConfig> {
        self.cfg.take()
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    guard: SinkGuard,
    began: Option<SinkConfig>,
    frames: Vec<(FrameIndex, Frame)>,
    closed: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.began
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, Frame)] {
        &self.frames
    }

    /// `true` once `end` has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> DeltaResult<()> {
        self.guard.begin(cfg)?;
        self.began = Some(cfg);
        self.frames.clear();
        self.closed = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> DeltaResult<()> {
        self.guard.check(idx, frame)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> DeltaResult<()> {
        self.guard.finish();
        self.closed = true;
        Ok(())
    }
}

/// Sink that enforces the ordering contract and drops every frame.
///
/// Used when frames only need to land on disk, not in a video.
#[derive(Debug, Default)]
pub struct NullSink {
    guard: SinkGuard,
    pushed: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames accepted so far.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }
}

impl FrameSink for NullSink {
    fn begin(&mut self, cfg: SinkConfig) -> DeltaResult<()> {
        self.guard.begin(cfg)?;
        self.pushed = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> DeltaResult<()> {
        self.guard.check(idx, frame)?;
        self.pushed += 1;
        Ok(())
    }

    fn end(&mut self) -> DeltaResult<()> {
        self.guard.finish();
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;

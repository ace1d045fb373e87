use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::build::merge::MergeBuilder;
use crate::config::PipelineConfig;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{DeltaError, DeltaResult};
use crate::frame::buffer::Frame;
use crate::frame::io::DEFAULT_QUALITY;
use crate::pipeline::controller::PipelineController;
use crate::pipeline::layout::WorkspaceLayout;
use crate::pipeline::resume::resume_point;
use crate::pipeline::task::{StageHandle, StageReport};
use crate::pipeline::wait::{WaitPolicy, read_vector_list_waiting};
use crate::vectors::displacement::VectorKind;
use crate::vectors::list::FrameVectors;

/// Result of a merge stage run on its own thread: the report plus the sink handed back.
#[derive(Debug)]
pub struct MergeRun<S> {
    pub report: StageReport,
    pub sink: S,
}

impl<S> AsRef<StageReport> for MergeRun<S> {
    fn as_ref(&self) -> &StageReport {
        &self.report
    }
}

/// Consumer side: rebuilds full frames from upscaled canvases and streams them to a sink.
///
/// Transition `x` turns `merged_{x}` (held in memory after the first iteration) and
/// `residual_upscaled/output_{x}` into frame `x + 1`.
#[derive(Debug)]
pub struct MergeStage {
    layout: WorkspaceLayout,
    builder: MergeBuilder,
    frame_count: u64,
    wait: WaitPolicy,
    fps: Fps,
    preserve_frames: bool,
    skip_malformed: bool,
    start: Option<FrameIndex>,
}

impl MergeStage {
    pub fn from_config(cfg: &PipelineConfig) -> DeltaResult<Self> {
        cfg.validate()?;
        Ok(Self::new(
            cfg,
            MergeBuilder::new(cfg.geometry()?, cfg.scale_factor, cfg.correction_block_size)?,
        ))
    }

    /// Stage driving a custom builder, e.g. one with a different refinement chain.
    pub fn new(cfg: &PipelineConfig, builder: MergeBuilder) -> Self {
        Self {
            layout: cfg.layout(),
            builder,
            frame_count: cfg.frame_count,
            wait: cfg.wait_policy(),
            fps: cfg.fps,
            preserve_frames: cfg.preserve_frames,
            skip_malformed: cfg.skip_malformed_frames,
            start: None,
        }
    }

    /// Start at transition `start` instead of the resume point.
    pub fn with_start(mut self, start: FrameIndex) -> Self {
        self.start = Some(start);
        self
    }

    pub fn transitions(&self) -> u64 {
        self.frame_count.saturating_sub(1)
    }

    /// Transition that rebuilds the first frame missing from `merged/`.
    ///
    /// The newest merged frame becomes the anchor; without any merged frame the stage waits for
    /// the genesis frame.
    pub fn resume_point(&self) -> FrameIndex {
        let next = resume_point(self.frame_count, |i| {
            self.layout.merged_frame(FrameIndex(i)).is_file()
        });
        FrameIndex(next.saturating_sub(1))
    }

    /// Rebuild frames until the clip ends, the controller is killed, or a wait times out.
    ///
    /// `sink.end()` runs on every exit path, failures included.
    pub fn run(
        &self,
        controller: &Arc<PipelineController>,
        sink: &mut dyn FrameSink,
    ) -> DeltaResult<StageReport> {
        let first = self.start.unwrap_or_else(|| self.resume_point());
        tracing::info!(
            stage = "merge",
            first = first.0,
            transitions = self.transitions(),
            "stage started"
        );
        let mut report = StageReport::new("merge", first);
        let mut prefetch = None;
        let mut writes = PendingWrites::default();

        let result = self.run_from(
            first,
            controller,
            sink,
            &mut report,
            &mut prefetch,
            &mut writes,
        );

        // The prefetch may be waiting on a canvas that never comes; stop it and join.
        if let Some(pending) = prefetch {
            pending.cancel();
            let _ = pending.wait();
        }
        let saved = writes.join_all();
        let closed = sink.end();
        if let Err(err) = &closed
            && result.is_err()
        {
            tracing::warn!(error = %err, "sink failed to close after stage error");
        }
        report.settle(result.and(saved).and(closed))
    }

    /// Run on a dedicated thread; the sink is returned with the report.
    pub fn spawn<S: FrameSink + 'static>(
        self,
        controller: Arc<PipelineController>,
        mut sink: S,
    ) -> DeltaResult<StageHandle<MergeRun<S>>> {
        StageHandle::spawn("merge", move || {
            let report = self.run(&controller, &mut sink)?;
            Ok(MergeRun { report, sink })
        })
    }

    fn run_from(
        &self,
        first: FrameIndex,
        controller: &Arc<PipelineController>,
        sink: &mut dyn FrameSink,
        report: &mut StageReport,
        prefetch: &mut Option<Prefetch>,
        writes: &mut PendingWrites,
    ) -> DeltaResult<()> {
        let transitions = self.transitions();
        if first.0 >= transitions {
            return Ok(());
        }

        let mut previous =
            Frame::load_waiting(&self.layout.merged_frame(first), &self.wait, controller)?;
        sink.begin(SinkConfig {
            width: previous.width(),
            height: previous.height(),
            fps: self.fps,
        })?;
        sink.push_frame(first, &previous)?;
        *prefetch = Some(self.prefetch(first, controller)?);

        for x in first.0..transitions {
            if !controller.is_alive() {
                return Err(DeltaError::Cancelled);
            }
            let x = FrameIndex(x);
            let canvas = match prefetch.take() {
                Some(pending) => pending.wait()?,
                None => return Err(DeltaError::stage("merge prefetch missing")),
            };
            if x.0 + 1 < transitions {
                *prefetch = Some(self.prefetch(x.next(), controller)?);
            }
            let vectors = self.read_vectors(x, controller)?;

            let frame = match self.builder.build(&canvas, &previous, &vectors) {
                Ok(frame) => {
                    report.frames_processed += 1;
                    frame
                }
                Err(err @ DeltaError::MalformedVectorList { .. }) if self.skip_malformed => {
                    tracing::warn!(index = x.0, error = %err, "skipping frame, repeating previous");
                    report.frames_skipped += 1;
                    previous.clone()
                }
                Err(err) => return Err(err),
            };

            let idx = x.next();
            sink.push_frame(idx, &frame)?;
            if self.preserve_frames {
                writes.save(
                    self.layout.merged_frame(idx),
                    self.layout.temp_dir(),
                    frame.clone(),
                )?;
            }
            controller.update_frame_count(idx);
            tracing::debug!(index = idx.0, "merged frame");
            previous = frame;
        }
        Ok(())
    }

    fn read_vectors(
        &self,
        x: FrameIndex,
        controller: &PipelineController,
    ) -> DeltaResult<FrameVectors> {
        let read = |kind: VectorKind| {
            read_vector_list_waiting(kind, &self.layout.vector_list(kind, x), &self.wait, controller)
        };
        Ok(FrameVectors {
            predictive: read(VectorKind::Predictive)?,
            residual: read(VectorKind::Residual)?,
            correction: read(VectorKind::Correction)?,
            fade: read(VectorKind::Fade)?,
        })
    }

    fn prefetch(
        &self,
        x: FrameIndex,
        controller: &Arc<PipelineController>,
    ) -> DeltaResult<Prefetch> {
        Prefetch::spawn(self.layout.upscaled_image(x), self.wait, controller)
    }
}

/// Upscaled canvas being loaded in the background. The loading thread owns the frame until
/// [`Prefetch::wait`] hands it over.
///
/// The thread polls a child of the stage controller, so it stops when the pipeline is killed or
/// when [`Prefetch::cancel`] is called.
struct Prefetch {
    handle: JoinHandle<DeltaResult<Frame>>,
    stop: Arc<PipelineController>,
}

impl Prefetch {
    fn spawn(
        path: PathBuf,
        wait: WaitPolicy,
        controller: &Arc<PipelineController>,
    ) -> DeltaResult<Self> {
        let stop = Arc::new(PipelineController::child(controller));
        let thread_stop = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("deltaframe-prefetch".into())
            .spawn(move || Frame::load_waiting(&path, &wait, &thread_stop))
            .map_err(|e| DeltaError::stage(format!("failed to spawn prefetch thread: {e}")))?;
        Ok(Self { handle, stop })
    }

    fn cancel(&self) {
        self.stop.kill();
    }

    fn wait(self) -> DeltaResult<Frame> {
        self.handle
            .join()
            .map_err(|_| DeltaError::stage("prefetch thread panicked"))?
    }
}

/// Merged frames being saved in the background.
#[derive(Default)]
struct PendingWrites {
    handles: Vec<JoinHandle<DeltaResult<()>>>,
}

impl PendingWrites {
    fn save(&mut self, path: PathBuf, staging: PathBuf, frame: Frame) -> DeltaResult<()> {
        self.reap()?;
        let handle = std::thread::Builder::new()
            .name("deltaframe-save".into())
            .spawn(move || frame.save_staged(&path, DEFAULT_QUALITY, &staging))
            .map_err(|e| DeltaError::stage(format!("failed to spawn save thread: {e}")))?;
        self.handles.push(handle);
        Ok(())
    }

    // Join saves that already finished so failures surface early.
    fn reap(&mut self) -> DeltaResult<()> {
        let (done, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.handles)
            .into_iter()
            .partition(|h| h.is_finished());
        self.handles = pending;
        done.into_iter().try_for_each(join_save)
    }

    fn join_all(&mut self) -> DeltaResult<()> {
        let mut first_err = None;
        for handle in self.handles.drain(..) {
            if let Err(err) = join_save(handle) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

fn join_save(handle: JoinHandle<DeltaResult<()>>) -> DeltaResult<()> {
    handle
        .join()
        .map_err(|_| DeltaError::stage("save thread panicked"))?
}

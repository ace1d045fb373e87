use std::sync::Arc;

use crate::build::residual::{ResidualBuilder, ResidualOutput};
use crate::config::PipelineConfig;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{DeltaError, DeltaResult};
use crate::frame::buffer::Frame;
use crate::frame::io::{DEBUG_QUALITY, DEFAULT_QUALITY};
use crate::pipeline::controller::PipelineController;
use crate::pipeline::layout::{ResidualFormat, WorkspaceLayout};
use crate::pipeline::resume::resume_point;
use crate::pipeline::task::{StageHandle, StageReport};
use crate::pipeline::wait::{WaitPolicy, read_vector_list_waiting};
use crate::vectors::displacement::VectorKind;
use crate::vectors::list::VectorList;

/// Producer side: packs the changed blocks of each input frame for the upscaler.
///
/// For transition `x` it reads `inputs/frame_{x+1}` plus the residual and predictive lists of
/// `x`, and writes either a residual canvas or, for unchanged frames, a placeholder straight into
/// `residual_upscaled/`.
#[derive(Clone, Debug)]
pub struct ResidualStage {
    layout: WorkspaceLayout,
    builder: ResidualBuilder,
    frame_count: u64,
    wait: WaitPolicy,
    format: ResidualFormat,
    quality: u8,
    debug: bool,
    skip_malformed: bool,
    start: Option<FrameIndex>,
}

impl ResidualStage {
    pub fn from_config(cfg: &PipelineConfig) -> DeltaResult<Self> {
        cfg.validate()?;
        Ok(Self {
            layout: cfg.layout(),
            builder: ResidualBuilder::new(cfg.geometry()?)?,
            frame_count: cfg.frame_count,
            wait: cfg.wait_policy(),
            format: cfg.residual_format,
            quality: cfg.residual_quality,
            debug: cfg.debug,
            skip_malformed: cfg.skip_malformed_frames,
            start: None,
        })
    }

    /// Start at transition `start` instead of the resume point.
    pub fn with_start(mut self, start: FrameIndex) -> Self {
        self.start = Some(start);
        self
    }

    /// Number of transitions (frame pairs) in the clip.
    pub fn transitions(&self) -> u64 {
        self.frame_count.saturating_sub(1)
    }

    /// First transition without output on disk.
    pub fn resume_point(&self) -> FrameIndex {
        FrameIndex(resume_point(self.transitions(), |x| {
            let x = FrameIndex(x);
            self.layout.residual_image(x, self.format).is_file()
                || self.layout.upscaled_image(x).is_file()
        }))
    }

    /// Process transitions until the clip ends, the controller is killed, or a wait times out.
    pub fn run(&self, controller: &PipelineController) -> DeltaResult<StageReport> {
        let first = self.start.unwrap_or_else(|| self.resume_point());
        tracing::info!(
            stage = "residual",
            first = first.0,
            transitions = self.transitions(),
            "stage started"
        );
        let mut report = StageReport::new("residual", first);
        let result = self.run_from(first, controller, &mut report);
        report.settle(result)
    }

    /// Run on a dedicated thread.
    pub fn spawn(
        self,
        controller: Arc<PipelineController>,
    ) -> DeltaResult<StageHandle<StageReport>> {
        StageHandle::spawn("residual", move || self.run(&controller))
    }

    fn run_from(
        &self,
        first: FrameIndex,
        controller: &PipelineController,
        report: &mut StageReport,
    ) -> DeltaResult<()> {
        for x in first.0..self.transitions() {
            if !controller.is_alive() {
                return Err(DeltaError::Cancelled);
            }
            let x = FrameIndex(x);
            let raw =
                Frame::load_waiting(&self.layout.input_frame(x.next()), &self.wait, controller)?;
            let residual = self.read_list(VectorKind::Residual, x, controller)?;
            let predictive = self.read_list(VectorKind::Predictive, x, controller)?;

            match self.process(x, &raw, &residual, &predictive) {
                Ok(label) => {
                    report.frames_processed += 1;
                    tracing::debug!(index = x.0, output = label, "residual frame written");
                }
                Err(err @ DeltaError::MalformedVectorList { .. }) if self.skip_malformed => {
                    tracing::warn!(index = x.0, error = %err, "skipping frame, treated as unchanged");
                    self.write_placeholder(x)?;
                    report.frames_skipped += 1;
                }
                Err(err) => return Err(err),
            }
            controller.update_frame_count(x.next());
        }
        Ok(())
    }

    fn read_list(
        &self,
        kind: VectorKind,
        x: FrameIndex,
        controller: &PipelineController,
    ) -> DeltaResult<VectorList> {
        read_vector_list_waiting(kind, &self.layout.vector_list(kind, x), &self.wait, controller)
    }

    fn process(
        &self,
        x: FrameIndex,
        raw: &Frame,
        residual: &VectorList,
        predictive: &VectorList,
    ) -> DeltaResult<&'static str> {
        let output = self.builder.build(raw, residual, predictive)?;
        match output.frame() {
            Some(canvas) => canvas.save_staged(
                &self.layout.residual_image(x, self.format),
                self.quality,
                &self.layout.temp_dir(),
            )?,
            None => self.write_placeholder(x)?,
        }
        if self.debug {
            // Unchanged and new-scene frames have no residual blocks to black out.
            let debug = match output {
                ResidualOutput::PackedCanvas(_) => self.builder.debug_image(raw, residual)?,
                ResidualOutput::NoChange | ResidualOutput::FullCopy(_) => raw.clone(),
            };
            debug.save_staged(
                &self.layout.debug_image(x.next()),
                DEBUG_QUALITY,
                &self.layout.temp_dir(),
            )?;
        }
        Ok(output.label())
    }

    // The merge stage ignores the pixels of unchanged frames; one black pixel keeps the
    // one-file-per-index handoff intact without a trip through the upscaler.
    fn write_placeholder(&self, x: FrameIndex) -> DeltaResult<()> {
        Frame::allocate(1, 1).save_staged(
            &self.layout.upscaled_image(x),
            DEFAULT_QUALITY,
            &self.layout.temp_dir(),
        )
    }
}

//! deltaframe rebuilds video frames from sparse, block-granular difference data.
//!
//! A workflow upscales only the blocks that changed between consecutive frames:
//!
//! - the [`ResidualStage`] packs changed blocks into a compact canvas for an external upscaler
//! - the [`MergeStage`] unpacks the upscaled canvas onto the previous full frame, applies
//!   predictive motion and the fade and correction refinements, and streams the result into a
//!   [`FrameSink`]
//!
//! Stages hand data to each other through files in a [`WorkspaceLayout`] and stop cooperatively
//! through a shared [`PipelineController`].
#![forbid(unsafe_code)]

/// Block packing and reconstruction.
pub mod build;
/// JSON pipeline configuration.
pub mod config;
/// Frame sinks.
pub mod encode;
mod foundation;
/// RGB8 frame buffers and image IO.
pub mod frame;
/// Stage runners and their coordination primitives.
pub mod pipeline;
/// Refinement passes run after reconstruction.
pub mod refine;
/// Vector list parsing.
pub mod vectors;

pub use crate::foundation::core::{Fps, FrameIndex, LEXICON_WIDTH, lexicon};
pub use crate::foundation::error::{DeltaError, DeltaResult};

pub use crate::build::geometry::{BLEED_MARGIN, BlockGeometry};
pub use crate::build::merge::MergeBuilder;
pub use crate::build::residual::{ResidualBuilder, ResidualOutput};
pub use crate::config::PipelineConfig;
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, NullSink, SinkConfig};
pub use crate::frame::buffer::Frame;
pub use crate::pipeline::controller::PipelineController;
pub use crate::pipeline::layout::{ResidualFormat, WorkspaceLayout};
pub use crate::pipeline::merge_stage::{MergeRun, MergeStage};
pub use crate::pipeline::residual_stage::ResidualStage;
pub use crate::pipeline::resume::resume_point;
pub use crate::pipeline::task::{StageHandle, StageOutcome, StageReport, StageState};
pub use crate::pipeline::wait::{WaitPolicy, wait_for_artifact};
pub use crate::pipeline::{PipelineRun, run_pipeline};
pub use crate::refine::Refinement;
pub use crate::refine::correction::Correction;
pub use crate::refine::fade::Fade;
pub use crate::vectors::displacement::{DisplacementVector, VectorKind};
pub use crate::vectors::list::{FrameVectors, VectorList};

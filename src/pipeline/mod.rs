//! Stage runners and the plumbing they share: cancellation, polling, resume and naming.

pub mod controller;
pub mod layout;
pub mod merge_stage;
pub mod residual_stage;
pub mod resume;
pub mod task;
pub mod wait;

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::encode::sink::FrameSink;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::DeltaResult;
use crate::pipeline::controller::PipelineController;
use crate::pipeline::merge_stage::{MergeRun, MergeStage};
use crate::pipeline::residual_stage::ResidualStage;
use crate::pipeline::task::{StageReport, StageState};

/// Reports of both stages after [`run_pipeline`].
#[derive(Debug)]
pub struct PipelineRun<S> {
    pub residual: StageReport,
    pub merge: MergeRun<S>,
}

/// Run the residual and merge stages concurrently against one workspace.
///
/// When either stage fails the controller is killed so the other stops too. `start` overrides
/// both resume points.
pub fn run_pipeline<S: FrameSink + 'static>(
    cfg: &PipelineConfig,
    controller: Arc<PipelineController>,
    sink: S,
    start: Option<FrameIndex>,
) -> DeltaResult<PipelineRun<S>> {
    cfg.layout().create_dirs()?;
    let mut residual = ResidualStage::from_config(cfg)?;
    let mut merge = MergeStage::from_config(cfg)?;
    if let Some(start) = start {
        residual = residual.with_start(start);
        merge = merge.with_start(start);
    }

    let residual = residual.spawn(Arc::clone(&controller))?;
    let merge = match merge.spawn(Arc::clone(&controller), sink) {
        Ok(handle) => handle,
        Err(err) => {
            controller.kill();
            let _ = residual.join();
            return Err(err);
        }
    };

    let poll = cfg.wait_policy().poll_interval;
    while !(residual.is_finished() && merge.is_finished()) {
        if residual.state() == StageState::Failed || merge.state() == StageState::Failed {
            controller.kill();
        }
        std::thread::sleep(poll);
    }

    let residual = residual.join();
    let merge = merge.join();
    Ok(PipelineRun {
        residual: residual?,
        merge: merge?,
    })
}

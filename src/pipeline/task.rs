use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::JoinHandle;

use serde::Serialize;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{DeltaError, DeltaResult};

/// Live state of a stage thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StageState {
    Idle = 0,
    Running = 1,
    Completed = 2,
    Cancelled = 3,
    Failed = 4,
}

impl StageState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Cancelled,
            4 => Self::Failed,
            _ => Self::Idle,
        }
    }

    /// `true` once the stage can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// How a stage that did not fail came to an end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Every index up to the configured frame count was processed.
    Completed,
    /// The controller was killed or an input wait timed out.
    Cancelled,
}

/// Summary returned by a stage runner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// `residual` or `merge`.
    pub stage: &'static str,
    pub outcome: StageOutcome,
    /// First transition index this run worked on (after resume).
    pub first_index: FrameIndex,
    pub frames_processed: u64,
    /// Indices degraded to "no change" because their vector lists were malformed.
    pub frames_skipped: u64,
}

impl StageReport {
    pub(crate) fn new(stage: &'static str, first_index: FrameIndex) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Completed,
            first_index,
            frames_processed: 0,
            frames_skipped: 0,
        }
    }

    /// Fold a stage loop result into the report. Clean stops become `Cancelled` outcomes.
    pub(crate) fn settle(mut self, result: DeltaResult<()>) -> DeltaResult<Self> {
        match result {
            Ok(()) => {
                tracing::info!(
                    stage = self.stage,
                    processed = self.frames_processed,
                    skipped = self.frames_skipped,
                    "stage completed"
                );
                Ok(self)
            }
            Err(err) if err.is_clean_stop() => {
                tracing::info!(
                    stage = self.stage,
                    processed = self.frames_processed,
                    reason = %err,
                    "stage stopped"
                );
                self.outcome = StageOutcome::Cancelled;
                Ok(self)
            }
            Err(err) => {
                tracing::error!(stage = self.stage, error = %err, "stage failed");
                Err(err)
            }
        }
    }
}

impl AsRef<StageReport> for StageReport {
    fn as_ref(&self) -> &StageReport {
        self
    }
}

/// Handle to a stage running on its own thread.
#[derive(Debug)]
pub struct StageHandle<T> {
    name: &'static str,
    state: Arc<AtomicU8>,
    join: JoinHandle<DeltaResult<T>>,
}

impl<T> StageHandle<T>
where
    T: AsRef<StageReport> + Send + 'static,
{
    /// Run `f` on a named thread and track its state.
    pub(crate) fn spawn(
        name: &'static str,
        f: impl FnOnce() -> DeltaResult<T> + Send + 'static,
    ) -> DeltaResult<Self> {
        let state = Arc::new(AtomicU8::new(StageState::Idle as u8));
        let thread_state = Arc::clone(&state);
        let join = std::thread::Builder::new()
            .name(format!("deltaframe-{name}"))
            .spawn(move || {
                thread_state.store(StageState::Running as u8, Ordering::Release);
                let result = f();
                let end = match &result {
                    Ok(v) => match v.as_ref().outcome {
                        StageOutcome::Completed => StageState::Completed,
                        StageOutcome::Cancelled => StageState::Cancelled,
                    },
                    Err(_) => StageState::Failed,
                };
                thread_state.store(end as u8, Ordering::Release);
                result
            })
            .map_err(|e| DeltaError::stage(format!("failed to spawn {name} stage thread: {e}")))?;
        Ok(Self { name, state, join })
    }

    /// Stage name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current state. `Idle` until the thread starts running.
    pub fn state(&self) -> StageState {
        StageState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `true` once the stage thread has returned.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the stage to end and return its result.
    pub fn join(self) -> DeltaResult<T> {
        let name = self.name;
        match self.join.join() {
            Ok(result) => result,
            Err(_) => {
                self.state
                    .store(StageState::Failed as u8, Ordering::Release);
                Err(DeltaError::stage(format!("{name} stage thread panicked")))
            }
        }
    }
}

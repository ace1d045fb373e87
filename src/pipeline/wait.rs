//! Filesystem polling used as the handoff primitive between producers and stages.
//!
//! Every artifact is written exactly once before it is read, so waiting for it to exist replaces
//! a condition variable. Images are renamed into place; vector lists are not, so readers also wait
//! for them to stop growing. All waits re-check the controller at each poll.

use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use anyhow::Context as _;

use crate::foundation::error::{DeltaError, DeltaResult};
use crate::pipeline::controller::PipelineController;
use crate::vectors::displacement::VectorKind;
use crate::vectors::list::VectorList;

/// How stages poll for input artifacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Sleep between polls; also the cancellation latency bound.
    pub poll_interval: Duration,
    /// Give up with [`DeltaError::ArtifactTimeout`] after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Extra attempts for an image or list that exists but does not parse yet.
    pub read_retries: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: None,
            read_retries: 5,
        }
    }
}

/// Block until `path` exists as a file.
///
/// Returns [`DeltaError::Cancelled`] as soon as the controller is no longer alive and
/// [`DeltaError::ArtifactTimeout`] once `policy.timeout` has elapsed.
pub fn wait_for_artifact(
    path: &Path,
    policy: &WaitPolicy,
    controller: &PipelineController,
) -> DeltaResult<()> {
    let started = Instant::now();
    let mut logged = false;
    loop {
        if !controller.is_alive() {
            return Err(DeltaError::Cancelled);
        }
        if path.is_file() {
            return Ok(());
        }
        if let Some(limit) = policy.timeout
            && started.elapsed() >= limit
        {
            return Err(DeltaError::timeout(path));
        }
        if !logged {
            tracing::debug!(path = %path.display(), "waiting for artifact");
            logged = true;
        }
        std::thread::sleep(policy.poll_interval);
    }
}

/// Wait for a vector list file to exist and stop growing, then read it.
///
/// Lists are written without an atomic rename, so a list that does not parse or ends in a
/// partial group is re-read up to `policy.read_retries` times. A list that stays ragged is
/// returned as is; building from it reports [`DeltaError::MalformedVectorList`].
pub fn read_vector_list_waiting(
    kind: VectorKind,
    path: &Path,
    policy: &WaitPolicy,
    controller: &PipelineController,
) -> DeltaResult<VectorList> {
    wait_for_artifact(path, policy, controller)?;
    let mut attempt = 0u32;
    loop {
        wait_until_stable(path, policy, controller)?;
        let reason = match VectorList::read(kind, path) {
            Ok(list) if attempt < policy.read_retries && list.groups().is_err() => {
                format!("{} integers, not a whole number of groups", list.len())
            }
            Ok(list) => return Ok(list),
            Err(err @ DeltaError::Validation(_)) if attempt < policy.read_retries => {
                err.to_string()
            }
            Err(err) => return Err(err),
        };
        attempt += 1;
        tracing::warn!(
            path = %path.display(),
            attempt,
            reason = %reason,
            "vector list incomplete, retrying"
        );
        std::thread::sleep(policy.poll_interval);
        if !controller.is_alive() {
            return Err(DeltaError::Cancelled);
        }
    }
}

/// Block until the size and modification time of `path` hold still for one poll interval.
///
/// Files last touched longer than one poll interval ago count as stable right away.
pub fn wait_until_stable(
    path: &Path,
    policy: &WaitPolicy,
    controller: &PipelineController,
) -> DeltaResult<()> {
    let started = Instant::now();
    let mut last = file_stamp(path)?;
    if last.1.elapsed().is_ok_and(|age| age >= policy.poll_interval) {
        return Ok(());
    }
    loop {
        std::thread::sleep(policy.poll_interval);
        if !controller.is_alive() {
            return Err(DeltaError::Cancelled);
        }
        let now = file_stamp(path)?;
        if now == last {
            return Ok(());
        }
        if let Some(limit) = policy.timeout
            && started.elapsed() >= limit
        {
            return Err(DeltaError::timeout(path));
        }
        tracing::debug!(path = %path.display(), size = now.0, "artifact still growing");
        last = now;
    }
}

fn file_stamp(path: &Path) -> DeltaResult<(u64, SystemTime)> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("stat artifact '{}'", path.display()))?;
    let modified = meta
        .modified()
        .with_context(|| format!("modification time of '{}'", path.display()))?;
    Ok((meta.len(), modified))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/wait.rs"]
mod tests;

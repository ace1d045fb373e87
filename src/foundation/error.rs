use std::path::{Path, PathBuf};

/// Convenience result type used across deltaframe.
pub type DeltaResult<T> = Result<T, DeltaError>;

/// Top-level error taxonomy used by builders, stage runners and sinks.
#[derive(thiserror::Error, Debug)]
pub enum DeltaError {
    /// Invalid configuration or caller-provided arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// A vector list whose length does not divide into its group size.
    #[error("malformed vector list ({kind}): {len} integers is not a multiple of {group}")]
    MalformedVectorList {
        /// Which list was malformed (`residual`, `predictive`, `correction`, `fade`).
        kind: &'static str,
        /// Number of integers in the list.
        len: usize,
        /// Required group size.
        group: usize,
    },

    /// An image file was present but could not be decoded.
    #[error("unreadable image '{}': {reason}", path.display())]
    UnreadableImage {
        /// Path of the offending file.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// A polling wait exceeded its configured bound.
    #[error("timed out waiting for artifact '{}'", path.display())]
    ArtifactTimeout {
        /// Path that never materialized.
        path: PathBuf,
    },

    /// The shared controller cleared its liveness flag.
    #[error("cancelled by controller")]
    Cancelled,

    /// Failures in stage threads or encoder plumbing.
    #[error("stage error: {0}")]
    Stage(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeltaError {
    /// Build a [`DeltaError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DeltaError::Stage`] value.
    pub fn stage(msg: impl Into<String>) -> Self {
        Self::Stage(msg.into())
    }

    /// Build a [`DeltaError::MalformedVectorList`] value.
    pub fn malformed(kind: &'static str, len: usize, group: usize) -> Self {
        Self::MalformedVectorList { kind, len, group }
    }

    /// Build a [`DeltaError::UnreadableImage`] value.
    pub fn unreadable(path: &Path, reason: impl Into<String>) -> Self {
        Self::UnreadableImage {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Build a [`DeltaError::ArtifactTimeout`] value.
    pub fn timeout(path: &Path) -> Self {
        Self::ArtifactTimeout {
            path: path.to_path_buf(),
        }
    }

    /// `true` for conditions that stop a stage cleanly rather than failing it.
    ///
    /// Timeouts are treated like cancellation: the stage stops, and already produced output
    /// stays valid for a resumed run.
    pub fn is_clean_stop(&self) -> bool {
        matches!(self, Self::Cancelled | Self::ArtifactTimeout { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

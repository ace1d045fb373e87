use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::FrameIndex;
use crate::foundation::error::DeltaResult;
use crate::vectors::displacement::VectorKind;

/// Image format used for residual canvases handed to the upscaler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidualFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Lossy JPEG at the configured quality.
    Jpeg,
}

impl ResidualFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Directory and file naming for one pipeline workspace.
///
/// Transition index `x` describes frame `x` to frame `x + 1`; vector lists and residual canvases
/// are keyed by transition, frames by frame index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn inputs_dir(&self) -> PathBuf {
        self.root.join("inputs")
    }

    pub fn residual_images_dir(&self) -> PathBuf {
        self.root.join("residual_images")
    }

    pub fn residual_upscaled_dir(&self) -> PathBuf {
        self.root.join("residual_upscaled")
    }

    pub fn merged_dir(&self) -> PathBuf {
        self.root.join("merged")
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.root.join("debug")
    }

    /// Staging area for images being encoded, kept out of every watched directory.
    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Directory holding the lists of one category.
    pub fn vector_dir(&self, kind: VectorKind) -> PathBuf {
        self.root.join(match kind {
            VectorKind::Residual => "residual_data",
            VectorKind::Predictive => "pframe_data",
            VectorKind::Correction => "correction_data",
            VectorKind::Fade => "fade_data",
        })
    }

    /// `inputs/frame_{lexicon}.png`
    pub fn input_frame(&self, idx: FrameIndex) -> PathBuf {
        self.inputs_dir().join(format!("frame_{}.png", idx.lexicon()))
    }

    /// Vector list for transition `x`. List names are not zero-padded.
    pub fn vector_list(&self, kind: VectorKind, x: FrameIndex) -> PathBuf {
        let stem = match kind {
            VectorKind::Residual => "residual",
            VectorKind::Predictive => "pframe",
            VectorKind::Correction => "correction",
            VectorKind::Fade => "fade",
        };
        self.vector_dir(kind).join(format!("{stem}_{}.txt", x.0))
    }

    /// Residual canvas written for the upscaler.
    pub fn residual_image(&self, x: FrameIndex, format: ResidualFormat) -> PathBuf {
        self.residual_images_dir()
            .join(format!("output_{}.{}", x.lexicon(), format.extension()))
    }

    /// Upscaled canvas the merge stage consumes.
    pub fn upscaled_image(&self, x: FrameIndex) -> PathBuf {
        self.residual_upscaled_dir()
            .join(format!("output_{}.png", x.lexicon()))
    }

    /// Reconstructed frame. Index 0 is the externally provided genesis frame.
    pub fn merged_frame(&self, idx: FrameIndex) -> PathBuf {
        self.merged_dir()
            .join(format!("merged_{}.png", idx.lexicon()))
    }

    pub fn debug_image(&self, idx: FrameIndex) -> PathBuf {
        self.debug_dir().join(format!("debug_{}.jpg", idx.lexicon()))
    }

    /// Create every directory of the layout.
    pub fn create_dirs(&self) -> DeltaResult<()> {
        let dirs = [
            self.inputs_dir(),
            self.residual_images_dir(),
            self.residual_upscaled_dir(),
            self.merged_dir(),
            self.debug_dir(),
            self.temp_dir(),
        ]
        .into_iter()
        .chain(VectorKind::ALL.iter().map(|&k| self.vector_dir(k)));
        for dir in dirs {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create workspace directory '{}'", dir.display()))?;
        }
        Ok(())
    }
}

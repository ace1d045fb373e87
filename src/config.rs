use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::build::geometry::BlockGeometry;
use crate::foundation::core::Fps;
use crate::foundation::error::{DeltaError, DeltaResult};
use crate::pipeline::layout::{ResidualFormat, WorkspaceLayout};
use crate::pipeline::wait::WaitPolicy;

/// Everything both stages need to run against one workspace.
///
/// Loaded from JSON; omitted fields take the values of [`PipelineConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Workspace root holding inputs, vector lists and outputs.
    pub workspace: PathBuf,
    /// Number of frames in the clip, genesis frame included.
    pub frame_count: u64,
    pub block_size: u32,
    pub bleed: u32,
    /// Upscaler magnification applied to residual canvases.
    pub scale_factor: u32,
    pub correction_block_size: u32,
    pub fps: Fps,
    pub poll_interval_ms: u64,
    /// Stop a stage after waiting this long for one artifact. Absent means wait forever.
    pub wait_timeout_ms: Option<u64>,
    /// Extra attempts for an image or list that exists but does not parse yet.
    #[serde(alias = "image_read_retries")]
    pub read_retries: u32,
    /// Save merged frames to `merged/` in addition to pushing them to the sink.
    pub preserve_frames: bool,
    /// Write residual debug images to `debug/`.
    pub debug: bool,
    /// Degrade frames with malformed vector lists to "no change" instead of aborting.
    pub skip_malformed_frames: bool,
    pub residual_format: ResidualFormat,
    pub residual_quality: u8,
    /// Optional MP4 path; merged frames are streamed to ffmpeg when set.
    pub output: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("."),
            frame_count: 0,
            block_size: 30,
            bleed: 1,
            scale_factor: 2,
            correction_block_size: 30,
            fps: Fps::default(),
            poll_interval_ms: 100,
            wait_timeout_ms: None,
            read_retries: 5,
            preserve_frames: true,
            debug: false,
            skip_malformed_frames: false,
            residual_format: ResidualFormat::Png,
            residual_quality: 95,
            output: None,
        }
    }
}

impl PipelineConfig {
    /// Read and validate a JSON config file.
    pub fn from_path(path: &Path) -> DeltaResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
            .map_err(|e| DeltaError::validation(format!("config '{}': {e}", path.display())))
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(text: &str) -> DeltaResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| DeltaError::validation(format!("invalid config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> DeltaResult<()> {
        self.geometry()?;
        if self.frame_count < 2 {
            return Err(DeltaError::validation(format!(
                "frame_count must be >= 2, got {}",
                self.frame_count
            )));
        }
        if self.scale_factor == 0 {
            return Err(DeltaError::validation("scale_factor must be > 0"));
        }
        if self.correction_block_size == 0 {
            return Err(DeltaError::validation("correction_block_size must be > 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(DeltaError::validation("poll_interval_ms must be > 0"));
        }
        if !(1..=100).contains(&self.residual_quality) {
            return Err(DeltaError::validation(format!(
                "residual_quality must be within 1..=100, got {}",
                self.residual_quality
            )));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        Ok(())
    }

    /// Block geometry shared by both builders.
    pub fn geometry(&self) -> DeltaResult<BlockGeometry> {
        BlockGeometry::new(self.block_size, self.bleed)
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.wait_timeout_ms.map(Duration::from_millis),
            read_retries: self.read_retries,
        }
    }

    pub fn layout(&self) -> WorkspaceLayout {
        WorkspaceLayout::new(&self.workspace)
    }
}

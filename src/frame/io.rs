use std::io::BufWriter;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{DeltaError, DeltaResult};
use crate::frame::buffer::Frame;
use crate::pipeline::controller::PipelineController;
use crate::pipeline::wait::{WaitPolicy, wait_for_artifact};

/// JPEG quality used when no explicit quality is requested.
pub const DEFAULT_QUALITY: u8 = 95;

/// JPEG quality for debug artifacts.
pub const DEBUG_QUALITY: u8 = 25;

impl Frame {
    /// Decode an image file into an RGB8 frame.
    pub fn load(path: &Path) -> DeltaResult<Frame> {
        let img = image::open(path).map_err(|e| DeltaError::unreadable(path, e.to_string()))?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Frame::from_rgb8(width, height, rgb.into_raw())
    }

    /// Wait for `path` to exist, then decode it, retrying while the file is still being written.
    ///
    /// Stops early with [`DeltaError::Cancelled`] when the controller is killed.
    pub fn load_waiting(
        path: &Path,
        policy: &WaitPolicy,
        controller: &PipelineController,
    ) -> DeltaResult<Frame> {
        wait_for_artifact(path, policy, controller)?;
        let mut attempt = 0u32;
        loop {
            match Frame::load(path) {
                Ok(frame) => return Ok(frame),
                Err(err @ DeltaError::UnreadableImage { .. }) if attempt < policy.read_retries => {
                    attempt += 1;
                    tracing::warn!(
                        path = %path.display(),
                        attempt,
                        error = %err,
                        "image not readable yet, retrying"
                    );
                    std::thread::sleep(policy.poll_interval);
                    if !controller.is_alive() {
                        return Err(DeltaError::Cancelled);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Save with [`DEFAULT_QUALITY`]. The format follows the file extension.
    pub fn save(&self, path: &Path) -> DeltaResult<()> {
        self.save_with_quality(path, DEFAULT_QUALITY)
    }

    /// Save at a given JPEG quality (ignored by lossless formats).
    ///
    /// The image is staged next to `path`. Use [`Frame::save_staged`] when another process
    /// watches the destination directory.
    pub fn save_with_quality(&self, path: &Path, quality: u8) -> DeltaResult<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        self.save_staged(path, quality, dir)
    }

    /// Encode into `staging_dir`, then rename onto `path`, so pollers never observe a partially
    /// written artifact.
    ///
    /// `staging_dir` must live on the same filesystem as `path`.
    pub fn save_staged(&self, path: &Path, quality: u8, staging_dir: &Path) -> DeltaResult<()> {
        if !(1..=100).contains(&quality) {
            return Err(DeltaError::validation(format!(
                "image quality must be within 1..=100, got {quality}"
            )));
        }
        let format = image::ImageFormat::from_path(path)
            .with_context(|| format!("unsupported image extension '{}'", path.display()))?;
        ensure_parent_dir(path)?;
        std::fs::create_dir_all(staging_dir).with_context(|| {
            format!("failed to create staging directory '{}'", staging_dir.display())
        })?;

        let tmp = staging_dir.join(staged_name(path));
        let written = self.encode_to(&tmp, format, quality);
        if let Err(err) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(err);
        }
        std::fs::rename(&tmp, path)
            .with_context(|| format!("move '{}' into place", path.display()))?;
        Ok(())
    }

    fn encode_to(&self, path: &Path, format: image::ImageFormat, quality: u8) -> DeltaResult<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("create image file '{}'", path.display()))?;
        let mut out = BufWriter::new(file);
        match format {
            image::ImageFormat::Jpeg => {
                let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
                enc.encode(
                    self.data(),
                    self.width(),
                    self.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .with_context(|| format!("encode jpeg '{}'", path.display()))?;
            }
            other => {
                image::write_buffer_with_format(
                    &mut out,
                    self.data(),
                    self.width(),
                    self.height(),
                    image::ExtendedColorType::Rgb8,
                    other,
                )
                .with_context(|| format!("encode image '{}'", path.display()))?;
            }
        }
        use std::io::Write as _;
        out.flush()
            .with_context(|| format!("flush image file '{}'", path.display()))?;
        Ok(())
    }
}

// Same-named outputs live in different directories, so the parent keeps staged names apart.
fn staged_name(path: &Path) -> String {
    let part = |p: Option<&std::ffi::OsStr>| p.map(|n| n.to_string_lossy().into_owned());
    let name = part(path.file_name()).unwrap_or_default();
    match part(path.parent().and_then(Path::file_name)) {
        Some(dir) => format!(".{dir}-{name}.partial"),
        None => format!(".{name}.partial"),
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> DeltaResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/frame/io.rs"]
mod tests;

use std::io::{Read, Write as _};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread::JoinHandle;

use crate::encode::sink::{FrameSink, SinkConfig, SinkGuard};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{DeltaError, DeltaResult};
use crate::frame::buffer::Frame;
use crate::frame::io::ensure_parent_dir;

/// Options for [`FfmpegSink`] output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output video path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// Frames buffered between the stage and the writer thread.
    pub queue_capacity: usize,
}

impl FfmpegSinkOpts {
    /// Options for writing an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            queue_capacity: 8,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw `rgb24` frames to its stdin.
///
/// Frames are queued to a dedicated writer thread, so a slow encoder applies backpressure only
/// once the queue is full.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    guard: SinkGuard,

    child: Option<Child>,
    queue: Option<mpsc::SyncSender<Vec<u8>>>,
    writer: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl FfmpegSink {
    /// Create a sink; `ffmpeg` is spawned in `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            guard: SinkGuard::default(),
            child: None,
            queue: None,
            writer: None,
            stderr_drain: None,
        }
    }

    fn join_writer(&mut self) -> DeltaResult<()> {
        match self.writer.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| DeltaError::stage("ffmpeg writer thread panicked"))?
                .map_err(|e| DeltaError::stage(format!("failed to write frame to ffmpeg: {e}"))),
            None => Ok(()),
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> DeltaResult<()> {
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(DeltaError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        self.guard.begin(cfg)?;

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(DeltaError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(DeltaError::stage(
                "ffmpeg is required for video output, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args([
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            DeltaError::stage(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DeltaError::stage("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| DeltaError::stage("failed to open ffmpeg stderr (unexpected)"))?;

        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        let (tx, rx) = mpsc::sync_channel::<Vec<u8>>(self.opts.queue_capacity.max(1));
        let writer = std::thread::Builder::new()
            .name("ffmpeg-writer".into())
            .spawn(move || write_frames(stdin, rx))
            .map_err(|e| DeltaError::stage(format!("failed to spawn ffmpeg writer: {e}")))?;

        tracing::info!(
            out = %self.opts.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            "ffmpeg sink started"
        );
        self.child = Some(child);
        self.queue = Some(tx);
        self.writer = Some(writer);
        self.stderr_drain = Some(stderr_drain);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> DeltaResult<()> {
        self.guard.check(idx, frame)?;
        let Some(queue) = self.queue.as_ref() else {
            return Err(DeltaError::stage("ffmpeg sink is already finalized"));
        };
        if queue.send(frame.data().to_vec()).is_err() {
            // The writer only hangs up after a write error; surface it.
            self.queue = None;
            self.join_writer()?;
            return Err(DeltaError::stage("ffmpeg writer stopped accepting frames"));
        }
        Ok(())
    }

    fn end(&mut self) -> DeltaResult<()> {
        drop(self.queue.take());
        let written = self.join_writer();

        // Ending a sink that never started is a no-op so stages can always close it.
        let Some(mut child) = self.child.take() else {
            self.guard.finish();
            return written;
        };
        let status = child
            .wait()
            .map_err(|e| DeltaError::stage(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| DeltaError::stage("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| DeltaError::stage(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        self.guard.finish();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(DeltaError::stage(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        written?;
        tracing::info!(out = %self.opts.out_path.display(), "ffmpeg sink finished");
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            tracing::warn!("ffmpeg sink dropped without end(); finalizing");
            let _ = self.end();
        }
    }
}

fn write_frames(mut stdin: ChildStdin, rx: mpsc::Receiver<Vec<u8>>) -> std::io::Result<()> {
    for bytes in rx {
        stdin.write_all(&bytes)?;
    }
    stdin.flush()
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;

use super::*;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("deltaframe_ffmpeg_{}", std::process::id()))
        .join(name)
}

#[test]
fn rejects_odd_dimensions_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(scratch_path("odd.mp4")));
    let err = sink
        .begin(SinkConfig {
            width: 3,
            height: 2,
            fps: Fps::default(),
        })
        .unwrap_err();
    assert!(matches!(err, DeltaError::Validation(_)));
}

#[test]
fn push_before_begin_fails_but_end_is_harmless() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(scratch_path("early.mp4")));
    assert!(sink.push_frame(FrameIndex(0), &Frame::allocate(2, 2)).is_err());
    sink.end().unwrap();
}

#[test]
fn encodes_a_short_clip_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let out = scratch_path("clip.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(out.clone()));
    sink.begin(SinkConfig {
        width: 16,
        height: 16,
        fps: Fps::default(),
    })
    .unwrap();
    for i in 0..4u8 {
        sink.push_frame(FrameIndex(u64::from(i)), &Frame::filled(16, 16, [i * 40, 0, 0]))
            .unwrap();
    }
    sink.end().unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    let _ = std::fs::remove_file(&out);
}
